use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ClassroomService;
use crate::models::classrooms::responses::ClassroomListResponse;
use crate::models::{ApiResponse, ErrorCode};

pub async fn list_classrooms(
    service: &ClassroomService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.list_classrooms().await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ClassroomListResponse { items },
            "Classrooms retrieved successfully",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to list classrooms: {e}"),
            )),
        ),
    }
}
