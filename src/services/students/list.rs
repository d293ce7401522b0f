use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::StudentService;
use crate::models::students::requests::StudentQueryParams;
use crate::models::students::responses::{StudentListResponse, StudentResponse};
use crate::models::{ApiResponse, ErrorCode};

pub async fn list_students(
    service: &StudentService,
    request: &HttpRequest,
    query: StudentQueryParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.list_students(query.classroom_id).await {
        Ok(students) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            StudentListResponse {
                items: students
                    .into_iter()
                    .map(StudentResponse::from_student)
                    .collect(),
            },
            "Students retrieved successfully",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to list students: {e}"),
            )),
        ),
    }
}
