use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ClassroomService;
use crate::models::classrooms::responses::ClassroomDetailResponse;
use crate::models::students::responses::StudentResponse;
use crate::models::{ApiResponse, ErrorCode};

pub async fn get_classroom(
    service: &ClassroomService,
    request: &HttpRequest,
    classroom_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let classroom = match storage.get_classroom_by_id(classroom_id).await {
        Ok(Some(classroom)) => classroom,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::ClassroomNotFound,
                "Classroom not found",
            )));
        }
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Failed to get classroom information: {e}"),
                )),
            );
        }
    };

    match storage.list_students(Some(classroom_id)).await {
        Ok(students) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ClassroomDetailResponse {
                classroom,
                students: students
                    .into_iter()
                    .map(StudentResponse::from_student)
                    .collect(),
            },
            "Classroom retrieved successfully",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to list classroom students: {e}"),
            )),
        ),
    }
}
