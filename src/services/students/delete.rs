use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use super::StudentService;
use crate::cache::EncodingCache;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::app_data;
use crate::storage::PhotoStore;

pub async fn delete_student(
    service: &StudentService,
    request: &HttpRequest,
    student_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let student = match storage.get_student_by_id(student_id).await {
        Ok(Some(student)) => student,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::StudentNotFound,
                "Student not found",
            )));
        }
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Failed to get student information: {e}"),
                )),
            );
        }
    };

    match storage.delete_student(student_id).await {
        Ok(true) => {}
        Ok(false) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::StudentNotFound,
                "Student not found",
            )));
        }
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::StudentDeleteFailed,
                    format!("Failed to delete student: {e}"),
                )),
            );
        }
    }

    // 记录已删除，照片删除失败只记录日志
    let photos = app_data::<PhotoStore>(request);
    match photos.remove(&student.photo_path) {
        Ok(true) => {}
        Ok(false) => warn!(
            "Photo {} of student {} was already missing",
            student.photo_path, student_id
        ),
        Err(e) => warn!("{}", e),
    }
    app_data::<EncodingCache>(request)
        .invalidate(&student.photo_path)
        .await;

    info!("Student {} ({}) deleted", student.name, student_id);
    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Student deleted successfully")))
}
