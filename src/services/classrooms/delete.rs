use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::ClassroomService;
use crate::models::classrooms::responses::DeleteClassroomResponse;
use crate::models::{ApiResponse, ErrorCode};

pub async fn delete_classroom(
    service: &ClassroomService,
    request: &HttpRequest,
    classroom_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.delete_classroom(classroom_id).await {
        Ok(Some(unassigned_students)) => {
            info!(
                "Classroom {} deleted, {} students unassigned",
                classroom_id, unassigned_students
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                DeleteClassroomResponse {
                    id: classroom_id,
                    unassigned_students,
                },
                "Classroom deleted successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ClassroomNotFound,
            "Classroom not found",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::ClassroomDeleteFailed,
                format!("Failed to delete classroom: {e}"),
            )),
        ),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test};
    use serde_json::Value;

    use crate::test_support::TestContext;

    #[actix_web::test]
    async fn test_delete_classroom_reports_unassigned() {
        let ctx = TestContext::new().await;
        let math = ctx.storage.create_classroom("Math101".into()).await.unwrap();
        let alice = ctx.add_student("Alice", &[[100, 0, 0]], Some(math.id)).await;
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let req = test::TestRequest::delete()
            .uri(&format!("/api/v1/classrooms/{}", math.id))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["unassigned_students"], 1);

        let alice = ctx.storage.get_student_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(alice.classroom_id, None);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/v1/classrooms/{}", math.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
