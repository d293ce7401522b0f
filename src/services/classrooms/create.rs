use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::ClassroomService;
use crate::models::classrooms::requests::CreateClassroomRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::validate_display_name;

pub async fn create_classroom(
    service: &ClassroomService,
    request: &HttpRequest,
    classroom_data: CreateClassroomRequest,
) -> ActixResult<HttpResponse> {
    let name = match validate_display_name(&classroom_data.name) {
        Ok(name) => name,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
        }
    };

    let storage = service.get_storage(request);
    match storage.create_classroom(name).await {
        Ok(classroom) => {
            info!("Classroom {} created with id {}", classroom.name, classroom.id);
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(classroom, "Classroom created successfully")))
        }
        Err(e) => {
            error!("Failed to create classroom: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::ClassroomCreationFailed,
                    format!("Failed to create classroom: {e}"),
                )),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};

    use crate::test_support::TestContext;

    #[actix_web::test]
    async fn test_create_and_list_classrooms() {
        let ctx = TestContext::new().await;
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/classrooms")
            .set_json(json!({ "name": "  Math101 " }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], 0);
        assert_eq!(body["data"]["name"], "Math101");

        let req = test::TestRequest::get()
            .uri("/api/v1/classrooms")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["items"].as_array().map(|a| a.len()), Some(1));
    }

    #[actix_web::test]
    async fn test_blank_name_is_rejected() {
        let ctx = TestContext::new().await;
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/classrooms")
            .set_json(json!({ "name": "   " }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(ctx.storage.list_classrooms().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_malformed_json_uses_api_envelope() {
        let ctx = TestContext::new().await;
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/classrooms")
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"nam")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], 1000);
    }
}
