use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use super::StudentService;
use crate::config::AttendanceConfig;
use crate::errors::{AttendanceError, Result};
use crate::models::students::requests::NewStudent;
use crate::models::students::responses::StudentResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::recognition::{FaceEncoder, load_image_file};
use crate::services::{app_data, error_response};
use crate::storage::{PhotoStore, Storage};
use crate::utils::{UploadForm, read_form, validate_display_name};

pub const PHOTO_FIELD: &str = "photo";

pub async fn create_student(
    service: &StudentService,
    request: &HttpRequest,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let photos = app_data::<PhotoStore>(request);

    let mut form = match read_form(payload, PHOTO_FIELD, &photos).await {
        Ok(form) => form,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let storage = service.get_storage(request);
    match register_student(request, &storage, &photos, &form).await {
        Ok(response) => {
            info!(
                "Student {} created with photo {}",
                response.student.name, response.student.photo_path
            );
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(response, "Student created successfully")))
        }
        Err((code, e)) => {
            form.discard(&photos);
            Ok(error_response(&e, code))
        }
    }
}

/// 校验表单并写入数据库；失败时由调用方删除已保存的照片
async fn register_student(
    request: &HttpRequest,
    storage: &Arc<dyn Storage>,
    photos: &PhotoStore,
    form: &UploadForm,
) -> std::result::Result<StudentResponse, (ErrorCode, AttendanceError)> {
    let invalid = |e: AttendanceError| (ErrorCode::ValidationFailed, e);

    let name = validate_display_name(form.field("name").unwrap_or_default())
        .map_err(|msg| invalid(AttendanceError::validation(msg)))?;
    let photo = form
        .photo
        .as_ref()
        .ok_or_else(|| invalid(AttendanceError::validation("A photo is required")))?;

    let classroom_id = match form.field("classroom_id") {
        Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
            invalid(AttendanceError::validation(format!(
                "Invalid classroom_id: {raw}"
            )))
        })?),
        None => None,
    };

    if let Some(id) = classroom_id {
        match storage.get_classroom_by_id(id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Err((
                    ErrorCode::ClassroomNotFound,
                    AttendanceError::not_found(format!("Classroom {id} not found")),
                ));
            }
            Err(e) => return Err((ErrorCode::InternalServerError, e)),
        }
    }

    let attendance = app_data::<AttendanceConfig>(request);
    if attendance.verify_faces_on_upload {
        let encoder = app_data::<Arc<dyn FaceEncoder>>(request).get_ref().clone();
        let path = photos
            .path_of(&photo.stored_name)
            .map_err(|e| (ErrorCode::FileUploadFailed, e))?;
        let faces = detect_faces(encoder, path)
            .await
            .map_err(|e| (ErrorCode::from_error(&e, ErrorCode::StudentCreationFailed), e))?;
        if faces == 0 {
            return Err((
                ErrorCode::FaceNotDetected,
                AttendanceError::detection(format!(
                    "No face detected in {}",
                    photo.original_name
                )),
            ));
        }
    }

    let student = storage
        .create_student(NewStudent {
            name,
            photo_path: photo.stored_name.clone(),
            original_filename: photo.original_name.clone(),
            classroom_id,
        })
        .await
        .map_err(|e| (ErrorCode::StudentCreationFailed, e))?;

    Ok(StudentResponse::from_student(student))
}

async fn detect_faces(encoder: Arc<dyn FaceEncoder>, path: std::path::PathBuf) -> Result<usize> {
    actix_web::web::block(move || -> Result<usize> {
        let image = load_image_file(&path)?;
        Ok(encoder.face_locations(&image)?.len())
    })
    .await
    .map_err(|e| AttendanceError::encoder(format!("Blocking task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test};
    use serde_json::Value;

    use crate::test_support::{MultipartBody, TestContext, png_bytes};

    fn upload_files(ctx: &TestContext) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(ctx.upload_dir())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    #[actix_web::test]
    async fn test_create_student_stores_photo() {
        let ctx = TestContext::new().await;
        let math = ctx.storage.create_classroom("Math101".into()).await.unwrap();
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let (content_type, body) = MultipartBody::new()
            .text("name", "Alice")
            .text("classroom_id", &math.id.to_string())
            .file("photo", "alice.png", &png_bytes(&[[100, 0, 0]]))
            .build();
        let req = test::TestRequest::post()
            .uri("/api/v1/students")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["name"], "Alice");
        assert_eq!(body["data"]["original_filename"], "alice.png");
        assert_eq!(body["data"]["classroom_id"], math.id);

        let stored = body["data"]["photo_path"].as_str().unwrap().to_string();
        assert_ne!(stored, "alice.png");
        assert_eq!(upload_files(&ctx), vec![stored]);
    }

    #[actix_web::test]
    async fn test_same_filename_does_not_overwrite() {
        let ctx = TestContext::new().await;
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        for (name, red) in [("Alice", 100u8), ("Bob", 200u8)] {
            let (content_type, body) = MultipartBody::new()
                .text("name", name)
                .file("photo", "photo.png", &png_bytes(&[[red, 0, 0]]))
                .build();
            let req = test::TestRequest::post()
                .uri("/api/v1/students")
                .insert_header(("content-type", content_type))
                .set_payload(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let students = ctx.storage.list_students(None).await.unwrap();
        assert_eq!(students.len(), 2);
        assert_ne!(students[0].photo_path, students[1].photo_path);
        assert_eq!(upload_files(&ctx).len(), 2);
    }

    #[actix_web::test]
    async fn test_rejections_leave_no_files() {
        let ctx = TestContext::new().await;
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let cases = [
            // 缺少姓名
            (
                MultipartBody::new().file("photo", "a.png", &png_bytes(&[[1, 0, 0]])),
                StatusCode::BAD_REQUEST,
            ),
            // 缺少照片
            (
                MultipartBody::new().text("name", "Alice"),
                StatusCode::BAD_REQUEST,
            ),
            // 扩展名不允许
            (
                MultipartBody::new()
                    .text("name", "Alice")
                    .file("photo", "a.txt", b"hello"),
                StatusCode::BAD_REQUEST,
            ),
            // 内容与扩展名不符
            (
                MultipartBody::new()
                    .text("name", "Alice")
                    .file("photo", "a.png", b"not really a png"),
                StatusCode::BAD_REQUEST,
            ),
            // 教室不存在
            (
                MultipartBody::new()
                    .text("name", "Alice")
                    .text("classroom_id", "999")
                    .file("photo", "a.png", &png_bytes(&[[1, 0, 0]])),
                StatusCode::NOT_FOUND,
            ),
        ];

        for (form, expected) in cases {
            let (content_type, body) = form.build();
            let req = test::TestRequest::post()
                .uri("/api/v1/students")
                .insert_header(("content-type", content_type))
                .set_payload(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected);
        }

        assert!(upload_files(&ctx).is_empty());
        assert!(ctx.storage.list_students(None).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_oversized_photo_is_rejected() {
        let mut ctx = TestContext::new().await;
        ctx.set_max_upload_size(16);
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let (content_type, body) = MultipartBody::new()
            .text("name", "Alice")
            .file("photo", "a.png", &png_bytes(&[[1, 0, 0]; 8]))
            .build();
        let req = test::TestRequest::post()
            .uri("/api/v1/students")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], 2003);
        assert!(upload_files(&ctx).is_empty());
    }

    #[actix_web::test]
    async fn test_verify_faces_on_upload() {
        let mut ctx = TestContext::new().await;
        ctx.attendance.verify_faces_on_upload = true;
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let (content_type, body) = MultipartBody::new()
            .text("name", "Blank")
            .file("photo", "blank.png", &png_bytes(&[[0, 0, 0]]))
            .build();
        let req = test::TestRequest::post()
            .uri("/api/v1/students")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(upload_files(&ctx).is_empty());

        let (content_type, body) = MultipartBody::new()
            .text("name", "Alice")
            .file("photo", "alice.png", &png_bytes(&[[100, 0, 0]]))
            .build();
        let req = test::TestRequest::post()
            .uri("/api/v1/students")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }
}
