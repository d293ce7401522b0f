use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::AttendanceService;
use super::matcher::AttendanceMatcher;
use crate::cache::EncodingCache;
use crate::config::AttendanceConfig;
use crate::errors::AttendanceError;
use crate::models::{ApiResponse, ErrorCode};
use crate::recognition::FaceEncoder;
use crate::services::{app_data, error_response};
use crate::storage::PhotoStore;
use crate::utils::{UploadForm, read_form};

pub const CLASS_PHOTO_FIELD: &str = "class_photo";

pub async fn submit_attendance(
    service: &AttendanceService,
    request: &HttpRequest,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let photos = app_data::<PhotoStore>(request);

    let mut form = match read_form(payload, CLASS_PHOTO_FIELD, &photos).await {
        Ok(form) => form,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let defaults = app_data::<AttendanceConfig>(request);
    let (classroom_id, tolerance) = match parse_form(&form, defaults.tolerance) {
        Ok(parsed) => parsed,
        Err(e) => {
            form.discard(&photos);
            return Ok(error_response(&e, ErrorCode::ValidationFailed));
        }
    };
    let Some(class_photo) = form.photo.as_ref().map(|p| p.stored_name.clone()) else {
        return Ok(error_response(
            &AttendanceError::validation("A class photo is required"),
            ErrorCode::ValidationFailed,
        ));
    };

    let matcher = AttendanceMatcher::new(
        service.get_storage(request),
        photos.get_ref().clone(),
        app_data::<Arc<dyn FaceEncoder>>(request).get_ref().clone(),
        app_data::<EncodingCache>(request).get_ref().clone(),
    );

    match matcher
        .take_attendance(classroom_id, &class_photo, tolerance)
        .await
    {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            result,
            "Attendance taken successfully",
        ))),
        Err(e) => {
            form.discard(&photos);
            let code = match &e {
                AttendanceError::NotFound(_) => ErrorCode::ClassroomNotFound,
                _ => ErrorCode::from_error(&e, ErrorCode::AttendanceFailed),
            };
            Ok(error_response(&e, code))
        }
    }
}

/// 解析教室 ID 与可选的匹配阈值
fn parse_form(form: &UploadForm, default_tolerance: f32) -> Result<(i64, f32), AttendanceError> {
    let classroom_id = form
        .field("classroom_id")
        .ok_or_else(|| AttendanceError::validation("classroom_id is required"))?;
    let classroom_id = classroom_id
        .parse::<i64>()
        .map_err(|_| AttendanceError::validation(format!("Invalid classroom_id: {classroom_id}")))?;

    let tolerance = match form.field("tolerance") {
        Some(raw) => match raw.parse::<f32>() {
            Ok(value) if value.is_finite() && value > 0.0 => value,
            _ => {
                return Err(AttendanceError::validation(format!(
                    "tolerance must be a positive number, got {raw}"
                )));
            }
        },
        None => default_tolerance,
    };

    Ok((classroom_id, tolerance))
}
