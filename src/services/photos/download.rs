use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::header};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::PhotoService;
use crate::errors::AttendanceError;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::app_data;
use crate::storage::PhotoStore;

pub async fn serve_photo(
    _service: &PhotoService,
    request: &HttpRequest,
    file_name: String,
) -> ActixResult<HttpResponse> {
    let photos = app_data::<PhotoStore>(request);

    let file_path = match photos.path_of(&file_name) {
        Ok(path) => path,
        Err(e) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::BadRequest, e.message())));
        }
    };

    if !file_path.exists() {
        return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::FileNotFound,
            "Photo not found",
        )));
    }

    let mut buf = Vec::new();
    if let Err(e) = File::open(&file_path).and_then(|mut f| f.read_to_end(&mut buf)) {
        tracing::error!("{}", AttendanceError::file_operation(format!("{e}")));
        return Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                "Photo read failed",
            )),
        );
    }

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, content_type_of(&file_path)))
        .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
        .body(buf))
}

fn content_type_of(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}
