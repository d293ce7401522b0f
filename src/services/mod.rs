pub mod attendance;
pub mod classrooms;
pub mod photos;
pub mod students;

pub use attendance::AttendanceService;
pub use classrooms::ClassroomService;
pub use photos::PhotoService;
pub use students::StudentService;

use actix_web::{HttpRequest, HttpResponse, web};

use crate::errors::AttendanceError;
use crate::models::{ApiResponse, ErrorCode};

/// 从 app data 中取出共享组件
pub(crate) fn app_data<T: ?Sized + 'static>(request: &HttpRequest) -> web::Data<T> {
    request
        .app_data::<web::Data<T>>()
        .cloned()
        .unwrap_or_else(|| {
            panic!(
                "{} not found in app data",
                std::any::type_name::<T>()
            )
        })
}

/// 将错误转换为统一格式的响应；服务端错误记录日志
pub(crate) fn error_response(err: &AttendanceError, code: ErrorCode) -> HttpResponse {
    let status = err.status_code();
    if status.is_server_error() {
        tracing::error!("{}", err);
    } else {
        tracing::debug!("{}", err);
    }
    ApiResponse::failure(code, err)
}
