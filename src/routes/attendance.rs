use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::services::AttendanceService;

// 懒加载的全局 ATTENDANCE_SERVICE 实例
static ATTENDANCE_SERVICE: Lazy<AttendanceService> = Lazy::new(AttendanceService::new_lazy);

pub async fn submit_attendance(req: HttpRequest, payload: Multipart) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.submit_attendance(&req, payload).await
}

// 配置路由
pub fn configure_attendance_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/attendance")
            .route("", web::post().to(submit_attendance)),
    );
}
