use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::services::PhotoService;
use crate::storage::photos::PUBLIC_PREFIX;

// 懒加载的全局 PHOTO_SERVICE 实例
static PHOTO_SERVICE: Lazy<PhotoService> = Lazy::new(PhotoService::new_lazy);

pub async fn serve_photo(
    req: HttpRequest,
    file_name: web::Path<String>,
) -> ActixResult<HttpResponse> {
    PHOTO_SERVICE
        .serve_photo(&req, file_name.into_inner())
        .await
}

// 配置路由
pub fn configure_photo_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope(PUBLIC_PREFIX).route("/{file_name}", web::get().to(serve_photo)));
}
