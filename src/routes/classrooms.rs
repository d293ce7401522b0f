use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::models::classrooms::requests::CreateClassroomRequest;
use crate::services::ClassroomService;

// 懒加载的全局 CLASSROOM_SERVICE 实例
static CLASSROOM_SERVICE: Lazy<ClassroomService> = Lazy::new(ClassroomService::new_lazy);

// HTTP处理程序
pub async fn list_classrooms(req: HttpRequest) -> ActixResult<HttpResponse> {
    CLASSROOM_SERVICE.list_classrooms(&req).await
}

pub async fn create_classroom(
    req: HttpRequest,
    classroom_data: web::Json<CreateClassroomRequest>,
) -> ActixResult<HttpResponse> {
    CLASSROOM_SERVICE
        .create_classroom(&req, classroom_data.into_inner())
        .await
}

pub async fn get_classroom(
    req: HttpRequest,
    classroom_id: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    CLASSROOM_SERVICE
        .get_classroom(&req, classroom_id.into_inner())
        .await
}

pub async fn delete_classroom(
    req: HttpRequest,
    classroom_id: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    CLASSROOM_SERVICE
        .delete_classroom(&req, classroom_id.into_inner())
        .await
}

// 配置路由
pub fn configure_classrooms_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/classrooms")
            .service(
                web::resource("")
                    .route(web::get().to(list_classrooms))
                    .route(web::post().to(create_classroom)),
            )
            .service(
                web::resource("/{classroom_id}")
                    .route(web::get().to(get_classroom))
                    .route(web::delete().to(delete_classroom)),
            ),
    );
}
