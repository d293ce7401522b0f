pub mod attendance;

pub mod classrooms;

pub mod photos;

pub mod students;

pub use attendance::configure_attendance_routes;
pub use classrooms::configure_classrooms_routes;
pub use photos::configure_photo_routes;
pub use students::configure_students_routes;

use actix_web::web;

/// 注册全部路由
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_classrooms_routes)
        .configure(configure_students_routes)
        .configure(configure_attendance_routes)
        .configure(configure_photo_routes);
}
