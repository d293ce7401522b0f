pub mod create;
pub mod delete;
pub mod get;
pub mod list;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::classrooms::requests::CreateClassroomRequest;
use crate::storage::Storage;

pub struct ClassroomService {
    storage: Option<Arc<dyn Storage>>,
}

impl ClassroomService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    // 获取教室列表
    pub async fn list_classrooms(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_classrooms(self, request).await
    }

    pub async fn create_classroom(
        &self,
        request: &HttpRequest,
        classroom_data: CreateClassroomRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_classroom(self, request, classroom_data).await
    }

    // 根据教室 ID 获取教室及其学生
    pub async fn get_classroom(
        &self,
        request: &HttpRequest,
        classroom_id: i64,
    ) -> ActixResult<HttpResponse> {
        get::get_classroom(self, request, classroom_id).await
    }

    // 根据教室 ID 删除教室，学生变为未分配
    pub async fn delete_classroom(
        &self,
        request: &HttpRequest,
        classroom_id: i64,
    ) -> ActixResult<HttpResponse> {
        delete::delete_classroom(self, request, classroom_id).await
    }
}
