use std::sync::Arc;

use crate::models::{
    classrooms::entities::Classroom,
    students::{entities::Student, requests::NewStudent},
};

use crate::errors::Result;

pub mod photos;
pub mod sea_orm_storage;

pub use photos::PhotoStore;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 教室管理方法
    // 创建教室
    async fn create_classroom(&self, name: String) -> Result<Classroom>;
    // 通过ID获取教室
    async fn get_classroom_by_id(&self, id: i64) -> Result<Option<Classroom>>;
    // 按 ID 顺序列出全部教室
    async fn list_classrooms(&self) -> Result<Vec<Classroom>>;
    // 删除教室，其学生移出该教室；教室不存在时返回 None，否则返回被移出的学生数
    async fn delete_classroom(&self, id: i64) -> Result<Option<u64>>;

    /// 学生管理方法
    // 创建学生（照片已存入上传目录）
    async fn create_student(&self, student: NewStudent) -> Result<Student>;
    // 通过ID获取学生
    async fn get_student_by_id(&self, id: i64) -> Result<Option<Student>>;
    // 按 ID 顺序列出学生，可按教室筛选
    async fn list_students(&self, classroom_id: Option<i64>) -> Result<Vec<Student>>;
    // 删除学生记录
    async fn delete_student(&self, id: i64) -> Result<bool>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
