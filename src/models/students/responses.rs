use super::entities::Student;
use crate::storage::PhotoStore;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct StudentResponse {
    #[serde(flatten)]
    #[ts(flatten)]
    pub student: Student,
    /// 照片访问路径
    pub photo_url: String,
}

impl StudentResponse {
    pub fn from_student(student: Student) -> Self {
        let photo_url = PhotoStore::public_url(&student.photo_path);
        Self { student, photo_url }
    }
}

// 学生列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct StudentListResponse {
    pub items: Vec<StudentResponse>,
}
