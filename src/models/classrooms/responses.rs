use super::entities::Classroom;
use crate::models::students::responses::StudentResponse;
use serde::Serialize;
use ts_rs::TS;

// 教室列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/classroom.ts")]
pub struct ClassroomListResponse {
    pub items: Vec<Classroom>,
}

// 教室详情（含学生）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/classroom.ts")]
pub struct ClassroomDetailResponse {
    #[serde(flatten)]
    #[ts(flatten)]
    pub classroom: Classroom,
    pub students: Vec<StudentResponse>,
}

// 删除教室响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/classroom.ts")]
pub struct DeleteClassroomResponse {
    pub id: i64,
    /// 被移出该教室的学生数量
    pub unassigned_students: u64,
}
