use serde::Deserialize;
use ts_rs::TS;

// 创建教室请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/classroom.ts")]
pub struct CreateClassroomRequest {
    pub name: String,
}
