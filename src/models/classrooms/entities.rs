use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/classroom.ts")]
pub struct Classroom {
    // 教室ID
    pub id: i64,
    // 教室名称
    pub name: String,
    // 创建时间
    pub created_at: chrono::DateTime<chrono::Utc>,
}
