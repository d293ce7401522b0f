use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct Student {
    pub id: i64,
    pub name: String,
    /// 上传目录中的存储文件名
    pub photo_path: String,
    /// 上传时的原始文件名
    pub original_filename: String,
    pub classroom_id: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
