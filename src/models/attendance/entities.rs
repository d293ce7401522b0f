use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 单个学生的出勤结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct StudentPresence {
    pub id: i64,
    pub name: String,
    pub present: bool,
    /// 参考照片中是否检测到人脸
    pub has_reference: bool,
}
