use std::collections::BTreeMap;

use super::entities::StudentPresence;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct AttendanceResponse {
    pub classroom_id: i64,
    pub classroom_name: String,
    /// 集体照访问路径
    pub class_photo_url: String,
    /// 集体照中检测到的人脸数
    pub faces_detected: usize,
    /// 姓名 -> 是否出勤；同名学生任一出勤即为 true
    pub presence: BTreeMap<String, bool>,
    pub students: Vec<StudentPresence>,
}
