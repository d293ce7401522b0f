use serde::Deserialize;
use ts_rs::TS;

// 学生列表查询参数
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct StudentQueryParams {
    pub classroom_id: Option<i64>,
}

// 新建学生（用于存储层，照片已写入上传目录）
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub name: String,
    pub photo_path: String,
    pub original_filename: String,
    pub classroom_id: Option<i64>,
}
