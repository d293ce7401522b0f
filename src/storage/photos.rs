//! 上传目录中的照片文件
//!
//! 文件名由服务端生成 (`{unix_ts}-{uuid}.{ext}`)，用户提供的原始文件名只作记录，
//! 因此同名上传不会相互覆盖。

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::UploadConfig;
use crate::errors::{AttendanceError, Result};

pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
    max_size: usize,
    allowed_types: Vec<String>,
}

impl PhotoStore {
    pub fn new(dir: impl Into<PathBuf>, max_size: usize, allowed_types: Vec<String>) -> Self {
        Self {
            dir: dir.into(),
            max_size,
            allowed_types: allowed_types.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(&config.dir, config.max_size, config.allowed_types.clone())
    }

    /// 确保上传目录存在
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            AttendanceError::file_operation(format!(
                "创建上传目录失败 {}: {e}",
                self.dir.display()
            ))
        })
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// 从原始文件名提取扩展名（小写，含点号），不在允许列表中则拒绝
    pub fn allowed_extension(&self, original_name: &str) -> Result<String> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_default();

        if extension.is_empty() || !self.allowed_types.contains(&extension) {
            return Err(AttendanceError::validation(format!(
                "不支持的图片类型: {original_name}，允许: {}",
                self.allowed_types.join(", ")
            )));
        }
        Ok(extension)
    }

    /// 生成新的存储文件名
    pub fn generate_name(extension: &str) -> String {
        format!(
            "{}-{}{}",
            chrono::Utc::now().timestamp(),
            Uuid::new_v4(),
            extension
        )
    }

    /// 存储文件名对应的磁盘路径；拒绝包含路径分隔符或 `..` 的名称
    pub fn path_of(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name.contains("..")
            || name.starts_with('.')
        {
            return Err(AttendanceError::validation(format!("非法文件名: {name}")));
        }
        Ok(self.dir.join(name))
    }

    /// 删除照片；文件本就不存在时返回 `false`
    pub fn remove(&self, name: &str) -> Result<bool> {
        let path = self.path_of(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AttendanceError::file_operation(format!(
                "删除照片失败 {}: {e}",
                path.display()
            ))),
        }
    }

    pub fn public_url(name: &str) -> String {
        format!("{PUBLIC_PREFIX}/{name}")
    }
}
