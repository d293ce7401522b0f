//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use std::fmt;

use actix_web::http::StatusCode;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_attendance_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum AttendanceError {
            $($variant(String),)*
        }

        impl AttendanceError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(AttendanceError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(AttendanceError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(AttendanceError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl AttendanceError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        AttendanceError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_attendance_errors! {
    DatabaseConfig("E001", "Database Configuration Error"),
    DatabaseConnection("E002", "Database Connection Error"),
    DatabaseOperation("E003", "Database Operation Error"),
    FileOperation("E004", "File Operation Error"),
    Validation("E005", "Validation Error"),
    NotFound("E006", "Resource Not Found"),
    Serialization("E007", "Serialization Error"),
    Detection("E008", "Face Detection Error"),
    Encoder("E009", "Face Encoder Error"),
    ImageDecode("E010", "Image Decode Error"),
}

impl AttendanceError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::Validation(_) | AttendanceError::ImageDecode(_) => {
                StatusCode::BAD_REQUEST
            }
            AttendanceError::NotFound(_) => StatusCode::NOT_FOUND,
            AttendanceError::Detection(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AttendanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for AttendanceError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for AttendanceError {
    fn from(err: sea_orm::DbErr) -> Self {
        AttendanceError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for AttendanceError {
    fn from(err: std::io::Error) -> Self {
        AttendanceError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for AttendanceError {
    fn from(err: serde_json::Error) -> Self {
        AttendanceError::Serialization(err.to_string())
    }
}

impl From<image::ImageError> for AttendanceError {
    fn from(err: image::ImageError) -> Self {
        AttendanceError::ImageDecode(err.to_string())
    }
}

impl From<crate::recognition::DetectorError> for AttendanceError {
    fn from(err: crate::recognition::DetectorError) -> Self {
        AttendanceError::Encoder(err.to_string())
    }
}

impl From<crate::recognition::RecognizerError> for AttendanceError {
    fn from(err: crate::recognition::RecognizerError) -> Self {
        AttendanceError::Encoder(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AttendanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AttendanceError::database_config("test").code(), "E001");
        assert_eq!(AttendanceError::validation("test").code(), "E005");
        assert_eq!(AttendanceError::not_found("test").code(), "E006");
        assert_eq!(AttendanceError::detection("test").code(), "E008");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            AttendanceError::image_decode("test").error_type(),
            "Image Decode Error"
        );
        assert_eq!(
            AttendanceError::validation("test").error_type(),
            "Validation Error"
        );
    }

    #[test]
    fn test_error_message() {
        let err = AttendanceError::validation("Name must not be empty");
        assert_eq!(err.message(), "Name must not be empty");
    }

    #[test]
    fn test_format_simple() {
        let err = AttendanceError::not_found("Classroom 7");
        let formatted = err.format_simple();
        assert!(formatted.contains("Resource Not Found"));
        assert!(formatted.contains("Classroom 7"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AttendanceError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AttendanceError::not_found("x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AttendanceError::detection("x").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AttendanceError::encoder("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
