use crate::errors::AttendanceError;

/// 业务错误码，随 [`ApiResponse`](super::ApiResponse) 一起返回
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误 1000+
    BadRequest = 1000,
    ValidationFailed = 1001,
    NotFound = 1004,
    InternalServerError = 1005,

    // 文件 2000+
    FileNotFound = 2000,
    FileUploadFailed = 2001,
    FileTypeNotAllowed = 2002,
    FileSizeExceeded = 2003,
    MultifileUploadNotAllowed = 2004,

    // 教室 3000+
    ClassroomNotFound = 3000,
    ClassroomCreationFailed = 3001,
    ClassroomDeleteFailed = 3002,

    // 学生 4000+
    StudentNotFound = 4000,
    StudentCreationFailed = 4001,
    StudentDeleteFailed = 4002,

    // 考勤 5000+
    FaceNotDetected = 5000,
    ImageDecodeFailed = 5001,
    AttendanceFailed = 5002,
}

impl ErrorCode {
    /// 未被调用方细分的错误按类别映射
    pub fn from_error(err: &AttendanceError, fallback: ErrorCode) -> Self {
        match err {
            AttendanceError::Validation(_) => ErrorCode::ValidationFailed,
            AttendanceError::NotFound(_) => ErrorCode::NotFound,
            AttendanceError::ImageDecode(_) => ErrorCode::ImageDecodeFailed,
            AttendanceError::Detection(_) => ErrorCode::FaceNotDetected,
            _ => fallback,
        }
    }
}
