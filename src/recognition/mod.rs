//! 人脸检测与编码
//!
//! 考勤匹配只依赖 [`FaceEncoder`]，生产环境使用 [`OnnxFaceEncoder`]。

pub mod alignment;
pub mod detector;
pub mod onnx;
pub mod recognizer;
pub mod types;

use image::{ImageReader, RgbImage};
use std::path::Path;

use crate::errors::{AttendanceError, Result};

pub use detector::DetectorError;
pub use onnx::OnnxFaceEncoder;
pub use recognizer::RecognizerError;
pub use types::{Encoding, FaceLocation};

pub trait FaceEncoder: Send + Sync {
    /// 图片中的人脸，按检测顺序
    fn face_locations(&self, image: &RgbImage) -> Result<Vec<FaceLocation>>;

    /// 每个位置一个编码，顺序与输入一致
    fn face_encodings(&self, image: &RgbImage, locations: &[FaceLocation])
    -> Result<Vec<Encoding>>;

    fn encode_faces(&self, image: &RgbImage) -> Result<Vec<Encoding>> {
        let locations = self.face_locations(image)?;
        if locations.is_empty() {
            return Ok(Vec::new());
        }
        self.face_encodings(image, &locations)
    }
}

/// 解码图片文件为 RGB，格式由内容判断
pub fn load_image_file(path: &Path) -> Result<RgbImage> {
    let reader = ImageReader::open(path)
        .map_err(|e| AttendanceError::file_operation(format!("{}: {e}", path.display())))?
        .with_guessed_format()?;
    Ok(reader.decode()?.to_rgb8())
}

/// 解码内存中的图片数据为 RGB
pub fn load_image_bytes(bytes: &[u8]) -> Result<RgbImage> {
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}
