//! ArcFace 识别模型，输出 512 维人脸编码

use image::RgbImage;
use image::imageops::{self, FilterType};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

use super::alignment::{ALIGNED_SIZE, align_face};
use super::types::{Encoding, FaceLocation};

const PIXEL_MEAN: f32 = 127.5;
const PIXEL_STD: f32 = 127.5;
const EMBEDDING_DIM: usize = 512;

/// 同一人的最低余弦相似度（ArcFace 常用阈值）
pub const MATCH_COSINE: f32 = 0.40;
/// 余弦相似度恰为 [`MATCH_COSINE`] 的两个编码之间的距离
pub const MATCH_DISTANCE: f32 = 0.5;

#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("recognizer model not found: {0}")]
    ModelNotFound(String),
    #[error("recognizer inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

pub struct FaceRecognizer {
    session: Session,
}

impl FaceRecognizer {
    pub fn load(model_path: &str, intra_threads: usize) -> Result<Self, RecognizerError> {
        if !Path::new(model_path).exists() {
            return Err(RecognizerError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(intra_threads)?
            .commit_from_file(model_path)?;

        tracing::info!(
            path = model_path,
            outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
            "ArcFace recognizer loaded"
        );

        Ok(Self { session })
    }

    /// 编码 `image` 中的一张人脸
    ///
    /// 有关键点时先对齐；没有关键点时直接把检测框缩放到模型输入尺寸。
    pub fn extract(
        &mut self,
        image: &RgbImage,
        face: &FaceLocation,
    ) -> Result<Encoding, RecognizerError> {
        let crop = match &face.landmarks {
            Some(landmarks) => align_face(image, landmarks),
            None => crop_box(image, face),
        };
        let input = to_tensor(&crop);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, raw) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| RecognizerError::InferenceFailed(format!("embedding: {e}")))?;

        if raw.len() != EMBEDDING_DIM {
            return Err(RecognizerError::InferenceFailed(format!(
                "expected {EMBEDDING_DIM}-dim embedding, got {}",
                raw.len()
            )));
        }

        Ok(calibrate(raw.to_vec()))
    }
}

/// 归一化后缩放，使余弦 [`MATCH_COSINE`] 对应欧氏距离 [`MATCH_DISTANCE`]。
///
/// 单位向量间距离为 `sqrt(2 - 2cos)`，统一缩放后距离按同一比例变化，
/// 因此默认容差 0.5 即表示"同一人"。
fn calibrate(raw: Vec<f32>) -> Encoding {
    let scale = MATCH_DISTANCE / (2.0 - 2.0 * MATCH_COSINE).sqrt();
    let unit = Encoding::normalized(raw);
    Encoding::new(unit.values.into_iter().map(|v| v * scale).collect())
}

fn crop_box(image: &RgbImage, face: &FaceLocation) -> RgbImage {
    let x = face.x.max(0.0) as u32;
    let y = face.y.max(0.0) as u32;
    let w = (face.width.max(1.0) as u32).min(image.width().saturating_sub(x)).max(1);
    let h = (face.height.max(1.0) as u32).min(image.height().saturating_sub(y)).max(1);
    let x = x.min(image.width().saturating_sub(1));
    let y = y.min(image.height().saturating_sub(1));

    let region = imageops::crop_imm(image, x, y, w, h).to_image();
    imageops::resize(&region, ALIGNED_SIZE, ALIGNED_SIZE, FilterType::Triangle)
}

/// 对称归一化的 NCHW RGB 张量
fn to_tensor(crop: &RgbImage) -> Array4<f32> {
    let size = ALIGNED_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));

    for (x, y, pixel) in crop.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        if x >= size || y >= size {
            continue;
        }
        for c in 0..3 {
            tensor[[0, c, y, x]] = (pixel[c] as f32 - PIXEL_MEAN) / PIXEL_STD;
        }
    }

    tensor
}
