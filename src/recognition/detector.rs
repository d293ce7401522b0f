//! 基于 ONNX Runtime 的 SCRFD 人脸检测
//!
//! 照片等比缩放并填充到 640×640，三个步长的输出解码为带关键点的人脸框，
//! 最后用非极大值抑制去除重叠框。

use image::RgbImage;
use image::imageops::{self, FilterType};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

use super::types::FaceLocation;

const INPUT_SIZE: u32 = 640;
const PIXEL_MEAN: f32 = 127.5;
const PIXEL_STD: f32 = 128.0;
const NMS_IOU_THRESHOLD: f32 = 0.4;
const STRIDES: [usize; 3] = [8, 16, 32];
const ANCHORS_PER_CELL: usize = 2;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("detector model not found: {0}")]
    ModelNotFound(String),
    #[error("detector inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// 照片缩放进模型输入时的比例与填充
#[derive(Debug, Clone, Copy)]
struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

impl Letterbox {
    fn fit(width: u32, height: u32) -> Self {
        let scale = (INPUT_SIZE as f32 / width as f32).min(INPUT_SIZE as f32 / height as f32);
        let new_w = (width as f32 * scale).round();
        let new_h = (height as f32 * scale).round();
        Self {
            scale,
            pad_x: ((INPUT_SIZE as f32 - new_w) / 2.0).floor(),
            pad_y: ((INPUT_SIZE as f32 - new_h) / 2.0).floor(),
        }
    }

    fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

/// 单个步长对应的输出张量下标 (score, bbox, kps)
type HeadIndices = (usize, usize, usize);

pub struct FaceDetector {
    session: Session,
    heads: [HeadIndices; 3],
    score_threshold: f32,
}

impl FaceDetector {
    pub fn load(
        model_path: &str,
        intra_threads: usize,
        score_threshold: f32,
    ) -> Result<Self, DetectorError> {
        if !Path::new(model_path).exists() {
            return Err(DetectorError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(intra_threads)?
            .commit_from_file(model_path)?;

        let names: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();
        if names.len() < 9 {
            return Err(DetectorError::InferenceFailed(format!(
                "SCRFD model needs 9 outputs, found {}",
                names.len()
            )));
        }

        let heads = head_indices(&names);
        tracing::info!(path = model_path, outputs = ?names, ?heads, "SCRFD detector loaded");

        Ok(Self {
            session,
            heads,
            score_threshold,
        })
    }

    /// 检测人脸，按置信度从高到低
    pub fn detect(&mut self, image: &RgbImage) -> Result<Vec<FaceLocation>, DetectorError> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(Vec::new());
        }

        let letterbox = Letterbox::fit(image.width(), image.height());
        let input = to_tensor(image, &letterbox);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let mut candidates = Vec::new();
        for (pos, &stride) in STRIDES.iter().enumerate() {
            let (score_idx, bbox_idx, kps_idx) = self.heads[pos];
            let extract = |idx: usize, what: &'static str| {
                outputs[idx]
                    .try_extract_tensor::<f32>()
                    .map(|(_, data)| data)
                    .map_err(|e| {
                        DetectorError::InferenceFailed(format!("{what} stride {stride}: {e}"))
                    })
            };
            let scores = extract(score_idx, "scores")?;
            let boxes = extract(bbox_idx, "boxes")?;
            let kps = extract(kps_idx, "landmarks")?;

            candidates.extend(decode_head(
                scores,
                boxes,
                kps,
                stride,
                &letterbox,
                self.score_threshold,
            ));
        }

        Ok(suppress_overlaps(candidates, NMS_IOU_THRESHOLD))
    }
}

/// 缩放进填充后的正方形并归一化为 NCHW RGB 张量
fn to_tensor(image: &RgbImage, letterbox: &Letterbox) -> Array4<f32> {
    let new_w = ((image.width() as f32 * letterbox.scale).round() as u32).clamp(1, INPUT_SIZE);
    let new_h = ((image.height() as f32 * letterbox.scale).round() as u32).clamp(1, INPUT_SIZE);
    let resized = imageops::resize(image, new_w, new_h, FilterType::Triangle);

    let size = INPUT_SIZE as usize;
    // 填充区域为均值，归一化后为 0
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    let (off_x, off_y) = (letterbox.pad_x as u32, letterbox.pad_y as u32);

    for (x, y, pixel) in resized.enumerate_pixels() {
        let (tx, ty) = ((x + off_x) as usize, (y + off_y) as usize);
        if tx >= size || ty >= size {
            continue;
        }
        for c in 0..3 {
            tensor[[0, c, ty, tx]] = (pixel[c] as f32 - PIXEL_MEAN) / PIXEL_STD;
        }
    }

    tensor
}

/// 按输出名 ("score_8", "bbox_16", ...) 对应到各步长；
/// 名称不匹配时退回常见的导出顺序
fn head_indices(names: &[String]) -> [HeadIndices; 3] {
    let find = |prefix: &str, stride: usize| {
        let wanted = format!("{prefix}_{stride}");
        names.iter().position(|n| *n == wanted)
    };

    let mut named = [(0, 0, 0); 3];
    for (slot, &stride) in STRIDES.iter().enumerate() {
        match (
            find("score", stride),
            find("bbox", stride),
            find("kps", stride),
        ) {
            (Some(s), Some(b), Some(k)) => named[slot] = (s, b, k),
            _ => return [(0, 3, 6), (1, 4, 7), (2, 5, 8)],
        }
    }
    named
}

fn decode_head(
    scores: &[f32],
    boxes: &[f32],
    kps: &[f32],
    stride: usize,
    letterbox: &Letterbox,
    threshold: f32,
) -> Vec<FaceLocation> {
    let cells_per_row = INPUT_SIZE as usize / stride;
    let anchors = cells_per_row * cells_per_row * ANCHORS_PER_CELL;
    let step = stride as f32;

    (0..anchors)
        .filter_map(|idx| {
            let score = *scores.get(idx)?;
            if score <= threshold {
                return None;
            }

            let cell = idx / ANCHORS_PER_CELL;
            let ax = (cell % cells_per_row) as f32 * step;
            let ay = (cell / cells_per_row) as f32 * step;

            let b = boxes.get(idx * 4..idx * 4 + 4)?;
            let (x1, y1) = letterbox.to_source(ax - b[0] * step, ay - b[1] * step);
            let (x2, y2) = letterbox.to_source(ax + b[2] * step, ay + b[3] * step);

            let landmarks = kps.get(idx * 10..idx * 10 + 10).map(|k| {
                std::array::from_fn(|i| {
                    letterbox.to_source(ax + k[i * 2] * step, ay + k[i * 2 + 1] * step)
                })
            });

            Some(FaceLocation {
                x: x1,
                y: y1,
                width: x2 - x1,
                height: y2 - y1,
                confidence: score,
                landmarks,
            })
        })
        .collect()
}

/// 贪心非极大值抑制，结果按置信度排序
fn suppress_overlaps(mut candidates: Vec<FaceLocation>, iou_threshold: f32) -> Vec<FaceLocation> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<FaceLocation> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if kept.iter().all(|k| k.iou(&candidate) <= iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(x: f32, y: f32, size: f32, confidence: f32) -> FaceLocation {
        FaceLocation {
            x,
            y,
            width: size,
            height: size,
            confidence,
            landmarks: None,
        }
    }

    #[test]
    fn test_suppress_overlaps_keeps_strongest() {
        let result = suppress_overlaps(
            vec![
                face(5.0, 5.0, 100.0, 0.8),
                face(0.0, 0.0, 100.0, 0.9),
                face(200.0, 200.0, 50.0, 0.7),
            ],
            NMS_IOU_THRESHOLD,
        );
        let confidences: Vec<f32> = result.iter().map(|f| f.confidence).collect();
        assert_eq!(confidences, vec![0.9, 0.7]);
    }

    #[test]
    fn test_suppress_overlaps_empty() {
        assert!(suppress_overlaps(Vec::new(), NMS_IOU_THRESHOLD).is_empty());
    }

    #[test]
    fn test_letterbox_roundtrip() {
        let lb = Letterbox::fit(320, 240);
        assert_eq!(lb.scale, 2.0);
        assert_eq!(lb.pad_x, 0.0);
        assert_eq!(lb.pad_y, 80.0);

        let (x, y) = lb.to_source(100.0 * 2.0, 50.0 * 2.0 + 80.0);
        assert!((x - 100.0).abs() < 1e-4);
        assert!((y - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_head_indices_by_name() {
        let names: Vec<String> = [
            "bbox_8", "kps_8", "score_8", "bbox_16", "kps_16", "score_16", "bbox_32", "kps_32",
            "score_32",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(head_indices(&names), [(2, 0, 1), (5, 3, 4), (8, 6, 7)]);
    }

    #[test]
    fn test_head_indices_positional_fallback() {
        let names: Vec<String> = (0..9).map(|i| format!("{}", 440 + i)).collect();
        assert_eq!(head_indices(&names), [(0, 3, 6), (1, 4, 7), (2, 5, 8)]);
    }

    #[test]
    fn test_decode_head_maps_back_to_source() {
        let stride = 32;
        let cells = (INPUT_SIZE as usize / stride).pow(2) * ANCHORS_PER_CELL;
        let mut scores = vec![0.0f32; cells];
        let mut boxes = vec![0.0f32; cells * 4];
        let kps = vec![0.0f32; cells * 10];

        // 锚点 2 位于第 1 格 (x = 32, y = 0)，框向两侧各延伸一个步长
        scores[2] = 0.95;
        boxes[8..12].copy_from_slice(&[1.0, 0.0, 1.0, 2.0]);

        let lb = Letterbox {
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 0.0,
        };
        let faces = decode_head(&scores, &boxes, &kps, stride, &lb, 0.5);
        assert_eq!(faces.len(), 1);
        let f = &faces[0];
        assert_eq!((f.x, f.y, f.width, f.height), (0.0, 0.0, 64.0, 64.0));
        assert_eq!(f.landmarks.map(|l| l[0]), Some((32.0, 0.0)));
    }

    #[test]
    fn test_tensor_padding_is_zero() {
        let image = RgbImage::from_pixel(320, 160, image::Rgb([255, 255, 255]));
        let lb = Letterbox::fit(320, 160);
        let tensor = to_tensor(&image, &lb);
        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_eq!(tensor[[0, 0, 0, 0]], 0.0);
        let inside = tensor[[0, 1, 320, 320]];
        assert!((inside - (255.0 - PIXEL_MEAN) / PIXEL_STD).abs() < 1e-2);
    }
}
