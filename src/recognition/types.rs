use serde::{Deserialize, Serialize};

/// 检测到的人脸框，原图像素坐标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceLocation {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// 五点关键点：[左眼, 右眼, 鼻尖, 左嘴角, 右嘴角]
    pub landmarks: Option<[(f32, f32); 5]>,
}

impl FaceLocation {
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// 与另一个框的交并比
    pub fn iou(&self, other: &FaceLocation) -> f32 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        let inter = (right - left).max(0.0) * (bottom - top).max(0.0);
        let union = self.area() + other.area() - inter;

        if union > 0.0 { inter / union } else { 0.0 }
    }
}

/// [`FaceEncoder`](super::FaceEncoder) 输出的定长人脸编码
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encoding {
    pub values: Vec<f32>,
}

impl Encoding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// 欧氏距离，越小越相似
    ///
    /// 长度不同的编码来自不同编码器，距离视为无穷大。
    pub fn distance(&self, other: &Encoding) -> f32 {
        if self.values.len() != other.values.len() {
            return f32::INFINITY;
        }
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }

    /// 缩放到单位 L2 范数；零向量原样返回
    pub fn normalized(values: Vec<f32>) -> Self {
        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            Self::new(values.into_iter().map(|v| v / norm).collect())
        } else {
            Self::new(values)
        }
    }
}
