use image::RgbImage;
use std::sync::Mutex;

use super::FaceEncoder;
use super::detector::FaceDetector;
use super::recognizer::FaceRecognizer;
use super::types::{Encoding, FaceLocation};
use crate::config::RecognitionConfig;
use crate::errors::{AttendanceError, Result};

/// SCRFD + ArcFace 编码器，推理时各会话需独占访问
pub struct OnnxFaceEncoder {
    detector: Mutex<FaceDetector>,
    recognizer: Mutex<FaceRecognizer>,
}

impl OnnxFaceEncoder {
    pub fn from_config(config: &RecognitionConfig) -> Result<Self> {
        let threads = config.intra_threads.max(1);
        let detector = FaceDetector::load(
            &config.detector_model,
            threads,
            config.detection_threshold,
        )?;
        let recognizer = FaceRecognizer::load(&config.recognizer_model, threads)?;

        Ok(Self {
            detector: Mutex::new(detector),
            recognizer: Mutex::new(recognizer),
        })
    }
}

fn poisoned(what: &str) -> AttendanceError {
    AttendanceError::encoder(format!("{what} session lock poisoned"))
}

impl FaceEncoder for OnnxFaceEncoder {
    fn face_locations(&self, image: &RgbImage) -> Result<Vec<FaceLocation>> {
        let mut detector = self.detector.lock().map_err(|_| poisoned("detector"))?;
        Ok(detector.detect(image)?)
    }

    fn face_encodings(
        &self,
        image: &RgbImage,
        locations: &[FaceLocation],
    ) -> Result<Vec<Encoding>> {
        let mut recognizer = self.recognizer.lock().map_err(|_| poisoned("recognizer"))?;
        locations
            .iter()
            .map(|face| recognizer.extract(image, face).map_err(Into::into))
            .collect()
    }
}
