use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::{
    DetectFuture, Detection, Detector, RecognitionHints, RecognizeFuture, RecognizedText,
    Recognizer,
};

/// Recorded output of both recognizers for one photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub detections: Vec<Detection>,
    #[serde(default)]
    pub recognized: Vec<RecognizedText>,
}

impl Capture {
    pub fn from_json(content: &str) -> Result<Self> {
        let capture: Capture = serde_json::from_str(content)?;
        if capture.width == 0 || capture.height == 0 {
            return Err(anyhow!(
                "capture has empty dimensions ({}x{})",
                capture.width,
                capture.height
            ));
        }
        Ok(capture)
    }

    pub fn detector(&self) -> ReplayDetector {
        ReplayDetector::new(self.detections.clone())
    }

    pub fn recognizer(&self) -> ReplayRecognizer {
        ReplayRecognizer::new(self.recognized.clone())
    }
}

pub fn load_capture(path: &Path) -> Result<Capture> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read capture: {}", path.display()))?;
    Capture::from_json(&content)
        .with_context(|| format!("failed to parse capture: {}", path.display()))
}

/// Detector that answers with recorded detections.
#[derive(Debug, Clone)]
pub struct ReplayDetector {
    detections: Arc<Vec<Detection>>,
}

impl ReplayDetector {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            detections: Arc::new(detections),
        }
    }
}

impl Detector for ReplayDetector {
    fn detect(&self, _image: Arc<DynamicImage>) -> DetectFuture {
        let detections = self.detections.clone();
        Box::pin(async move { Ok(detections.as_ref().clone()) })
    }
}

/// Recognizer that answers with recorded text spans.
#[derive(Debug, Clone)]
pub struct ReplayRecognizer {
    recognized: Arc<Vec<RecognizedText>>,
}

impl ReplayRecognizer {
    pub fn new(recognized: Vec<RecognizedText>) -> Self {
        Self {
            recognized: Arc::new(recognized),
        }
    }
}

impl Recognizer for ReplayRecognizer {
    fn recognize(&self, _image: Arc<DynamicImage>, _hints: RecognitionHints) -> RecognizeFuture {
        let recognized = self.recognized.clone();
        Box::pin(async move { Ok(recognized.as_ref().clone()) })
    }
}
