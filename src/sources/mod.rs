use anyhow::Result;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

use crate::reading::{Glyph, Rect, SourceKind};
use crate::settings::Settings;

mod replay;

pub use replay::{Capture, ReplayDetector, ReplayRecognizer, load_capture};

/// Highest class index that denotes a digit.
const LAST_DIGIT_CLASS: usize = 9;

/// One box from the object detector, in image pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: Rect,
    pub class_index: usize,
    pub confidence: f32,
}

/// One span from the text recognizer.
///
/// `bbox` is normalized to 0..1 with the origin at the bottom-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedText {
    pub bbox: Rect,
    pub text: String,
    pub confidence: f32,
}

/// Vocabulary and language hints passed to the text recognizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognitionHints {
    pub custom_words: Vec<String>,
    pub languages: Vec<String>,
}

impl RecognitionHints {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            custom_words: settings.recognizer_words.clone(),
            languages: settings.recognizer_languages.clone(),
        }
    }
}

pub type DetectFuture = Pin<Box<dyn Future<Output = Result<Vec<Detection>>> + Send>>;
pub type RecognizeFuture = Pin<Box<dyn Future<Output = Result<Vec<RecognizedText>>> + Send>>;

pub trait Detector: Send + Sync {
    fn detect(&self, image: Arc<DynamicImage>) -> DetectFuture;
}

pub trait Recognizer: Send + Sync {
    fn recognize(&self, image: Arc<DynamicImage>, hints: RecognitionHints) -> RecognizeFuture;
}

/// Maps detector classes to glyphs: 0-9 are digits, anything above is a mark.
pub fn glyphs_from_detections(detections: &[Detection], classes: &[String]) -> Vec<Glyph> {
    detections
        .iter()
        .filter_map(|detection| {
            let Some(text) = classes.get(detection.class_index) else {
                debug!("detector: unknown class index {}", detection.class_index);
                return None;
            };
            let source = if detection.class_index > LAST_DIGIT_CLASS {
                SourceKind::Mark
            } else {
                SourceKind::Number
            };
            Some(Glyph::new(
                detection.bbox,
                text.clone(),
                detection.confidence,
                source,
            ))
        })
        .collect()
}

/// Converts recognizer spans to pixel space, flipping the vertical axis.
pub fn glyphs_from_recognized(texts: &[RecognizedText], width: u32, height: u32) -> Vec<Glyph> {
    let (width, height) = (width as f32, height as f32);
    texts
        .iter()
        .filter(|span| !span.text.trim().is_empty())
        .map(|span| {
            let norm = span.bbox;
            let bbox = Rect::new(
                norm.x * width,
                (1.0 - norm.y - norm.height) * height,
                norm.width * width,
                norm.height * height,
            );
            Glyph::new(bbox, span.text.clone(), span.confidence, SourceKind::Text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detector_classes_split_into_digits_and_marks() {
        let classes = Settings::default().detector_classes;
        let detections = vec![
            Detection {
                bbox: Rect::new(0.0, 0.0, 10.0, 20.0),
                class_index: 9,
                confidence: 0.8,
            },
            Detection {
                bbox: Rect::new(20.0, 0.0, 30.0, 20.0),
                class_index: 10,
                confidence: 0.7,
            },
            Detection {
                bbox: Rect::new(20.0, 0.0, 30.0, 20.0),
                class_index: 99,
                confidence: 0.7,
            },
        ];
        let glyphs = glyphs_from_detections(&detections, &classes);
        assert_eq!(glyphs.len(), 2);
        assert_eq!(glyphs[0].text, "0");
        assert_eq!(glyphs[0].source, SourceKind::Number);
        assert_eq!(glyphs[1].text, "mgdl");
        assert_eq!(glyphs[1].source, SourceKind::Mark);
    }

    #[test]
    fn recognizer_boxes_are_flipped_into_pixels() {
        let spans = vec![
            RecognizedText {
                bbox: Rect::new(0.25, 0.5, 0.5, 0.25),
                text: "SYS".to_string(),
                confidence: 1.0,
            },
            RecognizedText {
                bbox: Rect::new(0.0, 0.0, 0.1, 0.1),
                text: "  ".to_string(),
                confidence: 1.0,
            },
        ];
        let glyphs = glyphs_from_recognized(&spans, 400, 200);
        assert_eq!(glyphs.len(), 1);
        assert_eq!(glyphs[0].bbox, Rect::new(100.0, 50.0, 200.0, 50.0));
        assert_eq!(glyphs[0].source, SourceKind::Text);
    }

    #[test]
    fn hints_follow_settings() {
        let hints = RecognitionHints::from_settings(&Settings::default());
        assert!(hints.custom_words.iter().any(|word| word == "mmHg"));
        assert_eq!(hints.languages, vec!["zh-Hans", "zh-Hant"]);
    }
}
