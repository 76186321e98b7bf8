mod assemble;
mod dedup;
mod device;
mod geom;
mod labels;
mod rows;
mod skew;
mod units;

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::settings::Settings;

pub use assemble::{assign_nearest, format_glucose, format_temperature};
pub use dedup::dedup;
pub use device::classify;
pub use geom::{Rect, iou};
pub use labels::locate_labels;
pub use rows::{cluster_regions, cluster_rows};
pub use skew::estimate_angle;
pub use units::{GlucoseUnit, Metric, UnitKind};

/// Which recognizer produced a glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Digit class from the object detector.
    Number,
    /// Unit/mark class from the object detector.
    Mark,
    /// Free-form span from the text recognizer.
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Glyph {
    pub bbox: Rect,
    pub text: String,
    pub confidence: f32,
    pub source: SourceKind,
}

impl Glyph {
    pub fn new(bbox: Rect, text: impl Into<String>, confidence: f32, source: SourceKind) -> Self {
        Self {
            bbox,
            text: text.into(),
            confidence,
            source,
        }
    }
}

/// Digits merged into one logical field, e.g. "120".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberRegion {
    pub bbox: Rect,
    pub text: String,
}

impl NumberRegion {
    /// Integer value, or `None` when the text is not a number.
    pub fn value(&self) -> Option<u32> {
        self.text.parse().ok()
    }
}

/// Row index to the glyphs of that row, left to right.
pub type RowMap = BTreeMap<usize, Vec<Glyph>>;

/// Where the blood-pressure labels sit on the display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelPositions {
    pub sys: Option<Rect>,
    pub dia: Option<Rect>,
    pub pulse: Option<Rect>,
    pub map: Option<Rect>,
    pub mmhg: Vec<Rect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    BloodPressure,
    Thermometer,
    GlucoseMeter,
    Scale,
    Undefined,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::BloodPressure => "blood_pressure",
            DeviceType::Thermometer => "thermometer",
            DeviceType::GlucoseMeter => "glucose_meter",
            DeviceType::Scale => "scale",
            DeviceType::Undefined => "undefined",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultItem {
    pub metric: Metric,
    pub value: String,
    pub unit: UnitKind,
}

impl ResultItem {
    pub fn new(metric: Metric, value: impl Into<String>, unit: UnitKind) -> Self {
        Self {
            metric,
            value: value.into(),
            unit,
        }
    }
}

/// Outcome of reading one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub device: DeviceType,
    pub items: Vec<ResultItem>,
}

impl Reading {
    /// Message for the one condition surfaced to the user.
    pub fn failure(&self) -> Option<&'static str> {
        match self.device {
            DeviceType::Undefined => Some("unable to determine the device type"),
            _ => None,
        }
    }
}

/// Turns merged glyphs from both recognizers into a reading.
pub fn process_glyphs(glyphs: &[Glyph], settings: &Settings) -> Reading {
    let thresholds = &settings.thresholds;
    let numbers = glyphs
        .iter()
        .filter(|glyph| glyph.source == SourceKind::Number)
        .cloned()
        .collect::<Vec<_>>();
    let numbers = dedup(numbers, thresholds.dedup_limit, thresholds.dedup_iou);
    let rows = cluster_rows(&numbers, thresholds);
    for (index, row) in &rows {
        let text = row.iter().map(|glyph| glyph.text.as_str()).collect::<String>();
        debug!("row {}: {}", index, text);
    }

    let texts = glyphs
        .iter()
        .map(|glyph| glyph.text.as_str())
        .collect::<Vec<_>>();
    let device = classify(&texts, rows.len(), settings);
    info!(
        "reading: {} glyphs, {} numbers kept, {} rows, device={}",
        glyphs.len(),
        numbers.len(),
        rows.len(),
        device.as_str()
    );

    let items = assemble::assemble(device, glyphs, &rows, settings);
    Reading { device, items }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digit(text: &str, x: f32, y: f32) -> Glyph {
        Glyph::new(Rect::new(x, y, 20.0, 40.0), text, 0.9, SourceKind::Number)
    }

    fn text(text: &str, x: f32, y: f32, w: f32) -> Glyph {
        Glyph::new(Rect::new(x, y, w, 20.0), text, 0.8, SourceKind::Text)
    }

    #[test]
    fn thermometer_reading_from_digits() {
        let glyphs = vec![
            digit("3", 100.0, 100.0),
            digit("6", 122.0, 100.0),
            digit("5", 144.0, 100.0),
            text("°C", 180.0, 100.0, 30.0),
        ];
        let reading = process_glyphs(&glyphs, &Settings::default());
        assert_eq!(reading.device, DeviceType::Thermometer);
        assert_eq!(
            reading.items,
            vec![ResultItem::new(Metric::Temperature, "36.5", UnitKind::Celsius)]
        );
        assert_eq!(reading.failure(), None);
    }

    #[test]
    fn overlapping_duplicate_digits_are_suppressed_before_clustering() {
        let mut glyphs = vec![
            digit("3", 100.0, 100.0),
            digit("6", 122.0, 100.0),
            digit("5", 144.0, 100.0),
        ];
        glyphs.push(Glyph::new(
            Rect::new(101.0, 100.0, 20.0, 40.0),
            "8",
            0.4,
            SourceKind::Number,
        ));
        let reading = process_glyphs(&glyphs, &Settings::default());
        assert_eq!(reading.items[0].value, "36.5");
    }

    #[test]
    fn scale_produces_no_value() {
        let glyphs = vec![
            digit("6", 100.0, 100.0),
            digit("2", 122.0, 100.0),
            text("kg", 150.0, 100.0, 30.0),
        ];
        let reading = process_glyphs(&glyphs, &Settings::default());
        assert_eq!(reading.device, DeviceType::Scale);
        assert!(reading.items.is_empty());
    }

    #[test]
    fn undefined_device_is_reported() {
        let mut settings = Settings::default();
        settings.classify_fallback = false;
        let reading = process_glyphs(&[digit("1", 0.0, 0.0)], &settings);
        assert_eq!(reading.device, DeviceType::Undefined);
        assert!(reading.items.is_empty());
        assert!(reading.failure().is_some());
    }

    #[test]
    fn empty_input_defaults_to_thermometer_without_items() {
        let reading = process_glyphs(&[], &Settings::default());
        assert_eq!(reading.device, DeviceType::Thermometer);
        assert!(reading.items.is_empty());
    }
}
