use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use std::path::Path;

pub mod logging;
pub mod pipeline;
pub mod reading;
pub mod settings;
pub mod sources;
#[cfg(test)]
mod test_util;

pub use pipeline::Pipeline;
pub use reading::{DeviceType, Glyph, Metric, Reading, ResultItem, UnitKind, process_glyphs};
pub use settings::Settings;
pub use sources::{Capture, Detector, Recognizer};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub capture: String,
    pub image: Option<String>,
    pub settings_path: Option<String>,
    pub no_deskew: bool,
    pub json: bool,
}

pub async fn run(config: Config) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let mut settings = settings::load_settings(settings_path)?;
    if config.no_deskew {
        settings.deskew = false;
    }

    let capture = sources::load_capture(Path::new(&config.capture))?;
    let image = match config.image.as_deref() {
        Some(path) => {
            image::open(path).with_context(|| format!("failed to open image: {}", path))?
        }
        None => DynamicImage::new_rgb8(capture.width, capture.height),
    };

    let pipeline = Pipeline::new(capture.detector(), capture.recognizer(), settings);
    let reading = pipeline.read(image).await;
    if let Some(message) = reading.failure() {
        return Err(anyhow!(message));
    }

    if config.json {
        return serde_json::to_string_pretty(&reading).context("failed to encode reading");
    }
    Ok(format_reading(&reading))
}

fn format_reading(reading: &Reading) -> String {
    let mut lines = vec![format!("device: {}", reading.device.as_str())];
    for item in &reading.items {
        let value = if item.value.is_empty() {
            "-"
        } else {
            item.value.as_str()
        };
        lines.push(format!(
            "{}\t{}\t{}",
            item.metric.display_name(),
            value,
            item.unit.display_name()
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn plain_output_lists_items_per_line() {
        let reading = Reading {
            device: DeviceType::BloodPressure,
            items: vec![
                ResultItem::new(Metric::Systolic, "120", UnitKind::MmHg),
                ResultItem::new(Metric::Diastolic, "", UnitKind::MmHg),
            ],
        };
        assert_eq!(
            format_reading(&reading),
            "device: blood_pressure\nSystolic\t120\tmmHg\nDiastolic\t-\tmmHg"
        );
    }

    #[test]
    fn plain_output_without_items() {
        let reading = Reading {
            device: DeviceType::Scale,
            items: Vec::new(),
        };
        assert_eq!(format_reading(&reading), "device: scale");
    }

    #[tokio::test]
    async fn run_reads_a_capture_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        let capture = r#"{
            "width": 400,
            "height": 300,
            "detections": [
                {"bbox": {"x": 100.0, "y": 100.0, "width": 20.0, "height": 40.0}, "class_index": 2, "confidence": 0.9},
                {"bbox": {"x": 122.0, "y": 100.0, "width": 20.0, "height": 40.0}, "class_index": 6, "confidence": 0.9},
                {"bbox": {"x": 144.0, "y": 100.0, "width": 20.0, "height": 40.0}, "class_index": 7, "confidence": 0.9}
            ],
            "recognized": [
                {"bbox": {"x": 0.5, "y": 0.5, "width": 0.25, "height": 0.25}, "text": "°C", "confidence": 0.9}
            ]
        }"#;
        file.write_all(capture.as_bytes()).expect("write");
        let output = run(Config {
            capture: file.path().display().to_string(),
            ..Config::default()
        })
        .await
        .expect("run");
        assert_eq!(output, "device: thermometer\nTemperature\t37.8\t°C");
    }

    #[tokio::test]
    async fn run_reports_missing_image() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(br#"{"width": 10, "height": 10}"#)
            .expect("write");
        let err = run(Config {
            capture: file.path().display().to_string(),
            image: Some("/nonexistent/photo.png".to_string()),
            ..Config::default()
        })
        .await
        .unwrap_err();
        assert!(format!("{:#}", err).contains("failed to open image"));
    }
}
