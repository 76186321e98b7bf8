use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use std::sync::Arc;
use tracing::{info, warn};

use crate::reading::{self, Glyph, Reading};
use crate::settings::Settings;
use crate::sources::{
    Detector, RecognitionHints, Recognizer, glyphs_from_detections, glyphs_from_recognized,
};

/// Drives both recognizers and the reading core for one photo.
pub struct Pipeline<D: Detector, R: Recognizer> {
    detector: D,
    recognizer: R,
    settings: Settings,
}

impl<D: Detector, R: Recognizer> Pipeline<D, R> {
    pub fn new(detector: D, recognizer: R, settings: Settings) -> Self {
        Self {
            detector,
            recognizer,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Deskews the photo if needed, then reads it.
    pub async fn read(&self, image: DynamicImage) -> Reading {
        let mut image = Arc::new(image);
        if self.settings.deskew {
            image = self.deskew(image).await;
        }
        let glyphs = self.collect_glyphs(image).await;
        reading::process_glyphs(&glyphs, &self.settings)
    }

    /// Rotates the photo level when its digits lean past the skew threshold.
    pub async fn deskew(&self, image: Arc<DynamicImage>) -> Arc<DynamicImage> {
        let detections = match self.detector.detect(image.clone()).await {
            Ok(detections) => detections,
            Err(err) => {
                warn!("deskew: detector failed: {:#}", err);
                return image;
            }
        };
        let glyphs = glyphs_from_detections(&detections, &self.settings.detector_classes);
        let thresholds = &self.settings.thresholds;
        let Some(angle) = reading::estimate_angle(&glyphs, thresholds.skew_height_tolerance)
        else {
            return image;
        };
        if angle.abs() <= thresholds.skew_min_angle {
            return image;
        }
        info!("deskew: rotating by {:.3} rad", angle);
        Arc::new(rotate(&image, angle))
    }

    /// Runs detector and recognizer concurrently and merges their glyphs,
    /// detector output first. A failing side contributes nothing.
    pub async fn collect_glyphs(&self, image: Arc<DynamicImage>) -> Vec<Glyph> {
        let (width, height) = (image.width(), image.height());
        let hints = RecognitionHints::from_settings(&self.settings);
        let (detected, recognized) = tokio::join!(
            self.detector.detect(image.clone()),
            self.recognizer.recognize(image, hints)
        );

        let detected = detected.unwrap_or_else(|err| {
            warn!("detector failed: {:#}", err);
            Vec::new()
        });
        let recognized = recognized.unwrap_or_else(|err| {
            warn!("recognizer failed: {:#}", err);
            Vec::new()
        });
        if detected.is_empty() {
            warn!("detector returned no boxes");
        }
        if recognized.is_empty() {
            warn!("recognizer returned no text");
        }

        let mut glyphs = glyphs_from_detections(&detected, &self.settings.detector_classes);
        let detector_count = glyphs.len();
        glyphs.extend(glyphs_from_recognized(&recognized, width, height));
        info!(
            "collected {} detector glyphs, {} recognizer glyphs",
            detector_count,
            glyphs.len() - detector_count
        );
        glyphs
    }
}

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Rotates about the center onto a canvas grown to hold the rotated bounds.
fn rotate(image: &DynamicImage, angle: f32) -> DynamicImage {
    let rgba = image.to_rgba8();
    let (width, height) = (rgba.width() as f32, rgba.height() as f32);
    let (sin, cos) = angle.sin_cos();
    let out_width = fit_extent(width * cos.abs() + height * sin.abs());
    let out_height = fit_extent(width * sin.abs() + height * cos.abs());

    let projection = Projection::translate(out_width as f32 / 2.0, out_height as f32 / 2.0)
        * Projection::rotate(angle)
        * Projection::translate(-width / 2.0, -height / 2.0);
    let mut out = RgbaImage::from_pixel(out_width, out_height, BACKGROUND);
    warp_into(&rgba, &projection, Interpolation::Bilinear, BACKGROUND, &mut out);
    DynamicImage::ImageRgba8(out)
}

// Trig noise on exact quarter turns must not add a pixel.
fn fit_extent(extent: f32) -> u32 {
    ((extent - 1e-3).ceil().max(1.0)) as u32
}
