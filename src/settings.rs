use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub keywords: DeviceKeywords,
    pub labels: LabelKeywords,
    pub glucose_units: GlucoseMarkers,
    pub detector_classes: Vec<String>,
    pub recognizer_words: Vec<String>,
    pub recognizer_languages: Vec<String>,
    pub thresholds: Thresholds,
    pub deskew: bool,
    pub classify_fallback: bool,
}

/// Keyword lists used to tell devices apart.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceKeywords {
    pub blood_pressure: Vec<String>,
    pub glucose: Vec<String>,
    pub weight: Vec<String>,
    pub temperature: Vec<String>,
    /// Keywords that only match at the start of a fragment.
    pub prefix_tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelKeywords {
    pub systolic: Vec<String>,
    pub diastolic: Vec<String>,
    pub mean_arterial: Vec<String>,
    pub pulse: Vec<String>,
    pub unit_marker: String,
    pub mean_arterial_max_len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlucoseMarkers {
    pub mg_dl: String,
    pub mmol_l: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    pub dedup_limit: usize,
    pub dedup_iou: f32,
    pub min_glyph_height: f32,
    pub height_disparity: f32,
    pub column_spacing_factor: f32,
    pub skew_height_tolerance: f32,
    pub skew_min_angle: f32,
    pub plausible_min: u32,
    pub plausible_max: u32,
    pub bp_min_rows: usize,
}

impl Thresholds {
    /// Physiologically plausible blood-pressure and pulse values.
    pub fn plausible_range(&self) -> RangeInclusive<u32> {
        self.plausible_min..=self.plausible_max
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            dedup_limit: 20,
            dedup_iou: 0.5,
            min_glyph_height: 10.0,
            height_disparity: 1.5,
            column_spacing_factor: 1.3,
            skew_height_tolerance: 40.0,
            skew_min_angle: 0.15,
            plausible_min: 39,
            plausible_max: 270,
            bp_min_rows: 3,
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            keywords: DeviceKeywords {
                blood_pressure: strings(&[
                    "mmHg", "DIA", "SYS", "血壓", "脈拍", "BPM", "收縮", "舒張", "舒张", "最高血压",
                    "血压", "脉博", "WatchBP", "/min", "最低", "最高",
                ]),
                glucose: strings(&["mmo", "/L", "mimo", "mg", "mmol"]),
                weight: strings(&["kg", "bmi"]),
                temperature: strings(&["°C"]),
                prefix_tokens: strings(&["SYS", "DIA", "BPM", "mg"]),
            },
            labels: LabelKeywords {
                systolic: strings(&["SYS", "SY", "最高", "最高血", "高压", "高", "收", "縮", "收缩压"]),
                diastolic: strings(&["DIA", "DI", "最低", "最低血", "低压", "低", "舒", "張", "张"]),
                mean_arterial: strings(&["MAP", "Ma"]),
                pulse: strings(&[
                    "Pulse", "脈拍", "BPM", "BRM", "PUL", "脈", "拍", "心率", "搏", "脉", "/分",
                    "/min",
                ]),
                unit_marker: "mm".to_string(),
                mean_arterial_max_len: 4,
            },
            glucose_units: GlucoseMarkers {
                mg_dl: "mg".to_string(),
                mmol_l: "mmo".to_string(),
            },
            detector_classes: strings(&[
                "1", "2", "3", "4", "5", "6", "7", "8", "9", "0", "mgdl", "mmol", "°C",
            ]),
            recognizer_words: strings(&[
                "mmHg", "DIA", "SYS", "血壓", "脈拍", "BPM", "收縮", "舒張", "舒张", "最高血压",
                "最低血压", "血压", "脉博", "/min", "最低", "最高", "Pulse", "mg/dL", "mmol/L",
            ]),
            recognizer_languages: strings(&["zh-Hans", "zh-Hant"]),
            thresholds: Thresholds::default(),
            deskew: true,
            classify_fallback: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    keywords: Option<KeywordSettings>,
    labels: Option<LabelSettings>,
    glucose: Option<GlucoseSettings>,
    detector: Option<DetectorSettings>,
    recognizer: Option<RecognizerSettings>,
    thresholds: Option<ThresholdSettings>,
    pipeline: Option<PipelineSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct KeywordSettings {
    blood_pressure: Option<Vec<String>>,
    glucose: Option<Vec<String>>,
    weight: Option<Vec<String>>,
    temperature: Option<Vec<String>>,
    prefix_tokens: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct LabelSettings {
    systolic: Option<Vec<String>>,
    diastolic: Option<Vec<String>>,
    mean_arterial: Option<Vec<String>>,
    pulse: Option<Vec<String>>,
    unit_marker: Option<String>,
    mean_arterial_max_len: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct GlucoseSettings {
    mg_dl: Option<String>,
    mmol_l: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DetectorSettings {
    classes: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RecognizerSettings {
    custom_words: Option<Vec<String>>,
    languages: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ThresholdSettings {
    dedup_limit: Option<usize>,
    dedup_iou: Option<f32>,
    min_glyph_height: Option<f32>,
    height_disparity: Option<f32>,
    column_spacing_factor: Option<f32>,
    skew_height_tolerance: Option<f32>,
    skew_min_angle: Option<f32>,
    plausible_min: Option<u32>,
    plausible_max: Option<u32>,
    bp_min_rows: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct PipelineSettings {
    deskew: Option<bool>,
    classify_fallback: Option<bool>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = user_settings_dir() {
        ordered_paths.push(home.join("settings.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings
                .merge_toml(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
        }
    }

    Ok(settings)
}

impl Settings {
    /// Applies every field present in a TOML document on top of `self`.
    pub fn merge_toml(&mut self, content: &str) -> Result<()> {
        let parsed: SettingsFile = toml::from_str(content)?;
        self.merge(parsed);
        Ok(())
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(keywords) = incoming.keywords {
            replace_list(&mut self.keywords.blood_pressure, keywords.blood_pressure);
            replace_list(&mut self.keywords.glucose, keywords.glucose);
            replace_list(&mut self.keywords.weight, keywords.weight);
            replace_list(&mut self.keywords.temperature, keywords.temperature);
            if let Some(tokens) = keywords.prefix_tokens {
                self.keywords.prefix_tokens = tokens;
            }
        }
        if let Some(labels) = incoming.labels {
            replace_list(&mut self.labels.systolic, labels.systolic);
            replace_list(&mut self.labels.diastolic, labels.diastolic);
            replace_list(&mut self.labels.mean_arterial, labels.mean_arterial);
            replace_list(&mut self.labels.pulse, labels.pulse);
            replace_text(&mut self.labels.unit_marker, labels.unit_marker);
            if let Some(len) = labels.mean_arterial_max_len {
                if len > 0 {
                    self.labels.mean_arterial_max_len = len;
                }
            }
        }
        if let Some(glucose) = incoming.glucose {
            replace_text(&mut self.glucose_units.mg_dl, glucose.mg_dl);
            replace_text(&mut self.glucose_units.mmol_l, glucose.mmol_l);
        }
        if let Some(detector) = incoming.detector {
            replace_list(&mut self.detector_classes, detector.classes);
        }
        if let Some(recognizer) = incoming.recognizer {
            replace_list(&mut self.recognizer_words, recognizer.custom_words);
            replace_list(&mut self.recognizer_languages, recognizer.languages);
        }
        if let Some(thresholds) = incoming.thresholds {
            self.thresholds.merge(thresholds);
        }
        if let Some(pipeline) = incoming.pipeline {
            if let Some(deskew) = pipeline.deskew {
                self.deskew = deskew;
            }
            if let Some(fallback) = pipeline.classify_fallback {
                self.classify_fallback = fallback;
            }
        }
    }
}

impl Thresholds {
    fn merge(&mut self, incoming: ThresholdSettings) {
        if let Some(limit) = incoming.dedup_limit {
            if limit > 0 {
                self.dedup_limit = limit;
            }
        }
        replace_positive(&mut self.dedup_iou, incoming.dedup_iou);
        replace_positive(&mut self.min_glyph_height, incoming.min_glyph_height);
        replace_positive(&mut self.height_disparity, incoming.height_disparity);
        replace_positive(&mut self.column_spacing_factor, incoming.column_spacing_factor);
        replace_positive(&mut self.skew_height_tolerance, incoming.skew_height_tolerance);
        replace_positive(&mut self.skew_min_angle, incoming.skew_min_angle);
        if let Some(min) = incoming.plausible_min {
            self.plausible_min = min;
        }
        if let Some(max) = incoming.plausible_max {
            if max > 0 {
                self.plausible_max = max;
            }
        }
        if let Some(rows) = incoming.bp_min_rows {
            if rows > 0 {
                self.bp_min_rows = rows;
            }
        }
    }
}

fn replace_list(target: &mut Vec<String>, incoming: Option<Vec<String>>) {
    if let Some(values) = incoming {
        let values = values
            .into_iter()
            .filter(|value| !value.trim().is_empty())
            .collect::<Vec<_>>();
        if !values.is_empty() {
            *target = values;
        }
    }
}

fn replace_text(target: &mut String, incoming: Option<String>) {
    if let Some(value) = incoming {
        if !value.trim().is_empty() {
            *target = value;
        }
    }
}

fn replace_positive(target: &mut f32, incoming: Option<f32>) {
    if let Some(value) = incoming {
        if value > 0.0 {
            *target = value;
        }
    }
}

pub(crate) fn user_settings_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".meter-reading"))
        }
    })
}
