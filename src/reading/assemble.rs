use std::ops::RangeInclusive;

use tracing::debug;

use super::labels::locate_labels;
use super::rows::cluster_regions;
use super::{
    DeviceType, Glyph, GlucoseUnit, Metric, NumberRegion, Rect, ResultItem, RowMap, UnitKind,
};
use crate::settings::Settings;

pub(super) fn assemble(
    device: DeviceType,
    glyphs: &[Glyph],
    rows: &RowMap,
    settings: &Settings,
) -> Vec<ResultItem> {
    match device {
        DeviceType::BloodPressure => blood_pressure(glyphs, rows, settings),
        DeviceType::Thermometer => primary_digits(rows)
            .map(|digits| {
                vec![ResultItem::new(
                    Metric::Temperature,
                    format_temperature(&digits),
                    UnitKind::Celsius,
                )]
            })
            .unwrap_or_default(),
        DeviceType::GlucoseMeter => {
            let Some(digits) = primary_digits(rows) else {
                return Vec::new();
            };
            let unit = detect_glucose_unit(glyphs, settings);
            match format_glucose(&digits, unit) {
                Some((value, unit)) => {
                    vec![ResultItem::new(Metric::GlucoseLevel, value, unit.unit())]
                }
                None => {
                    debug!("glucose: no unit guess for digits {}", digits);
                    Vec::new()
                }
            }
        }
        DeviceType::Scale | DeviceType::Undefined => Vec::new(),
    }
}

fn blood_pressure(glyphs: &[Glyph], rows: &RowMap, settings: &Settings) -> Vec<ResultItem> {
    let labels = locate_labels(glyphs, &settings.labels);
    let regions = cluster_regions(rows, &settings.thresholds);
    let range = settings.thresholds.plausible_range();
    for region in &regions {
        debug!("bp region {} at {:?}", region.text, region.bbox);
    }

    let all = regions.clone();
    let mut pool = regions;

    let sys = match labels.sys {
        Some(rect) => assign_nearest(&rect, &mut pool, &range),
        None => {
            let idx = highest_value(&pool, &range);
            take(&mut pool, idx)
        }
    };
    let dia = match labels.dia {
        Some(rect) => assign_nearest(&rect, &mut pool, &range),
        None => {
            let idx = nearest_to_maximum(&pool, &all, &range);
            take(&mut pool, idx)
        }
    };
    let pulse = match labels.pulse {
        Some(rect) => assign_nearest(&rect, &mut pool, &range),
        None => {
            let idx = lowest_on_display(&pool, &range);
            take(&mut pool, idx)
        }
    };

    [
        (Metric::Systolic, sys, labels.sys.is_some()),
        (Metric::Diastolic, dia, labels.dia.is_some()),
        (Metric::Pulse, pulse, labels.pulse.is_some()),
    ]
    .into_iter()
    .map(|(metric, region, labelled)| {
        let value = region.map(|region| region.text).unwrap_or_default();
        debug!(
            "bp {}: '{}' ({})",
            metric.display_name(),
            value,
            if labelled { "label" } else { "fallback" }
        );
        ResultItem::new(metric, value, metric.unit())
    })
    .collect()
}

/// Takes the plausible region closest to `label` out of `regions`.
///
/// Candidates are 2-3 digit values inside `range` that either straddle the
/// label's center row (left/right) or its center column (up/down). When both
/// directions have a candidate the one nearer in straight-line distance wins.
pub fn assign_nearest(
    label: &Rect,
    regions: &mut Vec<NumberRegion>,
    range: &RangeInclusive<u32>,
) -> Option<NumberRegion> {
    let mid_x = label.center_x();
    let mid_y = label.center_y();
    let candidates = regions
        .iter()
        .enumerate()
        .filter(|(_, region)| is_plausible_reading(region, range))
        .collect::<Vec<_>>();

    let beside = candidates
        .iter()
        .filter(|(_, region)| region.bbox.spans_y(mid_y))
        .min_by(|(_, a), (_, b)| {
            (mid_x - a.bbox.center_x())
                .abs()
                .total_cmp(&(mid_x - b.bbox.center_x()).abs())
        })
        .map(|(idx, _)| *idx);
    let above_below = candidates
        .iter()
        .filter(|(_, region)| region.bbox.spans_x(mid_x))
        .min_by(|(_, a), (_, b)| {
            (mid_y - a.bbox.center_y())
                .abs()
                .total_cmp(&(mid_y - b.bbox.center_y()).abs())
        })
        .map(|(idx, _)| *idx);

    let chosen = match (beside, above_below) {
        (Some(h), Some(v)) => {
            let dh = label.center_distance(&regions[h].bbox);
            let dv = label.center_distance(&regions[v].bbox);
            Some(if dh < dv { h } else { v })
        }
        (h, v) => h.or(v),
    };
    chosen.map(|idx| regions.remove(idx))
}

fn is_plausible_reading(region: &NumberRegion, range: &RangeInclusive<u32>) -> bool {
    let length = region.text.chars().count();
    (2..=3).contains(&length)
        && region
            .value()
            .map(|value| range.contains(&value))
            .unwrap_or(false)
}

fn in_range(region: &NumberRegion, range: &RangeInclusive<u32>) -> bool {
    region
        .value()
        .map(|value| range.contains(&value))
        .unwrap_or(false)
}

fn take(pool: &mut Vec<NumberRegion>, idx: Option<usize>) -> Option<NumberRegion> {
    idx.map(|idx| pool.remove(idx))
}

/// Systolic fallback: the largest plausible value.
fn highest_value(pool: &[NumberRegion], range: &RangeInclusive<u32>) -> Option<usize> {
    first_max_by(pool, |region| {
        in_range(region, range).then(|| region.value().unwrap_or(0) as f32)
    })
}

/// Diastolic fallback: the plausible value nearest the run's maximum value.
fn nearest_to_maximum(
    pool: &[NumberRegion],
    all: &[NumberRegion],
    range: &RangeInclusive<u32>,
) -> Option<usize> {
    let anchor_idx = first_max_by(all, |region| Some(region.value().unwrap_or(0) as f32))?;
    let anchor = &all[anchor_idx];
    first_max_by(pool, |region| {
        (in_range(region, range) && region.text != anchor.text)
            .then(|| -region.bbox.center_distance(&anchor.bbox))
    })
}

/// Pulse fallback: the plausible value printed lowest on the display.
fn lowest_on_display(pool: &[NumberRegion], range: &RangeInclusive<u32>) -> Option<usize> {
    first_max_by(pool, |region| {
        in_range(region, range).then(|| region.bbox.center_y())
    })
}

/// Index of the first element with the greatest key; `None` keys are skipped.
fn first_max_by<T>(items: &[T], key: impl Fn(&T) -> Option<f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, item) in items.iter().enumerate() {
        let Some(score) = key(item) else {
            continue;
        };
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Digits of the main reading: the multi-glyph row drawn in the largest font.
fn primary_digits(rows: &RowMap) -> Option<String> {
    let heights = rows
        .values()
        .filter(|row| row.len() > 1)
        .collect::<Vec<_>>();
    let idx = first_max_by(&heights, |row| row.first().map(|glyph| glyph.bbox.height))?;
    Some(heights[idx].iter().map(|glyph| glyph.text.as_str()).collect())
}

/// Unit marker read off the display; the last glyph carrying one decides.
fn detect_glucose_unit(glyphs: &[Glyph], settings: &Settings) -> Option<GlucoseUnit> {
    let markers = &settings.glucose_units;
    glyphs.iter().rev().find_map(|glyph| {
        let lower = glyph.text.to_lowercase();
        if contains_marker(&lower, &markers.mg_dl) {
            Some(GlucoseUnit::MgDl)
        } else if contains_marker(&lower, &markers.mmol_l) {
            Some(GlucoseUnit::MmolL)
        } else {
            None
        }
    })
}

fn contains_marker(lower: &str, marker: &str) -> bool {
    !marker.is_empty() && lower.contains(&marker.to_lowercase())
}

/// Places the decimal point of a thermometer digit string.
pub fn format_temperature(digits: &str) -> String {
    match digits.chars().count() {
        3 => insert_point(digits, 1),
        4 => insert_point(digits, 2),
        _ => digits.to_string(),
    }
}

/// Formats a glucose digit string, guessing the unit when none was read.
///
/// Without a unit: two digits starting at most with 6 read as mmol/L, three
/// digits whose first two exceed 12 read as mg/dL; anything else is
/// rejected.
pub fn format_glucose(digits: &str, unit: Option<GlucoseUnit>) -> Option<(String, GlucoseUnit)> {
    let length = digits.chars().count();
    let unit = match unit {
        Some(unit) => unit,
        None if length == 2 => {
            let first = digits.chars().next()?.to_digit(10)?;
            if first > 6 {
                return None;
            }
            GlucoseUnit::MmolL
        }
        None if length == 3 => {
            let lead = digits.chars().take(2).collect::<String>().parse::<u32>().ok()?;
            if lead <= 12 {
                return None;
            }
            GlucoseUnit::MgDl
        }
        None => return None,
    };
    let value = match unit {
        GlucoseUnit::MgDl => digits.to_string(),
        GlucoseUnit::MmolL => insert_point(digits, 1),
    };
    Some((value, unit))
}

fn insert_point(digits: &str, decimals: usize) -> String {
    let chars = digits.chars().collect::<Vec<_>>();
    if chars.len() <= decimals {
        return digits.to_string();
    }
    let split = chars.len() - decimals;
    let whole = chars[..split].iter().collect::<String>();
    let fraction = chars[split..].iter().collect::<String>();
    format!("{}.{}", whole, fraction)
}
