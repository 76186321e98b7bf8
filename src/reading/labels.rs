use super::{Glyph, LabelPositions, Rect, SourceKind};
use crate::settings::LabelKeywords;

/// Finds the SYS/DIA/pulse/MAP labels and the mmHg units among text glyphs.
///
/// Systolic, diastolic and pulse keep the first matching glyph. When SYS or
/// DIA is still missing and exactly two mmHg units were seen, the units
/// stand in for them: upper or left unit for SYS, lower or right for DIA.
pub fn locate_labels(glyphs: &[Glyph], keywords: &LabelKeywords) -> LabelPositions {
    let mut labels = LabelPositions::default();

    for glyph in glyphs.iter().filter(|glyph| glyph.source == SourceKind::Text) {
        let lower = glyph.text.to_lowercase();
        let length = glyph.text.chars().count();

        if labels.sys.is_none() && contains_any(&lower, &keywords.systolic) {
            let mut bbox = glyph.bbox;
            // Recognizer sometimes fuses "SYS" with neighbouring noise into one wide token.
            if length >= 4 && lower.contains("sy") {
                bbox = Rect::new(bbox.x, bbox.y, bbox.width / 3.0, bbox.height);
            }
            labels.sys = Some(bbox);
        }

        if labels.dia.is_none() && contains_any(&lower, &keywords.diastolic) {
            labels.dia = Some(glyph.bbox);
        }

        if length <= keywords.mean_arterial_max_len
            && contains_any(&lower, &keywords.mean_arterial)
        {
            labels.map = Some(glyph.bbox);
        }

        if labels.pulse.is_none() && contains_any(&lower, &keywords.pulse) {
            labels.pulse = Some(glyph.bbox);
        }

        if !keywords.unit_marker.is_empty()
            && lower.contains(&keywords.unit_marker.to_lowercase())
        {
            labels.mmhg.push(glyph.bbox);
        }
    }

    if let [first, second] = labels.mmhg[..] {
        let stacked = second.spans_x(first.center_x());
        let side_by_side = second.spans_y(first.center_y());
        if labels.sys.is_none() {
            if stacked {
                labels.sys = Some(pick(first, second, |a, b| a.top() <= b.top()));
            }
            if side_by_side {
                labels.sys = Some(pick(first, second, |a, b| a.center_x() <= b.center_x()));
            }
        }
        if labels.dia.is_none() {
            if stacked {
                labels.dia = Some(pick(first, second, |a, b| a.center_y() >= b.center_y()));
            }
            if side_by_side {
                labels.dia = Some(pick(first, second, |a, b| a.center_x() >= b.center_x()));
            }
        }
    }

    labels
}

fn contains_any(lower: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|keyword| {
        let needle = keyword.to_lowercase();
        !needle.is_empty() && lower.contains(&needle)
    })
}

fn pick(a: Rect, b: Rect, prefer_a: impl Fn(&Rect, &Rect) -> bool) -> Rect {
    if prefer_a(&a, &b) { a } else { b }
}
