use super::Glyph;
use super::geom::iou;

/// Greedy non-maximum suppression over detector glyphs.
///
/// Glyphs are visited by descending confidence (stable on ties); each kept
/// glyph suppresses every later glyph overlapping it by more than
/// `iou_threshold`. At most `limit` glyphs are returned.
pub fn dedup(glyphs: Vec<Glyph>, limit: usize, iou_threshold: f32) -> Vec<Glyph> {
    let mut sorted = glyphs;
    sorted.sort_by(|a, b| rank(b).total_cmp(&rank(a)));

    let mut active = vec![true; sorted.len()];
    let mut remaining = sorted.len();
    let mut kept: Vec<Glyph> = Vec::new();

    for i in 0..sorted.len() {
        if kept.len() >= limit || remaining == 0 {
            break;
        }
        if !active[i] {
            continue;
        }
        active[i] = false;
        remaining -= 1;
        kept.push(sorted[i].clone());

        for j in (i + 1)..sorted.len() {
            if active[j] && iou(&sorted[i].bbox, &sorted[j].bbox) > iou_threshold {
                active[j] = false;
                remaining -= 1;
            }
        }
    }
    kept
}

/// NaN confidences rank below every real score.
fn rank(glyph: &Glyph) -> f32 {
    if glyph.confidence.is_nan() {
        f32::NEG_INFINITY
    } else {
        glyph.confidence
    }
}
