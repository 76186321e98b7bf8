use super::geom::iou;
use super::{Glyph, NumberRegion, RowMap};
use crate::settings::Thresholds;

/// Groups glyphs into text rows.
///
/// Glyphs are walked by ascending bottom edge. A glyph opens a new row when
/// its vertical center is more than half the average glyph height away from
/// the row anchor, or when its height differs from the anchor's by more
/// than `height_disparity`. Rows come back sorted left to right.
pub fn cluster_rows(glyphs: &[Glyph], thresholds: &Thresholds) -> RowMap {
    let mut rows = RowMap::new();
    if glyphs.is_empty() {
        return rows;
    }

    let half_height = average_height(glyphs, thresholds.min_glyph_height) / 2.0;
    let mut sorted = glyphs.iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| a.bbox.bottom().total_cmp(&b.bbox.bottom()));

    let mut row = 0usize;
    let mut anchor_y = sorted[0].bbox.center_y();
    let mut anchor_height = sorted[0].bbox.height;
    for (idx, glyph) in sorted.into_iter().enumerate() {
        let distance = (anchor_y - glyph.bbox.center_y()).abs();
        let disparate = height_disparity(anchor_height, glyph.bbox.height)
            > thresholds.height_disparity;
        if idx > 0 && (distance > half_height || disparate) {
            row += 1;
            anchor_y = glyph.bbox.center_y();
            anchor_height = glyph.bbox.height;
        }
        rows.entry(row).or_default().push(glyph.clone());
    }

    for members in rows.values_mut() {
        sort_by_center_x(members);
    }
    rows
}

/// Splits every row into contiguous number regions.
///
/// Inside a row a new region starts where the gap between neighbouring
/// centers exceeds `column_spacing_factor` times the row's average gap and
/// the two boxes do not overlap.
pub fn cluster_regions(rows: &RowMap, thresholds: &Thresholds) -> Vec<NumberRegion> {
    let mut regions = Vec::new();
    for members in rows.values() {
        let mut sorted = members.clone();
        sort_by_center_x(&mut sorted);
        let split_at = average_gap(&sorted) * thresholds.column_spacing_factor;

        let mut group: Vec<&Glyph> = Vec::new();
        for glyph in &sorted {
            if let Some(last) = group.last() {
                let gap = (glyph.bbox.center_x() - last.bbox.center_x()).abs();
                if gap > split_at && iou(&glyph.bbox, &last.bbox) <= 0.0 {
                    regions.push(merge_group(&group));
                    group.clear();
                }
            }
            group.push(glyph);
        }
        if !group.is_empty() {
            regions.push(merge_group(&group));
        }
    }
    regions
}

fn merge_group(group: &[&Glyph]) -> NumberRegion {
    let mut bbox = group[0].bbox;
    let mut text = String::new();
    for glyph in group {
        bbox = bbox.union(&glyph.bbox);
        text.push_str(&glyph.text);
    }
    NumberRegion { bbox, text }
}

fn average_height(glyphs: &[Glyph], min_height: f32) -> f32 {
    let tall = glyphs
        .iter()
        .map(|glyph| glyph.bbox.height)
        .filter(|height| *height >= min_height)
        .collect::<Vec<_>>();
    let heights = if tall.is_empty() {
        glyphs.iter().map(|glyph| glyph.bbox.height).collect()
    } else {
        tall
    };
    heights.iter().sum::<f32>() / heights.len().max(1) as f32
}

fn average_gap(sorted: &[Glyph]) -> f32 {
    if sorted.len() < 2 {
        return 0.0;
    }
    let total = sorted
        .windows(2)
        .map(|pair| (pair[1].bbox.center_x() - pair[0].bbox.center_x()).abs())
        .sum::<f32>();
    total / (sorted.len() - 1) as f32
}

fn height_disparity(a: f32, b: f32) -> f32 {
    let smaller = a.min(b);
    if smaller <= 0.0 {
        return if a.max(b) > 0.0 { f32::INFINITY } else { 1.0 };
    }
    a.max(b) / smaller
}

fn sort_by_center_x(glyphs: &mut [Glyph]) {
    glyphs.sort_by(|a, b| a.bbox.center_x().total_cmp(&b.bbox.center_x()));
}
