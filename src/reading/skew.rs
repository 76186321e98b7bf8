use super::{Glyph, SourceKind};

/// Estimates the display rotation, in radians, from two digit glyphs.
///
/// The reference pair is the topmost digit and the digit of similar height
/// whose origin lies closest to it. A level pair yields 0; a pair rising to
/// the right yields a positive angle. Returns `None` when fewer than two
/// usable digits exist.
pub fn estimate_angle(glyphs: &[Glyph], height_tolerance: f32) -> Option<f32> {
    let mut numbers = glyphs
        .iter()
        .filter(|glyph| glyph.source == SourceKind::Number)
        .collect::<Vec<_>>();
    if numbers.is_empty() {
        return None;
    }
    numbers.sort_by(|a, b| a.bbox.y.total_cmp(&b.bbox.y));

    let top = numbers.remove(0).bbox;
    let secondary = numbers
        .into_iter()
        .map(|glyph| glyph.bbox)
        .filter(|bbox| (bbox.height - top.height).abs() < height_tolerance)
        .min_by(|a, b| a.origin_distance(&top).total_cmp(&b.origin_distance(&top)))?;

    let (left, right) = if top.x > secondary.x {
        (secondary, top)
    } else {
        (top, secondary)
    };
    Some((-(right.y - left.y)).atan2(right.x - left.x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::Rect;

    fn digit(x: f32, y: f32, h: f32) -> Glyph {
        Glyph::new(Rect::new(x, y, 20.0, h), "1", 0.9, SourceKind::Number)
    }

    #[test]
    fn no_digits_means_no_angle() {
        let text = Glyph::new(Rect::new(0.0, 0.0, 10.0, 10.0), "SYS", 0.9, SourceKind::Text);
        assert_eq!(estimate_angle(&[], 40.0), None);
        assert_eq!(estimate_angle(&[text], 40.0), None);
        assert_eq!(estimate_angle(&[digit(0.0, 0.0, 40.0)], 40.0), None);
    }

    #[test]
    fn level_pair_is_zero() {
        let angle = estimate_angle(&[digit(0.0, 100.0, 40.0), digit(30.0, 100.0, 40.0)], 40.0);
        assert_eq!(angle, Some(0.0));
    }

    #[test]
    fn direction_does_not_depend_on_which_box_is_on_top() {
        let rising = estimate_angle(&[digit(0.0, 110.0, 40.0), digit(30.0, 100.0, 40.0)], 40.0)
            .expect("angle");
        let expected = 10f32.atan2(30.0);
        assert!((rising - expected).abs() < 1e-6);

        let falling = estimate_angle(&[digit(0.0, 100.0, 40.0), digit(30.0, 110.0, 40.0)], 40.0)
            .expect("angle");
        assert!((falling + expected).abs() < 1e-6);
    }

    #[test]
    fn nan_box_is_never_the_reference() {
        let glyphs = [
            digit(0.0, 100.0, 40.0),
            digit(f32::NAN, f32::NAN, 40.0),
            digit(30.0, 100.0, 40.0),
        ];
        assert_eq!(estimate_angle(&glyphs, 40.0), Some(0.0));
    }

    #[test]
    fn differently_sized_digits_are_not_paired() {
        let glyphs = [digit(0.0, 100.0, 120.0), digit(30.0, 110.0, 40.0)];
        assert_eq!(estimate_angle(&glyphs, 40.0), None);
    }

    #[test]
    fn pairs_with_the_nearest_similar_digit() {
        let glyphs = [
            digit(0.0, 100.0, 40.0),
            digit(300.0, 100.0, 40.0),
            digit(25.0, 105.0, 40.0),
        ];
        let angle = estimate_angle(&glyphs, 40.0).expect("angle");
        assert!((angle - (-5f32).atan2(25.0)).abs() < 1e-6);
    }
}
