use serde::{Deserialize, Serialize};

/// Axis-aligned box in image pixels, top-left origin, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawRect")]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Wire shape of a box; decoded boxes go through `Rect::new`.
#[derive(Deserialize)]
struct RawRect {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl From<RawRect> for Rect {
    fn from(raw: RawRect) -> Self {
        Rect::new(raw.x, raw.y, raw.width, raw.height)
    }
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn from_edges(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Inclusive test against the horizontal span.
    pub fn spans_x(&self, x: f32) -> bool {
        x >= self.left() && x <= self.right()
    }

    /// Inclusive test against the vertical span.
    pub fn spans_y(&self, y: f32) -> bool {
        y >= self.top() && y <= self.bottom()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_edges(
            self.left().min(other.left()),
            self.top().min(other.top()),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    pub fn center_distance(&self, other: &Rect) -> f32 {
        (self.center_x() - other.center_x()).hypot(self.center_y() - other.center_y())
    }

    pub fn origin_distance(&self, other: &Rect) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Intersection over union; degenerate boxes never overlap anything.
pub fn iou(a: &Rect, b: &Rect) -> f32 {
    let area_a = a.area();
    if area_a <= 0.0 {
        return 0.0;
    }
    let area_b = b.area();
    if area_b <= 0.0 {
        return 0.0;
    }

    let ix1 = a.left().max(b.left());
    let iy1 = a.top().max(b.top());
    let ix2 = a.right().min(b.right());
    let iy2 = a.bottom().min(b.bottom());
    let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
    inter / (area_a + area_b - inter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iou_of_identical_box_is_one() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert!((iou(&r, &r) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn iou_is_symmetric() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(iou(&a, &b), iou(&b, &a));
        assert!((iou(&a, &b) - 25.0 / 175.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_or_touching_boxes_is_zero() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(iou(&a, &Rect::new(50.0, 50.0, 5.0, 5.0)), 0.0);
        assert_eq!(iou(&a, &Rect::new(10.0, 0.0, 10.0, 10.0)), 0.0);
    }

    #[test]
    fn degenerate_boxes_have_no_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let flat = Rect::new(0.0, 0.0, 10.0, 0.0);
        assert_eq!(iou(&a, &flat), 0.0);
        assert_eq!(iou(&flat, &flat), 0.0);
    }

    #[test]
    fn decoded_boxes_are_clamped() {
        let r: Rect =
            serde_json::from_str(r#"{"x": 1.0, "y": 2.0, "width": -20.0, "height": -40.0}"#)
                .expect("rect");
        assert_eq!(r, Rect::new(1.0, 2.0, 0.0, 0.0));
        assert_eq!(iou(&r, &r), 0.0);
    }

    #[test]
    fn negative_sizes_are_clamped() {
        let r = Rect::new(5.0, 5.0, -3.0, 2.0);
        assert_eq!(r.width, 0.0);
        assert_eq!(r.area(), 0.0);
    }

    #[test]
    fn union_covers_both() {
        let a = Rect::new(0.0, 10.0, 10.0, 10.0);
        let b = Rect::new(20.0, 5.0, 10.0, 10.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 5.0, 30.0, 15.0));
    }
}
