use serde::{Deserialize, Serialize};

/// A point in desktop coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Edge-based rectangle in desktop coordinates
///
/// `right` and `bottom` are exclusive, so `width() == right - left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Small rectangle centered on a point, used to anchor popups at the cursor
    pub const fn around(point: Point) -> Self {
        Self::new(point.x - 1, point.y - 1, point.x + 1, point.y + 1)
    }

    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let r = Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        (!r.is_empty()).then_some(r)
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    /// Squared distance between the closest points of two rectangles
    pub fn distance_squared(&self, other: &Rect) -> i64 {
        let dx = (other.left - self.right).max(self.left - other.right).max(0) as i64;
        let dy = (other.top - self.bottom).max(self.top - other.bottom).max(0) as i64;
        dx * dx + dy * dy
    }
}

/// Four-sided inset, used for popup padding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Padding {
    #[serde(default = "default_padding")]
    pub left: i32,
    #[serde(default = "default_padding")]
    pub top: i32,
    #[serde(default = "default_padding")]
    pub right: i32,
    #[serde(default = "default_padding")]
    pub bottom: i32,
}

fn default_padding() -> i32 {
    5
}

impl Padding {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn uniform(value: i32) -> Self {
        Self::new(value, value, value, value)
    }

    pub const fn horizontal(&self) -> i32 {
        self.left + self.right
    }

    pub const fn vertical(&self) -> i32 {
        self.top + self.bottom
    }
}

impl Default for Padding {
    fn default() -> Self {
        Self::uniform(default_padding())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_of_disjoint_rects_is_none() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 20, 10);
        assert_eq!(a.intersection(&b), None);
        assert_eq!(
            a.intersection(&Rect::new(5, 5, 15, 15)),
            Some(Rect::new(5, 5, 10, 10))
        );
    }

    #[test]
    fn distance_is_zero_for_overlapping_rects() {
        let a = Rect::new(0, 0, 10, 10);
        assert_eq!(a.distance_squared(&Rect::new(5, 5, 6, 6)), 0);
        assert!(a.distance_squared(&Rect::new(100, 0, 110, 10)) > 0);
    }

    #[test]
    fn around_point_is_two_pixels_wide() {
        let r = Rect::around(Point::new(50, 60));
        assert_eq!(r, Rect::new(49, 59, 51, 61));
        assert_eq!(r.width(), 2);
    }

    #[test]
    fn padding_deserializes_missing_sides_as_default() {
        let padding: Padding = toml::from_str("left = 1\nright = 3").unwrap();
        assert_eq!(padding, Padding::new(1, 5, 3, 5));
    }
}
