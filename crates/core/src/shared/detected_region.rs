/// Axis-aligned bounding rectangle over an inclusive pixel extent.
///
/// A single foreground pixel at `(x, y)` yields `width == height == 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingRect {
    /// Tight rectangle around a point set, or `None` when the set is empty.
    pub fn from_points(points: &[(i32, i32)]) -> Option<Self> {
        let (&(x0, y0), rest) = points.split_first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (x0, y0, x0, y0);
        for &(x, y) in rest {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnclosingCircle {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

/// Bounding shapes fitted to one external contour of a binary mask.
///
/// Derived per frame and never stored across iterations.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedRegion {
    /// Contour after polygon approximation.
    pub polygon: Vec<(i32, i32)>,
    pub bounding_rect: BoundingRect,
    pub enclosing_circle: EnclosingCircle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_empty() {
        assert!(BoundingRect::from_points(&[]).is_none());
    }

    #[test]
    fn test_from_points_single_pixel() {
        let rect = BoundingRect::from_points(&[(4, 7)]).unwrap();
        assert_eq!(
            rect,
            BoundingRect {
                x: 4,
                y: 7,
                width: 1,
                height: 1
            }
        );
    }

    #[test]
    fn test_from_points_rectangle_corners() {
        let rect = BoundingRect::from_points(&[(20, 10), (79, 10), (79, 49), (20, 49)]).unwrap();
        assert_eq!(rect.x, 20);
        assert_eq!(rect.y, 10);
        assert_eq!(rect.width, 60);
        assert_eq!(rect.height, 40);
        assert_eq!(rect.area(), 2400);
    }
}
