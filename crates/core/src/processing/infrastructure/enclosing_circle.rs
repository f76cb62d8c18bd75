use crate::shared::detected_region::EnclosingCircle;

const EPS: f64 = 1e-7;

fn contains(circle: &EnclosingCircle, (x, y): (f64, f64)) -> bool {
    (x - circle.center_x).hypot(y - circle.center_y) <= circle.radius + EPS
}

fn from_two((ax, ay): (f64, f64), (bx, by): (f64, f64)) -> EnclosingCircle {
    EnclosingCircle {
        center_x: (ax + bx) / 2.0,
        center_y: (ay + by) / 2.0,
        radius: (ax - bx).hypot(ay - by) / 2.0,
    }
}

/// Circumcircle of three points; collinear triples get the circle over the
/// farthest pair.
fn from_three(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> EnclosingCircle {
    let (bx, by) = (b.0 - a.0, b.1 - a.1);
    let (cx, cy) = (c.0 - a.0, c.1 - a.1);
    let d = 2.0 * (bx * cy - by * cx);
    if d.abs() < EPS {
        return [from_two(a, b), from_two(a, c), from_two(b, c)]
            .into_iter()
            .fold(from_two(a, a), |best, candidate| {
                if candidate.radius > best.radius {
                    candidate
                } else {
                    best
                }
            });
    }
    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;
    let ux = (cy * b2 - by * c2) / d;
    let uy = (bx * c2 - cx * b2) / d;
    EnclosingCircle {
        center_x: a.0 + ux,
        center_y: a.1 + uy,
        radius: ux.hypot(uy),
    }
}

/// Smallest circle containing every point (incremental Welzl construction).
///
/// Returns `None` for an empty slice; a single point yields radius zero.
pub fn minimal_enclosing_circle(points: &[(i32, i32)]) -> Option<EnclosingCircle> {
    let pts: Vec<(f64, f64)> = points.iter().map(|&(x, y)| (x as f64, y as f64)).collect();
    let first = *pts.first()?;
    let mut circle = from_two(first, first);

    for i in 1..pts.len() {
        if contains(&circle, pts[i]) {
            continue;
        }
        circle = from_two(pts[i], pts[i]);
        for j in 0..i {
            if contains(&circle, pts[j]) {
                continue;
            }
            circle = from_two(pts[i], pts[j]);
            for k in 0..j {
                if !contains(&circle, pts[k]) {
                    circle = from_three(pts[i], pts[j], pts[k]);
                }
            }
        }
    }
    Some(circle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_has_no_circle() {
        assert!(minimal_enclosing_circle(&[]).is_none());
    }

    #[test]
    fn test_single_point() {
        let c = minimal_enclosing_circle(&[(3, 4)]).unwrap();
        assert_relative_eq!(c.center_x, 3.0);
        assert_relative_eq!(c.center_y, 4.0);
        assert_relative_eq!(c.radius, 0.0);
    }

    #[test]
    fn test_two_points_diameter() {
        let c = minimal_enclosing_circle(&[(0, 0), (10, 0)]).unwrap();
        assert_relative_eq!(c.center_x, 5.0);
        assert_relative_eq!(c.center_y, 0.0);
        assert_relative_eq!(c.radius, 5.0);
    }

    #[test]
    fn test_rectangle_corners() {
        let c = minimal_enclosing_circle(&[(20, 10), (79, 10), (79, 49), (20, 49)]).unwrap();
        assert_relative_eq!(c.center_x, 49.5, epsilon = 1e-9);
        assert_relative_eq!(c.center_y, 29.5, epsilon = 1e-9);
        assert_relative_eq!(c.radius, 1250.5f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_obtuse_triangle_uses_longest_side() {
        // The circumcircle would be larger; the longest side is a diameter.
        let c = minimal_enclosing_circle(&[(0, 0), (10, 0), (5, 1)]).unwrap();
        assert_relative_eq!(c.center_x, 5.0);
        assert_relative_eq!(c.center_y, 0.0);
        assert_relative_eq!(c.radius, 5.0);
    }

    #[test]
    fn test_right_triangle_circumcircle() {
        let c = minimal_enclosing_circle(&[(0, 0), (6, 0), (0, 8)]).unwrap();
        assert_relative_eq!(c.center_x, 3.0, epsilon = 1e-9);
        assert_relative_eq!(c.center_y, 4.0, epsilon = 1e-9);
        assert_relative_eq!(c.radius, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_collinear_points() {
        let c = minimal_enclosing_circle(&[(0, 0), (2, 2), (4, 4), (1, 1)]).unwrap();
        assert_relative_eq!(c.center_x, 2.0, epsilon = 1e-9);
        assert_relative_eq!(c.center_y, 2.0, epsilon = 1e-9);
        assert_relative_eq!(c.radius, 8f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_all_points_inside() {
        let pts = [(1, 7), (9, 3), (4, 4), (6, 10), (0, 0), (8, 8), (5, 2)];
        let c = minimal_enclosing_circle(&pts).unwrap();
        for &(x, y) in &pts {
            let d = (x as f64 - c.center_x).hypot(y as f64 - c.center_y);
            assert!(d <= c.radius + 1e-6);
        }
    }
}
