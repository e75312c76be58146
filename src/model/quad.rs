//! Bounding quadrilaterals for finger impressions.

use serde::{Deserialize, Serialize};

use super::coord::Coordinate;

/// A possibly rotated bounding region given by four named corners.
///
/// *Top* refers to the fingertip end of the impression and *bottom* to the
/// distal interphalangeal joint. The polygon order used for area and
/// simplicity tests is `tl → tr → br → bl`.
///
/// Construction does not enforce any geometric property, so a malformed
/// quadrilateral can be represented and reported by the checks below.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quadrilateral {
    pub tl: Coordinate,
    pub tr: Coordinate,
    pub bl: Coordinate,
    pub br: Coordinate,
}

impl Quadrilateral {
    /// Creates a quadrilateral from its four corners.
    #[inline]
    pub const fn new(tl: Coordinate, tr: Coordinate, bl: Coordinate, br: Coordinate) -> Self {
        Self { tl, tr, bl, br }
    }

    /// Creates an axis-aligned rectangle from inclusive pixel bounds.
    pub const fn axis_aligned(xmin: u32, ymin: u32, xmax: u32, ymax: u32) -> Self {
        Self {
            tl: Coordinate::new(xmin, ymin),
            tr: Coordinate::new(xmax, ymin),
            bl: Coordinate::new(xmin, ymax),
            br: Coordinate::new(xmax, ymax),
        }
    }

    /// Returns the corners in polygon order (`tl`, `tr`, `br`, `bl`).
    #[inline]
    pub fn corners(&self) -> [Coordinate; 4] {
        [self.tl, self.tr, self.br, self.bl]
    }

    /// Twice the signed area, positive when the polygon order is clockwise
    /// on screen (y pointing down).
    fn signed_area2(&self) -> i64 {
        let c = self.corners();
        (0..4)
            .map(|i| {
                let (x0, y0) = c[i].as_i64();
                let (x1, y1) = c[(i + 1) % 4].as_i64();
                x0 * y1 - x1 * y0
            })
            .sum()
    }

    /// Returns the enclosed area in square pixels.
    pub fn area(&self) -> f64 {
        self.signed_area2().abs() as f64 / 2.0
    }

    /// Returns true if two corners coincide or the enclosed area is zero.
    pub fn is_degenerate(&self) -> bool {
        let c = self.corners();
        for i in 0..4 {
            for j in (i + 1)..4 {
                if c[i] == c[j] {
                    return true;
                }
            }
        }
        self.signed_area2() == 0
    }

    /// Returns true if no two non-adjacent edges touch or cross.
    pub fn is_simple(&self) -> bool {
        let c = self.corners();
        !segments_touch(c[0], c[1], c[2], c[3]) && !segments_touch(c[1], c[2], c[3], c[0])
    }

    /// Returns true if `point` lies inside the quadrilateral or on its border.
    pub fn contains(&self, point: Coordinate) -> bool {
        let c = self.corners();
        let (px, py) = point.as_i64();

        for i in 0..4 {
            if on_segment(c[i], c[(i + 1) % 4], point) {
                return true;
            }
        }

        // Crossing number with a horizontal ray towards +x.
        let mut inside = false;
        for i in 0..4 {
            let (x0, y0) = c[i].as_i64();
            let (x1, y1) = c[(i + 1) % 4].as_i64();
            if (y0 > py) != (y1 > py) {
                // x of the edge at py, compared without division
                let lhs = (px - x0) * (y1 - y0);
                let rhs = (x1 - x0) * (py - y0);
                let crosses = if y1 > y0 { lhs < rhs } else { lhs > rhs };
                if crosses {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Returns true if every corner lies inside a `width` x `height` image.
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.corners().iter().all(|c| c.x < width && c.y < height)
    }

    /// Returns true if the quadrilateral is not axis aligned.
    pub fn is_rotated(&self) -> bool {
        self.tl.x != self.bl.x
            || self.tr.x != self.br.x
            || self.tl.y != self.tr.y
            || self.bl.y != self.br.y
    }

    /// Returns true if the corners respect their names: left corners are
    /// left of right corners and top corners are above bottom corners.
    pub fn has_regular_corners(&self) -> bool {
        self.tl.x < self.tr.x
            && self.bl.x < self.br.x
            && self.tl.y < self.bl.y
            && self.tr.y < self.br.y
    }

    /// Returns true if every interior angle is within `tolerance_deg` of 90°.
    ///
    /// An axis-aligned quadrilateral must be an exact rectangle.
    pub fn is_rectangular(&self, tolerance_deg: f64) -> bool {
        if !self.is_rotated() {
            return self.tl.x < self.tr.x && self.tl.y < self.bl.y;
        }

        let c = self.corners();
        (0..4).all(|i| {
            let prev = c[(i + 3) % 4];
            let here = c[i];
            let next = c[(i + 1) % 4];
            match corner_angle_deg(prev, here, next) {
                Some(angle) => (angle - 90.0).abs() <= tolerance_deg,
                None => false,
            }
        })
    }

    /// Returns the inclusive axis-aligned bounds `(xmin, ymin, xmax, ymax)`.
    pub fn bounds(&self) -> (u32, u32, u32, u32) {
        let c = self.corners();
        let xmin = c.iter().map(|p| p.x).min().unwrap_or(0);
        let ymin = c.iter().map(|p| p.y).min().unwrap_or(0);
        let xmax = c.iter().map(|p| p.x).max().unwrap_or(0);
        let ymax = c.iter().map(|p| p.y).max().unwrap_or(0);
        (xmin, ymin, xmax, ymax)
    }
}

/// Interior angle at `here` in degrees, or `None` for a zero-length edge.
fn corner_angle_deg(prev: Coordinate, here: Coordinate, next: Coordinate) -> Option<f64> {
    let (hx, hy) = here.as_i64();
    let (ax, ay) = prev.as_i64();
    let (bx, by) = next.as_i64();
    let (ux, uy) = ((ax - hx) as f64, (ay - hy) as f64);
    let (vx, vy) = ((bx - hx) as f64, (by - hy) as f64);
    let nu = ux.hypot(uy);
    let nv = vx.hypot(vy);
    if nu == 0.0 || nv == 0.0 {
        return None;
    }
    let cos = ((ux * vx + uy * vy) / (nu * nv)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

fn orient(a: Coordinate, b: Coordinate, c: Coordinate) -> i64 {
    let (ax, ay) = a.as_i64();
    let (bx, by) = b.as_i64();
    let (cx, cy) = c.as_i64();
    (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
}

fn on_segment(a: Coordinate, b: Coordinate, p: Coordinate) -> bool {
    orient(a, b, p) == 0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

/// Returns true if segment `a-b` and segment `c-d` share any point.
fn segments_touch(a: Coordinate, b: Coordinate, c: Coordinate, d: Coordinate) -> bool {
    let d1 = orient(c, d, a).signum();
    let d2 = orient(c, d, b).signum();
    let d3 = orient(a, b, c).signum();
    let d4 = orient(a, b, d).signum();

    if d1 * d2 < 0 && d3 * d4 < 0 {
        return true;
    }

    on_segment(c, d, a) || on_segment(c, d, b) || on_segment(a, b, c) || on_segment(a, b, d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: u32, y: u32) -> Coordinate {
        Coordinate::new(x, y)
    }

    #[test]
    fn test_axis_aligned_rectangle() {
        let q = Quadrilateral::axis_aligned(10, 20, 110, 220);
        assert_eq!(q.area(), 100.0 * 200.0);
        assert!(!q.is_degenerate());
        assert!(q.is_simple());
        assert!(!q.is_rotated());
        assert!(q.has_regular_corners());
        assert!(q.is_rectangular(0.0));
        assert_eq!(q.bounds(), (10, 20, 110, 220));
    }

    #[test]
    fn test_coincident_corners_are_degenerate() {
        let q = Quadrilateral::new(c(0, 0), c(0, 0), c(0, 10), c(10, 10));
        assert!(q.is_degenerate());
    }

    #[test]
    fn test_collinear_corners_are_degenerate() {
        let q = Quadrilateral::new(c(0, 0), c(10, 0), c(5, 0), c(20, 0));
        assert!(q.is_degenerate());
    }

    #[test]
    fn test_bowtie_is_not_simple() {
        // tr and br swapped: edges tl-tr and br-bl cross
        let q = Quadrilateral::new(c(0, 0), c(10, 10), c(0, 10), c(10, 0));
        assert!(!q.is_simple());
    }

    #[test]
    fn test_rotated_rectangle() {
        // A square rotated by 45 degrees
        let q = Quadrilateral::new(c(10, 0), c(20, 10), c(0, 10), c(10, 20));
        assert!(q.is_rotated());
        assert!(q.is_simple());
        assert!(q.is_rectangular(0.01));
        assert_eq!(q.area(), 200.0);
        // tl.y < bl.y holds, but tl.x < tr.x and bl.x < br.x also hold
        assert!(q.has_regular_corners());
    }

    #[test]
    fn test_irregular_corner_names() {
        // Left and right swapped
        let q = Quadrilateral::axis_aligned(10, 10, 20, 20);
        let flipped = Quadrilateral::new(q.tr, q.tl, q.br, q.bl);
        assert!(!flipped.has_regular_corners());
    }

    #[test]
    fn test_non_rectangular_trapezoid() {
        let q = Quadrilateral::new(c(10, 0), c(20, 0), c(0, 10), c(30, 10));
        assert!(q.is_rotated());
        assert!(!q.is_rectangular(0.3));
    }

    #[test]
    fn test_contains() {
        let q = Quadrilateral::new(c(10, 0), c(20, 10), c(0, 10), c(10, 20));
        assert!(q.contains(c(10, 10)));
        assert!(q.contains(c(10, 0)));
        assert!(q.contains(c(5, 5)));
        assert!(!q.contains(c(1, 1)));
        assert!(!q.contains(c(19, 19)));
    }

    #[test]
    fn test_is_within() {
        let q = Quadrilateral::axis_aligned(0, 0, 99, 49);
        assert!(q.is_within(100, 50));
        assert!(!q.is_within(99, 50));
        assert!(!q.is_within(100, 49));
    }
}
