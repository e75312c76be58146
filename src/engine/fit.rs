//! Oriented bounding rectangles for candidate fingers.
//!
//! The ink of a candidate's fingertip band is reduced to the leftmost and
//! rightmost ink pixel of each row. The minimum-area rectangle of their
//! convex hull has one side collinear with a hull edge, so only hull edge
//! angles (and upright) need to be tried.

use super::cluster::{Candidate, Clusters};
use super::foreground::Foreground;
use crate::model::{Coordinate, Quadrilateral, SlapImage};

type Point = (i64, i64);

/// Fingertip band of one candidate, reduced to its convex hull.
#[derive(Clone, Debug, PartialEq)]
pub struct Outline {
    pub hull: Vec<Point>,
    /// Rotation of the minimum-area rectangle, in degrees.
    pub natural_deg: f64,
    /// Mean of the row midpoints.
    pub centroid_x: f64,
    /// Row of the topmost ink pixel.
    pub top_y: f64,
}

/// A candidate with its final rectangle.
#[derive(Clone, Debug, PartialEq)]
pub struct Fit {
    pub quad: Quadrilateral,
    pub angle_deg: f64,
    pub natural_deg: f64,
    pub centroid_x: f64,
    pub top_y: f64,
}

impl Fit {
    pub fn area(&self) -> f64 {
        self.quad.area()
    }
}

/// Collects the fingertip band of `candidate` and its hull.
///
/// Returns `None` when the candidate's blocks hold no ink.
pub fn outline(
    image: &SlapImage,
    foreground: &Foreground,
    clusters: &Clusters,
    candidate: &Candidate,
    band_px: usize,
    max_rotation_deg: f64,
) -> Option<Outline> {
    let bs = foreground.blocks.block_size;
    let width = usize::from(image.width());
    let height = usize::from(image.height());
    let x0 = candidate.col_start.saturating_sub(1) * bs;
    let x1 = ((candidate.col_end + 1) * bs).min(width);

    let row_extremes = |y: usize| -> Option<(usize, usize)> {
        let row = image.row(y);
        let by = y / bs;
        let inside =
            |x: usize| clusters.claims(candidate, x / bs, by) && foreground.is_ink(row[x]);
        let first = (x0..x1).find(|&x| inside(x))?;
        let last = (x0..x1).rev().find(|&x| inside(x))?;
        Some((first, last))
    };

    let start = candidate.top_row.saturating_sub(1) * bs;
    let top = (start..height).find(|&y| row_extremes(y).is_some())?;
    let bottom = (top + band_px.max(1)).min(height);

    let mut points = Vec::new();
    let mut mid_sum = 0.0;
    let mut rows = 0usize;
    for y in top..bottom {
        if let Some((first, last)) = row_extremes(y) {
            points.push((first as i64, y as i64));
            if last != first {
                points.push((last as i64, y as i64));
            }
            mid_sum += (first + last) as f64 / 2.0;
            rows += 1;
        }
    }

    let hull = convex_hull(points);
    let natural_deg = min_area_angle(&hull, max_rotation_deg);
    Some(Outline {
        hull,
        natural_deg,
        centroid_x: mid_sum / rows.max(1) as f64,
        top_y: top as f64,
    })
}

fn cross(o: Point, a: Point, b: Point) -> i64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// Convex hull by Andrew's monotone chain, without collinear points.
pub fn convex_hull(mut points: Vec<Point>) -> Vec<Point> {
    points.sort_unstable();
    points.dedup();
    if points.len() <= 2 {
        return points;
    }

    let mut hull: Vec<Point> = Vec::with_capacity(points.len() * 2);
    for &p in &points {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in points.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// Extents of `points` along the axes rotated by `angle_deg`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Extents {
    umin: f64,
    umax: f64,
    vmin: f64,
    vmax: f64,
}

impl Extents {
    fn of(points: &[Point], angle_deg: f64) -> Option<Self> {
        let (s, c) = angle_deg.to_radians().sin_cos();
        let mut iter = points.iter().map(|&(x, y)| {
            let (x, y) = (x as f64, y as f64);
            (x * c + y * s, -x * s + y * c)
        });
        let (u, v) = iter.next()?;
        let init = Self {
            umin: u,
            umax: u,
            vmin: v,
            vmax: v,
        };
        Some(iter.fold(init, |e, (u, v)| Self {
            umin: e.umin.min(u),
            umax: e.umax.max(u),
            vmin: e.vmin.min(v),
            vmax: e.vmax.max(v),
        }))
    }

    fn area(&self) -> f64 {
        (self.umax - self.umin) * (self.vmax - self.vmin)
    }
}

/// Normalises an edge direction to the equivalent rectangle rotation in
/// `(-45, 45]` degrees.
fn rectangle_angle(dx: i64, dy: i64) -> f64 {
    let a = (dy as f64).atan2(dx as f64).to_degrees().rem_euclid(90.0);
    if a > 45.0 {
        a - 90.0
    } else {
        a
    }
}

/// Rotation in degrees of the minimum-area rectangle enclosing `hull`,
/// limited to `|angle| <= max_deg`. Upright wins ties.
pub fn min_area_angle(hull: &[Point], max_deg: f64) -> f64 {
    if hull.len() < 3 {
        return 0.0;
    }

    let mut best_angle = 0.0;
    let mut best_area = Extents::of(hull, 0.0).map_or(f64::INFINITY, |e| e.area());
    for i in 0..hull.len() {
        let (x0, y0) = hull[i];
        let (x1, y1) = hull[(i + 1) % hull.len()];
        let angle = rectangle_angle(x1 - x0, y1 - y0);
        if angle.abs() > max_deg || angle == 0.0 {
            continue;
        }
        if let Some(e) = Extents::of(hull, angle) {
            let area = e.area();
            if area < best_area - 1e-9 * best_area.max(1.0) {
                best_area = area;
                best_angle = angle;
            }
        }
    }
    best_angle
}

/// Reports rotations below `snap_deg` as upright.
pub fn snap(angle_deg: f64, snap_deg: f64) -> f64 {
    if angle_deg.abs() < snap_deg {
        0.0
    } else {
        angle_deg
    }
}

/// Corners `tl, tr, bl, br` of the rectangle at `scale` of the extents.
///
/// The shorter side is rounded first and the longer side is derived from
/// its exact perpendicular, so rounding bends the corners by at most about
/// half a pixel over the longer side.
fn rotated_corners(e: &Extents, angle_deg: f64, scale: f64) -> [Point; 4] {
    let (s, c) = angle_deg.to_radians().sin_cos();
    let cu = (e.umin + e.umax) / 2.0;
    let cv = (e.vmin + e.vmax) / 2.0;
    let w = (e.umax - e.umin) * scale;
    let h = (e.vmax - e.vmin) * scale;

    let (tu, tv) = (cu - w / 2.0, cv - h / 2.0);
    let tl = ((tu * c - tv * s).round() as i64, (tu * s + tv * c).round() as i64);

    let round = |x: f64, y: f64| (x.round() as i64, y.round() as i64);
    let (ew, eh) = if w <= h {
        let ew = round(w * c, w * s);
        let len = (ew.0 as f64).hypot(ew.1 as f64);
        let eh = if len > 0.0 {
            round(-(ew.1 as f64) * h / len, ew.0 as f64 * h / len)
        } else {
            round(-s * h, c * h)
        };
        (ew, eh)
    } else {
        let eh = round(-s * h, c * h);
        let len = (eh.0 as f64).hypot(eh.1 as f64);
        let ew = if len > 0.0 {
            round(eh.1 as f64 * w / len, -(eh.0 as f64) * w / len)
        } else {
            round(c * w, s * w)
        };
        (ew, eh)
    };

    [
        tl,
        (tl.0 + ew.0, tl.1 + ew.1),
        (tl.0 + eh.0, tl.1 + eh.1),
        (tl.0 + ew.0 + eh.0, tl.1 + ew.1 + eh.1),
    ]
}

fn inside(corners: &[Point; 4], width: i64, height: i64) -> bool {
    corners
        .iter()
        .all(|&(x, y)| x >= 0 && y >= 0 && x < width && y < height)
}

fn to_quad(corners: [Point; 4]) -> Quadrilateral {
    let c = |(x, y): Point| Coordinate::new(x.max(0) as u32, y.max(0) as u32);
    Quadrilateral::new(c(corners[0]), c(corners[1]), c(corners[2]), c(corners[3]))
}

/// Rectangle enclosing `hull` at `angle_deg`, fitted into the image.
///
/// A rotated rectangle that crosses the border is shrunk about its centre;
/// if even half its size does not fit, the clamped axis-aligned bounds are
/// used instead. An empty hull gives an all-zero, degenerate quadrilateral.
pub fn rectangle(hull: &[Point], angle_deg: f64, width: u16, height: u16) -> Quadrilateral {
    let Some(e) = Extents::of(hull, angle_deg) else {
        return Quadrilateral::default();
    };
    let (w, h) = (i64::from(width), i64::from(height));
    let clamp_x = |v: f64| (v.round() as i64).clamp(0, w - 1) as u32;
    let clamp_y = |v: f64| (v.round() as i64).clamp(0, h - 1) as u32;

    if angle_deg == 0.0 {
        return Quadrilateral::axis_aligned(
            clamp_x(e.umin),
            clamp_y(e.vmin),
            clamp_x(e.umax),
            clamp_y(e.vmax),
        );
    }

    let full = rotated_corners(&e, angle_deg, 1.0);
    if inside(&full, w, h) {
        return to_quad(full);
    }

    if inside(&rotated_corners(&e, angle_deg, 0.5), w, h) {
        let (mut lo, mut hi) = (0.5, 1.0);
        for _ in 0..16 {
            let mid = (lo + hi) / 2.0;
            if inside(&rotated_corners(&e, angle_deg, mid), w, h) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        return to_quad(rotated_corners(&e, angle_deg, lo));
    }

    log::debug!("rotated rectangle does not fit, clamping to axis-aligned bounds");
    let xs = full.iter().map(|p| p.0 as f64);
    let ys = full.iter().map(|p| p.1 as f64);
    Quadrilateral::axis_aligned(
        clamp_x(xs.clone().fold(f64::INFINITY, f64::min)),
        clamp_y(ys.clone().fold(f64::INFINITY, f64::min)),
        clamp_x(xs.fold(f64::NEG_INFINITY, f64::max)),
        clamp_y(ys.fold(f64::NEG_INFINITY, f64::max)),
    )
}
