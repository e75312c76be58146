//! Hand orientation from the shape of the fitted candidates.

use super::fit::Fit;
use crate::model::Orientation;

/// Candidates smaller than this share of the largest are ignored.
const DOMINANT_SHARE: f64 = 0.25;

/// Infers which hand `fits` show, or `None` with fewer than two dominant
/// candidates.
///
/// Two candidates are thumbs. Otherwise the outermost candidates are
/// compared: the little finger is the smaller one with the lower fingertip,
/// and a right hand shows it on the right.
pub fn infer(fits: &[Fit], ppi: f64) -> Option<Orientation> {
    let max_area = fits.iter().map(Fit::area).fold(0.0, f64::max);
    if max_area <= 0.0 {
        return None;
    }

    let mut dominant: Vec<&Fit> = fits
        .iter()
        .filter(|f| f.area() >= DOMINANT_SHARE * max_area)
        .collect();
    dominant.sort_by(|a, b| b.area().total_cmp(&a.area()));
    dominant.truncate(4);
    dominant.sort_by(|a, b| a.centroid_x.total_cmp(&b.centroid_x));

    match dominant.len() {
        0 | 1 => None,
        2 => Some(Orientation::Thumbs),
        n => {
            let (left, right) = (dominant[0], dominant[n - 1]);
            let smaller_right = (left.area() - right.area()) / max_area;
            let lower_right = (right.top_y - left.top_y) / ppi;
            let score = smaller_right + lower_right;
            log::debug!(
                "orientation score {:.3} (area {:.3}, tip drop {:.3} in)",
                score,
                smaller_right,
                lower_right
            );
            if score < 0.0 {
                Some(Orientation::Left)
            } else {
                Some(Orientation::Right)
            }
        }
    }
}
