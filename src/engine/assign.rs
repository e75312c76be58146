//! Anatomical assignment of candidates to expected finger slots.
//!
//! Slots are the expected positions in left-to-right image order. With
//! every slot filled the mapping is the horizontal order. With fewer
//! candidates than slots, every order-preserving choice of slots is scored
//! and the cheapest wins.

use crate::config::AssignConfig;
use crate::model::FrictionRidgeGeneralizedPosition;

/// Position of one candidate, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub centroid_x: f64,
    pub top_y: f64,
}

/// Layout of the slots of one image.
#[derive(Clone, Debug)]
pub struct Layout<'a> {
    /// Expected positions, left to right.
    pub slots: &'a [FrictionRidgeGeneralizedPosition],
    pub ppi: f64,
    pub image_width: f64,
}

/// Typical drop of a fingertip below the highest fingertip of the hand.
fn tip_drop_in(frgp: FrictionRidgeGeneralizedPosition) -> f64 {
    use FrictionRidgeGeneralizedPosition::*;
    match frgp {
        RightIndex | LeftIndex => 0.25,
        RightRing | LeftRing => 0.2,
        RightLittle | LeftLittle => 0.6,
        RightMiddle | LeftMiddle | RightThumb | LeftThumb | Unknown => 0.0,
    }
}

fn nominal_pitch_in(layout: &Layout<'_>, config: &AssignConfig) -> f64 {
    if layout.slots.iter().all(|s| s.is_thumb()) {
        config.thumb_pitch_in
    } else {
        config.finger_pitch_in
    }
}

/// Cost of placing `placements` (sorted by x) into `slots` (increasing).
pub fn cost(
    placements: &[Placement],
    slots: &[usize],
    layout: &Layout<'_>,
    config: &AssignConfig,
) -> f64 {
    let k = placements.len();
    if k == 0 {
        return 0.0;
    }
    let ppi = layout.ppi;
    let pitch = nominal_pitch_in(layout, config) * ppi;
    let xs: Vec<f64> = placements.iter().map(|p| p.centroid_x).collect();
    let ss: Vec<f64> = slots.iter().map(|&s| s as f64).collect();

    // x = a + b * slot
    let (a, b, residual) = if k == 1 {
        (xs[0] - ss[0] * pitch, pitch, 0.0)
    } else {
        let ms = ss.iter().sum::<f64>() / k as f64;
        let mx = xs.iter().sum::<f64>() / k as f64;
        let sxx: f64 = ss.iter().map(|s| (s - ms).powi(2)).sum();
        let sxy: f64 = ss.iter().zip(&xs).map(|(s, x)| (s - ms) * (x - mx)).sum();
        let b = if sxx > 0.0 { sxy / sxx } else { pitch };
        let a = mx - b * ms;
        let residual = ss
            .iter()
            .zip(&xs)
            .map(|(s, x)| ((x - (a + b * s)) / ppi).powi(2))
            .sum::<f64>()
            / k as f64;
        (a, b, residual)
    };

    let drops: Vec<f64> = placements
        .iter()
        .zip(slots)
        .map(|(p, &s)| p.top_y / ppi - tip_drop_in(layout.slots[s]))
        .collect();
    let mean_drop = drops.iter().sum::<f64>() / k as f64;
    let arc = drops.iter().map(|d| (d - mean_drop).powi(2)).sum::<f64>() / k as f64;

    let centre_slot = (layout.slots.len() - 1) as f64 / 2.0;
    let centre = ((a + b * centre_slot - layout.image_width / 2.0) / ppi).powi(2);
    let pitch_dev = ((b - pitch) / ppi).powi(2);

    residual
        + config.arc_weight * arc
        + config.centre_weight * centre
        + config.pitch_weight * pitch_dev
}

/// Calls `visit` with every increasing `k`-subset of `0..n`, in
/// lexicographic order.
fn for_each_subset(n: usize, k: usize, visit: &mut dyn FnMut(&[usize])) {
    fn recurse(
        start: usize,
        n: usize,
        k: usize,
        chosen: &mut Vec<usize>,
        visit: &mut dyn FnMut(&[usize]),
    ) {
        if chosen.len() == k {
            visit(chosen.as_slice());
            return;
        }
        let remaining = k - chosen.len();
        for i in start..=(n - remaining) {
            chosen.push(i);
            recurse(i + 1, n, k, chosen, visit);
            chosen.pop();
        }
    }
    if k <= n {
        recurse(0, n, k, &mut Vec::with_capacity(k), visit);
    }
}

/// Maps placements, sorted by x, to slots.
///
/// Returns, for each slot, the index of its placement. Placements beyond
/// the number of slots must have been discarded by the caller. Ties go to
/// the lexicographically first choice of slots.
pub fn assign(
    placements: &[Placement],
    layout: &Layout<'_>,
    config: &AssignConfig,
) -> Vec<Option<usize>> {
    let n = layout.slots.len();
    let k = placements.len().min(n);
    let mut result = vec![None; n];
    if k == n {
        for (slot, entry) in result.iter_mut().enumerate() {
            *entry = Some(slot);
        }
        return result;
    }

    let mut best: Option<(f64, Vec<usize>)> = None;
    for_each_subset(n, k, &mut |slots| {
        let c = cost(&placements[..k], slots, layout, config);
        let better = match &best {
            None => true,
            Some((b, _)) => c < *b - 1e-12,
        };
        if better {
            best = Some((c, slots.to_vec()));
        }
    });

    if let Some((c, slots)) = best {
        log::debug!("assigned slots {:?} at cost {:.5}", slots, c);
        for (index, slot) in slots.into_iter().enumerate() {
            result[slot] = Some(index);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Orientation;

    fn layout(orientation: Orientation) -> Layout<'static> {
        Layout {
            slots: FrictionRidgeGeneralizedPosition::layout_for(orientation),
            ppi: 500.0,
            image_width: 500.0,
        }
    }

    fn at(xs: &[f64]) -> Vec<Placement> {
        xs.iter()
            .map(|&x| Placement {
                centroid_x: x,
                top_y: 35.0,
            })
            .collect()
    }

    #[test]
    fn test_subsets_in_lexicographic_order() {
        let mut seen = Vec::new();
        for_each_subset(4, 2, &mut |s| seen.push(s.to_vec()));
        assert_eq!(
            seen,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
    }

    #[test]
    fn test_full_hand_in_order() {
        let config = AssignConfig::default();
        let result = assign(
            &at(&[70.0, 190.0, 310.0, 430.0]),
            &layout(Orientation::Right),
            &config,
        );
        assert_eq!(result, vec![Some(0), Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_missing_little_finger() {
        let config = AssignConfig::default();
        let result = assign(&at(&[70.0, 190.0, 310.0]), &layout(Orientation::Right), &config);
        assert_eq!(result, vec![Some(0), Some(1), Some(2), None]);
    }

    #[test]
    fn test_missing_index_finger() {
        let config = AssignConfig::default();
        let result = assign(&at(&[190.0, 310.0, 430.0]), &layout(Orientation::Right), &config);
        assert_eq!(result, vec![None, Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_single_thumb_by_side() {
        let config = AssignConfig::default();
        let thumbs = Layout {
            slots: FrictionRidgeGeneralizedPosition::layout_for(Orientation::Thumbs),
            ppi: 500.0,
            image_width: 1600.0,
        };
        assert_eq!(assign(&at(&[400.0]), &thumbs, &config), vec![Some(0), None]);
        assert_eq!(assign(&at(&[1200.0]), &thumbs, &config), vec![None, Some(0)]);
    }

    #[test]
    fn test_no_placements() {
        let config = AssignConfig::default();
        assert_eq!(assign(&[], &layout(Orientation::Left), &config), vec![None; 4]);
    }

    #[test]
    fn test_collinear_fit_beats_gap() {
        let config = AssignConfig::default();
        let l = layout(Orientation::Right);
        let p = at(&[70.0, 190.0, 310.0]);
        assert!(cost(&p, &[0, 1, 2], &l, &config) < cost(&p, &[0, 1, 3], &l, &config));
    }
}
