//! Friction ridge generalized positions.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::image::Orientation;

/// Anatomical position of a friction ridge impression.
///
/// Numeric codes follow the friction ridge generalized position (FRGP)
/// table used by ANSI/NIST-ITL records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FrictionRidgeGeneralizedPosition {
    #[default]
    Unknown = 0,
    RightThumb = 1,
    RightIndex = 2,
    RightMiddle = 3,
    RightRing = 4,
    RightLittle = 5,
    LeftThumb = 6,
    LeftIndex = 7,
    LeftMiddle = 8,
    LeftRing = 9,
    LeftLittle = 10,
}

impl FrictionRidgeGeneralizedPosition {
    /// Returns the numeric FRGP code.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns the positions expected when segmenting a slap of the given
    /// hand orientation, in output order.
    pub fn expected_for(orientation: Orientation) -> &'static [Self] {
        use FrictionRidgeGeneralizedPosition::*;
        match orientation {
            Orientation::Right => &[RightIndex, RightMiddle, RightRing, RightLittle],
            Orientation::Left => &[LeftIndex, LeftMiddle, LeftRing, LeftLittle],
            Orientation::Thumbs => &[LeftThumb, RightThumb],
        }
    }

    /// Returns the expected positions in the order they appear from left to
    /// right in the image.
    ///
    /// A right-hand slap shows the index finger leftmost; a left-hand slap
    /// is mirrored and shows the little finger leftmost.
    pub fn layout_for(orientation: Orientation) -> &'static [Self] {
        use FrictionRidgeGeneralizedPosition::*;
        match orientation {
            Orientation::Right => &[RightIndex, RightMiddle, RightRing, RightLittle],
            Orientation::Left => &[LeftLittle, LeftRing, LeftMiddle, LeftIndex],
            Orientation::Thumbs => &[LeftThumb, RightThumb],
        }
    }

    /// Returns true for the two thumbs.
    pub fn is_thumb(self) -> bool {
        matches!(self, Self::RightThumb | Self::LeftThumb)
    }
}

impl TryFrom<u8> for FrictionRidgeGeneralizedPosition {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        use FrictionRidgeGeneralizedPosition::*;
        Ok(match code {
            0 => Unknown,
            1 => RightThumb,
            2 => RightIndex,
            3 => RightMiddle,
            4 => RightRing,
            5 => RightLittle,
            6 => LeftThumb,
            7 => LeftIndex,
            8 => LeftMiddle,
            9 => LeftRing,
            10 => LeftLittle,
            other => return Err(other),
        })
    }
}

impl fmt::Display for FrictionRidgeGeneralizedPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_roundtrip() {
        for code in 0u8..=10 {
            let frgp = FrictionRidgeGeneralizedPosition::try_from(code).expect("known code");
            assert_eq!(frgp.code(), code);
        }
        assert_eq!(FrictionRidgeGeneralizedPosition::try_from(11), Err(11));
    }

    #[test]
    fn test_expected_counts() {
        assert_eq!(
            FrictionRidgeGeneralizedPosition::expected_for(Orientation::Right).len(),
            4
        );
        assert_eq!(
            FrictionRidgeGeneralizedPosition::expected_for(Orientation::Left).len(),
            4
        );
        assert_eq!(
            FrictionRidgeGeneralizedPosition::expected_for(Orientation::Thumbs).len(),
            2
        );
    }

    #[test]
    fn test_left_layout_is_mirrored() {
        let expected = FrictionRidgeGeneralizedPosition::expected_for(Orientation::Left);
        let layout = FrictionRidgeGeneralizedPosition::layout_for(Orientation::Left);
        let mirrored: Vec<_> = layout.iter().rev().copied().collect();
        assert_eq!(expected, mirrored.as_slice());
    }

    #[test]
    fn test_layout_is_permutation_of_expected() {
        for orientation in [Orientation::Right, Orientation::Left, Orientation::Thumbs] {
            let mut a = FrictionRidgeGeneralizedPosition::expected_for(orientation).to_vec();
            let mut b = FrictionRidgeGeneralizedPosition::layout_for(orientation).to_vec();
            a.sort();
            b.sort();
            assert_eq!(a, b);
        }
    }
}
