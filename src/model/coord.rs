//! Integer pixel coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D pixel coordinate with the origin at the top-left pixel.
///
/// `x` grows to the right and `y` grows downwards. Coordinates are
/// unsigned: a position that would fall left of or above the image
/// cannot be represented.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: u32,
    pub y: u32,
}

impl Coordinate {
    /// Creates a new coordinate.
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Returns the coordinate as signed 64-bit values for exact geometry.
    #[inline]
    pub(crate) fn as_i64(&self) -> (i64, i64) {
        (i64::from(self.x), i64::from(self.y))
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(u32, u32)> for Coordinate {
    fn from((x, y): (u32, u32)) -> Self {
        Self::new(x, y)
    }
}
