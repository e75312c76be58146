//! Data model for slap segmentation.
//!
//! This module defines the values that flow into and out of a
//! [`Segmenter`](crate::engine::Segmenter): the captured image, the
//! anatomical positions, the per-finger results and the call status.
//!
//! # Design Principles
//!
//! 1. **Closed enumerations**: every code that crosses the API boundary
//!    (slap kind, capture technology, hand orientation, finger position,
//!    status and result codes) is a fieldless enum with a stable numeric
//!    code, so handling is exhaustive at compile time.
//!
//! 2. **Validated construction**: a [`SlapImage`] or
//!    [`SubmissionIdentification`] that exists is known to be well formed.
//!    Raw, unchecked parts travel as [`RawSlapImage`].
//!
//! 3. **Results are data**: a missing finger is a
//!    [`PositionOutcome::Failure`] in its slot, never an early return.
//!
//! # Example
//!
//! ```
//! use slapseg::model::{CaptureTechnology, Kind, Orientation, SlapImage};
//!
//! let image = SlapImage::new(
//!     64,
//!     32,
//!     500,
//!     Kind::ThreeInch,
//!     CaptureTechnology::OpticalTirBright,
//!     Orientation::Right,
//!     vec![255u8; 64 * 32],
//! )
//! .expect("valid image");
//! assert_eq!(image.width(), 64);
//! ```

mod coord;
mod frgp;
mod identity;
mod image;
mod position;
mod quad;
mod status;

pub use coord::Coordinate;
pub use frgp::FrictionRidgeGeneralizedPosition;
pub use identity::{ApiVersion, IdentificationError, SubmissionIdentification, API_VERSION};
pub use image::{
    CaptureTechnology, Deficiency, ImageError, Kind, Orientation, RawSlapImage, RotationPolicy,
    SlapImage,
};
pub use position::{FailureCode, PositionOutcome, ResultCode, SegmentationPosition};
pub use quad::Quadrilateral;
pub use status::{ReturnStatus, Segmentation, StatusCode, StatusError, Supported};
