//! Slap image container and its metadata enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reasons a set of raw image parts cannot become a [`SlapImage`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("image dimensions {width}x{height} must be positive")]
    ZeroDimension { width: u16, height: u16 },

    #[error("image resolution must be positive")]
    ZeroResolution,

    #[error("pixel buffer holds {actual} bytes, expected {expected} ({width}x{height})")]
    PixelCountMismatch {
        width: u16,
        height: u16,
        bytes_per_pixel: usize,
        expected: usize,
        actual: usize,
    },

    #[error("unknown slap kind code {0}")]
    UnknownKind(u8),

    #[error("unknown capture technology code {0}")]
    UnknownCaptureTechnology(u8),

    #[error("unknown orientation code {0}")]
    UnknownOrientation(u8),
}

/// Implements the numeric-code and name conversions shared by the metadata
/// enumerations.
macro_rules! coded_enum {
    ($name:ident, $err:expr, { $($variant:ident = $code:literal),+ $(,)? }) => {
        impl $name {
            /// Returns the numeric code.
            #[inline]
            pub fn code(self) -> u8 {
                self as u8
            }

            /// All variants in code order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
        }

        impl TryFrom<u8> for $name {
            type Error = ImageError;

            fn try_from(code: u8) -> Result<Self, Self::Error> {
                match code {
                    $($code => Ok($name::$variant),)+
                    other => Err($err(other)),
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            /// Parses a variant name (case-insensitive) or a numeric code.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if let Ok(code) = trimmed.parse::<u8>() {
                    return $name::try_from(code).map_err(|e| e.to_string());
                }
                $(
                    if trimmed.eq_ignore_ascii_case(stringify!($variant)) {
                        return Ok($name::$variant);
                    }
                )+
                let known: &[&str] = &[$(stringify!($variant)),+];
                Err(format!("'{}' (expected one of: {})", trimmed, known.join(", ")))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }
    };
}

/// The kind of slap capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// Tenprint card slap; fingers share one rotation.
    TwoInch = 2,
    /// Identification flats; segmentation positions are never rotated.
    ThreeInch = 3,
    /// Upper palm; fingers rotate independently.
    UpperPalm = 5,
    /// Full palm; fingers rotate independently.
    FullPalm = 8,
}

coded_enum!(Kind, ImageError::UnknownKind, {
    TwoInch = 2,
    ThreeInch = 3,
    UpperPalm = 5,
    FullPalm = 8,
});

impl Kind {
    /// Bytes per pixel of the image data for this kind.
    ///
    /// Every kind is captured as 8-bit grayscale.
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        1
    }

    /// Rotation policy for segmentation positions of this kind.
    pub fn rotation(self) -> RotationPolicy {
        match self {
            Kind::ThreeInch => RotationPolicy::Upright,
            Kind::TwoInch => RotationPolicy::Shared,
            Kind::UpperPalm | Kind::FullPalm => RotationPolicy::Independent,
        }
    }

    /// Returns true if positions found in this kind may be rotated.
    pub fn can_be_rotated(self) -> bool {
        self.rotation() != RotationPolicy::Upright
    }
}

/// How bounding quadrilaterals within one image may be rotated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationPolicy {
    /// Axis aligned only.
    Upright,
    /// One rotation shared by every finger.
    Shared,
    /// Each finger has its own rotation.
    Independent,
}

/// Friction ridge capture technology.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CaptureTechnology {
    #[default]
    Unknown = 0,
    ScannedInkOnPaper = 2,
    /// Optical, total internal reflection, bright field.
    OpticalTirBright = 3,
}

coded_enum!(CaptureTechnology, ImageError::UnknownCaptureTechnology, {
    Unknown = 0,
    ScannedInkOnPaper = 2,
    OpticalTirBright = 3,
});

/// Hand orientation being segmented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Right = 0,
    Left = 1,
    Thumbs = 2,
}

coded_enum!(Orientation, ImageError::UnknownOrientation, {
    Right = 0,
    Left = 1,
    Thumbs = 2,
});

/// Reasons that a slap image cannot be reliably segmented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Deficiency {
    /// Moisture halos, ghost impressions and similar artifacts.
    Artifacts = 0,
    /// Low contrast, over-inked, too much pressure.
    ImageQuality = 1,
    /// Hand placed sideways, upside-down or overly rotated.
    HandGeometry = 2,
    /// Most of the expected ridge structure is absent.
    Incomplete = 3,
}

impl Deficiency {
    /// All deficiencies in code order.
    pub const ALL: &'static [Deficiency] = &[
        Deficiency::Artifacts,
        Deficiency::ImageQuality,
        Deficiency::HandGeometry,
        Deficiency::Incomplete,
    ];

    /// Returns the numeric code.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Unchecked parts of a slap image, as read from a file and its metadata.
///
/// Enumerations are carried as raw codes so that unknown values can be
/// reported instead of being unrepresentable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSlapImage {
    pub width: u16,
    pub height: u16,
    pub ppi: u16,
    pub kind: u8,
    pub capture_technology: u8,
    pub orientation: u8,
    #[serde(skip)]
    pub pixels: Vec<u8>,
}

/// Data and metadata of an image containing one or more fingerprints.
///
/// Pixels are raw 8-bit grayscale, row-major without padding:
/// `pixels()[0]` is the top-left pixel and the last byte is the
/// bottom-right pixel, coded as in ISO/IEC 19794-4:2005 §6.2 (dark ridges
/// on a light background). A `SlapImage` is validated on construction and
/// never changes afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct SlapImage {
    width: u16,
    height: u16,
    ppi: u16,
    kind: Kind,
    capture_technology: CaptureTechnology,
    orientation: Orientation,
    pixels: Vec<u8>,
}

impl SlapImage {
    /// Creates a validated slap image.
    ///
    /// # Errors
    /// Returns an [`ImageError`] if a dimension or the resolution is zero,
    /// or if the buffer length does not match the dimensions.
    pub fn new(
        width: u16,
        height: u16,
        ppi: u16,
        kind: Kind,
        capture_technology: CaptureTechnology,
        orientation: Orientation,
        pixels: Vec<u8>,
    ) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::ZeroDimension { width, height });
        }
        if ppi == 0 {
            return Err(ImageError::ZeroResolution);
        }

        let bytes_per_pixel = kind.bytes_per_pixel();
        let expected = usize::from(width) * usize::from(height) * bytes_per_pixel;
        if pixels.len() != expected {
            return Err(ImageError::PixelCountMismatch {
                width,
                height,
                bytes_per_pixel,
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            ppi,
            kind,
            capture_technology,
            orientation,
            pixels,
        })
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Resolution in pixels per inch.
    #[inline]
    pub fn ppi(&self) -> u16 {
        self.ppi
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[inline]
    pub fn capture_technology(&self) -> CaptureTechnology {
        self.capture_technology
    }

    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// The raw pixel buffer.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns one row of pixels.
    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        let w = usize::from(self.width);
        &self.pixels[y * w..(y + 1) * w]
    }
}

impl TryFrom<RawSlapImage> for SlapImage {
    type Error = ImageError;

    fn try_from(raw: RawSlapImage) -> Result<Self, Self::Error> {
        let kind = Kind::try_from(raw.kind)?;
        let capture_technology = CaptureTechnology::try_from(raw.capture_technology)?;
        let orientation = Orientation::try_from(raw.orientation)?;
        SlapImage::new(
            raw.width,
            raw.height,
            raw.ppi,
            kind,
            capture_technology,
            orientation,
            raw.pixels,
        )
    }
}

impl fmt::Debug for SlapImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlapImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("ppi", &self.ppi)
            .field("kind", &self.kind)
            .field("capture_technology", &self.capture_technology)
            .field("orientation", &self.orientation)
            .field("pixels", &format_args!("[{} bytes]", self.pixels.len()))
            .finish()
    }
}
