//! CSV logs written by batch runs.
//!
//! The segment log has one row per returned position, or one row per
//! expected position with `NA` geometry when the status does not return
//! positions. The orientation log has one row per image.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::sanitize_message;
use crate::error::SlapsegError;
use crate::model::{
    FrictionRidgeGeneralizedPosition, Orientation, ReturnStatus, Segmentation, SlapImage,
    StatusCode,
};
use crate::validation::{
    deficiency_bit_string, has_correct_quantity, PositionErrors, DEFAULT_ANGLE_TOLERANCE_DEG,
};

pub const SEGMENT_HEADER: [&str; 18] = [
    "name",
    "elapsed",
    "rCode",
    "rMessage",
    "frgp",
    "tlx",
    "tly",
    "trx",
    "try",
    "blx",
    "bly",
    "brx",
    "bry",
    "sCode",
    "sMessage",
    "errors",
    "deficiencies",
    "correctQuantity",
];

pub const ORIENTATION_HEADER: [&str; 5] = ["name", "elapsed", "rCode", "rMessage", "orientation"];

const NA: &str = "NA";

/// Whole microseconds, saturating.
fn micros(elapsed: Duration) -> String {
    u64::try_from(elapsed.as_micros())
        .unwrap_or(u64::MAX)
        .to_string()
}

/// Shared CSV plumbing: a writer plus the path used in error messages.
struct LogWriter<W: Write> {
    csv: csv::Writer<W>,
    path: PathBuf,
}

impl<W: Write> LogWriter<W> {
    fn new(writer: W, path: PathBuf, header: &[&str]) -> Result<Self, SlapsegError> {
        let mut log = Self {
            csv: csv::Writer::from_writer(writer),
            path,
        };
        log.row(header)?;
        Ok(log)
    }

    fn row<I, T>(&mut self, record: I) -> Result<(), SlapsegError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.csv
            .write_record(record)
            .map_err(|source| SlapsegError::LogWrite {
                path: self.path.clone(),
                source,
            })
    }

    fn finish(self) -> Result<W, SlapsegError> {
        self.csv
            .into_inner()
            .map_err(|e| SlapsegError::Io(e.into_error()))
    }
}

/// Writer for segmentation results.
pub struct SegmentLog<W: Write> {
    inner: LogWriter<W>,
}

impl SegmentLog<BufWriter<File>> {
    /// Creates (or truncates) a log file and writes its header.
    pub fn create(path: &Path) -> Result<Self, SlapsegError> {
        let file = File::create(path).map_err(|source| SlapsegError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(BufWriter::new(file), path.to_path_buf())
    }
}

impl<W: Write> SegmentLog<W> {
    pub fn new(writer: W, path: PathBuf) -> Result<Self, SlapsegError> {
        Ok(Self {
            inner: LogWriter::new(writer, path, &SEGMENT_HEADER)?,
        })
    }

    /// Appends the rows for one segmented image.
    pub fn record(
        &mut self,
        name: &str,
        elapsed: Duration,
        image: &SlapImage,
        segmentation: &Segmentation,
    ) -> Result<(), SlapsegError> {
        let status = &segmentation.status;
        if !status.code().returns_positions() {
            return self.record_without_positions(name, elapsed, image.orientation(), status);
        }

        let elapsed = micros(elapsed);
        let r_code = status.code().code().to_string();
        let r_message = sanitize_message(status.message());
        let deficiencies = deficiency_bit_string(status.deficiencies());
        let quantity = if has_correct_quantity(image, segmentation) {
            "1"
        } else {
            "0"
        };
        for position in &segmentation.positions {
            let quad = position.quad_or_zero();
            let errors = PositionErrors::check(position, image, DEFAULT_ANGLE_TOLERANCE_DEG);
            let mut row = vec![
                name.to_string(),
                elapsed.clone(),
                r_code.clone(),
                r_message.clone(),
                position.frgp.code().to_string(),
            ];
            for corner in [quad.tl, quad.tr, quad.bl, quad.br] {
                row.push(corner.x.to_string());
                row.push(corner.y.to_string());
            }
            row.extend([
                position.result_code().code().to_string(),
                sanitize_message(position.message()),
                errors.bit_string(),
                deficiencies.clone(),
                quantity.to_string(),
            ]);
            self.inner.row(&row)?;
        }
        Ok(())
    }

    /// Appends one `NA` row per position expected for `orientation`.
    ///
    /// Used for statuses that return no positions, including images that
    /// could not be built at all.
    pub fn record_without_positions(
        &mut self,
        name: &str,
        elapsed: Duration,
        orientation: Orientation,
        status: &ReturnStatus,
    ) -> Result<(), SlapsegError> {
        let elapsed = micros(elapsed);
        let r_code = status.code().code().to_string();
        let r_message = sanitize_message(status.message());
        for frgp in FrictionRidgeGeneralizedPosition::expected_for(orientation) {
            let mut row = vec![
                name.to_string(),
                elapsed.clone(),
                r_code.clone(),
                r_message.clone(),
                frgp.code().to_string(),
            ];
            row.extend(std::iter::repeat(NA.to_string()).take(9));
            row.extend([String::new(), String::new(), String::new(), NA.to_string()]);
            self.inner.row(&row)?;
        }
        Ok(())
    }

    /// Flushes the log and returns the underlying writer.
    pub fn finish(self) -> Result<W, SlapsegError> {
        let mut writer = self.inner.finish()?;
        writer.flush()?;
        Ok(writer)
    }
}

/// Writer for orientation results.
pub struct OrientationLog<W: Write> {
    inner: LogWriter<W>,
}

impl OrientationLog<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self, SlapsegError> {
        let file = File::create(path).map_err(|source| SlapsegError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(BufWriter::new(file), path.to_path_buf())
    }
}

impl<W: Write> OrientationLog<W> {
    pub fn new(writer: W, path: PathBuf) -> Result<Self, SlapsegError> {
        Ok(Self {
            inner: LogWriter::new(writer, path, &ORIENTATION_HEADER)?,
        })
    }

    /// Appends one row. The orientation is only recorded on success.
    pub fn record(
        &mut self,
        name: &str,
        elapsed: Duration,
        status: &ReturnStatus,
        orientation: Orientation,
    ) -> Result<(), SlapsegError> {
        let orientation = if status.code() == StatusCode::Success {
            orientation.code().to_string()
        } else {
            NA.to_string()
        };
        self.inner.row([
            name.to_string(),
            micros(elapsed),
            status.code().code().to_string(),
            sanitize_message(status.message()),
            orientation,
        ])
    }

    pub fn finish(self) -> Result<W, SlapsegError> {
        let mut writer = self.inner.finish()?;
        writer.flush()?;
        Ok(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CaptureTechnology, Deficiency, Kind, Quadrilateral, SegmentationPosition,
    };
    use FrictionRidgeGeneralizedPosition::*;

    fn image() -> SlapImage {
        SlapImage::new(
            300,
            200,
            500,
            Kind::TwoInch,
            CaptureTechnology::Unknown,
            Orientation::Thumbs,
            vec![255; 300 * 200],
        )
        .unwrap()
    }

    fn lines(bytes: Vec<u8>) -> Vec<String> {
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_segment_rows() {
        let segmentation = Segmentation {
            status: ReturnStatus::recapture(
                StatusCode::RequestRecaptureWithAttempt,
                [Deficiency::Incomplete],
                "one thumb",
            )
            .unwrap(),
            positions: vec![
                SegmentationPosition::success(
                    LeftThumb,
                    Quadrilateral::axis_aligned(10, 20, 90, 150),
                ),
                SegmentationPosition::not_found(RightThumb, "no\nthumb"),
            ],
        };

        let mut log = SegmentLog::new(Vec::new(), PathBuf::from("<test>")).unwrap();
        log.record("t.raw", Duration::from_micros(1234), &image(), &segmentation)
            .unwrap();
        let lines = lines(log.finish().unwrap());

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], SEGMENT_HEADER.join(","));
        assert_eq!(
            lines[1],
            "t.raw,1234,3,one thumb,6,10,20,90,20,10,150,90,150,0,,0000,1000,1"
        );
        assert_eq!(
            lines[2],
            "t.raw,1234,3,one thumb,1,0,0,0,0,0,0,0,0,1,no thumb,0000,1000,1"
        );
    }

    #[test]
    fn test_segment_rows_without_positions() {
        let segmentation = Segmentation::without_positions(ReturnStatus::unsupported_resolution(
            "1200 ppi, \"too fine\"",
        ));
        let mut log = SegmentLog::new(Vec::new(), PathBuf::from("<test>")).unwrap();
        log.record("t.raw", Duration::from_micros(5), &image(), &segmentation)
            .unwrap();
        let lines = lines(log.finish().unwrap());

        // one row per expected thumb
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "t.raw,5,4,\"1200 ppi, \"\"too fine\"\"\",6,NA,NA,NA,NA,NA,NA,NA,NA,NA,,,,NA"
        );
        assert!(lines[2].contains(",1,NA,"));
    }

    #[test]
    fn test_orientation_rows() {
        let mut log = OrientationLog::new(Vec::new(), PathBuf::from("<test>")).unwrap();
        log.record(
            "a.raw",
            Duration::from_micros(10),
            &ReturnStatus::success(),
            Orientation::Left,
        )
        .unwrap();
        log.record(
            "b.raw",
            Duration::from_micros(11),
            &ReturnStatus::not_implemented(""),
            Orientation::Right,
        )
        .unwrap();
        let lines = lines(log.finish().unwrap());

        assert_eq!(lines[0], "name,elapsed,rCode,rMessage,orientation");
        assert_eq!(lines[1], "a.raw,10,0,,1");
        assert_eq!(lines[2], "b.raw,11,6,,NA");
    }

    #[test]
    fn test_create_error_names_the_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("missing").join("segments-2-0.log");

        let err = SegmentLog::create(&path).err().expect("create should fail");
        assert!(matches!(err, SlapsegError::FileWrite { .. }));
        assert!(err.to_string().contains("segments-2-0.log"), "{}", err);

        let err = OrientationLog::create(&path).err().expect("create should fail");
        assert!(err.to_string().contains("segments-2-0.log"), "{}", err);
    }
}
