//! The primary error-type for the library.
//!
//! Usually this would be broken down into one error type per
//! module/structure and then collected here. However, since the
//! number of modules is small a single error type for the whole
//! library is workable.

use crate::pixel::SampleType;
use derive_more::{Display, From};
use derive_new::new;
use std::io;
use std::num::TryFromIntError;
use tiff::TiffError;

/// Library error type.
#[derive(new, Display, From, Debug)]
#[display(fmt = "Planex Error: {}")]
pub enum Err {
  /// IO errors from readers, writers and output files.
  #[display(fmt = "IO error: {}", _0)]
  Io(io::Error),

  /// Errors from the TIFF encoder.
  #[display(fmt = "TIFF error: {}", _0)]
  Tiff(TiffError),

  /// Dimension conversion errors.
  #[display(fmt = "Dimension conversion error: {}", _0)]
  DimConversion(TryFromIntError),

  /// Found a key without any values.
  #[from(ignore)]
  #[display(fmt = "Metadata Line {}: Expecting values for `{}` key", line_number, key)]
  MdMissingValues {
    /// The line number at which the error was found.
    line_number: usize,

    /// The key missing its values.
    key: String,
  },

  /// One of the values of a key is invalid.
  #[from(ignore)]
  #[display(fmt = "Metadata Line {}: Invalid value {} for `{}` key", line_number, value, key)]
  MdInvalidValue {
    /// The line number at which the error was found.
    line_number: usize,

    /// The key the value belongs to.
    key: String,

    /// The invalid value.
    value: String,
  },

  /// A duplicate key was found.
  #[from(ignore)]
  #[display(fmt = "Metadata Line {}: Duplicated `{}` key", line_number, key)]
  MdDuplicateKey {
    /// The line number at which the error was found.
    line_number: usize,

    /// The duplicated key.
    key: String,
  },

  /// Could not find a required key.
  #[from(ignore)]
  #[display(fmt = "Invalid metadata, `{}` key not found", key)]
  MdKeyNotFound {
    /// The missing key.
    key: String,
  },

  /// Found too many values for a key.
  #[from(ignore)]
  #[display(fmt = "Metadata Line {}: Too many values for `{}` key", line_number, key)]
  MdTooManyValues {
    /// The line number at which the error was found.
    line_number: usize,

    /// The key with surplus values.
    key: String,
  },

  /// The number of dimensions is outside of what can be exported.
  #[from(ignore)]
  #[display(fmt = "Invalid metadata, {} dimensions are not supported (expecting 2 to 4)", ndims)]
  MdUnsupportedDims {
    /// The declared number of dimensions.
    ndims: usize,
  },

  /// Data size does not match metadata information.
  #[from(ignore)]
  #[display(
    fmt = "Data size of {} bytes does not match metadata: expecting {} bytes",
    actual,
    expected
  )]
  DataSizeMismatch {
    /// The size of data in bytes.
    actual: usize,

    /// The expected size in bytes based on metadata.
    expected: usize,
  },

  /// The pixel type cannot be declared in an NRRD header.
  #[from(ignore)]
  #[display(fmt = "Unsupported pixel type {}", _0)]
  UnsupportedPixelType(SampleType),

  /// The requested series does not exist.
  #[from(ignore)]
  #[display(fmt = "Series {} is out of range, the file has {} series", series, count)]
  SeriesOutOfRange {
    /// The requested series.
    series: usize,

    /// The number of series available.
    count: usize,
  },

  /// The requested plane coordinate does not exist.
  #[from(ignore)]
  #[display(fmt = "Plane at z={} c={} t={} is out of range", z, c, t)]
  PlaneOutOfRange {
    /// Z index.
    z: usize,

    /// Channel index.
    c: usize,

    /// Time index.
    t: usize,
  },

  /// The requested plane index does not exist.
  #[from(ignore)]
  #[display(fmt = "Plane index {} is out of range, the series has {} planes", index, count)]
  PlaneIndexOutOfRange {
    /// The requested plane index.
    index: usize,

    /// The number of planes in the series.
    count: usize,
  },

  /// A reader produced a plane of unexpected length.
  #[from(ignore)]
  #[display(fmt = "Plane of {} bytes does not match the expected {} bytes", actual, expected)]
  PlaneSizeMismatch {
    /// The size of the plane in bytes.
    actual: usize,

    /// The expected size in bytes based on the volume shape.
    expected: usize,
  },

  /// The output file extension does not name a known format.
  #[from(ignore)]
  #[display(fmt = "Unsupported output format for {}", path)]
  UnsupportedFormat {
    /// The output path.
    path: String,
  },

  /// A plane was handed to a writer after its final plane.
  #[from(ignore)]
  #[display(fmt = "Writer for {} was already closed", path)]
  WriterClosed {
    /// The output path.
    path: String,
  },
}
