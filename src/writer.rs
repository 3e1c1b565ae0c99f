//! Plane-by-plane export through image encoders.
//!
//! Each planned plane is fetched, wrapped in a [plane](Plane) and
//! handed to a [plane writer](PlaneWriter) together with a flag
//! marking the final plane, so the writer can finish its output
//! exactly once.

use crate::plan::{AxisSelection, ExportMode, ExportPlan, ExportSummary};
use crate::reader::ImageReader;
use crate::utils::{self, Sample};
use crate::{PlanexErr, SampleType};
use derive_new::new;
use log::{debug, info, trace};
use std::convert::TryFrom;
use std::ffi::OsStr;
use std::fs::File;
use std::path::{Path, PathBuf};
use tiff::encoder::{colortype, TiffEncoder};

/// A single plane of samples.
#[derive(new, Debug, PartialEq, Eq, Clone)]
pub struct Plane {
  /// Number of pixels in a row.
  width: usize,

  /// Number of rows.
  height: usize,

  /// The type of every sample.
  sample_type: SampleType,

  /// Byte order of multi-byte samples.
  little_endian: bool,

  /// Raw samples, row by row.
  bytes: Vec<u8>,
}

impl Plane {
  /// Number of pixels in a row.
  pub fn width(&self) -> usize {
    self.width
  }

  /// Number of rows.
  pub fn height(&self) -> usize {
    self.height
  }

  /// The type of every sample.
  pub fn sample_type(&self) -> SampleType {
    self.sample_type
  }

  /// Raw samples, row by row.
  pub fn bytes(&self) -> &[u8] {
    &self.bytes
  }

  /// Decode the samples of the plane.
  pub fn samples<T: Sample>(&self) -> Vec<T> {
    utils::decode_samples(&self.bytes, self.little_endian)
  }

  /// The plane as 8-bit greys stretched over its own range.
  pub fn to_grey(&self) -> Vec<u8> {
    utils::stretch_to_grey(&utils::decode_widened(&self.bytes, self.sample_type, self.little_endian))
  }
}

/// Something that encodes a sequence of planes.
pub trait PlaneWriter {
  /// Encode `plane`. `last` is set on the final plane of the export
  /// and on no other.
  fn save_plane(&mut self, plane: &Plane, last: bool) -> Result<(), PlanexErr>;
}

/// Output formats, chosen by file extension.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OutputFormat {
  /// Raw NRRD stream.
  Nrrd,
  /// Multi-page TIFF.
  Tiff,
  /// One BMP image per plane.
  Bmp,
}

impl OutputFormat {
  /// Pick the format for an output path.
  pub fn from_path(path: &Path) -> Result<Self, PlanexErr> {
    let extension = path.extension().and_then(OsStr::to_str).map(str::to_ascii_lowercase);

    match extension.as_deref() {
      Some("nrrd") => Ok(OutputFormat::Nrrd),
      Some("tif") | Some("tiff") => Ok(OutputFormat::Tiff),
      Some("bmp") => Ok(OutputFormat::Bmp),
      _ => Err(PlanexErr::new_unsupported_format(path.display().to_string())),
    }
  }
}

/// Export the selected planes of `reader` to `writer`, one call per
/// plane in plan order.
pub fn export_planes<R, W>(reader: &mut R, selection: &AxisSelection, writer: &mut W) -> Result<ExportSummary, PlanexErr>
where
  R: ImageReader + ?Sized,
  W: PlaneWriter + ?Sized,
{
  reader.set_series(selection.series)?;
  let shape = reader.shape();
  let plan = ExportPlan::resolve(selection, &shape);
  let sample_type = reader.sample_type();
  let little_endian = reader.is_little_endian();

  debug!(
    "Export plan for series {}: {:?} over {} planes ({}D)",
    reader.series(),
    plan.iteration(),
    plan.count(),
    plan.dimensionality(ExportMode::Planes)
  );

  let mut summary = ExportSummary::default();

  for step in plan.steps() {
    let index = reader.index(step.coord)?;
    let bytes = reader.open_bytes(index)?;
    let len = bytes.len();

    trace!("Saving plane {} ({:?}, index {})", step.position, step.coord, index);
    let plane = Plane::new(shape.size_x(), shape.size_y(), sample_type, little_endian, bytes);
    writer.save_plane(&plane, step.is_last)?;

    summary.planes += 1;
    summary.bytes += len;
  }

  Ok(summary)
}

/// Writes planes as pages of a single TIFF file.
pub struct TiffPlaneWriter {
  path: PathBuf,
  encoder: Option<TiffEncoder<File>>,
  pages: usize,
}

impl TiffPlaneWriter {
  /// Create the TIFF file at `path`.
  pub fn create(path: &Path) -> Result<Self, PlanexErr> {
    info!("Creating TIFF file at {}", path.display());
    let encoder = TiffEncoder::new(File::create(path)?)?;
    Ok(Self { path: path.to_path_buf(), encoder: Some(encoder), pages: 0 })
  }

  /// Number of pages written so far.
  pub fn pages(&self) -> usize {
    self.pages
  }
}

impl PlaneWriter for TiffPlaneWriter {
  fn save_plane(&mut self, plane: &Plane, last: bool) -> Result<(), PlanexErr> {
    let encoder = match self.encoder.as_mut() {
      Some(encoder) => encoder,
      None => return Err(PlanexErr::new_writer_closed(self.path.display().to_string())),
    };

    let expected = plane.width() * plane.height() * plane.sample_type().size();
    if plane.bytes().len() != expected {
      return Err(PlanexErr::new_plane_size_mismatch(plane.bytes().len(), expected));
    }

    let width = u32::try_from(plane.width())?;
    let height = u32::try_from(plane.height())?;

    match plane.sample_type() {
      SampleType::Int8 => encoder.write_image::<colortype::GrayI8>(width, height, &plane.samples::<i8>())?,
      SampleType::Int16 => encoder.write_image::<colortype::GrayI16>(width, height, &plane.samples::<i16>())?,
      SampleType::Int32 => encoder.write_image::<colortype::GrayI32>(width, height, &plane.samples::<i32>())?,
      SampleType::Int64 => encoder.write_image::<colortype::GrayI64>(width, height, &plane.samples::<i64>())?,
      SampleType::Uint8 => encoder.write_image::<colortype::Gray8>(width, height, &plane.samples::<u8>())?,
      SampleType::Uint16 => encoder.write_image::<colortype::Gray16>(width, height, &plane.samples::<u16>())?,
      SampleType::Uint32 => encoder.write_image::<colortype::Gray32>(width, height, &plane.samples::<u32>())?,
      SampleType::Uint64 => encoder.write_image::<colortype::Gray64>(width, height, &plane.samples::<u64>())?,
      SampleType::Float => encoder.write_image::<colortype::Gray32Float>(width, height, &plane.samples::<f32>())?,
      SampleType::Double => encoder.write_image::<colortype::Gray64Float>(width, height, &plane.samples::<f64>())?,
    }

    self.pages += 1;
    trace!("Wrote page {} to {}", self.pages, self.path.display());

    if last {
      // Dropping the encoder closes the file.
      self.encoder = None;
      info!("Closed {} after {} pages", self.path.display(), self.pages);
    }

    Ok(())
  }
}

/// Writes planes as 8-bit grey BMP images.
///
/// A single-plane export goes to the given path. Otherwise every
/// plane is written next to it, numbered by its position.
pub struct BmpPlaneWriter {
  path: PathBuf,
  written: usize,
  closed: bool,
}

impl BmpPlaneWriter {
  /// Prepare to write images at or next to `path`.
  pub fn new(path: &Path) -> Self {
    Self { path: path.to_path_buf(), written: 0, closed: false }
  }

  /// Path of the image at `position` of a multi-plane export.
  pub fn numbered_path(&self, position: usize) -> PathBuf {
    let stem = self.path.file_stem().and_then(OsStr::to_str).unwrap_or("plane");
    self.path.with_file_name(format!("{}_{:04}.bmp", stem, position))
  }
}

impl PlaneWriter for BmpPlaneWriter {
  fn save_plane(&mut self, plane: &Plane, last: bool) -> Result<(), PlanexErr> {
    if self.closed {
      return Err(PlanexErr::new_writer_closed(self.path.display().to_string()));
    }

    let width = u32::try_from(plane.width())?;
    let height = u32::try_from(plane.height())?;
    let greys = plane.to_grey();

    let mut image = bmp::Image::new(width, height);
    for (y, row) in (0..height).zip(greys.chunks(plane.width().max(1))) {
      for (x, &grey) in (0..width).zip(row) {
        image.set_pixel(x, y, bmp::Pixel::new(grey, grey, grey));
      }
    }

    let path = if self.written == 0 && last { self.path.clone() } else { self.numbered_path(self.written) };

    debug!("Saving plane {} (bmp) to {}", self.written, path.display());
    image.save(&path)?;

    self.written += 1;
    self.closed = last;

    Ok(())
  }
}

#[cfg(test)]
mod writer_tests {
  use super::{export_planes, OutputFormat, Plane, PlaneWriter};
  use crate::plan::AxisSelection;
  use crate::reader::testing::RecordingReader;
  use crate::reader::{PlaneCoord, VolumeShape};
  use crate::{PlanexErr, SampleType};
  use std::path::Path;

  #[derive(Default)]
  struct RecordingWriter {
    saved: Vec<(Vec<u8>, bool)>,
  }

  impl PlaneWriter for RecordingWriter {
    fn save_plane(&mut self, plane: &Plane, last: bool) -> Result<(), PlanexErr> {
      self.saved.push((plane.bytes().to_vec(), last));
      Ok(())
    }
  }

  #[test]
  fn full_stack_flags_only_the_fifth_plane() {
    let mut reader = RecordingReader::new(VolumeShape::new(2, 2, 5, 1, 1, 1), SampleType::Uint8);
    let mut writer = RecordingWriter::default();

    let summary = export_planes(&mut reader, &AxisSelection::default(), &mut writer).unwrap();

    assert_eq!(summary.planes, 5);
    assert_eq!(reader.fetched.iter().map(|coord| coord.z).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    assert!(reader.fetched.iter().all(|coord| coord.t == 0));

    let flags: Vec<_> = writer.saved.iter().map(|(_, last)| *last).collect();
    assert_eq!(flags, vec![false, false, false, false, true]);
  }

  #[test]
  fn planes_are_forwarded_in_order() {
    let mut reader = RecordingReader::new(VolumeShape::new(1, 1, 2, 3, 1, 1), SampleType::Uint8);
    let mut writer = RecordingWriter::default();

    export_planes(&mut reader, &AxisSelection::new(0, 0, None, Some(1)), &mut writer).unwrap();

    let firsts: Vec<_> = writer.saved.iter().map(|(bytes, _)| bytes[0]).collect();
    assert_eq!(firsts, vec![1, 3, 5]);
  }

  #[test]
  fn single_plane_is_last() {
    let mut reader = RecordingReader::new(VolumeShape::new(1, 1, 2, 3, 1, 1), SampleType::Uint8);
    let mut writer = RecordingWriter::default();

    export_planes(&mut reader, &AxisSelection::new(0, 0, Some(2), Some(1)), &mut writer).unwrap();

    assert_eq!(reader.fetched, vec![PlaneCoord::new(1, 0, 2)]);
    assert_eq!(writer.saved.len(), 1);
    assert!(writer.saved[0].1);
  }

  #[test]
  fn plane_to_grey() {
    let bytes = [0u16, 100, 200].iter().flat_map(|v| v.to_le_bytes().to_vec()).collect();
    let plane = Plane::new(3, 1, SampleType::Uint16, true, bytes);
    assert_eq!(plane.to_grey(), vec![0, 128, 255]);
  }

  #[test]
  fn formats_by_extension() {
    assert_eq!(OutputFormat::from_path(Path::new("out.nrrd")).unwrap(), OutputFormat::Nrrd);
    assert_eq!(OutputFormat::from_path(Path::new("out.TIF")).unwrap(), OutputFormat::Tiff);
    assert_eq!(OutputFormat::from_path(Path::new("out.tiff")).unwrap(), OutputFormat::Tiff);
    assert_eq!(OutputFormat::from_path(Path::new("dir/out.bmp")).unwrap(), OutputFormat::Bmp);
    assert!(matches!(
      OutputFormat::from_path(Path::new("out.png")),
      Err(PlanexErr::UnsupportedFormat { .. })
    ));
    assert!(OutputFormat::from_path(Path::new("out")).is_err());
  }
}
