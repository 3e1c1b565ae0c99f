//! The reader capability the exporters pull planes from.
//!
//! A reader exposes a multi-dimensional image as a set of series,
//! each made up of 2D planes addressed by a (Z, Channel, Time)
//! coordinate. How the planes are decoded is up to the implementor.

use crate::PlanexErr;
use crate::SampleType;
use derive_new::new;

/// Read-only snapshot of the sizes of the selected series.
#[derive(new, Debug, PartialEq, Eq, Clone, Copy)]
pub struct VolumeShape {
  /// Number of pixels on the X-axis.
  size_x: usize,

  /// Number of pixels on the Y-axis.
  size_y: usize,

  /// Number of Z-slices.
  size_z: usize,

  /// Number of time points.
  size_t: usize,

  /// Number of channels.
  size_c: usize,

  /// Number of series in the file.
  series_count: usize,
}

impl VolumeShape {
  /// Number of pixels on the X-axis.
  pub fn size_x(&self) -> usize {
    self.size_x
  }

  /// Number of pixels on the Y-axis.
  pub fn size_y(&self) -> usize {
    self.size_y
  }

  /// Number of Z-slices.
  pub fn size_z(&self) -> usize {
    self.size_z
  }

  /// Number of time points.
  pub fn size_t(&self) -> usize {
    self.size_t
  }

  /// Number of channels.
  pub fn size_c(&self) -> usize {
    self.size_c
  }

  /// Number of series in the file.
  pub fn series_count(&self) -> usize {
    self.series_count
  }

  /// Number of pixels in a single plane.
  pub fn plane_len(&self) -> usize {
    self.size_x * self.size_y
  }
}

/// Coordinate of a single plane within a series.
#[derive(new, Debug, PartialEq, Eq, Clone, Copy)]
pub struct PlaneCoord {
  /// Z index.
  pub z: usize,

  /// Channel index.
  pub c: usize,

  /// Time index.
  pub t: usize,
}

/// Physical size of a pixel along each axis.
#[derive(new, Debug, PartialEq, Clone, Copy)]
pub struct PhysicalSpacing {
  /// Distance between pixels on the X-axis.
  pub x: f64,

  /// Distance between pixels on the Y-axis.
  pub y: f64,

  /// Distance between Z-slices.
  pub z: f64,

  /// Interval between time points, when known.
  pub t: Option<f64>,
}

/// Optional capability of a reader to report physical spacing.
pub trait SpacingProvider {
  /// Physical spacing of the given series, if recorded.
  fn physical_spacing(&self, series: usize) -> Option<PhysicalSpacing>;
}

/// Random access to the planes of a multi-dimensional image.
pub trait ImageReader {
  /// Number of series in the file.
  fn series_count(&self) -> usize;

  /// Currently selected series.
  fn series(&self) -> usize;

  /// Select the series subsequent calls refer to.
  fn set_series(&mut self, series: usize) -> Result<(), PlanexErr>;

  /// Sizes of the selected series.
  fn shape(&self) -> VolumeShape;

  /// Type of the samples in every plane.
  fn sample_type(&self) -> SampleType;

  /// Whether multi-byte samples are stored least significant byte
  /// first.
  fn is_little_endian(&self) -> bool;

  /// Map a plane coordinate to the index accepted by
  /// [`open_bytes`](ImageReader::open_bytes).
  fn index(&self, coord: PlaneCoord) -> Result<usize, PlanexErr>;

  /// Raw bytes of a plane, in the reader's native byte order.
  fn open_bytes(&mut self, index: usize) -> Result<Vec<u8>, PlanexErr>;

  /// Physical spacing capability, if this reader has one.
  fn spacing_provider(&self) -> Option<&dyn SpacingProvider> {
    None
  }
}

#[cfg(test)]
pub(crate) mod testing {
  //! An in-memory reader that records every plane it is asked for.

  use super::{ImageReader, PhysicalSpacing, PlaneCoord, SpacingProvider, VolumeShape};
  use crate::{PlanexErr, SampleType};

  pub(crate) struct RecordingReader {
    pub shape: VolumeShape,
    pub sample_type: SampleType,
    pub spacing: Option<PhysicalSpacing>,
    pub series: usize,
    pub fetched: Vec<PlaneCoord>,
    /// Byte length of every returned plane, when it should differ from
    /// the shape.
    pub plane_bytes: Option<usize>,
  }

  impl RecordingReader {
    pub fn new(shape: VolumeShape, sample_type: SampleType) -> Self {
      Self { shape, sample_type, spacing: None, series: 0, fetched: Vec::new(), plane_bytes: None }
    }

    fn coord(&self, index: usize) -> PlaneCoord {
      let c = index % self.shape.size_c();
      let zt = index / self.shape.size_c();
      PlaneCoord::new(zt % self.shape.size_z(), c, zt / self.shape.size_z())
    }
  }

  impl SpacingProvider for RecordingReader {
    fn physical_spacing(&self, _series: usize) -> Option<PhysicalSpacing> {
      self.spacing
    }
  }

  impl ImageReader for RecordingReader {
    fn series_count(&self) -> usize {
      self.shape.series_count()
    }

    fn series(&self) -> usize {
      self.series
    }

    fn set_series(&mut self, series: usize) -> Result<(), PlanexErr> {
      self.series = series;
      Ok(())
    }

    fn shape(&self) -> VolumeShape {
      self.shape
    }

    fn sample_type(&self) -> SampleType {
      self.sample_type
    }

    fn is_little_endian(&self) -> bool {
      true
    }

    fn index(&self, coord: PlaneCoord) -> Result<usize, PlanexErr> {
      if coord.z >= self.shape.size_z() || coord.c >= self.shape.size_c() || coord.t >= self.shape.size_t() {
        return Err(PlanexErr::new_plane_out_of_range(coord.z, coord.c, coord.t));
      }

      Ok((coord.t * self.shape.size_z() + coord.z) * self.shape.size_c() + coord.c)
    }

    /// Every byte of a plane holds the plane's index.
    fn open_bytes(&mut self, index: usize) -> Result<Vec<u8>, PlanexErr> {
      let coord = self.coord(index);
      self.fetched.push(coord);
      let len = self.plane_bytes.unwrap_or_else(|| self.shape.plane_len() * self.sample_type.size());
      Ok(vec![index as u8; len])
    }

    fn spacing_provider(&self) -> Option<&dyn SpacingProvider> {
      if self.spacing.is_some() {
        Some(self)
      } else {
        None
      }
    }
  }
}
