//! Reads planes out of memory-mapped MetaImage data. The primary
//! structure is the [MetaImage reader](MetaImageReader).

use crate::metadata::{DataFile, ImageMd};
use crate::reader::{ImageReader, PhysicalSpacing, PlaneCoord, SpacingProvider, VolumeShape};
use crate::{PlanexErr, SampleType};
use log::{debug, info};
use memmap::{Mmap, MmapOptions};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Longest header we look for before giving up on finding the data
/// file entry.
const MAX_HEADER_LEN: u64 = 64 * 1024;

/// A reader over a single-series MetaImage.
///
/// Samples are stored X fastest with channels interleaved per pixel,
/// followed by Y, Z and T. Planes are handed out one channel at a
/// time.
pub struct MetaImageReader {
  /// Metadata related to the image.
  metadata: ImageMd,

  /// The mapped data file.
  map: Mmap,

  /// Offset of the first sample in `map`.
  offset: usize,
}

impl MetaImageReader {
  /// Open the MetaImage header at `path` and map its data.
  pub fn open(path: &Path) -> Result<Self, PlanexErr> {
    let mut header = Vec::new();
    File::open(path)?.take(MAX_HEADER_LEN).read_to_end(&mut header)?;
    let metadata = ImageMd::from_buffer(&header)?;

    info!("Loaded metadata from {}", path.display());
    info!("  X-dim = {}", metadata.xdim());
    info!("  Y-dim = {}", metadata.ydim());
    info!("  Z-dim = {}", metadata.zdim());
    info!("  T-dim = {}", metadata.tdim());
    info!("  Channels = {}", metadata.channels());

    let (data_path, offset) = match metadata.data_file() {
      DataFile::Local => (path.to_path_buf(), metadata.header_len()),
      DataFile::Path(data_file) => {
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        (dir.join(data_file), 0)
      }
    };

    let file = File::open(&data_path)?;
    let map = unsafe { MmapOptions::new().map(&file)? };

    info!("Mapped {} bytes of data from {}", map.len(), data_path.display());

    Self::from_map(metadata, map, offset)
  }

  /// Create a [reader](MetaImageReader) from metadata and mapped data.
  ///
  /// # Returns
  ///
  /// A reader or [an error](PlanexErr) in case the size of the data
  /// past `offset` does not match the expected size provided by
  /// `metadata`.
  pub fn from_map(metadata: ImageMd, map: Mmap, offset: usize) -> Result<Self, PlanexErr> {
    let expected = metadata.data_len();
    let actual = map.len().saturating_sub(offset);

    if actual != expected {
      return Err(PlanexErr::new_data_size_mismatch(actual, expected));
    }

    Ok(Self { metadata, map, offset })
  }

  /// Number of channel-separated planes.
  fn plane_count(&self) -> usize {
    self.metadata.zdim() * self.metadata.tdim() * self.metadata.channels()
  }

  /// Return the slice of bytes holding every channel of the plane at
  /// position `zt` (Z fastest, then T).
  fn interleaved_plane_bytes(&self, zt: usize) -> &[u8] {
    let plane_size = self.metadata.plane_samples() * self.metadata.element_type().size();
    let start = self.offset + plane_size * zt;
    &self.map[start..start + plane_size]
  }
}

impl SpacingProvider for MetaImageReader {
  fn physical_spacing(&self, series: usize) -> Option<PhysicalSpacing> {
    if series != 0 {
      return None;
    }

    self.metadata.spacing().map(|spacing| {
      PhysicalSpacing::new(spacing[0], spacing[1], spacing.get(2).copied().unwrap_or(1.0), spacing.get(3).copied())
    })
  }
}

impl ImageReader for MetaImageReader {
  fn series_count(&self) -> usize {
    1
  }

  fn series(&self) -> usize {
    0
  }

  fn set_series(&mut self, series: usize) -> Result<(), PlanexErr> {
    if series != 0 {
      return Err(PlanexErr::new_series_out_of_range(series, self.series_count()));
    }

    Ok(())
  }

  fn shape(&self) -> VolumeShape {
    VolumeShape::new(
      self.metadata.xdim(),
      self.metadata.ydim(),
      self.metadata.zdim(),
      self.metadata.tdim(),
      self.metadata.channels(),
      self.series_count(),
    )
  }

  fn sample_type(&self) -> SampleType {
    self.metadata.element_type()
  }

  fn is_little_endian(&self) -> bool {
    !self.metadata.big_endian()
  }

  fn index(&self, coord: PlaneCoord) -> Result<usize, PlanexErr> {
    let md = &self.metadata;

    if coord.z >= md.zdim() || coord.c >= md.channels() || coord.t >= md.tdim() {
      return Err(PlanexErr::new_plane_out_of_range(coord.z, coord.c, coord.t));
    }

    Ok((coord.t * md.zdim() + coord.z) * md.channels() + coord.c)
  }

  fn open_bytes(&mut self, index: usize) -> Result<Vec<u8>, PlanexErr> {
    let count = self.plane_count();
    if index >= count {
      return Err(PlanexErr::new_plane_index_out_of_range(index, count));
    }

    let channels = self.metadata.channels();
    let sample_size = self.metadata.element_type().size();
    let channel = index % channels;
    let interleaved = self.interleaved_plane_bytes(index / channels);

    debug!("Opening plane {} (channel {} of {})", index, channel, channels);

    if channels == 1 {
      return Ok(interleaved.to_vec());
    }

    // Pick one channel's sample out of every pixel.
    let pixel_size = channels * sample_size;
    let start = channel * sample_size;
    let bytes = interleaved.chunks(pixel_size).flat_map(|pixel| &pixel[start..start + sample_size]).copied().collect();

    Ok(bytes)
  }

  fn spacing_provider(&self) -> Option<&dyn SpacingProvider> {
    if self.metadata.spacing().is_some() {
      Some(self)
    } else {
      None
    }
  }
}
