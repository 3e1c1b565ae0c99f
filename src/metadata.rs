//! Handles MetaImage headers describing multi-dimensional images. The
//! primary structure is the [image metadata struct](ImageMd).

use crate::{PlanexErr, SampleType};
use atoi::FromRadix10Checked;
use log::{debug, warn};
use std::path::PathBuf;

/// Where the samples of an image are stored.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum DataFile {
  /// Samples follow the header in the same file.
  Local,

  /// Samples are in a separate file, relative to the header.
  Path(PathBuf),
}

/// Image metadata.
#[derive(Debug, PartialEq, Clone)]
pub struct ImageMd {
  /// Sizes in X, Y, Z, T order. Missing trailing axes are 1.
  dims: [usize; 4],

  /// Physical spacing of the declared axes, if recorded.
  spacing: Option<Vec<f64>>,

  /// Type of the samples.
  element_type: SampleType,

  /// Number of interleaved channels per pixel.
  channels: usize,

  /// Whether samples are stored most significant byte first.
  big_endian: bool,

  /// Location of the samples.
  data_file: DataFile,

  /// Number of bytes of sample data.
  data_len: usize,

  /// Length in bytes of the header, including the line naming the
  /// data file.
  header_len: usize,
}

/// A key that was found while parsing and the line it was found on.
struct Entry<T> {
  line_number: usize,
  value: T,
}

impl ImageMd {
  /// Load [image metadata](ImageMd) from the start of a header.
  ///
  /// Reads `key = value` lines up to and including the
  /// `ElementDataFile` line, which must come last. Anything after it
  /// is not looked at, so `buffer` may continue with binary data.
  ///
  /// # Notes
  ///
  /// This is not a real parser. Instead, it works by splitting lines
  /// and tries to graciously handle keys it does not know.
  ///
  /// # Arguments
  ///
  /// * `buffer` - The header, possibly followed by sample data.
  ///
  /// # Returns
  ///
  /// Populated [image metadata](ImageMd) or [an error](PlanexErr).
  pub fn from_buffer(buffer: &[u8]) -> Result<Self, PlanexErr> {
    let mut ndims: Option<Entry<usize>> = None;
    let mut dim_size: Option<Entry<Vec<usize>>> = None;
    let mut spacing: Option<Entry<Vec<f64>>> = None;
    let mut element_type: Option<Entry<SampleType>> = None;
    let mut channels: Option<Entry<usize>> = None;
    let mut big_endian: Option<Entry<bool>> = None;
    let mut data_file: Option<DataFile> = None;
    let mut offset = 0;

    for (line_index, raw_line) in buffer.split(|&b| b == b'\n').enumerate() {
      let line_number = line_index + 1;
      offset += raw_line.len() + 1;

      let line = String::from_utf8_lossy(raw_line);
      let mut entry = line.splitn(2, '=');

      let key = match entry.next() {
        Some(key) => key.trim(),
        None => continue,
      };

      if key.is_empty() {
        debug!("Line {}: Skipping empty line or line with empty key", line_number);
        continue;
      }

      let value = match entry.next() {
        Some(value) => value.trim(),
        None => {
          warn!("Line {}: Skipping entry without an `=` sign", line_number);
          continue;
        }
      };

      /// Store a parsed value, failing if the key was seen before.
      ///
      /// # Uses
      ///
      /// * `line_number` - The current input line number for errors.
      macro_rules! set_once {
        ($slot:ident, $value:expr) => {{
          if $slot.is_some() {
            return Err(PlanexErr::new_md_duplicate_key(line_number, key.into()));
          }

          $slot = Some(Entry { line_number, value: $value });
        }};
      }

      match key {
        "NDims" => set_once!(ndims, parse_size(line_number, key, value)?),
        "DimSize" => set_once!(dim_size, parse_list(line_number, key, value, parse_size)?),
        "ElementSpacing" => set_once!(spacing, parse_list(line_number, key, value, parse_spacing)?),
        "ElementType" => set_once!(element_type, parse_element_type(line_number, key, value)?),
        "ElementNumberOfChannels" => set_once!(channels, parse_size(line_number, key, value)?),
        "ElementByteOrderMSB" | "BinaryDataByteOrderMSB" => {
          set_once!(big_endian, parse_bool(line_number, key, value)?)
        }
        "ElementDataFile" => {
          data_file = Some(match value {
            "" => return Err(PlanexErr::new_md_missing_values(line_number, key.into())),
            "LOCAL" | "Local" | "local" => DataFile::Local,
            path => DataFile::Path(PathBuf::from(path)),
          });

          // The data file is always the last entry of a header.
          break;
        }
        _ => debug!("Line {}: Skipping key {}", line_number, key),
      }
    }

    let ndims = match ndims {
      Some(ndims) => ndims.value,
      None => return Err(PlanexErr::new_md_key_not_found("NDims".into())),
    };

    if !(2..=4).contains(&ndims) {
      return Err(PlanexErr::new_md_unsupported_dims(ndims));
    }

    let dim_size = match dim_size {
      Some(dim_size) => dim_size,
      None => return Err(PlanexErr::new_md_key_not_found("DimSize".into())),
    };

    let line_number = dim_size.line_number;
    let values = check_count(dim_size, "DimSize", ndims)?;

    if values.contains(&0) {
      return Err(PlanexErr::new_md_invalid_value(line_number, "DimSize".into(), "0".into()));
    }

    let mut dims = [1; 4];
    dims[..ndims].copy_from_slice(&values);

    let spacing = match spacing {
      Some(spacing) => Some(check_count(spacing, "ElementSpacing", ndims)?),
      None => None,
    };

    let element_type = match element_type {
      Some(element_type) => element_type.value,
      None => return Err(PlanexErr::new_md_key_not_found("ElementType".into())),
    };

    let channels = match channels {
      Some(Entry { line_number, value: 0 }) => {
        return Err(PlanexErr::new_md_invalid_value(line_number, "ElementNumberOfChannels".into(), "0".into()))
      }
      Some(channels) => channels.value,
      None => 1,
    };

    let data_file = match data_file {
      Some(data_file) => data_file,
      None => return Err(PlanexErr::new_md_key_not_found("ElementDataFile".into())),
    };

    // Every other size is a factor of this product.
    let data_len =
      dims.iter().chain([channels, element_type.size()].iter()).try_fold(1usize, |len, &n| len.checked_mul(n));

    let data_len = match data_len {
      Some(data_len) => data_len,
      None => {
        let text = values.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
        return Err(PlanexErr::new_md_invalid_value(line_number, "DimSize".into(), text));
      }
    };

    Ok(Self {
      dims,
      spacing,
      element_type,
      channels,
      big_endian: big_endian.map(|entry| entry.value).unwrap_or(false),
      data_file,
      data_len,
      header_len: offset.min(buffer.len()),
    })
  }

  /// Number of pixels on the X-axis.
  pub fn xdim(&self) -> usize {
    self.dims[0]
  }

  /// Number of pixels on the Y-axis.
  pub fn ydim(&self) -> usize {
    self.dims[1]
  }

  /// Number of Z-slices.
  pub fn zdim(&self) -> usize {
    self.dims[2]
  }

  /// Number of time points.
  pub fn tdim(&self) -> usize {
    self.dims[3]
  }

  /// Number of interleaved channels.
  pub fn channels(&self) -> usize {
    self.channels
  }

  /// Physical spacing of the declared axes, if recorded.
  pub fn spacing(&self) -> Option<&[f64]> {
    self.spacing.as_deref()
  }

  /// Type of the samples.
  pub fn element_type(&self) -> SampleType {
    self.element_type
  }

  /// Whether samples are stored most significant byte first.
  pub fn big_endian(&self) -> bool {
    self.big_endian
  }

  /// Location of the samples.
  pub fn data_file(&self) -> &DataFile {
    &self.data_file
  }

  /// Length in bytes of the header.
  pub fn header_len(&self) -> usize {
    self.header_len
  }

  /// Number of samples in a channel-interleaved plane.
  pub fn plane_samples(&self) -> usize {
    self.xdim() * self.ydim() * self.channels
  }

  /// Number of bytes of sample data the header describes.
  pub fn data_len(&self) -> usize {
    self.data_len
  }
}

/// Parse a non-negative integer.
fn parse_size(line_number: usize, key: &str, text: &str) -> Result<usize, PlanexErr> {
  let (value, used) = usize::from_radix_10_checked(text.as_bytes());

  match value {
    Some(value) if used > 0 && used == text.len() => Ok(value),
    // Not a number, trailing garbage or an overflow.
    _ => Err(PlanexErr::new_md_invalid_value(line_number, key.into(), text.into())),
  }
}

/// Parse a spacing value.
fn parse_spacing(line_number: usize, key: &str, text: &str) -> Result<f64, PlanexErr> {
  match text.parse::<f64>() {
    Ok(value) if value.is_finite() => Ok(value),
    _ => Err(PlanexErr::new_md_invalid_value(line_number, key.into(), text.into())),
  }
}

/// Parse a MetaImage boolean.
fn parse_bool(line_number: usize, key: &str, text: &str) -> Result<bool, PlanexErr> {
  match text {
    "True" | "true" | "TRUE" | "1" => Ok(true),
    "False" | "false" | "FALSE" | "0" => Ok(false),
    _ => Err(PlanexErr::new_md_invalid_value(line_number, key.into(), text.into())),
  }
}

/// Parse a MetaImage element type.
fn parse_element_type(line_number: usize, key: &str, text: &str) -> Result<SampleType, PlanexErr> {
  match text {
    "MET_CHAR" => Ok(SampleType::Int8),
    "MET_UCHAR" => Ok(SampleType::Uint8),
    "MET_SHORT" => Ok(SampleType::Int16),
    "MET_USHORT" => Ok(SampleType::Uint16),
    "MET_INT" | "MET_LONG" => Ok(SampleType::Int32),
    "MET_UINT" | "MET_ULONG" => Ok(SampleType::Uint32),
    "MET_LONG_LONG" => Ok(SampleType::Int64),
    "MET_ULONG_LONG" => Ok(SampleType::Uint64),
    "MET_FLOAT" => Ok(SampleType::Float),
    "MET_DOUBLE" => Ok(SampleType::Double),
    _ => Err(PlanexErr::new_md_invalid_value(line_number, key.into(), text.into())),
  }
}

/// Parse whitespace separated values.
fn parse_list<T>(
  line_number: usize,
  key: &str,
  text: &str,
  parse: fn(usize, &str, &str) -> Result<T, PlanexErr>,
) -> Result<Vec<T>, PlanexErr> {
  let values = text.split_whitespace().map(|value| parse(line_number, key, value)).collect::<Result<Vec<_>, _>>()?;

  if values.is_empty() {
    return Err(PlanexErr::new_md_missing_values(line_number, key.into()));
  }

  Ok(values)
}

/// Check that a list has one value per dimension.
fn check_count<T>(entry: Entry<Vec<T>>, key: &str, ndims: usize) -> Result<Vec<T>, PlanexErr> {
  let Entry { line_number, value } = entry;

  if value.len() < ndims {
    Err(PlanexErr::new_md_missing_values(line_number, key.into()))
  } else if value.len() > ndims {
    Err(PlanexErr::new_md_too_many_values(line_number, key.into()))
  } else {
    Ok(value)
  }
}
