//! Utilities for working with plane samples.

use crate::SampleType;
use std::mem;

/// A numeric sample that can be decoded from raw plane bytes.
pub trait Sample: Copy {
  /// The size of a sample in bytes.
  const SIZE: usize;

  /// Decode a sample from exactly [`SIZE`](Sample::SIZE) bytes.
  fn from_bytes(bytes: &[u8], little_endian: bool) -> Self;

  /// Widen the sample for normalization.
  fn to_f64(self) -> f64;
}

macro_rules! impl_sample {
  ($($t:ty),*) => {
    $(
      impl Sample for $t {
        const SIZE: usize = mem::size_of::<$t>();

        fn from_bytes(bytes: &[u8], little_endian: bool) -> Self {
          let mut raw = [0u8; mem::size_of::<$t>()];
          raw.copy_from_slice(bytes);

          if little_endian {
            <$t>::from_le_bytes(raw)
          } else {
            <$t>::from_be_bytes(raw)
          }
        }

        fn to_f64(self) -> f64 {
          self as f64
        }
      }
    )*
  };
}

impl_sample!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

/// Decode every sample in `bytes`. Trailing bytes that do not make up
/// a whole sample are ignored.
pub fn decode_samples<T: Sample>(bytes: &[u8], little_endian: bool) -> Vec<T> {
  bytes.chunks_exact(T::SIZE).map(|chunk| T::from_bytes(chunk, little_endian)).collect()
}

/// Decode samples of any type, widened to `f64`.
pub fn decode_widened(bytes: &[u8], sample_type: SampleType, little_endian: bool) -> Vec<f64> {
  fn widen<T: Sample>(bytes: &[u8], little_endian: bool) -> Vec<f64> {
    decode_samples::<T>(bytes, little_endian).into_iter().map(Sample::to_f64).collect()
  }

  match sample_type {
    SampleType::Int8 => widen::<i8>(bytes, little_endian),
    SampleType::Int16 => widen::<i16>(bytes, little_endian),
    SampleType::Int32 => widen::<i32>(bytes, little_endian),
    SampleType::Int64 => widen::<i64>(bytes, little_endian),
    SampleType::Uint8 => widen::<u8>(bytes, little_endian),
    SampleType::Uint16 => widen::<u16>(bytes, little_endian),
    SampleType::Uint32 => widen::<u32>(bytes, little_endian),
    SampleType::Uint64 => widen::<u64>(bytes, little_endian),
    SampleType::Float => widen::<f32>(bytes, little_endian),
    SampleType::Double => widen::<f64>(bytes, little_endian),
  }
}

/// Normalize a value within `min..=max` to `u8`.
pub fn normalize(value: f64, min: f64, max: f64) -> u8 {
  if max <= min || !value.is_finite() {
    return 0;
  }

  let normalized = ((value - min) / (max - min) * 255.0).round();

  // Casting saturates, so values outside of the range end up at
  // either end of it.
  normalized as u8
}

/// Stretch samples to the full `u8` range of greys.
pub fn stretch_to_grey(values: &[f64]) -> Vec<u8> {
  let finite = values.iter().copied().filter(|value| value.is_finite());
  let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
    (min.min(value), max.max(value))
  });

  values.iter().map(|&value| normalize(value, min, max)).collect()
}

#[cfg(test)]
mod test_normalize {
  use super::*;

  #[test]
  fn zero() {
    assert_eq!(normalize(0.0, 0.0, 4095.0), 0);
  }

  #[test]
  fn max() {
    assert_eq!(normalize(4095.0, 0.0, 4095.0), 255);
  }

  #[test]
  fn mid() {
    assert_eq!(normalize(2048.0, 0.0, 4095.0), 128);
  }

  #[test]
  fn flat() {
    assert_eq!(normalize(7.0, 7.0, 7.0), 0);
  }

  #[test]
  fn stretch() {
    assert_eq!(stretch_to_grey(&[-10.0, 0.0, 10.0]), vec![0, 128, 255]);
  }

  #[test]
  fn stretch_ignores_nan() {
    assert_eq!(stretch_to_grey(&[f64::NAN, 1.0, 3.0]), vec![0, 0, 255]);
  }
}

#[cfg(test)]
mod test_decode {
  use super::*;

  #[test]
  fn byte_order() {
    let bytes = [0x01, 0x02, 0x03, 0x04];
    assert_eq!(decode_samples::<u16>(&bytes, true), vec![0x0201, 0x0403]);
    assert_eq!(decode_samples::<u16>(&bytes, false), vec![0x0102, 0x0304]);
  }

  #[test]
  fn signed() {
    assert_eq!(decode_samples::<i8>(&[0xff, 0x01], true), vec![-1, 1]);
  }

  #[test]
  fn floats() {
    let bytes = 1.5f32.to_le_bytes();
    assert_eq!(decode_samples::<f32>(&bytes, true), vec![1.5]);
  }

  #[test]
  fn widened() {
    let bytes = [0xff, 0xff];
    assert_eq!(decode_widened(&bytes, SampleType::Int16, true), vec![-1.0]);
    assert_eq!(decode_widened(&bytes, SampleType::Uint16, true), vec![65535.0]);
  }

  #[test]
  fn partial_sample_is_ignored() {
    assert_eq!(decode_samples::<u16>(&[1, 0, 7], true), vec![1]);
  }
}
