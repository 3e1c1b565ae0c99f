//! Handles pixel sample types.

use crate::PlanexErr;
use derive_more::Display;
use std::convert::TryFrom;
use std::mem;

/// The type of a single sample as reported by a reader.
#[derive(Display, Debug, PartialEq, Eq, Clone, Copy)]
pub enum SampleType {
  /// Signed 8-bit integer.
  #[display(fmt = "int8")]
  Int8,

  /// Signed 16-bit integer.
  #[display(fmt = "int16")]
  Int16,

  /// Signed 32-bit integer.
  #[display(fmt = "int32")]
  Int32,

  /// Signed 64-bit integer.
  #[display(fmt = "int64")]
  Int64,

  /// Unsigned 8-bit integer.
  #[display(fmt = "uint8")]
  Uint8,

  /// Unsigned 16-bit integer.
  #[display(fmt = "uint16")]
  Uint16,

  /// Unsigned 32-bit integer.
  #[display(fmt = "uint32")]
  Uint32,

  /// Unsigned 64-bit integer.
  #[display(fmt = "uint64")]
  Uint64,

  /// 32-bit floating point.
  #[display(fmt = "float")]
  Float,

  /// 64-bit floating point.
  #[display(fmt = "double")]
  Double,
}

impl SampleType {
  /// The size of a sample in bytes.
  pub fn size(&self) -> usize {
    match self {
      SampleType::Int8 | SampleType::Uint8 => mem::size_of::<u8>(),
      SampleType::Int16 | SampleType::Uint16 => mem::size_of::<u16>(),
      SampleType::Int32 | SampleType::Uint32 | SampleType::Float => mem::size_of::<u32>(),
      SampleType::Int64 | SampleType::Uint64 | SampleType::Double => mem::size_of::<u64>(),
    }
  }
}

/// Sample types that can be declared in the `type:` field of an NRRD
/// header.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PixelTypeTag {
  /// Signed 8-bit integer.
  Int8,
  /// Signed 16-bit integer.
  Int16,
  /// Signed 32-bit integer.
  Int32,
  /// Unsigned 8-bit integer.
  Uint8,
  /// Unsigned 16-bit integer.
  Uint16,
  /// Unsigned 32-bit integer.
  Uint32,
  /// 32-bit floating point.
  Float,
  /// 64-bit floating point.
  Double,
}

impl PixelTypeTag {
  /// Every tag, in header documentation order.
  pub const ALL: [PixelTypeTag; 8] = [
    PixelTypeTag::Int8,
    PixelTypeTag::Int16,
    PixelTypeTag::Int32,
    PixelTypeTag::Uint8,
    PixelTypeTag::Uint16,
    PixelTypeTag::Uint32,
    PixelTypeTag::Float,
    PixelTypeTag::Double,
  ];

  /// The token written after `type:`.
  pub fn token(&self) -> &'static str {
    match self {
      PixelTypeTag::Int8 => "int8",
      PixelTypeTag::Int16 => "int16",
      PixelTypeTag::Int32 => "int32",
      PixelTypeTag::Uint8 => "uint8",
      PixelTypeTag::Uint16 => "uint16",
      PixelTypeTag::Uint32 => "uint32",
      PixelTypeTag::Float => "float",
      PixelTypeTag::Double => "double",
    }
  }

  /// Find the tag a `type:` token was produced from.
  pub fn from_token(token: &str) -> Option<Self> {
    Self::ALL.iter().copied().find(|tag| tag.token() == token)
  }
}

impl TryFrom<SampleType> for PixelTypeTag {
  type Error = PlanexErr;

  fn try_from(sample_type: SampleType) -> Result<Self, Self::Error> {
    match sample_type {
      SampleType::Int8 => Ok(PixelTypeTag::Int8),
      SampleType::Int16 => Ok(PixelTypeTag::Int16),
      SampleType::Int32 => Ok(PixelTypeTag::Int32),
      SampleType::Uint8 => Ok(PixelTypeTag::Uint8),
      SampleType::Uint16 => Ok(PixelTypeTag::Uint16),
      SampleType::Uint32 => Ok(PixelTypeTag::Uint32),
      SampleType::Float => Ok(PixelTypeTag::Float),
      SampleType::Double => Ok(PixelTypeTag::Double),
      SampleType::Int64 | SampleType::Uint64 => Err(PlanexErr::new_unsupported_pixel_type(sample_type)),
    }
  }
}

#[cfg(test)]
mod pixel_type_tests {
  use super::{PixelTypeTag, SampleType};
  use crate::PlanexErr;
  use std::collections::HashSet;
  use std::convert::TryFrom;

  #[test]
  fn tokens_map_back_to_their_tag() {
    for tag in PixelTypeTag::ALL.iter() {
      assert_eq!(PixelTypeTag::from_token(tag.token()), Some(*tag));
    }
  }

  #[test]
  fn tokens_are_unique() {
    let tokens: HashSet<_> = PixelTypeTag::ALL.iter().map(|tag| tag.token()).collect();
    assert_eq!(tokens.len(), PixelTypeTag::ALL.len());
  }

  #[test]
  fn unknown_token() {
    assert_eq!(PixelTypeTag::from_token("int64"), None);
    assert_eq!(PixelTypeTag::from_token(""), None);
  }

  #[test]
  fn sixty_four_bit_integers_are_unsupported() {
    assert!(matches!(
      PixelTypeTag::try_from(SampleType::Uint64),
      Err(PlanexErr::UnsupportedPixelType(SampleType::Uint64))
    ));
    assert!(matches!(
      PixelTypeTag::try_from(SampleType::Int64),
      Err(PlanexErr::UnsupportedPixelType(SampleType::Int64))
    ));
  }

  #[test]
  fn sample_type_display_matches_token() {
    let tag = PixelTypeTag::try_from(SampleType::Uint16).unwrap();
    assert_eq!(tag.token(), SampleType::Uint16.to_string());
  }

  #[test]
  fn sample_sizes() {
    assert_eq!(SampleType::Int8.size(), 1);
    assert_eq!(SampleType::Uint16.size(), 2);
    assert_eq!(SampleType::Float.size(), 4);
    assert_eq!(SampleType::Uint64.size(), 8);
  }
}
