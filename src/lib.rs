#![warn(clippy::all)]
#![warn(missing_docs)]

//! planex exports sub-volumes of multi-dimensional microscopy images.
//!
//! An image is made up of series, each holding 2D planes addressed by
//! Z-slice, channel and time point. An export fixes the series and
//! the channel, and optionally the Z-slice and/or the time point, and
//! then either streams the remaining planes after a raw NRRD header
//! or hands them one by one to an image writer.

pub mod cli;
pub mod error;
pub mod metadata;
pub mod nrrd;
pub mod pixel;
pub mod plan;
pub mod reader;
pub mod utils;
pub mod volume;
pub mod writer;

pub use error::Err as PlanexErr;
pub use metadata::ImageMd;
pub use nrrd::{export_nrrd, export_nrrd_file};
pub use pixel::{PixelTypeTag, SampleType};
pub use plan::{AxisSelection, ExportPlan, ExportSummary};
pub use reader::{ImageReader, PhysicalSpacing, PlaneCoord, SpacingProvider, VolumeShape};
pub use volume::MetaImageReader;
pub use writer::{export_planes, BmpPlaneWriter, OutputFormat, Plane, PlaneWriter, TiffPlaneWriter};
