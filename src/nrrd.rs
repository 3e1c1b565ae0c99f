//! Raw NRRD export: a text header immediately followed by the
//! concatenated samples of every planned plane.

use crate::plan::{AxisSelection, Axis, ExportMode, ExportPlan, ExportSummary};
use crate::reader::{ImageReader, PhysicalSpacing};
use crate::{PixelTypeTag, PlanexErr, SampleType};
use log::{debug, error, info, trace};
use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// First line of every header.
pub const MAGIC: &str = "NRRD0004";

/// Value of the `space:` field.
pub const SPACE: &str = "3D-right-handed";

/// Value of the `kinds:` field.
pub const KINDS: &str = "domain domain domain";

/// Spacing declared for axes without physical spacing metadata.
pub const DEFAULT_SPACING: f64 = 1.0;

/// Diagonal of the `space directions:` field for a plan.
///
/// The third entry is the Time interval when Time is iterated and the
/// Z spacing otherwise.
pub fn space_directions(plan: &ExportPlan, spacing: Option<PhysicalSpacing>) -> [f64; 3] {
  match spacing {
    None => [DEFAULT_SPACING; 3],
    Some(spacing) => {
      let third = match plan.iterated_axis() {
        Some(Axis::Time) => spacing.t.unwrap_or(DEFAULT_SPACING),
        _ => spacing.z,
      };
      [spacing.x, spacing.y, third]
    }
  }
}

/// Write the header for `plan`, up to and including the blank line
/// that separates it from the data.
///
/// Fails after the magic line when `sample_type` has no NRRD
/// counterpart.
pub fn write_header<W: Write>(
  writer: &mut W,
  plan: &ExportPlan,
  sample_type: SampleType,
  little_endian: bool,
  directions: [f64; 3],
) -> Result<(), PlanexErr> {
  writeln!(writer, "{}", MAGIC)?;

  let tag = PixelTypeTag::try_from(sample_type)?;
  let [size_x, size_y, size_n] = plan.sizes();
  let [dx, dy, dn] = directions;

  writeln!(writer, "type: {}", tag.token())?;
  writeln!(writer, "dimension: {}", plan.dimensionality(ExportMode::Raw))?;
  writeln!(writer, "space: {}", SPACE)?;
  writeln!(writer, "kinds: {}", KINDS)?;
  writeln!(writer, "encoding: raw")?;

  if sample_type.size() > 1 {
    writeln!(writer, "endian: {}", if little_endian { "little" } else { "big" })?;
  }

  writeln!(writer, "space origin: (0,0,0)")?;
  writeln!(writer, "sizes: {} {} {}", size_x, size_y, size_n)?;
  writeln!(writer, "space directions: ({},0,0) (0,{},0) (0,0,{})", dx, dy, dn)?;
  writeln!(writer)?;

  Ok(())
}

/// Export the selected planes of `reader` as an NRRD stream.
///
/// Planes are fetched and written one at a time, in plan order. A
/// failure part way leaves whatever was already written in `writer`.
pub fn export_nrrd<R, W>(reader: &mut R, selection: &AxisSelection, writer: &mut W) -> Result<ExportSummary, PlanexErr>
where
  R: ImageReader + ?Sized,
  W: Write,
{
  reader.set_series(selection.series)?;
  let shape = reader.shape();
  let plan = ExportPlan::resolve(selection, &shape);
  let sample_type = reader.sample_type();

  debug!("Export plan for series {}: {:?} over {} planes", reader.series(), plan.iteration(), plan.count());

  let spacing = reader.spacing_provider().and_then(|provider| provider.physical_spacing(selection.series));
  if spacing.is_none() {
    debug!("No physical spacing available, using {}", DEFAULT_SPACING);
  }

  let directions = space_directions(&plan, spacing);

  if let Err(e) = write_header(writer, &plan, sample_type, reader.is_little_endian(), directions) {
    error!("Aborting NRRD export: {}", e);
    return Err(e);
  }

  let plane_size = shape.plane_len() * sample_type.size();
  let mut summary = ExportSummary::default();

  for step in plan.steps() {
    let index = reader.index(step.coord)?;
    let bytes = reader.open_bytes(index)?;

    if bytes.len() != plane_size {
      error!("Aborting NRRD export at plane {}", step.position);
      return Err(PlanexErr::new_plane_size_mismatch(bytes.len(), plane_size));
    }

    trace!("Writing plane {} ({:?}, index {})", step.position, step.coord, index);
    writer.write_all(&bytes)?;

    summary.planes += 1;
    summary.bytes += bytes.len();
  }

  Ok(summary)
}

/// Export to a newly created file at `path`.
pub fn export_nrrd_file<R>(reader: &mut R, selection: &AxisSelection, path: &Path) -> Result<ExportSummary, PlanexErr>
where
  R: ImageReader + ?Sized,
{
  info!("Creating NRRD file at {}", path.display());
  let mut writer = BufWriter::new(File::create(path)?);

  let summary = export_nrrd(reader, selection, &mut writer)?;
  writer.flush()?;

  info!("Wrote {} planes ({} bytes) to {}", summary.planes, summary.bytes, path.display());
  Ok(summary)
}
