//! Decides which planes an export visits and in which order.
//!
//! An [axis selection](AxisSelection) fixes the series and channel,
//! and optionally the Z-slice and the time point. Resolving it
//! against a [volume shape](VolumeShape) yields an [export
//! plan](ExportPlan): at most one of Z or Time is iterated, every
//! other axis is held fixed.

use crate::reader::{PlaneCoord, VolumeShape};
use derive_new::new;

/// Time point used when neither Z nor Time is fixed.
pub const DEFAULT_TIME: usize = 0;

/// The axis constraints requested for an export.
#[derive(new, Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct AxisSelection {
  /// The series to export.
  pub series: usize,

  /// The channel to export.
  pub channel: usize,

  /// Fixed time point, or `None` to leave Time free.
  pub time: Option<usize>,

  /// Fixed Z-slice, or `None` to leave Z free.
  pub z: Option<usize>,
}

/// Which of Z and Time are held fixed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Iteration {
  /// Both fixed: a single plane.
  FixedZT {
    /// Z-slice.
    z: usize,
    /// Time point.
    t: usize,
  },

  /// Time fixed: iterate over Z.
  FixedTOnly {
    /// Time point.
    t: usize,
  },

  /// Z fixed: iterate over Time.
  FixedZOnly {
    /// Z-slice.
    z: usize,
  },

  /// Neither fixed: iterate over Z at a default time point.
  Neither {
    /// The default time point.
    t: usize,
  },
}

impl Iteration {
  /// Classify a selection, using `default_time` when neither axis is
  /// fixed.
  pub fn from_selection(selection: &AxisSelection, default_time: usize) -> Self {
    match (selection.z, selection.time) {
      (Some(z), Some(t)) => Iteration::FixedZT { z, t },
      (None, Some(t)) => Iteration::FixedTOnly { t },
      (Some(z), None) => Iteration::FixedZOnly { z },
      (None, None) => Iteration::Neither { t: default_time },
    }
  }

  /// The axis stepped through, if any.
  pub fn iterated_axis(&self) -> Option<Axis> {
    match self {
      Iteration::FixedZT { .. } => None,
      Iteration::FixedTOnly { .. } | Iteration::Neither { .. } => Some(Axis::Z),
      Iteration::FixedZOnly { .. } => Some(Axis::Time),
    }
  }
}

/// An axis that can be iterated.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Axis {
  /// Z-slices.
  Z,
  /// Time points.
  Time,
}

/// How planes leave the exporter.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ExportMode {
  /// Planes go one by one to an image writer.
  Planes,
  /// Planes are concatenated after an NRRD header.
  Raw,
}

/// One step of an export plan.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct PlaneStep {
  /// Position of the plane in the output stream.
  pub position: usize,

  /// The plane to fetch from the reader.
  pub coord: PlaneCoord,

  /// Whether this is the final plane of the export.
  pub is_last: bool,
}

/// Immutable description of an export.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ExportPlan {
  iteration: Iteration,
  channel: usize,
  size_x: usize,
  size_y: usize,
  count: usize,
}

impl ExportPlan {
  /// Resolve a selection against the shape of the selected series.
  ///
  /// Indices are not checked against the shape here, the reader
  /// rejects coordinates it cannot serve.
  pub fn resolve(selection: &AxisSelection, shape: &VolumeShape) -> Self {
    Self::resolve_with_default_time(selection, shape, DEFAULT_TIME)
  }

  /// Same as [`resolve`](ExportPlan::resolve) with an explicit time
  /// point for selections that fix neither Z nor Time.
  pub fn resolve_with_default_time(selection: &AxisSelection, shape: &VolumeShape, default_time: usize) -> Self {
    let iteration = Iteration::from_selection(selection, default_time);

    let count = match iteration.iterated_axis() {
      None => 1,
      Some(Axis::Z) => shape.size_z(),
      Some(Axis::Time) => shape.size_t(),
    };

    Self { iteration, channel: selection.channel, size_x: shape.size_x(), size_y: shape.size_y(), count }
  }

  /// Which of Z and Time are held fixed.
  pub fn iteration(&self) -> Iteration {
    self.iteration
  }

  /// The axis stepped through, if any.
  pub fn iterated_axis(&self) -> Option<Axis> {
    self.iteration.iterated_axis()
  }

  /// Number of planes visited.
  pub fn count(&self) -> usize {
    self.count
  }

  /// Declared sizes in (X, Y, iterated axis) order. The third size is
  /// 1 when both Z and Time are fixed.
  pub fn sizes(&self) -> [usize; 3] {
    [self.size_x, self.size_y, self.count]
  }

  /// Declared dimensionality of the output.
  pub fn dimensionality(&self, mode: ExportMode) -> usize {
    match (mode, self.iteration) {
      (ExportMode::Planes, Iteration::FixedZT { .. }) => 2,
      _ => 3,
    }
  }

  /// The plane visited at iteration step `step`.
  pub fn coord(&self, step: usize) -> PlaneCoord {
    match self.iteration {
      Iteration::FixedZT { z, t } => PlaneCoord::new(z, self.channel, t),
      Iteration::FixedTOnly { t } | Iteration::Neither { t } => PlaneCoord::new(step, self.channel, t),
      Iteration::FixedZOnly { z } => PlaneCoord::new(z, self.channel, step),
    }
  }

  /// Iterate over the steps of the plan in output order.
  pub fn steps(&self) -> impl Iterator<Item = PlaneStep> + '_ {
    (0..self.count).map(move |position| PlaneStep {
      position,
      coord: self.coord(position),
      is_last: position + 1 == self.count,
    })
  }
}

/// Counts reported at the end of an export.
#[derive(new, Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct ExportSummary {
  /// Number of planes written.
  pub planes: usize,

  /// Number of pixel bytes written.
  pub bytes: usize,
}

#[cfg(test)]
mod plan_tests {
  use super::{AxisSelection, Axis, ExportMode, ExportPlan, Iteration};
  use crate::reader::{PlaneCoord, VolumeShape};

  fn shape() -> VolumeShape {
    VolumeShape::new(4, 3, 5, 7, 2, 1)
  }

  fn times(plan: &ExportPlan) -> Vec<usize> {
    plan.steps().map(|step| step.coord.t).collect()
  }

  fn zs(plan: &ExportPlan) -> Vec<usize> {
    plan.steps().map(|step| step.coord.z).collect()
  }

  #[test]
  fn neither_fixed_iterates_z_at_time_zero() {
    let plan = ExportPlan::resolve(&AxisSelection::new(0, 1, None, None), &shape());
    assert_eq!(plan.iteration(), Iteration::Neither { t: 0 });
    assert_eq!(plan.iterated_axis(), Some(Axis::Z));
    assert_eq!(plan.count(), 5);
    assert_eq!(zs(&plan), vec![0, 1, 2, 3, 4]);
    assert_eq!(times(&plan), vec![0; 5]);
    assert_eq!(plan.sizes(), [4, 3, 5]);
  }

  #[test]
  fn neither_fixed_with_explicit_default_time() {
    let plan = ExportPlan::resolve_with_default_time(&AxisSelection::new(0, 0, None, None), &shape(), 6);
    assert_eq!(times(&plan), vec![6; 5]);
  }

  #[test]
  fn time_fixed_iterates_z() {
    let plan = ExportPlan::resolve(&AxisSelection::new(0, 0, Some(4), None), &shape());
    assert_eq!(plan.iteration(), Iteration::FixedTOnly { t: 4 });
    assert_eq!(plan.count(), 5);
    assert_eq!(zs(&plan), vec![0, 1, 2, 3, 4]);
    assert_eq!(times(&plan), vec![4; 5]);
    assert_eq!(plan.sizes(), [4, 3, 5]);
  }

  #[test]
  fn z_fixed_iterates_time() {
    let plan = ExportPlan::resolve(&AxisSelection::new(0, 0, None, Some(2)), &shape());
    assert_eq!(plan.iteration(), Iteration::FixedZOnly { z: 2 });
    assert_eq!(plan.iterated_axis(), Some(Axis::Time));
    assert_eq!(plan.count(), 7);
    assert_eq!(zs(&plan), vec![2; 7]);
    assert_eq!(times(&plan), (0..7).collect::<Vec<_>>());
    assert_eq!(plan.sizes(), [4, 3, 7]);
  }

  #[test]
  fn both_fixed_is_a_single_plane() {
    let plan = ExportPlan::resolve(&AxisSelection::new(0, 1, Some(3), Some(2)), &shape());
    assert_eq!(plan.iterated_axis(), None);
    assert_eq!(plan.count(), 1);
    assert_eq!(plan.sizes(), [4, 3, 1]);
    assert_eq!(plan.dimensionality(ExportMode::Planes), 2);
    assert_eq!(plan.dimensionality(ExportMode::Raw), 3);

    let steps: Vec<_> = plan.steps().collect();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].coord, PlaneCoord::new(2, 1, 3));
    assert!(steps[0].is_last);
  }

  #[test]
  fn volumes_are_three_dimensional() {
    let plan = ExportPlan::resolve(&AxisSelection::default(), &shape());
    assert_eq!(plan.dimensionality(ExportMode::Planes), 3);
    assert_eq!(plan.dimensionality(ExportMode::Raw), 3);
  }

  #[test]
  fn positions_increase_and_only_the_last_step_is_flagged() {
    let plan = ExportPlan::resolve(&AxisSelection::default(), &shape());
    let steps: Vec<_> = plan.steps().collect();

    for (index, step) in steps.iter().enumerate() {
      assert_eq!(step.position, index);
      assert_eq!(step.is_last, index == steps.len() - 1);
    }
  }

  #[test]
  fn channel_is_never_iterated() {
    let plan = ExportPlan::resolve(&AxisSelection::new(0, 1, None, Some(0)), &shape());
    assert!(plan.steps().all(|step| step.coord.c == 1));
  }

  #[test]
  fn out_of_range_indices_are_planned_as_is() {
    let plan = ExportPlan::resolve(&AxisSelection::new(9, 9, Some(99), Some(99)), &shape());
    assert_eq!(plan.coord(0), PlaneCoord::new(99, 9, 99));
  }
}
