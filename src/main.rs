#![warn(clippy::all)]

use clap::Parser;
use derive_more::{Display, From};
use derive_new::new;
use log::{debug, info, trace, warn};
use planex::cli;
use planex::{
  export_nrrd_file, export_planes, AxisSelection, BmpPlaneWriter, ExportSummary, ImageReader, MetaImageReader,
  OutputFormat, PlanexErr, TiffPlaneWriter,
};
use std::path::PathBuf;
use std::{env, fmt, process};

/// General top-level errors.
#[derive(new, From, Display)]
#[display(fmt = "{}")]
enum Err {
  /// Errors from the planex library.
  #[display(fmt = "Library Error: {}", _0)]
  Planex(PlanexErr),
}

/// When returning an error from main(), this will print its Display
/// impl rather than its Debug impl.
impl fmt::Debug for Err {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    (self as &dyn fmt::Display).fmt(f)
  }
}

/// Export planes and volumes from multi-dimensional images.
#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None, args_override_self = true)]
struct Opt {
  /// Verbose output (can be specified multiple times).
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,

  /// Series to export.
  #[arg(long, default_value_t = 0)]
  series: usize,

  /// Channel to export.
  #[arg(long, default_value_t = 0)]
  channel: usize,

  /// Fix the time point (iterates over Z-slices unless --z is given).
  #[arg(long)]
  time: Option<usize>,

  /// Fix the Z-slice (iterates over time points unless --time is given).
  #[arg(long = "z")]
  z: Option<usize>,

  /// Input: MetaImage header file.
  #[arg(value_name = "IN_FILE")]
  in_file: Option<PathBuf>,

  /// Output: .nrrd, .tif/.tiff or .bmp file.
  #[arg(value_name = "OUT_FILE")]
  out_file: Option<PathBuf>,
}

fn main() -> Result<(), Err> {
  let normalized = cli::normalize_args(env::args());
  let opt = Opt::parse_from(normalized.args);

  let log_level = match opt.verbose {
    0 => log::LevelFilter::Warn,
    1 => log::LevelFilter::Info,
    2 => log::LevelFilter::Debug,
    _ => log::LevelFilter::Trace,
  };

  env_logger::Builder::new().filter_level(log_level).try_init().unwrap_or_else(|e| {
    eprintln!("Error initializing logger: {}", e);
  });

  info!("Informational output enabled.");
  debug!("Debug output enabled.");
  trace!("Tracing output enabled.");

  for ignored in &normalized.ignored {
    warn!("{}", ignored);
  }

  let (in_file, out_file) = match (opt.in_file, opt.out_file) {
    (Some(in_file), Some(out_file)) => (in_file, out_file),
    _ => {
      eprintln!("To export a file, run:");
      eprintln!("  planex [-v] [-series N] [-channel N] [-time N] [-z N] in_file out_file");
      process::exit(1);
    }
  };

  let selection = AxisSelection::new(opt.series, opt.channel, opt.time, opt.z);
  let format = OutputFormat::from_path(&out_file)?;

  let mut reader = MetaImageReader::open(&in_file)?;
  reader.set_series(selection.series)?;

  // Spacing goes to stdout for scripts driving the export.
  if let Some(spacing) = reader.spacing_provider().and_then(|provider| provider.physical_spacing(selection.series)) {
    println!("{}\t{}\t{}", spacing.x, spacing.y, spacing.z);
  }

  info!("Exporting {:?} from {} to {} ({:?})", selection, in_file.display(), out_file.display(), format);

  let summary: ExportSummary = match format {
    OutputFormat::Nrrd => export_nrrd_file(&mut reader, &selection, &out_file)?,
    OutputFormat::Tiff => {
      let mut writer = TiffPlaneWriter::create(&out_file)?;
      export_planes(&mut reader, &selection, &mut writer)?
    }
    OutputFormat::Bmp => {
      let mut writer = BmpPlaneWriter::new(&out_file);
      export_planes(&mut reader, &selection, &mut writer)?
    }
  };

  info!("Exported {} planes ({} bytes)", summary.planes, summary.bytes);

  Ok(())
}
