//! Lenient handling of command line arguments.
//!
//! The command line accepts the historical single-dash spellings
//! (`-series 2`) alongside the usual ones (`--series 2`). Anything
//! that cannot be understood is set aside rather than rejected, so a
//! malformed or unknown flag never stops an export.

use atoi::FromRadix10Checked;
use derive_more::Display;

/// Flags taking a plane or series index.
pub const INDEX_FLAGS: [&str; 4] = ["series", "channel", "time", "z"];

/// An argument that was dropped before parsing.
#[derive(Display, Debug, PartialEq, Eq, Clone)]
pub enum Ignored {
  /// A flag nobody knows.
  #[display(fmt = "Ignoring unknown command flag: {}", _0)]
  UnknownFlag(String),

  /// A positional argument after the input and output files.
  #[display(fmt = "Ignoring unknown argument: {}", _0)]
  UnknownArgument(String),

  /// An index flag with a value that is not a number.
  #[display(fmt = "Ignoring malformed value {} for {}", value, flag)]
  MalformedValue {
    /// The flag as given.
    flag: String,

    /// The value as given.
    value: String,
  },

  /// An index flag at the end of the command line.
  #[display(fmt = "Ignoring flag {} without a value", _0)]
  MissingValue(String),
}

/// Arguments ready for the parser, and what was dropped on the way.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Normalized {
  /// Arguments to parse, starting with the program name.
  pub args: Vec<String>,

  /// Arguments that were dropped.
  pub ignored: Vec<Ignored>,
}

/// Parse an index value, rejecting anything but plain digits.
pub fn parse_index(text: &str) -> Option<usize> {
  match usize::from_radix_10_checked(text.as_bytes()) {
    (Some(value), used) if used > 0 && used == text.len() => Some(value),
    _ => None,
  }
}

/// Name of the index flag `arg` spells, if any, and a value attached
/// with `=`.
fn index_flag(arg: &str) -> Option<(&'static str, Option<&str>)> {
  let body = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-'))?;

  let (name, value) = match body.find('=') {
    Some(at) => (&body[..at], Some(&body[at + 1..])),
    None => (body, None),
  };

  INDEX_FLAGS.iter().find(|flag| **flag == name).map(|flag| (*flag, value))
}

/// Flags handed to the parser untouched.
fn is_passthrough(arg: &str) -> bool {
  match arg {
    "--verbose" | "-h" | "--help" | "-V" | "--version" => true,
    _ => arg.len() > 1 && arg.starts_with('-') && arg[1..].chars().all(|c| c == 'v'),
  }
}

/// Rewrite `args` (program name first) into a form the parser
/// accepts.
///
/// Index flags are rewritten to their double-dash spelling and only
/// kept when their value is a number, so the previous or default
/// value stays in effect otherwise. Unknown flags and surplus
/// positional arguments are dropped.
pub fn normalize_args<I, S>(args: I) -> Normalized
where
  I: IntoIterator<Item = S>,
  S: Into<String>,
{
  let mut args = args.into_iter().map(Into::into);
  let mut normalized = Normalized::default();
  let mut positionals = 0;

  normalized.args.extend(args.next());

  while let Some(arg) = args.next() {
    if let Some((name, attached)) = index_flag(&arg) {
      let value = match attached {
        Some(value) => value.to_string(),
        None => match args.next() {
          Some(value) => value,
          None => {
            normalized.ignored.push(Ignored::MissingValue(arg));
            continue;
          }
        },
      };

      if parse_index(&value).is_some() {
        normalized.args.push(format!("--{}", name));
        normalized.args.push(value);
      } else {
        normalized.ignored.push(Ignored::MalformedValue { flag: arg, value });
      }
    } else if is_passthrough(&arg) {
      normalized.args.push(arg);
    } else if arg.len() > 1 && arg.starts_with('-') {
      normalized.ignored.push(Ignored::UnknownFlag(arg));
    } else if positionals < 2 {
      positionals += 1;
      normalized.args.push(arg);
    } else {
      normalized.ignored.push(Ignored::UnknownArgument(arg));
    }
  }

  normalized
}
