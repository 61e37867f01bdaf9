use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::anyhow;
use atomize_core::EmissionMode;
use clap::CommandFactory;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
  name = "atomize",
  about = "Compile namespaced style definitions into atomic CSS and a class map module",
  override_usage = "atomize [options] <input> <output>",
  disable_help_flag = true,
  disable_version_flag = true
)]
struct AtomizeCommand {
  /// Rebuild whenever the input file changes
  #[arg(short = 'w', long = "watch")]
  watch: bool,

  /// Pretty-print the CSS and emit validating accessors in the module
  #[arg(short = 'd', long = "dev")]
  dev: bool,

  /// Prefix prepended to every generated class name
  #[arg(
    long = "prefix",
    value_name = "string",
    default_value = "",
    allow_hyphen_values = true
  )]
  prefix: String,

  /// Print this message
  #[arg(short = 'h', long = "help")]
  help: bool,

  /// <input> (.json or .toml) and <output> (written as <output>.css and <output>.js)
  #[arg(value_name = "path")]
  paths: Vec<PathBuf>,
}

/// Validated options for one build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Args {
  pub input: PathBuf,
  pub output: PathBuf,
  pub watch: bool,
  pub mode: EmissionMode,
  pub prefix: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Invocation {
  /// `--help` was passed; holds the rendered usage text.
  Help(String),
  Run(Args),
}

pub fn usage() -> String {
  AtomizeCommand::command().render_help().to_string()
}

pub fn parse_args<I, T>(argv: I) -> anyhow::Result<Invocation>
where
  I: IntoIterator<Item = T>,
  T: Into<OsString> + Clone,
{
  let command = AtomizeCommand::try_parse_from(argv)?;

  if command.help {
    return Ok(Invocation::Help(usage()));
  }

  let mut paths = command.paths.into_iter();
  let (Some(input), Some(output)) = (paths.next(), paths.next()) else {
    return Err(anyhow!("too few arguments"));
  };
  if paths.next().is_some() {
    return Err(anyhow!("too many arguments"));
  }

  Ok(Invocation::Run(Args {
    input,
    output,
    watch: command.watch,
    mode: if command.dev {
      EmissionMode::Dev
    } else {
      EmissionMode::Plain
    },
    prefix: command.prefix,
  }))
}
