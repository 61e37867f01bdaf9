//! The `atomize` command line tool: argument handling, builds that write
//! `.css`/`.js` artifacts with change reporting, and watch mode.

use std::ffi::OsString;

use crate::cli::{parse_args, Args, Invocation};
use crate::compile::build;
use crate::watch::watch;

pub mod cli;
pub mod compile;
pub mod media_order;
pub mod reporter;
pub mod watch;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_USAGE: u8 = 2;

/// Run the command line and return its exit status: 2 after printing the
/// usage text, 1 on any argument or build error, 0 otherwise.
pub fn run<I, T>(argv: I) -> u8
where
  I: IntoIterator<Item = T>,
  T: Into<OsString> + Clone,
{
  let args = match parse_args(argv) {
    Ok(Invocation::Run(args)) => args,
    Ok(Invocation::Help(usage)) => {
      println!("{}", usage);
      return EXIT_USAGE;
    }
    Err(err) => {
      eprintln!("{:#}", err);
      return EXIT_FAILURE;
    }
  };

  match execute(&args) {
    Ok(()) => EXIT_SUCCESS,
    Err(err) => {
      eprintln!("{:#}", err);
      EXIT_FAILURE
    }
  }
}

fn execute(args: &Args) -> anyhow::Result<()> {
  if args.watch {
    return watch(args);
  }

  let report = build(args)?;
  if report.warnings > 0 {
    tracing::debug!("Finished with {} shorthand warnings", report.warnings);
  }

  Ok(())
}
