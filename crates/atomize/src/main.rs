use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
  init_tracing();

  ExitCode::from(atomize::run(std::env::args_os()))
}

/// Logs go to stderr, filtered by `RUST_LOG` (warnings and errors by default).
fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}
