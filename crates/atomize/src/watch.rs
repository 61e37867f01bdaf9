//! Watch mode.
//!
//! The input's directory is watched with `notify` and events for the input file
//! are forwarded over a channel. Bursts of events are coalesced, at most one
//! build runs at a time, and any number of changes that land during a build
//! cause exactly one more build once it finishes.

use std::ffi::OsString;
use std::path::Path;
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

use anyhow::{anyhow, Context};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::cli::Args;
use crate::compile::build;

pub const DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BuildState {
  #[default]
  Idle,
  Running,
  RunningWithPending,
}

/// Single-flight build scheduling with one trailing rerun.
#[derive(Debug, Default)]
pub struct RebuildScheduler {
  state: BuildState,
}

impl RebuildScheduler {
  pub fn state(&self) -> BuildState {
    self.state
  }

  /// A change arrived. Returns `true` when the caller should start a build.
  pub fn request(&mut self) -> bool {
    match self.state {
      BuildState::Idle => {
        self.state = BuildState::Running;
        true
      }
      BuildState::Running | BuildState::RunningWithPending => {
        self.state = BuildState::RunningWithPending;
        false
      }
    }
  }

  /// The current build ended. Returns `true` when another build must run.
  pub fn finish(&mut self) -> bool {
    match self.state {
      BuildState::RunningWithPending => {
        self.state = BuildState::Running;
        true
      }
      BuildState::Running | BuildState::Idle => {
        self.state = BuildState::Idle;
        false
      }
    }
  }
}

pub fn watch(args: &Args) -> anyhow::Result<()> {
  let file_name = args
    .input
    .file_name()
    .map(|name| name.to_os_string())
    .ok_or_else(|| anyhow!("{} is not a file", args.input.display()))?;
  let directory = match args.input.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
    _ => Path::new(".").to_path_buf(),
  };

  let (tx, rx) = channel();
  let mut watcher = RecommendedWatcher::new(
    move |res: Result<Event, notify::Error>| match res {
      Ok(event) => {
        if is_input_change(&event, &file_name) {
          let _ = tx.send(());
        }
      }
      Err(err) => tracing::warn!("Watch error: {}", err),
    },
    Config::default(),
  )?;
  watcher
    .watch(&directory, RecursiveMode::NonRecursive)
    .with_context(|| format!("Failed to watch {}", directory.display()))?;

  tracing::info!("Watching {}", args.input.display());

  let mut scheduler = RebuildScheduler::default();
  if scheduler.request() {
    run_builds(&rx, &mut scheduler, DEBOUNCE, || {
      rebuild(args);
    });
  }

  // The loop ends when the watcher drops its sender.
  while rx.recv().is_ok() {
    settle(&rx, DEBOUNCE);
    if scheduler.request() {
      run_builds(&rx, &mut scheduler, DEBOUNCE, || {
        rebuild(args);
      });
    }
  }

  Ok(())
}

/// One watch-mode build. Failures are logged and the watcher keeps going.
/// Returns whether the build succeeded.
pub fn rebuild(args: &Args) -> bool {
  match build(args) {
    Ok(report) => {
      tracing::debug!("Build finished: {:?}", report);
      true
    }
    Err(err) => {
      tracing::error!("{:#}", err);
      false
    }
  }
}

/// Run `build` until the scheduler has no pending request left. Changes that
/// arrived during a build are folded into one trailing build.
pub fn run_builds(
  rx: &Receiver<()>,
  scheduler: &mut RebuildScheduler,
  debounce: Duration,
  mut build: impl FnMut(),
) {
  loop {
    build();

    while rx.try_recv().is_ok() {
      scheduler.request();
    }

    if !scheduler.finish() {
      break;
    }
    settle(rx, debounce);
  }
}

/// Swallow events until the channel has been quiet for `debounce`.
fn settle(rx: &Receiver<()>, debounce: Duration) {
  while rx.recv_timeout(debounce).is_ok() {}
}

fn is_input_change(event: &Event, file_name: &OsString) -> bool {
  matches!(
    event.kind,
    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
  ) && event
    .paths
    .iter()
    .any(|path| path.file_name() == Some(file_name.as_os_str()))
}
