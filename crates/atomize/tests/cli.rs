use std::path::{Path, PathBuf};

use atomize::{run, EXIT_FAILURE, EXIT_SUCCESS, EXIT_USAGE};
use pretty_assertions::assert_eq;

fn fixture(name: &str) -> PathBuf {
  Path::new(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

fn atomize(args: &[&Path]) -> u8 {
  run(std::iter::once(Path::new("atomize")).chain(args.iter().copied()))
}

#[test]
fn help_exits_with_usage_status() {
  assert_eq!(atomize(&[Path::new("-h")]), EXIT_USAGE);
  assert_eq!(EXIT_USAGE, 2);
}

#[test]
fn argument_errors_exit_with_failure() {
  assert_eq!(atomize(&[Path::new("input.json")]), EXIT_FAILURE);
  assert_eq!(atomize(&[Path::new("--minify"), Path::new("a"), Path::new("b")]), EXIT_FAILURE);
  assert_eq!(EXIT_FAILURE, 1);
}

#[test]
fn successful_build_exits_with_success() {
  let dir = tempfile::tempdir().unwrap();
  let output = dir.path().join("styles");

  assert_eq!(atomize(&[&fixture("input.json"), &output]), EXIT_SUCCESS);
  assert_eq!(EXIT_SUCCESS, 0);
  assert!(dir.path().join("styles.css").exists());
  assert!(dir.path().join("styles.js").exists());
}

#[test]
fn failed_build_exits_with_failure() {
  let dir = tempfile::tempdir().unwrap();
  let output = dir.path().join("styles");

  assert_eq!(atomize(&[&fixture("invalid.json"), &output]), EXIT_FAILURE);
  assert!(!dir.path().join("styles.css").exists());
}
