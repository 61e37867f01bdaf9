use std::fs;
use std::path::{Path, PathBuf};

use atomize::cli::Args;
use atomize::compile::{build, BuildReport};
use atomize_core::EmissionMode;
use pretty_assertions::assert_eq;

fn fixture(name: &str) -> PathBuf {
  Path::new(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

fn args(input: PathBuf, output: PathBuf, mode: EmissionMode) -> Args {
  Args {
    input,
    output,
    watch: false,
    mode,
    prefix: String::new(),
  }
}

const MODULE: &str = r#"export const styles = {
  "button": "a c",
  "loud": "b c"
};
"#;

#[test]
fn builds_css_and_module_into_new_directories() {
  let dir = tempfile::tempdir().unwrap();
  let output = dir.path().join("dist").join("styles");

  let report = build(&args(fixture("input.json"), output, EmissionMode::Plain)).unwrap();

  assert_eq!(
    report,
    BuildReport {
      css_changed: true,
      module_changed: true,
      warnings: 0,
    }
  );

  let css = fs::read_to_string(dir.path().join("dist/styles.css")).unwrap();
  assert!(css.starts_with("p{margin-top:var(--spacing)}"), "{css}");
  assert!(css.contains(".c{"), "{css}");
  assert!(css.contains("@media (min-width:100px){"), "{css}");

  let module = fs::read_to_string(dir.path().join("dist/styles.js")).unwrap();
  assert_eq!(module, MODULE);
}

#[test]
fn toml_and_json_inputs_agree() {
  let dir = tempfile::tempdir().unwrap();

  build(&args(fixture("input.json"), dir.path().join("json"), EmissionMode::Plain)).unwrap();
  build(&args(fixture("input.toml"), dir.path().join("toml"), EmissionMode::Plain)).unwrap();

  assert_eq!(
    fs::read_to_string(dir.path().join("toml.js")).unwrap(),
    fs::read_to_string(dir.path().join("json.js")).unwrap()
  );
  assert_eq!(
    fs::read_to_string(dir.path().join("toml.css")).unwrap(),
    fs::read_to_string(dir.path().join("json.css")).unwrap()
  );
}

#[test]
fn rebuilding_unchanged_input_reports_nothing() {
  let dir = tempfile::tempdir().unwrap();
  let build_args = args(fixture("input.json"), dir.path().join("styles"), EmissionMode::Plain);

  build(&build_args).unwrap();
  let report = build(&build_args).unwrap();

  assert!(!report.css_changed);
  assert!(!report.module_changed);
}

#[test]
fn dev_mode_changes_both_artifacts() {
  let dir = tempfile::tempdir().unwrap();
  let output = dir.path().join("styles");

  build(&args(fixture("input.json"), output.clone(), EmissionMode::Plain)).unwrap();
  let report = build(&args(fixture("input.json"), output, EmissionMode::Dev)).unwrap();

  assert!(report.css_changed);
  assert!(report.module_changed);

  let module = fs::read_to_string(dir.path().join("styles.js")).unwrap();
  assert!(module.contains("class _MissingClassError extends Error"));
  assert!(module.contains("export const styles = _accessor(\"styles\", {"));
}

#[test]
fn failing_builds_write_nothing() {
  let dir = tempfile::tempdir().unwrap();
  let output = dir.path().join("out").join("styles");

  let err = build(&args(fixture("invalid.json"), output, EmissionMode::Plain)).unwrap_err();

  assert_eq!(
    err.to_string(),
    "non-pseudo selector found: `> span` in styles.card"
  );
  assert!(!dir.path().join("out").exists());
}
