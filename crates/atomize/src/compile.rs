use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use atomize_core::{CompileOptions, EmissionMode, InputDescription};
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::cli::Args;
use crate::media_order::sort_media_queries;
use crate::reporter::write_with_report;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
  pub css_changed: bool,
  pub module_changed: bool,
  pub warnings: usize,
}

/// Run one full build: read the input, compile it and write both artifacts.
///
/// Both artifacts are rendered before anything touches the disk, so a failing
/// build leaves previous outputs in place.
pub fn build(args: &Args) -> anyhow::Result<BuildReport> {
  let input = load_input(&args.input)?;

  let output = atomize_core::compile(
    &input,
    &CompileOptions {
      prefix: args.prefix.clone(),
      mode: args.mode,
    },
  )?;
  let css = canonicalize_css(&output.css, args.mode)?;

  let (css_path, module_path) = artifact_paths(&args.output);
  if let Some(parent) = css_path.parent() {
    if !parent.as_os_str().is_empty() {
      fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
  }

  let css_changed = write_with_report(&css_path, css.as_bytes())?;
  let module_changed = write_with_report(&module_path, output.module.as_bytes())?;

  Ok(BuildReport {
    css_changed,
    module_changed,
    warnings: output.warnings.len(),
  })
}

pub fn load_input(path: &Path) -> anyhow::Result<InputDescription> {
  let source =
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

  let input = match path.extension().and_then(|ext| ext.to_str()) {
    Some("json") => InputDescription::from_json_str(&source),
    Some("toml") => InputDescription::from_toml_str(&source),
    _ => bail!(
      "Unsupported input {}, expected a .json or .toml file",
      path.display()
    ),
  };

  input.with_context(|| format!("Failed to load {}", path.display()))
}

/// `<output>.css` and `<output>.js`
pub fn artifact_paths(output: &Path) -> (PathBuf, PathBuf) {
  let with_extension = |extension: &str| {
    let mut path = output.as_os_str().to_owned();
    path.push(extension);
    PathBuf::from(path)
  };

  (with_extension(".css"), with_extension(".js"))
}

/// Browsers the printed CSS must stay readable by. Old enough that
/// `min-width` queries are not rewritten into range syntax.
pub fn output_targets() -> Targets {
  let version = |major: u32| Some(major << 16);

  Targets {
    browsers: Some(Browsers {
      chrome: version(80),
      edge: version(80),
      firefox: version(78),
      safari: version(13),
      ios_saf: version(13),
      ..Browsers::default()
    }),
    include: Default::default(),
    exclude: Default::default(),
  }
}

/// Sort top-level media blocks mobile first, then re-print the stylesheet:
/// compact in production, indented in dev mode.
pub fn canonicalize_css(css: &str, mode: EmissionMode) -> anyhow::Result<String> {
  let mut stylesheet = StyleSheet::parse(
    css,
    ParserOptions {
      filename: "atomize.css".into(),
      ..ParserOptions::default()
    },
  )
  .map_err(|err| anyhow!("Failed to parse generated CSS: {}", err))?;

  sort_media_queries(&mut stylesheet.rules, output_targets())?;

  let printed = stylesheet
    .to_css(PrinterOptions {
      minify: mode == EmissionMode::Plain,
      targets: output_targets(),
      ..PrinterOptions::default()
    })
    .map_err(|err| anyhow!("Failed to print generated CSS: {}", err))?;

  Ok(printed.code)
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn appends_artifact_extensions() {
    let (css, module) = artifact_paths(Path::new("dist/styles.min"));

    assert_eq!(css, PathBuf::from("dist/styles.min.css"));
    assert_eq!(module, PathBuf::from("dist/styles.min.js"));
  }

  #[test]
  fn minifies_in_production() {
    let css = canonicalize_css(".a{color:red}\n.b:hover{display:none}", EmissionMode::Plain).unwrap();

    assert!(!css.contains('\n'));
    assert!(css.contains(".b:hover{display:none}"));
  }

  #[test]
  fn pretty_prints_in_dev() {
    let css = canonicalize_css(".a{color:red}", EmissionMode::Dev).unwrap();

    assert!(css.starts_with(".a {\n  color: red;\n}"));
  }

  #[test]
  fn keeps_min_width_media_features() {
    let source = "@media (min-width: 100px){.a{color:red}}";

    let plain = canonicalize_css(source, EmissionMode::Plain).unwrap();
    assert!(plain.contains("min-width:100px"), "{plain}");
    assert!(!plain.contains(">="), "{plain}");

    let dev = canonicalize_css(source, EmissionMode::Dev).unwrap();
    assert!(dev.starts_with("@media (min-width: 100px) {"), "{dev}");
  }

  #[test]
  fn sorts_media_blocks_mobile_first() {
    let css = canonicalize_css(
      "@media (max-width: 300px){.c{color:red}}\n\
       @media (min-width: 900px){.b{color:red}}\n\
       @media (min-width: 100px){.a{color:red}}\n\
       .x{color:blue}",
      EmissionMode::Plain,
    )
    .unwrap();

    let at = |needle: &str| css.find(needle).unwrap();
    assert!(at(".x{") < at(".a{"), "{css}");
    assert!(at(".a{") < at(".b{"), "{css}");
    assert!(at(".b{") < at(".c{"), "{css}");
  }

  #[test]
  fn rejects_unknown_input_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("styles.yaml");
    fs::write(&path, "styles: {}").unwrap();

    let err = load_input(&path).unwrap_err();

    assert!(err.to_string().contains("expected a .json or .toml file"));
  }
}
