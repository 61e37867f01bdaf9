//! Compiles namespaced style definitions into deduplicated atomic CSS.
//!
//! Every style name is flattened into declarations, declarations shared by
//! several names are pulled into shared classes, and a class map records which
//! short identifiers each name ends up with:
//!
//! ```
//! use atomize_core::{compile, CompileOptions, InputDescription};
//!
//! let input = InputDescription::from_json_str(
//!   r#"{ "styles": { "a": "color: red", "b": "color: red; font-weight: bold" } }"#,
//! )?;
//! let output = compile(&input, &CompileOptions::default())?;
//!
//! assert_eq!(output.css, ".a{font-weight:bold}\n.b{color:red}");
//! assert_eq!(output.classes.get("styles", "b")?, "a b");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeSet;

use crate::engine::AllocationContext;
use crate::ident::IdentAllocator;
use crate::model::DeclarationModel;
use crate::output::{assemble_css, build_class_map};
use crate::parser::selector::extract_class_names;

pub mod engine;
pub mod error;
pub mod ident;
pub mod input;
pub mod model;
pub mod output;
pub mod parser;
pub mod shorthand;

pub use error::{
  CompileError, InputError, MissingClassError, ShorthandConflictWarning, Span,
  StructuralParseError, SyntaxError,
};
pub use input::InputDescription;
pub use output::{render_module, ClassArg, ClassMap, EmissionMode};

#[derive(Clone, Debug, Default)]
pub struct CompileOptions {
  /// Prepended to every generated identifier.
  pub prefix: String,
  pub mode: EmissionMode,
}

#[derive(Clone, Debug)]
pub struct CompileOutput {
  pub css: String,
  /// The ES module exporting the class map.
  pub module: String,
  pub classes: ClassMap,
  pub warnings: Vec<ShorthandConflictWarning>,
}

pub fn compile(
  input: &InputDescription,
  options: &CompileOptions,
) -> Result<CompileOutput, CompileError> {
  let mut reserved = BTreeSet::new();
  for (binding, text) in [("_start", &input.prologue), ("_end", &input.epilogue)] {
    let Some(text) = text else {
      continue;
    };
    let nodes =
      parser::parse(text).map_err(|source| CompileError::VerbatimSyntax { binding, source })?;
    reserved.extend(extract_class_names(&nodes));
  }

  let allocator = IdentAllocator::new(&options.prefix, reserved)?;

  let mut model = DeclarationModel::new();
  for (namespace, styles) in &input.namespaces {
    for (name, text) in styles {
      let nodes = parser::parse(text).map_err(|source| CompileError::Syntax {
        namespace: namespace.clone(),
        name: name.clone(),
        source,
      })?;
      model.ingest(namespace, name, &nodes)?;
    }
  }

  let mut context = AllocationContext::new(allocator, model.names().len());
  let body = engine::generate(&model, &input.atrules, &mut context);

  let classes = build_class_map(
    input.namespaces.keys().map(String::as_str),
    model
      .names()
      .iter()
      .map(|style| (style.namespace.as_str(), style.name.as_str())),
    context.into_assignments(),
  );

  let css = assemble_css(
    input.prologue.as_deref(),
    &body,
    input.epilogue.as_deref(),
  );
  let module = render_module(&classes, options.mode);

  tracing::debug!(
    "Compiled {} style names into {} bytes of CSS",
    model.names().len(),
    css.len()
  );

  Ok(CompileOutput {
    css,
    module,
    classes,
    warnings: model.into_warnings(),
  })
}
