//! The input description: a document of named bindings.
//!
//! Bindings whose name starts with `_` are reserved. `_start` and `_end` hold
//! verbatim CSS written before and after the generated rules, and `_atrules`
//! lists at-rule headers in their preferred output order. Every other binding
//! is a namespace mapping style names to raw style text.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::InputError;

pub const RESERVED_PREFIX: char = '_';
const START: &str = "_start";
const END: &str = "_end";
const ATRULES: &str = "_atrules";

/// Style name -> raw style text.
pub type Namespace = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputDescription {
  pub prologue: Option<String>,
  pub epilogue: Option<String>,
  pub atrules: Vec<String>,
  pub namespaces: BTreeMap<String, Namespace>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Binding {
  Text(String),
  List(Vec<String>),
  Styles(Namespace),
}

impl InputDescription {
  pub fn from_json_str(source: &str) -> Result<Self, InputError> {
    let bindings: BTreeMap<String, Binding> = serde_json::from_str(source)?;
    Self::from_bindings(bindings)
  }

  pub fn from_toml_str(source: &str) -> Result<Self, InputError> {
    let bindings: BTreeMap<String, Binding> = toml::from_str(source)?;
    Self::from_bindings(bindings)
  }

  fn from_bindings(bindings: BTreeMap<String, Binding>) -> Result<Self, InputError> {
    let mut description = InputDescription::default();

    for (key, binding) in bindings {
      match (key.as_str(), binding) {
        (START, Binding::Text(text)) => description.prologue = Some(text),
        (END, Binding::Text(text)) => description.epilogue = Some(text),
        (ATRULES, Binding::List(list)) => description.atrules = list,
        (START | END, _) => {
          return Err(InputError::InvalidBinding {
            binding: key.clone(),
            expected: "a string of CSS",
          })
        }
        (ATRULES, _) => {
          return Err(InputError::InvalidBinding {
            binding: key.clone(),
            expected: "a list of at-rule headers",
          })
        }
        (reserved, _) if reserved.starts_with(RESERVED_PREFIX) => {
          tracing::debug!("Ignoring reserved binding {}", reserved);
        }
        (_, Binding::Styles(styles)) => {
          if !is_js_identifier(&key) {
            return Err(InputError::InvalidNamespace(key.clone()));
          }
          description.namespaces.insert(key.clone(), styles);
        }
        (_, _) => {
          return Err(InputError::InvalidBinding {
            binding: key.clone(),
            expected: "a table of style names to style text",
          })
        }
      }
    }

    Ok(description)
  }
}

/// Words that cannot name an `export const` binding in a module.
const RESERVED_WORDS: &[&str] = &[
  "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
  "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
  "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
  "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
  "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Namespaces become `export const` bindings in the generated module.
fn is_js_identifier(value: &str) -> bool {
  if RESERVED_WORDS.contains(&value) {
    return false;
  }

  let mut chars = value.chars();
  match chars.next() {
    Some(first) if first.is_ascii_alphabetic() || first == '$' => {
      chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$')
    }
    _ => false,
  }
}
