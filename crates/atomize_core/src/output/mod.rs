//! Assembling the final artifacts: the stylesheet text and the class map.

use indexmap::{IndexMap, IndexSet};

use crate::error::MissingClassError;

mod module;

pub use module::render_module;

/// Flavour of the generated JavaScript module.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmissionMode {
  /// Plain exported objects.
  #[default]
  Plain,
  /// Objects wrapped in an accessor that throws on unknown names.
  Dev,
}

/// One argument to [`ClassMap::cx`].
#[derive(Clone, Copy, Debug)]
pub enum ClassArg<'a> {
  Name(&'a str),
  /// Names paired with whether they should be included.
  Toggles(&'a [(&'a str, bool)]),
}

/// namespace -> style name -> identifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassMap {
  namespaces: IndexMap<String, IndexMap<String, Vec<String>>>,
}

impl ClassMap {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a namespace so that it is exported even when it holds no names.
  pub fn insert_namespace(&mut self, namespace: &str) {
    self.namespaces.entry(namespace.to_string()).or_default();
  }

  /// Register a name. Names with no identifiers still resolve, to `""`.
  pub fn insert(&mut self, namespace: &str, name: &str, idents: impl IntoIterator<Item = String>) {
    self
      .namespaces
      .entry(namespace.to_string())
      .or_default()
      .insert(name.to_string(), idents.into_iter().collect());
  }

  pub fn namespaces(&self) -> impl Iterator<Item = &str> {
    self.namespaces.keys().map(String::as_str)
  }

  /// `(name, class list)` pairs of one namespace in insertion order.
  pub fn entries<'a>(&'a self, namespace: &str) -> impl Iterator<Item = (&'a str, String)> + 'a {
    self
      .namespaces
      .get(namespace)
      .into_iter()
      .flat_map(|names| names.iter())
      .map(|(name, idents)| (name.as_str(), idents.join(" ")))
  }

  pub fn idents(&self, namespace: &str, name: &str) -> Option<&[String]> {
    self
      .namespaces
      .get(namespace)
      .and_then(|names| names.get(name))
      .map(Vec::as_slice)
  }

  pub fn has(&self, namespace: &str, name: &str) -> bool {
    self.idents(namespace, name).is_some()
  }

  /// The space-separated class list for `namespace.name`.
  pub fn get(&self, namespace: &str, name: &str) -> Result<String, MissingClassError> {
    self
      .idents(namespace, name)
      .map(|idents| idents.join(" "))
      .ok_or_else(|| MissingClassError {
        namespace: namespace.to_string(),
        name: name.to_string(),
      })
  }

  /// Resolve every included name in argument order and join the class lists.
  /// Repeated names are not deduplicated.
  pub fn cx(&self, namespace: &str, args: &[ClassArg<'_>]) -> Result<String, MissingClassError> {
    let mut lists = Vec::new();

    for arg in args {
      match arg {
        ClassArg::Name(name) => lists.push(self.get(namespace, name)?),
        ClassArg::Toggles(toggles) => {
          for (name, enabled) in toggles.iter() {
            if *enabled {
              lists.push(self.get(namespace, name)?);
            }
          }
        }
      }
    }

    Ok(
      lists
        .into_iter()
        .filter(|list| !list.is_empty())
        .collect::<Vec<_>>()
        .join(" "),
    )
  }
}

/// Build the class map from per-name assignments indexed by name id. Every
/// namespace in `namespaces` is exported, including ones with no names.
pub fn build_class_map<'a>(
  namespaces: impl IntoIterator<Item = &'a str>,
  names: impl IntoIterator<Item = (&'a str, &'a str)>,
  assignments: Vec<IndexSet<String>>,
) -> ClassMap {
  let mut map = ClassMap::new();
  for namespace in namespaces {
    map.insert_namespace(namespace);
  }
  for ((namespace, name), idents) in names.into_iter().zip(assignments) {
    map.insert(namespace, name, idents);
  }
  map
}

/// Prologue, generated rules and epilogue, newline separated.
pub fn assemble_css(prologue: Option<&str>, body: &str, epilogue: Option<&str>) -> String {
  [prologue, Some(body), epilogue]
    .into_iter()
    .flatten()
    .map(str::trim)
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join("\n")
}
