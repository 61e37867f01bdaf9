//! The declaration model.
//!
//! Every style name is flattened into [`DeclarationRecord`]s keyed by
//! `(scope, name, suffix, prop)`. At-rule blocks become [`AtruleScope`] nodes
//! shared by every name that uses the same header under the same parent, which
//! is what lets the engine group declarations across names scope by scope.

use std::collections::HashMap;

use crate::error::{ShorthandConflictWarning, StructuralParseError};
use crate::parser::selector::{parse_nested_selector, split_selector_list};
use crate::parser::{header_key, StyleNode};
use crate::shorthand::{self, ConflictTracker};

pub type ScopeId = usize;
pub type NameId = usize;

pub const ROOT_SCOPE: ScopeId = 0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleName {
  pub namespace: String,
  pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtruleScope {
  pub id: ScopeId,
  pub parent: Option<ScopeId>,
  pub header: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclarationRecord {
  pub scope: ScopeId,
  pub name: NameId,
  pub suffix: String,
  pub repeat: usize,
  pub prop: String,
  pub value: String,
}

type RecordKey = (ScopeId, NameId, String, String);

#[derive(Debug)]
pub struct DeclarationModel {
  names: Vec<StyleName>,
  scopes: Vec<AtruleScope>,
  scope_lookup: HashMap<(ScopeId, String), ScopeId>,
  children: Vec<Vec<ScopeId>>,
  records: Vec<DeclarationRecord>,
  keys: HashMap<RecordKey, usize>,
  by_scope: Vec<Vec<usize>>,
  by_name: Vec<Vec<usize>>,
  conflicts: ConflictTracker<(NameId, ScopeId, String)>,
  warnings: Vec<ShorthandConflictWarning>,
}

/// Where ingestion currently is inside one style name.
#[derive(Clone)]
struct Context<'a> {
  style: &'a StyleName,
  name: NameId,
  scope: ScopeId,
  suffix: String,
  repeat: usize,
}

impl Default for DeclarationModel {
  fn default() -> Self {
    Self::new()
  }
}

impl DeclarationModel {
  pub fn new() -> Self {
    Self {
      names: Vec::new(),
      scopes: vec![AtruleScope {
        id: ROOT_SCOPE,
        parent: None,
        header: String::new(),
      }],
      scope_lookup: HashMap::new(),
      children: vec![Vec::new()],
      records: Vec::new(),
      keys: HashMap::new(),
      by_scope: vec![Vec::new()],
      by_name: Vec::new(),
      conflicts: ConflictTracker::new(),
      warnings: Vec::new(),
    }
  }

  /// Register a style name and flatten its parsed style text into records.
  pub fn ingest(
    &mut self,
    namespace: &str,
    name: &str,
    nodes: &[StyleNode],
  ) -> Result<NameId, StructuralParseError> {
    let id = self.names.len();
    let style = StyleName {
      namespace: namespace.to_string(),
      name: name.to_string(),
    };
    self.names.push(style.clone());
    self.by_name.push(Vec::new());

    tracing::debug!("Ingesting {}.{} as name {}", namespace, name, id);

    let context = Context {
      style: &style,
      name: id,
      scope: ROOT_SCOPE,
      suffix: String::new(),
      repeat: 1,
    };
    self.ingest_nodes(&context, nodes)?;

    Ok(id)
  }

  fn ingest_nodes(&mut self, context: &Context<'_>, nodes: &[StyleNode]) -> Result<(), StructuralParseError> {
    for node in nodes {
      match node {
        StyleNode::Declaration { prop, value } => self.declare(context, prop, value),
        StyleNode::NestedRule { selector, children } => {
          if !context.suffix.is_empty() {
            return Err(StructuralParseError::NestedRule {
              namespace: context.style.namespace.clone(),
              name: context.style.name.clone(),
              selector: selector.clone(),
            });
          }

          for entry in split_selector_list(selector) {
            let Some(nested) = parse_nested_selector(entry) else {
              return Err(StructuralParseError::NonPseudoSelector {
                namespace: context.style.namespace.clone(),
                name: context.style.name.clone(),
                selector: entry.to_string(),
              });
            };

            let inner = Context {
              suffix: nested.suffix,
              repeat: nested.repeat.unwrap_or(context.repeat),
              ..context.clone()
            };
            self.ingest_nodes(&inner, children)?;
          }
        }
        StyleNode::AtRule { header, children } => {
          let inner = Context {
            scope: self.resolve_scope(context.scope, header),
            ..context.clone()
          };
          self.ingest_nodes(&inner, children)?;
        }
        StyleNode::AtStatement { header } => {
          return Err(StructuralParseError::AtRuleWithoutBlock {
            namespace: context.style.namespace.clone(),
            name: context.style.name.clone(),
            header: header.clone(),
          });
        }
      }
    }

    Ok(())
  }

  fn declare(&mut self, context: &Context<'_>, prop: &str, value: &str) {
    let conflicts = self
      .conflicts
      .record((context.name, context.scope, context.suffix.clone()), prop);

    for (shorthand, longhand) in conflicts {
      let warning = ShorthandConflictWarning {
        shorthand,
        longhand,
        namespace: context.style.namespace.clone(),
        name: context.style.name.clone(),
      };
      tracing::warn!("{}", warning);
      self.warnings.push(warning);
    }

    match shorthand::expand(prop, value) {
      Some(longhands) => {
        for (longhand, value) in longhands {
          self.insert(context, longhand, value);
        }
      }
      None => self.insert(context, prop, value.to_string()),
    }
  }

  fn insert(&mut self, context: &Context<'_>, prop: &str, value: String) {
    let key = (
      context.scope,
      context.name,
      context.suffix.clone(),
      prop.to_string(),
    );

    if let Some(&index) = self.keys.get(&key) {
      let record = &mut self.records[index];
      tracing::debug!(
        "Overwriting {} in {}.{}: {} -> {}",
        prop,
        context.style.namespace,
        context.style.name,
        record.value,
        value
      );
      record.value = value;
      record.repeat = context.repeat;
      return;
    }

    let index = self.records.len();
    self.records.push(DeclarationRecord {
      scope: context.scope,
      name: context.name,
      suffix: context.suffix.clone(),
      repeat: context.repeat,
      prop: prop.to_string(),
      value,
    });
    self.keys.insert(key, index);
    self.by_scope[context.scope].push(index);
    self.by_name[context.name].push(index);
  }

  /// Returns the child of `parent` with `header`, creating it on first use.
  pub fn resolve_scope(&mut self, parent: ScopeId, header: &str) -> ScopeId {
    let key = (parent, header_key(header));
    if let Some(&id) = self.scope_lookup.get(&key) {
      return id;
    }

    let id = self.scopes.len();
    self.scopes.push(AtruleScope {
      id,
      parent: Some(parent),
      header: header.to_string(),
    });
    self.scope_lookup.insert(key, id);
    self.children.push(Vec::new());
    self.by_scope.push(Vec::new());
    self.children[parent].push(id);

    id
  }

  pub fn names(&self) -> &[StyleName] {
    &self.names
  }

  pub fn name(&self, id: NameId) -> &StyleName {
    &self.names[id]
  }

  pub fn scope(&self, id: ScopeId) -> &AtruleScope {
    &self.scopes[id]
  }

  /// Child scopes of `id` in order of first appearance.
  pub fn children(&self, id: ScopeId) -> &[ScopeId] {
    &self.children[id]
  }

  pub fn records_in_scope(&self, id: ScopeId) -> impl Iterator<Item = &DeclarationRecord> + '_ {
    self.by_scope[id].iter().map(|index| &self.records[*index])
  }

  pub fn records_for_name(&self, id: NameId) -> impl Iterator<Item = &DeclarationRecord> + '_ {
    self.by_name[id].iter().map(|index| &self.records[*index])
  }

  pub fn warnings(&self) -> &[ShorthandConflictWarning] {
    &self.warnings
  }

  pub fn into_warnings(self) -> Vec<ShorthandConflictWarning> {
    self.warnings
  }
}
