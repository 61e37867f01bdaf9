//! Grouping and atomization.
//!
//! For every scope the engine partitions the scope-local records by
//! `(prop, value)`. A pair used by exactly one `(name, suffix, repeat)`
//! contributor lands in that name's own class. A pair used by several
//! contributors is grouped with every other pair that has the identical
//! contributing set, and the group gets one shared rule body.
//!
//! Rules are emitted singles first, then shared groups, each in a total order,
//! and identifiers are allocated in emission order so the same input always
//! yields the same text and the same class map.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use indexmap::{IndexMap, IndexSet};

use crate::ident::IdentAllocator;
use crate::model::{DeclarationModel, NameId, ScopeId, ROOT_SCOPE};
use crate::parser::header_key;
use crate::shorthand;

/// `(name, suffix, repeat)`
type Contributor = (NameId, String, usize);

type Declarations = Vec<(String, String)>;

/// Allocation state for one compile: the allocator plus every identifier
/// handed out so far.
#[derive(Debug)]
pub struct AllocationContext {
  allocator: IdentAllocator,
  singles: HashMap<NameId, String>,
  shared: HashMap<(Vec<Contributor>, String, usize), String>,
  assignments: Vec<IndexSet<String>>,
}

impl AllocationContext {
  pub fn new(allocator: IdentAllocator, name_count: usize) -> Self {
    Self {
      allocator,
      singles: HashMap::new(),
      shared: HashMap::new(),
      assignments: vec![IndexSet::new(); name_count],
    }
  }

  fn single(&mut self, name: NameId) -> String {
    let allocator = &mut self.allocator;
    self
      .singles
      .entry(name)
      .or_insert_with(|| allocator.next_ident())
      .clone()
  }

  fn shared(&mut self, set: &[Contributor], suffix: &str, repeat: usize) -> String {
    let allocator = &mut self.allocator;
    self
      .shared
      .entry((set.to_vec(), suffix.to_string(), repeat))
      .or_insert_with(|| allocator.next_ident())
      .clone()
  }

  fn assign(&mut self, name: NameId, ident: &str) {
    if let Some(classes) = self.assignments.get_mut(name) {
      classes.insert(ident.to_string());
    }
  }

  /// Identifiers per name, indexed by [`NameId`], in first-assignment order.
  pub fn into_assignments(self) -> Vec<IndexSet<String>> {
    self.assignments
  }
}

/// Generate the CSS body for the root scope and everything below it.
pub fn generate(
  model: &DeclarationModel,
  preferred_atrules: &[String],
  context: &mut AllocationContext,
) -> String {
  let preferred: Vec<String> = preferred_atrules
    .iter()
    .map(|header| header_key(header))
    .collect();

  build_scope(model, ROOT_SCOPE, &preferred, context)
}

fn build_scope(
  model: &DeclarationModel,
  scope: ScopeId,
  preferred: &[String],
  context: &mut AllocationContext,
) -> String {
  let mut partitions: BTreeMap<(String, String), BTreeSet<Contributor>> = BTreeMap::new();
  for record in model.records_in_scope(scope) {
    partitions
      .entry((record.prop.clone(), record.value.clone()))
      .or_default()
      .insert((record.name, record.suffix.clone(), record.repeat));
  }

  let mut singles: BTreeMap<Contributor, Declarations> = BTreeMap::new();
  let mut groups: BTreeMap<Vec<Contributor>, Declarations> = BTreeMap::new();
  for (declaration, contributors) in partitions {
    if contributors.len() == 1 {
      if let Some(contributor) = contributors.into_iter().next() {
        singles.entry(contributor).or_default().push(declaration);
      }
    } else {
      groups
        .entry(contributors.into_iter().collect())
        .or_default()
        .push(declaration);
    }
  }

  let mut rules = Vec::new();

  for ((name, suffix, repeat), declarations) in singles {
    let ident = context.single(name);
    context.assign(name, &ident);
    rules.push(format!(
      "{}{{{}}}",
      selector(&ident, &suffix, repeat),
      body(declarations)
    ));
  }

  for (set, declarations) in groups {
    let variants: BTreeSet<(&str, usize)> = set
      .iter()
      .map(|(_, suffix, repeat)| (suffix.as_str(), *repeat))
      .collect();

    let mut selectors = Vec::with_capacity(variants.len());
    let mut idents = HashMap::new();
    for (suffix, repeat) in variants {
      let ident = context.shared(&set, suffix, repeat);
      selectors.push(selector(&ident, suffix, repeat));
      idents.insert((suffix, repeat), ident);
    }

    for (name, suffix, repeat) in &set {
      if let Some(ident) = idents.get(&(suffix.as_str(), *repeat)) {
        context.assign(*name, ident);
      }
    }

    rules.push(format!("{}{{{}}}", selectors.join(","), body(declarations)));
  }

  for child in ordered_children(model, scope, preferred) {
    let inner = build_scope(model, child, preferred, context);
    if inner.is_empty() {
      continue;
    }
    rules.push(format!("{}{{{}}}", model.scope(child).header, inner));
  }

  rules.join("\n")
}

fn selector(ident: &str, suffix: &str, repeat: usize) -> String {
  format!("{}{}", format!(".{}", ident).repeat(repeat.max(1)), suffix)
}

fn body(declarations: Declarations) -> String {
  let mut declarations: IndexMap<String, String> = declarations.into_iter().collect();
  declarations.sort_keys();
  shorthand::collapse(&mut declarations);

  declarations
    .iter()
    .map(|(prop, value)| format!("{}:{}", prop, value))
    .collect::<Vec<_>>()
    .join(";")
}

/// Headers missing from the preferred list keep their order of first
/// appearance and come first. Listed headers follow in list order.
fn ordered_children(model: &DeclarationModel, scope: ScopeId, preferred: &[String]) -> Vec<ScopeId> {
  let mut children = model.children(scope).to_vec();
  children.sort_by_key(|child| {
    let header = header_key(&model.scope(*child).header);
    preferred.iter().position(|entry| *entry == header)
  });
  children
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::parser::parse;

  struct Generated {
    css: String,
    classes: Vec<String>,
  }

  fn run(styles: &[(&str, &str)], preferred: &[&str], reserved: &[&str]) -> Generated {
    let mut model = DeclarationModel::new();
    for (name, text) in styles {
      model.ingest("styles", name, &parse(text).unwrap()).unwrap();
    }

    let reserved = reserved.iter().map(|name| name.to_string()).collect();
    let allocator = IdentAllocator::new("", reserved).unwrap();
    let mut context = AllocationContext::new(allocator, model.names().len());
    let preferred: Vec<String> = preferred.iter().map(|header| header.to_string()).collect();

    let css = generate(&model, &preferred, &mut context);
    let classes = context
      .into_assignments()
      .into_iter()
      .map(|classes| classes.into_iter().collect::<Vec<_>>().join(" "))
      .collect();

    Generated { css, classes }
  }

  #[test]
  fn shares_identical_declarations() {
    let out = run(&[("A", "color: red;"), ("B", "color: red;")], &[], &[]);

    assert_eq!(out.css, ".a{color:red}");
    assert_eq!(out.classes, vec!["a", "a"]);
  }

  #[test]
  fn splits_shared_and_private_declarations() {
    let out = run(
      &[
        ("A", "color: red; display: block"),
        ("B", "color: red; font-weight: bold; display: block"),
      ],
      &[],
      &[],
    );

    assert_eq!(out.css, ".a{font-weight:bold}\n.b{color:red;display:block}");
    assert_eq!(out.classes, vec!["b", "a b"]);
  }

  #[test]
  fn collapses_complete_longhand_groups() {
    let out = run(
      &[(
        "A",
        "margin-top:1px; margin-right:1px; margin-bottom:1px; margin-left:1px;",
      )],
      &[],
      &[],
    );

    assert_eq!(out.css, ".a{margin:1px}");
  }

  #[test]
  fn expanded_shorthands_share_longhands() {
    let out = run(
      &[("A", "margin: 0"), ("B", "margin-top: 0; color: red")],
      &[],
      &[],
    );

    assert_eq!(
      out.css,
      ".a{margin-bottom:0;margin-left:0;margin-right:0}\n.b{color:red}\n.c{margin-top:0}"
    );
    assert_eq!(out.classes, vec!["a c", "b c"]);
  }

  #[test]
  fn skips_reserved_identifiers() {
    let out = run(&[("A", "color: red")], &[], &["a"]);

    assert_eq!(out.css, ".b{color:red}");
    assert_eq!(out.classes, vec!["b"]);
  }

  #[test]
  fn emits_suffixes_and_repeats() {
    let out = run(&[("A", "color: red; &&:hover { color: blue }")], &[], &[]);

    assert_eq!(out.css, ".a{color:red}\n.a.a:hover{color:blue}");
    assert_eq!(out.classes, vec!["a"]);
  }

  #[test]
  fn shared_groups_get_one_identifier_per_suffix() {
    let out = run(
      &[
        ("A", "color: red"),
        ("B", ":hover { color: red }"),
      ],
      &[],
      &[],
    );

    assert_eq!(out.css, ".a,.b:hover{color:red}");
    assert_eq!(out.classes, vec!["a", "b"]);
  }

  #[test]
  fn keeps_scopes_apart() {
    let out = run(
      &[(
        "A",
        "::after { content: '!' } @media (min-width: 100px) { ::after { content: '!!' } }",
      )],
      &[],
      &[],
    );

    assert_eq!(
      out.css,
      ".a::after{content:'!'}\n@media (min-width: 100px){.a::after{content:'!!'}}"
    );
    assert_eq!(out.classes, vec!["a"]);
  }

  #[test]
  fn reuses_shared_identifiers_across_scopes() {
    let out = run(
      &[
        ("A", "color: red; @media print { color: blue }"),
        ("B", "color: red; @media print { color: blue }"),
      ],
      &[],
      &[],
    );

    assert_eq!(out.css, ".a{color:red}\n@media print{.a{color:blue}}");
    assert_eq!(out.classes, vec!["a", "a"]);
  }

  #[test]
  fn orders_at_rules_absent_first() {
    let out = run(
      &[(
        "A",
        "@media (min-width: 2px) { color: red } @media print { color: blue } @media (min-width: 1px) { color: green }",
      )],
      &["@media (min-width:  1px)", "@media (min-width: 2px)"],
      &[],
    );

    assert_eq!(
      out.css,
      [
        "@media print{.a{color:blue}}",
        "@media (min-width: 1px){.a{color:green}}",
        "@media (min-width: 2px){.a{color:red}}",
      ]
      .join("\n")
    );
  }

  #[test]
  fn spacing_variants_of_a_header_share_one_block() {
    let out = run(
      &[
        ("A", "@media (min-width:100px) { color: red } @media print { color: blue }"),
        ("B", "@media (min-width: 100px) { color: red }"),
      ],
      &["@media print", "@media ( min-width : 100px )"],
      &[],
    );

    assert_eq!(
      out.css,
      [
        "@media print{.a{color:blue}}",
        "@media (min-width:100px){.b{color:red}}",
      ]
      .join("\n")
    );
    assert_eq!(out.classes, vec!["a b", "b"]);
  }

  #[test]
  fn drops_empty_at_rules() {
    let mut model = DeclarationModel::new();
    model.resolve_scope(ROOT_SCOPE, "@media print");
    let allocator = IdentAllocator::new("", BTreeSet::new()).unwrap();
    let mut context = AllocationContext::new(allocator, 0);

    assert_eq!(generate(&model, &[], &mut context), "");
  }

  #[test]
  fn output_is_stable() {
    let styles = [
      ("A", "color: red; padding: 1px 2px; :hover { color: blue }"),
      ("B", "color: red; @media print { padding: 1px 2px }"),
      ("C", ":hover { color: blue } @media print { display: none }"),
    ];

    let first = run(&styles, &[], &[]);
    let second = run(&styles, &[], &[]);

    assert_eq!(first.css, second.css);
    assert_eq!(first.classes, second.classes);
  }
}
