use std::collections::BTreeSet;

use super::StyleNode;

/// A nested selector reduced to what the engine needs: how many `&` tokens led
/// it and the pseudo-class/pseudo-element suffix that followed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NestedSelector {
  /// `None` when the selector did not start with `&`.
  pub repeat: Option<usize>,
  pub suffix: String,
}

/// Split a selector list on commas that are not inside parentheses, brackets or
/// strings.
pub fn split_selector_list(selector: &str) -> Vec<&str> {
  let bytes = selector.as_bytes();
  let mut parts = Vec::new();
  let mut depth = 0usize;
  let mut quote: Option<u8> = None;
  let mut start = 0;
  let mut i = 0;

  while i < bytes.len() {
    let code = bytes[i];
    match (quote, code) {
      (Some(_), b'\\') => i += 1,
      (Some(q), c) if c == q => quote = None,
      (Some(_), _) => {}
      (None, b'\'' | b'"') => quote = Some(code),
      (None, b'(' | b'[') => depth += 1,
      (None, b')' | b']') => depth = depth.saturating_sub(1),
      (None, b',') if depth == 0 => {
        parts.push(selector[start..i].trim());
        start = i + 1;
      }
      _ => {}
    }
    i += 1;
  }

  parts.push(selector[start..].trim());
  parts
}

/// Parse one entry of a nested selector list. Only `&` repetitions followed by
/// pseudo-classes and pseudo-elements are accepted; anything else (types,
/// classes, ids, attributes, combinators or whitespace) returns `None`.
pub fn parse_nested_selector(entry: &str) -> Option<NestedSelector> {
  let entry = entry.trim();
  let bytes = entry.as_bytes();
  let mut i = 0;
  let mut ampersands = 0;

  while i < bytes.len() && bytes[i] == b'&' {
    ampersands += 1;
    i += 1;
    // `& &` collapses to `&&`, but `& :hover` is a descendant selector.
    let mut lookahead = i;
    while lookahead < bytes.len() && bytes[lookahead].is_ascii_whitespace() {
      lookahead += 1;
    }
    if lookahead > i && bytes.get(lookahead) == Some(&b'&') {
      i = lookahead;
    }
  }

  let suffix_start = i;
  while i < bytes.len() {
    if bytes[i] != b':' {
      return None;
    }
    i += 1;
    if bytes.get(i) == Some(&b':') {
      i += 1;
    }

    let name_start = i;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-' || bytes[i] == b'_')
    {
      i += 1;
    }
    if i == name_start {
      return None;
    }

    if bytes.get(i) == Some(&b'(') {
      i = skip_arguments(bytes, i)?;
    }
  }

  if ampersands == 0 && suffix_start == bytes.len() {
    return None;
  }

  Some(NestedSelector {
    repeat: (ampersands > 0).then_some(ampersands),
    suffix: entry[suffix_start..].to_string(),
  })
}

/// Returns the index just past the `)` matching the `(` at `open`.
fn skip_arguments(bytes: &[u8], open: usize) -> Option<usize> {
  let mut depth = 0usize;
  let mut quote: Option<u8> = None;
  let mut i = open;

  while i < bytes.len() {
    let code = bytes[i];
    match (quote, code) {
      (Some(_), b'\\') => i += 1,
      (Some(q), c) if c == q => quote = None,
      (Some(_), _) => {}
      (None, b'\'' | b'"') => quote = Some(code),
      (None, b'(') => depth += 1,
      (None, b')') => {
        depth -= 1;
        if depth == 0 {
          return Some(i + 1);
        }
      }
      _ => {}
    }
    i += 1;
  }

  None
}

/// Collect every literal class name used in the selectors of verbatim CSS.
pub fn extract_class_names(nodes: &[StyleNode]) -> BTreeSet<String> {
  let mut names = BTreeSet::new();
  collect_class_names(nodes, &mut names);
  names
}

fn collect_class_names(nodes: &[StyleNode], names: &mut BTreeSet<String>) {
  for node in nodes {
    match node {
      StyleNode::NestedRule { selector, children } => {
        class_names_in_selector(selector, names);
        collect_class_names(children, names);
      }
      StyleNode::AtRule { children, .. } => collect_class_names(children, names),
      StyleNode::Declaration { .. } | StyleNode::AtStatement { .. } => {}
    }
  }
}

fn class_names_in_selector(selector: &str, names: &mut BTreeSet<String>) {
  let chars: Vec<char> = selector.chars().collect();
  let mut quote: Option<char> = None;
  let mut in_attribute = false;
  let mut i = 0;

  while i < chars.len() {
    let ch = chars[i];
    match (quote, ch) {
      (Some(_), '\\') => i += 1,
      (Some(q), c) if c == q => quote = None,
      (Some(_), _) => {}
      (None, '\'' | '"') => quote = Some(ch),
      (None, '[') => in_attribute = true,
      (None, ']') => in_attribute = false,
      (None, '.') if !in_attribute && starts_identifier(&chars[i + 1..]) => {
        let mut name = String::new();
        i += 1;
        while i < chars.len() {
          let c = chars[i];
          if c == '\\' && i + 1 < chars.len() {
            name.push(chars[i + 1]);
            i += 2;
          } else if c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            name.push(c);
            i += 1;
          } else {
            break;
          }
        }
        names.insert(name);
        continue;
      }
      _ => {}
    }
    i += 1;
  }
}

fn starts_identifier(rest: &[char]) -> bool {
  match rest {
    ['-', second, ..] => second.is_alphabetic() || *second == '_' || *second == '-' || *second == '\\',
    [first, ..] => first.is_alphabetic() || *first == '_' || *first == '\\' || !first.is_ascii(),
    [] => false,
  }
}
