//! Shorthand handling.
//!
//! Box-model shorthands (`margin`, `padding`, the `border-*` side groups,
//! `border-radius` and `overflow`) are expanded into longhands when a style is
//! ingested so that a name declaring `margin: 0` can share `margin-top: 0`
//! with another name. When a rule body ends up holding every longhand of such a
//! shorthand, [`collapse`] folds them back.
//!
//! Composite shorthands such as `border` or `font` have no expander. Using one
//! together with one of its longhands in the same rule is reported through
//! [`ConflictTracker`], because atomization does not preserve the order between
//! the two declarations.

use std::collections::HashMap;

use indexmap::IndexMap;

/// The shorthands we can expand, with their longhands in expansion order.
pub const SUPPORTED_SHORTHANDS: &[(&str, &[&str])] = &[
  (
    "border-color",
    &[
      "border-top-color",
      "border-right-color",
      "border-bottom-color",
      "border-left-color",
    ],
  ),
  (
    "border-radius",
    &[
      "border-top-left-radius",
      "border-top-right-radius",
      "border-bottom-right-radius",
      "border-bottom-left-radius",
    ],
  ),
  (
    "border-style",
    &[
      "border-top-style",
      "border-right-style",
      "border-bottom-style",
      "border-left-style",
    ],
  ),
  (
    "border-width",
    &[
      "border-top-width",
      "border-right-width",
      "border-bottom-width",
      "border-left-width",
    ],
  ),
  (
    "margin",
    &["margin-top", "margin-right", "margin-bottom", "margin-left"],
  ),
  ("overflow", &["overflow-x", "overflow-y"]),
  (
    "padding",
    &["padding-top", "padding-right", "padding-bottom", "padding-left"],
  ),
];

/// Shorthands without an expander, with every longhand they reset.
pub const UNSUPPORTED_SHORTHANDS: &[(&str, &[&str])] = &[
  (
    "animation",
    &[
      "animation-name",
      "animation-duration",
      "animation-timing-function",
      "animation-delay",
      "animation-iteration-count",
      "animation-direction",
      "animation-fill-mode",
      "animation-play-state",
    ],
  ),
  (
    "background",
    &[
      "background-clip",
      "background-color",
      "background-image",
      "background-origin",
      "background-position",
      "background-repeat",
      "background-size",
      "background-attachment",
    ],
  ),
  (
    "border",
    &[
      "border-bottom-width",
      "border-bottom-style",
      "border-bottom-color",
      "border-left-width",
      "border-left-style",
      "border-left-color",
      "border-right-width",
      "border-right-style",
      "border-right-color",
      "border-top-width",
      "border-top-style",
      "border-top-color",
      "border-color",
      "border-style",
      "border-width",
    ],
  ),
  (
    "border-bottom",
    &["border-bottom-width", "border-bottom-style", "border-bottom-color"],
  ),
  (
    "border-left",
    &["border-left-width", "border-left-style", "border-left-color"],
  ),
  (
    "border-right",
    &["border-right-width", "border-right-style", "border-right-color"],
  ),
  (
    "border-top",
    &["border-top-width", "border-top-style", "border-top-color"],
  ),
  (
    "column-rule",
    &["column-rule-width", "column-rule-style", "column-rule-color"],
  ),
  ("columns", &["column-width", "column-count"]),
  ("flex", &["flex-grow", "flex-shrink", "flex-basis"]),
  ("flex-flow", &["flex-direction", "flex-wrap"]),
  (
    "font",
    &[
      "font-style",
      "font-variant",
      "font-weight",
      "font-stretch",
      "font-size",
      "line-height",
      "font-family",
    ],
  ),
  (
    "grid",
    &[
      "grid-template-rows",
      "grid-template-columns",
      "grid-template-areas",
      "grid-auto-rows",
      "grid-auto-columns",
      "grid-auto-flow",
    ],
  ),
  (
    "grid-area",
    &[
      "grid-column-start",
      "grid-column-end",
      "grid-row-start",
      "grid-row-end",
    ],
  ),
  ("grid-column", &["grid-column-start", "grid-column-end"]),
  ("grid-row", &["grid-row-start", "grid-row-end"]),
  (
    "grid-template",
    &[
      "grid-template-rows",
      "grid-template-columns",
      "grid-template-areas",
    ],
  ),
  (
    "list-style",
    &["list-style-type", "list-style-image", "list-style-position"],
  ),
  (
    "offset",
    &[
      "offset-position",
      "offset-path",
      "offset-distance",
      "offset-rotate",
      "offset-anchor",
    ],
  ),
  ("outline", &["outline-style", "outline-width", "outline-color"]),
  ("place-content", &["align-content", "justify-content"]),
  ("place-items", &["align-items", "justify-items"]),
  ("place-self", &["align-self", "justify-self"]),
  (
    "text-decoration",
    &[
      "text-decoration-line",
      "text-decoration-color",
      "text-decoration-style",
      "text-decoration-thickness",
    ],
  ),
  (
    "transition",
    &[
      "transition-property",
      "transition-duration",
      "transition-timing-function",
      "transition-delay",
    ],
  ),
];

fn lookup(table: &'static [(&'static str, &'static [&'static str])], prop: &str) -> Option<&'static [&'static str]> {
  table
    .iter()
    .find(|(shorthand, _)| *shorthand == prop)
    .map(|(_, longhands)| *longhands)
}

pub fn supported_longhands(prop: &str) -> Option<&'static [&'static str]> {
  lookup(SUPPORTED_SHORTHANDS, prop)
}

pub fn unsupported_longhands(prop: &str) -> Option<&'static [&'static str]> {
  lookup(UNSUPPORTED_SHORTHANDS, prop)
}

/// Expand a supported shorthand into `(longhand, value)` pairs.
///
/// Returns `None` when `prop` has no expander or when the value does not fit
/// the shorthand's grammar; the caller then keeps the declaration verbatim.
pub fn expand(prop: &str, value: &str) -> Option<Vec<(&'static str, String)>> {
  let longhands = supported_longhands(prop)?;

  if has_priority(value) {
    return None;
  }

  let values = match prop {
    "overflow" => {
      let tokens = tokens(value)?;
      match tokens.as_slice() {
        [both] => vec![both.clone(), both.clone()],
        [x, y] => vec![x.clone(), y.clone()],
        _ => return None,
      }
    }
    "border-radius" => expand_radius(value)?,
    _ => expand_box(&tokens(value)?)?,
  };

  Some(longhands.iter().copied().zip(values).collect())
}

/// Fold complete groups of longhands in `declarations` back into their
/// shorthand. The shorthand takes the position of its first longhand.
pub fn collapse(declarations: &mut IndexMap<String, String>) {
  for (shorthand, longhands) in SUPPORTED_SHORTHANDS {
    if declarations.contains_key(*shorthand) {
      continue;
    }

    let Some(values) = longhands
      .iter()
      .map(|longhand| declarations.get(*longhand).cloned())
      .collect::<Option<Vec<String>>>()
    else {
      continue;
    };

    if values.iter().any(|value| has_priority(value)) || mixes_wide_keywords(&values) {
      continue;
    }

    let collapsed = match *shorthand {
      "overflow" => {
        if values[0] == values[1] {
          Some(values[0].clone())
        } else {
          Some(format!("{} {}", values[0], values[1]))
        }
      }
      "border-radius" => collapse_radius(&values),
      _ => Some(collapse_box(&values)),
    };

    let Some(collapsed) = collapsed else {
      continue;
    };

    let Some(position) = longhands
      .iter()
      .filter_map(|longhand| declarations.get_index_of(*longhand))
      .min()
    else {
      continue;
    };

    for longhand in longhands.iter() {
      declarations.shift_remove(*longhand);
    }
    declarations.shift_insert(position, shorthand.to_string(), collapsed);
  }
}

/// `!important` in any spelling, including `! important`.
fn has_priority(value: &str) -> bool {
  value.contains('!')
}

const CSS_WIDE_KEYWORDS: &[&str] = &["inherit", "initial", "unset", "revert", "revert-layer"];

fn is_css_wide_keyword(value: &str) -> bool {
  CSS_WIDE_KEYWORDS
    .iter()
    .any(|keyword| value.trim().eq_ignore_ascii_case(keyword))
}

/// A CSS-wide keyword can only stand alone in a shorthand, so a group mixing
/// one with other values has no shorthand spelling.
fn mixes_wide_keywords(values: &[String]) -> bool {
  values.iter().any(|value| is_css_wide_keyword(value))
    && !values
      .iter()
      .all(|value| value.trim().eq_ignore_ascii_case(values[0].trim()))
}

/// Split a value on top-level whitespace, keeping strings and function
/// arguments intact. `var()` makes the token count unknowable, so it yields
/// `None`.
fn tokens(value: &str) -> Option<Vec<String>> {
  let mut tokens = Vec::new();
  let mut current = String::new();
  let mut depth = 0usize;
  let mut quote: Option<char> = None;
  let mut chars = value.chars();

  while let Some(ch) = chars.next() {
    match (quote, ch) {
      (Some(_), '\\') => {
        current.push(ch);
        if let Some(escaped) = chars.next() {
          current.push(escaped);
        }
        continue;
      }
      (Some(q), c) if c == q => quote = None,
      (Some(_), _) => {}
      (None, '\'' | '"') => quote = Some(ch),
      (None, '(') => depth += 1,
      (None, ')') => depth = depth.saturating_sub(1),
      (None, c) if c.is_whitespace() && depth == 0 => {
        if !current.is_empty() {
          tokens.push(std::mem::take(&mut current));
        }
        continue;
      }
      _ => {}
    }
    current.push(ch);
  }

  if !current.is_empty() {
    tokens.push(current);
  }

  if tokens.is_empty()
    || tokens
      .iter()
      .any(|token| token.to_ascii_lowercase().contains("var("))
  {
    return None;
  }

  Some(tokens)
}

/// CSS 1-4 value box expansion into top, right, bottom, left.
fn expand_box(tokens: &[String]) -> Option<Vec<String>> {
  let (top, right, bottom, left) = match tokens {
    [all] => (all, all, all, all),
    [vertical, horizontal] => (vertical, horizontal, vertical, horizontal),
    [top, horizontal, bottom] => (top, horizontal, bottom, horizontal),
    [top, right, bottom, left] => (top, right, bottom, left),
    _ => return None,
  };

  Some(vec![
    top.clone(),
    right.clone(),
    bottom.clone(),
    left.clone(),
  ])
}

fn collapse_box(values: &[String]) -> String {
  let (top, right, bottom, left) = (&values[0], &values[1], &values[2], &values[3]);

  if left != right {
    format!("{} {} {} {}", top, right, bottom, left)
  } else if bottom != top {
    format!("{} {} {}", top, right, bottom)
  } else if right != top {
    format!("{} {}", top, right)
  } else {
    top.clone()
  }
}

/// `border-radius: h{1,4} [/ v{1,4}]`. Corners are ordered top-left,
/// top-right, bottom-right, bottom-left.
fn expand_radius(value: &str) -> Option<Vec<String>> {
  let mut axes = split_top_level(value, '/');
  if axes.len() > 2 {
    return None;
  }

  let horizontal = expand_box(&tokens(axes.remove(0))?)?;
  let vertical = match axes.pop() {
    Some(vertical) => Some(expand_box(&tokens(vertical)?)?),
    None => None,
  };

  Some(match vertical {
    Some(vertical) => horizontal
      .into_iter()
      .zip(vertical)
      .map(|(h, v)| if h == v { h } else { format!("{} {}", h, v) })
      .collect(),
    None => horizontal,
  })
}

fn collapse_radius(values: &[String]) -> Option<String> {
  let mut horizontal = Vec::with_capacity(4);
  let mut vertical = Vec::with_capacity(4);

  for value in values {
    match tokens(value)?.as_slice() {
      [both] => {
        horizontal.push(both.clone());
        vertical.push(both.clone());
      }
      [h, v] => {
        horizontal.push(h.clone());
        vertical.push(v.clone());
      }
      _ => return None,
    }
  }

  let horizontal = collapse_box(&horizontal);
  let vertical = collapse_box(&vertical);

  if horizontal == vertical {
    Some(horizontal)
  } else {
    Some(format!("{} / {}", horizontal, vertical))
  }
}

fn split_top_level(value: &str, separator: char) -> Vec<&str> {
  let mut parts = Vec::new();
  let mut depth = 0usize;
  let mut quote: Option<char> = None;
  let mut start = 0;

  for (index, ch) in value.char_indices() {
    match (quote, ch) {
      (Some(q), c) if c == q => quote = None,
      (Some(_), _) => {}
      (None, '\'' | '"') => quote = Some(ch),
      (None, '(') => depth += 1,
      (None, ')') => depth = depth.saturating_sub(1),
      (None, c) if c == separator && depth == 0 => {
        parts.push(&value[start..index]);
        start = index + c.len_utf8();
      }
      _ => {}
    }
  }

  parts.push(&value[start..]);
  parts
}

/// Records which properties each rule declared so that unsupported shorthands
/// mixed with their own longhands can be reported.
#[derive(Debug, Default)]
pub struct ConflictTracker<K> {
  seen: HashMap<K, Vec<String>>,
}

impl<K: std::hash::Hash + Eq> ConflictTracker<K> {
  pub fn new() -> Self {
    Self {
      seen: HashMap::new(),
    }
  }

  /// Register `prop` for `key` and return every `(shorthand, longhand)` pair it
  /// conflicts with, in either direction.
  pub fn record(&mut self, key: K, prop: &str) -> Vec<(String, String)> {
    let seen = self.seen.entry(key).or_default();
    let mut conflicts = Vec::new();

    if let Some(longhands) = unsupported_longhands(prop) {
      for previous in seen.iter() {
        if longhands.contains(&previous.as_str()) {
          conflicts.push((prop.to_string(), previous.clone()));
        }
      }
    }

    for previous in seen.iter() {
      if let Some(longhands) = unsupported_longhands(previous) {
        if longhands.contains(&prop) {
          conflicts.push((previous.clone(), prop.to_string()));
        }
      }
    }

    seen.push(prop.to_string());
    conflicts
  }
}
