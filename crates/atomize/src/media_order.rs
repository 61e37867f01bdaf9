//! Mobile-first ordering of top-level `@media` blocks.
//!
//! Blocks with the same query are merged, then every `@media` block is moved
//! after the other top-level rules in this order: queries without a size
//! feature, `min-width` ascending, `min-height` ascending, `max-width`
//! descending, `max-height` descending and finally `print`. The sort is stable,
//! so queries with equal keys keep their order of first appearance.

use std::cmp::Ordering;

use anyhow::anyhow;
use lightningcss::printer::PrinterOptions;
use lightningcss::rules::media::MediaRule;
use lightningcss::rules::{CssRule, CssRuleList};
use lightningcss::targets::Targets;
use lightningcss::traits::ToCss;

const ROOT_FONT_SIZE: f64 = 16.0;

pub fn sort_media_queries<'i>(rules: &mut CssRuleList<'i>, targets: Targets) -> anyhow::Result<()> {
  let mut others = Vec::with_capacity(rules.0.len());
  let mut media: Vec<(String, MediaRule<'i>)> = Vec::new();

  for rule in std::mem::take(&mut rules.0) {
    match rule {
      CssRule::Media(rule) => {
        let query = rule
          .query
          .to_css_string(PrinterOptions {
            targets,
            ..PrinterOptions::default()
          })
          .map_err(|err| anyhow!("Failed to print media query: {}", err))?;

        match media.iter_mut().find(|(existing, _)| *existing == query) {
          Some((_, existing)) => existing.rules.0.extend(rule.rules.0),
          None => media.push((query, rule)),
        }
      }
      rule => others.push(rule),
    }
  }

  tracing::debug!("Sorting {} media blocks", media.len());

  media.sort_by(|(a, _), (b, _)| compare_queries(a, b));

  others.extend(media.into_iter().map(|(_, rule)| CssRule::Media(rule)));
  rules.0 = others;

  Ok(())
}

fn compare_queries(a: &str, b: &str) -> Ordering {
  let (a_rank, a_size) = media_query_order(a);
  let (b_rank, b_size) = media_query_order(b);
  a_rank.cmp(&b_rank).then(a_size.total_cmp(&b_size))
}

/// Sort key of a printed media query. Sizes are in px; `max-*` sizes are
/// negated so that a plain ascending sort puts the widest first.
pub fn media_query_order(query: &str) -> (u8, f64) {
  let query = query.to_ascii_lowercase();

  for (rank, feature, sign) in [
    (1, "min-width", 1.0),
    (2, "min-height", 1.0),
    (3, "max-width", -1.0),
    (4, "max-height", -1.0),
  ] {
    if let Some(size) = feature_size(&query, feature) {
      return (rank, sign * size);
    }
  }

  let is_print = query
    .split(|ch: char| !ch.is_ascii_alphanumeric() && ch != '-')
    .any(|word| word == "print");
  if is_print {
    (5, 0.0)
  } else {
    (0, 0.0)
  }
}

/// The value of `(feature: <length>)` in px. Lengths in units other than px,
/// em and rem are compared by their number alone.
fn feature_size(query: &str, feature: &str) -> Option<f64> {
  let start = query.find(feature)? + feature.len();
  let rest = query[start..].trim_start().strip_prefix(':')?;
  let value = rest.split(')').next()?.trim();

  let split = value
    .find(|ch: char| !(ch.is_ascii_digit() || ch == '.' || ch == '-' || ch == '+'))
    .unwrap_or(value.len());
  let (number, unit) = value.split_at(split);
  let number: f64 = number.parse().ok()?;

  match unit.trim() {
    "em" | "rem" => Some(number * ROOT_FONT_SIZE),
    _ => Some(number),
  }
}

#[cfg(test)]
mod tests {
  use lightningcss::stylesheet::{ParserOptions, StyleSheet};
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::compile::output_targets;

  fn sorted(css: &str) -> String {
    let mut stylesheet = StyleSheet::parse(css, ParserOptions::default()).unwrap();
    sort_media_queries(&mut stylesheet.rules, output_targets()).unwrap();
    stylesheet
      .to_css(PrinterOptions {
        minify: true,
        targets: output_targets(),
        ..PrinterOptions::default()
      })
      .unwrap()
      .code
  }

  fn position(css: &str, needle: &str) -> usize {
    css
      .find(needle)
      .unwrap_or_else(|| panic!("{needle} missing from {css}"))
  }

  #[test]
  fn ranks_queries_mobile_first() {
    assert_eq!(media_query_order("screen"), (0, 0.0));
    assert_eq!(media_query_order("(min-width: 100px)"), (1, 100.0));
    assert_eq!(media_query_order("screen and (min-width: 2em)"), (1, 32.0));
    assert_eq!(media_query_order("(min-height: 1rem)"), (2, 16.0));
    assert_eq!(media_query_order("(max-width: 600px)"), (3, -600.0));
    assert_eq!(media_query_order("(max-height: 50px)"), (4, -50.0));
    assert_eq!(media_query_order("print"), (5, 0.0));
    assert_eq!(media_query_order("not print"), (5, 0.0));
  }

  #[test]
  fn moves_media_blocks_after_other_rules_in_mobile_first_order() {
    let css = sorted(
      "@media print{.p{color:red}}\
       @media (max-width: 300px){.m3{color:red}}\
       .a{color:red}\
       @media (min-width: 500px){.n5{color:red}}\
       @media (max-width: 900px){.m9{color:red}}\
       @media (min-width: 100px){.n1{color:red}}\
       @media screen{.s{color:red}}\
       .b{color:blue}",
    );

    let order = [".a{", ".b{", ".s{", ".n1{", ".n5{", ".m9{", ".m3{", ".p{"]
      .iter()
      .map(|selector| position(&css, selector))
      .collect::<Vec<_>>();
    let mut expected = order.clone();
    expected.sort();

    assert_eq!(order, expected, "{css}");
  }

  #[test]
  fn merges_blocks_with_the_same_query() {
    let css = sorted(
      "@media (min-width: 100px){.a{color:red}}\
       .x{color:blue}\
       @media (min-width: 100px){.b{color:green}}",
    );

    assert_eq!(css.matches("@media").count(), 1, "{css}");
    assert!(position(&css, ".x{") < position(&css, ".a{"), "{css}");
    assert!(position(&css, ".a{") < position(&css, ".b{"), "{css}");
  }

  #[test]
  fn keeps_nested_media_in_place() {
    let css = sorted("@supports (gap:1px){@media (min-width: 1px){.a{gap:1px}}}.b{color:red}");

    assert!(position(&css, "@supports") < position(&css, ".b{"), "{css}");
  }
}
