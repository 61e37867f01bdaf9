//! Parser for raw style text.
//!
//! Style text is a list of declarations that may also contain nested
//! pseudo-selector rules and at-rule blocks:
//!
//! ```css
//! color: red;
//! :hover { color: blue }
//! @media (min-width: 100px) {
//!   font-size: 2em;
//! }
//! ```
//!
//! The same parser reads the verbatim prologue and epilogue, where every rule is
//! just a [`StyleNode::NestedRule`] with an arbitrary selector.

use crate::error::{Span, SyntaxError};

pub mod selector;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StyleNode {
  Declaration {
    prop: String,
    value: String,
  },
  NestedRule {
    selector: String,
    children: Vec<StyleNode>,
  },
  AtRule {
    header: String,
    children: Vec<StyleNode>,
  },
  /// An at-rule terminated by `;` instead of a block, e.g. `@import`.
  AtStatement {
    header: String,
  },
}

pub fn parse(input: &str) -> Result<Vec<StyleNode>, SyntaxError> {
  let mut parser = Parser::new(input);
  let nodes = parser.parse_block(false)?;
  Ok(nodes)
}

/// Collapse whitespace runs to a single space so that equivalent at-rule
/// headers written with different spacing share one scope.
pub fn normalize_header(header: &str) -> String {
  header.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Key under which equivalent at-rule headers are grouped. On top of
/// [`normalize_header`], spaces next to `(`, `)`, `:` and `,` are dropped so
/// that `(min-width:100px)` and `( min-width: 100px )` match. Quoted text is
/// left alone.
pub fn header_key(header: &str) -> String {
  let normalized = normalize_header(header);
  let chars: Vec<char> = normalized.chars().collect();
  let mut key = String::with_capacity(normalized.len());
  let mut quote = None;

  for (index, &ch) in chars.iter().enumerate() {
    match quote {
      Some(open) => {
        if ch == open && chars.get(index.wrapping_sub(1)) != Some(&'\\') {
          quote = None;
        }
      }
      None if ch == '"' || ch == '\'' => quote = Some(ch),
      None if ch == ' ' => {
        let after_punct = matches!(key.chars().last(), Some('(' | ':' | ','));
        let before_punct = matches!(chars.get(index + 1), Some(')' | ':' | ','));
        if after_punct || before_punct {
          continue;
        }
      }
      None => {}
    }
    key.push(ch);
  }

  key
}

const SINGLE_QUOTE: u8 = b'\'';
const DOUBLE_QUOTE: u8 = b'"';
const BACKSLASH: u8 = b'\\';
const SLASH: u8 = b'/';
const ASTERISK: u8 = b'*';
const NEWLINE: u8 = b'\n';
const OPEN_PARENTHESES: u8 = b'(';
const CLOSE_PARENTHESES: u8 = b')';
const OPEN_CURLY: u8 = b'{';
const CLOSE_CURLY: u8 = b'}';
const SEMICOLON: u8 = b';';
const AT: u8 = b'@';

#[derive(Clone, Copy)]
enum Terminator {
  Semicolon,
  Open,
  Close,
  Eof,
}

struct Parser<'a> {
  css: &'a str,
  bytes: &'a [u8],
  pos: usize,
}

impl<'a> Parser<'a> {
  fn new(css: &'a str) -> Self {
    Self {
      css,
      bytes: css.as_bytes(),
      pos: 0,
    }
  }

  fn span_at(&self, pos: usize) -> Span {
    let before = &self.bytes[..pos.min(self.bytes.len())];
    let line = before.iter().filter(|b| **b == NEWLINE).count() + 1;
    let line_start = before
      .iter()
      .rposition(|b| *b == NEWLINE)
      .map(|i| i + 1)
      .unwrap_or(0);
    Span::new(line, self.css[line_start..pos].chars().count() + 1)
  }

  fn parse_block(&mut self, nested: bool) -> Result<Vec<StyleNode>, SyntaxError> {
    let block_start = self.pos.saturating_sub(1);
    let mut nodes = Vec::new();

    loop {
      let statement_start = self.pos;
      let (text, terminator) = self.read_statement()?;
      let trimmed = text.trim();

      match terminator {
        Terminator::Open => {
          if trimmed.is_empty() {
            return Err(SyntaxError::new(
              "Missing selector before '{'",
              self.span_at(statement_start),
            ));
          }
          let children = self.parse_block(true)?;
          if trimmed.as_bytes()[0] == AT {
            nodes.push(StyleNode::AtRule {
              header: normalize_header(trimmed),
              children,
            });
          } else {
            nodes.push(StyleNode::NestedRule {
              selector: trimmed.to_string(),
              children,
            });
          }
        }
        Terminator::Semicolon | Terminator::Close | Terminator::Eof => {
          if !trimmed.is_empty() {
            nodes.push(self.statement(trimmed, statement_start)?);
          }

          match terminator {
            Terminator::Close if nested => return Ok(nodes),
            Terminator::Close => {
              return Err(SyntaxError::new(
                "Unexpected '}'",
                self.span_at(self.pos - 1),
              ))
            }
            Terminator::Eof if nested => {
              return Err(SyntaxError::new("Unclosed block", self.span_at(block_start)))
            }
            Terminator::Eof => return Ok(nodes),
            _ => {}
          }
        }
      }
    }
  }

  fn statement(&self, text: &str, start: usize) -> Result<StyleNode, SyntaxError> {
    if text.as_bytes()[0] == AT {
      return Ok(StyleNode::AtStatement {
        header: normalize_header(text),
      });
    }

    let Some((prop, value)) = text.split_once(':') else {
      return Err(SyntaxError::new(
        format!("Expected declaration, found `{}`", text),
        self.span_at(start),
      ));
    };

    let prop = prop.trim();
    if prop.is_empty() {
      return Err(SyntaxError::new("Empty property name", self.span_at(start)));
    }

    // Custom properties are case-sensitive.
    let prop = if prop.starts_with("--") {
      prop.to_string()
    } else {
      prop.to_ascii_lowercase()
    };

    Ok(StyleNode::Declaration {
      prop,
      value: value.trim().to_string(),
    })
  }

  /// Reads up to the next `;`, `{` or `}` that is outside strings, comments and
  /// parentheses. Comments are dropped from the returned text.
  fn read_statement(&mut self) -> Result<(String, Terminator), SyntaxError> {
    let mut text = String::new();
    let mut depth = 0usize;
    let mut segment_start = self.pos;

    while self.pos < self.bytes.len() {
      let code = self.bytes[self.pos];
      match code {
        SLASH if self.bytes.get(self.pos + 1) == Some(&ASTERISK) => {
          text.push_str(&self.css[segment_start..self.pos]);
          self.skip_comment()?;
          segment_start = self.pos;
          continue;
        }
        SINGLE_QUOTE | DOUBLE_QUOTE => {
          self.skip_string(code)?;
          continue;
        }
        OPEN_PARENTHESES => depth += 1,
        CLOSE_PARENTHESES => depth = depth.saturating_sub(1),
        SEMICOLON | OPEN_CURLY | CLOSE_CURLY if depth == 0 => {
          text.push_str(&self.css[segment_start..self.pos]);
          self.pos += 1;
          let terminator = match code {
            SEMICOLON => Terminator::Semicolon,
            OPEN_CURLY => Terminator::Open,
            _ => Terminator::Close,
          };
          return Ok((text, terminator));
        }
        _ => {}
      }
      self.pos += 1;
    }

    text.push_str(&self.css[segment_start..self.pos]);
    Ok((text, Terminator::Eof))
  }

  fn skip_comment(&mut self) -> Result<(), SyntaxError> {
    let start = self.pos;
    match self.css[self.pos + 2..].find("*/") {
      Some(offset) => {
        self.pos += 2 + offset + 2;
        Ok(())
      }
      None => Err(SyntaxError::new("Unclosed comment", self.span_at(start))),
    }
  }

  fn skip_string(&mut self, quote: u8) -> Result<(), SyntaxError> {
    let start = self.pos;
    self.pos += 1;
    while self.pos < self.bytes.len() {
      match self.bytes[self.pos] {
        BACKSLASH => self.pos += 2,
        code if code == quote => {
          self.pos += 1;
          return Ok(());
        }
        NEWLINE => break,
        _ => self.pos += 1,
      }
    }
    Err(SyntaxError::new("Unclosed string", self.span_at(start)))
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  fn decl(prop: &str, value: &str) -> StyleNode {
    StyleNode::Declaration {
      prop: prop.into(),
      value: value.into(),
    }
  }

  #[test]
  fn header_keys_ignore_spacing_around_punctuation() {
    let key = header_key("@media (min-width: 100px)");

    assert_eq!(key, "@media (min-width:100px)");
    assert_eq!(header_key("@media (min-width:100px)"), key);
    assert_eq!(header_key("@media  ( min-width :  100px )"), key);
    assert_eq!(
      header_key("@media screen and (min-width: 1px) , print"),
      "@media screen and (min-width:1px),print"
    );
    assert_eq!(
      header_key("@supports (content: \"a : b\")"),
      "@supports (content:\"a : b\")"
    );
    assert_ne!(header_key("@media screen"), header_key("@media print"));
  }

  #[test]
  fn parses_declarations_rules_and_at_rules() {
    let nodes = parse(
      "
      font-weight: bold;
      @media  (min-width: 100px) {
        font-size: 5em;
        ::after { content: '!!' }
      }
      ::after {
        content: '!'
      }
      ",
    )
    .unwrap();

    assert_eq!(
      nodes,
      vec![
        decl("font-weight", "bold"),
        StyleNode::AtRule {
          header: "@media (min-width: 100px)".into(),
          children: vec![
            decl("font-size", "5em"),
            StyleNode::NestedRule {
              selector: "::after".into(),
              children: vec![decl("content", "'!!'")],
            },
          ],
        },
        StyleNode::NestedRule {
          selector: "::after".into(),
          children: vec![decl("content", "'!'")],
        },
      ]
    );
  }

  #[test]
  fn keeps_terminators_inside_strings_and_parentheses() {
    let nodes = parse(
      r#"content: "a;b{c}"; background-image: url(data:image/png;base64,AAA); color: red"#,
    )
    .unwrap();

    assert_eq!(
      nodes,
      vec![
        decl("content", r#""a;b{c}""#),
        decl("background-image", "url(data:image/png;base64,AAA)"),
        decl("color", "red"),
      ]
    );
  }

  #[test]
  fn drops_comments() {
    let nodes = parse("/* lead */ color: /* inline */ red; /* trail */").unwrap();

    assert_eq!(nodes, vec![decl("color", "red")]);
  }

  #[test]
  fn reports_unclosed_block_with_position() {
    let err = parse("color: red;\n:hover {\n  color: blue;\n").unwrap_err();

    assert_eq!(err.message, "Unclosed block");
    assert_eq!(err.span, Span::new(2, 8));
  }

  #[test]
  fn reports_stray_closing_brace() {
    let err = parse("color: red; }").unwrap_err();

    assert_eq!(err.message, "Unexpected '}'");
    assert_eq!(err.span, Span::new(1, 13));
  }

  #[test]
  fn reports_missing_colon() {
    let err = parse("color red;").unwrap_err();

    assert_eq!(err.message, "Expected declaration, found `color red`");
  }

  #[test]
  fn reports_unclosed_string() {
    let err = parse("content: 'oops;\ncolor: red;").unwrap_err();

    assert_eq!(err.message, "Unclosed string");
    assert_eq!(err.span, Span::new(1, 10));
  }

  #[test]
  fn block_less_at_rules_are_statements() {
    let nodes = parse("@import url(a.css);").unwrap();

    assert_eq!(
      nodes,
      vec![StyleNode::AtStatement {
        header: "@import url(a.css)".into()
      }]
    );
  }
}
