use std::fmt;

/// Location inside a piece of style text. Lines and columns are 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
  pub line: usize,
  pub column: usize,
}

impl Span {
  pub const fn new(line: usize, column: usize) -> Self {
    Self { line, column }
  }
}

impl fmt::Display for Span {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.line, self.column)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at {span}")]
pub struct SyntaxError {
  pub message: String,
  pub span: Span,
}

impl SyntaxError {
  pub fn new(message: impl Into<String>, span: Span) -> Self {
    Self {
      message: message.into(),
      span,
    }
  }
}

/// Violations of the nesting model. These abort the whole compile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuralParseError {
  #[error("non-pseudo selector found: `{selector}` in {namespace}.{name}")]
  NonPseudoSelector {
    namespace: String,
    name: String,
    selector: String,
  },
  #[error("nested rule found: `{selector}` in {namespace}.{name}")]
  NestedRule {
    namespace: String,
    name: String,
    selector: String,
  },
  #[error("at-rule without block: `{header}` in {namespace}.{name}")]
  AtRuleWithoutBlock {
    namespace: String,
    name: String,
    header: String,
  },
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
  #[error("Invalid JSON input: {0}")]
  Json(#[from] serde_json::Error),
  #[error("Invalid TOML input: {0}")]
  Toml(#[from] toml::de::Error),
  #[error("Binding `{binding}` must be {expected}")]
  InvalidBinding {
    binding: String,
    expected: &'static str,
  },
  #[error("Namespace `{0}` is not a valid JavaScript identifier")]
  InvalidNamespace(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
  #[error(transparent)]
  Input(#[from] InputError),
  #[error("Failed to parse {namespace}.{name}: {source}")]
  Syntax {
    namespace: String,
    name: String,
    #[source]
    source: SyntaxError,
  },
  #[error("Failed to parse verbatim CSS in `{binding}`: {source}")]
  VerbatimSyntax {
    binding: &'static str,
    #[source]
    source: SyntaxError,
  },
  #[error(transparent)]
  Structural(#[from] StructuralParseError),
  #[error(
    "{0} isn't a valid CSS identifier prefix. Accepted characters are ^[a-zA-Z\\-_]+[a-zA-Z\\-_0-9]*$"
  )]
  InvalidPrefix(String),
}

/// A non-fatal diagnostic: an unsupported shorthand and one of its longhands
/// were both declared for the same name, scope and selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShorthandConflictWarning {
  pub shorthand: String,
  pub longhand: String,
  pub namespace: String,
  pub name: String,
}

impl fmt::Display for ShorthandConflictWarning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} found with shorthand {} in {}.{}",
      self.longhand, self.shorthand, self.namespace, self.name
    )
  }
}

/// Raised by the validating accessor when a style name is not in the map.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{namespace}.{name} is undefined")]
pub struct MissingClassError {
  pub namespace: String,
  pub name: String,
}
