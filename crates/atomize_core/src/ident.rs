use std::collections::BTreeSet;

use crate::error::CompileError;

const ALPHABET: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Hands out short class names: `a` ... `z`, `A` ... `Z`, `aa`, `ab`, ...
///
/// Every name carries the configured prefix. Names that already appear in the
/// verbatim prologue or epilogue are skipped so generated rules never merge
/// with hand-written ones.
#[derive(Debug)]
pub struct IdentAllocator {
  prefix: String,
  reserved: BTreeSet<String>,
  counter: usize,
}

impl IdentAllocator {
  pub fn new(prefix: &str, reserved: BTreeSet<String>) -> Result<Self, CompileError> {
    if !prefix.is_empty() && !is_css_identifier_valid(prefix) {
      return Err(CompileError::InvalidPrefix(prefix.to_string()));
    }

    Ok(Self {
      prefix: prefix.to_string(),
      reserved,
      counter: 0,
    })
  }

  pub fn next_ident(&mut self) -> String {
    loop {
      self.counter += 1;
      let candidate = format!("{}{}", self.prefix, encode(self.counter));
      if self.reserved.contains(&candidate) {
        tracing::debug!("Skipping reserved class name {}", candidate);
        continue;
      }
      return candidate;
    }
  }
}

/// Bijective base-52 rendering of `n` (1-based).
fn encode(mut n: usize) -> String {
  let mut digits = Vec::new();
  while n > 0 {
    n -= 1;
    digits.push(ALPHABET[n % ALPHABET.len()]);
    n /= ALPHABET.len();
  }
  digits.reverse();
  digits.into_iter().map(char::from).collect()
}

fn is_css_identifier_valid(value: &str) -> bool {
  let mut chars = value.chars();
  match chars.next() {
    Some(first) if is_identifier_start(first) => chars.all(is_identifier_continue),
    _ => false,
  }
}

fn is_identifier_start(ch: char) -> bool {
  ch.is_ascii_alphabetic() || ch == '-' || ch == '_'
}

fn is_identifier_continue(ch: char) -> bool {
  ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}
