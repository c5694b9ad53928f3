use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// 1-based line and column of a character in the grammar source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
  pub line: u32,
  pub column: u32,
}

impl Location {
  pub fn new(line: u32, column: u32) -> Self {
    Location { line, column }
  }
}

impl Default for Location {
  fn default() -> Self {
    Location::new(1, 1)
  }
}

impl Display for Location {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "{}:{}", self.line, self.column)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
  Lexical,
  Syntax,
  DuplicateRule,
}

/// A located error message about a grammar source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub source: String,
  pub location: Location,
  pub kind: DiagnosticKind,
  pub message: String,
}

impl Display for Diagnostic {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "{}:{}: {}", self.source, self.location, self.message)
  }
}

/// Receives every diagnostic reported while parsing.
pub trait DiagnosticSink {
  fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
  fn report(&mut self, diagnostic: Diagnostic) {
    self.push(diagnostic);
  }
}

/// Forwards diagnostics to the `log` facade at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
  fn report(&mut self, diagnostic: Diagnostic) {
    log::error!("{}", diagnostic);
  }
}

/// Errors detected by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
  #[error("invalid character `{0}`")]
  InvalidCharacter(char),
  #[error("unterminated string")]
  UnterminatedString,
  #[error("newline in string")]
  NewlineInString,
  #[error("invalid escape sequence `\\{0}`")]
  InvalidEscape(char),
}

/// Errors detected by the parser. `found` describes the offending
/// token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
  #[error("expected rule name at the beginning of statement, found {found}")]
  ExpectedRuleName { found: String },
  #[error("expected `=` after rule name, found {found}")]
  ExpectedDefine { found: String },
  #[error("expected `;` at the end of statement, found {found}")]
  ExpectedSemicolon { found: String },
  #[error("expected `)` at the end of group, found {found}")]
  ExpectedCloseParen { found: String },
  #[error("invalid term {found}")]
  InvalidTerm { found: String },
  #[error("rule `{name}` is already defined at {previous}")]
  DuplicateRule { name: String, previous: Location },
}

/// Returned by `parse` when any diagnostic was reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{source_name}: {count} error(s) in grammar")]
pub struct Error {
  pub source_name: String,
  pub count: usize,
}
