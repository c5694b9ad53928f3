//! Static analysis of context-free grammars written in a small EBNF
//! dialect: nullability, FIRST and FOLLOW sets for every rule.
//!
//! ```text
//! statement  = identifier '=' expression ';'
//! expression = component ('|' component)*
//! component  = element+
//! element    = (['~' | '&'] term) | (term ['*' | '+' | '?'])
//! term       = identifier | string | '(' expression ')'
//! ```

pub mod analysis;
pub mod diagnostic;
pub mod grammar;
pub mod options;
mod lexer;
mod parser;

pub use analysis::{SymbolId, SymbolSet, SymbolTable};
pub use diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink, Error, Location, LogSink};
pub use grammar::{Grammar, Statement, Symbol};
pub use options::{Dialect, DuplicatePolicy, Options, PredicateMode};

/// Parses `source`, reporting every lexical and syntax error to `sink` as
/// `<name>:<line>:<column>: <message>`. Fails if anything was reported.
pub fn parse(
  source: &str,
  name: &str,
  sink: &mut dyn DiagnosticSink,
) -> Result<Grammar, Error> {
  parse_with(source, name, &Options::default(), sink)
}

pub fn parse_with(
  source: &str,
  name: &str,
  options: &Options,
  sink: &mut dyn DiagnosticSink,
) -> Result<Grammar, Error> {
  parser::Parser::new(source, name, options, sink).parse_grammar()
}

/// Attaches nullability, FIRST and FOLLOW to every statement.
pub fn analyze(grammar: &mut Grammar) {
  analyze_with(grammar, &Options::default())
}

pub fn analyze_with(grammar: &mut Grammar, options: &Options) {
  analysis::analyze(grammar, options.predicates)
}

/// `parse` followed by `analyze`.
pub fn build(
  source: &str,
  name: &str,
  sink: &mut dyn DiagnosticSink,
) -> Result<Grammar, Error> {
  build_with(source, name, &Options::default(), sink)
}

pub fn build_with(
  source: &str,
  name: &str,
  options: &Options,
  sink: &mut dyn DiagnosticSink,
) -> Result<Grammar, Error> {
  let mut grammar = parse_with(source, name, options, sink)?;
  analyze_with(&mut grammar, options);
  Ok(grammar)
}
