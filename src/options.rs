/// Knobs controlling tokenizing, the rule index and predicate analysis.
#[derive(Debug, Clone, Default)]
pub struct Options {
  pub dialect: Dialect,
  pub duplicates: DuplicatePolicy,
  pub predicates: PredicateMode,
}

/// Lexical dialect of the grammar source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
  /// Accept `'...'` strings besides `"..."`.
  pub single_quotes: bool,
  /// Accept `:` as a definition operator besides `=`.
  pub colon_define: bool,
  /// Reject escape sequences other than the C ones and octal escapes.
  pub validate_escapes: bool,
  /// `None` advances the column by one for every character, `Some(n)` moves
  /// a tab to the next multiple-of-n column.
  pub tab_stop: Option<u32>,
}

/// The canonical dialect: `"..."` strings, `=` only, a backslash escapes
/// whatever character follows it, one column per character.
impl Default for Dialect {
  fn default() -> Self {
    Dialect {
      single_quotes: false,
      colon_define: false,
      validate_escapes: false,
      tab_stop: None,
    }
  }
}

impl Dialect {
  /// Every extension switched on: both quote styles, `:` definitions,
  /// checked escapes and 4-column tab stops.
  pub fn extended() -> Self {
    Dialect {
      single_quotes: true,
      colon_define: true,
      validate_escapes: true,
      tab_stop: Some(4),
    }
  }
}

/// What happens when two statements define the same rule name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
  /// The later definition shadows the earlier one in the rule index.
  LastWins,
  /// The later definition is reported as an error.
  Reject,
}

impl Default for DuplicatePolicy {
  fn default() -> Self {
    DuplicatePolicy::LastWins
  }
}

/// How `~` and `&` prefixed elements are analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateMode {
  /// Lookaround consumes no input: the element is nullable and contributes
  /// nothing to FIRST or FOLLOW.
  ZeroWidth,
  /// The predicate is ignored and the element is analyzed like its term.
  Transparent,
}

impl Default for PredicateMode {
  fn default() -> Self {
    PredicateMode::ZeroWidth
  }
}
