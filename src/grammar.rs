use std::fmt::{self, Display, Formatter};
use std::ops::BitOr;
use indexmap::IndexMap;
use crate::analysis::{SymbolSet, SymbolTable};
use crate::diagnostic::Location;

/// A parsed grammar: statements in source order plus an index from rule
/// name to the statement defining it.
#[derive(Debug, Clone)]
pub struct Grammar {
  pub(crate) statements: Vec<Statement>,
  /// rule name -> index of the last statement defining it
  pub(crate) rules: IndexMap<String, usize>,
  pub(crate) symbols: SymbolTable,
}

/// A rule definition, `name = expression ;`, with its derived attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
  pub name: String,
  pub location: Location,
  pub expression: Expression,
  pub nullable: bool,
  pub first: SymbolSet,
  pub follow: SymbolSet,
}

/// Alternatives; non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
  pub components: Vec<Component>,
}

/// A concatenation; non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
  pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
  pub predicate: Option<Predicate>,
  pub term: Term,
  pub modifier: Option<Modifier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
  /// A rule reference, or a terminal when no rule has this name.
  Identifier(String),
  /// Literal text between the quotes, escapes left as written.
  String(String),
  Expression(Box<Expression>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
  /// `*`
  ZeroOrMore,
  /// `+`
  OneOrMore,
  /// `?`
  Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
  /// `~`
  Not,
  /// `&`
  And,
}

/// A terminal symbol of FIRST and FOLLOW sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
  Literal(String),
  /// An identifier that names no rule.
  Undefined(String),
}

impl Display for Symbol {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    match self {
      Symbol::Literal(s) => write!(f, "\"{}\"", s),
      Symbol::Undefined(name) => write!(f, "{}", name),
    }
  }
}

impl Grammar {
  pub(crate) fn new(statements: Vec<Statement>) -> Self {
    let rules = statements.iter()
      .enumerate()
      .map(|(i, stmt)| (stmt.name.clone(), i))
      .collect();

    Grammar {
      statements,
      rules,
      symbols: SymbolTable::default(),
    }
  }

  pub fn statements(&self) -> &[Statement] {
    &self.statements
  }

  /// The statement a reference to `name` resolves to.
  pub fn rule(&self, name: &str) -> Option<&Statement> {
    self.rules.get(name).map(|&i| &self.statements[i])
  }

  pub(crate) fn rule_index(&self, name: &str) -> Option<usize> {
    self.rules.get(name).copied()
  }

  /// Terminal symbols interned by the last analysis.
  pub fn symbols(&self) -> &SymbolTable {
    &self.symbols
  }

  /// Symbols of a FIRST or FOLLOW set, in interning order.
  pub fn resolve<'g>(
    &'g self,
    set: &'g SymbolSet,
  ) -> impl Iterator<Item = &'g Symbol> + 'g {
    set.iter().map(move |id| self.symbols.symbol(id))
  }
}

impl Statement {
  pub fn new(
    name: impl Into<String>,
    location: Location,
    expression: Expression,
  ) -> Self {
    Statement {
      name: name.into(),
      location,
      expression,
      nullable: false,
      first: SymbolSet::default(),
      follow: SymbolSet::default(),
    }
  }
}

impl Element {
  /// Whether the element may match more than once.
  pub fn repeats(&self) -> bool {
    matches!(self.modifier, Some(Modifier::ZeroOrMore) | Some(Modifier::OneOrMore))
  }

  /// Whether the modifier alone permits zero occurrences.
  pub fn allows_zero(&self) -> bool {
    matches!(self.modifier, Some(Modifier::ZeroOrMore) | Some(Modifier::Optional))
  }
}

pub fn ident(
  name: impl Into<String>,
) -> Term {
  Term::Identifier(name.into())
}

pub fn string(
  value: impl Into<String>,
) -> Term {
  Term::String(value.into())
}

pub fn group(
  expression: impl Into<Expression>,
) -> Term {
  Term::Expression(Box::new(expression.into()))
}

pub fn seq<const N: usize>(
  elements: [Element; N],
) -> Component {
  Component {
    elements: Vec::from(elements),
  }
}

impl Term {
  pub fn elem(self) -> Element {
    Element {
      predicate: None,
      term: self,
      modifier: None,
    }
  }

  pub fn many(self) -> Element {
    self.modified(Modifier::ZeroOrMore)
  }

  pub fn some(self) -> Element {
    self.modified(Modifier::OneOrMore)
  }

  pub fn optional(self) -> Element {
    self.modified(Modifier::Optional)
  }

  pub fn not(self) -> Element {
    self.predicated(Predicate::Not)
  }

  pub fn and(self) -> Element {
    self.predicated(Predicate::And)
  }

  fn modified(self, modifier: Modifier) -> Element {
    Element {
      modifier: Some(modifier),
      ..self.elem()
    }
  }

  fn predicated(self, predicate: Predicate) -> Element {
    Element {
      predicate: Some(predicate),
      ..self.elem()
    }
  }
}

impl From<Term> for Element {
  fn from(term: Term) -> Element {
    term.elem()
  }
}

impl From<Element> for Component {
  fn from(element: Element) -> Component {
    Component {
      elements: vec![element],
    }
  }
}

impl From<Term> for Component {
  fn from(term: Term) -> Component {
    term.elem().into()
  }
}

impl From<Component> for Expression {
  fn from(component: Component) -> Expression {
    Expression {
      components: vec![component],
    }
  }
}

impl From<Term> for Expression {
  fn from(term: Term) -> Expression {
    Component::from(term).into()
  }
}

impl BitOr for Component {
  type Output = Expression;

  fn bitor(self, rhs: Component) -> Expression {
    Expression {
      components: vec![self, rhs],
    }
  }
}

impl BitOr<Component> for Expression {
  type Output = Expression;

  fn bitor(mut self, rhs: Component) -> Expression {
    self.components.push(rhs);
    self
  }
}
