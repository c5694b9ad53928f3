use log::trace;
use crate::grammar::*;
use crate::options::PredicateMode;
use super::{SymbolSet, SymbolTable};

/// Per-statement attributes while they are being driven to a fixed point,
/// indexed like `Grammar::statements`.
pub(super) struct Sets<'g> {
  grammar: &'g Grammar,
  symbols: &'g SymbolTable,
  predicates: PredicateMode,
  nullable: Vec<bool>,
  first: Vec<SymbolSet>,
  follow: Vec<SymbolSet>,
}

impl<'g> Sets<'g> {
  pub(super) fn new(
    grammar: &'g Grammar,
    symbols: &'g SymbolTable,
    predicates: PredicateMode,
  ) -> Self {
    let n = grammar.statements.len();
    let empty = SymbolSet::new(symbols.len());
    Sets {
      grammar,
      symbols,
      predicates,
      nullable: vec![false; n],
      first: vec![empty.clone(); n],
      follow: vec![empty; n],
    }
  }

  pub(super) fn into_parts(self) -> (Vec<bool>, Vec<SymbolSet>, Vec<SymbolSet>) {
    (self.nullable, self.first, self.follow)
  }

  /// Returns the number of passes until nothing changed.
  pub(super) fn gen_nullable(&mut self) -> usize {
    let grammar = self.grammar;
    let mut passes = 0;

    loop {
      let mut changed = false;
      for (i, stmt) in grammar.statements.iter().enumerate() {
        if !self.nullable[i] && self.expression_nullable(&stmt.expression) {
          trace!("nullable: {}", stmt.name);
          self.nullable[i] = true;
          changed = true;
        }
      }
      passes += 1;
      if !changed {
        break;
      }
    }

    passes
  }

  /// Requires stable nullability.
  pub(super) fn gen_first(&mut self) -> usize {
    let mut buf = SymbolSet::new(self.symbols.len());
    let mut passes = 1;
    while self.pass_first(&mut buf) {
      passes += 1;
    }
    passes
  }

  /// One scan over every statement; returns whether any FIRST set grew.
  fn pass_first(&mut self, buf: &mut SymbolSet) -> bool {
    let grammar = self.grammar;
    let mut changed = false;
    for (i, stmt) in grammar.statements.iter().enumerate() {
      buf.clear();
      self.expression_first(&stmt.expression, buf);
      if self.first[i].union_with(buf) {
        trace!("first: {} grew to {:?}", stmt.name, self.first[i]);
        changed = true;
      }
    }
    changed
  }

  /// Requires stable nullability and FIRST sets.
  pub(super) fn gen_follow(&mut self) -> usize {
    let mut passes = 1;
    while self.pass_follow() {
      passes += 1;
    }
    passes
  }

  fn pass_follow(&mut self) -> bool {
    let grammar = self.grammar;
    let mut changed = false;
    for (i, stmt) in grammar.statements.iter().enumerate() {
      let follow = self.follow[i].clone();
      changed |= self.expression_follow(&stmt.expression, &follow);
    }
    changed
  }

  fn zero_width(&self, element: &Element) -> bool {
    element.predicate.is_some() && self.predicates == PredicateMode::ZeroWidth
  }

  fn expression_nullable(&self, expression: &Expression) -> bool {
    expression.components.iter().any(|c| self.component_nullable(c))
  }

  fn component_nullable(&self, component: &Component) -> bool {
    component.elements.iter().all(|e| self.element_nullable(e))
  }

  fn element_nullable(&self, element: &Element) -> bool {
    self.zero_width(element)
      || element.allows_zero()
      || self.term_nullable(&element.term)
  }

  fn term_nullable(&self, term: &Term) -> bool {
    match term {
      Term::String(_) => false,
      Term::Identifier(name) => self.grammar.rule_index(name)
        .map_or(false, |i| self.nullable[i]),
      Term::Expression(expression) => self.expression_nullable(expression),
    }
  }

  fn expression_first(&self, expression: &Expression, result: &mut SymbolSet) {
    for component in &expression.components {
      self.component_first(component, result);
    }
  }

  /// Elements after the first non-nullable one cannot start the component.
  fn component_first(&self, component: &Component, result: &mut SymbolSet) {
    for element in &component.elements {
      self.element_first(element, result);
      if !self.element_nullable(element) {
        return;
      }
    }
  }

  fn element_first(&self, element: &Element, result: &mut SymbolSet) {
    if !self.zero_width(element) {
      self.term_first(&element.term, result);
    }
  }

  fn term_first(&self, term: &Term, result: &mut SymbolSet) {
    match term {
      Term::String(value) => {
        if let Some(id) = self.symbols.literal(value) {
          result.insert(id);
        }
      }
      Term::Identifier(name) => match self.grammar.rule_index(name) {
        Some(i) => {
          result.union_with(&self.first[i]);
        }
        None => {
          if let Some(id) = self.symbols.undefined(name) {
            result.insert(id);
          }
        }
      },
      Term::Expression(expression) => self.expression_first(expression, result),
    }
  }

  /// Propagates `follow`, the symbols that may follow `expression` in its
  /// context, down to the rules it references. Returns whether any rule's
  /// FOLLOW set grew.
  fn expression_follow(&mut self, expression: &Expression, follow: &SymbolSet) -> bool {
    let mut changed = false;
    for component in &expression.components {
      changed |= self.component_follow(component, follow);
    }
    changed
  }

  fn component_follow(&mut self, component: &Component, follow: &SymbolSet) -> bool {
    let mut changed = false;
    let mut local = SymbolSet::new(self.symbols.len());

    for (i, element) in component.elements.iter().enumerate() {
      local.clear();
      let mut reaches_end = true;
      for next in &component.elements[i + 1..] {
        self.element_first(next, &mut local);
        if !self.element_nullable(next) {
          reaches_end = false;
          break;
        }
      }
      if reaches_end {
        local.union_with(follow);
      }
      changed |= self.element_follow(element, &local);
    }

    changed
  }

  fn element_follow(&mut self, element: &Element, follow: &SymbolSet) -> bool {
    if self.zero_width(element) {
      return false;
    }
    if element.repeats() {
      // a repetition may be followed by its own first symbols
      let mut local = follow.clone();
      self.element_first(element, &mut local);
      self.term_follow(&element.term, &local)
    } else {
      self.term_follow(&element.term, follow)
    }
  }

  fn term_follow(&mut self, term: &Term, follow: &SymbolSet) -> bool {
    match term {
      Term::String(_) => false,
      Term::Identifier(name) => match self.grammar.rule_index(name) {
        Some(i) => {
          let changed = self.follow[i].union_with(follow);
          if changed {
            trace!("follow: {} grew to {:?}", name, self.follow[i]);
          }
          changed
        }
        None => false,
      },
      Term::Expression(expression) => self.expression_follow(expression, follow),
    }
  }
}
