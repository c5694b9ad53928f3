//! Nullability, FIRST and FOLLOW computation over a parsed grammar.

use indexmap::IndexMap;
use log::debug;
use crate::grammar::*;
use crate::options::PredicateMode;

mod sets;
mod symbol_set;

pub use symbol_set::{Iter, SymbolId, SymbolSet};

use sets::Sets;

/// The terminal alphabet of a grammar: string literals and identifiers that
/// name no rule, numbered in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
  literals: IndexMap<String, SymbolId>,
  undefined: IndexMap<String, SymbolId>,
  symbols: Vec<Symbol>,
}

impl SymbolTable {
  fn collect(grammar: &Grammar) -> Self {
    let mut table = SymbolTable::default();
    for stmt in &grammar.statements {
      table.collect_expression(grammar, &stmt.expression);
    }
    table
  }

  fn collect_expression(&mut self, grammar: &Grammar, expression: &Expression) {
    for component in &expression.components {
      for element in &component.elements {
        match &element.term {
          Term::String(value) => {
            self.intern(value, true);
          }
          Term::Identifier(name) => {
            if grammar.rule_index(name).is_none() {
              self.intern(name, false);
            }
          }
          Term::Expression(expression) => {
            self.collect_expression(grammar, expression);
          }
        }
      }
    }
  }

  fn intern(&mut self, name: &str, literal: bool) -> SymbolId {
    let (map, symbol) = if literal {
      (&mut self.literals, Symbol::Literal(name.to_owned()))
    } else {
      (&mut self.undefined, Symbol::Undefined(name.to_owned()))
    };
    if let Some(&id) = map.get(name) {
      return id;
    }

    let id = SymbolId(self.symbols.len() as u32);
    map.insert(name.to_owned(), id);
    self.symbols.push(symbol);
    id
  }

  pub fn len(&self) -> usize {
    self.symbols.len()
  }

  pub fn is_empty(&self) -> bool {
    self.symbols.is_empty()
  }

  pub fn symbol(&self, id: SymbolId) -> &Symbol {
    &self.symbols[id.0 as usize]
  }

  pub fn literal(&self, value: &str) -> Option<SymbolId> {
    self.literals.get(value).copied()
  }

  pub fn undefined(&self, name: &str) -> Option<SymbolId> {
    self.undefined.get(name).copied()
  }

  pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
    self.symbols.iter()
      .enumerate()
      .map(|(i, symbol)| (SymbolId(i as u32), symbol))
  }
}

/// Computes nullability, FIRST and FOLLOW for every statement, replacing
/// whatever a previous analysis attached.
pub fn analyze(grammar: &mut Grammar, predicates: PredicateMode) {
  let symbols = SymbolTable::collect(grammar);
  debug!("{} rules, {} terminal symbols", grammar.rules.len(), symbols.len());

  let mut sets = Sets::new(grammar, &symbols, predicates);
  let passes = sets.gen_nullable();
  debug!("nullable: fixed point after {} passes", passes);
  let passes = sets.gen_first();
  debug!("first: fixed point after {} passes", passes);
  let passes = sets.gen_follow();
  debug!("follow: fixed point after {} passes", passes);
  let (nullable, first, follow) = sets.into_parts();

  let attrs = nullable.into_iter().zip(first).zip(follow);
  for (stmt, ((nullable, first), follow)) in grammar.statements.iter_mut().zip(attrs) {
    stmt.nullable = nullable;
    stmt.first = first;
    stmt.follow = follow;
  }
  grammar.symbols = symbols;
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::diagnostic::{Diagnostic, Location};
  use insta::assert_snapshot;
  use pretty_assertions::assert_eq;

  fn grammar(rules: Vec<(&str, Expression)>) -> Grammar {
    let statements = rules.into_iter()
      .enumerate()
      .map(|(i, (name, expr))| {
        Statement::new(name, Location::new(i as u32 + 1, 1), expr)
      })
      .collect();
    Grammar::new(statements)
  }

  fn names(grammar: &Grammar, set: &SymbolSet) -> Vec<String> {
    let mut names = grammar.resolve(set)
      .map(|s| s.to_string())
      .collect::<Vec<_>>();
    names.sort();
    names
  }

  #[test]
  fn symbol_table() {
    let g = grammar(vec![
      ("s", (seq([string("a").elem(), ident("x").elem(), ident("t").elem()])
        | seq([group(string("b")).many(), string("a").elem()])).into()),
      ("t", string("b").into()),
    ]);
    let table = SymbolTable::collect(&g);

    let symbols = table.iter()
      .map(|(id, s)| (id.0, s.clone()))
      .collect::<Vec<_>>();
    assert_eq!(symbols, vec![
      (0, Symbol::Literal("a".to_owned())),
      (1, Symbol::Undefined("x".to_owned())),
      (2, Symbol::Literal("b".to_owned())),
    ]);
    assert_eq!(table.literal("b"), Some(SymbolId(2)));
    assert_eq!(table.undefined("t"), None);
  }

  #[test]
  fn sequence() {
    let mut g = grammar(vec![
      ("a", seq([string("x").elem(), string("y").elem()]).into()),
    ]);
    analyze(&mut g, PredicateMode::ZeroWidth);

    let a = g.rule("a").unwrap();
    assert!(!a.nullable);
    assert_eq!(names(&g, &a.first), vec!["\"x\""]);
    assert!(a.follow.is_empty());
  }

  #[test]
  fn nullable_through_reference() {
    let mut g = grammar(vec![
      ("a", ident("b").into()),
      ("b", seq([string("x").optional()]).into()),
    ]);
    analyze(&mut g, PredicateMode::ZeroWidth);

    assert!(g.rule("a").unwrap().nullable);
    assert!(g.rule("b").unwrap().nullable);
    assert_eq!(names(&g, &g.rule("a").unwrap().first), vec!["\"x\""]);
  }

  #[test]
  fn reanalysis_is_idempotent() {
    let mut g = grammar(vec![
      ("a", seq([string("x").elem(), ident("a").many()]).into()),
    ]);
    analyze(&mut g, PredicateMode::ZeroWidth);
    let before = g.statements().to_vec();
    analyze(&mut g, PredicateMode::ZeroWidth);

    assert_eq!(g.statements(), &before[..]);
    assert_eq!(names(&g, &g.rule("a").unwrap().follow), vec!["\"x\""]);
  }

  fn summary(src: &str) -> String {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let grammar = crate::build(src, "test.g", &mut diagnostics).unwrap();
    grammar.statements()
      .iter()
      .map(|stmt| format!("{} nullable={} first={{{}}} follow={{{}}}",
        stmt.name,
        stmt.nullable,
        names(&grammar, &stmt.first).join(", "),
        names(&grammar, &stmt.follow).join(", ")))
      .collect::<Vec<_>>()
      .join("\n")
  }

  #[test]
  fn arithmetic() {
    let src = r#"
      expr = term ("+" term)* ;
      term = factor ("*" factor)* ;
      factor = NUM | "(" expr ")" ;
    "#;

    assert_snapshot!(summary(src), @r###"
    expr nullable=false first={"(", NUM} follow={")"}
    term nullable=false first={"(", NUM} follow={")", "+"}
    factor nullable=false first={"(", NUM} follow={")", "*", "+"}
    "###);
  }

  #[test]
  fn nullable_prefixes() {
    let src = r#"
      Z = "d" | X Y Z ;
      Y = "c"? ;
      X = Y | "a" ;
    "#;

    assert_snapshot!(summary(src), @r###"
    Z nullable=false first={"a", "c", "d"} follow={}
    Y nullable=true first={"c"} follow={"a", "c", "d"}
    X nullable=true first={"a", "c"} follow={"a", "c", "d"}
    "###);
  }

  #[test]
  fn lists() {
    let src = r#"
      list = "[" items? "]" ;
      items = item ("," item)* ","? ;
      item = ID | list ;
    "#;

    assert_snapshot!(summary(src), @r###"
    list nullable=false first={"["} follow={",", "]"}
    items nullable=false first={"[", ID} follow={"]"}
    item nullable=false first={"[", ID} follow={",", "]"}
    "###);
  }
}
