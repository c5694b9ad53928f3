use indexmap::IndexMap;
use log::{debug, trace};
use crate::diagnostic::*;
use crate::grammar::*;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::options::{DuplicatePolicy, Options};

type ParseResult<T> = Result<T, (SyntaxError, Location)>;

/// Single-token lookahead recursive descent parser. Statements that fail to
/// parse are reported and skipped up to the next `;`.
pub(crate) struct Parser<'a, 's> {
  lexer: Lexer<'a>,
  token: Token<'a>,
  source: &'a str,
  duplicates: DuplicatePolicy,
  sink: &'s mut dyn DiagnosticSink,
  errors: usize,
}

impl<'a, 's> Parser<'a, 's> {
  pub(crate) fn new(
    src: &'a str,
    source: &'a str,
    options: &Options,
    sink: &'s mut dyn DiagnosticSink,
  ) -> Self {
    let mut parser = Parser {
      lexer: Lexer::new(src, options.dialect),
      token: Token {
        kind: TokenKind::End,
        text: "",
        location: Location::default(),
        error: None,
      },
      source,
      duplicates: options.duplicates,
      sink,
      errors: 0,
    };
    parser.advance();
    parser
  }

  /// Moves to the next token, reporting lexical errors on the way, and
  /// returns the token that was current. Invalid characters are skipped,
  /// malformed strings are kept.
  fn advance(&mut self) -> Token<'a> {
    loop {
      let token = self.lexer.next_token();
      if let Some((err, location)) = &token.error {
        self.report(DiagnosticKind::Lexical, *location, err.to_string());
      }
      if token.kind == TokenKind::Invalid {
        continue;
      }
      return std::mem::replace(&mut self.token, token);
    }
  }

  fn report(&mut self, kind: DiagnosticKind, location: Location, message: String) {
    self.errors += 1;
    self.sink.report(Diagnostic {
      source: self.source.to_owned(),
      location,
      kind,
      message,
    });
  }

  fn unexpected(
    &self,
    make: impl FnOnce(String) -> SyntaxError,
  ) -> (SyntaxError, Location) {
    (make(self.token.describe()), self.token.location)
  }

  /// Discards tokens up to and including the next `;`.
  fn recover(&mut self) {
    loop {
      let token = self.advance();
      match token.kind {
        TokenKind::Semicolon | TokenKind::End => break,
        _ => trace!("discarding {}", token.describe()),
      }
    }
  }

  pub(crate) fn parse_grammar(mut self) -> Result<Grammar, Error> {
    let mut statements = Vec::new();
    let mut defined = IndexMap::<String, Location>::new();

    while self.token.kind != TokenKind::End {
      let stmt = match self.parse_statement() {
        Ok(stmt) => stmt,
        Err((err, location)) => {
          self.report(DiagnosticKind::Syntax, location, err.to_string());
          self.recover();
          continue;
        }
      };

      match defined.get(&stmt.name) {
        Some(&previous) if self.duplicates == DuplicatePolicy::Reject => {
          let err = SyntaxError::DuplicateRule {
            name: stmt.name.clone(),
            previous,
          };
          self.report(DiagnosticKind::DuplicateRule, stmt.location, err.to_string());
        }
        Some(&previous) => {
          debug!("{}: rule `{}` at {} shadows the one at {}",
            self.source, stmt.name, stmt.location, previous);
        }
        None => {
          defined.insert(stmt.name.clone(), stmt.location);
        }
      }
      statements.push(stmt);
    }

    debug!("{}: {} statements, {} errors", self.source, statements.len(), self.errors);
    if self.errors > 0 {
      return Err(Error {
        source_name: self.source.to_owned(),
        count: self.errors,
      });
    }
    Ok(Grammar::new(statements))
  }

  /// statement = identifier '=' expression ';'
  fn parse_statement(&mut self) -> ParseResult<Statement> {
    let location = self.token.location;
    if self.token.kind != TokenKind::Identifier {
      return Err(self.unexpected(|found| SyntaxError::ExpectedRuleName { found }));
    }
    let name = self.advance().text;

    if self.token.kind != TokenKind::Define {
      return Err(self.unexpected(|found| SyntaxError::ExpectedDefine { found }));
    }
    self.advance();

    let expression = self.parse_expression()?;

    if self.token.kind != TokenKind::Semicolon {
      return Err(self.unexpected(|found| SyntaxError::ExpectedSemicolon { found }));
    }
    self.advance();

    Ok(Statement::new(name, location, expression))
  }

  /// expression = component ('|' component)*
  fn parse_expression(&mut self) -> ParseResult<Expression> {
    let mut components = vec![self.parse_component()?];
    while self.token.kind == TokenKind::Pipe {
      self.advance();
      components.push(self.parse_component()?);
    }
    Ok(Expression { components })
  }

  /// component = element+
  fn parse_component(&mut self) -> ParseResult<Component> {
    let mut elements = vec![self.parse_element()?];
    loop {
      match self.token.kind {
        TokenKind::Pipe
        | TokenKind::Semicolon
        | TokenKind::RParen
        | TokenKind::End => break,
        _ => elements.push(self.parse_element()?),
      }
    }
    Ok(Component { elements })
  }

  /// element = (['~' | '&'] term) | (term ['*' | '+' | '?'])
  fn parse_element(&mut self) -> ParseResult<Element> {
    let predicate = match self.token.kind {
      TokenKind::Tilde => Some(Predicate::Not),
      TokenKind::Ampersand => Some(Predicate::And),
      _ => None,
    };
    if predicate.is_some() {
      self.advance();
      return Ok(Element {
        predicate,
        term: self.parse_term()?,
        modifier: None,
      });
    }

    let term = self.parse_term()?;
    let modifier = match self.token.kind {
      TokenKind::Star => Some(Modifier::ZeroOrMore),
      TokenKind::Plus => Some(Modifier::OneOrMore),
      TokenKind::Question => Some(Modifier::Optional),
      _ => None,
    };
    if modifier.is_some() {
      self.advance();
    }

    Ok(Element {
      predicate: None,
      term,
      modifier,
    })
  }

  /// term = identifier | string | '(' expression ')'
  fn parse_term(&mut self) -> ParseResult<Term> {
    match self.token.kind {
      TokenKind::Identifier => {
        Ok(Term::Identifier(self.advance().text.to_owned()))
      }
      TokenKind::String => {
        Ok(Term::String(unquote(self.advance().text).to_owned()))
      }
      TokenKind::LParen => {
        self.advance();
        let expression = self.parse_expression()?;
        if self.token.kind != TokenKind::RParen {
          return Err(self.unexpected(|found| SyntaxError::ExpectedCloseParen { found }));
        }
        self.advance();
        Ok(Term::Expression(Box::new(expression)))
      }
      _ => Err(self.unexpected(|found| SyntaxError::InvalidTerm { found })),
    }
  }
}

/// Strips the quotes off a string token; a malformed one may lack the
/// closing quote.
fn unquote(text: &str) -> &str {
  let mut chars = text.chars();
  match chars.next() {
    Some(quote) => {
      let rest = chars.as_str();
      rest.strip_suffix(quote).unwrap_or(rest)
    }
    None => text,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::options::Dialect;
  use pretty_assertions::assert_eq;

  fn parse_with(src: &str, options: &Options) -> (Option<Grammar>, Vec<String>) {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let grammar = Parser::new(src, "test.g", options, &mut diagnostics)
      .parse_grammar()
      .ok();
    let messages = diagnostics.iter().map(|d| d.to_string()).collect();
    (grammar, messages)
  }

  fn parse(src: &str) -> (Option<Grammar>, Vec<String>) {
    parse_with(src, &Options::default())
  }

  fn extended(src: &str) -> (Option<Grammar>, Vec<String>) {
    let options = Options {
      dialect: Dialect::extended(),
      ..Options::default()
    };
    parse_with(src, &options)
  }

  fn expressions(src: &str) -> Vec<(String, Expression)> {
    expressions_from(parse(src))
  }

  fn expressions_from(
    (grammar, messages): (Option<Grammar>, Vec<String>),
  ) -> Vec<(String, Expression)> {
    assert_eq!(messages, Vec::<String>::new());
    grammar.unwrap()
      .statements()
      .iter()
      .map(|s| (s.name.clone(), s.expression.clone()))
      .collect()
  }

  #[test]
  fn statements() {
    let src = r#"
      expr = term ("+" term)* ;
      term = NUM | "(" expr ")" ;
    "#;

    assert_eq!(expressions(src), vec![
      ("expr".to_owned(), seq([
        ident("term").elem(),
        group(seq([string("+").elem(), ident("term").elem()])).many(),
      ]).into()),
      ("term".to_owned(), Component::from(ident("NUM"))
        | seq([string("(").elem(), ident("expr").elem(), string(")").elem()])),
    ]);
  }

  #[test]
  fn modifiers_and_predicates() {
    let src = "a = b? c+ ~d &e 'f'* ;";

    assert_eq!(expressions_from(extended(src)), vec![
      ("a".to_owned(), seq([
        ident("b").optional(),
        ident("c").some(),
        ident("d").not(),
        ident("e").and(),
        string("f").many(),
      ]).into()),
    ]);
  }

  #[test]
  fn nested_groups() {
    let src = "a : ((b | c) \"d\")+ | e ;";

    assert_eq!(expressions_from(extended(src)), vec![
      ("a".to_owned(), seq([
        group(
          seq([group(Component::from(ident("b")) | Component::from(ident("c"))).elem(),
               string("d").elem()])).some(),
      ]) | Component::from(ident("e"))),
    ]);
  }

  #[test]
  fn statement_locations() {
    let (grammar, _) = parse("a = b;\n\n  c = \"x\";");
    let locations = grammar.unwrap()
      .statements()
      .iter()
      .map(|s| s.location)
      .collect::<Vec<_>>();

    assert_eq!(locations, vec![Location::new(1, 1), Location::new(3, 3)]);
  }

  #[test]
  fn empty_source() {
    let (grammar, messages) = parse("  # nothing here\n");

    assert!(grammar.unwrap().statements().is_empty());
    assert!(messages.is_empty());
  }

  #[test]
  fn structural_errors() {
    let cases = vec![
      ("= b;", "test.g:1:1: expected rule name at the beginning of statement, found `=`"),
      ("a b;", "test.g:1:3: expected `=` after rule name, found `b`"),
      ("a = b", "test.g:1:6: expected `;` at the end of statement, found end of input"),
      ("a = (b | c;", "test.g:1:11: expected `)` at the end of group, found `;`"),
      ("a = ;", "test.g:1:5: invalid term `;`"),
      ("a = b | ;", "test.g:1:9: invalid term `;`"),
      ("a = ~b*;", "test.g:1:7: invalid term `*`"),
    ];

    for (src, expected) in cases {
      let (grammar, messages) = parse(src);
      assert!(grammar.is_none(), "{}", src);
      assert_eq!(messages, vec![expected.to_owned()], "{}", src);
    }
  }

  #[test]
  fn recovery_resumes_at_next_statement() {
    let src = "a = \"x\";\nb = ( c ;\nc = \"y\" d;\nd = c*;";
    let (grammar, messages) = parse(src);

    assert!(grammar.is_none());
    assert_eq!(messages, vec![
      "test.g:2:9: expected `)` at the end of group, found `;`".to_owned(),
    ]);
  }

  #[test]
  fn every_bad_statement_is_reported() {
    let src = "a = ;\nb = \"x\";\nc \"y\";\nd = (e;";
    let (_, messages) = parse(src);

    assert_eq!(messages, vec![
      "test.g:1:5: invalid term `;`".to_owned(),
      "test.g:3:3: expected `=` after rule name, found `\"y\"`".to_owned(),
      "test.g:4:7: expected `)` at the end of group, found `;`".to_owned(),
    ]);
  }

  #[test]
  fn lexical_errors_fail_the_parse() {
    let (grammar, messages) = extended("a = \"x\" $ b;\nc = \"bad\\q\";");

    assert!(grammar.is_none());
    assert_eq!(messages, vec![
      "test.g:1:9: invalid character `$`".to_owned(),
      "test.g:2:9: invalid escape sequence `\\q`".to_owned(),
    ]);
  }

  #[test]
  fn malformed_string_keeps_statement_shape() {
    let (grammar, messages) = parse("a = \"abc\nb;\nc = d;");

    assert!(grammar.is_none());
    assert_eq!(messages, vec![
      "test.g:1:9: newline in string".to_owned(),
    ]);
  }

  #[test]
  fn any_escape_in_canonical_dialect() {
    let (grammar, messages) = parse(r#"a = "a\qb" "\"";"#);

    assert!(messages.is_empty());
    assert_eq!(grammar.unwrap().rule("a").unwrap().expression, Expression::from(
      seq([string(r"a\qb").elem(), string(r#"\""#).elem()])));
  }

  #[test]
  fn duplicate_rules() {
    let src = "a = \"x\";\na = \"y\";";

    let (grammar, messages) = parse(src);
    let grammar = grammar.unwrap();
    assert!(messages.is_empty());
    assert_eq!(grammar.statements().len(), 2);
    assert_eq!(grammar.rule("a").unwrap().expression, Expression::from(string("y")));

    let options = Options {
      duplicates: DuplicatePolicy::Reject,
      ..Options::default()
    };
    let (grammar, messages) = parse_with(src, &options);
    assert!(grammar.is_none());
    assert_eq!(messages, vec![
      "test.g:2:1: rule `a` is already defined at 1:1".to_owned(),
    ]);
  }

  #[test]
  fn canonical_dialect_rejects_colon() {
    let (grammar, messages) = parse("a : b;");

    assert!(grammar.is_none());
    assert_eq!(messages, vec![
      "test.g:1:3: invalid character `:`".to_owned(),
      "test.g:1:5: expected `=` after rule name, found `b`".to_owned(),
    ]);
  }
}
