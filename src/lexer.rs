use crate::diagnostic::{LexError, Location};
use crate::options::Dialect;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
  LParen,
  RParen,
  /// `=`, or `:` when the dialect allows it.
  Define,
  Semicolon,
  Pipe,
  Star,
  Plus,
  Question,
  Tilde,
  Ampersand,
  Identifier,
  String,
  /// A character that starts no token.
  Invalid,
  End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
  pub kind: TokenKind,
  /// Source text of the token; quotes included for strings.
  pub text: &'a str,
  pub location: Location,
  /// Lexical fault found in this token, with its own location.
  pub error: Option<(LexError, Location)>,
}

impl<'a> Token<'a> {
  /// Human-readable description used in syntax error messages.
  pub fn describe(&self) -> String {
    match self.kind {
      TokenKind::End => "end of input".to_owned(),
      _ => format!("`{}`", self.text),
    }
  }
}

/// Splits grammar source into tokens, skipping whitespace and `#` comments.
///
/// Malformed input never stops the lexer: the faulty token carries an
/// error and lexing resumes right after the offending character or string.
/// A malformed string is still a `String` token.
pub struct Lexer<'a> {
  src: &'a str,
  pos: usize,
  line: u32,
  column: u32,
  dialect: Dialect,
}

impl<'a> Lexer<'a> {
  pub fn new(src: &'a str, dialect: Dialect) -> Self {
    Lexer {
      src,
      pos: 0,
      line: 1,
      column: 1,
      dialect,
    }
  }

  fn location(&self) -> Location {
    Location::new(self.line, self.column)
  }

  fn peek(&self) -> Option<char> {
    self.src[self.pos..].chars().next()
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek()?;
    self.pos += c.len_utf8();
    match (c, self.dialect.tab_stop) {
      ('\n', _) => {
        self.line += 1;
        self.column = 1;
      }
      ('\t', Some(stop)) if stop > 0 => {
        self.column = ((self.column - 1) / stop + 1) * stop + 1;
      }
      _ => self.column += 1,
    }
    Some(c)
  }

  fn skip_trivia(&mut self) {
    while let Some(c) = self.peek() {
      if c == '#' {
        while let Some(c) = self.bump() {
          if c == '\n' {
            break;
          }
        }
      } else if c.is_whitespace() {
        self.bump();
      } else {
        break;
      }
    }
  }

  /// Returns the next token. Once the input is exhausted every call returns
  /// an `End` token.
  pub fn next_token(&mut self) -> Token<'a> {
    self.skip_trivia();

    let start = self.pos;
    let location = self.location();
    let mut error = None;
    let c = match self.bump() {
      Some(c) => c,
      None => {
        return Token {
          kind: TokenKind::End,
          text: "",
          location,
          error,
        };
      }
    };

    let kind = match c {
      '(' => TokenKind::LParen,
      ')' => TokenKind::RParen,
      '=' => TokenKind::Define,
      ':' if self.dialect.colon_define => TokenKind::Define,
      ';' => TokenKind::Semicolon,
      '|' => TokenKind::Pipe,
      '*' => TokenKind::Star,
      '+' => TokenKind::Plus,
      '?' => TokenKind::Question,
      '~' => TokenKind::Tilde,
      '&' => TokenKind::Ampersand,
      '"' => {
        error = self.string(c, location);
        TokenKind::String
      }
      '\'' if self.dialect.single_quotes => {
        error = self.string(c, location);
        TokenKind::String
      }
      c if is_ident_start(c) => {
        while self.peek().map_or(false, is_ident_continue) {
          self.bump();
        }
        TokenKind::Identifier
      }
      c => {
        error = Some((LexError::InvalidCharacter(c), location));
        TokenKind::Invalid
      }
    };

    Token {
      kind,
      text: &self.src[start..self.pos],
      location,
      error,
    }
  }

  /// Lexes a string whose opening `quote`, at `start`, was just consumed.
  /// An unterminated string is reported at `start`, other faults where they
  /// occur.
  fn string(
    &mut self,
    quote: char,
    start: Location,
  ) -> Option<(LexError, Location)> {
    self.string_body(quote)
      .err()
      .map(|(err, at)| (err, at.unwrap_or(start)))
  }

  fn string_body(
    &mut self,
    quote: char,
  ) -> Result<(), (LexError, Option<Location>)> {
    let mut invalid = None;
    loop {
      let location = self.location();
      match self.peek() {
        None => return Err((LexError::UnterminatedString, None)),
        // the newline itself is left for the next token
        Some('\n') => {
          return Err((LexError::NewlineInString, Some(location)));
        }
        Some('\\') => {
          self.bump();
          let escape_location = self.location();
          match self.peek() {
            None => return Err((LexError::UnterminatedString, None)),
            Some('\n') => {
              return Err((LexError::NewlineInString, Some(escape_location)));
            }
            Some(c) => {
              self.bump();
              if !self.dialect.validate_escapes || is_simple_escape(c) {
                continue;
              }
              if c.is_digit(8) {
                for _ in 0..2 {
                  if !self.peek().map_or(false, |c| c.is_digit(8)) {
                    break;
                  }
                  self.bump();
                }
              } else if invalid.is_none() {
                invalid = Some((LexError::InvalidEscape(c), Some(location)));
              }
            }
          }
        }
        Some(c) => {
          self.bump();
          if c == quote {
            break;
          }
        }
      }
    }

    match invalid {
      Some(err) => Err(err),
      None => Ok(()),
    }
  }
}

impl<'a> Iterator for Lexer<'a> {
  type Item = Token<'a>;

  fn next(&mut self) -> Option<Token<'a>> {
    let token = self.next_token();
    match token.kind {
      TokenKind::End => None,
      _ => Some(token),
    }
  }
}

fn is_ident_start(c: char) -> bool {
  c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
  c.is_ascii_alphanumeric() || c == '_'
}

fn is_simple_escape(c: char) -> bool {
  "abfnrtv\\\"'".contains(c)
}
