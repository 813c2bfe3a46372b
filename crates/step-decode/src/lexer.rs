//! Tokenizer for the Part 21 exchange structure.
//!
//! String literals are returned exactly as written between the quotes;
//! [`crate::escape`] turns them into text later. Type names and enumeration
//! literals are upper-cased, since Part 21 identifiers are case-insensitive.

use crate::error::StepError;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Type name or section keyword, upper-cased.
    Name(String),
    /// Instance name such as `#12`.
    Ref(u64),
    /// String literal, still encoded.
    String(String),
    /// Real literal.
    Float(f64),
    /// Integer literal.
    Int(i64),
    /// Enumeration literal without its dots, upper-cased.
    Enum(String),
    /// `(`
    Open,
    /// `)`
    Close,
    /// `,`
    Comma,
    /// `;`
    Semi,
    /// `=`
    Equals,
    /// `*`
    Star,
    /// `$`
    Unset,
}

/// 1-based line and column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    /// Line number.
    pub line: usize,
    /// Column number, counted in bytes.
    pub col: usize,
}

/// A token and where it starts.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    /// The token.
    pub token: Token,
    /// Start position.
    pub pos: Position,
}

fn punctuation(ch: u8) -> Option<Token> {
    Some(match ch {
        b'(' => Token::Open,
        b')' => Token::Close,
        b',' => Token::Comma,
        b';' => Token::Semi,
        b'=' => Token::Equals,
        b'*' => Token::Star,
        b'$' => Token::Unset,
        _ => return None,
    })
}

/// Byte-oriented lexer over a whole file.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    here: Position,
}

impl<'a> Lexer<'a> {
    /// Start lexing `input` from the top.
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            here: Position { line: 1, col: 1 },
        }
    }

    /// Lex everything up to the end of input.
    pub fn tokenize(&mut self) -> Result<Vec<SpannedToken>, StepError> {
        std::iter::from_fn(|| self.next_token().transpose()).collect()
    }

    /// The next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<SpannedToken>, StepError> {
        self.skip_trivia()?;

        let pos = self.here;
        let Some(ch) = self.peek(0) else {
            return Ok(None);
        };

        let token = if let Some(token) = punctuation(ch) {
            self.bump();
            token
        } else {
            match ch {
                b'#' => self.reference(pos)?,
                b'\'' => self.string(pos)?,
                b'.' => self.enumeration(pos)?,
                b'-' | b'+' if self.peek(1).is_some_and(|c| c.is_ascii_digit()) => self.number(pos)?,
                b'0'..=b'9' => self.number(pos)?,
                b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.name(),
                _ => {
                    return Err(error_at(
                        pos,
                        format!("unexpected character: '{}'", ch as char),
                    ))
                }
            }
        };

        Ok(Some(SpannedToken { token, pos }))
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn bump(&mut self) {
        if let Some(&ch) = self.input.get(self.pos) {
            self.pos += 1;
            if ch == b'\n' {
                self.here.line += 1;
                self.here.col = 1;
            } else {
                self.here.col += 1;
            }
        }
    }

    fn bump_if(&mut self, pred: impl Fn(u8) -> bool) -> bool {
        let hit = self.peek(0).is_some_and(pred);
        if hit {
            self.bump();
        }
        hit
    }

    /// Whitespace and `/* ... */` comments.
    fn skip_trivia(&mut self) -> Result<(), StepError> {
        loop {
            while self.bump_if(|ch| ch.is_ascii_whitespace()) {}

            if (self.peek(0), self.peek(1)) != (Some(b'/'), Some(b'*')) {
                return Ok(());
            }
            let start = self.here;
            self.bump();
            self.bump();
            while (self.peek(0), self.peek(1)) != (Some(b'*'), Some(b'/')) {
                if self.peek(0).is_none() {
                    return Err(error_at(start, "unterminated comment"));
                }
                self.bump();
            }
            self.bump();
            self.bump();
        }
    }

    /// Consume a run of bytes matching `pred`.
    fn span_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a [u8] {
        let input = self.input;
        let start = self.pos;
        while self.bump_if(&pred) {}
        &input[start..self.pos]
    }

    fn reference(&mut self, pos: Position) -> Result<Token, StepError> {
        self.bump();
        let digits = ascii(self.span_while(|ch| ch.is_ascii_digit()));
        if digits.is_empty() {
            return Err(error_at(pos, "expected digits after '#'"));
        }
        match digits.parse() {
            Ok(0) => Err(error_at(pos, "entity ID must be positive: #0")),
            Ok(id) => Ok(Token::Ref(id)),
            Err(_) => Err(error_at(pos, format!("invalid entity ID: {digits}"))),
        }
    }

    fn string(&mut self, pos: Position) -> Result<Token, StepError> {
        self.bump();
        let start = self.pos;
        loop {
            match (self.peek(0), self.peek(1)) {
                (None, _) => return Err(error_at(pos, "unterminated string")),
                // A doubled quote stays in the raw text.
                (Some(b'\''), Some(b'\'')) => {
                    self.bump();
                    self.bump();
                }
                (Some(b'\''), _) => break,
                (Some(_), _) => self.bump(),
            }
        }
        let raw = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| error_at(pos, "string is not valid UTF-8"))?
            .to_owned();
        self.bump();
        Ok(Token::String(raw))
    }

    fn enumeration(&mut self, pos: Position) -> Result<Token, StepError> {
        self.bump();
        let name = ascii(self.span_while(|ch| ch.is_ascii_alphanumeric() || ch == b'_'));
        match self.peek(0) {
            Some(b'.') => self.bump(),
            Some(ch) => {
                return Err(error_at(
                    pos,
                    format!("invalid character in enumeration: '{}'", ch as char),
                ))
            }
            None => return Err(error_at(pos, "unterminated enumeration")),
        }
        if name.is_empty() {
            return Err(error_at(pos, "empty enumeration"));
        }
        Ok(Token::Enum(name.to_ascii_uppercase()))
    }

    fn number(&mut self, pos: Position) -> Result<Token, StepError> {
        let start = self.pos;
        self.bump_if(|ch| ch == b'-' || ch == b'+');
        self.span_while(|ch| ch.is_ascii_digit());

        // A real always has a decimal point; the fraction may be empty (`2.`).
        let mut real = false;
        if self.bump_if(|ch| ch == b'.') {
            real = true;
            self.span_while(|ch| ch.is_ascii_digit());
        }
        if self.bump_if(|ch| ch == b'E' || ch == b'e') {
            real = true;
            self.bump_if(|ch| ch == b'-' || ch == b'+');
            self.span_while(|ch| ch.is_ascii_digit());
        }

        let text = ascii(&self.input[start..self.pos]);
        if real {
            text.parse()
                .map(Token::Float)
                .map_err(|_| error_at(pos, format!("invalid real number: {text}")))
        } else {
            text.parse()
                .map(Token::Int)
                .map_err(|_| error_at(pos, format!("invalid integer: {text}")))
        }
    }

    fn name(&mut self) -> Token {
        // `-` for ISO-10303-21 and END-ISO-10303-21.
        let name = ascii(self.span_while(|ch| ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'-'));
        Token::Name(name.to_ascii_uppercase())
    }
}

fn error_at(pos: Position, message: impl Into<String>) -> StepError {
    StepError::lexer(pos.line, pos.col, message)
}

/// Text of a span made only of ASCII bytes.
fn ascii(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
