//! Part 21 parser: builds raw header and data records from tokens.
//!
//! The parser does not interpret entity semantics and does not check that
//! references point anywhere; that is the job of [`crate::resolve`].

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::StepError;
use crate::lexer::{Lexer, Position, SpannedToken, Token};
use crate::model::{Attribute, Entity, EntityId, EntityRecord, TypeName};

/// Deepest nesting of parameter lists, counting the record's own list.
const MAX_NESTING: usize = 128;

/// The unresolved content of a STEP file.
///
/// References inside attributes are plain ids that may not exist yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFile {
    /// Header section records, in file order.
    pub header: Vec<EntityRecord>,
    /// Data section instances, keyed by id.
    pub entities: BTreeMap<EntityId, Entity>,
}

/// Parse a STEP file from text.
pub fn parse(input: &str) -> Result<RawFile, StepError> {
    Parser::parse(input.as_bytes())
}

/// Parser for Part 21 STEP files.
pub struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    depth: usize,
    entity: Option<EntityId>,
}

impl Parser {
    /// Parse a STEP file from bytes.
    pub fn parse(input: &[u8]) -> Result<RawFile, StepError> {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize()?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
            entity: None,
        };
        let file = parser.parse_file()?;
        debug!(
            header = file.header.len(),
            entities = file.entities.len(),
            "parsed exchange structure"
        );
        Ok(file)
    }

    fn parse_file(&mut self) -> Result<RawFile, StepError> {
        let mut file = RawFile::default();

        self.expect_keyword("ISO-10303-21")?;
        self.expect_token(&Token::Semi)?;

        loop {
            if self.check_keyword("HEADER") {
                self.advance();
                self.expect_token(&Token::Semi)?;
                file.header = self.parse_header_section()?;
                self.expect_keyword("ENDSEC")?;
                self.expect_token(&Token::Semi)?;
            } else if self.check_keyword("DATA") {
                self.advance();
                // DATA may carry a parameter list in edition 3 files.
                if self.check_token(&Token::Open) {
                    self.parse_args()?;
                }
                self.expect_token(&Token::Semi)?;
                self.parse_data_section(&mut file.entities)?;
                self.expect_keyword("ENDSEC")?;
                self.expect_token(&Token::Semi)?;
            } else if self.check_keyword("END-ISO-10303-21") {
                self.advance();
                self.expect_token(&Token::Semi)?;
                return Ok(file);
            } else {
                return Err(self.unexpected("a section keyword"));
            }
        }
    }

    fn parse_header_section(&mut self) -> Result<Vec<EntityRecord>, StepError> {
        let mut records = Vec::new();
        while !self.check_keyword("ENDSEC") && !self.is_at_end() {
            // Header entities don't have IDs, just type and args
            let record = self.parse_record(None)?;
            self.expect_token(&Token::Semi)?;
            records.push(record);
        }
        Ok(records)
    }

    fn parse_data_section(
        &mut self,
        entities: &mut BTreeMap<EntityId, Entity>,
    ) -> Result<(), StepError> {
        while let Some(Token::Ref(id)) = self.peek().map(|t| t.token.clone()) {
            self.advance();
            self.expect_token(&Token::Equals)?;

            let entity = if self.check_token(&Token::Open) {
                self.advance();
                let mut records = Vec::new();
                while !self.check_token(&Token::Close) {
                    records.push(self.parse_record(Some(id))?);
                }
                self.advance();
                if records.is_empty() {
                    return Err(StepError::parser(Some(id), "complex entity has no records"));
                }
                Entity::Complex(records)
            } else {
                Entity::Simple(self.parse_record(Some(id))?)
            };
            self.expect_token(&Token::Semi)?;

            if entities.insert(id, entity).is_some() {
                return Err(StepError::parser(Some(id), "duplicate entity id"));
            }
        }
        Ok(())
    }

    fn parse_record(&mut self, id: Option<EntityId>) -> Result<EntityRecord, StepError> {
        self.entity = id;
        let type_name = match self.peek().map(|t| t.token.clone()) {
            Some(Token::Name(name)) => {
                self.advance();
                TypeName::new(name)
            }
            other => {
                return Err(StepError::parser(
                    id,
                    format!("expected type name, got {other:?}"),
                ));
            }
        };
        let attributes = self.parse_args()?;
        Ok(EntityRecord {
            type_name,
            attributes,
        })
    }

    fn parse_args(&mut self) -> Result<Vec<Attribute>, StepError> {
        if self.depth == MAX_NESTING {
            return Err(StepError::parser(self.entity, "nesting too deep"));
        }
        self.depth += 1;
        let args = self.parse_arg_list();
        self.depth -= 1;
        args
    }

    fn parse_arg_list(&mut self) -> Result<Vec<Attribute>, StepError> {
        self.expect_token(&Token::Open)?;
        let mut args = Vec::new();
        if !self.check_token(&Token::Close) {
            args.push(self.parse_value()?);
            while self.check_token(&Token::Comma) {
                self.advance();
                args.push(self.parse_value()?);
            }
        }
        self.expect_token(&Token::Close)?;
        Ok(args)
    }

    fn parse_value(&mut self) -> Result<Attribute, StepError> {
        let Some(tok) = self.peek().map(|t| t.token.clone()) else {
            return Err(self.unexpected("a value"));
        };
        let value = match tok {
            Token::Ref(id) => Attribute::Reference(id),
            Token::String(s) => Attribute::String(s),
            Token::Float(v) => Attribute::Float(v),
            Token::Int(v) => Attribute::Int(v),
            Token::Enum(s) => match s.as_str() {
                "T" => Attribute::Bool(true),
                "F" => Attribute::Bool(false),
                _ => Attribute::Enum(s),
            },
            Token::Star => Attribute::Derived,
            Token::Unset => Attribute::Null,
            Token::Open => return Ok(Attribute::List(self.parse_args()?)),
            Token::Name(name) => {
                // Typed parameter: TYPE_NAME(value)
                self.advance();
                let mut args = self.parse_args()?;
                if args.len() != 1 {
                    return Err(StepError::parser(
                        None,
                        format!("typed parameter {name} takes one value, got {}", args.len()),
                    ));
                }
                let inner = args.remove(0);
                return Ok(Attribute::Typed(TypeName::new(name), Box::new(inner)));
            }
            _ => return Err(self.unexpected("a value")),
        };
        self.advance();
        Ok(value)
    }

    fn peek(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&SpannedToken> {
        let tok = self.tokens.get(self.pos);
        self.pos += 1;
        tok
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check_token(&self, expected: &Token) -> bool {
        self.peek().is_some_and(|t| &t.token == expected)
    }

    fn check_keyword(&self, name: &str) -> bool {
        matches!(self.peek(), Some(SpannedToken { token: Token::Name(k), .. }) if k == name)
    }

    fn unexpected(&self, expected: &str) -> StepError {
        match self.peek() {
            Some(SpannedToken {
                token,
                pos: Position { line, col },
            }) => StepError::lexer(*line, *col, format!("expected {expected}, got {token:?}")),
            None => StepError::parser(None, format!("expected {expected}, got end of input")),
        }
    }

    fn expect_token(&mut self, expected: &Token) -> Result<(), StepError> {
        if self.check_token(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("{expected:?}")))
        }
    }

    fn expect_keyword(&mut self, name: &str) -> Result<(), StepError> {
        if self.check_keyword(name) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("keyword '{name}'")))
        }
    }
}
