//! Decoding of Part 21 string literals.
//!
//! The lexer keeps string contents in their encoded form. This module turns
//! that text into the logical string:
//!
//! | Encoded            | Decoded                                   |
//! |--------------------|-------------------------------------------|
//! | `''`               | `'`                                       |
//! | `\\`               | `\`                                       |
//! | `\X\HH`            | one character in the range U+0000..U+00FF |
//! | `\X2\HHHH...\X0\`  | UTF-16 code units                         |
//! | `\X4\00HHHHHH...\X0\` | Unicode code points                    |
//!
//! Anything else containing `'` or `\` is rejected as a whole.

use thiserror::Error;

/// A string literal that does not follow the Part 21 escape grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid STEP string '{raw}' (at offset {offset})")]
pub struct InvalidString {
    /// The encoded text that failed to decode.
    pub raw: String,
    /// Byte offset of the first unparseable chunk.
    pub offset: usize,
}

/// Decode the raw text of a string attribute.
pub fn decode_string(raw: &str) -> Result<String, InvalidString> {
    let mut scanner = Scanner {
        raw,
        bytes: raw.as_bytes(),
        pos: 0,
    };
    let mut out = String::with_capacity(raw.len());
    while scanner.pos < scanner.bytes.len() {
        let chunk_start = scanner.pos;
        scanner
            .chunk(&mut out)
            .ok_or_else(|| InvalidString {
                raw: raw.to_owned(),
                offset: chunk_start,
            })?;
    }
    Ok(out)
}

struct Scanner<'a> {
    raw: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl Scanner<'_> {
    /// Consume one chunk, appending its decoded text. `None` on malformed input.
    fn chunk(&mut self, out: &mut String) -> Option<()> {
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|&b| b != b'\'' && b != b'\\')
        {
            self.pos += 1;
        }
        if self.pos > start {
            // Quote and backslash are ASCII, so the run ends on a char boundary.
            out.push_str(&self.raw[start..self.pos]);
            return Some(());
        }

        if self.eat("''") {
            out.push('\'');
        } else if self.eat("\\\\") {
            out.push('\\');
        } else if self.eat("\\X\\") {
            let code = self.hex(2)?;
            out.push(char::from_u32(code)?);
        } else if self.eat("\\X2\\") {
            let mut units = Vec::new();
            while !self.eat("\\X0\\") {
                units.push(u16::try_from(self.hex(4)?).ok()?);
            }
            for ch in char::decode_utf16(units) {
                out.push(ch.ok()?);
            }
        } else if self.eat("\\X4\\") {
            while !self.eat("\\X0\\") {
                if !self.eat("00") {
                    return None;
                }
                out.push(char::from_u32(self.hex(6)?)?);
            }
        } else {
            return None;
        }
        Some(())
    }

    fn eat(&mut self, literal: &str) -> bool {
        if self.bytes[self.pos..].starts_with(literal.as_bytes()) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    /// Read exactly `digits` hex digits, most significant first.
    fn hex(&mut self, digits: usize) -> Option<u32> {
        let end = self.pos.checked_add(digits)?;
        let slice = self.bytes.get(self.pos..end)?;
        let mut value = 0u32;
        for &b in slice {
            value = value * 16 + (b as char).to_digit(16)?;
        }
        self.pos = end;
        Some(value)
    }
}
