// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Literal values found inside `VALUES (...)` rows

#[cfg(feature = "bigdecimal")]
use bigdecimal::BigDecimal;
use std::fmt;
use std::io::BufRead;

use super::cursor::Cursor;
use super::parser::{expect_literal, ParserError};

/// Kind of a literal, decided by its first byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    /// 'quoted' or "quoted" string, escapes kept raw
    String,
    /// Optionally signed decimal number, e.g. `-12.50`
    Number,
    /// `NULL`
    Null,
}

impl LiteralKind {
    /// Classify a value by its first significant byte.
    pub fn classify(byte: u8) -> Option<LiteralKind> {
        match byte {
            b'\'' | b'"' => Some(LiteralKind::String),
            b'-' | b'0'..=b'9' => Some(LiteralKind::Number),
            b'N' => Some(LiteralKind::Null),
            _ => None,
        }
    }
}

impl fmt::Display for LiteralKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            LiteralKind::String => "string",
            LiteralKind::Number => "number",
            LiteralKind::Null => "null",
        })
    }
}

/// A literal and the exact bytes it was read from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    pub kind: LiteralKind,
    pub bytes: Vec<u8>,
}

impl Literal {
    /// Read a literal of the given kind from the cursor.
    pub fn parse<R: BufRead>(kind: LiteralKind, cursor: &mut Cursor<R>) -> Result<Literal, ParserError> {
        match kind {
            LiteralKind::String => parse_string(cursor),
            LiteralKind::Number => parse_number(cursor),
            LiteralKind::Null => parse_null(cursor),
        }
    }

    /// Numeric value of a number literal.
    #[cfg(feature = "bigdecimal")]
    pub fn to_decimal(&self) -> Option<BigDecimal> {
        match self.kind {
            LiteralKind::Number => std::str::from_utf8(&self.bytes).ok()?.parse().ok(),
            LiteralKind::String | LiteralKind::Null => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.bytes))
    }
}

/// Read a quoted string, quotes included.
///
/// A backslash always takes the following byte with it, so `\'` and `\\`
/// never close the string. Escapes are copied, not decoded.
pub fn parse_string<R: BufRead>(cursor: &mut Cursor<R>) -> Result<Literal, ParserError> {
    let line = cursor.line();
    let quote = next_byte(cursor, "string literal")?;
    if quote != b'\'' && quote != b'"' {
        return Err(ParserError::unexpected(b"'", &[quote], line));
    }

    let mut bytes = vec![quote];
    loop {
        let byte = next_byte(cursor, "string literal")?;
        bytes.push(byte);
        if byte == b'\\' {
            bytes.push(next_byte(cursor, "string literal")?);
        } else if byte == quote {
            break;
        }
    }

    Ok(Literal {
        kind: LiteralKind::String,
        bytes,
    })
}

/// Read `-?[0-9]+(\.[0-9]+)?` exactly as written.
pub fn parse_number<R: BufRead>(cursor: &mut Cursor<R>) -> Result<Literal, ParserError> {
    let mut bytes = vec![];
    if cursor.peek(1)? == b"-" {
        cursor.discard(1)?;
        bytes.push(b'-');
    }

    take_digits(cursor, &mut bytes)?;

    if cursor.peek(1)? == b"." {
        cursor.discard(1)?;
        bytes.push(b'.');
        take_digits(cursor, &mut bytes)?;
    }

    Ok(Literal {
        kind: LiteralKind::Number,
        bytes,
    })
}

/// Read the exact keyword `NULL`. A bare `N` is rejected.
pub fn parse_null<R: BufRead>(cursor: &mut Cursor<R>) -> Result<Literal, ParserError> {
    expect_literal(cursor, b"NULL", "NULL literal")?;
    Ok(Literal {
        kind: LiteralKind::Null,
        bytes: b"NULL".to_vec(),
    })
}

fn next_byte<R: BufRead>(cursor: &mut Cursor<R>, parsing: &'static str) -> Result<u8, ParserError> {
    let line = cursor.line();
    cursor
        .read_byte()?
        .ok_or(ParserError::UnexpectedEnd { parsing, line })
}

// One or more ASCII digits.
fn take_digits<R: BufRead>(cursor: &mut Cursor<R>, bytes: &mut Vec<u8>) -> Result<(), ParserError> {
    let start = bytes.len();
    loop {
        let line = cursor.line();
        let next = cursor.peek(1)?.first().copied();
        match next {
            Some(digit) if digit.is_ascii_digit() => {
                bytes.push(digit);
                cursor.discard(1)?;
            }
            Some(other) if bytes.len() == start => {
                return Err(ParserError::unexpected_char(other, line));
            }
            None if bytes.len() == start => {
                return Err(ParserError::UnexpectedEnd {
                    parsing: "number literal",
                    line,
                });
            }
            _ => return Ok(()),
        }
    }
}
