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

//! Dump rewriter
//!
//! Streams a mysqldump file from input to output. Lines starting with
//! ``INSERT INTO ` `` are parsed with the grammar
//!
//! ```text
//!   insert ::= 'INSERT INTO `' table '`' ' VALUES ' row { blanks ',' blanks row } blanks ';' '\n'
//!   row    ::= '(' value { ',' value } ')'
//!   value  ::= blanks ( string | number | 'NULL' )
//! ```
//!
//! and every byte is written back as soon as it is consumed, except the
//! values that have a configured replacement. Any other line is copied
//! unchanged.

use log::debug;
use std::io::{self, BufRead, Write};

use super::cursor::{Cursor, DEFAULT_LINE_CAPACITY};
use super::literal::{Literal, LiteralKind};
use super::replacement::ReplacementTable;

/// Start of every statement handled by the rewriter
pub const INSERT_PREFIX: &[u8] = b"INSERT INTO `";
const VALUES_KEYWORD: &[u8] = b" VALUES ";

#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    /// The input does not match the expected token
    #[error("expected {expected:?}, got {found:?} at line {line}")]
    Unexpected {
        expected: String,
        found: String,
        line: u64,
    },
    #[error("unexpected character {found:?} at line {line}")]
    UnexpectedChar { found: String, line: u64 },
    /// The input ended inside a statement
    #[error("unexpected end of input while parsing {parsing} at line {line}")]
    UnexpectedEnd { parsing: &'static str, line: u64 },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ParserError {
    pub(crate) fn unexpected(expected: &[u8], found: &[u8], line: u64) -> Self {
        ParserError::Unexpected {
            expected: String::from_utf8_lossy(expected).into_owned(),
            found: String::from_utf8_lossy(found).into_owned(),
            line,
        }
    }

    pub(crate) fn unexpected_char(found: u8, line: u64) -> Self {
        ParserError::UnexpectedChar {
            found: String::from_utf8_lossy(&[found]).into_owned(),
            line,
        }
    }
}

/// Consume `expected` from the cursor or fail without consuming anything.
pub(crate) fn expect_literal<R: BufRead>(
    cursor: &mut Cursor<R>,
    expected: &[u8],
    parsing: &'static str,
) -> Result<(), ParserError> {
    let line = cursor.line();
    let found = cursor.peek(expected.len())?;
    if found != expected {
        if found.len() < expected.len() && expected.starts_with(found) {
            return Err(ParserError::UnexpectedEnd { parsing, line });
        }
        return Err(ParserError::unexpected(expected, found, line));
    }
    cursor.discard(expected.len())?;
    Ok(())
}

fn is_blank(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Log every literal and its replacement
    pub verbose: bool,
    /// Largest chunk copied at once for lines that are not inserts
    pub line_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            verbose: false,
            line_capacity: DEFAULT_LINE_CAPACITY,
        }
    }
}

/// Outcome of [`Rewriter::process_statement`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A statement or line was copied, more input may follow
    Continue,
    /// The input ended cleanly between statements
    Done,
}

/// Counters collected while rewriting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub statements: usize,
    pub rows: usize,
    pub literals: usize,
    pub replaced: usize,
}

/// Streaming rewriter of a mysqldump file
pub struct Rewriter<'a, R, W> {
    cursor: Cursor<R>,
    output: W,
    replacements: &'a ReplacementTable,
    config: Config,
    summary: Summary,
}

impl<'a, R: BufRead, W: Write> Rewriter<'a, R, W> {
    pub fn new(input: R, output: W, replacements: &'a ReplacementTable, config: Config) -> Self {
        Rewriter {
            cursor: Cursor::with_line_capacity(input, config.line_capacity),
            output,
            replacements,
            config,
            summary: Summary::default(),
        }
    }

    /// Rewrite the whole input and flush the output.
    pub fn run(&mut self) -> Result<Summary, ParserError> {
        while let Step::Continue = self.process_statement()? {}
        self.output.flush()?;
        debug!("rewrite finished: {:?}", self.summary);
        Ok(self.summary)
    }

    /// Rewrite one `INSERT` statement or copy one other line.
    pub fn process_statement(&mut self) -> Result<Step, ParserError> {
        if self.cursor.peek(INSERT_PREFIX.len())? == INSERT_PREFIX {
            self.process_insert()?;
            Ok(Step::Continue)
        } else {
            self.copy_line()
        }
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    pub fn into_inner(self) -> W {
        self.output
    }

    fn copy_line(&mut self) -> Result<Step, ParserError> {
        loop {
            let chunk = match self.cursor.read_line()? {
                Some(chunk) => chunk,
                None => return Ok(Step::Done),
            };
            self.output.write_all(&chunk.bytes)?;
            if !chunk.truncated {
                return Ok(if chunk.ends_line() {
                    Step::Continue
                } else {
                    Step::Done
                });
            }
        }
    }

    fn process_insert(&mut self) -> Result<(), ParserError> {
        self.expect(INSERT_PREFIX, "INSERT prefix")?;
        let table = self.process_table_name()?;
        debug!(
            "insert into `{}` at line {}",
            String::from_utf8_lossy(&table),
            self.cursor.line()
        );
        self.expect(VALUES_KEYWORD, "VALUES keyword")?;
        self.process_rows(&table)?;
        self.summary.statements += 1;
        Ok(())
    }

    // Table name runs up to the next backtick. Backticks inside the name
    // are not supported; they make the VALUES check fail.
    fn process_table_name(&mut self) -> Result<Vec<u8>, ParserError> {
        let mut name = vec![];
        loop {
            match self.take_byte("table name")? {
                b'`' => return Ok(name),
                byte => name.push(byte),
            }
        }
    }

    fn process_rows(&mut self, table: &[u8]) -> Result<(), ParserError> {
        loop {
            self.process_blanks()?;
            self.process_row(table)?;
            self.process_blanks()?;

            let line = self.cursor.line();
            match self.take_byte("row list")? {
                b',' => continue,
                b';' => {
                    let line = self.cursor.line();
                    let byte = self.take_byte("statement terminator")?;
                    if byte != b'\n' {
                        return Err(ParserError::unexpected(b"\n", &[byte], line));
                    }
                    return Ok(());
                }
                other => return Err(ParserError::unexpected_char(other, line)),
            }
        }
    }

    fn process_row(&mut self, table: &[u8]) -> Result<(), ParserError> {
        let line = self.cursor.line();
        let open = self.take_byte("row")?;
        if open != b'(' {
            return Err(ParserError::unexpected(b"(", &[open], line));
        }

        let mut column = 0;
        loop {
            self.process_value(table, column)?;

            let line = self.cursor.line();
            match self.take_byte("row")? {
                b')' => {
                    self.summary.rows += 1;
                    return Ok(());
                }
                b',' => column += 1,
                other => return Err(ParserError::unexpected(b")", &[other], line)),
            }
        }
    }

    fn process_value(&mut self, table: &[u8], column: usize) -> Result<(), ParserError> {
        self.process_blanks()?;

        let line = self.cursor.line();
        let first = match self.cursor.peek(1)?.first().copied() {
            Some(byte) => byte,
            None => {
                return Err(ParserError::UnexpectedEnd {
                    parsing: "value",
                    line,
                })
            }
        };
        let kind = LiteralKind::classify(first)
            .ok_or_else(|| ParserError::unexpected_char(first, line))?;

        let literal = Literal::parse(kind, &mut self.cursor)?;
        self.write_with_replacement(table, column, &literal)
    }

    fn process_blanks(&mut self) -> Result<(), ParserError> {
        loop {
            let line = self.cursor.line();
            match self.cursor.read_byte()? {
                Some(byte) if is_blank(byte) => self.output.write_all(&[byte])?,
                Some(_) => return Ok(self.cursor.unread_byte()?),
                None => {
                    return Err(ParserError::UnexpectedEnd {
                        parsing: "INSERT statement",
                        line,
                    })
                }
            }
        }
    }

    fn write_with_replacement(
        &mut self,
        table: &[u8],
        column: usize,
        literal: &Literal,
    ) -> Result<(), ParserError> {
        let replacements = self.replacements;
        self.summary.literals += 1;

        match replacements.lookup(table, column) {
            Some(replacement) => {
                if self.config.verbose {
                    debug!(
                        "{} literal: {} -> {}",
                        literal.kind,
                        literal,
                        String::from_utf8_lossy(replacement)
                    );
                }
                self.summary.replaced += 1;
                self.output.write_all(replacement)?;
            }
            None => {
                if self.config.verbose {
                    debug!("{} literal: {}", literal.kind, literal);
                }
                self.output.write_all(&literal.bytes)?;
            }
        }
        Ok(())
    }

    // Read one byte and copy it to the output before it is checked.
    fn take_byte(&mut self, parsing: &'static str) -> Result<u8, ParserError> {
        let line = self.cursor.line();
        let byte = self
            .cursor
            .read_byte()?
            .ok_or(ParserError::UnexpectedEnd { parsing, line })?;
        self.output.write_all(&[byte])?;
        Ok(byte)
    }

    fn expect(&mut self, expected: &[u8], parsing: &'static str) -> Result<(), ParserError> {
        expect_literal(&mut self.cursor, expected, parsing)?;
        self.output.write_all(expected)?;
        Ok(())
    }
}

/// Rewrite `input` into `output` in one go.
pub fn rewrite<R: BufRead, W: Write>(
    input: R,
    output: W,
    replacements: &ReplacementTable,
    config: Config,
) -> Result<Summary, ParserError> {
    Rewriter::new(input, output, replacements, config).run()
}
