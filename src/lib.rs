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

//! Streaming mysqldump INSERT value redactor
//!
//! This crate rewrites the values of the `INSERT INTO` statements of a
//! mysqldump file on the fly, leaving every other byte untouched. Its
//! intended usage is to anonymize a mysqldump backup in order to safely
//! share it between developers.
//!
//! Values are addressed by table name and zero based column index. The
//! replacement is written verbatim, so it has to be a valid SQL literal
//! for the column (quotes included).
//!
//! ```rust,no_run
//! use mysqldump_redact::{rewrite, Config, Instruction, ReplacementTable};
//! # use std::fs::File;
//! # use std::io::{self, BufReader, BufWriter};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let replacements: ReplacementTable = vec![
//!     Instruction::new("users", 3, &b"'[REDACTED]'"[..]),
//!     "users:4:NULL".parse::<Instruction>()?,
//! ]
//! .into_iter()
//! .collect();
//!
//! let input = BufReader::new(File::open("dump.sql")?);
//! let output = BufWriter::new(io::stdout());
//! let summary = rewrite(input, output, &replacements, Config::default())?;
//! eprintln!("{} values replaced", summary.replaced);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod cursor;
mod literal;
mod parser;
mod replacement;

pub use cursor::{Cursor, LineChunk, DEFAULT_LINE_CAPACITY};
pub use literal::{Literal, LiteralKind};
pub use parser::{rewrite, Config, ParserError, Rewriter, Step, Summary, INSERT_PREFIX};
pub use replacement::{Instruction, InstructionError, ReplacementTable};
