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

//! Replacement instructions and the lookup table built from them

use log::debug;
use std::collections::HashMap;
use std::iter::FromIterator;
use std::str::FromStr;

/// Replace column `column` of every row inserted into `table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub table: String,
    /// Zero based position inside the row
    pub column: usize,
    /// Raw bytes written instead of the original literal, quotes included
    pub replacement: Vec<u8>,
}

impl Instruction {
    pub fn new(table: impl Into<String>, column: usize, replacement: impl Into<Vec<u8>>) -> Self {
        Instruction {
            table: table.into(),
            column,
            replacement: replacement.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstructionError {
    #[error("invalid replace option {0:?}, expected TABLE:COLUMN:LITERAL")]
    Malformed(String),
    #[error("invalid replace option {option:?}, column {column:?} is not a non-negative integer")]
    InvalidColumn { option: String, column: String },
}

/// Parses `table:column:literal`. Only the first two colons separate
/// fields, so the literal itself may contain colons.
impl FromStr for Instruction {
    type Err = InstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.splitn(3, ':');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(table), Some(column), Some(literal)) if !table.is_empty() => {
                let index = column
                    .parse::<usize>()
                    .map_err(|_| InstructionError::InvalidColumn {
                        option: s.to_string(),
                        column: column.to_string(),
                    })?;
                Ok(Instruction::new(table, index, literal.as_bytes()))
            }
            _ => Err(InstructionError::Malformed(s.to_string())),
        }
    }
}

/// Read-only map of table name to column index to replacement bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementTable {
    tables: HashMap<Vec<u8>, HashMap<usize, Vec<u8>>>,
}

impl ReplacementTable {
    /// Build the table. A later instruction for the same table and column
    /// overwrites the earlier one.
    pub fn new<I: IntoIterator<Item = Instruction>>(instructions: I) -> Self {
        let mut tables: HashMap<Vec<u8>, HashMap<usize, Vec<u8>>> = HashMap::new();
        for Instruction {
            table,
            column,
            replacement,
        } in instructions
        {
            debug!("replace `{}` column {}", table, column);
            let columns = tables.entry(table.into_bytes()).or_default();
            if columns.insert(column, replacement).is_some() {
                debug!("previous replacement for column {} overwritten", column);
            }
        }
        ReplacementTable { tables }
    }

    /// Replacement for `column` of `table`, if one is configured.
    pub fn lookup(&self, table: &[u8], column: usize) -> Option<&[u8]> {
        self.tables.get(table)?.get(&column).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Number of configured (table, column) pairs.
    pub fn len(&self) -> usize {
        self.tables.values().map(HashMap::len).sum()
    }
}

impl FromIterator<Instruction> for ReplacementTable {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Self {
        ReplacementTable::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_instruction() {
        let instruction: Instruction = "users:1:'REDACTED'".parse().unwrap();
        assert_eq!(instruction, Instruction::new("users", 1, &b"'REDACTED'"[..]));
    }

    #[test]
    fn literal_may_contain_colons() {
        let instruction: Instruction = "logs:3:'2000-01-01 00:00:00'".parse().unwrap();
        assert_eq!(instruction.table, "logs");
        assert_eq!(instruction.column, 3);
        assert_eq!(instruction.replacement, b"'2000-01-01 00:00:00'".to_vec());
    }

    #[test]
    fn empty_literal_is_allowed() {
        let instruction: Instruction = "t:0:".parse().unwrap();
        assert!(instruction.replacement.is_empty());
    }

    #[test]
    fn malformed_instructions() {
        assert_eq!(
            "users:1".parse::<Instruction>(),
            Err(InstructionError::Malformed("users:1".to_string()))
        );
        assert_eq!(
            ":1:NULL".parse::<Instruction>(),
            Err(InstructionError::Malformed(":1:NULL".to_string()))
        );
        assert_eq!(
            "users:-1:NULL".parse::<Instruction>(),
            Err(InstructionError::InvalidColumn {
                option: "users:-1:NULL".to_string(),
                column: "-1".to_string(),
            })
        );
        assert!("users:x:NULL".parse::<Instruction>().is_err());
    }

    #[test]
    fn lookup_by_table_and_column() {
        let table: ReplacementTable = vec![
            Instruction::new("users", 1, &b"'x'"[..]),
            Instruction::new("users", 3, &b"NULL"[..]),
            Instruction::new("orders", 0, &b"0"[..]),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup(b"users", 1), Some(&b"'x'"[..]));
        assert_eq!(table.lookup(b"users", 3), Some(&b"NULL"[..]));
        assert_eq!(table.lookup(b"users", 0), None);
        assert_eq!(table.lookup(b"orders", 0), Some(&b"0"[..]));
        assert_eq!(table.lookup(b"Users", 1), None);
    }

    #[test]
    fn last_instruction_wins() {
        let table = ReplacementTable::new(vec![
            Instruction::new("t", 2, &b"'first'"[..]),
            Instruction::new("t", 2, &b"'second'"[..]),
        ]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(b"t", 2), Some(&b"'second'"[..]));
    }

    #[test]
    fn empty_table() {
        let table = ReplacementTable::default();
        assert!(table.is_empty());
        assert_eq!(table.lookup(b"t", 0), None);
    }
}
