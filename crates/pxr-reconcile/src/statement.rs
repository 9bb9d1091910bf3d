//! Structured admin statements.
//!
//! Every statement the engine issues is built here from a schema walk, never
//! by string concatenation at the call site. Adapters either render the
//! statement to SQL ([`Statement::sql`] + [`Statement::params`]) or interpret
//! the structure directly (the in-memory store does).

use std::fmt;

use pxr_schemas::{FieldValue, StoredRecord};

/// Column alias used by every count statement.
pub const MATCH_COUNT_COLUMN: &str = "match_count";

// ---------------------------------------------------------------------------
// Predicate
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    Eq {
        column: &'static str,
        value: FieldValue,
    },
    /// Explicit-null match. Never produced for an absent attribute.
    IsNull { column: &'static str },
}

impl Condition {
    pub fn column(&self) -> &'static str {
        match self {
            Condition::Eq { column, .. } | Condition::IsNull { column } => *column,
        }
    }

    pub fn matches(&self, row: &StoredRecord) -> bool {
        let cell = row.get(self.column()).and_then(|c| c.as_deref());
        match self {
            Condition::Eq { value, .. } => value.matches_cell(cell),
            Condition::IsNull { .. } => cell.is_none(),
        }
    }
}

/// Conjunction of conditions, kept in construction order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: &'static str, value: &FieldValue) {
        let cond = if value.is_null() {
            Condition::IsNull { column }
        } else {
            Condition::Eq {
                column,
                value: value.clone(),
            }
        };
        self.conditions.push(cond);
    }

    pub fn columns(&self) -> Vec<&'static str> {
        self.conditions.iter().map(Condition::column).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, row: &StoredRecord) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }

    fn sql(&self) -> String {
        self.conditions
            .iter()
            .map(|c| match c {
                Condition::Eq { column, .. } => format!("{column} = ?"),
                Condition::IsNull { column } => format!("{column} IS NULL"),
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn params(&self) -> impl Iterator<Item = &FieldValue> {
        self.conditions.iter().filter_map(|c| match c {
            Condition::Eq { value, .. } => Some(value),
            Condition::IsNull { .. } => None,
        })
    }

    fn where_clause(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.sql())
        }
    }
}

// ---------------------------------------------------------------------------
// Statement
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement {
    Count {
        table: &'static str,
        predicate: Predicate,
    },
    Select {
        table: &'static str,
        predicate: Predicate,
    },
    Insert {
        table: &'static str,
        columns: Vec<(&'static str, FieldValue)>,
    },
    Update {
        table: &'static str,
        assignments: Vec<(&'static str, FieldValue)>,
        predicate: Predicate,
    },
    Delete {
        table: &'static str,
        predicate: Predicate,
    },
    /// Verbatim admin command (`SAVE ... TO DISK`, `LOAD ... TO RUNTIME`, ...).
    Admin { command: String },
}

impl Statement {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Statement::Insert { .. } | Statement::Update { .. } | Statement::Delete { .. }
        )
    }

    /// SQL text with `?` placeholders, in the order of [`params`](Self::params).
    pub fn sql(&self) -> String {
        match self {
            Statement::Count { table, predicate } => format!(
                "SELECT count(*) AS {MATCH_COUNT_COLUMN} FROM {table}{}",
                predicate.where_clause()
            ),
            Statement::Select { table, predicate } => {
                format!("SELECT * FROM {table}{}", predicate.where_clause())
            }
            Statement::Insert { table, columns } => {
                let names: Vec<_> = columns.iter().map(|(c, _)| *c).collect();
                let marks = vec!["?"; columns.len()];
                format!(
                    "INSERT INTO {table} ({}) VALUES ({})",
                    names.join(", "),
                    marks.join(", ")
                )
            }
            Statement::Update {
                table,
                assignments,
                predicate,
            } => {
                let sets: Vec<_> = assignments.iter().map(|(c, _)| format!("{c} = ?")).collect();
                format!(
                    "UPDATE {table} SET {}{}",
                    sets.join(", "),
                    predicate.where_clause()
                )
            }
            Statement::Delete { table, predicate } => {
                format!("DELETE FROM {table}{}", predicate.where_clause())
            }
            Statement::Admin { command } => command.clone(),
        }
    }

    pub fn params(&self) -> Vec<&FieldValue> {
        match self {
            Statement::Count { predicate, .. }
            | Statement::Select { predicate, .. }
            | Statement::Delete { predicate, .. } => predicate.params().collect(),
            Statement::Insert { columns, .. } => columns.iter().map(|(_, v)| v).collect(),
            Statement::Update {
                assignments,
                predicate,
                ..
            } => assignments
                .iter()
                .map(|(_, v)| v)
                .chain(predicate.params())
                .collect(),
            Statement::Admin { .. } => Vec::new(),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql())
    }
}
