//! Resolved logical plan for a SELECT statement (spec.md §3 "Logical plan").

use crate::schema::ColumnType;
use std::fmt;

/// A resolved column reference. Two Columns are equal iff every field is
/// equal — fullname alone is not a stable identity, since two columns with
/// the same fullname in different queries would otherwise collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub alias: Option<String>,
    pub ty: ColumnType,
    pub table_name: String,
    pub table_alias: Option<String>,
    pub has_qualifier_in_query: bool,
    pub is_partition: bool,
    pub is_projected: bool,
}

impl Column {
    /// The canonical output header (spec.md §3 "fullname"): alias if present;
    /// else `name_tableAlias` if qualified and the table has an alias; else
    /// `name_tableName` if qualified without alias; else bare `name`.
    pub fn fullname(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        if self.has_qualifier_in_query {
            let qualifier = self.table_alias.as_deref().unwrap_or(&self.table_name);
            return format!("{}_{}", self.name, qualifier);
        }
        self.name.clone()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fullname())
    }
}

/// A table in the FROM/JOIN clause, with its attached schema columns
/// (spec.md §4.3 step 1-2, pruned at step 6).
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub alias: Option<String>,
    pub columns: Vec<Column>,
}

impl Table {
    /// The alias used to key reading filters and column resolution: the
    /// query alias if one was given, else the table name itself.
    pub fn query_alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Outer,
}

impl JoinKind {
    pub fn parse(s: &str) -> Option<JoinKind> {
        match s.to_ascii_uppercase().as_str() {
            "INNER" | "JOIN" => Some(JoinKind::Inner),
            "LEFT" => Some(JoinKind::Left),
            "RIGHT" => Some(JoinKind::Right),
            "OUTER" => Some(JoinKind::Outer),
            _ => None,
        }
    }
}

/// A single JOIN ... ON edge (spec.md §4.3 step 4 / §4.6).
#[derive(Debug, Clone)]
pub struct JoinEdge {
    pub left: Column,
    pub right: Column,
    pub kind: JoinKind,
}

use crate::filter::{QueryingToken, ReadingFilterEntry};

/// The fully resolved SELECT, ready for pruning/scanning/joining/filtering.
#[derive(Debug, Clone)]
pub struct LogicalPlan {
    pub tables: Vec<Table>,
    pub projection: Vec<Column>,
    pub joins: Vec<JoinEdge>,
    pub reading_filters: Vec<ReadingFilterEntry>,
    pub querying_filters: Vec<QueryingToken>,
}

impl LogicalPlan {
    pub fn table_by_alias(&self, alias: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.query_alias() == alias)
    }
}
