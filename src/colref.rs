//! Shared column-reference resolution, used by both the projection step and
//! the filter classifier (spec.md §4.3 step 3, §4.4): a bare `ENTITY` or a
//! dotted `ENTITY . ENTITY` is resolved against the tables in scope.

use crate::error::EngineError;
use crate::plan::{Column, Table};
use crate::token::Token;

/// Resolves `tokens` (either `[ident]` or `[ident, ".", ident]`) against
/// `tables`, returning a fully-populated `Column` with `is_projected` left
/// `false` (callers flip it where relevant).
pub fn resolve_ref(tokens: &[Token], tables: &[Table]) -> Result<Column, EngineError> {
    match tokens {
        [single] => resolve_unqualified(&single.text, tables),
        [qualifier, dot, name] if dot.is_punct(".") => resolve_qualified(&qualifier.text, &name.text, tables),
        _ => Err(EngineError::parse(format!(
            "expected a column reference, found {} tokens",
            tokens.len()
        ))),
    }
}

/// Resolves a bare, unqualified column name. The leftmost (base) FROM table
/// takes priority when it carries a column of that name — this lets a join
/// key shared by two tables (e.g. both sides of `ON a.id = b.id` named
/// `id`) be referenced unqualified without an ambiguity error, matching the
/// base table the way an unqualified reference is ordinarily expected to
/// bind. Only when the base table lacks the column does a match among the
/// remaining (joined-in) tables need to be unique.
fn resolve_unqualified(name: &str, tables: &[Table]) -> Result<Column, EngineError> {
    if let Some((base, rest)) = tables.split_first() {
        if let Some(c) = base.find_column(name) {
            return Ok(with_table(c, base, false));
        }
        let found: Vec<(&Table, &Column)> =
            rest.iter().filter_map(|t| t.find_column(name).map(|c| (t, c))).collect();
        return match found.len() {
            0 => Err(EngineError::resolve(format!("unknown column '{name}'"))),
            1 => {
                let (table, col) = found[0];
                Ok(with_table(col, table, false))
            }
            _ => Err(EngineError::resolve(format!("column '{name}' is ambiguous across joined tables"))),
        };
    }
    Err(EngineError::resolve(format!("unknown column '{name}'")))
}

fn resolve_qualified(qualifier: &str, name: &str, tables: &[Table]) -> Result<Column, EngineError> {
    let table = tables
        .iter()
        .find(|t| t.alias.as_deref() == Some(qualifier))
        .or_else(|| tables.iter().find(|t| t.name == qualifier))
        .ok_or_else(|| EngineError::resolve(format!("unknown table or alias '{qualifier}'")))?;
    let col = table
        .find_column(name)
        .ok_or_else(|| EngineError::resolve(format!("unknown column '{qualifier}.{name}'")))?;
    Ok(with_table(col, table, true))
}

/// Length in tokens of a column-reference prefix: 1 for a bare identifier,
/// 3 for `ident . ident`.
pub fn colref_len(tokens: &[Token]) -> usize {
    if tokens.len() >= 3 && tokens[1].is_punct(".") {
        3
    } else {
        1
    }
}

fn with_table(col: &Column, table: &Table, qualified: bool) -> Column {
    Column {
        name: col.name.clone(),
        alias: None,
        ty: col.ty,
        table_name: table.name.clone(),
        table_alias: table.alias.clone(),
        has_qualifier_in_query: qualified,
        is_partition: col.is_partition,
        is_projected: false,
    }
}
