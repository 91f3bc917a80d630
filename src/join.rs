//! Join executor (spec.md §4.6): executes INNER joins left-to-right in
//! statement order. Non-INNER kinds are recognized by the resolver but
//! rejected here, per the "Unresolved source behavior" design note.

use crate::error::EngineError;
use crate::plan::{JoinEdge, JoinKind};
use polars::prelude::*;

/// Joins `tables` (one DataFrame per FROM-clause table, in order) following
/// `edges` (one edge per JOIN, same order as `tables[1..]`).
pub fn execute(mut tables: Vec<DataFrame>, edges: &[JoinEdge]) -> Result<DataFrame, EngineError> {
    if tables.is_empty() {
        return Err(EngineError::resolve("no tables to join"));
    }
    if edges.len() != tables.len().saturating_sub(1) {
        return Err(EngineError::parse("join edge count does not match table count"));
    }

    let mut working = tables.remove(0);
    for (edge, right) in edges.iter().zip(tables.into_iter()) {
        if edge.kind != JoinKind::Inner {
            return Err(EngineError::not_implemented(format!(
                "{:?} joins are not executed, only recognized",
                edge.kind
            )));
        }
        let left_key = edge.left.fullname();
        let right_key = edge.right.fullname();
        working = working
            .join(
                &right,
                [left_key.as_str()],
                [right_key.as_str()],
                JoinArgs::new(JoinType::Inner),
            )
            .map_err(EngineError::from)?;
    }
    Ok(working)
}
