//! Pipeline orchestration: lex → resolve → prune → scan (per table) → join
//! → row filter (spec.md §2 "System overview").

use crate::connector::Connection;
use crate::error::EngineError;
use crate::{join, lexer, prune, resolve, rowfilter, scan};
use polars::prelude::DataFrame;
use tracing::info;

pub struct SelectResult {
    pub data: DataFrame,
    pub files_read: Vec<String>,
}

/// Runs a single SELECT statement against `conn`, per spec.md §2.
pub fn select(conn: &dyn Connection, query: &str) -> Result<SelectResult, EngineError> {
    let mut tokens = lexer::lex(query);
    if matches!(tokens.last(), Some(t) if t.is_punct(";")) {
        tokens.pop();
    }

    let plan = resolve::resolve(&tokens, conn)?;
    info!(target: "morganadb::engine", "resolved plan with {} table(s), {} join(s)", plan.tables.len(), plan.joins.len());

    let mut per_table_dfs = Vec::with_capacity(plan.tables.len());
    let mut files_read = Vec::new();

    for table in &plan.tables {
        let table_conn = conn.access(&table.name)?;
        let schema = table_conn.schema()?;
        let partitions = prune::partitions_of(&schema);
        let reading_filters: Vec<_> =
            plan.reading_filters.iter().filter(|f| f.table_alias == table.query_alias()).cloned().collect();

        let files = prune::prune(table, partitions, table_conn.as_ref(), &reading_filters)?;
        let (df, read) = scan::scan(table, &files, table_conn.as_ref(), &schema)?;
        info!(target: "morganadb::engine", "table '{}': read {} file(s)", table.name, read.len());
        files_read.extend(read);
        per_table_dfs.push(df);
    }

    let joined = join::execute(per_table_dfs, &plan.joins)?;
    let filtered = rowfilter::apply(joined, &plan.querying_filters)?;

    // Scanning/joining/filtering keep every column the pipeline needed along
    // the way (join keys, filter-only columns); the caller only ever asked
    // for the SELECT list, so trim down to `plan.projection`'s fullnames,
    // in source order, as the final step (spec.md §4.3 step 3 / §2).
    let projected_names: Vec<String> = plan.projection.iter().map(|c| c.fullname()).collect();
    let data = filtered.select(&projected_names).map_err(EngineError::from)?;

    Ok(SelectResult { data, files_read })
}
