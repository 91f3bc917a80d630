//! SELECT parser/resolver (spec.md §4.3): validates overall statement shape,
//! then resolves tables, projection, joins, and the WHERE split in the
//! fixed order the spec lays out, finishing with projection pruning.

use crate::colref::{colref_len, resolve_ref};
use crate::connector::Connection;
use crate::error::EngineError;
use crate::filter::{classify, QueryingFilter, QueryingToken};
use crate::plan::{Column, JoinEdge, JoinKind, LogicalPlan, Table};
use crate::schema::SchemaDoc;
use crate::token::Token;

fn find_keyword_indices(tokens: &[Token], kw: &str) -> Vec<usize> {
    tokens.iter().enumerate().filter(|(_, t)| t.is_keyword(kw)).map(|(i, _)| i).collect()
}

fn find_exactly_one(tokens: &[Token], kw: &str) -> Result<usize, EngineError> {
    let found = find_keyword_indices(tokens, kw);
    match found.len() {
        1 => Ok(found[0]),
        0 => Err(EngineError::parse(format!("missing {kw}"))),
        _ => Err(EngineError::parse(format!("more than one {kw}"))),
    }
}

fn find_at_most_one(tokens: &[Token], kw: &str) -> Result<Option<usize>, EngineError> {
    let found = find_keyword_indices(tokens, kw);
    match found.len() {
        0 => Ok(None),
        1 => Ok(Some(found[0])),
        _ => Err(EngineError::parse(format!("more than one {kw}"))),
    }
}

/// Resolves a full SELECT token stream into a `LogicalPlan`.
pub fn resolve(tokens: &[Token], conn: &dyn Connection) -> Result<LogicalPlan, EngineError> {
    if tokens.is_empty() {
        return Err(EngineError::parse("empty statement"));
    }
    for ddl in ["CREATE", "ALTER", "DROP", "INSERT", "UPDATE", "DELETE"] {
        if tokens[0].text.eq_ignore_ascii_case(ddl) {
            return Err(EngineError::not_implemented(format!("{ddl} is not supported")));
        }
    }
    if !tokens[0].is_keyword("SELECT") {
        return Err(EngineError::parse("statement must begin with SELECT"));
    }

    let select_idx = find_exactly_one(tokens, "SELECT")?;
    let from_idx = find_exactly_one(tokens, "FROM")?;
    let where_idx = find_at_most_one(tokens, "WHERE")?;
    if from_idx <= select_idx {
        return Err(EngineError::parse("FROM must follow SELECT"));
    }
    if let Some(w) = where_idx {
        if w <= from_idx {
            return Err(EngineError::parse("WHERE must follow FROM"));
        }
    }
    if select_idx + 1 >= from_idx {
        return Err(EngineError::parse("SELECT clause has no content"));
    }

    let from_end = where_idx.unwrap_or(tokens.len());

    // 1 & 4: tables + joins.
    let (mut tables, joins_raw) = parse_tables_and_joins(&tokens[from_idx + 1..from_end])?;

    // 2: schema attachment.
    for table in &mut tables {
        attach_schema(table, conn)?;
    }

    // Resolve join edges now that every table carries its schema columns.
    let joins = joins_raw
        .into_iter()
        .map(|raw| resolve_join(raw, &tables))
        .collect::<Result<Vec<_>, _>>()?;

    // 3: projection.
    let projection = parse_projection(&tokens[select_idx + 1..from_idx], &tables)?;

    // 5: WHERE split.
    let where_tokens = where_idx.map(|w| &tokens[w + 1..]).unwrap_or(&[]);
    if where_idx.is_some() && where_tokens.is_empty() {
        return Err(EngineError::parse("WHERE clause has no content"));
    }
    let classified = classify(where_tokens, &tables, &projection)?;

    // 6: projection pruning — restrict each table's columns to what scanning
    // actually needs (spec.md §4.3 step 6).
    prune_table_columns(&mut tables, &projection, &joins, &classified.querying_filters);

    Ok(LogicalPlan {
        tables,
        projection,
        joins,
        reading_filters: classified.reading_filters,
        querying_filters: classified.querying_filters,
    })
}

struct RawTableRef {
    name: String,
    alias: Option<String>,
}

struct RawJoin {
    kind: JoinKind,
    table: RawTableRef,
    left: Vec<Token>,
    right: Vec<Token>,
}

fn parse_table_ref(tokens: &[Token]) -> Result<RawTableRef, EngineError> {
    match tokens {
        [name] if name.is_entity() => Ok(RawTableRef { name: name.text.clone(), alias: None }),
        [name, as_kw, alias] if name.is_entity() && as_kw.is_keyword("AS") && alias.is_entity() => {
            Ok(RawTableRef { name: name.text.clone(), alias: Some(alias.text.clone()) })
        }
        _ => Err(EngineError::parse("malformed table reference in FROM/JOIN")),
    }
}

fn parse_tables_and_joins(tokens: &[Token]) -> Result<(Vec<Table>, Vec<RawJoin>), EngineError> {
    // Locate each JOIN keyword and the optional kind keyword preceding it.
    struct Intro {
        intro_start: usize,
        content_start: usize,
        kind: JoinKind,
    }
    let mut intros = Vec::new();
    for (i, t) in tokens.iter().enumerate() {
        if t.is_keyword("JOIN") {
            let (intro_start, kind) = if i > 0 {
                match JoinKind::parse(&tokens[i - 1].text) {
                    Some(k) if tokens[i - 1].kind == crate::token::TokenKind::Keyword => (i - 1, k),
                    _ => (i, JoinKind::Inner),
                }
            } else {
                (i, JoinKind::Inner)
            };
            intros.push(Intro { intro_start, content_start: i + 1, kind });
        }
    }

    let first_end = intros.first().map(|j| j.intro_start).unwrap_or(tokens.len());
    if first_end == 0 {
        return Err(EngineError::parse("FROM clause has no table"));
    }
    let first_ref = parse_table_ref(&tokens[..first_end])?;
    let mut tables = vec![Table { name: first_ref.name, alias: first_ref.alias, columns: Vec::new() }];

    let mut joins = Vec::new();
    for (idx, intro) in intros.iter().enumerate() {
        let content_end = intros.get(idx + 1).map(|n| n.intro_start).unwrap_or(tokens.len());
        let segment = &tokens[intro.content_start..content_end];
        let on_idx = segment
            .iter()
            .position(|t| t.is_keyword("ON"))
            .ok_or_else(|| EngineError::parse("JOIN requires an ON clause"))?;
        let table_ref = parse_table_ref(&segment[..on_idx])?;
        let on_tokens = &segment[on_idx + 1..];
        let eq_idx = on_tokens
            .iter()
            .position(|t| t.is_operator() && t.text == "=")
            .ok_or_else(|| EngineError::parse("JOIN ON clause must contain exactly one '='"))?;
        let left = on_tokens[..eq_idx].to_vec();
        let right = on_tokens[eq_idx + 1..].to_vec();
        if colref_len(&left) != left.len() || colref_len(&right) != right.len() {
            return Err(EngineError::parse("JOIN ON clause must compare two column references"));
        }
        tables.push(Table { name: table_ref.name.clone(), alias: table_ref.alias.clone(), columns: Vec::new() });
        joins.push(RawJoin { kind: intro.kind, table: table_ref, left, right });
    }

    Ok((tables, joins))
}

fn attach_schema(table: &mut Table, conn: &dyn Connection) -> Result<(), EngineError> {
    let table_conn = conn.access(&table.name)?;
    let schema = table_conn.schema()?;
    match &*schema {
        SchemaDoc::Table { columns, partitions, .. } => {
            for c in columns {
                table.columns.push(Column {
                    name: c.name.clone(),
                    alias: None,
                    ty: c.ty,
                    table_name: table.name.clone(),
                    table_alias: table.alias.clone(),
                    has_qualifier_in_query: false,
                    is_partition: false,
                    is_projected: false,
                });
            }
            for p in partitions {
                table.columns.push(Column {
                    name: p.name.clone(),
                    alias: None,
                    ty: p.ty,
                    table_name: table.name.clone(),
                    table_alias: table.alias.clone(),
                    has_qualifier_in_query: false,
                    is_partition: true,
                    is_projected: false,
                });
            }
            Ok(())
        }
        SchemaDoc::Database { .. } => {
            Err(EngineError::schema(format!("'{}' is a database, not a table", table.name)))
        }
    }
}

fn resolve_join(raw: RawJoin, tables: &[Table]) -> Result<JoinEdge, EngineError> {
    let left = resolve_ref(&raw.left, tables)?;
    let right = resolve_ref(&raw.right, tables)?;
    let _ = &raw.table;
    Ok(JoinEdge { left, right, kind: raw.kind })
}

fn parse_projection(tokens: &[Token], tables: &[Table]) -> Result<Vec<Column>, EngineError> {
    if tokens.len() == 1 && tokens[0].is_punct("*") {
        if tables.len() != 1 {
            return Err(EngineError::not_implemented(
                "'*' projection across multiple joined tables is not supported",
            ));
        }
        return Ok(tables[0]
            .columns
            .iter()
            .map(|c| Column { is_projected: true, ..c.clone() })
            .collect());
    }

    let mut projection = Vec::new();
    for item in split_on_punct(tokens, ",") {
        if item.is_empty() {
            return Err(EngineError::parse("empty item in projection list"));
        }
        let (expr_tokens, alias) = split_as(item)?;
        let mut col = resolve_ref(expr_tokens, tables)?;
        col.is_projected = true;
        col.alias = alias;
        projection.push(col);
    }
    if projection.is_empty() {
        return Err(EngineError::parse("SELECT clause has no content"));
    }
    Ok(projection)
}

/// Splits `expr [AS alias]` into the expression tokens and an optional
/// alias name.
fn split_as(tokens: &[Token]) -> Result<(&[Token], Option<String>), EngineError> {
    if let Some(pos) = tokens.iter().position(|t| t.is_keyword("AS")) {
        let alias_tokens = &tokens[pos + 1..];
        if alias_tokens.len() != 1 || !alias_tokens[0].is_entity() {
            return Err(EngineError::parse("AS must be followed by a single alias"));
        }
        Ok((&tokens[..pos], Some(alias_tokens[0].text.clone())))
    } else {
        Ok((tokens, None))
    }
}

fn split_on_punct<'a>(tokens: &'a [Token], p: &str) -> Vec<&'a [Token]> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, t) in tokens.iter().enumerate() {
        if t.is_punct(p) {
            out.push(&tokens[start..i]);
            start = i + 1;
        }
    }
    out.push(&tokens[start..]);
    out
}

/// Restricts each table's columns to those actually required downstream:
/// projected columns, join keys, and filter columns (reading or querying).
/// Scanning only reads/renames what survives this pass (spec.md §4.3 step 6,
/// §4.5).
fn prune_table_columns(
    tables: &mut [Table],
    projection: &[Column],
    joins: &[JoinEdge],
    querying_filters: &[QueryingToken],
) {
    for table in tables.iter_mut() {
        let mut required: Vec<Column> = Vec::new();
        // Keyed on (raw name, alias): the same underlying column may be
        // projected more than once under different aliases (`id, id AS
        // other_id`), and each such projection must survive pruning so
        // `scan::scan` can still produce both output columns. Join-key and
        // filter-only references (no alias) still dedup against each other
        // and against an unaliased projection of the same column.
        let mut seen: std::collections::HashSet<(String, Option<String>)> = std::collections::HashSet::new();

        let belongs = |c: &Column, table: &Table| c.table_name == table.name && c.table_alias == table.alias;

        for c in projection.iter().filter(|c| belongs(c, table)) {
            if seen.insert((c.name.clone(), c.alias.clone())) {
                required.push(c.clone());
            }
        }
        for edge in joins {
            for c in [&edge.left, &edge.right] {
                if belongs(c, table) && seen.insert((c.name.clone(), c.alias.clone())) {
                    required.push(c.clone());
                }
            }
        }
        for tok in querying_filters {
            if let QueryingToken::Filter(QueryingFilter { column, .. }) = tok {
                if belongs(column, table) && seen.insert((column.name.clone(), column.alias.clone())) {
                    required.push(column.clone());
                }
            }
        }
        table.columns = required;
    }
}
