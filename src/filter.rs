//! WHERE-clause filter classifier (spec.md §4.4): splits the token stream
//! after WHERE into per-table reading filters (partition-column predicates
//! that prune files) and a flat querying filter stream (row predicates
//! evaluated after scan + join), preserving AND/OR/NOT/paren structure in
//! source order for the querying stream.

use crate::cast::{cast, Literal};
use crate::colref::{colref_len, resolve_ref};
use crate::error::EngineError;
use crate::plan::{Column, Table};
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOp {
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

impl QueryOp {
    fn from_operator_text(text: &str) -> Option<QueryOp> {
        match text {
            "=" => Some(QueryOp::Eq),
            "!=" | "<>" => Some(QueryOp::Neq),
            "<" => Some(QueryOp::Lt),
            "<=" => Some(QueryOp::Le),
            ">" => Some(QueryOp::Gt),
            ">=" => Some(QueryOp::Ge),
            _ => None,
        }
    }
}

/// A row predicate over the joined table.
#[derive(Debug, Clone)]
pub struct QueryingFilter {
    pub column: Column,
    pub op: QueryOp,
    pub values: Vec<Literal>,
}

/// One element of the flat querying stream: either a predicate or a boolean
/// connective, in source order (spec.md §3 "Querying filter stream").
#[derive(Debug, Clone)]
pub enum QueryingToken {
    Filter(QueryingFilter),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

/// A predicate over a partition column, used to prune the candidate value
/// set for that column before scanning (spec.md §4.4 "Applying a reading
/// filter").
#[derive(Debug, Clone)]
pub enum ReadingFilter {
    Eq(Literal),
    Neq(Literal),
    Cmp(QueryOp, Literal),
    In(Vec<Literal>),
    NotIn(Vec<Literal>),
}

impl ReadingFilter {
    /// Narrows a candidate value set for one partition key.
    pub fn apply(&self, candidates: &[Literal]) -> Vec<Literal> {
        use std::cmp::Ordering;
        match self {
            ReadingFilter::Eq(v) => candidates.iter().filter(|c| *c == v).cloned().collect(),
            ReadingFilter::Neq(v) => candidates.iter().filter(|c| *c != v).cloned().collect(),
            ReadingFilter::Cmp(op, v) => candidates
                .iter()
                .filter(|c| match c.partial_cmp_same_type(v) {
                    Some(Ordering::Less) => matches!(op, QueryOp::Lt | QueryOp::Le),
                    Some(Ordering::Equal) => matches!(op, QueryOp::Le | QueryOp::Ge),
                    Some(Ordering::Greater) => matches!(op, QueryOp::Gt | QueryOp::Ge),
                    None => false,
                })
                .cloned()
                .collect(),
            ReadingFilter::In(vs) => candidates.iter().filter(|c| vs.contains(c)).cloned().collect(),
            ReadingFilter::NotIn(vs) => candidates.iter().filter(|c| !vs.contains(c)).cloned().collect(),
        }
    }
}

/// The boolean connective joining a reading filter to whichever reading
/// filter on the same partition key precedes it in the WHERE clause
/// (spec.md §4.5 step 3: "composing results by intersection [AND] or union
/// [OR]"). Unused by a key's first filter, which seeds the fold instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

/// A reading filter bound to the table alias it applies to (the default,
/// single-table case carries that table's own alias — there is always an
/// owning table since the column was resolved against one).
#[derive(Debug, Clone)]
pub struct ReadingFilterEntry {
    pub table_alias: String,
    pub column_name: String,
    pub filter: ReadingFilter,
    pub connective: Connective,
}

pub struct ClassifyResult {
    pub reading_filters: Vec<ReadingFilterEntry>,
    pub querying_filters: Vec<QueryingToken>,
}

/// Classifies the token slice after WHERE into reading filters and a
/// querying stream (spec.md §4.4). A single left-to-right scan: connectives
/// and parens are copied through verbatim; each atom (`col op literal` or
/// `col [NOT] IN (list)`) is resolved and cast in place.
///
/// `projection` lets a bare WHERE identifier bind to a SELECT-list alias
/// (spec.md §8 literal scenario 3: `SELECT ... AS subsis ... WHERE subsis =
/// 'NE'`) before falling back to ordinary column resolution, the way the
/// original engine's reverse alias→column map does.
pub fn classify(tokens: &[Token], tables: &[Table], projection: &[Column]) -> Result<ClassifyResult, EngineError> {
    let mut reading_filters = Vec::new();
    let mut querying_filters = Vec::new();
    let mut i = 0;
    // The connective that will join the *next* reading filter to whichever
    // one (on the same partition key) precedes it; AND is the safe default
    // when two filters are adjacent with no connective between them at all
    // (shouldn't happen in valid syntax, but keeps this total).
    let mut pending_connective = Connective::And;
    while i < tokens.len() {
        let tok = &tokens[i];
        if tok.is_punct("(") {
            querying_filters.push(QueryingToken::LParen);
            i += 1;
            continue;
        }
        if tok.is_punct(")") {
            querying_filters.push(QueryingToken::RParen);
            i += 1;
            continue;
        }
        if tok.is_keyword("AND") {
            querying_filters.push(QueryingToken::And);
            pending_connective = Connective::And;
            i += 1;
            continue;
        }
        if tok.is_keyword("OR") {
            querying_filters.push(QueryingToken::Or);
            pending_connective = Connective::Or;
            i += 1;
            continue;
        }
        if tok.is_keyword("NOT") && !matches!(tokens.get(i + 1), Some(n) if n.is_keyword("IN")) {
            querying_filters.push(QueryingToken::Not);
            i += 1;
            continue;
        }
        let (filter, consumed) = parse_atom(&tokens[i..], tables, projection)?;
        if filter.column.is_partition {
            reading_filters.push(ReadingFilterEntry {
                table_alias: filter
                    .column
                    .table_alias
                    .clone()
                    .unwrap_or_else(|| filter.column.table_name.clone()),
                column_name: filter.column.name.clone(),
                filter: to_reading_filter(filter.op, &filter.values),
                connective: pending_connective,
            });
            pending_connective = Connective::And;
        }
        querying_filters.push(QueryingToken::Filter(filter));
        i += consumed;
    }
    Ok(ClassifyResult { reading_filters, querying_filters })
}

fn to_reading_filter(op: QueryOp, values: &[Literal]) -> ReadingFilter {
    match op {
        QueryOp::Eq => ReadingFilter::Eq(values[0].clone()),
        QueryOp::Neq => ReadingFilter::Neq(values[0].clone()),
        QueryOp::Lt | QueryOp::Le | QueryOp::Gt | QueryOp::Ge => ReadingFilter::Cmp(op, values[0].clone()),
        QueryOp::In => ReadingFilter::In(values.to_vec()),
        QueryOp::NotIn => ReadingFilter::NotIn(values.to_vec()),
    }
}

fn parse_atom(tokens: &[Token], tables: &[Table], projection: &[Column]) -> Result<(QueryingFilter, usize), EngineError> {
    let col_len = colref_len(tokens);
    if tokens.len() <= col_len {
        return Err(EngineError::parse("WHERE clause ended with a bare identifier and no operator"));
    }
    let mut column = match (col_len, projection.iter().find(|c| c.alias.as_deref() == Some(tokens[0].text.as_str()))) {
        (1, Some(aliased)) => Column { alias: None, is_projected: false, ..aliased.clone() },
        _ => resolve_ref(&tokens[..col_len], tables)?,
    };
    column.is_projected = false;

    let mut pos = col_len;
    let next = &tokens[pos];

    if next.kind == TokenKind::Operator {
        let op = QueryOp::from_operator_text(&next.text)
            .ok_or_else(|| EngineError::parse(format!("unknown comparison operator '{}'", next.text)))?;
        pos += 1;
        let literal_tok = tokens
            .get(pos)
            .ok_or_else(|| EngineError::parse("comparison missing a literal operand"))?;
        let value = cast(&literal_tok.text, column.ty)?;
        pos += 1;
        return Ok((QueryingFilter { column, op, values: vec![value] }, pos));
    }

    let (op, skip) = if next.is_keyword("IN") {
        (QueryOp::In, 1)
    } else if next.is_keyword("NOT") && matches!(tokens.get(pos + 1), Some(n) if n.is_keyword("IN")) {
        (QueryOp::NotIn, 2)
    } else {
        return Err(EngineError::parse(format!(
            "expected a comparison or IN after column '{}'",
            column.name
        )));
    };
    pos += skip;

    if !matches!(tokens.get(pos), Some(t) if t.is_punct("(")) {
        return Err(EngineError::parse("expected '(' to start an IN value list"));
    }
    pos += 1;
    let start = pos;
    while !matches!(tokens.get(pos), Some(t) if t.is_punct(")")) {
        if pos >= tokens.len() {
            return Err(EngineError::parse("unterminated IN value list"));
        }
        pos += 1;
    }
    let list_tokens = &tokens[start..pos];
    pos += 1; // consume ')'

    let values = list_tokens
        .iter()
        .filter(|t| !t.is_punct(","))
        .map(|t| cast(&t.text, column.ty))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((QueryingFilter { column, op, values }, pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::schema::ColumnType;

    fn table(name: &str, partitioned_col: &str) -> Table {
        Table {
            name: name.into(),
            alias: None,
            columns: vec![
                Column {
                    name: "id".into(),
                    alias: None,
                    ty: ColumnType::Int,
                    table_name: name.into(),
                    table_alias: None,
                    has_qualifier_in_query: false,
                    is_partition: false,
                    is_projected: false,
                },
                Column {
                    name: partitioned_col.into(),
                    alias: None,
                    ty: ColumnType::String,
                    table_name: name.into(),
                    table_alias: None,
                    has_qualifier_in_query: false,
                    is_partition: true,
                    is_projected: false,
                },
            ],
        }
    }

    #[test]
    fn classifies_partition_equality_into_both_streams() {
        let tables = vec![table("usinas", "subsistema")];
        let toks = lex("subsistema = 'NE'");
        let result = classify(&toks, &tables, &[]).unwrap();
        assert_eq!(result.reading_filters.len(), 1);
        assert_eq!(result.querying_filters.len(), 1);
        assert!(matches!(result.reading_filters[0].filter, ReadingFilter::Eq(_)));
    }

    #[test]
    fn non_partition_column_has_no_reading_filter() {
        let tables = vec![table("usinas", "subsistema")];
        let toks = lex("id > 10");
        let result = classify(&toks, &tables, &[]).unwrap();
        assert!(result.reading_filters.is_empty());
        assert_eq!(result.querying_filters.len(), 1);
    }

    #[test]
    fn preserves_boolean_connectives_in_order() {
        let tables = vec![table("usinas", "subsistema")];
        let toks = lex("id > 10 AND subsistema = 'NE'");
        let result = classify(&toks, &tables, &[]).unwrap();
        assert_eq!(result.querying_filters.len(), 3);
        assert!(matches!(result.querying_filters[1], QueryingToken::And));
    }

    #[test]
    fn in_list_with_trailing_comma_matches_without() {
        let tables = vec![table("usinas", "subsistema")];
        let with_comma = classify(&lex("subsistema IN ('NE', )"), &tables, &[]).unwrap();
        let without_comma = classify(&lex("subsistema IN ('NE')"), &tables, &[]).unwrap();
        let QueryingToken::Filter(a) = &with_comma.querying_filters[0] else { panic!() };
        let QueryingToken::Filter(b) = &without_comma.querying_filters[0] else { panic!() };
        assert_eq!(a.values, b.values);
    }
}
