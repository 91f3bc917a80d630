//! Row filter evaluator (spec.md §4.7): renders the querying filter stream
//! into a `polars` predicate expression (AND binds tighter than OR, NOT
//! binds tightest, parentheses override both) and filters the joined table.
//! A native `Expr` tree is built directly rather than a pandas-style query
//! string, since that is how predicates are composed against a `DataFrame`
//! in this ecosystem.

use crate::cast::Literal;
use crate::error::EngineError;
use crate::filter::{QueryOp, QueryingFilter, QueryingToken};
use chrono::Datelike;
use polars::prelude::*;

struct Parser<'a> {
    tokens: &'a [QueryingToken],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a QueryingToken> {
        self.tokens.get(self.pos)
    }

    fn parse_or(&mut self) -> Result<Expr, EngineError> {
        let mut expr = self.parse_and()?;
        while matches!(self.peek(), Some(QueryingToken::Or)) {
            self.pos += 1;
            let rhs = self.parse_and()?;
            expr = expr.or(rhs);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, EngineError> {
        let mut expr = self.parse_unary()?;
        while matches!(self.peek(), Some(QueryingToken::And)) {
            self.pos += 1;
            let rhs = self.parse_unary()?;
            expr = expr.and(rhs);
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, EngineError> {
        if matches!(self.peek(), Some(QueryingToken::Not)) {
            self.pos += 1;
            return Ok(self.parse_unary()?.not());
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, EngineError> {
        match self.peek() {
            Some(QueryingToken::LParen) => {
                self.pos += 1;
                let inner = self.parse_or()?;
                match self.peek() {
                    Some(QueryingToken::RParen) => self.pos += 1,
                    _ => return Err(EngineError::parse("unbalanced parentheses in WHERE clause")),
                }
                Ok(inner)
            }
            Some(QueryingToken::Filter(f)) => {
                self.pos += 1;
                Ok(atom_expr(f))
            }
            other => Err(EngineError::parse(format!("unexpected token in WHERE clause: {other:?}"))),
        }
    }
}

fn literal_expr(l: &Literal) -> Expr {
    match l {
        Literal::Int(v) => lit(*v),
        Literal::Float(v) => lit(*v),
        Literal::Bool(v) => lit(*v),
        Literal::Str(v) => lit(v.clone()),
        Literal::Date(v) => {
            let days = v.num_days_from_ce() - chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().num_days_from_ce();
            lit(days).cast(DataType::Date)
        }
        Literal::Datetime(v) => lit(v.timestamp_millis()).cast(DataType::Datetime(TimeUnit::Milliseconds, None)),
    }
}

fn atom_expr(f: &QueryingFilter) -> Expr {
    let name = f.column.fullname();
    let c = col(name.as_str());
    match f.op {
        QueryOp::Eq => c.eq(literal_expr(&f.values[0])),
        QueryOp::Neq => c.neq(literal_expr(&f.values[0])),
        QueryOp::Lt => c.lt(literal_expr(&f.values[0])),
        QueryOp::Le => c.lt_eq(literal_expr(&f.values[0])),
        QueryOp::Gt => c.gt(literal_expr(&f.values[0])),
        QueryOp::Ge => c.gt_eq(literal_expr(&f.values[0])),
        QueryOp::In => f
            .values
            .iter()
            .map(|v| col(name.as_str()).eq(literal_expr(v)))
            .reduce(|a, b| a.or(b))
            .unwrap_or_else(|| lit(false)),
        QueryOp::NotIn => f
            .values
            .iter()
            .map(|v| col(name.as_str()).neq(literal_expr(v)))
            .reduce(|a, b| a.and(b))
            .unwrap_or_else(|| lit(true)),
    }
}

/// Filters `df` by the querying stream. An empty stream is a no-op
/// (spec.md §8 "WHERE absent → no row filtering").
pub fn apply(df: DataFrame, tokens: &[QueryingToken]) -> Result<DataFrame, EngineError> {
    if tokens.is_empty() {
        return Ok(df);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos != tokens.len() {
        return Err(EngineError::parse("trailing tokens after WHERE expression"));
    }
    df.lazy().filter(expr).collect().map_err(EngineError::from)
}
