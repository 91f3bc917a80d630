//! Whitespace- and punctuation-aware tokenizer.
//!
//! Mirrors the original engine's `SQLLexer._recursive_lex`: words are split
//! on whitespace, then any word containing a recognized punctuation/operator
//! substring has virtual spaces inserted around it and is re-scanned. Quoted
//! string literals are kept intact (including embedded whitespace) so that
//! downstream stages can distinguish them from identifiers by their
//! surrounding quotes.

use crate::token::{Token, TokenKind, KEYWORDS, PUNCTUATION};

const OPERATORS: &[&str] = &["<=", ">=", "!=", "<>", "=", "<", ">"];
const PUNCT_ONLY: &[&str] = &[",", ".", ";", "(", ")", "*"];

/// Splits `input` into whitespace-delimited words, treating a single-quoted
/// span (possibly containing spaces) as one word.
fn quote_aware_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut cur = String::new();
    let mut in_quote = false;
    let mut quote_char = '\'';

    for ch in input.chars() {
        if in_quote {
            cur.push(ch);
            if ch == quote_char {
                in_quote = false;
            }
            continue;
        }
        match ch {
            '\'' | '"' => {
                if !cur.is_empty() {
                    words.push(std::mem::take(&mut cur));
                }
                in_quote = true;
                quote_char = ch;
                cur.push(ch);
            }
            c if c.is_whitespace() => {
                if !cur.is_empty() {
                    words.push(std::mem::take(&mut cur));
                }
            }
            c => cur.push(c),
        }
    }
    if !cur.is_empty() {
        words.push(cur);
    }
    words
}

fn is_quoted(word: &str) -> bool {
    let b = word.as_bytes();
    b.len() >= 2
        && ((b[0] == b'\'' && b[b.len() - 1] == b'\'') || (b[0] == b'"' && b[b.len() - 1] == b'"'))
}

fn find_punct(word: &str) -> Option<&'static str> {
    PUNCTUATION.iter().find(|p| word.contains(*p)).copied()
}

fn recursive_lex(word: &str, out: &mut Vec<Token>) {
    if word.is_empty() {
        return;
    }
    if is_quoted(word) {
        out.push(Token::new(TokenKind::Entity, word));
        return;
    }
    if let Some(kw) = KEYWORDS.iter().find(|k| word.eq_ignore_ascii_case(k)) {
        out.push(Token::new(TokenKind::Keyword, kw.to_ascii_uppercase()));
        return;
    }
    if let Some(p) = find_punct(word) {
        let spaced = word.replacen(p, &format!(" {p} "), 1);
        for part in spaced.split(' ').filter(|s| !s.is_empty()) {
            recursive_lex(part, out);
        }
        return;
    }
    let kind = if OPERATORS.contains(&word) {
        TokenKind::Operator
    } else if PUNCT_ONLY.contains(&word) {
        TokenKind::Punct
    } else {
        TokenKind::Entity
    };
    out.push(Token::new(kind, word));
}

/// Lexes a query string into a flat token sequence. Total on well-formed
/// ASCII input (spec.md §8): every character either contributes to a token
/// or is whitespace consumed between them.
pub fn lex(query: &str) -> Vec<Token> {
    let trimmed = query.trim();
    let mut out = Vec::new();
    for word in quote_aware_words(trimmed) {
        recursive_lex(&word, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_simple_select() {
        let toks = lex("SELECT id, nome FROM usinas WHERE id > 10");
        let rendered: Vec<&str> = toks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(
            rendered,
            vec!["SELECT", "id", ",", "nome", "FROM", "usinas", "WHERE", "id", ">", "10"]
        );
    }

    #[test]
    fn recognizes_glued_punctuation() {
        let toks = lex("WHERE id>10 AND x!=5");
        let rendered: Vec<&str> = toks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(rendered, vec!["WHERE", "id", ">", "10", "AND", "x", "!=", "5"]);
    }

    #[test]
    fn keeps_quoted_literals_intact() {
        let toks = lex("WHERE data_rodada = '2023-01-01T00:00:00+00:00'");
        assert_eq!(toks.last().unwrap().text, "'2023-01-01T00:00:00+00:00'");
        assert!(toks.last().unwrap().is_entity());
    }

    #[test]
    fn is_case_insensitive_for_keywords() {
        let toks = lex("select id from usinas");
        assert!(toks[0].is_keyword("SELECT"));
        assert!(toks[2].is_keyword("FROM"));
    }

    #[test]
    fn handles_dotted_qualified_column() {
        let toks = lex("SELECT usinas.id FROM usinas");
        let rendered: Vec<&str> = toks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(rendered, vec!["SELECT", "usinas", ".", "id", "FROM", "usinas"]);
    }

    #[test]
    fn lexes_in_list_with_trailing_comma() {
        let toks = lex("WHERE x IN (1, )");
        let rendered: Vec<&str> = toks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(rendered, vec!["WHERE", "x", "IN", "(", "1", ",", ")"]);
    }
}
