//! Token model shared by the lexer and the SELECT parser/resolver.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Punct,
    Operator,
    Entity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Token {
        Token { kind, text: text.into() }
    }

    pub fn is_keyword(&self, kw: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text.eq_ignore_ascii_case(kw)
    }

    pub fn is_punct(&self, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == p
    }

    pub fn is_operator(&self) -> bool {
        self.kind == TokenKind::Operator
    }

    pub fn is_entity(&self) -> bool {
        self.kind == TokenKind::Entity
    }
}

pub const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "AS", "JOIN", "INNER", "LEFT", "RIGHT", "OUTER", "ON", "AND", "OR",
    "NOT", "IN",
];

/// Punctuation recognized even when glued to a neighboring token.
pub const PUNCTUATION: &[&str] = &[
    "<=", ">=", "!=", "<>", "=", "<", ">", ".", ",", ";", "(", ")", "*",
];
