//! Tag expression parser and evaluator
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! or   := and ("or" and)*
//! and  := not ("and" not)*
//! not  := "not" not | atom
//! atom := label | "(" or ")"
//! ```
//!
//! Labels are resolved by membership only, so an unknown label is simply
//! false.

use std::fmt;
use thiserror::Error;

/// Deepest `not`/parenthesis nesting accepted by the parser
pub const MAX_NESTING: usize = 64;

/// Errors raised while parsing a tag expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagExprError {
    #[error("Empty tag expression")]
    Empty,

    #[error("Unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("Unexpected token '{found}' at offset {offset}, expected {expected}")]
    UnexpectedToken {
        found: String,
        offset: usize,
        expected: &'static str,
    },

    #[error("Unexpected end of expression, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("Tag expression nested deeper than {limit} levels at offset {offset}")]
    TooDeep { limit: usize, offset: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    And,
    Or,
    Not,
    LParen,
    RParen,
    Label(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Label(label) => write!(f, "{label}"),
        }
    }
}

fn is_label_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, TagExprError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '(' {
            tokens.push((Token::LParen, offset));
            chars.next();
        } else if c == ')' {
            tokens.push((Token::RParen, offset));
            chars.next();
        } else if is_label_char(c) {
            let mut word = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if !is_label_char(c) {
                    break;
                }
                word.push(c);
                chars.next();
            }
            let token = match word.as_str() {
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                _ => Token::Label(word),
            };
            tokens.push((token, offset));
        } else {
            return Err(TagExprError::UnexpectedChar { ch: c, offset });
        }
    }

    Ok(tokens)
}

/// A compiled tag expression
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagExpr {
    Label(String),
    Not(Box<TagExpr>),
    And(Box<TagExpr>, Box<TagExpr>),
    Or(Box<TagExpr>, Box<TagExpr>),
}

impl TagExpr {
    /// Parse an expression such as `slow and not (db or gui)`
    pub fn parse(input: &str) -> Result<Self, TagExprError> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(TagExprError::Empty);
        }

        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.parse_or()?;
        match parser.tokens.get(parser.pos) {
            None => Ok(expr),
            Some((token, offset)) => Err(TagExprError::UnexpectedToken {
                found: token.to_string(),
                offset: *offset,
                expected: "end of expression",
            }),
        }
    }

    /// Evaluate against a membership function
    pub fn eval(&self, has: &dyn Fn(&str) -> bool) -> bool {
        match self {
            TagExpr::Label(label) => has(label),
            TagExpr::Not(inner) => !inner.eval(has),
            TagExpr::And(lhs, rhs) => lhs.eval(has) && rhs.eval(has),
            TagExpr::Or(lhs, rhs) => lhs.eval(has) || rhs.eval(has),
        }
    }

    /// Labels referenced anywhere in the expression
    pub fn labels(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_labels(&mut out);
        out
    }

    fn collect_labels<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TagExpr::Label(label) => out.push(label),
            TagExpr::Not(inner) => inner.collect_labels(out),
            TagExpr::And(lhs, rhs) | TagExpr::Or(lhs, rhs) => {
                lhs.collect_labels(out);
                rhs.collect_labels(out);
            }
        }
    }
}

impl fmt::Display for TagExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagExpr::Label(label) => write!(f, "{label}"),
            TagExpr::Not(inner) => write!(f, "not {inner}"),
            TagExpr::And(lhs, rhs) => write!(f, "({lhs} and {rhs})"),
            TagExpr::Or(lhs, rhs) => write!(f, "({lhs} or {rhs})"),
        }
    }
}

impl std::str::FromStr for TagExpr {
    type Err = TagExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TagExpr::parse(s)
    }
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn descend(&mut self) -> Result<(), TagExprError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            let offset = self.tokens.get(self.pos).map_or(0, |(_, offset)| *offset);
            return Err(TagExprError::TooDeep {
                limit: MAX_NESTING,
                offset,
            });
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<TagExpr, TagExprError> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.parse_and()?;
            lhs = TagExpr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<TagExpr, TagExprError> {
        let mut lhs = self.parse_not()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.parse_not()?;
            lhs = TagExpr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<TagExpr, TagExprError> {
        if self.peek() == Some(&Token::Not) {
            self.descend()?;
            self.pos += 1;
            let inner = self.parse_not()?;
            self.depth -= 1;
            return Ok(TagExpr::Not(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<TagExpr, TagExprError> {
        const EXPECTED: &str = "a label or '('";

        let Some((token, offset)) = self.tokens.get(self.pos).cloned() else {
            return Err(TagExprError::UnexpectedEnd { expected: EXPECTED });
        };
        self.pos += 1;

        match token {
            Token::Label(label) => Ok(TagExpr::Label(label)),
            Token::LParen => {
                self.descend()?;
                let inner = self.parse_or()?;
                self.depth -= 1;
                match self.tokens.get(self.pos) {
                    Some((Token::RParen, _)) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    Some((found, offset)) => Err(TagExprError::UnexpectedToken {
                        found: found.to_string(),
                        offset: *offset,
                        expected: "')'",
                    }),
                    None => Err(TagExprError::UnexpectedEnd { expected: "')'" }),
                }
            }
            other => Err(TagExprError::UnexpectedToken {
                found: other.to_string(),
                offset,
                expected: EXPECTED,
            }),
        }
    }
}
