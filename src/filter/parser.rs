//! Recursive-descent parser for LDAP-style filter expressions.
//!
//! ```text
//! filter := '(' comp ')'
//! comp   := '&' filter+ | '|' filter+ | '!' filter | '*' | item
//! item   := attr ( '=' | '~=' | '>=' | '<=' ) value
//! ```
//!
//! Unescaped `*` in an `=` value makes a substring or presence test; a
//! backslash escapes the next character. Whitespace between tokens is
//! ignored, whitespace inside values is kept.

use crate::error::FilterError;

use super::expr::{CompareOp, FilterExpr};

/// Parse a complete filter expression.
pub fn parse(text: &str) -> Result<FilterExpr, FilterError> {
    let mut parser = Parser { src: text, pos: 0 };
    parser.skip_ws();
    let expr = parser.filter()?;
    parser.skip_ws();
    if parser.pos < text.len() {
        return Err(parser.error("unexpected input after the closing parenthesis"));
    }
    Ok(expr)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

/// A value segment between unescaped `*` characters.
enum Piece {
    Text(String),
    Star,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, message: &str) -> FilterError {
        FilterError::Parse {
            expression: self.src.to_string(),
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn expect(&mut self, wanted: char) -> Result<(), FilterError> {
        match self.peek() {
            Some(c) if c == wanted => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(&format!("expected '{wanted}', found '{c}'"))),
            None => Err(self.error(&format!("expected '{wanted}', found end of expression"))),
        }
    }

    fn filter(&mut self) -> Result<FilterExpr, FilterError> {
        self.expect('(')?;
        self.skip_ws();
        let expr = match self.peek() {
            Some('&') => {
                self.bump();
                FilterExpr::And(self.operands()?)
            }
            Some('|') => {
                self.bump();
                FilterExpr::Or(self.operands()?)
            }
            Some('!') => {
                self.bump();
                self.skip_ws();
                let inner = self.filter()?;
                self.skip_ws();
                FilterExpr::Not(Box::new(inner))
            }
            Some('*') if self.src[self.pos + 1..].trim_start().starts_with(')') => {
                self.bump();
                self.skip_ws();
                FilterExpr::MatchAll
            }
            Some(_) => self.item()?,
            None => return Err(self.error("unexpected end of expression")),
        };
        self.expect(')')?;
        Ok(expr)
    }

    fn operands(&mut self) -> Result<Vec<FilterExpr>, FilterError> {
        self.skip_ws();
        let mut items = Vec::new();
        while self.peek() == Some('(') {
            items.push(self.filter()?);
            self.skip_ws();
        }
        if items.is_empty() {
            return Err(self.error("expected at least one operand"));
        }
        Ok(items)
    }

    fn item(&mut self) -> Result<FilterExpr, FilterError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '=' | '~' | '<' | '>' | '(' | ')') {
                break;
            }
            self.bump();
        }
        let attr = self.src[start..self.pos].trim().to_string();
        if attr.is_empty() {
            return Err(self.error("missing attribute name"));
        }

        let op = match self.peek() {
            Some('=') => CompareOp::Equal,
            Some('~') => CompareOp::Approx,
            Some('>') => CompareOp::GreaterEq,
            Some('<') => CompareOp::LessEq,
            _ => return Err(self.error("expected one of '=', '~=', '>=', '<='")),
        };
        self.bump();
        if op != CompareOp::Equal {
            self.expect('=')?;
        }

        let pieces = self.value()?;
        if op != CompareOp::Equal {
            let value = pieces
                .into_iter()
                .map(|p| match p {
                    Piece::Text(t) => t,
                    Piece::Star => "*".to_string(),
                })
                .collect();
            return Ok(FilterExpr::Compare { attr, op, value });
        }

        Ok(classify_equal(attr, pieces))
    }

    fn value(&mut self) -> Result<Vec<Piece>, FilterError> {
        let mut pieces = Vec::new();
        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated value, expected ')'")),
                Some(')') => break,
                Some('(') => return Err(self.error("unescaped '(' in value")),
                Some('\\') => {
                    self.bump();
                    match self.bump() {
                        Some(c) => text.push(c),
                        None => return Err(self.error("dangling escape at end of expression")),
                    }
                }
                Some('*') => {
                    self.bump();
                    if !text.is_empty() {
                        pieces.push(Piece::Text(std::mem::take(&mut text)));
                    }
                    pieces.push(Piece::Star);
                }
                Some(c) => {
                    self.bump();
                    text.push(c);
                }
            }
        }
        if !text.is_empty() {
            pieces.push(Piece::Text(text));
        }
        Ok(pieces)
    }
}

/// Turn the pieces of an `=` value into equality, presence or substring.
fn classify_equal(attr: String, pieces: Vec<Piece>) -> FilterExpr {
    if !pieces.iter().any(|p| matches!(p, Piece::Star)) {
        let value = pieces
            .into_iter()
            .filter_map(|p| match p {
                Piece::Text(t) => Some(t),
                Piece::Star => None,
            })
            .collect();
        return FilterExpr::Compare {
            attr,
            op: CompareOp::Equal,
            value,
        };
    }

    let starts_with_text = matches!(pieces.first(), Some(Piece::Text(_)));
    let ends_with_text = matches!(pieces.last(), Some(Piece::Text(_)));
    let mut texts: Vec<String> = pieces
        .into_iter()
        .filter_map(|p| match p {
            Piece::Text(t) => Some(t),
            Piece::Star => None,
        })
        .collect();

    if texts.is_empty() {
        return FilterExpr::Present { attr };
    }

    let initial = if starts_with_text {
        Some(texts.remove(0))
    } else {
        None
    };
    let last = if ends_with_text { texts.pop() } else { None };

    FilterExpr::Substring {
        attr,
        initial,
        any: texts,
        last,
    }
}
