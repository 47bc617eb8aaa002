//! LDAP-style filter expression AST and its evaluation against [`Attributes`].

use std::cmp::Ordering;
use std::fmt;

use crate::attributes::{AttrValue, Attributes};
use crate::version::Version;

/// Comparison operator of a simple filter item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `attr=value`
    Equal,
    /// `attr~=value`: case- and whitespace-insensitive equality.
    Approx,
    /// `attr>=value`
    GreaterEq,
    /// `attr<=value`
    LessEq,
}

impl CompareOp {
    fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::Approx => "~=",
            Self::GreaterEq => ">=",
            Self::LessEq => "<=",
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Equal | Self::Approx => ordering == Ordering::Equal,
            Self::GreaterEq => ordering != Ordering::Less,
            Self::LessEq => ordering != Ordering::Greater,
        }
    }
}

/// A compiled filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// `(*)`: matches any attribute map, including an empty one.
    MatchAll,
    /// `(&(a)(b)...)`
    And(Vec<FilterExpr>),
    /// `(|(a)(b)...)`
    Or(Vec<FilterExpr>),
    /// `(!(a))`
    Not(Box<FilterExpr>),
    /// `(attr=*)`
    Present { attr: String },
    /// `(attr op value)`
    Compare {
        attr: String,
        op: CompareOp,
        value: String,
    },
    /// `(attr=init*any*...*final)`
    Substring {
        attr: String,
        initial: Option<String>,
        any: Vec<String>,
        last: Option<String>,
    },
}

impl FilterExpr {
    /// Compile an expression from text. See [`super::parser`].
    pub fn parse(text: &str) -> Result<Self, crate::error::FilterError> {
        super::parser::parse(text)
    }

    /// `(attr=value)`
    pub fn equals(attr: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Compare {
            attr: attr.into(),
            op: CompareOp::Equal,
            value: value.into(),
        }
    }

    /// Evaluate against an attribute map.
    pub fn matches(&self, attrs: &Attributes) -> bool {
        match self {
            Self::MatchAll => true,
            Self::And(items) => items.iter().all(|item| item.matches(attrs)),
            Self::Or(items) => items.iter().any(|item| item.matches(attrs)),
            Self::Not(item) => !item.matches(attrs),
            Self::Present { attr } => attrs.contains_key(attr),
            Self::Compare { attr, op, value } => attrs
                .get(attr)
                .is_some_and(|actual| compare(actual, *op, value)),
            Self::Substring {
                attr,
                initial,
                any,
                last,
            } => attrs.get(attr).is_some_and(|actual| {
                substring(actual, initial.as_deref(), any, last.as_deref())
            }),
        }
    }
}

fn compare(actual: &AttrValue, op: CompareOp, literal: &str) -> bool {
    match actual {
        AttrValue::Str(s) => match op {
            CompareOp::Approx => normalize_approx(s) == normalize_approx(literal),
            _ => op.accepts(s.as_str().cmp(literal)),
        },
        AttrValue::Long(n) => compare_integer(i128::from(*n), op, literal),
        AttrValue::ULong(n) => compare_integer(i128::from(*n), op, literal),
        AttrValue::Double(d) => literal
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(|expected| d.partial_cmp(&expected))
            .is_some_and(|ordering| op.accepts(ordering)),
        // Booleans have no order; every operator tests equality.
        AttrValue::Bool(b) => parse_bool(literal).is_some_and(|expected| *b == expected),
        AttrValue::Version(v) => Version::parse(literal)
            .is_ok_and(|expected| op.accepts(v.cmp(&expected))),
        AttrValue::List(items) => items.iter().any(|item| compare(item, op, literal)),
    }
}

/// Signed and unsigned 64-bit values both fit in `i128`, so a literal is
/// never clamped into range.
fn compare_integer(actual: i128, op: CompareOp, literal: &str) -> bool {
    literal
        .trim()
        .parse::<i128>()
        .is_ok_and(|expected| op.accepts(actual.cmp(&expected)))
}

fn substring(actual: &AttrValue, initial: Option<&str>, any: &[String], last: Option<&str>) -> bool {
    match actual {
        AttrValue::Str(s) => substring_str(s, initial, any, last),
        AttrValue::List(items) => items
            .iter()
            .any(|item| substring(item, initial, any, last)),
        _ => false,
    }
}

fn substring_str(s: &str, initial: Option<&str>, any: &[String], last: Option<&str>) -> bool {
    let mut rest = s;
    if let Some(prefix) = initial {
        match rest.strip_prefix(prefix) {
            Some(r) => rest = r,
            None => return false,
        }
    }
    if let Some(suffix) = last {
        match rest.strip_suffix(suffix) {
            Some(r) => rest = r,
            None => return false,
        }
    }
    for piece in any {
        match rest.find(piece.as_str()) {
            Some(pos) => rest = &rest[pos + piece.len()..],
            None => return false,
        }
    }
    true
}

fn normalize_approx(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn parse_bool(literal: &str) -> Option<bool> {
    let t = literal.trim();
    if t.eq_ignore_ascii_case("true") {
        Some(true)
    } else if t.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn write_escaped(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    for c in value.chars() {
        if matches!(c, '(' | ')' | '*' | '\\') {
            write!(f, "\\")?;
        }
        write!(f, "{c}")?;
    }
    Ok(())
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchAll => write!(f, "(*)"),
            Self::And(items) | Self::Or(items) => {
                let op = if matches!(self, Self::And(_)) { '&' } else { '|' };
                write!(f, "({op}")?;
                for item in items {
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Self::Not(item) => write!(f, "(!{item})"),
            Self::Present { attr } => write!(f, "({attr}=*)"),
            Self::Compare { attr, op, value } => {
                write!(f, "({attr}{}", op.symbol())?;
                write_escaped(f, value)?;
                write!(f, ")")
            }
            Self::Substring {
                attr,
                initial,
                any,
                last,
            } => {
                write!(f, "({attr}=")?;
                if let Some(prefix) = initial {
                    write_escaped(f, prefix)?;
                }
                write!(f, "*")?;
                for piece in any {
                    write_escaped(f, piece)?;
                    write!(f, "*")?;
                }
                if let Some(suffix) = last {
                    write_escaped(f, suffix)?;
                }
                write!(f, ")")
            }
        }
    }
}
