//! Dotted module versions and version ranges.
//!
//! Versions are `major[.minor[.micro[.qualifier]]]`; missing numeric
//! components default to zero and the qualifier compares lexically. Ranges use
//! interval notation (`[1.0,2.0)`), or a bare version meaning "at least".

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// A module version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    major: u64,
    minor: u64,
    micro: u64,
    qualifier: String,
}

impl Version {
    /// The empty version, `0.0.0`.
    pub const ZERO: Version = Version {
        major: 0,
        minor: 0,
        micro: 0,
        qualifier: String::new(),
    };

    /// Create a version without a qualifier.
    pub fn new(major: u64, minor: u64, micro: u64) -> Self {
        Self {
            major,
            minor,
            micro,
            qualifier: String::new(),
        }
    }

    /// Attach a qualifier.
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = qualifier.into();
        self
    }

    /// Parse a version string.
    pub fn parse(text: &str) -> Result<Self, FilterError> {
        let invalid = |message: &str| FilterError::InvalidVersion {
            text: text.to_string(),
            message: message.to_string(),
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(invalid("version is empty"));
        }

        let mut parts = trimmed.splitn(4, '.');
        let mut numbers = [0u64; 3];
        for (i, slot) in numbers.iter_mut().enumerate() {
            match parts.next() {
                Some(part) => {
                    *slot = part.parse().map_err(|_| {
                        invalid(&format!("component {} (\"{part}\") is not a non-negative integer", i + 1))
                    })?;
                }
                None => break,
            }
        }

        let qualifier = match parts.next() {
            Some(q) if q.is_empty() => return Err(invalid("qualifier is empty")),
            Some(q) => {
                if !q
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
                {
                    return Err(invalid(
                        "qualifier may only contain letters, digits, '_' and '-'",
                    ));
                }
                q.to_string()
            }
            None => String::new(),
        };

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            micro: numbers[2],
            qualifier,
        })
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn micro(&self) -> u64 {
        self.micro
    }

    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = FilterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.to_string()
    }
}

// ---------------------------------------------------------------------------
// Version range
// ---------------------------------------------------------------------------

/// An interval of versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    floor: Version,
    floor_inclusive: bool,
    /// `None` means unbounded.
    ceiling: Option<(Version, bool)>,
}

impl VersionRange {
    /// Every version.
    pub fn any() -> Self {
        Self::at_least(Version::ZERO)
    }

    /// `[floor, ∞)`.
    pub fn at_least(floor: Version) -> Self {
        Self {
            floor,
            floor_inclusive: true,
            ceiling: None,
        }
    }

    /// `[floor, ceiling)`.
    pub fn half_open(floor: Version, ceiling: Version) -> Self {
        Self {
            floor,
            floor_inclusive: true,
            ceiling: Some((ceiling, false)),
        }
    }

    /// `[version, version]`.
    pub fn exactly(version: Version) -> Self {
        Self {
            floor: version.clone(),
            floor_inclusive: true,
            ceiling: Some((version, true)),
        }
    }

    /// Parse interval notation or a bare version.
    pub fn parse(text: &str) -> Result<Self, FilterError> {
        let invalid = |message: String| FilterError::InvalidVersionRange {
            text: text.to_string(),
            message,
        };

        let trimmed = text.trim();
        let Some(open) = trimmed.chars().next() else {
            return Err(invalid("range is empty".into()));
        };

        if open != '[' && open != '(' {
            let floor = Version::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
            return Ok(Self::at_least(floor));
        }

        let close = trimmed.chars().last().unwrap_or(open);
        if trimmed.len() < 2 || (close != ']' && close != ')') {
            return Err(invalid("interval must end with ']' or ')'".into()));
        }

        let body = &trimmed[1..trimmed.len() - 1];
        let Some((low, high)) = body.split_once(',') else {
            return Err(invalid("interval needs a floor and a ceiling separated by ','".into()));
        };

        let floor = Version::parse(low).map_err(|e| invalid(e.to_string()))?;
        let ceiling = Version::parse(high).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            floor,
            floor_inclusive: open == '[',
            ceiling: Some((ceiling, close == ']')),
        })
    }

    /// Whether `version` lies inside this range.
    pub fn includes(&self, version: &Version) -> bool {
        let above_floor = if self.floor_inclusive {
            *version >= self.floor
        } else {
            *version > self.floor
        };
        if !above_floor {
            return false;
        }
        match &self.ceiling {
            None => true,
            Some((ceiling, true)) => version <= ceiling,
            Some((ceiling, false)) => version < ceiling,
        }
    }

    pub fn floor(&self) -> &Version {
        &self.floor
    }

    pub fn ceiling(&self) -> Option<&Version> {
        self.ceiling.as_ref().map(|(v, _)| v)
    }

    pub fn floor_inclusive(&self) -> bool {
        self.floor_inclusive
    }

    pub fn ceiling_inclusive(&self) -> bool {
        self.ceiling.as_ref().is_some_and(|(_, inclusive)| *inclusive)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ceiling {
            None if self.floor_inclusive => write!(f, "{}", self.floor),
            None => write!(f, "({},)", self.floor),
            Some((ceiling, inclusive)) => write!(
                f,
                "{}{},{}{}",
                if self.floor_inclusive { '[' } else { '(' },
                self.floor,
                ceiling,
                if *inclusive { ']' } else { ')' },
            ),
        }
    }
}

impl FromStr for VersionRange {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionRange {
    type Error = FilterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VersionRange> for String {
    fn from(r: VersionRange) -> Self {
        r.to_string()
    }
}
