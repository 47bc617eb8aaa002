//! Rich diagnostic error types for the region digraph.
//!
//! Every error here is a configuration-time error: it is raised while a
//! filter is compiled or while the digraph is built or mutated. Visibility
//! queries never fail; they fall back to an empty result instead.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;

/// Top-level error type for the crate.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum RegionError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Digraph(#[from] DigraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for operations that can fail with any crate error.
pub type RegionResult<T> = std::result::Result<T, RegionError>;

// ---------------------------------------------------------------------------
// Filter errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum FilterError {
    #[error("invalid filter expression \"{expression}\" at offset {offset}: {message}")]
    #[diagnostic(
        code(region::filter::parse),
        help(
            "Filter expressions use LDAP syntax, e.g. \"(&(name=org.example)(version>=1.0))\". \
             Every item must be wrapped in parentheses, and literal '(', ')', '*' or '\\' \
             characters inside values must be escaped with a backslash."
        )
    )]
    Parse {
        expression: String,
        offset: usize,
        message: String,
    },

    #[error("invalid version \"{text}\": {message}")]
    #[diagnostic(
        code(region::filter::version),
        help(
            "Versions are written as major[.minor[.micro[.qualifier]]], where the first \
             three components are non-negative integers, e.g. \"1.2.3.final\"."
        )
    )]
    InvalidVersion { text: String, message: String },

    #[error("invalid version range \"{text}\": {message}")]
    #[diagnostic(
        code(region::filter::version_range),
        help(
            "Version ranges are written as \"[1.0,2.0)\" (inclusive floor, exclusive ceiling), \
             any mix of '[' '(' and ']' ')', or a bare version meaning \"this version or later\"."
        )
    )]
    InvalidVersionRange { text: String, message: String },
}

// ---------------------------------------------------------------------------
// Digraph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DigraphError {
    #[error("region already exists: {name}")]
    #[diagnostic(
        code(region::digraph::region_exists),
        help("Region names are unique within a digraph. Pick another name or remove the existing region first.")
    )]
    RegionExists { name: String },

    #[error("region not found: {name}")]
    #[diagnostic(
        code(region::digraph::region_not_found),
        help("Create the region with `create_region()` before adding modules or edges that reference it.")
    )]
    RegionNotFound { name: String },

    #[error("invalid region name: \"{name}\"")]
    #[diagnostic(
        code(region::digraph::invalid_name),
        help("Region names must contain at least one non-whitespace character.")
    )]
    InvalidRegionName { name: String },

    #[error("region {name} cannot be connected to itself")]
    #[diagnostic(
        code(region::digraph::self_loop),
        help("A region always sees its own modules; an edge from a region to itself is meaningless.")
    )]
    SelfLoop { name: String },

    #[error("an edge from {tail} to {head} already exists")]
    #[diagnostic(
        code(region::digraph::duplicate_edge),
        help(
            "At most one filtered edge may connect an ordered pair of regions. \
             Use `replace_edge()` to swap in a new filter, or widen the existing filter."
        )
    )]
    DuplicateEdge { tail: String, head: String },

    #[error("module {module} already belongs to region {region}")]
    #[diagnostic(
        code(region::digraph::module_assigned),
        help("A module belongs to at most one region. Remove it from {region} before adding it elsewhere.")
    )]
    ModuleAlreadyAssigned { module: u64, region: String },

    #[error("stale digraph snapshot: based on version {expected}, but version {actual} is published")]
    #[diagnostic(
        code(region::digraph::stale_snapshot),
        help(
            "Another update was published after this copy was taken. \
             Take a fresh snapshot, re-apply the change, and commit again."
        )
    )]
    StaleSnapshot { expected: u64, actual: u64 },
}
