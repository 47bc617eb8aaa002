// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # region-digraph
//!
//! Region-based isolation for module platforms. Installed modules are
//! partitioned into named regions; regions are connected by directed edges
//! whose filters decide which modules, services and capabilities cross.
//!
//! ## Architecture
//!
//! - **Regions** (`region`): module identities and named isolation domains
//! - **Filters** (`filter`): per-namespace LDAP-style predicates over typed `attributes`
//! - **Digraph** (`digraph`): petgraph-backed regions and filtered edges, with
//!   copy-on-write snapshots for concurrent readers
//! - **Traversal** (`traverse`): path-sensitive depth-first visibility computation
//! - **Queries** (`query`): module, service and capability front-ends
//! - **Config** (`config`): TOML description of a digraph
//!
//! ## Library usage
//!
//! ```
//! use region_digraph::digraph::RegionDigraph;
//! use region_digraph::filter::RegionFilter;
//! use region_digraph::query::{ModuleCandidate, ModuleVisibility};
//! use region_digraph::region::ModuleId;
//! use region_digraph::version::{Version, VersionRange};
//!
//! let mut digraph = RegionDigraph::new();
//! digraph.create_region("app").unwrap();
//! digraph.create_region("lib").unwrap();
//! digraph.add_module("app", ModuleId::new(1)).unwrap();
//! digraph.add_module("lib", ModuleId::new(2)).unwrap();
//! let filter = RegionFilter::builder()
//!     .allow_module("org.lib", &VersionRange::parse("[1.0,2.0)").unwrap())
//!     .build();
//! digraph.connect("app", filter, "lib").unwrap();
//!
//! let lib = ModuleCandidate::new(2u64, "org.lib", Version::new(1, 4, 0));
//! assert!(ModuleVisibility::new(&digraph).is_visible(ModuleId::new(1), &lib));
//! ```

pub mod attributes;
pub mod config;
pub mod digraph;
pub mod error;
pub mod filter;
pub mod query;
pub mod region;
pub mod traverse;
pub mod version;
