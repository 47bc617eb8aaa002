//! TOML description of a region digraph.
//!
//! ```toml
//! [[region]]
//! name = "kernel"
//! modules = [1, 2]
//!
//! [[region]]
//! name = "user"
//! modules = [10]
//!
//! [[edge]]
//! tail = "user"
//! head = "kernel"
//! [edge.filter]
//! module = ["(name=org.example.api)"]
//! service = ["(objectClass=org.example.Log)"]
//! ```
//!
//! Filter text is compiled by [`DigraphConfig::build`], so a malformed
//! expression is reported when the digraph is built, never during a query.

use std::collections::BTreeMap;
use std::path::Path;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::digraph::RegionDigraph;
use crate::error::RegionResult;
use crate::filter::RegionFilter;
use crate::region::ModuleId;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read digraph config: {path}")]
    #[diagnostic(
        code(region::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse digraph config {path}: {message}")]
    #[diagnostic(
        code(region::config::parse),
        help(
            "Check the TOML syntax. Regions are `[[region]]` tables with `name` and `modules`; \
             edges are `[[edge]]` tables with `tail`, `head` and an `[edge.filter]` table \
             mapping namespaces to lists of filter expressions."
        )
    )]
    Parse { path: String, message: String },

    #[error("failed to write digraph config: {path}")]
    #[diagnostic(
        code(region::config::write),
        help("Ensure you have write permissions to the target directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize digraph config: {message}")]
    #[diagnostic(code(region::config::serialize))]
    Serialize { message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// A whole digraph as written in a config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DigraphConfig {
    #[serde(rename = "region", default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<RegionConfig>,
    #[serde(rename = "edge", default, skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<EdgeConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    #[serde(default)]
    pub modules: Vec<ModuleId>,
}

/// One filtered edge: `tail` imports from `head` what `filter` admits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeConfig {
    pub tail: String,
    pub head: String,
    /// Namespace → filter expressions. An empty map denies everything.
    #[serde(default)]
    pub filter: BTreeMap<String, Vec<String>>,
}

impl DigraphConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config = Self::parse(&content, &path.display().to_string())?;
        tracing::info!(
            path = %path.display(),
            regions = config.regions.len(),
            edges = config.edges.len(),
            "loaded digraph config"
        );
        Ok(config)
    }

    /// Parse TOML text.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Self::parse(content, "<string>")
    }

    fn parse(content: &str, origin: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
            message: e.to_string(),
        })
    }

    /// Save to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = self.to_toml_string()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Compile filters and assemble the digraph.
    ///
    /// Regions are created first, so edges may reference regions declared
    /// later in the file.
    pub fn build(&self) -> RegionResult<RegionDigraph> {
        let mut digraph = RegionDigraph::new();
        for region in &self.regions {
            digraph.create_region(&region.name)?;
            for &module in &region.modules {
                digraph.add_module(&region.name, module)?;
            }
        }
        for edge in &self.edges {
            let filter = RegionFilter::from_policy(edge.filter.clone())?;
            digraph.connect(&edge.tail, filter, &edge.head)?;
        }
        tracing::debug!(
            regions = digraph.region_count(),
            edges = digraph.edge_count(),
            "built region digraph from config"
        );
        Ok(digraph)
    }

    /// Describe an existing digraph, regions and edges ordered by name.
    pub fn from_digraph(digraph: &RegionDigraph) -> Self {
        Self {
            regions: digraph
                .regions()
                .map(|r| RegionConfig {
                    name: r.name().to_string(),
                    modules: r.members().collect(),
                })
                .collect(),
            edges: digraph
                .edges()
                .into_iter()
                .map(|(tail, filter, head)| EdgeConfig {
                    tail: tail.name().to_string(),
                    head: head.name().to_string(),
                    filter: filter.sharing_policy(),
                })
                .collect(),
        }
    }
}

impl RegionDigraph {
    /// The config that rebuilds this digraph.
    pub fn to_config(&self) -> DigraphConfig {
        DigraphConfig::from_digraph(self)
    }
}
