//! Capability visibility: generic namespaced capabilities.
//!
//! A capability carries its own namespace, so one edge filter can admit
//! `export` capabilities while denying `import` ones. The `all` namespace of a
//! filter still applies to every capability.
//!
//! Attribute values read from JSON carry versions as plain strings. A
//! candidate lists the keys that hold versions in `version_keys`, and those
//! values are compared as versions, so `(version>=1.10)` rejects `"1.9"`.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::attributes::{AttrValue, Attributes};
use crate::digraph::RegionDigraph;
use crate::filter::RegionFilter;
use crate::region::{ModuleId, Region};
use crate::traverse::VisibilityPolicy;
use crate::version::Version;

use super::Visibility;

/// A capability offered by some module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityCandidate {
    /// Module offering the capability.
    pub owner: ModuleId,
    pub namespace: String,
    #[serde(default)]
    pub attributes: Attributes,
    /// Attribute keys whose string values are versions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub version_keys: Vec<String>,
}

impl CapabilityCandidate {
    pub fn new(owner: impl Into<ModuleId>, namespace: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            namespace: namespace.into(),
            attributes: Attributes::new(),
            version_keys: Vec::new(),
        }
    }

    /// Mark `key` as holding a version.
    pub fn with_version_key(mut self, key: &str) -> Self {
        self.version_keys.push(key.to_string());
        self
    }

    /// Attributes as seen by filters, with `version_keys` typed as versions.
    ///
    /// A string that does not parse as a version stays a string.
    pub fn filter_attributes(&self) -> Cow<'_, Attributes> {
        if self.version_keys.is_empty() {
            return Cow::Borrowed(&self.attributes);
        }
        let mut attrs = self.attributes.clone();
        for key in &self.version_keys {
            let parsed = match attrs.get(key) {
                Some(AttrValue::Str(text)) => Version::parse(text).ok(),
                _ => None,
            };
            if let Some(version) = parsed {
                attrs.insert(key, version);
            }
        }
        Cow::Owned(attrs)
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key, value);
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityPolicy;

impl VisibilityPolicy for CapabilityPolicy {
    type Candidate = CapabilityCandidate;

    fn is_local(&self, region: &Region, candidate: &CapabilityCandidate) -> bool {
        region.contains(candidate.owner)
    }

    fn admits(&self, filter: &RegionFilter, candidate: &CapabilityCandidate) -> bool {
        filter.allows(&candidate.namespace, &candidate.filter_attributes())
    }
}

/// Capability visibility front-end.
pub type CapabilityVisibility<'g> = Visibility<'g, CapabilityPolicy>;

impl<'g> Visibility<'g, CapabilityPolicy> {
    pub fn new(digraph: &'g RegionDigraph) -> Self {
        Self::with_policy(digraph, CapabilityPolicy, "capability")
    }
}
