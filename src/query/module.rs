//! Module visibility: which installed modules a requester can see.

use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::digraph::RegionDigraph;
use crate::filter::{RegionFilter, keys, namespace};
use crate::region::{ModuleId, Region};
use crate::traverse::VisibilityPolicy;
use crate::version::Version;

use super::Visibility;

/// A module being tested for visibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleCandidate {
    pub id: ModuleId,
    /// Symbolic name.
    pub name: String,
    #[serde(default)]
    pub version: Version,
}

impl ModuleCandidate {
    pub fn new(id: impl Into<ModuleId>, name: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version,
        }
    }

    /// Attributes seen by module-namespace filters.
    pub fn attributes(&self) -> Attributes {
        Attributes::new()
            .with(keys::ID, self.id.get())
            .with(keys::NAME, self.name.as_str())
            .with(keys::VERSION, self.version.clone())
    }
}

/// Module is local to the region that contains it; crosses edges via the
/// `module` namespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModulePolicy;

impl VisibilityPolicy for ModulePolicy {
    type Candidate = ModuleCandidate;

    fn is_local(&self, region: &Region, candidate: &ModuleCandidate) -> bool {
        region.contains(candidate.id)
    }

    fn admits(&self, filter: &RegionFilter, candidate: &ModuleCandidate) -> bool {
        filter.allows(namespace::MODULE, &candidate.attributes())
    }
}

/// Module visibility front-end.
pub type ModuleVisibility<'g> = Visibility<'g, ModulePolicy>;

impl<'g> Visibility<'g, ModulePolicy> {
    pub fn new(digraph: &'g RegionDigraph) -> Self {
        Self::with_policy(digraph, ModulePolicy, namespace::MODULE)
    }
}
