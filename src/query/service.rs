//! Service visibility: which published services a requester can find.

use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::digraph::RegionDigraph;
use crate::filter::{RegionFilter, keys, namespace};
use crate::region::{ModuleId, Region};
use crate::traverse::VisibilityPolicy;

use super::Visibility;

/// A published service reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCandidate {
    pub service_id: u64,
    /// Module that registered the service.
    pub owner: ModuleId,
    #[serde(default)]
    pub properties: Attributes,
}

impl ServiceCandidate {
    pub fn new(service_id: u64, owner: impl Into<ModuleId>) -> Self {
        Self {
            service_id,
            owner: owner.into(),
            properties: Attributes::new(),
        }
    }

    /// Set the `objectClass` property.
    pub fn with_object_class(mut self, classes: &[&str]) -> Self {
        self.properties.insert(keys::OBJECT_CLASS, classes.to_vec());
        self
    }

    pub fn with_property(mut self, key: &str, value: impl Into<crate::attributes::AttrValue>) -> Self {
        self.properties.insert(key, value);
        self
    }

    /// Properties plus `service.id` and `service.owner`, as seen by filters.
    pub fn attributes(&self) -> Attributes {
        let mut attrs = self.properties.clone();
        attrs.insert(keys::SERVICE_ID, self.service_id);
        attrs.insert(keys::SERVICE_OWNER, self.owner.get());
        attrs
    }
}

/// A service is local to its owner's region; crosses edges via the
/// `service` namespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServicePolicy;

impl VisibilityPolicy for ServicePolicy {
    type Candidate = ServiceCandidate;

    fn is_local(&self, region: &Region, candidate: &ServiceCandidate) -> bool {
        region.contains(candidate.owner)
    }

    fn admits(&self, filter: &RegionFilter, candidate: &ServiceCandidate) -> bool {
        filter.allows(namespace::SERVICE, &candidate.attributes())
    }
}

/// Service visibility front-end.
pub type ServiceVisibility<'g> = Visibility<'g, ServicePolicy>;

impl<'g> Visibility<'g, ServicePolicy> {
    pub fn new(digraph: &'g RegionDigraph) -> Self {
        Self::with_policy(digraph, ServicePolicy, namespace::SERVICE)
    }
}
