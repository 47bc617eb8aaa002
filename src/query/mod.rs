//! Typed visibility queries.
//!
//! Each front-end is a [`Visibility`] parameterized with a namespace-specific
//! [`VisibilityPolicy`]:
//!
//! - **Modules** ([`module`]): module identity, name and version
//! - **Services** ([`service`]): published services and their properties
//! - **Capabilities** ([`capability`]): capabilities in arbitrary namespaces
//!
//! Two policy rules sit in front of the traversal. The reserved requester
//! [`ModuleId::SYSTEM`] sees every candidate unfiltered. A requester that is
//! not a member of any region sees nothing.

pub mod capability;
pub mod module;
pub mod service;

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;

use crate::digraph::RegionDigraph;
use crate::region::ModuleId;
use crate::traverse::{VisibilityPolicy, compute_visible};

pub use capability::{CapabilityCandidate, CapabilityPolicy, CapabilityVisibility};
pub use module::{ModuleCandidate, ModulePolicy, ModuleVisibility};
pub use service::{ServiceCandidate, ServicePolicy, ServiceVisibility};

/// How much of a candidate set a requester may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Root requester: everything.
    All,
    /// Requester outside every region: nothing.
    Denied,
    /// The listed candidate indices.
    Only(BTreeSet<usize>),
}

impl Access {
    pub fn permits(&self, index: usize) -> bool {
        match self {
            Self::All => true,
            Self::Denied => false,
            Self::Only(visible) => visible.contains(&index),
        }
    }
}

/// A visibility front-end over one digraph snapshot.
#[derive(Debug, Clone)]
pub struct Visibility<'g, P> {
    digraph: &'g RegionDigraph,
    policy: P,
    kind: &'static str,
}

impl<'g, P: VisibilityPolicy> Visibility<'g, P> {
    /// Wrap a policy; `kind` names the front-end in logs.
    pub fn with_policy(digraph: &'g RegionDigraph, policy: P, kind: &'static str) -> Self {
        Self {
            digraph,
            policy,
            kind,
        }
    }

    pub fn digraph(&self) -> &'g RegionDigraph {
        self.digraph
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Decide which of `candidates` the requester may see.
    pub fn access(&self, requester: ModuleId, candidates: &[P::Candidate]) -> Access {
        if requester.is_system() {
            tracing::debug!(kind = self.kind, %requester, "system requester bypasses region digraph");
            return Access::All;
        }

        let Some(region) = self.digraph.region_of(requester) else {
            tracing::debug!(kind = self.kind, %requester, "requester belongs to no region");
            return Access::Denied;
        };

        let traversal = compute_visible(self.digraph, region.name(), candidates, &self.policy);
        tracing::debug!(
            kind = self.kind,
            %requester,
            region = region.name(),
            candidates = candidates.len(),
            visible = traversal.visible.len(),
            "visibility query"
        );
        Access::Only(traversal.visible)
    }

    /// The visible subset of `candidates`, in input order.
    pub fn visible(&self, requester: ModuleId, candidates: &[P::Candidate]) -> Vec<P::Candidate>
    where
        P::Candidate: Clone,
    {
        let access = self.access(requester, candidates);
        candidates
            .iter()
            .enumerate()
            .filter(|(i, _)| access.permits(*i))
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Drop every candidate the requester may not see.
    pub fn retain_visible(&self, requester: ModuleId, candidates: &mut Vec<P::Candidate>) {
        let access = self.access(requester, candidates);
        let mut index = 0;
        candidates.retain(|_| {
            let keep = access.permits(index);
            index += 1;
            keep
        });
    }

    /// Whether the requester may see one candidate.
    pub fn is_visible(&self, requester: ModuleId, candidate: &P::Candidate) -> bool {
        self.access(requester, std::slice::from_ref(candidate))
            .permits(0)
    }

    /// Run the same candidate set for many requesters in parallel.
    pub fn visible_for_many(
        &self,
        requesters: &[ModuleId],
        candidates: &[P::Candidate],
    ) -> BTreeMap<ModuleId, Vec<P::Candidate>>
    where
        P: Sync,
        P::Candidate: Clone + Send + Sync,
    {
        requesters
            .par_iter()
            .map(|&requester| (requester, self.visible(requester, candidates)))
            .collect()
    }
}
