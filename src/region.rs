//! Module identities and regions.
//!
//! A [`Region`] is a named isolation domain holding a set of modules. Modules
//! are identified by an opaque [`ModuleId`]; the digraph guarantees a module
//! belongs to at most one region.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Opaque identity of an installed module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(u64);

impl ModuleId {
    /// The platform's own implicit module.
    ///
    /// As a requester it bypasses the digraph and sees every candidate.
    pub const SYSTEM: ModuleId = ModuleId(0);

    /// Create a `ModuleId` from a raw `u64`.
    pub const fn new(raw: u64) -> Self {
        ModuleId(raw)
    }

    /// Get the underlying `u64` value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Whether this is the reserved [`ModuleId::SYSTEM`] identity.
    pub const fn is_system(self) -> bool {
        self.0 == Self::SYSTEM.0
    }
}

impl From<u64> for ModuleId {
    fn from(raw: u64) -> Self {
        ModuleId(raw)
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "module:{}", self.0)
    }
}

/// A named isolation domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    name: String,
    members: BTreeSet<ModuleId>,
}

impl Region {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: BTreeSet::new(),
        }
    }

    /// The region's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Membership test.
    pub fn contains(&self, module: ModuleId) -> bool {
        self.members.contains(&module)
    }

    /// Members in ascending id order.
    pub fn members(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.members.iter().copied()
    }

    /// Number of member modules.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the region has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn insert(&mut self, module: ModuleId) -> bool {
        self.members.insert(module)
    }

    pub(crate) fn remove(&mut self, module: ModuleId) -> bool {
        self.members.remove(&module)
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} modules)", self.name, self.members.len())
    }
}
