//! Region digraph: regions connected by filtered, directed edges.
//!
//! - **Graph** ([`RegionDigraph`]): `petgraph` stable graph whose nodes are
//!   [`Region`]s and whose edges carry a [`RegionFilter`]
//! - **Snapshots** ([`store::DigraphStore`]): copy-on-write publication of
//!   immutable digraph versions to concurrent readers
//!
//! All structural validation happens here, at mutation time. Queries read a
//! digraph that is already consistent.

pub mod store;

use std::collections::{BTreeMap, HashMap};

use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;

use crate::error::DigraphError;
use crate::filter::RegionFilter;
use crate::region::{ModuleId, Region};

pub use store::DigraphStore;

/// Result type for digraph operations.
pub type DigraphResult<T> = std::result::Result<T, DigraphError>;

/// The directed graph of regions and filtered edges.
///
/// An edge `tail → head` means modules in `tail` may see candidates visible in
/// `head`, narrowed by the edge's filter. At most one edge connects an ordered
/// pair of regions, and a module belongs to at most one region.
#[derive(Debug, Clone, Default)]
pub struct RegionDigraph {
    graph: StableDiGraph<Region, RegionFilter>,
    /// Region name → node. Ordered so that `regions()` is stable.
    by_name: BTreeMap<String, NodeIndex>,
    /// Module → node of the region that contains it.
    module_index: HashMap<ModuleId, NodeIndex>,
    /// Generation assigned by the store that published this digraph.
    version: u64,
}

impl RegionDigraph {
    /// Create an empty digraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation number of this digraph.
    ///
    /// Zero for digraphs that were never published. A copy taken from a
    /// snapshot keeps the snapshot's version until it is committed.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    // -----------------------------------------------------------------------
    // Regions
    // -----------------------------------------------------------------------

    /// Add an empty region.
    pub fn create_region(&mut self, name: &str) -> DigraphResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DigraphError::InvalidRegionName { name: name.into() });
        }
        if self.by_name.contains_key(name) {
            return Err(DigraphError::RegionExists { name: name.into() });
        }
        let idx = self.graph.add_node(Region::new(name));
        self.by_name.insert(name.to_string(), idx);
        Ok(())
    }

    /// Remove a region together with its incident edges.
    ///
    /// The region's modules become unassigned and therefore invisible.
    pub fn remove_region(&mut self, name: &str) -> DigraphResult<Region> {
        let idx = self.require(name)?;
        self.by_name.remove(name.trim());
        let region = self
            .graph
            .remove_node(idx)
            .ok_or_else(|| DigraphError::RegionNotFound { name: name.into() })?;
        for module in region.members() {
            self.module_index.remove(&module);
        }
        Ok(region)
    }

    /// Look up a region by name.
    pub fn region(&self, name: &str) -> Option<&Region> {
        self.index_of(name)
            .and_then(|idx| self.graph.node_weight(idx))
    }

    pub fn contains_region(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// All regions, ordered by name.
    pub fn regions(&self) -> impl Iterator<Item = &Region> + '_ {
        self.by_name
            .values()
            .filter_map(|&idx| self.graph.node_weight(idx))
    }

    pub fn region_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    // -----------------------------------------------------------------------
    // Modules
    // -----------------------------------------------------------------------

    /// Assign a module to a region. Re-adding to the same region is a no-op.
    pub fn add_module(&mut self, region: &str, module: ModuleId) -> DigraphResult<()> {
        let idx = self.require(region)?;
        if let Some(&existing) = self.module_index.get(&module) {
            if existing == idx {
                return Ok(());
            }
            return Err(DigraphError::ModuleAlreadyAssigned {
                module: module.get(),
                region: self.graph[existing].name().to_string(),
            });
        }
        self.graph[idx].insert(module);
        self.module_index.insert(module, idx);
        Ok(())
    }

    /// Unassign a module, returning the name of the region it left.
    pub fn remove_module(&mut self, module: ModuleId) -> Option<String> {
        let idx = self.module_index.remove(&module)?;
        let region = self.graph.node_weight_mut(idx)?;
        region.remove(module);
        Some(region.name().to_string())
    }

    /// The region containing `module`, if any.
    ///
    /// A module with no region is invisible from everywhere.
    pub fn region_of(&self, module: ModuleId) -> Option<&Region> {
        self.module_index
            .get(&module)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    // -----------------------------------------------------------------------
    // Edges
    // -----------------------------------------------------------------------

    /// Connect `tail → head` with `filter`.
    pub fn connect(&mut self, tail: &str, filter: RegionFilter, head: &str) -> DigraphResult<()> {
        let (t, h) = self.endpoints(tail, head)?;
        if self.graph.find_edge(t, h).is_some() {
            return Err(DigraphError::DuplicateEdge {
                tail: tail.into(),
                head: head.into(),
            });
        }
        self.graph.add_edge(t, h, filter);
        Ok(())
    }

    /// Connect `tail → head`, replacing any existing filter on that edge.
    ///
    /// Returns the replaced filter.
    pub fn replace_edge(
        &mut self,
        tail: &str,
        filter: RegionFilter,
        head: &str,
    ) -> DigraphResult<Option<RegionFilter>> {
        let (t, h) = self.endpoints(tail, head)?;
        match self.graph.find_edge(t, h) {
            Some(edge) => Ok(Some(std::mem::replace(&mut self.graph[edge], filter))),
            None => {
                self.graph.add_edge(t, h, filter);
                Ok(None)
            }
        }
    }

    /// Remove the edge `tail → head`, returning its filter.
    pub fn disconnect(&mut self, tail: &str, head: &str) -> Option<RegionFilter> {
        let t = self.index_of(tail)?;
        let h = self.index_of(head)?;
        let edge = self.graph.find_edge(t, h)?;
        self.graph.remove_edge(edge)
    }

    /// The filter on `tail → head`, if connected.
    pub fn edge(&self, tail: &str, head: &str) -> Option<&RegionFilter> {
        let t = self.index_of(tail)?;
        let h = self.index_of(head)?;
        self.graph
            .find_edge(t, h)
            .and_then(|e| self.graph.edge_weight(e))
    }

    /// Outgoing edges of a region as `(head, filter)`, ordered by head name.
    pub fn edges_from(&self, region: &str) -> Vec<(&Region, &RegionFilter)> {
        match self.index_of(region) {
            Some(idx) => self
                .edges_from_index(idx)
                .into_iter()
                .map(|(head, filter)| (&self.graph[head], filter))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Every edge as `(tail, filter, head)`, ordered by tail then head name.
    pub fn edges(&self) -> Vec<(&Region, &RegionFilter, &Region)> {
        self.by_name
            .values()
            .flat_map(|&tail| {
                self.edges_from_index(tail)
                    .into_iter()
                    .map(move |(head, filter)| (&self.graph[tail], filter, &self.graph[head]))
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Crate-internal index access for traversal
    // -----------------------------------------------------------------------

    /// Node of the region named `name`. Names are compared trimmed, the same
    /// way `create_region` stores them.
    pub(crate) fn index_of(&self, name: &str) -> Option<NodeIndex> {
        self.by_name.get(name.trim()).copied()
    }

    pub(crate) fn region_at(&self, idx: NodeIndex) -> &Region {
        &self.graph[idx]
    }

    pub(crate) fn edges_from_index(&self, idx: NodeIndex) -> Vec<(NodeIndex, &RegionFilter)> {
        let mut edges: Vec<(NodeIndex, &RegionFilter)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
            .collect();
        edges.sort_by(|a, b| self.graph[a.0].name().cmp(self.graph[b.0].name()));
        edges
    }

    fn require(&self, name: &str) -> DigraphResult<NodeIndex> {
        self.index_of(name)
            .ok_or_else(|| DigraphError::RegionNotFound { name: name.into() })
    }

    fn endpoints(&self, tail: &str, head: &str) -> DigraphResult<(NodeIndex, NodeIndex)> {
        let t = self.require(tail)?;
        let h = self.require(head)?;
        if t == h {
            return Err(DigraphError::SelfLoop { name: tail.into() });
        }
        Ok((t, h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(id: u64) -> ModuleId {
        ModuleId::new(id)
    }

    fn sample() -> RegionDigraph {
        let mut g = RegionDigraph::new();
        g.create_region("kernel").unwrap();
        g.create_region("user").unwrap();
        g.create_region("app").unwrap();
        g.add_module("kernel", m(1)).unwrap();
        g.add_module("user", m(10)).unwrap();
        g.add_module("app", m(20)).unwrap();
        g.connect("user", RegionFilter::allow_everything(), "kernel").unwrap();
        g.connect("user", RegionFilter::deny_all(), "app").unwrap();
        g
    }

    #[test]
    fn region_names_are_unique_and_non_empty() {
        let mut g = sample();
        assert!(matches!(
            g.create_region("kernel"),
            Err(DigraphError::RegionExists { .. })
        ));
        assert!(matches!(
            g.create_region("  "),
            Err(DigraphError::InvalidRegionName { .. })
        ));
    }

    #[test]
    fn padded_names_resolve_to_the_trimmed_region() {
        let mut g = RegionDigraph::new();
        g.create_region(" user").unwrap();
        g.create_region("kernel ").unwrap();
        assert!(matches!(
            g.create_region("user"),
            Err(DigraphError::RegionExists { .. })
        ));

        g.add_module(" user", m(2)).unwrap();
        assert_eq!(g.region_of(m(2)).map(Region::name), Some("user"));
        g.connect(" user", RegionFilter::allow_everything(), "kernel")
            .unwrap();
        assert!(g.edge("user", " kernel").is_some());
        assert_eq!(g.edges_from("user ").len(), 1);
        assert!(g.contains_region("  kernel"));

        assert!(g.disconnect("user", "kernel ").is_some());
        let removed = g.remove_region(" user ").unwrap();
        assert_eq!(removed.name(), "user");
        assert!(!g.contains_region("user"));
        assert!(g.region_of(m(2)).is_none());
    }

    #[test]
    fn regions_are_ordered_by_name() {
        let g = sample();
        let names: Vec<&str> = g.regions().map(Region::name).collect();
        assert_eq!(names, vec!["app", "kernel", "user"]);
        assert_eq!(g.region_count(), 3);
    }

    #[test]
    fn module_lookup() {
        let mut g = sample();
        assert_eq!(g.region_of(m(10)).map(Region::name), Some("user"));
        assert!(g.region_of(m(99)).is_none());

        // Same region again is fine, another region is not.
        g.add_module("user", m(10)).unwrap();
        assert!(matches!(
            g.add_module("kernel", m(10)),
            Err(DigraphError::ModuleAlreadyAssigned { module: 10, .. })
        ));

        assert_eq!(g.remove_module(m(10)).as_deref(), Some("user"));
        assert!(g.region_of(m(10)).is_none());
        assert!(!g.region("user").unwrap().contains(m(10)));
        assert_eq!(g.remove_module(m(10)), None);
        assert!(matches!(
            g.add_module("nowhere", m(5)),
            Err(DigraphError::RegionNotFound { .. })
        ));
    }

    #[test]
    fn edge_validation() {
        let mut g = sample();
        assert!(matches!(
            g.connect("user", RegionFilter::deny_all(), "kernel"),
            Err(DigraphError::DuplicateEdge { .. })
        ));
        assert!(matches!(
            g.connect("user", RegionFilter::deny_all(), "user"),
            Err(DigraphError::SelfLoop { .. })
        ));
        assert!(matches!(
            g.connect("user", RegionFilter::deny_all(), "ghost"),
            Err(DigraphError::RegionNotFound { .. })
        ));
        // The reverse direction is a different edge.
        g.connect("kernel", RegionFilter::deny_all(), "user").unwrap();
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn edges_from_is_ordered_by_head() {
        let g = sample();
        let heads: Vec<&str> = g.edges_from("user").iter().map(|(r, _)| r.name()).collect();
        assert_eq!(heads, vec!["app", "kernel"]);
        assert!(g.edges_from("kernel").is_empty());
        assert!(g.edges_from("ghost").is_empty());

        let all: Vec<(&str, &str)> = g
            .edges()
            .iter()
            .map(|(t, _, h)| (t.name(), h.name()))
            .collect();
        assert_eq!(all, vec![("user", "app"), ("user", "kernel")]);
    }

    #[test]
    fn replace_and_disconnect() {
        let mut g = sample();
        let old = g
            .replace_edge("user", RegionFilter::deny_all(), "kernel")
            .unwrap();
        assert_eq!(old, Some(RegionFilter::allow_everything()));
        assert_eq!(g.edge("user", "kernel"), Some(&RegionFilter::deny_all()));

        assert_eq!(
            g.replace_edge("kernel", RegionFilter::deny_all(), "app").unwrap(),
            None
        );
        assert_eq!(g.disconnect("kernel", "app"), Some(RegionFilter::deny_all()));
        assert_eq!(g.disconnect("kernel", "app"), None);
        assert!(g.edge("kernel", "app").is_none());
    }

    #[test]
    fn removing_a_region_drops_edges_and_members() {
        let mut g = sample();
        let removed = g.remove_region("kernel").unwrap();
        assert!(removed.contains(m(1)));
        assert!(g.region_of(m(1)).is_none());
        assert_eq!(g.edge_count(), 1);
        assert!(!g.contains_region("kernel"));

        // Indices of surviving regions stay valid.
        assert_eq!(g.region_of(m(20)).map(Region::name), Some("app"));
        g.create_region("kernel").unwrap();
        assert!(g.edge("user", "kernel").is_none());
    }
}
