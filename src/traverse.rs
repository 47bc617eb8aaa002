//! Subgraph traversal: which candidates are visible from a region.
//!
//! The traversal walks the digraph depth-first from a start region. Each
//! visited region contributes its local candidates; candidates visible in a
//! neighbouring region are imported across an edge only if the edge's filter
//! admits them. A region already on the current descent path contributes
//! nothing, which makes the walk terminate on cyclic digraphs.
//!
//! The walk works on candidate *indices*, so its result is always a subset of
//! the supplied candidates.

use std::collections::{BTreeSet, HashSet};

use petgraph::stable_graph::NodeIndex;

use crate::digraph::RegionDigraph;
use crate::filter::RegionFilter;
use crate::region::Region;

/// Namespace-specific predicates a front-end hands to the traversal.
pub trait VisibilityPolicy {
    /// The kind of thing being tested for visibility.
    type Candidate;

    /// Whether `candidate` lives in `region`.
    fn is_local(&self, region: &Region, candidate: &Self::Candidate) -> bool;

    /// Whether `candidate` may cross an edge carrying `filter`.
    fn admits(&self, filter: &RegionFilter, candidate: &Self::Candidate) -> bool;
}

/// Outcome of one traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Traversal {
    /// Indices into the candidate slice that are visible from the start region.
    pub visible: BTreeSet<usize>,
    /// Names of every region the walk entered.
    pub visited_regions: BTreeSet<String>,
    /// Number of edges followed, counting repeats on different paths.
    pub edges_traversed: usize,
}

impl Traversal {
    /// Whether the candidate at `index` is visible.
    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.contains(&index)
    }

    /// The visible candidates, in input order.
    pub fn select<'c, C>(&self, candidates: &'c [C]) -> Vec<&'c C> {
        self.visible
            .iter()
            .filter_map(|&i| candidates.get(i))
            .collect()
    }
}

/// Compute the subset of `candidates` visible from the region named `start`.
///
/// An unknown start region sees nothing.
pub fn compute_visible<P: VisibilityPolicy>(
    digraph: &RegionDigraph,
    start: &str,
    candidates: &[P::Candidate],
    policy: &P,
) -> Traversal {
    let Some(start_idx) = digraph.index_of(start) else {
        tracing::trace!(start, "traversal start region not in digraph");
        return Traversal::default();
    };

    let mut walk = Walk {
        digraph,
        candidates,
        policy,
        path: HashSet::new(),
        visited: BTreeSet::new(),
        edges_traversed: 0,
    };
    let visible = walk.visit(start_idx);

    let traversal = Traversal {
        visible,
        visited_regions: walk
            .visited
            .iter()
            .map(|&idx| digraph.region_at(idx).name().to_string())
            .collect(),
        edges_traversed: walk.edges_traversed,
    };

    tracing::trace!(
        start,
        candidates = candidates.len(),
        visible = traversal.visible.len(),
        regions = traversal.visited_regions.len(),
        edges = traversal.edges_traversed,
        "traversal complete"
    );
    traversal
}

struct Walk<'a, P: VisibilityPolicy> {
    digraph: &'a RegionDigraph,
    candidates: &'a [P::Candidate],
    policy: &'a P,
    /// Regions on the current descent path.
    path: HashSet<NodeIndex>,
    visited: BTreeSet<NodeIndex>,
    edges_traversed: usize,
}

impl<P: VisibilityPolicy> Walk<'_, P> {
    fn visit(&mut self, idx: NodeIndex) -> BTreeSet<usize> {
        if self.path.contains(&idx) {
            return BTreeSet::new();
        }
        debug_assert!(
            self.path.len() < self.digraph.region_count(),
            "descent path longer than the region count"
        );
        self.visited.insert(idx);

        let digraph = self.digraph;
        let region = digraph.region_at(idx);
        let mut allowed: BTreeSet<usize> = self
            .candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| self.policy.is_local(region, c))
            .map(|(i, _)| i)
            .collect();

        self.path.insert(idx);
        for (head, filter) in digraph.edges_from_index(idx) {
            self.edges_traversed += 1;
            for i in self.visit(head) {
                if !allowed.contains(&i) && self.policy.admits(filter, &self.candidates[i]) {
                    allowed.insert(i);
                }
            }
        }
        self.path.remove(&idx);

        allowed
    }
}
