//! Versioned, copy-on-write publication of region digraphs.
//!
//! Readers take an `Arc` snapshot and keep it for the whole query; writers
//! clone the current snapshot, edit the copy and swap it in. A query
//! therefore never observes a half-applied change.

use std::sync::{Arc, Mutex, RwLock};

use crate::error::{DigraphError, RegionResult};

use super::RegionDigraph;

/// Holder of the currently published [`RegionDigraph`].
pub struct DigraphStore {
    current: RwLock<Arc<RegionDigraph>>,
    /// Serializes writers so that read-modify-publish is atomic.
    writer: Mutex<()>,
}

impl std::fmt::Debug for DigraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("DigraphStore")
            .field("version", &snapshot.version())
            .field("regions", &snapshot.region_count())
            .field("edges", &snapshot.edge_count())
            .finish()
    }
}

impl Default for DigraphStore {
    fn default() -> Self {
        Self::new(RegionDigraph::new())
    }
}

impl DigraphStore {
    /// Publish `digraph` as version 1.
    pub fn new(mut digraph: RegionDigraph) -> Self {
        digraph.set_version(1);
        log_published(&digraph);
        Self {
            current: RwLock::new(Arc::new(digraph)),
            writer: Mutex::new(()),
        }
    }

    /// The currently published digraph.
    pub fn snapshot(&self) -> Arc<RegionDigraph> {
        Arc::clone(&self.current.read().expect("digraph lock poisoned"))
    }

    /// Version of the currently published digraph.
    pub fn version(&self) -> u64 {
        self.current.read().expect("digraph lock poisoned").version()
    }

    /// Apply `change` to a copy of the current digraph and publish the copy.
    ///
    /// If `change` fails, nothing is published and the error is returned.
    pub fn update<T, F>(&self, change: F) -> RegionResult<T>
    where
        F: FnOnce(&mut RegionDigraph) -> RegionResult<T>,
    {
        let _guard = self.writer.lock().expect("digraph writer lock poisoned");
        let base = self.snapshot();
        let mut copy = RegionDigraph::clone(&base);
        let out = change(&mut copy)?;
        self.publish(copy, base.version());
        Ok(out)
    }

    /// Publish a digraph derived from an earlier snapshot.
    ///
    /// `digraph.version()` must still be the published version, otherwise
    /// another writer got there first and the commit is rejected.
    pub fn commit(&self, digraph: RegionDigraph) -> Result<u64, DigraphError> {
        let _guard = self.writer.lock().expect("digraph writer lock poisoned");
        let actual = self.version();
        if digraph.version() != actual {
            tracing::warn!(
                expected = digraph.version(),
                actual,
                "rejecting commit of stale digraph copy"
            );
            return Err(DigraphError::StaleSnapshot {
                expected: digraph.version(),
                actual,
            });
        }
        Ok(self.publish(digraph, actual))
    }

    fn publish(&self, mut digraph: RegionDigraph, base: u64) -> u64 {
        let version = base + 1;
        digraph.set_version(version);
        log_published(&digraph);
        *self.current.write().expect("digraph lock poisoned") = Arc::new(digraph);
        version
    }
}

fn log_published(digraph: &RegionDigraph) {
    tracing::info!(
        version = digraph.version(),
        regions = digraph.region_count(),
        edges = digraph.edge_count(),
        "published region digraph"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegionError;
    use crate::filter::RegionFilter;
    use crate::region::ModuleId;

    fn store() -> DigraphStore {
        let mut g = RegionDigraph::new();
        g.create_region("kernel").unwrap();
        g.create_region("user").unwrap();
        DigraphStore::new(g)
    }

    #[test]
    fn new_store_publishes_version_one() {
        let store = store();
        assert_eq!(store.version(), 1);
        assert_eq!(store.snapshot().region_count(), 2);
    }

    #[test]
    fn snapshots_are_isolated_from_updates() {
        let store = store();
        let before = store.snapshot();

        store
            .update(|g| {
                g.add_module("user", ModuleId::new(10))?;
                g.connect("user", RegionFilter::allow_everything(), "kernel")?;
                Ok(())
            })
            .unwrap();

        assert_eq!(before.version(), 1);
        assert_eq!(before.edge_count(), 0);
        assert!(before.region_of(ModuleId::new(10)).is_none());

        let after = store.snapshot();
        assert_eq!(after.version(), 2);
        assert_eq!(after.edge_count(), 1);
        assert_eq!(after.region_of(ModuleId::new(10)).map(|r| r.name()), Some("user"));
    }

    #[test]
    fn failed_update_publishes_nothing() {
        let store = store();
        let err = store
            .update(|g| {
                g.create_region("extra")?;
                g.connect("user", RegionFilter::deny_all(), "ghost")?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(
            err,
            RegionError::Digraph(DigraphError::RegionNotFound { .. })
        ));
        assert_eq!(store.version(), 1);
        assert!(!store.snapshot().contains_region("extra"));
    }

    #[test]
    fn stale_commit_is_rejected() {
        let store = store();
        let mut first = RegionDigraph::clone(&store.snapshot());
        let mut second = RegionDigraph::clone(&store.snapshot());

        first.create_region("a").unwrap();
        second.create_region("b").unwrap();

        assert_eq!(store.commit(first).unwrap(), 2);
        assert!(matches!(
            store.commit(second),
            Err(DigraphError::StaleSnapshot {
                expected: 1,
                actual: 2
            })
        ));
        let current = store.snapshot();
        assert!(current.contains_region("a"));
        assert!(!current.contains_region("b"));
    }

    #[test]
    fn concurrent_readers_see_whole_versions() {
        let store = Arc::new(store());
        std::thread::scope(|scope| {
            for _ in 0..4 {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    for _ in 0..100 {
                        let snap = store.snapshot();
                        // Every published version adds one region and one edge together.
                        let extra = snap.region_count() - 2;
                        assert_eq!(snap.edge_count(), extra);
                    }
                });
            }
            for i in 0..20 {
                store
                    .update(|g| {
                        let name = format!("r{i}");
                        g.create_region(&name)?;
                        g.connect(&name, RegionFilter::deny_all(), "kernel")?;
                        Ok(())
                    })
                    .unwrap();
            }
        });
        assert_eq!(store.version(), 21);
    }
}
