//! Watch descriptors, watch records, and the descriptor registry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::mask::Mask;

/// Kernel-assigned identifier for a live watch.
///
/// Unique per live watch within one inotify instance. The kernel may reuse a
/// descriptor after the watch it identified has been removed, so a descriptor
/// observed after an [`Mask::IGNORED`](crate::Mask::IGNORED) event for the
/// same value refers to a different registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchDescriptor(pub(crate) i32);

impl WatchDescriptor {
    /// Descriptor reported for queue-overflow events, which belong to no
    /// watch.
    pub const OVERFLOW: WatchDescriptor = WatchDescriptor(-1);

    /// The raw kernel value.
    #[must_use]
    pub fn as_raw(self) -> i32 {
        self.0
    }
}

/// One registration of interest: a path and the mask it was registered with.
///
/// Immutable after creation. The registry keeps one strong reference for as
/// long as the watch is live; events reference it weakly, so an [`Event`]
/// outliving the registration resolves to absent instead of dangling.
///
/// [`Event`]: crate::Event
#[derive(Debug)]
pub struct Watch {
    descriptor: WatchDescriptor,
    path: PathBuf,
    mask: Mask,
}

impl Watch {
    pub(crate) fn new(descriptor: WatchDescriptor, path: PathBuf, mask: Mask) -> Self {
        Self {
            descriptor,
            path,
            mask,
        }
    }

    /// The kernel descriptor identifying this watch.
    #[must_use]
    pub fn descriptor(&self) -> WatchDescriptor {
        self.descriptor
    }

    /// The path this watch was registered for.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The interest mask this watch was registered with.
    #[must_use]
    pub fn mask(&self) -> Mask {
        self.mask
    }
}

/// Maps live descriptors to their watches.
///
/// Owned exclusively by the [`Inotify`](crate::Inotify) handle; entries are
/// evicted when the kernel reports the watch as ignored or when the caller
/// removes it.
#[derive(Debug, Default)]
pub(crate) struct WatchRegistry {
    watches: HashMap<WatchDescriptor, Arc<Watch>>,
}

impl WatchRegistry {
    pub(crate) fn insert(&mut self, watch: Arc<Watch>) {
        let previous = self.watches.insert(watch.descriptor(), watch);
        if let Some(previous) = previous {
            // Descriptor reuse: the kernel handed out an id we still had
            // mapped. Trust the newest registration.
            tracing::warn!(
                wd = previous.descriptor().as_raw(),
                stale_path = %previous.path().display(),
                "replacing stale registry entry for reused descriptor"
            );
        }
    }

    pub(crate) fn lookup(&self, descriptor: WatchDescriptor) -> Option<&Arc<Watch>> {
        self.watches.get(&descriptor)
    }

    pub(crate) fn evict(&mut self, descriptor: WatchDescriptor) -> Option<Arc<Watch>> {
        self.watches.remove(&descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watch(wd: i32, path: &str) -> Arc<Watch> {
        Arc::new(Watch::new(
            WatchDescriptor(wd),
            PathBuf::from(path),
            Mask::CREATE,
        ))
    }

    #[test]
    fn test_lookup_returns_inserted_watch() {
        let mut registry = WatchRegistry::default();
        registry.insert(watch(3, "/tmp/a"));

        let found = registry.lookup(WatchDescriptor(3)).unwrap();
        assert_eq!(found.path(), Path::new("/tmp/a"));
        assert_eq!(found.mask(), Mask::CREATE);
    }

    #[test]
    fn test_lookup_unknown_descriptor_is_absent() {
        let registry = WatchRegistry::default();
        assert!(registry.lookup(WatchDescriptor(7)).is_none());
        assert!(registry.lookup(WatchDescriptor::OVERFLOW).is_none());
    }

    #[test]
    fn test_evict_removes_entry() {
        let mut registry = WatchRegistry::default();
        registry.insert(watch(5, "/tmp/b"));

        let evicted = registry.evict(WatchDescriptor(5)).unwrap();
        assert_eq!(evicted.descriptor().as_raw(), 5);
        assert!(registry.lookup(WatchDescriptor(5)).is_none());
        assert!(registry.evict(WatchDescriptor(5)).is_none());
    }

    #[test]
    fn test_reused_descriptor_maps_to_newest_registration() {
        let mut registry = WatchRegistry::default();
        registry.insert(watch(9, "/tmp/old"));
        registry.insert(watch(9, "/tmp/new"));

        let found = registry.lookup(WatchDescriptor(9)).unwrap();
        assert_eq!(found.path(), Path::new("/tmp/new"));
    }
}
