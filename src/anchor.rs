//! Mounted anchors: UI locations that can host a guide step.
//!
//! Anchors live in an arena keyed by a handle issued at registration, so the
//! same target can be mounted more than once and each mount is removed
//! independently.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Handle for a registered anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnchorId(u64);

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "anchor#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub target: String,
}

#[derive(Debug, Clone, Default)]
pub struct AnchorSet {
    next: u64,
    mounted: BTreeMap<AnchorId, Anchor>,
}

impl AnchorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts an anchor for `target` and returns its handle.
    pub fn register(&mut self, target: impl Into<String>) -> AnchorId {
        let id = AnchorId(self.next);
        self.next += 1;
        self.mounted.insert(
            id,
            Anchor {
                target: target.into(),
            },
        );
        id
    }

    /// Unmounts the anchor behind `id`. Unknown handles are ignored.
    pub fn unregister(&mut self, id: AnchorId) -> Option<Anchor> {
        self.mounted.remove(&id)
    }

    pub fn get(&self, id: AnchorId) -> Option<&Anchor> {
        self.mounted.get(&id)
    }

    /// Targets of every mounted anchor.
    pub fn targets(&self) -> BTreeSet<String> {
        self.mounted.values().map(|a| a.target.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnchorId, &Anchor)> {
        self.mounted.iter().map(|(id, anchor)| (*id, anchor))
    }

    pub fn len(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_unregister() {
        let mut anchors = AnchorSet::new();
        let a = anchors.register("issue_title");
        let b = anchors.register("tags");

        assert_ne!(a, b);
        assert_eq!(anchors.len(), 2);
        assert!(anchors.targets().contains("tags"));

        let removed = anchors.unregister(b).unwrap();
        assert_eq!(removed.target, "tags");
        assert!(!anchors.targets().contains("tags"));
        assert_eq!(anchors.get(a).unwrap().target, "issue_title");
    }

    #[test]
    fn same_target_mounted_twice_survives_one_unmount() {
        let mut anchors = AnchorSet::new();
        let first = anchors.register("tags");
        let _second = anchors.register("tags");

        anchors.unregister(first);
        assert!(anchors.targets().contains("tags"));
        assert_eq!(anchors.len(), 1);
    }

    #[test]
    fn unknown_handle_is_ignored() {
        let mut anchors = AnchorSet::new();
        let id = anchors.register("tags");
        assert!(anchors.unregister(id).is_some());
        assert!(anchors.unregister(id).is_none());
        assert!(anchors.is_empty());
    }

    #[test]
    fn handles_are_never_reused() {
        let mut anchors = AnchorSet::new();
        let a = anchors.register("x");
        anchors.unregister(a);
        let b = anchors.register("x");
        assert_ne!(a, b);
        assert!(anchors.unregister(a).is_none());
        assert_eq!(anchors.len(), 1);
    }
}
