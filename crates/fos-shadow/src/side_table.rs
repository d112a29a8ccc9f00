//! Side tables
//!
//! Association from physical nodes to auxiliary values that never outlives
//! the node. Entries are stored per arena slot together with the full
//! generational key; a lookup only hits when the key matches, so once a node
//! is released (and its slot reused) the old entry is unreachable.

use std::collections::HashMap;

use fos_dom::NodeId;

/// Weak association table keyed by physical node
#[derive(Debug)]
pub struct SideTable<V> {
    entries: HashMap<u32, (NodeId, V)>,
}

impl<V> SideTable<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Get the value associated with `key`
    pub fn get(&self, key: NodeId) -> Option<&V> {
        match self.entries.get(&slot(key)) {
            Some((stored, value)) if *stored == key => Some(value),
            _ => None,
        }
    }

    /// Get the value associated with `key` mutably
    pub fn get_mut(&mut self, key: NodeId) -> Option<&mut V> {
        match self.entries.get_mut(&slot(key)) {
            Some((stored, value)) if *stored == key => Some(value),
            _ => None,
        }
    }

    /// Check if `key` has a live association
    pub fn contains(&self, key: NodeId) -> bool {
        self.get(key).is_some()
    }

    /// Associate `value` with `key`, returning the value it replaces
    ///
    /// An entry left behind by a released node in the same slot is dropped.
    pub fn set(&mut self, key: NodeId, value: V) -> Option<V> {
        match self.entries.insert(slot(key), (key, value)) {
            Some((stored, previous)) if stored == key => Some(previous),
            _ => None,
        }
    }

    /// Remove the association for `key`
    pub fn delete(&mut self, key: NodeId) -> Option<V> {
        if !self.contains(key) {
            return None;
        }
        self.entries.remove(&slot(key)).map(|(_, value)| value)
    }

    /// Get the value for `key`, creating it on first use
    pub fn get_or_insert_with(&mut self, key: NodeId, create: impl FnOnce() -> V) -> &mut V {
        let stale = self
            .entries
            .get(&slot(key))
            .is_some_and(|(stored, _)| *stored != key);
        if stale {
            self.entries.remove(&slot(key));
        }
        &mut self
            .entries
            .entry(slot(key))
            .or_insert_with(|| (key, create()))
            .1
    }

    /// Number of entries, including ones shadowed by released nodes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for SideTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn slot(key: NodeId) -> u32 {
    key.index() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_dom::DomTree;

    #[test]
    fn test_set_get_delete() {
        let mut tree = DomTree::new();
        let doc = tree.create_document("about:blank");
        let div = tree.create_element(doc, "div").unwrap();

        let mut table = SideTable::new();
        assert!(table.get(div).is_none());
        assert_eq!(table.set(div, 1), None);
        assert_eq!(table.set(div, 2), Some(1));
        assert_eq!(table.get(div), Some(&2));
        assert_eq!(table.delete(div), Some(2));
        assert!(!table.contains(div));
    }

    #[test]
    fn test_released_key_does_not_resolve() {
        let mut tree = DomTree::new();
        let doc = tree.create_document("about:blank");
        let old = tree.create_element(doc, "div").unwrap();

        let mut table = SideTable::new();
        table.set(old, "old");
        tree.release(old).unwrap();

        // Slot is reused with a newer generation
        let new = tree.create_element(doc, "span").unwrap();
        assert_eq!(new.index(), old.index());
        assert!(table.get(new).is_none());
        assert_eq!(table.set(new, "new"), None);
        assert!(table.get(old).is_none());
        assert_eq!(table.delete(old), None);
        assert_eq!(table.get(new), Some(&"new"));
    }

    #[test]
    fn test_get_or_insert_with() {
        let mut tree = DomTree::new();
        let doc = tree.create_document("about:blank");
        let div = tree.create_element(doc, "div").unwrap();

        let mut table: SideTable<Vec<u32>> = SideTable::new();
        table.get_or_insert_with(div, Vec::new).push(1);
        table.get_or_insert_with(div, || vec![99]).push(2);
        assert_eq!(table.get(div), Some(&vec![1, 2]));
        assert_eq!(table.len(), 1);
    }
}
