//! Stable structure identities for one aggregation.

use std::collections::HashMap;

/// Assigns consecutive ids to padded structures in order of first sight
///
/// **Public** - owned by one aggregation, never shared between jobs
#[derive(Debug, Clone, Default)]
pub struct StructureRegistry {
    ids: HashMap<String, usize>,
}

impl StructureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of `structure`, registering it if unseen
    pub fn id_for(&mut self, structure: &str) -> usize {
        if let Some(&id) = self.ids.get(structure) {
            return id;
        }
        let id = self.ids.len();
        self.ids.insert(structure.to_string(), id);
        id
    }

    pub fn get(&self, structure: &str) -> Option<usize> {
        self.ids.get(structure).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
