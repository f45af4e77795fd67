//! Tree identifiers for deduplicated apexes

use serde::{Deserialize, Serialize};

use super::dedup::ClusterApex;

/// One detected tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeRecord {
    /// Positive identifier, unique within a run
    pub tree_id: u32,
    pub x: f64,
    pub y: f64,
    /// Apex height above ground
    pub height: f64,
}

/// Issues `tree_id` values 1, 2, 3, ... and never reuses one
#[derive(Debug, Clone)]
pub struct TreeRegistry {
    next_id: u32,
    records: Vec<TreeRecord>,
}

impl Default for TreeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            records: Vec::new(),
        }
    }

    /// Register a tree and return its identifier
    pub fn register(&mut self, x: f64, y: f64, height: f64) -> u32 {
        let tree_id = self.next_id;
        self.next_id += 1;
        self.records.push(TreeRecord { tree_id, x, y, height });
        tree_id
    }

    /// Register cluster apexes in ascending cluster-label order
    pub fn register_clusters(&mut self, apexes: &[ClusterApex]) {
        let mut ordered: Vec<&ClusterApex> = apexes.iter().collect();
        ordered.sort_by_key(|a| a.label);
        for a in ordered {
            self.register(a.apex.x, a.apex.y, a.apex.height);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TreeRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TreeRecord> {
        self.records
    }
}
