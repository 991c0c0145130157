//! Investigation forest - the session store for an investigation
//!
//! Records are kept in an ordered forest keyed by identifier with parent
//! links. The display order is the pre-order linearization of the forest:
//! a pivot's children appear directly after their parent, newest pivot block
//! first, ahead of any earlier expansions of the same parent.

use std::collections::{HashMap, HashSet};

use crate::TargetRecord;

#[derive(Debug, Clone)]
struct Node {
    record: TargetRecord,
    parent: Option<String>,
    children: Vec<String>,
}

/// Ordered forest of target records for one investigation session
#[derive(Debug, Clone, Default)]
pub struct Investigation {
    nodes: HashMap<String, Node>,
    roots: Vec<String>,
}

impl Investigation {
    /// Create an empty investigation
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a forest from a linear record sequence.
    ///
    /// A record whose origin is already present becomes its last child,
    /// anything else becomes a root. Duplicate identifiers are dropped.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = TargetRecord>,
    {
        let mut investigation = Self::new();
        for record in records {
            if investigation.contains(&record.identifier) {
                continue;
            }
            let parent = record
                .origin_target
                .clone()
                .filter(|origin| investigation.contains(origin));
            match parent {
                Some(parent) => {
                    if let Some(node) = investigation.nodes.get_mut(&parent) {
                        node.children.push(record.identifier.clone());
                    }
                    investigation.insert_node(record, Some(parent));
                }
                None => {
                    investigation.push_root(record);
                }
            }
        }
        investigation
    }

    /// Append a top-level record. Returns false if the identifier is taken.
    pub fn push_root(&mut self, record: TargetRecord) -> bool {
        if self.contains(&record.identifier) {
            return false;
        }
        self.roots.push(record.identifier.clone());
        self.insert_node(record, None);
        true
    }

    /// Splice records as a contiguous block directly after `parent`.
    ///
    /// Records whose identifier already exists are skipped. When the parent is
    /// unknown the block is appended at the end as top-level records.
    /// Returns the identifiers that were inserted, in order.
    pub fn insert_children(&mut self, parent: &str, records: Vec<TargetRecord>) -> Vec<String> {
        let mut inserted = Vec::new();
        let parent_known = self.contains(parent);

        for record in records {
            if self.contains(&record.identifier) || inserted.contains(&record.identifier) {
                continue;
            }
            let id = record.identifier.clone();
            if parent_known {
                self.insert_node(record, Some(parent.to_string()));
            } else {
                self.roots.push(id.clone());
                self.insert_node(record, None);
            }
            inserted.push(id);
        }

        if parent_known {
            if let Some(node) = self.nodes.get_mut(parent) {
                node.children.splice(0..0, inserted.iter().cloned());
            }
        }

        inserted
    }

    /// Replace a pending record with its terminal version.
    ///
    /// Only pending records are replaced; a finished record is never
    /// overwritten. Returns whether the replacement happened.
    pub fn complete(&mut self, record: TargetRecord) -> bool {
        match self.nodes.get_mut(&record.identifier) {
            Some(node) if node.record.is_pending() => {
                node.record = record;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&TargetRecord> {
        self.nodes.get(identifier).map(|n| &n.record)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.nodes.contains_key(identifier)
    }

    /// Identifier of the record a node was spliced under
    pub fn parent_of(&self, identifier: &str) -> Option<&str> {
        self.nodes
            .get(identifier)
            .and_then(|n| n.parent.as_deref())
    }

    pub fn children_of(&self, identifier: &str) -> &[String] {
        self.nodes
            .get(identifier)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Snapshot of every identifier in the session, for deduplication
    pub fn identifiers(&self) -> HashSet<String> {
        self.nodes.keys().cloned().collect()
    }

    /// Records in display order (pre-order traversal)
    pub fn iter(&self) -> impl Iterator<Item = &TargetRecord> {
        self.preorder_ids()
            .into_iter()
            .filter_map(move |id| self.get(id))
    }

    /// Cloned records in display order
    pub fn records(&self) -> Vec<TargetRecord> {
        self.iter().cloned().collect()
    }

    /// Identifiers in display order
    pub fn ordered_identifiers(&self) -> Vec<String> {
        self.preorder_ids().into_iter().map(str::to_string).collect()
    }

    fn insert_node(&mut self, record: TargetRecord, parent: Option<String>) {
        self.nodes.insert(
            record.identifier.clone(),
            Node {
                record,
                parent,
                children: Vec::new(),
            },
        );
    }

    fn preorder_ids(&self) -> Vec<&str> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<&str> = self.roots.iter().rev().map(String::as_str).collect();

        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.children.iter().rev().map(String::as_str));
            }
        }

        order
    }
}
