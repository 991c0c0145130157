//! Pivot expansion
//!
//! A pivot analyzes the linked assets of one record and splices the new
//! records as a contiguous block right after it. Anything already in the
//! investigation is skipped, so a target is never analyzed twice.

use futures::future::join_all;
use std::collections::HashSet;
use tracing::{debug, info};

use proinfo_core::Investigation;

use crate::Correlator;

/// Result of a single pivot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PivotOutcome {
    /// Every candidate was already known; nothing changed
    Aborted,
    /// Identifiers added, in display order
    Expanded { added: Vec<String> },
}

impl PivotOutcome {
    pub fn added(&self) -> &[String] {
        match self {
            PivotOutcome::Aborted => &[],
            PivotOutcome::Expanded { added } => added,
        }
    }
}

pub struct PivotExpander {
    correlator: Correlator,
}

impl PivotExpander {
    pub fn new(correlator: Correlator) -> Self {
        Self { correlator }
    }

    /// Analyze new `candidates` one level below `parent` and splice them in
    pub async fn pivot<S: AsRef<str>>(
        &self,
        investigation: &mut Investigation,
        candidates: &[S],
        parent: &str,
        parent_depth: u32,
    ) -> PivotOutcome {
        let seen = investigation.identifiers();

        let mut fresh: Vec<&str> = Vec::new();
        for candidate in candidates {
            let candidate = candidate.as_ref().trim();
            if candidate.is_empty() || seen.contains(candidate) || fresh.contains(&candidate) {
                continue;
            }
            fresh.push(candidate);
        }

        if fresh.is_empty() {
            debug!("Pivot from {} found nothing new", parent);
            return PivotOutcome::Aborted;
        }

        let depth = parent_depth + 1;
        let records = join_all(
            fresh
                .iter()
                .map(|candidate| self.correlator.analyze(candidate, depth, Some(parent))),
        )
        .await;

        let added = investigation.insert_children(parent, records);
        info!(
            "Pivoted from {} to {} new targets at depth {}",
            parent,
            added.len(),
            depth
        );

        PivotOutcome::Expanded { added }
    }

    /// Keep pivoting every successful record's linked assets until nothing
    /// new turns up or `max_depth` is reached. Returns the number of records added.
    pub async fn expand_all(&self, investigation: &mut Investigation, max_depth: u32) -> usize {
        let mut expanded: HashSet<String> = HashSet::new();
        let mut total = 0;

        loop {
            let frontier: Vec<(String, Vec<String>, u32)> = investigation
                .iter()
                .filter(|r| r.is_success() && r.depth < max_depth)
                .filter(|r| !r.linked_assets.is_empty() && !expanded.contains(&r.identifier))
                .map(|r| (r.identifier.clone(), r.linked_assets.clone(), r.depth))
                .collect();

            if frontier.is_empty() {
                break;
            }

            for (parent, assets, depth) in frontier {
                expanded.insert(parent.clone());
                total += self
                    .pivot(investigation, assets.as_slice(), &parent, depth)
                    .await
                    .added()
                    .len();
            }
        }

        info!("Deep pivot added {} records", total);
        total
    }
}
