//! Reaction breakdowns and the "special" remainder.
//!
//! The Graph API reports a total reaction count plus one count per kind. Kinds
//! outside the fixed list (thankful, pride) only show up as the difference
//! between the total and the sum of the known kinds.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionKind {
    Like,
    Love,
    Wow,
    Haha,
    Sad,
    Angry,
}

/// Declared order; every vector and every header follows it.
pub const REACTION_KINDS: [ReactionKind; 6] = [
    ReactionKind::Like,
    ReactionKind::Love,
    ReactionKind::Wow,
    ReactionKind::Haha,
    ReactionKind::Sad,
    ReactionKind::Angry,
];

/// Count columns of a raw Facebook row, in declared order, special last.
pub const REACTION_COLUMNS: [&str; 7] = [
    "num_likes",
    "num_loves",
    "num_wows",
    "num_hahas",
    "num_sads",
    "num_angrys",
    "num_special",
];

impl ReactionKind {
    /// Upper-case name the Graph API expects in `reactions.type(..)`.
    #[must_use]
    pub fn api_name(self) -> &'static str {
        match self {
            ReactionKind::Like => "LIKE",
            ReactionKind::Love => "LOVE",
            ReactionKind::Wow => "WOW",
            ReactionKind::Haha => "HAHA",
            ReactionKind::Sad => "SAD",
            ReactionKind::Angry => "ANGRY",
        }
    }

    fn index(self) -> usize {
        match self {
            ReactionKind::Like => 0,
            ReactionKind::Love => 1,
            ReactionKind::Wow => 2,
            ReactionKind::Haha => 3,
            ReactionKind::Sad => 4,
            ReactionKind::Angry => 5,
        }
    }

    /// `fields` value asking for this kind's count only.
    #[must_use]
    pub fn fields_query(self) -> String {
        format!(
            "reactions.type({}).limit(0).summary(total_count)",
            self.api_name()
        )
    }
}

/// Known kinds summed to more than the reported total.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("reaction drift on {id}: kinds sum to {sum} but total is {total}")]
pub struct ReactionDrift {
    pub id: String,
    pub total: u64,
    pub sum: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactionVector([u64; 6]);

impl ReactionVector {
    #[must_use]
    pub fn new(counts: [u64; 6]) -> Self {
        Self(counts)
    }

    #[must_use]
    pub fn get(&self, kind: ReactionKind) -> u64 {
        self.0[kind.index()]
    }

    pub fn set(&mut self, kind: ReactionKind, count: u64) {
        self.0[kind.index()] = count;
    }

    #[must_use]
    pub fn counts(&self) -> [u64; 6] {
        self.0
    }

    #[must_use]
    pub fn sum(&self) -> u64 {
        self.0.iter().sum()
    }

    /// Reactions not covered by the known kinds: `total - sum`.
    ///
    /// # Errors
    ///
    /// Returns [`ReactionDrift`] when the kinds add up to more than `total`.
    pub fn special(&self, id: &str, total: u64) -> Result<u64, ReactionDrift> {
        let sum = self.sum();
        total.checked_sub(sum).ok_or_else(|| ReactionDrift {
            id: id.to_owned(),
            total,
            sum,
        })
    }
}

/// Per-id breakdowns collected for one page.
///
/// A repeated id overwrites the earlier count for that kind.
#[derive(Debug, Default)]
pub struct ReactionTable {
    by_id: HashMap<String, ReactionVector>,
}

impl ReactionTable {
    pub fn record(&mut self, id: &str, kind: ReactionKind, count: u64) {
        self.by_id.entry(id.to_owned()).or_default().set(kind, count);
    }

    /// Fold one `reactions.type(KIND)` response page into the table.
    pub fn absorb_page(&mut self, kind: ReactionKind, envelope: &Value) {
        let Some(items) = envelope.get("data").and_then(Value::as_array) else {
            return;
        };
        for item in items {
            if let Some(id) = item.get("id").and_then(Value::as_str) {
                self.record(id, kind, summary_total(item, "reactions"));
            }
        }
    }

    /// Breakdown for `id`; zeros (with a warning) when the id never showed up.
    #[must_use]
    pub fn vector_for(&self, id: &str) -> ReactionVector {
        if let Some(vector) = self.by_id.get(id) {
            *vector
        } else {
            tracing::warn!(id, "no reaction breakdown for item; using zeros");
            ReactionVector::default()
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// `item[field].summary.total_count`, or 0 when any part is missing.
#[must_use]
pub fn summary_total(item: &Value, field: &str) -> u64 {
    item.get(field)
        .and_then(|f| f.pointer("/summary/total_count"))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}
