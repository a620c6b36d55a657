//! Per-platform column maps and row normalization.
//!
//! Facebook rows are unpivoted first (one row per reaction kind); the other
//! platforms only report likes and get a constant `reaction_type` of `likes`
//! with the like count as `reaction_count`.

use pulse_core::{CanonicalRow, Channel, RecordKind};

use crate::column_map::{BoundMap, ColumnMap, Rule};
use crate::error::NormalizeError;
use crate::unpivot::{BoundUnpivot, Unpivot};

use Rule::{Absent, Column, Constant, FirstExpandedUrl, Shop};

const ENRICHMENT: [(&str, Rule); 4] = [
    ("sentiment_pos", Column("sentiment_pos")),
    ("sentiment_neg", Column("sentiment_neg")),
    ("keyword", Column("keyword")),
    ("keyword_weight", Column("keyword_weight")),
];

fn with_enrichment(head: &[(&'static str, Rule)]) -> Vec<(&'static str, Rule)> {
    head.iter().copied().chain(ENRICHMENT).collect()
}

fn post_rules(channel: Channel) -> Vec<(&'static str, Rule)> {
    let head: [(&str, Rule); 13] = match channel {
        Channel::Facebook => [
            ("channel", Rule::Channel),
            ("shop", Shop),
            ("status_id", Column("status_id")),
            ("status_message", Column("status_message")),
            ("link_name", Column("link_name")),
            ("status_type", Column("status_type")),
            ("status_link", Column("status_link")),
            ("status_published", Column("status_published")),
            ("num_total_reactions", Column("num_reactions")),
            ("num_comments", Column("num_comments")),
            ("num_shares", Column("num_shares")),
            ("reaction_type", Column("reaction_type")),
            ("reaction_count", Column("reaction_count")),
        ],
        Channel::Twitter => [
            ("channel", Rule::Channel),
            ("shop", Shop),
            ("status_id", Column("id")),
            ("status_message", Column("text")),
            ("link_name", Absent),
            ("status_type", Absent),
            ("status_link", FirstExpandedUrl("entities")),
            ("status_published", Column("created_at")),
            ("num_total_reactions", Column("like_count")),
            ("num_comments", Column("reply_count")),
            ("num_shares", Column("retweet_count")),
            ("reaction_type", Constant("likes")),
            ("reaction_count", Column("like_count")),
        ],
        Channel::LinkedIn => [
            ("channel", Rule::Channel),
            ("shop", Shop),
            ("status_id", Column("status_id")),
            ("status_message", Column("status_message")),
            ("link_name", Absent),
            ("status_type", Absent),
            ("status_link", Absent),
            ("status_published", Column("status_published")),
            ("num_total_reactions", Column("num_likes")),
            ("num_comments", Column("num_comments")),
            ("num_shares", Absent),
            ("reaction_type", Constant("likes")),
            ("reaction_count", Column("num_likes")),
        ],
        Channel::Instagram => [
            ("channel", Rule::Channel),
            ("shop", Shop),
            ("status_id", Column("status_id")),
            ("status_message", Column("status_message")),
            ("link_name", Absent),
            ("status_type", Column("status_type")),
            ("status_link", Column("status_link")),
            ("status_published", Column("status_published")),
            ("num_total_reactions", Column("num_likes")),
            ("num_comments", Column("num_comments")),
            ("num_shares", Absent),
            ("reaction_type", Constant("likes")),
            ("reaction_count", Column("num_likes")),
        ],
        Channel::Weibo => [
            ("channel", Rule::Channel),
            ("shop", Shop),
            ("status_id", Column("status_id")),
            ("status_message", Column("text")),
            ("link_name", Absent),
            ("status_type", Absent),
            ("status_link", Absent),
            ("status_published", Column("created_at")),
            ("num_total_reactions", Column("num_likes")),
            ("num_comments", Column("num_comments")),
            ("num_shares", Column("num_reposts")),
            ("reaction_type", Constant("likes")),
            ("reaction_count", Column("num_likes")),
        ],
    };
    with_enrichment(&head)
}

/// Twitter and Weibo harvests carry no comments.
fn comment_rules(channel: Channel) -> Option<Vec<(&'static str, Rule)>> {
    let head: [(&str, Rule); 11] = match channel {
        Channel::Facebook => [
            ("channel", Rule::Channel),
            ("shop", Shop),
            ("comment_id", Column("comment_id")),
            ("status_id", Column("status_id")),
            ("parent_id", Column("parent_id")),
            ("comment_message", Column("comment_message")),
            ("comment_author", Column("comment_author")),
            ("comment_published", Column("comment_published")),
            ("num_total_reactions", Column("num_reactions")),
            ("reaction_type", Column("reaction_type")),
            ("reaction_count", Column("reaction_count")),
        ],
        Channel::Instagram => [
            ("channel", Rule::Channel),
            ("shop", Shop),
            ("comment_id", Column("comment_id")),
            ("status_id", Column("status_id")),
            ("parent_id", Column("parent_id")),
            ("comment_message", Column("comment_message")),
            ("comment_author", Column("comment_author")),
            ("comment_published", Column("comment_published")),
            ("num_total_reactions", Column("num_likes")),
            ("reaction_type", Constant("likes")),
            ("reaction_count", Column("num_likes")),
        ],
        Channel::LinkedIn => [
            ("channel", Rule::Channel),
            ("shop", Shop),
            ("comment_id", Column("comment_id")),
            ("status_id", Column("status_id")),
            ("parent_id", Absent),
            ("comment_message", Column("comment_message")),
            ("comment_author", Absent),
            ("comment_published", Column("comment_published")),
            ("num_total_reactions", Absent),
            ("reaction_type", Absent),
            ("reaction_count", Absent),
        ],
        Channel::Twitter | Channel::Weibo => return None,
    };
    Some(with_enrichment(&head))
}

/// The column map for one platform and record kind, if that pair is
/// normalized at all.
///
/// # Errors
///
/// Returns [`NormalizeError::MapShape`] if a built-in map drifts from the
/// canonical header.
pub fn column_map(channel: Channel, kind: RecordKind) -> Result<Option<ColumnMap>, NormalizeError> {
    let rules = match kind {
        RecordKind::Post => Some(post_rules(channel)),
        RecordKind::Comment => comment_rules(channel),
        RecordKind::Profile => None,
    };
    rules
        .map(|rules| ColumnMap::new(channel, kind, &rules))
        .transpose()
}

/// Normalizes rows of one harvested file.
#[derive(Debug, Clone)]
pub struct Normalizer {
    channel: Channel,
    kind: RecordKind,
    unpivot: Option<BoundUnpivot>,
    map: BoundMap,
}

impl Normalizer {
    /// Bind the platform's maps to a source header.
    ///
    /// Returns `Ok(None)` when the platform has no map for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::MissingSourceColumn`] if the header lacks a
    /// mapped or unpivoted column.
    pub fn bind(
        channel: Channel,
        kind: RecordKind,
        header: &[String],
        shop: &str,
    ) -> Result<Option<Self>, NormalizeError> {
        let Some(map) = column_map(channel, kind)? else {
            return Ok(None);
        };
        let unpivot = match channel {
            Channel::Facebook => Some(Unpivot::facebook().bind(channel, kind, header)?),
            _ => None,
        };
        let map_header = unpivot.as_ref().map_or(header, BoundUnpivot::header);
        let map = map.bind(map_header, shop)?;
        Ok(Some(Self {
            channel,
            kind,
            unpivot,
            map,
        }))
    }

    #[must_use]
    pub fn channel(&self) -> Channel {
        self.channel
    }

    #[must_use]
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Canonical rows for one raw row: one per reaction kind for Facebook,
    /// exactly one otherwise.
    #[must_use]
    pub fn normalize(&self, raw: &[&str]) -> Vec<CanonicalRow> {
        match &self.unpivot {
            Some(unpivot) => unpivot
                .apply(raw)
                .iter()
                .map(|narrow| {
                    let cells: Vec<&str> = narrow.iter().map(String::as_str).collect();
                    self.map.apply(&cells)
                })
                .collect(),
            None => vec![self.map.apply(raw)],
        }
    }
}
