//! Facebook page harvester (Graph API).
//!
//! Posts are paged with `after` cursors. For every page of posts or comments
//! the same request is repeated once per reaction kind to get the breakdown,
//! and the remainder of the total becomes `num_special`.
//!
//! Page insights are walked backwards through `paging.previous`, two days per
//! window, and pivoted into one row per day.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;

use serde_json::Value;

use pulse_core::timefmt::graph_time_local;
use pulse_core::{BatchWriter, Channel, FacebookSource, RecordKind};

use super::{cell, count, edge_count, HarvestSettings, HarvestSummary};
use crate::client::JsonSource;
use crate::error::ScraperError;
use crate::pagination::{CursorStyle, Paginator, RequestTemplate};
use crate::reactions::{summary_total, ReactionTable, ReactionVector, REACTION_KINDS};
use crate::tree::{ReplyFeed, TreeNode, TreeWalker};

pub const PROFILE_COLUMNS: [&str; 5] = ["name", "username", "id", "fan_count", "link"];

pub const POST_COLUMNS: [&str; 16] = [
    "status_id",
    "status_message",
    "link_name",
    "status_type",
    "status_link",
    "status_published",
    "num_reactions",
    "num_comments",
    "num_shares",
    "num_likes",
    "num_loves",
    "num_wows",
    "num_hahas",
    "num_sads",
    "num_angrys",
    "num_special",
];

pub const COMMENT_COLUMNS: [&str; 14] = [
    "comment_id",
    "status_id",
    "parent_id",
    "comment_message",
    "comment_author",
    "comment_published",
    "num_reactions",
    "num_likes",
    "num_loves",
    "num_wows",
    "num_hahas",
    "num_sads",
    "num_angrys",
    "num_special",
];

/// Daily page insights: `date` followed by one column per metric.
pub const INSIGHT_COLUMNS: [&str; 15] = [
    "date",
    "page_content_activity_by_action_type_unique",
    "page_impressions",
    "page_impressions_unique",
    "page_impressions_organic",
    "page_impressions_organic_unique",
    "page_impressions_paid",
    "page_impressions_paid_unique",
    "post_activity_by_action_type_unique",
    "post_impressions",
    "post_impressions_unique",
    "post_impressions_organic",
    "post_impressions_organic_unique",
    "post_impressions_paid",
    "post_impressions_paid_unique",
];

pub const INSIGHTS_REPORT: &str = "insights";

const POST_FIELDS: &str = "message,link,created_time,type,name,id,\
comments.limit(0).summary(true),shares,reactions.limit(0).summary(true)";

const COMMENT_FIELDS: &str =
    "id,message,reactions.limit(0).summary(true),created_time,comment_count,comments,from,attachment";

const POSTS_STYLE: CursorStyle = CursorStyle::GraphAfter {
    require_next_link: false,
};

const COMMENTS_STYLE: CursorStyle = CursorStyle::GraphAfter {
    require_next_link: true,
};

pub struct FacebookHarvester<'a, S> {
    source: &'a S,
    settings: &'a HarvestSettings,
    target: &'a FacebookSource,
    token: String,
}

struct CommentReplies {
    base: String,
    token: String,
    limit: String,
}

impl ReplyFeed for CommentReplies {
    fn node_id(&self, item: &Value) -> Option<String> {
        item.get("id").and_then(Value::as_str).map(str::to_owned)
    }

    fn reply_count(&self, item: &Value) -> u64 {
        item.get("comment_count")
            .and_then(Value::as_u64)
            .unwrap_or_else(|| edge_count(item, "comments"))
    }

    fn replies(&self, node_id: &str) -> RequestTemplate {
        comments_template(&self.base, node_id, &self.limit, &self.token)
    }
}

fn comments_template(base: &str, node_id: &str, limit: &str, token: &str) -> RequestTemplate {
    RequestTemplate::new(format!("{base}/{node_id}/comments"))
        .param("limit", limit)
        .param("access_token", token)
        .param("fields", COMMENT_FIELDS)
}

/// Fetch one breakdown request per reaction kind for the same page.
async fn page_reactions<S, U>(source: &S, url_for: U) -> Result<ReactionTable, ScraperError>
where
    S: JsonSource,
    U: Fn(&str) -> String,
{
    let mut table = ReactionTable::default();
    for kind in REACTION_KINDS {
        let envelope = source.get_json(&url_for(&kind.fields_query())).await?;
        table.absorb_page(kind, &envelope);
    }
    Ok(table)
}

/// Comment text with an `[[TYPE]]` tag for attachments.
fn comment_message(item: &Value) -> String {
    let message = cell(item, "/message");
    let Some(kind) = item.pointer("/attachment/type").and_then(Value::as_str) else {
        return message;
    };
    let kind = if kind == "animated_image_share" {
        "gif"
    } else {
        kind
    };
    let tag = format!("[[{}]]", kind.to_uppercase());
    if message.is_empty() {
        tag
    } else {
        format!("{message} {tag}")
    }
}

impl<'a, S: JsonSource> FacebookHarvester<'a, S> {
    #[must_use]
    pub fn new(
        source: &'a S,
        settings: &'a HarvestSettings,
        target: &'a FacebookSource,
        token: impl Into<String>,
    ) -> Self {
        Self {
            source,
            settings,
            target,
            token: token.into(),
        }
    }

    /// Harvest profile, posts and comments.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] on fetch or write failure.
    pub async fn run(&self) -> Result<HarvestSummary, ScraperError> {
        let mut summary = HarvestSummary::new(Channel::Facebook);
        summary.profiles = self.harvest_profile().await?;
        let post_ids = self.harvest_posts(&mut summary).await?;
        self.harvest_comments(&post_ids, &mut summary).await?;
        summary.reports = self.harvest_insights().await?;
        tracing::info!(
            page = %self.target.page,
            posts = summary.posts,
            comments = summary.comments,
            insight_days = summary.reports,
            reaction_drift = summary.reaction_drift,
            "facebook harvest complete"
        );
        Ok(summary)
    }

    async fn harvest_profile(&self) -> Result<usize, ScraperError> {
        let url = RequestTemplate::new(format!("{}/{}", self.target.base_url(), self.target.page))
            .param("fields", PROFILE_COLUMNS.join(","))
            .param("access_token", self.token.as_str())
            .url(POSTS_STYLE, None);
        let profile = self.source.get_json(&url).await?;

        let mut writer =
            self.settings
                .writer(Channel::Facebook, RecordKind::Profile, &PROFILE_COLUMNS)?;
        writer.append(PROFILE_COLUMNS.iter().map(|c| cell(&profile, &format!("/{c}"))))?;
        Ok(writer.finish()?.rows)
    }

    /// Write one row per day of page insights, oldest first.
    async fn harvest_insights(&self) -> Result<usize, ScraperError> {
        let days = self.target.insight_days;
        if days == 0 {
            return Ok(0);
        }
        let metrics = &INSIGHT_COLUMNS[1..];
        let template = RequestTemplate::new(format!(
            "{}/{}/insights",
            self.target.base_url(),
            self.target.page
        ))
        .param("metric", metrics.join(","))
        .param("period", "day")
        .param("access_token", self.token.as_str());
        let mut pager = Paginator::new(self.source, template, CursorStyle::GraphPrevious, "/data");

        let windows = days.div_ceil(2) as usize;
        let mut by_day: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut fetched = 0;
        while pager.has_next() && fetched < windows {
            let page = pager.advance().await?;
            fetched += 1;
            for metric in &page.items {
                let name = metric.get("name").and_then(Value::as_str).unwrap_or_default();
                let Some(column) = metrics.iter().position(|m| *m == name) else {
                    tracing::debug!(metric = name, "ignoring unrequested insight metric");
                    continue;
                };
                let values = metric
                    .get("values")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                for point in values {
                    let end_time = cell(point, "/end_time");
                    if end_time.is_empty() {
                        continue;
                    }
                    let day = graph_time_local(&end_time, self.settings.tz_offset_hours);
                    let row = by_day
                        .entry(day)
                        .or_insert_with(|| vec![String::new(); metrics.len()]);
                    row[column] = cell(point, "/value");
                }
            }
        }

        let mut writer =
            self.settings
                .report_writer(Channel::Facebook, INSIGHTS_REPORT, &INSIGHT_COLUMNS)?;
        for (day, values) in by_day {
            writer.append(std::iter::once(day).chain(values))?;
        }
        Ok(writer.finish()?.rows)
    }

    fn posts_template(&self) -> RequestTemplate {
        let mut template =
            RequestTemplate::new(format!("{}/{}/posts", self.target.base_url(), self.target.page))
                .param("limit", self.settings.page_size.to_string())
                .param("access_token", self.token.as_str());
        if let Some(since) = self.target.since {
            template = template.param("since", since.format("%Y-%m-%d").to_string());
        }
        template.param("fields", POST_FIELDS)
    }

    /// Write every post row and return the post ids in feed order.
    async fn harvest_posts(&self, summary: &mut HarvestSummary) -> Result<Vec<String>, ScraperError> {
        let mut writer = self
            .settings
            .writer(Channel::Facebook, RecordKind::Post, &POST_COLUMNS)?;
        let mut pager = Paginator::new(self.source, self.posts_template(), POSTS_STYLE, "/data")
            .with_page_cap(self.settings.max_pages);
        let mut ids = Vec::new();

        while pager.has_next() {
            let page = pager.advance().await?;
            if page.items.is_empty() {
                continue;
            }
            let template = pager.template().clone();
            let cursor = page.cursor_used.clone();
            let reactions = page_reactions(self.source, |fields| {
                template
                    .clone()
                    .param("fields", fields)
                    .url(POSTS_STYLE, cursor.as_ref())
            })
            .await?;

            for post in &page.items {
                let Some(id) = post.get("id").and_then(Value::as_str) else {
                    tracing::warn!("post without id; skipping");
                    summary.skipped += 1;
                    continue;
                };
                let row = self.post_row(id, post, &reactions.vector_for(id), summary);
                writer.append(row)?;
                ids.push(id.to_owned());
                summary.posts += 1;
            }
        }

        writer.finish()?;
        Ok(ids)
    }

    fn post_row(
        &self,
        id: &str,
        post: &Value,
        vector: &ReactionVector,
        summary: &mut HarvestSummary,
    ) -> Vec<String> {
        let total = summary_total(post, "reactions");
        let mut row = vec![
            id.to_owned(),
            cell(post, "/message"),
            cell(post, "/name"),
            cell(post, "/type"),
            cell(post, "/link"),
            graph_time_local(&cell(post, "/created_time"), self.settings.tz_offset_hours),
            total.to_string(),
            summary_total(post, "comments").to_string(),
            count(post, "/shares/count").to_string(),
        ];
        row.extend(vector.counts().iter().map(u64::to_string));
        row.push(special_cell(id, total, vector, summary));
        row
    }

    async fn harvest_comments(
        &self,
        post_ids: &[String],
        summary: &mut HarvestSummary,
    ) -> Result<(), ScraperError> {
        let mut writer =
            self.settings
                .writer(Channel::Facebook, RecordKind::Comment, &COMMENT_COLUMNS)?;
        let base = self.target.base_url();
        let limit = self.settings.page_size.to_string();

        for post_id in post_ids {
            let root = Paginator::new(
                self.source,
                comments_template(&base, post_id, &limit, &self.token),
                COMMENTS_STYLE,
                "/data",
            )
            .with_page_cap(self.settings.max_pages);
            let feed = CommentReplies {
                base: base.clone(),
                token: self.token.clone(),
                limit: limit.clone(),
            };
            let mut walker = TreeWalker::new(root, feed, self.settings.reply_depth)
                .with_page_cap(self.settings.max_pages);

            // one breakdown per page, kept while its replies are walked
            let mut page_tables: HashMap<usize, ReactionTable> = HashMap::new();
            while let Some(node) = walker.next_node().await? {
                let origin = &node.origin;
                let table = match page_tables.entry(origin.seq) {
                    Entry::Occupied(cached) => cached.into_mut(),
                    Entry::Vacant(slot) => slot.insert(
                        page_reactions(self.source, |fields| origin.url_with("fields", fields))
                            .await?,
                    ),
                };
                self.write_comment(&mut writer, post_id, &node, table, summary)?;
            }
        }

        writer.finish()?;
        Ok(())
    }

    fn write_comment(
        &self,
        writer: &mut BatchWriter<File>,
        post_id: &str,
        node: &TreeNode,
        table: &ReactionTable,
        summary: &mut HarvestSummary,
    ) -> Result<(), ScraperError> {
        let comment = &node.item;
        let Some(id) = comment.get("id").and_then(Value::as_str) else {
            tracing::warn!(post_id, "comment without id; skipping");
            summary.skipped += 1;
            return Ok(());
        };
        let vector = table.vector_for(id);
        let total = summary_total(comment, "reactions");

        let mut row = vec![
            id.to_owned(),
            post_id.to_owned(),
            node.parent_id.clone().unwrap_or_default(),
            comment_message(comment),
            cell(comment, "/from/name"),
            graph_time_local(&cell(comment, "/created_time"), self.settings.tz_offset_hours),
            total.to_string(),
        ];
        row.extend(vector.counts().iter().map(u64::to_string));
        row.push(special_cell(id, total, &vector, summary));

        writer.append(row)?;
        summary.comments += 1;
        Ok(())
    }
}

/// `num_special` as a cell; drift is logged, counted and left blank.
fn special_cell(id: &str, total: u64, vector: &ReactionVector, summary: &mut HarvestSummary) -> String {
    match vector.special(id, total) {
        Ok(special) => special.to_string(),
        Err(drift) => {
            tracing::error!(
                id = %drift.id,
                total = drift.total,
                sum = drift.sum,
                "reaction kinds exceed total; leaving num_special blank"
            );
            summary.reaction_drift += 1;
            String::new()
        }
    }
}
