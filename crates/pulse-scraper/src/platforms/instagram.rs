//! Instagram business account harvester (Graph API).

use serde_json::Value;

use pulse_core::timefmt::graph_time_local;
use pulse_core::{Channel, InstagramSource, RecordKind};

use super::{cell, edge_count, HarvestSettings, HarvestSummary};
use crate::client::JsonSource;
use crate::error::ScraperError;
use crate::pagination::{CursorStyle, Paginator, RequestTemplate};
use crate::tree::{ReplyFeed, TreeWalker};

pub const PROFILE_COLUMNS: [&str; 5] = [
    "username",
    "user_id",
    "media_count",
    "followers_count",
    "follows_count",
];

pub const POST_COLUMNS: [&str; 7] = [
    "status_id",
    "status_published",
    "status_type",
    "status_link",
    "status_message",
    "num_likes",
    "num_comments",
];

pub const COMMENT_COLUMNS: [&str; 7] = [
    "comment_id",
    "status_id",
    "parent_id",
    "comment_published",
    "comment_message",
    "comment_author",
    "num_likes",
];

const MEDIA_FIELDS: &str = "id,caption,media_type,permalink,timestamp,like_count,comments_count";
const COMMENT_FIELDS: &str = "id,text,username,timestamp,like_count,replies{id}";

/// Instagram keeps returning cursors on the last page; only `next` is reliable.
const STYLE: CursorStyle = CursorStyle::GraphAfter {
    require_next_link: true,
};

pub struct InstagramHarvester<'a, S> {
    source: &'a S,
    settings: &'a HarvestSettings,
    target: &'a InstagramSource,
    token: String,
}

struct Replies {
    base: String,
    token: String,
}

impl ReplyFeed for Replies {
    fn node_id(&self, item: &Value) -> Option<String> {
        item.get("id").and_then(Value::as_str).map(str::to_owned)
    }

    fn reply_count(&self, item: &Value) -> u64 {
        edge_count(item, "replies")
    }

    fn replies(&self, node_id: &str) -> RequestTemplate {
        RequestTemplate::new(format!("{}/{node_id}/replies", self.base))
            .param("fields", COMMENT_FIELDS)
            .param("access_token", self.token.as_str())
    }
}

impl<'a, S: JsonSource> InstagramHarvester<'a, S> {
    #[must_use]
    pub fn new(
        source: &'a S,
        settings: &'a HarvestSettings,
        target: &'a InstagramSource,
        token: impl Into<String>,
    ) -> Self {
        Self {
            source,
            settings,
            target,
            token: token.into(),
        }
    }

    /// Harvest profile, media and comments with their replies.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] on fetch or write failure.
    pub async fn run(&self) -> Result<HarvestSummary, ScraperError> {
        let mut summary = HarvestSummary::new(Channel::Instagram);
        summary.profiles = self.harvest_profile().await?;
        let media_ids = self.harvest_media(&mut summary).await?;
        self.harvest_comments(&media_ids, &mut summary).await?;
        tracing::info!(
            user_id = %self.target.user_id,
            media = summary.posts,
            comments = summary.comments,
            "instagram harvest complete"
        );
        Ok(summary)
    }

    async fn harvest_profile(&self) -> Result<usize, ScraperError> {
        let url = RequestTemplate::new(format!(
            "{}/{}",
            self.target.base_url(),
            self.target.user_id
        ))
        .param("fields", "username,id,media_count,followers_count,follows_count")
        .param("access_token", self.token.as_str())
        .url(STYLE, None);
        let profile = self.source.get_json(&url).await?;

        let mut writer =
            self.settings
                .writer(Channel::Instagram, RecordKind::Profile, &PROFILE_COLUMNS)?;
        writer.append([
            cell(&profile, "/username"),
            cell(&profile, "/id"),
            cell(&profile, "/media_count"),
            cell(&profile, "/followers_count"),
            cell(&profile, "/follows_count"),
        ])?;
        Ok(writer.finish()?.rows)
    }

    async fn harvest_media(&self, summary: &mut HarvestSummary) -> Result<Vec<String>, ScraperError> {
        let template = RequestTemplate::new(format!(
            "{}/{}/media",
            self.target.base_url(),
            self.target.user_id
        ))
        .param("fields", MEDIA_FIELDS)
        .param("limit", self.settings.page_size.to_string())
        .param("access_token", self.token.as_str());

        let mut writer = self
            .settings
            .writer(Channel::Instagram, RecordKind::Post, &POST_COLUMNS)?;
        let mut pager = Paginator::new(self.source, template, STYLE, "/data")
            .with_page_cap(self.settings.max_pages);
        let mut ids = Vec::new();

        while pager.has_next() {
            for media in pager.advance().await?.items {
                let id = cell(&media, "/id");
                writer.append([
                    id.clone(),
                    graph_time_local(&cell(&media, "/timestamp"), self.settings.tz_offset_hours),
                    cell(&media, "/media_type"),
                    cell(&media, "/permalink"),
                    cell(&media, "/caption"),
                    cell(&media, "/like_count"),
                    cell(&media, "/comments_count"),
                ])?;
                summary.posts += 1;
                if media.get("comments_count").and_then(Value::as_u64) != Some(0) && !id.is_empty() {
                    ids.push(id);
                }
            }
        }

        writer.finish()?;
        Ok(ids)
    }

    async fn harvest_comments(
        &self,
        media_ids: &[String],
        summary: &mut HarvestSummary,
    ) -> Result<(), ScraperError> {
        let mut writer =
            self.settings
                .writer(Channel::Instagram, RecordKind::Comment, &COMMENT_COLUMNS)?;
        let base = self.target.base_url();

        for media_id in media_ids {
            let root_template = RequestTemplate::new(format!("{base}/{media_id}/comments"))
                .param("fields", COMMENT_FIELDS)
                .param("access_token", self.token.as_str());
            let root = Paginator::new(self.source, root_template, STYLE, "/data")
                .with_page_cap(self.settings.max_pages);
            let feed = Replies {
                base: base.clone(),
                token: self.token.clone(),
            };
            let mut walker = TreeWalker::new(root, feed, self.settings.reply_depth)
                .with_page_cap(self.settings.max_pages);

            while let Some(node) = walker.next_node().await? {
                let comment = &node.item;
                writer.append([
                    cell(comment, "/id"),
                    media_id.clone(),
                    node.parent_id.clone().unwrap_or_default(),
                    graph_time_local(&cell(comment, "/timestamp"), self.settings.tz_offset_hours),
                    cell(comment, "/text"),
                    cell(comment, "/username"),
                    cell(comment, "/like_count"),
                ])?;
                summary.comments += 1;
            }
        }

        writer.finish()?;
        Ok(())
    }
}
