//! Weibo account harvester (mobile container API).
//!
//! The feed is paged by page number. Posts carry display dates such as
//! `08-15`, `3小时前` or `昨天 12:30`; these are resolved against the harvest
//! time so the output only holds absolute timestamps.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;

use pulse_core::timefmt::{offset, TIMESTAMP_FORMAT};
use pulse_core::{Channel, RecordKind, WeiboSource};

use super::{cell, count, HarvestSettings, HarvestSummary};
use crate::client::JsonSource;
use crate::error::ScraperError;
use crate::pagination::{CursorStyle, Paginator, RequestTemplate};

pub const PROFILE_COLUMNS: [&str; 10] = [
    "screen_name",
    "profile_url",
    "gender",
    "followers_count",
    "follow_count",
    "description",
    "id",
    "total_reposts",
    "total_comments",
    "total_likes",
];

pub const TWEET_COLUMNS: [&str; 7] = [
    "created_at",
    "status_id",
    "text",
    "is_paid",
    "num_reposts",
    "num_comments",
    "num_likes",
];

static HTML_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<.*?>").expect("valid tags regex"));
static MINUTES_AGO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*分钟前$").expect("valid minutes regex"));
static HOURS_AGO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*小时前$").expect("valid hours regex"));
static DAY_PREFIXED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(昨天|今天)\s*(\d{1,2}:\d{2})$").expect("valid day regex"));

/// Remove HTML tags, keeping the text between them.
#[must_use]
pub fn strip_html(raw: &str) -> String {
    HTML_TAGS.replace_all(raw, "").into_owned()
}

/// Resolve a Weibo display date against `now`.
///
/// Returns `None` for shapes the feed is not known to produce.
#[must_use]
pub fn resolve_date(raw: &str, now: DateTime<FixedOffset>) -> Option<String> {
    let raw = raw.trim();
    let tz = now.timezone();
    let at_midnight = |date: NaiveDate| {
        tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
            .single()
    };

    let resolved = if raw == "刚刚" {
        Some(now)
    } else if let Some(caps) = MINUTES_AGO.captures(raw) {
        let minutes = Duration::try_minutes(caps[1].parse().ok()?)?;
        now.checked_sub_signed(minutes)
    } else if let Some(caps) = HOURS_AGO.captures(raw) {
        let hours = Duration::try_hours(caps[1].parse().ok()?)?;
        now.checked_sub_signed(hours)
    } else if let Some(caps) = DAY_PREFIXED.captures(raw) {
        let day = if &caps[1] == "昨天" {
            now.date_naive().pred_opt()?
        } else {
            now.date_naive()
        };
        let time = NaiveTime::parse_from_str(&caps[2], "%H:%M").ok()?;
        tz.from_local_datetime(&day.and_time(time)).single()
    } else if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        at_midnight(date)
    } else if let Ok(date) =
        NaiveDate::parse_from_str(&format!("{}-{raw}", now.format("%Y")), "%Y-%m-%d")
    {
        at_midnight(date)
    } else {
        None
    };

    resolved.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
}

pub struct WeiboHarvester<'a, S> {
    source: &'a S,
    settings: &'a HarvestSettings,
    target: &'a WeiboSource,
}

#[derive(Default)]
struct Totals {
    reposts: u64,
    comments: u64,
    likes: u64,
}

impl<'a, S: JsonSource> WeiboHarvester<'a, S> {
    #[must_use]
    pub fn new(source: &'a S, settings: &'a HarvestSettings, target: &'a WeiboSource) -> Self {
        Self {
            source,
            settings,
            target,
        }
    }

    /// Harvest posts, then the profile with engagement totals over those posts.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] on fetch or write failure.
    pub async fn run(&self) -> Result<HarvestSummary, ScraperError> {
        let mut summary = HarvestSummary::new(Channel::Weibo);
        let now = Utc::now().with_timezone(&offset(self.settings.tz_offset_hours));
        let totals = self.harvest_posts(now, &mut summary).await?;
        summary.profiles = self.harvest_profile(&totals).await?;
        tracing::info!(
            uid = %self.target.uid,
            posts = summary.posts,
            skipped = summary.skipped,
            "weibo harvest complete"
        );
        Ok(summary)
    }

    fn index_template(&self) -> RequestTemplate {
        RequestTemplate::new(format!("{}/container/getIndex", self.target.base_url()))
            .param("type", "uid")
            .param("value", self.target.uid.as_str())
    }

    async fn harvest_posts(
        &self,
        now: DateTime<FixedOffset>,
        summary: &mut HarvestSummary,
    ) -> Result<Totals, ScraperError> {
        let template = self
            .index_template()
            .param("containerid", self.target.container_id.as_str());
        let style = CursorStyle::PageNumber {
            max_pages: self.target.max_pages,
        };
        let mut writer = self
            .settings
            .writer(Channel::Weibo, RecordKind::Post, &TWEET_COLUMNS)?;
        let mut pager = Paginator::new(self.source, template, style, "/data/cards");
        let mut totals = Totals::default();

        while pager.has_next() {
            for card in pager.advance().await?.items {
                let Some(post) = card.get("mblog") else {
                    summary.skipped += 1;
                    continue;
                };
                if post.get("retweeted_status").is_some() {
                    summary.skipped += 1;
                    continue;
                }

                let raw_date = cell(post, "/created_at");
                let created_at = resolve_date(&raw_date, now).unwrap_or_else(|| {
                    tracing::warn!(raw = %raw_date, "unrecognised weibo date; keeping raw value");
                    raw_date.clone()
                });
                let reposts = count(post, "/reposts_count");
                let comments = count(post, "/comments_count");
                let likes = count(post, "/attitudes_count");
                totals.reposts += reposts;
                totals.comments += comments;
                totals.likes += likes;

                writer.append([
                    created_at,
                    cell(post, "/id"),
                    strip_html(&cell(post, "/text")),
                    cell(post, "/is_paid"),
                    reposts.to_string(),
                    comments.to_string(),
                    likes.to_string(),
                ])?;
                summary.posts += 1;
            }
        }

        writer.finish()?;
        Ok(totals)
    }

    async fn harvest_profile(&self, totals: &Totals) -> Result<usize, ScraperError> {
        let url = self
            .index_template()
            .url(CursorStyle::PageNumber { max_pages: 1 }, None);
        let envelope = self.source.get_json(&url).await?;
        let Some(user) = envelope.pointer("/data/userInfo") else {
            return Err(ScraperError::Shape {
                url,
                reason: "missing data.userInfo".to_owned(),
            });
        };

        let mut writer = self
            .settings
            .writer(Channel::Weibo, RecordKind::Profile, &PROFILE_COLUMNS)?;
        let mut row: Vec<String> = PROFILE_COLUMNS[..7]
            .iter()
            .map(|c| cell(user, &format!("/{c}")))
            .collect();
        row.extend([
            totals.reposts.to_string(),
            totals.comments.to_string(),
            totals.likes.to_string(),
        ]);
        writer.append(row)?;
        Ok(writer.finish()?.rows)
    }
}
