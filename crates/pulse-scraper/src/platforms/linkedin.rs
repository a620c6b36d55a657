//! LinkedIn company harvester (v1 REST API).
//!
//! Company updates are paged by offset and carry their comments inline. The
//! company reports come from three statistics endpoints:
//!
//! ```text
//! /companies/{id}/historical-follow-statistics         followers per interval
//! /companies/{id}/historical-status-update-statistics  update engagement per interval
//! /companies/{id}/company-statistics                   follower breakdowns
//! ```

use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;

use pulse_core::timefmt::millis_local;
use pulse_core::{Channel, LinkedInSource, RecordKind};

use super::{cell, count, HarvestSettings, HarvestSummary};
use crate::client::JsonSource;
use crate::error::ScraperError;
use crate::pagination::{CursorStyle, Paginator, RequestTemplate};

pub const POST_COLUMNS: [&str; 5] = [
    "status_id",
    "status_message",
    "status_published",
    "num_comments",
    "num_likes",
];

pub const COMMENT_COLUMNS: [&str; 4] = [
    "comment_id",
    "status_id",
    "comment_message",
    "comment_published",
];

pub const FOLLOWER_COLUMNS: [&str; 4] = [
    "date",
    "num_organic_followers",
    "num_paid_followers",
    "num_total_followers",
];

pub const UPDATE_STATISTICS_COLUMNS: [&str; 7] = [
    "date",
    "num_impressions",
    "num_clicks",
    "num_likes",
    "num_comments",
    "num_shares",
    "engagement",
];

pub const FOLLOWER_STATISTICS_COLUMNS: [&str; 3] = ["category", "key", "count"];

/// A historical statistics feed and the value keys behind its columns.
struct History {
    endpoint: &'static str,
    report: &'static str,
    columns: &'static [&'static str],
    keys: &'static [&'static str],
}

const FOLLOWER_HISTORY: History = History {
    endpoint: "historical-follow-statistics",
    report: "followers",
    columns: &FOLLOWER_COLUMNS,
    keys: &["organicFollowerCount", "paidFollowerCount", "totalFollowerCount"],
};

const UPDATE_HISTORY: History = History {
    endpoint: "historical-status-update-statistics",
    report: "update_statistics",
    columns: &UPDATE_STATISTICS_COLUMNS,
    keys: &[
        "impressionCount",
        "clickCount",
        "likeCount",
        "commentCount",
        "shareCount",
        "engagement",
    ],
};

pub const FOLLOWER_STATISTICS_REPORT: &str = "follower_statistics";

/// `followStatistics` breakdowns as (category, field).
const BREAKDOWNS: [(&str, &str); 6] = [
    ("seniority", "seniorities"),
    ("function", "functions"),
    ("industry", "industries"),
    ("company_size", "companySizes"),
    ("country", "countries"),
    ("region", "regions"),
];

const FOLLOWER_TOTALS: [&str; 3] = ["count", "employeeCount", "nonEmployeeCount"];

const SHARE: &str = "/updateContent/companyStatusUpdate/share";

pub struct LinkedInHarvester<'a, S> {
    source: &'a S,
    settings: &'a HarvestSettings,
    target: &'a LinkedInSource,
    token: String,
}

impl<'a, S: JsonSource> LinkedInHarvester<'a, S> {
    #[must_use]
    pub fn new(
        source: &'a S,
        settings: &'a HarvestSettings,
        target: &'a LinkedInSource,
        token: impl Into<String>,
    ) -> Self {
        Self {
            source,
            settings,
            target,
            token: token.into(),
        }
    }

    fn published(&self, item: &Value) -> String {
        self.local_time(item, "timestamp")
    }

    fn local_time(&self, item: &Value, key: &str) -> String {
        item.get(key)
            .and_then(Value::as_i64)
            .and_then(|ms| millis_local(ms, self.settings.tz_offset_hours))
            .unwrap_or_default()
    }

    fn company_url(&self, path: &str) -> RequestTemplate {
        RequestTemplate::new(format!(
            "{}/companies/{}/{path}",
            self.target.base_url(),
            self.target.company_id
        ))
        .param("format", "json")
        .param("oauth2_access_token", self.token.as_str())
    }

    /// Harvest company updates and the comments embedded in them, then the
    /// company reports unless `reports_since` is unset.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] on fetch or write failure.
    pub async fn run(&self) -> Result<HarvestSummary, ScraperError> {
        let mut summary = HarvestSummary::new(Channel::LinkedIn);
        let template = self
            .company_url("updates")
            .param("count", self.settings.page_size.to_string());

        let mut posts = self
            .settings
            .writer(Channel::LinkedIn, RecordKind::Post, &POST_COLUMNS)?;
        let mut comments =
            self.settings
                .writer(Channel::LinkedIn, RecordKind::Comment, &COMMENT_COLUMNS)?;
        let mut pager = Paginator::new(self.source, template, CursorStyle::Offset, "/values")
            .with_page_cap(self.settings.max_pages);

        while pager.has_next() {
            for update in pager.advance().await?.items {
                let status_id = cell(&update, &format!("{SHARE}/id"));
                if status_id.is_empty() {
                    // likes, follows and other non-share updates
                    summary.skipped += 1;
                    continue;
                }
                posts.append([
                    status_id.clone(),
                    cell(&update, &format!("{SHARE}/comment")),
                    self.published(&update),
                    count(&update, "/updateComments/_total").to_string(),
                    count(&update, "/likes/_total").to_string(),
                ])?;
                summary.posts += 1;

                let embedded = update
                    .pointer("/updateComments/values")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                for comment in embedded {
                    comments.append([
                        cell(comment, "/id"),
                        status_id.clone(),
                        cell(comment, "/comment"),
                        self.published(comment),
                    ])?;
                    summary.comments += 1;
                }
            }
        }

        posts.finish()?;
        comments.finish()?;

        if let Some(since) = self.target.reports_since {
            summary.reports += self.harvest_history(&FOLLOWER_HISTORY, since).await?;
            summary.reports += self.harvest_history(&UPDATE_HISTORY, since).await?;
            summary.reports += self.harvest_follower_statistics().await?;
        }

        tracing::info!(
            company_id = %self.target.company_id,
            posts = summary.posts,
            comments = summary.comments,
            report_rows = summary.reports,
            "linkedin harvest complete"
        );
        Ok(summary)
    }

    /// One row per data point of a historical statistics feed.
    async fn harvest_history(&self, history: &History, since: NaiveDate) -> Result<usize, ScraperError> {
        let start = since.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
        let template = self
            .company_url(history.endpoint)
            .param("start-timestamp", start.to_string())
            .param("time-granularity", self.target.granularity.as_str());
        let mut pager = Paginator::new(self.source, template, CursorStyle::Offset, "/values")
            .with_page_cap(self.settings.max_pages);
        let mut writer =
            self.settings
                .report_writer(Channel::LinkedIn, history.report, history.columns)?;

        while pager.has_next() {
            for point in pager.advance().await?.items {
                let date = self.local_time(&point, "time");
                let values = history.keys.iter().map(|k| cell(&point, &format!("/{k}")));
                writer.append(std::iter::once(date).chain(values))?;
            }
        }
        Ok(writer.finish()?.rows)
    }

    /// Flatten the current follower totals and breakdowns into
    /// `category,key,count` rows.
    async fn harvest_follower_statistics(&self) -> Result<usize, ScraperError> {
        let url = self
            .company_url("company-statistics")
            .url(CursorStyle::Offset, None);
        let stats = self.source.get_json(&url).await?;
        let Some(follows) = stats.get("followStatistics") else {
            tracing::warn!(company_id = %self.target.company_id, "company statistics without followStatistics");
            return Ok(0);
        };

        let mut writer = self.settings.report_writer(
            Channel::LinkedIn,
            FOLLOWER_STATISTICS_REPORT,
            &FOLLOWER_STATISTICS_COLUMNS,
        )?;
        for key in FOLLOWER_TOTALS {
            if let Some(n) = follows.get(key).and_then(Value::as_u64) {
                writer.append(["total".to_owned(), key.to_owned(), n.to_string()])?;
            }
        }
        for (category, field) in BREAKDOWNS {
            let entries = follows
                .pointer(&format!("/{field}/values"))
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for entry in entries {
                writer.append([
                    category.to_owned(),
                    cell(entry, "/entryKey"),
                    cell(entry, "/entryValue"),
                ])?;
            }
        }
        Ok(writer.finish()?.rows)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use pulse_core::Granularity;

    use super::*;
    use crate::pagination::testing::MockSource;

    const BASE: &str = "https://li.test/v1";

    fn update(id: &str, comments: &Value) -> Value {
        json!({
            "timestamp": 1_500_000_000_000_i64,
            "updateContent": {"companyStatusUpdate": {"share": {"id": id, "comment": format!("post {id}")}}},
            "likes": {"_total": 4},
            "updateComments": comments
        })
    }

    #[tokio::test]
    async fn offset_pages_and_embedded_comments_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let settings = HarvestSettings {
            out_dir: dir.path().to_path_buf(),
            name: "acme".to_owned(),
            tz_offset_hours: 8,
            batch_size: 100,
            page_size: 1,
            reply_depth: 1,
            max_pages: None,
        };
        let target = LinkedInSource {
            company_id: "77".to_owned(),
            reports_since: None,
            granularity: Granularity::Day,
            api_base: Some(BASE.to_owned()),
        };
        let url = format!("{BASE}/companies/77/updates?format=json&oauth2_access_token=t&count=1");
        let source = MockSource::default()
            .with(
                &url,
                json!({"_start": 0, "_count": 1, "_total": 2, "values": [update(
                    "s1",
                    &json!({"_total": 1, "values": [{"id": 9, "comment": "nice", "timestamp": 1_500_000_060_000_i64}]})
                )]}),
            )
            .with(
                &format!("{url}&start=1"),
                json!({"_start": 1, "_count": 1, "_total": 2, "values": [update("s2", &json!({"_total": 0}))]}),
            );

        let summary = LinkedInHarvester::new(&source, &settings, &target, "t")
            .run()
            .await
            .unwrap();
        assert_eq!((summary.posts, summary.comments), (2, 1));

        let posts = std::fs::read_to_string(settings.path(Channel::LinkedIn, RecordKind::Post)).unwrap();
        assert_eq!(
            posts,
            "status_id,status_message,status_published,num_comments,num_likes\n\
             s1,post s1,2017-07-14 10:40:00,1,4\n\
             s2,post s2,2017-07-14 10:40:00,0,4\n"
        );
        let comments =
            std::fs::read_to_string(settings.path(Channel::LinkedIn, RecordKind::Comment)).unwrap();
        assert!(comments.ends_with("9,s1,nice,2017-07-14 10:41:00\n"));
    }
}
