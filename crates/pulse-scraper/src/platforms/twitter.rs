use serde_json::Value;

use pulse_core::timefmt::rfc3339_local;
use pulse_core::{Channel, RecordKind, TwitterSource};

use super::{cell, HarvestSettings, HarvestSummary};
use crate::client::JsonSource;
use crate::error::ScraperError;
use crate::pagination::{CursorStyle, Paginator, RequestTemplate};

pub const PROFILE_COLUMNS: [&str; 13] = [
    "id",
    "name",
    "username",
    "location",
    "description",
    "url",
    "followers_count",
    "following_count",
    "listed_count",
    "created_at",
    "tweet_count",
    "verified",
    "profile_image_url",
];

pub const TWEET_COLUMNS: [&str; 7] = [
    "created_at",
    "id",
    "text",
    "entities",
    "retweet_count",
    "reply_count",
    "like_count",
];

/// The v2 timeline endpoint accepts 5..=100 results per page.
const MAX_RESULTS_RANGE: (u32, u32) = (5, 100);

pub struct TwitterHarvester<'a, S> {
    source: &'a S,
    settings: &'a HarvestSettings,
    target: &'a TwitterSource,
}

fn profile_pointer(column: &str) -> String {
    match column {
        "followers_count" | "following_count" | "listed_count" | "tweet_count" => {
            format!("/data/public_metrics/{column}")
        }
        other => format!("/data/{other}"),
    }
}

fn is_retweet(tweet: &Value) -> bool {
    tweet
        .get("referenced_tweets")
        .and_then(Value::as_array)
        .is_some_and(|refs| refs.iter().any(|r| r["type"] == "retweeted"))
}

impl<'a, S: JsonSource> TwitterHarvester<'a, S> {
    #[must_use]
    pub fn new(source: &'a S, settings: &'a HarvestSettings, target: &'a TwitterSource) -> Self {
        Self {
            source,
            settings,
            target,
        }
    }

    /// Harvest the profile and the account's own tweets.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] on fetch or write failure.
    pub async fn run(&self) -> Result<HarvestSummary, ScraperError> {
        let mut summary = HarvestSummary::new(Channel::Twitter);
        summary.profiles = self.harvest_profile().await?;
        self.harvest_tweets(&mut summary).await?;
        tracing::info!(
            handle = %self.target.handle,
            tweets = summary.posts,
            retweets_skipped = summary.skipped,
            "twitter harvest complete"
        );
        Ok(summary)
    }

    async fn harvest_profile(&self) -> Result<usize, ScraperError> {
        let url = RequestTemplate::new(format!(
            "{}/users/{}",
            self.target.base_url(),
            self.target.user_id
        ))
        .param(
            "user.fields",
            "created_at,description,location,public_metrics,url,verified,profile_image_url",
        )
        .url(CursorStyle::NextToken, None);
        let profile = self.source.get_json(&url).await?;

        let mut writer =
            self.settings
                .writer(Channel::Twitter, RecordKind::Profile, &PROFILE_COLUMNS)?;
        writer.append(
            PROFILE_COLUMNS
                .iter()
                .map(|c| cell(&profile, &profile_pointer(c))),
        )?;
        Ok(writer.finish()?.rows)
    }

    async fn harvest_tweets(&self, summary: &mut HarvestSummary) -> Result<(), ScraperError> {
        let (lo, hi) = MAX_RESULTS_RANGE;
        let template = RequestTemplate::new(format!(
            "{}/users/{}/tweets",
            self.target.base_url(),
            self.target.user_id
        ))
        .param(
            "max_results",
            self.settings.page_size.clamp(lo, hi).to_string(),
        )
        .param(
            "tweet.fields",
            "created_at,entities,public_metrics,referenced_tweets",
        );

        let mut writer = self
            .settings
            .writer(Channel::Twitter, RecordKind::Post, &TWEET_COLUMNS)?;
        let mut pager = Paginator::new(self.source, template, CursorStyle::NextToken, "/data")
            .with_page_cap(self.settings.max_pages);

        while pager.has_next() {
            for tweet in pager.advance().await?.items {
                if is_retweet(&tweet) {
                    summary.skipped += 1;
                    continue;
                }
                writer.append([
                    rfc3339_local(&cell(&tweet, "/created_at"), self.settings.tz_offset_hours),
                    cell(&tweet, "/id"),
                    cell(&tweet, "/text"),
                    entities_cell(&tweet),
                    cell(&tweet, "/public_metrics/retweet_count"),
                    cell(&tweet, "/public_metrics/reply_count"),
                    cell(&tweet, "/public_metrics/like_count"),
                ])?;
                summary.posts += 1;
            }
        }

        writer.finish()?;
        Ok(())
    }
}

/// Entities as JSON, `{}` when the tweet has none.
fn entities_cell(tweet: &Value) -> String {
    tweet
        .get("entities")
        .map_or_else(|| "{}".to_owned(), Value::to_string)
}
