use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com/v3.0";
pub const DEFAULT_TWITTER_API_BASE: &str = "https://api.twitter.com/2";
pub const DEFAULT_LINKEDIN_API_BASE: &str = "https://api.linkedin.com/v1";
pub const DEFAULT_WEIBO_API_BASE: &str = "https://m.weibo.cn/api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacebookSource {
    /// Page name or numeric page id as used in Graph API paths.
    pub page: String,
    /// Only posts published on or after this date are requested.
    pub since: Option<NaiveDate>,
    /// Days of page insights to fetch, newest first. `0` skips the report.
    #[serde(default = "default_insight_days")]
    pub insight_days: u32,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterSource {
    pub handle: String,
    pub user_id: String,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramSource {
    /// Instagram business account id.
    pub user_id: String,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedInSource {
    pub company_id: String,
    /// Start of the historical follower and update statistics; `null` skips
    /// the company reports.
    #[serde(default = "default_reports_since")]
    pub reports_since: Option<NaiveDate>,
    #[serde(default)]
    pub granularity: Granularity,
    pub api_base: Option<String>,
}

/// Spacing of historical statistics data points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Month,
}

impl Granularity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Month => "month",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeiboSource {
    pub uid: String,
    /// Container id of the account's post feed (usually `107603` + uid).
    pub container_id: String,
    #[serde(default = "default_weibo_pages")]
    pub max_pages: usize,
    pub api_base: Option<String>,
}

fn default_weibo_pages() -> usize {
    50
}

fn default_insight_days() -> u32 {
    100
}

fn default_reports_since() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2018, 1, 1)
}

macro_rules! api_base {
    ($ty:ty, $default:expr) => {
        impl $ty {
            /// Configured API base URL without a trailing slash.
            #[must_use]
            pub fn base_url(&self) -> String {
                self.api_base
                    .as_deref()
                    .unwrap_or($default)
                    .trim_end_matches('/')
                    .to_string()
            }
        }
    };
}

api_base!(FacebookSource, DEFAULT_GRAPH_API_BASE);
api_base!(TwitterSource, DEFAULT_TWITTER_API_BASE);
api_base!(InstagramSource, DEFAULT_GRAPH_API_BASE);
api_base!(LinkedInSource, DEFAULT_LINKEDIN_API_BASE);
api_base!(WeiboSource, DEFAULT_WEIBO_API_BASE);

/// Per-platform harvest targets. A platform without a section is skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesFile {
    pub facebook: Option<FacebookSource>,
    pub twitter: Option<TwitterSource>,
    pub instagram: Option<InstagramSource>,
    pub linkedin: Option<LinkedInSource>,
    pub weibo: Option<WeiboSource>,
}

impl SourcesFile {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facebook.is_none()
            && self.twitter.is_none()
            && self.instagram.is_none()
            && self.linkedin.is_none()
            && self.weibo.is_none()
    }
}

/// Load and validate the harvest sources from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sources(path: &Path) -> Result<SourcesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourcesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let sources: SourcesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::SourcesFileParse)?;

    validate_sources(&sources)?;

    Ok(sources)
}

fn require_non_empty(section: &str, field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "{section}.{field} must be non-empty"
        )));
    }
    Ok(())
}

fn validate_sources(sources: &SourcesFile) -> Result<(), ConfigError> {
    if sources.is_empty() {
        return Err(ConfigError::Validation(
            "at least one platform section is required".to_string(),
        ));
    }

    if let Some(fb) = &sources.facebook {
        require_non_empty("facebook", "page", &fb.page)?;
    }
    if let Some(tw) = &sources.twitter {
        require_non_empty("twitter", "handle", &tw.handle)?;
        require_non_empty("twitter", "user_id", &tw.user_id)?;
    }
    if let Some(ig) = &sources.instagram {
        require_non_empty("instagram", "user_id", &ig.user_id)?;
    }
    if let Some(li) = &sources.linkedin {
        require_non_empty("linkedin", "company_id", &li.company_id)?;
    }
    if let Some(wb) = &sources.weibo {
        require_non_empty("weibo", "uid", &wb.uid)?;
        require_non_empty("weibo", "container_id", &wb.container_id)?;
        if wb.max_pages == 0 {
            return Err(ConfigError::Validation(
                "weibo.max_pages must be at least 1".to_string(),
            ));
        }
    }

    Ok(())
}
