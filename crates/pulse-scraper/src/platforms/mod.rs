//! Per-platform harvesters.
//!
//! Each harvester walks one platform's feeds and appends raw rows to
//! `<company>/<Platform>/<company>_<platform>_{profile,post|tweet,comment}.csv`.
//! Account-level reports (page insights, follower statistics) land next to
//! them as `<company>_<platform>_<report>.csv`.

pub mod facebook;
pub mod instagram;
pub mod linkedin;
pub mod twitter;
pub mod weibo;

use std::fs::File;
use std::path::PathBuf;

use serde_json::Value;

use pulse_core::{AppConfig, BatchWriter, Channel, RecordKind};

use crate::error::ScraperError;

pub use facebook::FacebookHarvester;
pub use instagram::InstagramHarvester;
pub use linkedin::LinkedInHarvester;
pub use twitter::TwitterHarvester;
pub use weibo::WeiboHarvester;

/// Output and paging settings shared by every harvester.
#[derive(Debug, Clone)]
pub struct HarvestSettings {
    /// Company directory holding one folder per platform.
    pub out_dir: PathBuf,
    /// Prefix of every output file name.
    pub name: String,
    pub tz_offset_hours: i32,
    pub batch_size: usize,
    pub page_size: u32,
    pub reply_depth: u8,
    pub max_pages: Option<usize>,
}

impl HarvestSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            out_dir: config.company_dir(),
            name: config.company.clone(),
            tz_offset_hours: config.tz_offset_hours,
            batch_size: config.batch_size,
            page_size: config.page_size,
            reply_depth: config.reply_depth,
            max_pages: config.max_pages,
        }
    }

    #[must_use]
    pub fn path(&self, channel: Channel, kind: RecordKind) -> PathBuf {
        self.out_dir
            .join(channel.dir_name())
            .join(channel.file_name(&self.name, kind))
    }

    /// Appending batch writer for one output file.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Write`] if the file cannot be opened.
    pub fn writer(
        &self,
        channel: Channel,
        kind: RecordKind,
        header: &[&str],
    ) -> Result<BatchWriter<File>, ScraperError> {
        let path = self.path(channel, kind);
        Ok(BatchWriter::append_to_path(&path, header, self.batch_size)?)
    }

    #[must_use]
    pub fn report_path(&self, channel: Channel, report: &str) -> PathBuf {
        self.out_dir
            .join(channel.dir_name())
            .join(channel.report_file_name(&self.name, report))
    }

    /// Appending batch writer for one account-level report.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Write`] if the file cannot be opened.
    pub fn report_writer(
        &self,
        channel: Channel,
        report: &str,
        header: &[&str],
    ) -> Result<BatchWriter<File>, ScraperError> {
        let path = self.report_path(channel, report);
        Ok(BatchWriter::append_to_path(&path, header, self.batch_size)?)
    }
}

/// Row counts of one platform harvest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestSummary {
    pub channel: Channel,
    pub profiles: usize,
    pub posts: usize,
    pub comments: usize,
    /// Rows written to account-level reports.
    pub reports: usize,
    /// Rows whose known reaction kinds exceeded the reported total.
    pub reaction_drift: usize,
    /// Items deliberately left out (retweets, cards without a post).
    pub skipped: usize,
}

impl HarvestSummary {
    #[must_use]
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            profiles: 0,
            posts: 0,
            comments: 0,
            reports: 0,
            reaction_drift: 0,
            skipped: 0,
        }
    }
}

/// Render the value at `pointer` as a CSV cell.
///
/// Strings are copied, numbers and booleans printed, anything missing or null
/// becomes empty. Objects and arrays are kept as compact JSON.
#[must_use]
pub(crate) fn cell(item: &Value, pointer: &str) -> String {
    match item.pointer(pointer) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Integer at `pointer`, or 0.
#[must_use]
pub(crate) fn count(item: &Value, pointer: &str) -> u64 {
    item.pointer(pointer).and_then(Value::as_u64).unwrap_or(0)
}

/// Size of a Graph API edge: `summary.total_count`, else the length of `data`.
#[must_use]
pub(crate) fn edge_count(item: &Value, edge: &str) -> u64 {
    let Some(edge) = item.get(edge) else {
        return 0;
    };
    edge.pointer("/summary/total_count")
        .and_then(Value::as_u64)
        .or_else(|| {
            edge.get("data")
                .and_then(Value::as_array)
                .map(|d| d.len() as u64)
        })
        .unwrap_or(0)
}
