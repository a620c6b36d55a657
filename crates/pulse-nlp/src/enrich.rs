//! Sentiment and keyword enrichment of harvested post and comment files.
//!
//! Every input row is repeated once per extracted keyword with four columns
//! appended; a text without keywords still yields one row with an empty
//! keyword and a weight of 0. The output lands beside the input as
//! `<stem>_nlp.csv` and is rewritten on every run.

use std::path::{Path, PathBuf};

use pulse_core::{
    nlp_sibling, parse_file_name, BatchWriter, Channel, RecordKind, DEFAULT_BATCH_SIZE,
    ENRICHMENT_FIELDS,
};

use crate::analyzer::{Keyword, Sentiment, TextAnalyzer};
use crate::error::NlpError;
use crate::limiter::RateLimiter;

pub const DEFAULT_TOP_K: usize = 3;

/// Column holding the text to analyse in a harvested file.
#[must_use]
pub fn text_column(channel: Channel, kind: RecordKind) -> Option<&'static str> {
    match (channel, kind) {
        (_, RecordKind::Profile) => None,
        (Channel::Twitter | Channel::Weibo, RecordKind::Post) => Some("text"),
        (_, RecordKind::Post) => Some("status_message"),
        (_, RecordKind::Comment) => Some("comment_message"),
    }
}

/// A harvested file eligible for enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichTarget {
    pub path: PathBuf,
    pub channel: Channel,
    pub kind: RecordKind,
}

/// Post and comment files under `<company_dir>/<Platform>/`, sorted by path.
///
/// Already enriched files and profiles are left out. Missing platform
/// directories are skipped.
///
/// # Errors
///
/// Returns [`NlpError::ListDir`] if an existing directory cannot be read.
pub fn discover(company_dir: &Path) -> Result<Vec<EnrichTarget>, NlpError> {
    let mut targets = Vec::new();
    for channel in Channel::ALL {
        let dir = company_dir.join(channel.dir_name());
        if !dir.is_dir() {
            continue;
        }
        let entries = std::fs::read_dir(&dir).map_err(|e| list_error(&dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| list_error(&dir, e))?.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if file_name.ends_with("_nlp.csv") {
                continue;
            }
            match parse_file_name(file_name) {
                Some((found, kind)) if found == channel && kind != RecordKind::Profile => {
                    targets.push(EnrichTarget {
                        path,
                        channel,
                        kind,
                    });
                }
                _ => {}
            }
        }
    }
    targets.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(targets)
}

fn list_error(path: &Path, source: std::io::Error) -> NlpError {
    NlpError::ListDir {
        path: path.display().to_string(),
        source,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichSummary {
    pub files: usize,
    pub input_rows: usize,
    pub output_rows: usize,
}

pub struct Enricher<'a, A> {
    analyzer: &'a A,
    limiter: RateLimiter,
    top_k: usize,
    batch_size: usize,
}

impl<'a, A: TextAnalyzer> Enricher<'a, A> {
    #[must_use]
    pub fn new(analyzer: &'a A, limiter: RateLimiter) -> Self {
        Self {
            analyzer,
            limiter,
            top_k: DEFAULT_TOP_K,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Enrich every post and comment file of one company.
    ///
    /// # Errors
    ///
    /// Stops at the first failing file. [`NlpError::PoolExhausted`] is fatal
    /// and aborts the run.
    pub async fn enrich_company(&mut self, company_dir: &Path) -> Result<EnrichSummary, NlpError> {
        let mut total = EnrichSummary::default();
        for target in discover(company_dir)? {
            let file = self.enrich_file(&target).await?;
            total.files += 1;
            total.input_rows += file.input_rows;
            total.output_rows += file.output_rows;
        }
        tracing::info!(
            dir = %company_dir.display(),
            files = total.files,
            rows = total.output_rows,
            "enrichment complete"
        );
        Ok(total)
    }

    /// Enrich one harvested file into its `_nlp` sibling.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError`] on read, analysis or write failure.
    pub async fn enrich_file(&mut self, target: &EnrichTarget) -> Result<EnrichSummary, NlpError> {
        let path = target.path.as_path();
        let read_error = |source| NlpError::Read {
            path: path.display().to_string(),
            source,
        };
        let column = text_column(target.channel, target.kind).unwrap_or("text");

        let mut reader = csv::Reader::from_path(path).map_err(read_error)?;
        let headers = reader.headers().map_err(read_error)?.clone();
        let Some(text_at) = headers.iter().position(|h| h == column) else {
            return Err(NlpError::MissingTextColumn {
                path: path.display().to_string(),
                column: column.to_owned(),
            });
        };

        let header: Vec<&str> = headers.iter().chain(ENRICHMENT_FIELDS).collect();
        let output = nlp_sibling(path);
        let mut writer = BatchWriter::create_path(&output, &header, self.batch_size)?;
        tracing::info!(
            input = %path.display(),
            output = %output.display(),
            channel = %target.channel,
            "running sentiment analysis and keyword extraction"
        );

        let mut summary = EnrichSummary {
            files: 1,
            ..EnrichSummary::default()
        };
        for record in reader.records() {
            let record = record.map_err(read_error)?;
            let text = record.get(text_at).unwrap_or_default();
            let (sentiment, keywords) = self.analyse(text).await?;
            for row in expand(&record, sentiment, &keywords) {
                writer.append(row)?;
                summary.output_rows += 1;
            }
            summary.input_rows += 1;
        }
        writer.finish()?;
        Ok(summary)
    }

    async fn analyse(&mut self, text: &str) -> Result<(Sentiment, Vec<Keyword>), NlpError> {
        let analyzer = self.analyzer;
        let top_k = self.top_k;
        self.limiter
            .call(|token| async move {
                let sentiment = analyzer.sentiment(&token, text).await?;
                let keywords = analyzer.keywords(&token, text, top_k).await?;
                Ok((sentiment, keywords))
            })
            .await
    }
}

/// Output rows for one input record: one per keyword, at least one.
fn expand(record: &csv::StringRecord, sentiment: Sentiment, keywords: &[Keyword]) -> Vec<Vec<String>> {
    let base: Vec<String> = record.iter().map(str::to_owned).collect();
    let with = |word: &str, weight: String| {
        let mut row = base.clone();
        row.extend([
            sentiment.positive.to_string(),
            sentiment.negative.to_string(),
            word.to_owned(),
            weight,
        ]);
        row
    };
    if keywords.is_empty() {
        return vec![with("", "0".to_owned())];
    }
    keywords
        .iter()
        .map(|k| with(&k.word, k.weight.to_string()))
        .collect()
}
