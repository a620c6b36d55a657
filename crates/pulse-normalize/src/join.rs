//! Sweep enriched per-platform files into `posts.csv` and `comments.csv`.

use std::fs::File;
use std::path::{Path, PathBuf};

use pulse_core::{parse_file_name, BatchWriter, Cell, Channel, RecordKind, DEFAULT_BATCH_SIZE};

use crate::engine::Normalizer;
use crate::error::NormalizeError;

pub const POSTS_FILE: &str = "posts.csv";
pub const COMMENTS_FILE: &str = "comments.csv";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinSummary {
    pub files: usize,
    pub posts: usize,
    pub comments: usize,
    /// Enriched files of a kind the platform has no map for.
    pub skipped_files: usize,
}

/// An enriched file picked up by the sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinInput {
    pub path: PathBuf,
    pub channel: Channel,
    pub kind: RecordKind,
}

/// Enriched post and comment files under `<root>/<Platform>/`, sorted by path.
///
/// # Errors
///
/// Returns [`NormalizeError::ListDir`] if an existing platform directory
/// cannot be read.
pub fn enriched_inputs(root: &Path) -> Result<Vec<JoinInput>, NormalizeError> {
    let mut inputs = Vec::new();
    for channel in Channel::ALL {
        let dir = root.join(channel.dir_name());
        if !dir.is_dir() {
            continue;
        }
        let list_error = |source| NormalizeError::ListDir {
            path: dir.display().to_string(),
            source,
        };
        for entry in std::fs::read_dir(&dir).map_err(list_error)? {
            let path = entry.map_err(list_error)?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with("_nlp.csv") {
                continue;
            }
            match parse_file_name(name) {
                Some((found, kind)) if found == channel && kind != RecordKind::Profile => {
                    inputs.push(JoinInput {
                        path,
                        channel,
                        kind,
                    });
                }
                _ => {}
            }
        }
    }
    inputs.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(inputs)
}

/// Normalize every enriched file under `root` into the two canonical outputs.
///
/// Both outputs are truncated first, so re-running overwrites them.
///
/// # Errors
///
/// Fails on the first unreadable input, unbindable header or write error.
pub fn join_all(root: &Path, shop: &str, batch_size: usize) -> Result<JoinSummary, NormalizeError> {
    let inputs = enriched_inputs(root)?;
    let mut posts = BatchWriter::create_path(
        &root.join(POSTS_FILE),
        RecordKind::Post.canonical_fields(),
        batch_size,
    )?;
    let mut comments = BatchWriter::create_path(
        &root.join(COMMENTS_FILE),
        RecordKind::Comment.canonical_fields(),
        batch_size,
    )?;

    let mut summary = JoinSummary::default();
    for input in &inputs {
        let writer = match input.kind {
            RecordKind::Comment => &mut comments,
            _ => &mut posts,
        };
        let Some(rows) = join_file(input, shop, writer)? else {
            summary.skipped_files += 1;
            continue;
        };
        summary.files += 1;
        match input.kind {
            RecordKind::Comment => summary.comments += rows,
            _ => summary.posts += rows,
        }
    }

    posts.finish()?;
    comments.finish()?;
    tracing::info!(
        root = %root.display(),
        files = summary.files,
        posts = summary.posts,
        comments = summary.comments,
        skipped_files = summary.skipped_files,
        "joined canonical outputs"
    );
    Ok(summary)
}

/// [`join_all`] with the default batch size.
///
/// # Errors
///
/// See [`join_all`].
pub fn join(root: &Path, shop: &str) -> Result<JoinSummary, NormalizeError> {
    join_all(root, shop, DEFAULT_BATCH_SIZE)
}

/// Canonical rows written for one input, or `None` when the platform has no
/// map for the file's kind.
fn join_file(
    input: &JoinInput,
    shop: &str,
    writer: &mut BatchWriter<File>,
) -> Result<Option<usize>, NormalizeError> {
    let read_error = |source| NormalizeError::Read {
        path: input.path.display().to_string(),
        source,
    };
    let mut reader = csv::Reader::from_path(&input.path).map_err(read_error)?;
    let header: Vec<String> = reader
        .headers()
        .map_err(read_error)?
        .iter()
        .map(str::to_owned)
        .collect();

    let Some(normalizer) = Normalizer::bind(input.channel, input.kind, &header, shop)? else {
        tracing::warn!(
            path = %input.path.display(),
            channel = %input.channel,
            "no canonical mapping for file; skipping"
        );
        return Ok(None);
    };

    let mut written = 0;
    for record in reader.records() {
        let record = record.map_err(read_error)?;
        let raw: Vec<&str> = record.iter().collect();
        for row in normalizer.normalize(&raw) {
            writer.append(row.iter().map(Cell::as_str))?;
            written += 1;
        }
    }
    tracing::debug!(path = %input.path.display(), rows = written, "normalized file");
    Ok(Some(written))
}
