//! Batched, append-only CSV writer.
//!
//! Rows accumulate in memory and are written in fixed-size batches so a crash
//! loses at most one partial batch. The header is written once, only when the
//! target file is new or empty.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use thiserror::Error;

pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("flush failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Totals reported by [`BatchWriter::finish`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub rows: usize,
    pub flushes: usize,
}

pub struct BatchWriter<W: Write> {
    writer: csv::Writer<W>,
    label: String,
    batch_size: usize,
    pending: Vec<StringRecord>,
    written: usize,
    flushes: usize,
}

impl BatchWriter<File> {
    /// Open `path` for appending, creating parent directories as needed.
    ///
    /// `header` is written only when the file did not exist or was empty.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] if the file cannot be opened or the header
    /// cannot be written.
    pub fn append_to_path(
        path: &Path,
        header: &[&str],
        batch_size: usize,
    ) -> Result<Self, BatchError> {
        let file = open(path, true)?;
        let empty = file
            .metadata()
            .map_err(|e| open_error(path, e))?
            .len()
            == 0;
        Self::start(file, path, header, empty, batch_size)
    }

    /// Truncate (or create) `path` and write `header`.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] if the file cannot be created or the header
    /// cannot be written.
    pub fn create_path(path: &Path, header: &[&str], batch_size: usize) -> Result<Self, BatchError> {
        let file = open(path, false)?;
        Self::start(file, path, header, true, batch_size)
    }

    fn start(
        file: File,
        path: &Path,
        header: &[&str],
        write_header: bool,
        batch_size: usize,
    ) -> Result<Self, BatchError> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if write_header {
            writer.write_record(header)?;
            writer.flush()?;
        }
        Ok(Self::with_writer(
            writer,
            path.display().to_string(),
            batch_size,
        ))
    }
}

impl<W: Write> BatchWriter<W> {
    fn with_writer(writer: csv::Writer<W>, label: String, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            writer,
            label,
            batch_size,
            pending: Vec::with_capacity(batch_size),
            written: 0,
            flushes: 0,
        }
    }

    /// Queue one row, flushing when the batch is full.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] if an implicit flush fails.
    pub fn append<I, T>(&mut self, row: I) -> Result<(), BatchError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let record: StringRecord = row.into_iter().collect();
        self.pending.push(record);
        if self.pending.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Rows already on disk.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    fn flush(&mut self) -> Result<(), BatchError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let first = self.written + 1;
        let last = self.written + self.pending.len();
        tracing::info!(file = %self.label, first, last, "writing items to file");
        for record in &self.pending {
            self.writer.write_record(record)?;
        }
        self.writer.flush()?;
        // rows leave the queue only once the whole batch is on disk
        self.pending.clear();
        self.written = last;
        self.flushes += 1;
        Ok(())
    }

    /// Flush the remainder and close out the writer.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] if the final flush fails.
    pub fn finish(mut self) -> Result<WriteSummary, BatchError> {
        self.flush()?;
        Ok(WriteSummary {
            rows: self.written,
            flushes: self.flushes,
        })
    }
}

fn open_error(path: &Path, source: std::io::Error) -> BatchError {
    BatchError::Open {
        path: path.display().to_string(),
        source,
    }
}

fn open(path: &Path, append: bool) -> Result<File, BatchError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| open_error(parent, e))?;
    }
    let mut options = OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    options.open(path).map_err(|e| open_error(path, e))
}

/// Path of the enriched sibling of a harvested file: `x.csv` → `x_nlp.csv`.
#[must_use]
pub fn nlp_sibling(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}_nlp.csv"))
}
