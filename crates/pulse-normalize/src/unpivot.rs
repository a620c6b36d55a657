//! Wide-to-narrow reshaping of per-kind count columns.
//!
//! A row carrying one count column per reaction kind becomes one row per
//! kind. The shared columns are copied verbatim and the
//! `(reaction_type, reaction_count)` pair takes the place of the first count
//! column.

use pulse_core::{Channel, RecordKind};

use crate::error::NormalizeError;

pub const REACTION_TYPE: &str = "reaction_type";
pub const REACTION_COUNT: &str = "reaction_count";

/// Facebook count columns and the label each one gets in `reaction_type`.
pub const FACEBOOK_REACTIONS: [(&str, &str); 7] = [
    ("num_likes", "likes"),
    ("num_loves", "loves"),
    ("num_wows", "wows"),
    ("num_hahas", "hahas"),
    ("num_sads", "sads"),
    ("num_angrys", "angrys"),
    ("num_special", "special"),
];

/// Declared count columns, in output order.
#[derive(Debug, Clone, Copy)]
pub struct Unpivot {
    counts: &'static [(&'static str, &'static str)],
}

/// An [`Unpivot`] resolved against one source header.
#[derive(Debug, Clone)]
pub struct BoundUnpivot {
    /// `(source index, label)` per kind.
    counts: Vec<(usize, &'static str)>,
    /// Shared columns before the pair, then after it.
    before: Vec<usize>,
    after: Vec<usize>,
    header: Vec<String>,
}

impl Unpivot {
    #[must_use]
    pub const fn new(counts: &'static [(&'static str, &'static str)]) -> Self {
        Self { counts }
    }

    #[must_use]
    pub const fn facebook() -> Self {
        Self::new(&FACEBOOK_REACTIONS)
    }

    /// Resolve the count columns in `header`.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::MissingSourceColumn`] for the first declared
    /// count column the header lacks.
    pub fn bind(
        &self,
        channel: Channel,
        kind: RecordKind,
        header: &[String],
    ) -> Result<BoundUnpivot, NormalizeError> {
        let mut counts = Vec::with_capacity(self.counts.len());
        for (column, label) in self.counts {
            let Some(index) = header.iter().position(|h| h == column) else {
                return Err(NormalizeError::MissingSourceColumn {
                    channel,
                    kind,
                    column: (*column).to_owned(),
                });
            };
            counts.push((index, *label));
        }

        let first = counts.iter().map(|(i, _)| *i).min().unwrap_or(header.len());
        let shared = (0..header.len()).filter(|i| !counts.iter().any(|(c, _)| c == i));
        let (before, after): (Vec<usize>, Vec<usize>) = shared.partition(|i| *i < first);

        let header = before
            .iter()
            .map(|&i| header[i].clone())
            .chain([REACTION_TYPE.to_owned(), REACTION_COUNT.to_owned()])
            .chain(after.iter().map(|&i| header[i].clone()))
            .collect();

        Ok(BoundUnpivot {
            counts,
            before,
            after,
            header,
        })
    }
}

impl BoundUnpivot {
    /// Header of the narrow rows.
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// One narrow row per declared kind, in declared order.
    ///
    /// Cells missing from a short source row come out empty.
    #[must_use]
    pub fn apply(&self, row: &[&str]) -> Vec<Vec<String>> {
        let at = |i: usize| row.get(i).copied().unwrap_or_default().to_owned();
        self.counts
            .iter()
            .map(|&(index, label)| {
                self.before
                    .iter()
                    .map(|&i| at(i))
                    .chain([label.to_owned(), at(index)])
                    .chain(self.after.iter().map(|&i| at(i)))
                    .collect()
            })
            .collect()
    }
}
