//! Canonical cross-platform record shapes.

/// Ordered header of the joined `posts.csv`.
pub const POST_FIELDS: [&str; 17] = [
    "channel",
    "shop",
    "status_id",
    "status_message",
    "link_name",
    "status_type",
    "status_link",
    "status_published",
    "num_total_reactions",
    "num_comments",
    "num_shares",
    "reaction_type",
    "reaction_count",
    "sentiment_pos",
    "sentiment_neg",
    "keyword",
    "keyword_weight",
];

/// Ordered header of the joined `comments.csv`.
pub const COMMENT_FIELDS: [&str; 15] = [
    "channel",
    "shop",
    "comment_id",
    "status_id",
    "parent_id",
    "comment_message",
    "comment_author",
    "comment_published",
    "num_total_reactions",
    "reaction_type",
    "reaction_count",
    "sentiment_pos",
    "sentiment_neg",
    "keyword",
    "keyword_weight",
];

/// Enrichment columns appended by the NLP phase, in order.
pub const ENRICHMENT_FIELDS: [&str; 4] =
    ["sentiment_pos", "sentiment_neg", "keyword", "keyword_weight"];

/// One canonical cell. `Absent` serializes as an empty field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cell {
    Value(String),
    Absent,
}

impl Cell {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Cell::Value(v) => v,
            Cell::Absent => "",
        }
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Value(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Value(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Absent, Into::into)
    }
}

impl AsRef<[u8]> for Cell {
    fn as_ref(&self) -> &[u8] {
        self.as_str().as_bytes()
    }
}

/// A fixed-width row whose width equals the canonical header it was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRow {
    cells: Vec<Cell>,
}

impl CanonicalRow {
    /// A row of `width` absent cells.
    #[must_use]
    pub fn absent(width: usize) -> Self {
        Self {
            cells: vec![Cell::Absent; width],
        }
    }

    #[must_use]
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn set(&mut self, index: usize, cell: Cell) {
        if let Some(slot) = self.cells.get_mut(index) {
            *slot = cell;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }
}

impl<'a> IntoIterator for &'a CanonicalRow {
    type Item = &'a Cell;
    type IntoIter = std::slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}
