//! Declarative source-to-canonical column maps.
//!
//! A [`ColumnMap`] lists, in canonical order, where each canonical field comes
//! from. Binding it to a source header resolves every column name to an index
//! up front, so a renamed or missing source column fails before any row is
//! read.

use serde_json::Value;

use pulse_core::{CanonicalRow, Cell, Channel, RecordKind};

use crate::error::NormalizeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Copy the named source column.
    Column(&'static str),
    /// The same text on every row.
    Constant(&'static str),
    /// The platform's display name.
    Channel,
    /// The shop/company the harvest ran for.
    Shop,
    /// First `urls[].expanded_url` of a JSON entities column.
    FirstExpandedUrl(&'static str),
    Absent,
}

#[derive(Debug, Clone)]
pub struct ColumnMap {
    channel: Channel,
    kind: RecordKind,
    rules: Vec<Rule>,
}

#[derive(Debug, Clone)]
enum Op {
    Copy(usize),
    Text(String),
    FirstExpandedUrl(usize),
    Absent,
}

/// A [`ColumnMap`] resolved against one source header.
#[derive(Debug, Clone)]
pub struct BoundMap {
    ops: Vec<Op>,
}

impl ColumnMap {
    /// Build a map from `(canonical field, rule)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::MapShape`] unless the fields are exactly the
    /// canonical header of `kind`, in order.
    pub fn new(
        channel: Channel,
        kind: RecordKind,
        rules: &[(&str, Rule)],
    ) -> Result<Self, NormalizeError> {
        let expected = kind.canonical_fields();
        let shape_error = |reason: String| NormalizeError::MapShape {
            channel,
            kind,
            reason,
        };
        if rules.len() != expected.len() {
            return Err(shape_error(format!(
                "{} rules for {} canonical fields",
                rules.len(),
                expected.len()
            )));
        }
        if let Some(((field, _), want)) = rules
            .iter()
            .zip(expected)
            .find(|((field, _), want)| field != *want)
        {
            return Err(shape_error(format!("expected field {want}, found {field}")));
        }
        Ok(Self {
            channel,
            kind,
            rules: rules.iter().map(|(_, rule)| *rule).collect(),
        })
    }

    #[must_use]
    pub fn channel(&self) -> Channel {
        self.channel
    }

    #[must_use]
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Resolve every source column against `header`.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::MissingSourceColumn`] for the first column
    /// the header lacks.
    pub fn bind(&self, header: &[String], shop: &str) -> Result<BoundMap, NormalizeError> {
        let index_of = |column: &str| {
            header
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| NormalizeError::MissingSourceColumn {
                    channel: self.channel,
                    kind: self.kind,
                    column: column.to_owned(),
                })
        };

        let ops = self
            .rules
            .iter()
            .map(|rule| -> Result<Op, NormalizeError> {
                Ok(match *rule {
                    Rule::Column(c) => Op::Copy(index_of(c)?),
                    Rule::FirstExpandedUrl(c) => Op::FirstExpandedUrl(index_of(c)?),
                    Rule::Constant(text) => Op::Text(text.to_owned()),
                    Rule::Channel => Op::Text(self.channel.dir_name().to_owned()),
                    Rule::Shop => Op::Text(shop.to_owned()),
                    Rule::Absent => Op::Absent,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BoundMap { ops })
    }
}

impl BoundMap {
    /// Canonical width of the rows this map produces.
    #[must_use]
    pub fn width(&self) -> usize {
        self.ops.len()
    }

    /// Map one source row. Empty or missing source cells become absent.
    #[must_use]
    pub fn apply(&self, row: &[&str]) -> CanonicalRow {
        let source = |i: usize| row.get(i).copied().filter(|v| !v.is_empty());
        CanonicalRow::from_cells(
            self.ops
                .iter()
                .map(|op| match op {
                    Op::Copy(i) => Cell::from(source(*i)),
                    Op::Text(text) => Cell::from(text.as_str()),
                    Op::FirstExpandedUrl(i) => Cell::from(source(*i).and_then(first_expanded_url)),
                    Op::Absent => Cell::Absent,
                })
                .collect(),
        )
    }
}

/// `urls[0].expanded_url` of a tweet's entities JSON.
#[must_use]
pub fn first_expanded_url(entities: &str) -> Option<String> {
    let value: Value = serde_json::from_str(entities).ok()?;
    value
        .pointer("/urls/0/expanded_url")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use pulse_core::POST_FIELDS;

    use super::*;

    fn header(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| (*c).to_owned()).collect()
    }

    fn tweet_map() -> ColumnMap {
        let rules: Vec<(&str, Rule)> = POST_FIELDS
            .iter()
            .map(|f| {
                let rule = match *f {
                    "channel" => Rule::Channel,
                    "shop" => Rule::Shop,
                    "status_id" => Rule::Column("id"),
                    "status_link" => Rule::FirstExpandedUrl("entities"),
                    "reaction_type" => Rule::Constant("likes"),
                    _ => Rule::Absent,
                };
                (*f, rule)
            })
            .collect();
        ColumnMap::new(Channel::Twitter, RecordKind::Post, &rules).unwrap()
    }

    #[test]
    fn bound_map_relocates_and_defaults() {
        let bound = tweet_map()
            .bind(&header(&["id", "entities"]), "acme")
            .unwrap();
        let row = bound.apply(&[
            "t1",
            r#"{"urls":[{"expanded_url":"https://acme.test/a"},{"expanded_url":"https://acme.test/b"}]}"#,
        ]);

        assert_eq!(row.len(), POST_FIELDS.len());
        assert_eq!(row.cells()[0].as_str(), "Twitter");
        assert_eq!(row.cells()[1].as_str(), "acme");
        assert_eq!(row.cells()[2].as_str(), "t1");
        assert_eq!(row.cells()[6].as_str(), "https://acme.test/a");
        assert_eq!(row.cells()[11].as_str(), "likes");
        assert!(row.cells()[3].is_absent());
    }

    #[test]
    fn mapping_twice_is_identical() {
        let bound = tweet_map().bind(&header(&["entities", "id"]), "acme").unwrap();
        let raw = ["{}", "t9"];
        assert_eq!(bound.apply(&raw), bound.apply(&raw));
        assert!(bound.apply(&raw).cells()[6].is_absent());
    }

    #[test]
    fn renamed_source_column_fails_at_bind() {
        let err = tweet_map()
            .bind(&header(&["tweet_id", "entities"]), "acme")
            .unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::MissingSourceColumn { channel: Channel::Twitter, column, .. } if column == "id"
        ));
    }

    #[test]
    fn map_must_follow_canonical_order() {
        let rules = [("shop", Rule::Shop), ("channel", Rule::Channel)];
        assert!(matches!(
            ColumnMap::new(Channel::Weibo, RecordKind::Post, &rules),
            Err(NormalizeError::MapShape { .. })
        ));
    }

    #[test]
    fn expanded_url_needs_valid_json() {
        assert_eq!(first_expanded_url("not json"), None);
        assert_eq!(first_expanded_url(r#"{"urls":[]}"#), None);
    }

    #[test]
    fn short_row_yields_absent_cells() {
        let bound = tweet_map().bind(&header(&["id", "entities"]), "acme").unwrap();
        let row = bound.apply(&["t1"]);
        assert_eq!(row.len(), bound.width());
        assert!(row.cells()[6].is_absent());
    }
}
