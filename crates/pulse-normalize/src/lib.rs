//! Reduction of per-platform harvests into the canonical post and comment
//! datasets.

pub mod column_map;
pub mod engine;
pub mod error;
pub mod join;
pub mod unpivot;

pub use column_map::{first_expanded_url, BoundMap, ColumnMap, Rule};
pub use engine::{column_map, Normalizer};
pub use error::NormalizeError;
pub use join::{enriched_inputs, join, join_all, JoinInput, JoinSummary, COMMENTS_FILE, POSTS_FILE};
pub use unpivot::{BoundUnpivot, Unpivot, FACEBOOK_REACTIONS};
