//! Text enrichment for harvested files.
//!
//! Calls a rate-limited NLP backend through a rotating credential pool and
//! writes sentiment and keyword columns next to every harvested row.

pub mod analyzer;
pub mod enrich;
pub mod error;
pub mod limiter;
pub mod pool;

pub use analyzer::{BosonNlpClient, Keyword, Sentiment, TextAnalyzer};
pub use enrich::{discover, text_column, EnrichSummary, EnrichTarget, Enricher, DEFAULT_TOP_K};
pub use error::NlpError;
pub use limiter::RateLimiter;
pub use pool::TokenPool;
