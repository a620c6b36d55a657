pub mod client;
pub mod error;
pub mod pagination;
pub mod platforms;
pub mod reactions;
pub mod retry;
pub mod tree;

pub use client::{redact_url, HttpClient, JsonSource};
pub use error::ScraperError;
pub use pagination::{CursorStyle, Page, PageCursor, Paginator, RequestTemplate};
pub use platforms::{
    FacebookHarvester, HarvestSettings, HarvestSummary, InstagramHarvester, LinkedInHarvester,
    TwitterHarvester, WeiboHarvester,
};
pub use reactions::{ReactionKind, ReactionTable, ReactionVector, REACTION_COLUMNS};
pub use retry::RetryPolicy;
pub use tree::{ReplyFeed, TreeNode, TreeWalker};
