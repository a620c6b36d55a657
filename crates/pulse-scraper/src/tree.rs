//! Depth-limited walk over reply trees.
//!
//! A comment feed is a list of top-level comments, each of which may carry
//! its own paginated feed of replies. [`TreeWalker`] keeps an explicit stack
//! of frames instead of recursing, so the depth limit is a plain parameter.
//! Items come out in API order, each followed by its replies (walked to
//! exhaustion) before the next sibling.

use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::Value;

use crate::client::JsonSource;
use crate::error::ScraperError;
use crate::pagination::{CursorStyle, PageCursor, Paginator, RequestTemplate};

/// How to find the children of a node.
pub trait ReplyFeed {
    /// Identifier used as `parent_id` on the node's replies.
    fn node_id(&self, item: &Value) -> Option<String>;

    /// Number of replies the API reports for the node.
    fn reply_count(&self, item: &Value) -> u64;

    /// Request for the first page of the node's replies.
    fn replies(&self, node_id: &str) -> RequestTemplate;
}

/// The request a page was fetched with. Shared by every node on that page.
#[derive(Debug, Clone)]
pub struct PageOrigin {
    /// Sequence number of the page within the walk, starting at 1.
    pub seq: usize,
    pub template: RequestTemplate,
    pub style: CursorStyle,
    pub cursor: Option<PageCursor>,
}

impl PageOrigin {
    /// The page's request with `key` overridden, e.g. to ask for different fields.
    #[must_use]
    pub fn url_with(&self, key: &str, value: &str) -> String {
        self.template
            .clone()
            .param(key, value)
            .url(self.style, self.cursor.as_ref())
    }
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub item: Value,
    /// Immediate parent's id; `None` at depth 0.
    pub parent_id: Option<String>,
    pub depth: u8,
    pub origin: Arc<PageOrigin>,
}

struct Frame<'a, S> {
    parent_id: Option<String>,
    depth: u8,
    pager: Paginator<'a, S>,
    pending: VecDeque<(Value, Arc<PageOrigin>)>,
}

pub struct TreeWalker<'a, S, F> {
    feed: F,
    max_depth: u8,
    max_pages: Option<usize>,
    items_pointer: &'static str,
    style: CursorStyle,
    stack: Vec<Frame<'a, S>>,
    pages_seen: usize,
}

impl<'a, S: JsonSource, F: ReplyFeed> TreeWalker<'a, S, F> {
    /// Walk `root` and, down to `max_depth`, the replies of every node.
    ///
    /// Replies are requested with the root's cursor style and items pointer.
    #[must_use]
    pub fn new(root: Paginator<'a, S>, feed: F, max_depth: u8) -> Self {
        let items_pointer = root.items_pointer();
        let style = root.style();
        Self {
            feed,
            max_depth,
            max_pages: None,
            items_pointer,
            style,
            stack: vec![Frame {
                parent_id: None,
                depth: 0,
                pager: root,
                pending: VecDeque::new(),
            }],
            pages_seen: 0,
        }
    }

    /// Page cap applied to every reply feed.
    #[must_use]
    pub fn with_page_cap(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Next node in walk order, or `None` when every feed is exhausted.
    ///
    /// # Errors
    ///
    /// Propagates page fetch errors.
    pub async fn next_node(&mut self) -> Result<Option<TreeNode>, ScraperError> {
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };

            if let Some((item, origin)) = frame.pending.pop_front() {
                let depth = frame.depth;
                let parent_id = frame.parent_id.clone();
                let source = frame.pager.source();

                if depth < self.max_depth && self.feed.reply_count(&item) > 0 {
                    if let Some(id) = self.feed.node_id(&item) {
                        let pager = Paginator::new(
                            source,
                            self.feed.replies(&id),
                            self.style,
                            self.items_pointer,
                        )
                        .with_page_cap(self.max_pages);
                        self.stack.push(Frame {
                            parent_id: Some(id),
                            depth: depth + 1,
                            pager,
                            pending: VecDeque::new(),
                        });
                    }
                }

                return Ok(Some(TreeNode {
                    item,
                    parent_id,
                    depth,
                    origin,
                }));
            }

            if frame.pager.has_next() {
                let page = frame.pager.advance().await?;
                self.pages_seen += 1;
                let origin = Arc::new(PageOrigin {
                    seq: self.pages_seen,
                    template: frame.pager.template().clone(),
                    style: frame.pager.style(),
                    cursor: page.cursor_used,
                });
                frame
                    .pending
                    .extend(page.items.into_iter().map(|item| (item, Arc::clone(&origin))));
                continue;
            }

            self.stack.pop();
        }
    }

    /// Drain the whole walk.
    ///
    /// # Errors
    ///
    /// Propagates page fetch errors.
    pub async fn collect_all(mut self) -> Result<Vec<TreeNode>, ScraperError> {
        let mut nodes = Vec::new();
        while let Some(node) = self.next_node().await? {
            nodes.push(node);
        }
        Ok(nodes)
    }
}
