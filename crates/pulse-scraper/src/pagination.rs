//! Cursor-driven pagination over JSON feeds.
//!
//! Every platform wraps its items in an envelope that says where the next
//! page starts. [`CursorStyle`] knows how to read that envelope and how to put
//! the cursor back into the next request; [`Paginator`] drives the loop.
//!
//! ## Envelope shapes
//!
//! ```text
//! Graph API   {"data": [...], "paging": {"cursors": {"after": "X"}, "next": "..."}}
//! Insights    {"data": [...], "paging": {"previous": "...&until=T"}}  (walks back in time)
//! Twitter v2  {"data": [...], "meta": {"next_token": "X"}}
//! Weibo       {"data": {"cards": [...]}}                  (page number cursor)
//! LinkedIn    {"values": [...], "_start": 0, "_count": 10, "_total": 42}
//! ```

use serde_json::Value;

use crate::client::JsonSource;
use crate::error::ScraperError;

/// Opaque continuation token. Holding one means another page exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor(String);

impl PageCursor {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStyle {
    /// `paging.cursors.after`. Comment feeds also require `paging.next`.
    GraphAfter { require_next_link: bool },
    /// `until` of the `paging.previous` link: each page is the time window
    /// before the last one.
    GraphPrevious,
    /// `meta.next_token`.
    NextToken,
    /// 1-based page number, at most `max_pages` pages.
    PageNumber { max_pages: usize },
    /// `_start` + `_count` against `_total`.
    Offset,
}

impl CursorStyle {
    /// Query parameter carrying the cursor on follow-up requests.
    #[must_use]
    pub fn cursor_param(self) -> &'static str {
        match self {
            CursorStyle::GraphAfter { .. } => "after",
            CursorStyle::GraphPrevious => "until",
            CursorStyle::NextToken => "pagination_token",
            CursorStyle::PageNumber { .. } => "page",
            CursorStyle::Offset => "start",
        }
    }

    /// Cursor for the page after `envelope`, or `None` when the feed is done.
    #[must_use]
    pub fn next_cursor(
        self,
        envelope: &Value,
        item_count: usize,
        cursor_used: Option<&PageCursor>,
    ) -> Option<PageCursor> {
        if item_count == 0 {
            return None;
        }
        match self {
            CursorStyle::GraphAfter { require_next_link } => {
                let paging = envelope.get("paging")?;
                if require_next_link && paging.get("next").is_none_or(Value::is_null) {
                    return None;
                }
                paging
                    .pointer("/cursors/after")
                    .and_then(Value::as_str)
                    .map(PageCursor::new)
            }
            CursorStyle::GraphPrevious => {
                let link = envelope.pointer("/paging/previous").and_then(Value::as_str)?;
                let url = reqwest::Url::parse(link).ok()?;
                url.query_pairs()
                    .find(|(k, _)| k == "until")
                    .map(|(_, v)| PageCursor::new(v))
            }
            CursorStyle::NextToken => envelope
                .pointer("/meta/next_token")
                .and_then(Value::as_str)
                .map(PageCursor::new),
            CursorStyle::PageNumber { max_pages } => {
                let current = cursor_used
                    .and_then(|c| c.as_str().parse::<usize>().ok())
                    .unwrap_or(1);
                let next = current + 1;
                (next <= max_pages).then(|| PageCursor::new(next.to_string()))
            }
            CursorStyle::Offset => {
                let start = envelope.get("_start").and_then(Value::as_u64).unwrap_or(0);
                let count = envelope
                    .get("_count")
                    .and_then(Value::as_u64)
                    .unwrap_or(item_count as u64);
                let total = envelope.get("_total").and_then(Value::as_u64)?;
                let next = start + count;
                (next < total).then(|| PageCursor::new(next.to_string()))
            }
        }
    }
}

/// Endpoint plus fixed query parameters; the cursor is added per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTemplate {
    endpoint: String,
    params: Vec<(String, String)>,
}

impl RequestTemplate {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: Vec::new(),
        }
    }

    /// Set a query parameter, replacing an earlier value for the same key.
    #[must_use]
    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if let Some(slot) = self.params.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value;
        } else {
            self.params.push((key.to_owned(), value));
        }
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Full request URL, with `cursor` in the style's cursor parameter.
    #[must_use]
    pub fn url(&self, style: CursorStyle, cursor: Option<&PageCursor>) -> String {
        let cursor_pair = cursor.map(|c| (style.cursor_param(), c.as_str()));
        let pairs = self
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(cursor_pair);

        match reqwest::Url::parse(&self.endpoint) {
            Ok(mut url) => {
                {
                    let mut query = url.query_pairs_mut();
                    for (k, v) in pairs {
                        query.append_pair(k, v);
                    }
                }
                // an empty pair list still leaves a dangling `?`
                if url.query() == Some("") {
                    url.set_query(None);
                }
                url.to_string()
            }
            Err(_) => {
                let query: Vec<String> = pairs.map(|(k, v)| format!("{k}={v}")).collect();
                if query.is_empty() {
                    self.endpoint.clone()
                } else {
                    format!("{}?{}", self.endpoint, query.join("&"))
                }
            }
        }
    }
}

/// One fetched page.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Value>,
    /// Cursor the page was requested with (`None` for the first page).
    pub cursor_used: Option<PageCursor>,
    pub next: Option<PageCursor>,
}

/// Walks a feed page by page until its cursor runs out.
pub struct Paginator<'a, S> {
    source: &'a S,
    template: RequestTemplate,
    style: CursorStyle,
    items_pointer: &'static str,
    max_pages: Option<usize>,
    next: Option<PageCursor>,
    started: bool,
    pages: usize,
}

impl<'a, S: JsonSource> Paginator<'a, S> {
    #[must_use]
    pub fn new(
        source: &'a S,
        template: RequestTemplate,
        style: CursorStyle,
        items_pointer: &'static str,
    ) -> Self {
        Self {
            source,
            template,
            style,
            items_pointer,
            max_pages: None,
            next: None,
            started: false,
            pages: 0,
        }
    }

    /// Fail with [`ScraperError::PaginationLimit`] instead of fetching more
    /// than `max_pages` pages.
    #[must_use]
    pub fn with_page_cap(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        !self.started || self.next.is_some()
    }

    #[must_use]
    pub fn template(&self) -> &RequestTemplate {
        &self.template
    }

    #[must_use]
    pub fn style(&self) -> CursorStyle {
        self.style
    }

    #[must_use]
    pub fn items_pointer(&self) -> &'static str {
        self.items_pointer
    }

    #[must_use]
    pub fn source(&self) -> &'a S {
        self.source
    }

    /// Fetch the next page. Once the feed is exhausted this returns an empty
    /// page without touching the network.
    ///
    /// # Errors
    ///
    /// Propagates fetch errors and returns [`ScraperError::PaginationLimit`]
    /// when the page cap is exceeded.
    pub async fn advance(&mut self) -> Result<Page, ScraperError> {
        if !self.has_next() {
            return Ok(Page {
                items: Vec::new(),
                cursor_used: None,
                next: None,
            });
        }
        if let Some(max_pages) = self.max_pages {
            if self.pages >= max_pages {
                return Err(ScraperError::PaginationLimit {
                    feed: self.template.endpoint().to_owned(),
                    max_pages,
                });
            }
        }

        let cursor_used = self.next.take();
        let url = self.template.url(self.style, cursor_used.as_ref());
        let envelope = self.source.get_json(&url).await?;
        self.started = true;
        self.pages += 1;

        let items = envelope
            .pointer(self.items_pointer)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let next = self
            .style
            .next_cursor(&envelope, items.len(), cursor_used.as_ref());
        self.next.clone_from(&next);

        tracing::debug!(
            endpoint = self.template.endpoint(),
            page = self.pages,
            items = items.len(),
            has_next = next.is_some(),
            "fetched page"
        );

        Ok(Page {
            items,
            cursor_used,
            next,
        })
    }

    /// Drain the feed into one vector.
    ///
    /// # Errors
    ///
    /// See [`Paginator::advance`].
    pub async fn collect_all(mut self) -> Result<Vec<Value>, ScraperError> {
        let mut all = Vec::new();
        while self.has_next() {
            all.extend(self.advance().await?.items);
        }
        Ok(all)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use serde_json::Value;

    use crate::client::JsonSource;
    use crate::error::ScraperError;

    /// Canned responses keyed by full URL; records every request.
    #[derive(Default)]
    pub(crate) struct MockSource {
        pages: HashMap<String, Value>,
        pub(crate) requests: Mutex<Vec<String>>,
    }

    impl MockSource {
        pub(crate) fn with(mut self, url: &str, body: Value) -> Self {
            self.pages.insert(url.to_owned(), body);
            self
        }

        pub(crate) fn requested(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl JsonSource for MockSource {
        async fn get_json(&self, url: &str) -> Result<Value, ScraperError> {
            self.requests.lock().unwrap().push(url.to_owned());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ScraperError::UnexpectedStatus {
                    status: 404,
                    url: url.to_owned(),
                })
        }
    }
}
