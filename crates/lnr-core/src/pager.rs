//! Cursor pagination over GraphQL connections.
//!
//! The document must accept `$first: Int` and `$after: String` and expose a
//! connection shaped `{ nodes: [...], pageInfo { hasNextPage endCursor } }`
//! at the configured dotted path (e.g. `team.issues`).
//!
//! A `null` anywhere along the path is an empty, final page (or `NotFound`
//! when the pager was told what a null parent means). A key missing from the
//! response is an error naming the path.
//!
//! Cursors are opaque: they are only ever echoed back to the server.
//! Completeness holds only while the dataset is not mutated mid-traversal;
//! concurrent inserts or deletes can shift items across page boundaries so
//! that they are skipped or seen twice.

use crate::error::{LnrError, Result};
use crate::profile::DEFAULT_PAGE_SIZE;
use crate::transport::Transport;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Upper bound on pages per traversal.
pub const DEFAULT_MAX_PAGES: usize = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T> Page<T> {
    fn empty() -> Self {
        Page {
            items: Vec::new(),
            next_cursor: None,
            has_more: false,
        }
    }
}

pub struct Pager<'a> {
    transport: &'a dyn Transport,
    document: String,
    connection: Vec<String>,
    variables: Map<String, Value>,
    page_size: u32,
    limit: Option<usize>,
    max_pages: usize,
    null_parent: Option<String>,
}

impl<'a> Pager<'a> {
    pub fn new(transport: &'a dyn Transport, document: impl Into<String>, connection: &str) -> Self {
        Pager {
            transport,
            document: document.into(),
            connection: connection
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            variables: Map::new(),
            page_size: DEFAULT_PAGE_SIZE,
            limit: None,
            max_pages: DEFAULT_MAX_PAGES,
            null_parent: None,
        }
    }

    /// Extra variables sent with every page. Non-object values are ignored.
    pub fn variables(mut self, variables: Value) -> Self {
        if let Value::Object(map) = variables {
            self.variables = map;
        }
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Stop once this many items were yielded.
    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Report `NotFound(what)` instead of an empty page when an object above
    /// the connection comes back null, e.g. `issue` in `issue.comments`.
    pub fn not_found_if_null(mut self, what: impl Into<String>) -> Self {
        self.null_parent = Some(what.into());
        self
    }

    /// One page starting after `cursor` (or from the start).
    pub fn fetch_page<T: DeserializeOwned>(&self, cursor: Option<&str>) -> Result<Page<T>> {
        self.request(cursor, self.page_size)
    }

    /// Every item, fetched lazily page by page. Each call starts over.
    pub fn fetch_all<T: DeserializeOwned>(&self) -> PageIter<'_, 'a, T> {
        PageIter {
            pager: self,
            buffer: Vec::new().into_iter(),
            cursor: None,
            seen: HashSet::new(),
            pages: 0,
            yielded: 0,
            state: State::More,
        }
    }

    fn request<T: DeserializeOwned>(&self, cursor: Option<&str>, first: u32) -> Result<Page<T>> {
        let mut variables = self.variables.clone();
        variables.insert("first".to_string(), Value::from(first));
        variables.insert(
            "after".to_string(),
            cursor.map_or(Value::Null, |c| Value::String(c.to_string())),
        );
        let data = self.transport.query(&self.document, Value::Object(variables))?;
        self.parse_page(&data)
    }

    fn parse_page<T: DeserializeOwned>(&self, data: &Value) -> Result<Page<T>> {
        let mut node = data;
        for (depth, segment) in self.connection.iter().enumerate() {
            if node.is_null() {
                return self.null_page(depth);
            }
            node = match node.get(segment) {
                Some(v) => v,
                None => {
                    return Err(LnrError::Validation(format!(
                        "connection '{}' not found in response: no field '{segment}'",
                        self.connection.join(".")
                    )))
                }
            };
        }
        if node.is_null() {
            return self.null_page(self.connection.len());
        }

        let items = match node.get("nodes") {
            Some(Value::Array(nodes)) => nodes
                .iter()
                .map(|n| serde_json::from_value(n.clone()))
                .collect::<std::result::Result<Vec<T>, _>>()?,
            _ => Vec::new(),
        };
        let page_info = node.get("pageInfo");
        let has_more = page_info
            .and_then(|p| p.get("hasNextPage"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let next_cursor = page_info
            .and_then(|p| p.get("endCursor"))
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(Page {
            items,
            next_cursor,
            has_more,
        })
    }

    /// `depth` is how many path segments were resolved before the null.
    fn null_page<T>(&self, depth: usize) -> Result<Page<T>> {
        match &self.null_parent {
            Some(what) if depth > 0 && depth < self.connection.len() => {
                Err(LnrError::NotFound(what.clone()))
            }
            _ => Ok(Page::empty()),
        }
    }
}

enum State {
    More,
    /// Yield this error once the current page's items are drained.
    Failing(LnrError),
    Done,
}

pub struct PageIter<'p, 'a, T> {
    pager: &'p Pager<'a>,
    buffer: std::vec::IntoIter<T>,
    cursor: Option<String>,
    seen: HashSet<String>,
    pages: usize,
    yielded: usize,
    state: State,
}

impl<T> PageIter<'_, '_, T> {
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    fn remaining(&self) -> Option<usize> {
        self.pager.limit.map(|l| l.saturating_sub(self.yielded))
    }
}

impl<T: DeserializeOwned> Iterator for PageIter<'_, '_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.remaining() == Some(0) {
                self.state = State::Done;
                return None;
            }
            if let Some(item) = self.buffer.next() {
                self.yielded += 1;
                return Some(Ok(item));
            }

            match std::mem::replace(&mut self.state, State::Done) {
                State::Done => return None,
                State::Failing(err) => return Some(Err(err)),
                State::More => {}
            }

            if self.pages >= self.pager.max_pages {
                return Some(Err(LnrError::TooManyPages(self.pages)));
            }

            let first = match self.remaining() {
                Some(r) => self.pager.page_size.min(u32::try_from(r).unwrap_or(u32::MAX)),
                None => self.pager.page_size,
            };
            let page: Page<T> = match self.pager.request(self.cursor.as_deref(), first) {
                Ok(page) => page,
                Err(e) => return Some(Err(e)),
            };
            self.pages += 1;
            tracing::debug!(
                page = self.pages,
                items = page.items.len(),
                has_more = page.has_more,
                "fetched page"
            );
            self.buffer = page.items.into_iter();

            if page.has_more {
                self.state = match page.next_cursor {
                    None => State::Failing(LnrError::MissingCursor),
                    Some(c) if !self.seen.insert(c.clone()) => {
                        State::Failing(LnrError::RepeatedCursor(c))
                    }
                    Some(c) => {
                        self.cursor = Some(c);
                        State::More
                    }
                };
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
