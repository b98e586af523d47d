//! Cursor loop over a single index.

use tracing::debug;

use crate::client::SearchClient;
use crate::data_models::{SearchOutcome, SearchRequest, SearchResponse};
use crate::error::{DecodeError, Result, SearchError};

/// Walks pages of one request until the gateway stops handing out new
/// cursors or `max_pages` calls have been made.
///
/// The page cap matters: under load the gateway has been seen to return
/// empty pages that echo the same cursor forever.
pub struct Paginator<'a> {
    client: &'a SearchClient,
    next: Option<SearchRequest>,
    max_pages: usize,
    pages_fetched: usize,
}

impl<'a> Paginator<'a> {
    pub fn new(client: &'a SearchClient, first: SearchRequest, max_pages: usize) -> Result<Self> {
        if max_pages == 0 {
            return Err(SearchError::validation("max_pages must be at least 1"));
        }
        Ok(Paginator {
            client,
            next: Some(first),
            max_pages,
            pages_fetched: 0,
        })
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Fetches the next page, or `Ok(None)` once pagination is over.
    ///
    /// A failed call leaves the pending request in place, so calling again
    /// retries the same cursor.
    pub async fn next_page(&mut self) -> Result<Option<SearchResponse>> {
        if self.pages_fetched >= self.max_pages {
            return Ok(None);
        }
        let Some(request) = self.next.clone() else {
            return Ok(None);
        };

        let response = self
            .client
            .search(std::slice::from_ref(&request))
            .await?
            .into_iter()
            .next()
            .unwrap_or_else(|| Err(DecodeError::new(0, "gateway returned no result")))?;
        self.pages_fetched += 1;

        self.next = response.next_request(&request);
        debug!(
            page = self.pages_fetched,
            cursor = request.cursor(),
            next = ?response.pagination.cursor,
            has_more = response.has_more(),
            "fetched page"
        );
        Ok(Some(response))
    }

    /// Drains the paginator.
    pub async fn collect_all(mut self) -> Result<Vec<SearchResponse>> {
        let mut pages = Vec::new();
        while let Some(page) = self.next_page().await? {
            pages.push(page);
        }
        Ok(pages)
    }
}

/// Sends `requests` as one batch, then follows the first request's cursor
/// until `max_pages` pages of it have been fetched.
///
/// The other requests (suggestions, typically) ride along with the first
/// page only. Follow-up pages are placed right after the first outcome.
pub async fn search_pages(
    client: &SearchClient,
    requests: &[SearchRequest],
    max_pages: usize,
) -> Result<Vec<SearchOutcome>> {
    if max_pages == 0 {
        return Err(SearchError::validation("max_pages must be at least 1"));
    }
    let mut outcomes = client.search(requests).await?;

    let follow_up = match (requests.first(), outcomes.first()) {
        (Some(first), Some(Ok(page))) if max_pages > 1 => page.next_request(first),
        _ => None,
    };
    if let Some(next) = follow_up {
        let pages = Paginator::new(client, next, max_pages - 1)?
            .collect_all()
            .await?;
        let rest = outcomes.split_off(1);
        outcomes.extend(pages.into_iter().map(Ok));
        outcomes.extend(rest);
    }
    Ok(outcomes)
}
