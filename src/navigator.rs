//! Paginated result navigator.
//!
//! Keeps the pages of the active search in the order they were first visited,
//! together with an integer cursor. Moving backward, or forward onto an
//! already-visited page, is served from the cache; only stepping past the
//! visited frontier issues a remote query. This keeps linear back-and-forth
//! browsing free of refetch storms while still fetching exactly once when new
//! ground is covered.

use crate::models::{ResultPage, SearchQuery};
use crate::store::{RecordStore, StoreError};

/// Errors surfaced by the navigator
#[derive(Debug, thiserror::Error)]
pub enum NavigatorError {
    /// A navigation call arrived before `start_search` (or after `stop`)
    #[error("no active search session")]
    NoActiveSession,

    /// `retreat` was called at the first visited page
    #[error("no previous page")]
    NoPreviousPage,

    /// The first page of a new search carried no records
    #[error("search returned no records")]
    EmptyResult,

    /// The server echoed a page index other than the one requested
    #[error("requested page {requested} but server reported page {reported}")]
    PageMismatch { requested: u32, reported: u32 },

    /// The underlying store call failed
    #[error("query failed: {0}")]
    Query(#[from] StoreError),
}

/// One active search: its query, visited pages, and cursor.
#[derive(Debug)]
struct SearchSession {
    query: SearchQuery,
    /// Pages in first-visit order; never holds duplicates
    pages: Vec<ResultPage>,
    /// Index into `pages`
    cursor: usize,
}

/// Navigator over a paginated result set, caching pages in visit order.
///
/// At most one session is active; starting a new search discards the previous
/// one. The navigator is driven synchronously by a single caller and needs no
/// internal locking.
#[derive(Debug)]
pub struct Navigator<S> {
    store: S,
    session: Option<SearchSession>,
}

impl<S: RecordStore> Navigator<S> {
    /// Create a navigator over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            session: None,
        }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether a session is currently active.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Start a new search: fetch page 1 and replace any previous session.
    ///
    /// On failure the previous session, if any, is left untouched.
    pub async fn start_search(
        &mut self,
        query: SearchQuery,
    ) -> Result<&ResultPage, NavigatorError> {
        let page = self.store.search(&query, 1).await?;

        if page.is_empty() {
            return Err(NavigatorError::EmptyResult);
        }
        if page.page_index != 1 {
            return Err(NavigatorError::PageMismatch {
                requested: 1,
                reported: page.page_index,
            });
        }

        tracing::debug!(keyword = %query.keyword, total = page.total_records, "search started");

        let session = self.session.insert(SearchSession {
            query,
            pages: vec![page],
            cursor: 0,
        });
        Ok(&session.pages[session.cursor])
    }

    /// Move forward one page.
    ///
    /// If a page after the cursor has already been visited it is returned from
    /// the cache with no network call. Otherwise `requested_page` is fetched
    /// remotely, appended in visit order, and the cursor moves onto it.
    pub async fn advance(&mut self, requested_page: u32) -> Result<&ResultPage, NavigatorError> {
        let session = self
            .session
            .as_mut()
            .ok_or(NavigatorError::NoActiveSession)?;

        if session.cursor + 1 < session.pages.len() {
            session.cursor += 1;
            return Ok(&session.pages[session.cursor]);
        }

        let page = self.store.search(&session.query, requested_page).await?;
        if page.page_index != requested_page {
            // Leave the cached pages and cursor as they were.
            return Err(NavigatorError::PageMismatch {
                requested: requested_page,
                reported: page.page_index,
            });
        }

        session.pages.push(page);
        session.cursor = session.pages.len() - 1;
        Ok(&session.pages[session.cursor])
    }

    /// Move back to the previously visited page. Cache-only, never remote.
    pub fn retreat(&mut self) -> Result<&ResultPage, NavigatorError> {
        let session = self
            .session
            .as_mut()
            .ok_or(NavigatorError::NoActiveSession)?;

        if session.cursor == 0 {
            return Err(NavigatorError::NoPreviousPage);
        }

        session.cursor -= 1;
        Ok(&session.pages[session.cursor])
    }

    /// The page at the cursor.
    pub fn current(&self) -> Result<&ResultPage, NavigatorError> {
        let session = self.session.as_ref().ok_or(NavigatorError::NoActiveSession)?;
        Ok(&session.pages[session.cursor])
    }

    /// Discard the session. Idempotent.
    pub fn stop(&mut self) {
        self.session = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mock::{make_page, MockStore};

    fn navigator_with_pages(pages: &[(u32, ResultPage)]) -> Navigator<MockStore> {
        let store = MockStore::new();
        for (requested, page) in pages {
            store.set_page(*requested, page.clone());
        }
        Navigator::new(store)
    }

    #[tokio::test]
    async fn test_start_search_fetches_page_one() {
        let mut nav = navigator_with_pages(&[(1, make_page(1, 3, &["a", "b"]))]);

        let page = nav.start_search(SearchQuery::new("test")).await.unwrap();
        assert_eq!(page.page_index, 1);
        assert_eq!(page.records.len(), 2);
        assert_eq!(nav.store().search_calls(), 1);
        assert!(nav.has_session());
    }

    #[tokio::test]
    async fn test_start_search_empty_page_fails() {
        let mut nav = navigator_with_pages(&[(1, make_page(1, 0, &[]))]);

        let err = nav.start_search(SearchQuery::new("test")).await.unwrap_err();
        assert!(matches!(err, NavigatorError::EmptyResult));
        assert!(!nav.has_session());
    }

    #[tokio::test]
    async fn test_start_search_remote_failure() {
        let store = MockStore::new();
        store.fail_searches("index unavailable");
        let mut nav = Navigator::new(store);

        let err = nav.start_search(SearchQuery::new("test")).await.unwrap_err();
        assert!(matches!(err, NavigatorError::Query(_)));
    }

    #[tokio::test]
    async fn test_advance_then_retreat_uses_cache() {
        let mut nav = navigator_with_pages(&[
            (1, make_page(1, 3, &["a"])),
            (2, make_page(2, 3, &["b"])),
        ]);

        nav.start_search(SearchQuery::new("test")).await.unwrap();
        let second = nav.advance(2).await.unwrap();
        assert_eq!(second.page_index, 2);
        // one fetch for page 1, one for page 2
        assert_eq!(nav.store().search_calls(), 2);

        let first = nav.retreat().unwrap();
        assert_eq!(first.page_index, 1);
        assert_eq!(first.records[0].fields.title, "a");
        // retreat never goes to the network
        assert_eq!(nav.store().search_calls(), 2);
    }

    #[tokio::test]
    async fn test_advance_onto_visited_page_is_cache_hit() {
        let mut nav = navigator_with_pages(&[
            (1, make_page(1, 3, &["a"])),
            (2, make_page(2, 3, &["b"])),
        ]);

        nav.start_search(SearchQuery::new("test")).await.unwrap();
        nav.advance(2).await.unwrap();
        nav.retreat().unwrap();

        // Forward again: page 2 is already in the visit cache.
        let page = nav.advance(2).await.unwrap();
        assert_eq!(page.page_index, 2);
        assert_eq!(nav.store().search_calls(), 2);
    }

    #[tokio::test]
    async fn test_advance_without_session() {
        let mut nav = Navigator::new(MockStore::new());
        let err = nav.advance(2).await.unwrap_err();
        assert!(matches!(err, NavigatorError::NoActiveSession));
        assert_eq!(nav.store().search_calls(), 0);
    }

    #[tokio::test]
    async fn test_advance_page_mismatch_preserves_state() {
        // Server answers the request for page 2 with page 7.
        let mut nav = navigator_with_pages(&[
            (1, make_page(1, 3, &["a"])),
            (2, make_page(7, 3, &["x"])),
        ]);

        nav.start_search(SearchQuery::new("test")).await.unwrap();
        let err = nav.advance(2).await.unwrap_err();
        assert!(matches!(
            err,
            NavigatorError::PageMismatch {
                requested: 2,
                reported: 7
            }
        ));

        // The cursor still sits on page 1 and the cache gained nothing.
        assert_eq!(nav.current().unwrap().page_index, 1);
        let err = nav.retreat().unwrap_err();
        assert!(matches!(err, NavigatorError::NoPreviousPage));
    }

    #[tokio::test]
    async fn test_retreat_at_first_page() {
        let mut nav = navigator_with_pages(&[(1, make_page(1, 3, &["a"]))]);

        nav.start_search(SearchQuery::new("test")).await.unwrap();
        let err = nav.retreat().unwrap_err();
        assert!(matches!(err, NavigatorError::NoPreviousPage));
        assert_eq!(nav.store().search_calls(), 1);
    }

    #[tokio::test]
    async fn test_current_without_session() {
        let nav = Navigator::new(MockStore::new());
        assert!(matches!(
            nav.current().unwrap_err(),
            NavigatorError::NoActiveSession
        ));
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let mut nav = navigator_with_pages(&[(1, make_page(1, 1, &["a"]))]);

        nav.start_search(SearchQuery::new("test")).await.unwrap();
        nav.stop();
        nav.stop();
        assert!(!nav.has_session());
        assert!(matches!(
            nav.current().unwrap_err(),
            NavigatorError::NoActiveSession
        ));
    }

    #[tokio::test]
    async fn test_new_search_replaces_session() {
        let mut nav = navigator_with_pages(&[
            (1, make_page(1, 3, &["a"])),
            (2, make_page(2, 3, &["b"])),
        ]);

        nav.start_search(SearchQuery::new("first")).await.unwrap();
        nav.advance(2).await.unwrap();

        nav.start_search(SearchQuery::new("second")).await.unwrap();
        assert_eq!(nav.current().unwrap().page_index, 1);
        // A fresh session has no history to retreat into.
        assert!(matches!(
            nav.retreat().unwrap_err(),
            NavigatorError::NoPreviousPage
        ));
    }
}
