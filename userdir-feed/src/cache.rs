use std::collections::BTreeMap;

use crate::{FetchError, Page, UserRecord};

/// Lifecycle of a single page index within a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FetchState {
    #[default]
    NotRequested,
    InFlight,
    Resolved,
    Failed,
}

/// A page fetch issued by the cache.
///
/// Carries the session it was issued in so results that arrive after a reset can be told apart
/// from current ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page_index: usize,
    pub session: u64,
}

/// What [`PageCache::complete`] did with a fetch result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    Resolved { page_index: usize, len: usize },
    Failed { page_index: usize, error: FetchError },
    /// The result belongs to an earlier session (or was not expected) and was dropped.
    Stale,
}

/// Page-indexed cache that merges fetched pages into one logical list.
///
/// The cache is sans-IO: [`PageCache::request_page`] hands out a [`PageRequest`] for the caller
/// to execute, and the outcome comes back through [`PageCache::complete`]. Requests for an index
/// that is already in flight or resolved are deduplicated.
#[derive(Clone, Debug)]
pub struct PageCache {
    page_size: usize,
    session: u64,
    states: BTreeMap<usize, FetchState>,
    pages: BTreeMap<usize, Page>,
    failure: Option<(usize, FetchError)>,
}

impl PageCache {
    pub fn new(page_size: usize) -> Self {
        debug_assert!(page_size > 0, "page_size must be positive");
        Self {
            page_size: page_size.max(1),
            session: 0,
            states: BTreeMap::new(),
            pages: BTreeMap::new(),
            failure: None,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn fetch_state(&self, page_index: usize) -> FetchState {
        self.states.get(&page_index).copied().unwrap_or_default()
    }

    /// The page index currently being fetched, if any.
    pub fn in_flight(&self) -> Option<usize> {
        self.states
            .iter()
            .find(|(_, s)| **s == FetchState::InFlight)
            .map(|(i, _)| *i)
    }

    /// Marks `page_index` in flight and returns the request to execute.
    ///
    /// Returns `None` when the page is already in flight or resolved. A failed page may be
    /// requested again; doing so clears the retained failure.
    pub fn request_page(&mut self, page_index: usize) -> Option<PageRequest> {
        match self.fetch_state(page_index) {
            FetchState::InFlight | FetchState::Resolved => {
                ftrace!(page_index, session = self.session, "request deduplicated");
                None
            }
            FetchState::NotRequested | FetchState::Failed => {
                self.states.insert(page_index, FetchState::InFlight);
                if matches!(self.failure, Some((i, _)) if i == page_index) {
                    self.failure = None;
                }
                fdebug!(page_index, session = self.session, "page requested");
                Some(PageRequest {
                    page_index,
                    session: self.session,
                })
            }
        }
    }

    /// Applies the outcome of a request issued by [`PageCache::request_page`].
    pub fn complete(
        &mut self,
        request: PageRequest,
        result: Result<Page, FetchError>,
    ) -> Completion {
        if request.session != self.session {
            fdebug!(
                page_index = request.page_index,
                request_session = request.session,
                session = self.session,
                "discarding result from an earlier session"
            );
            return Completion::Stale;
        }
        let page_index = request.page_index;
        if self.fetch_state(page_index) != FetchState::InFlight {
            fwarn!(page_index, "discarding result for a page that is not in flight");
            return Completion::Stale;
        }

        match result {
            Ok(page) => {
                let len = page.len();
                self.pages.insert(page_index, page);
                self.states.insert(page_index, FetchState::Resolved);
                fdebug!(page_index, len, "page resolved");
                Completion::Resolved { page_index, len }
            }
            Err(error) => {
                self.states.insert(page_index, FetchState::Failed);
                self.failure = Some((page_index, error.clone()));
                fwarn!(page_index, error = %error, "page failed");
                Completion::Failed { page_index, error }
            }
        }
    }

    /// The most recent failure that has not been retried, with its page index.
    pub fn failure(&self) -> Option<(usize, &FetchError)> {
        self.failure.as_ref().map(|(i, e)| (*i, e))
    }

    /// Resolved pages from index 0 up to the first page that is not resolved.
    pub fn contiguous_pages(&self) -> impl Iterator<Item = &Page> + '_ {
        (0..).map_while(move |i| self.pages.get(&i))
    }

    /// Number of pages in the contiguous resolved prefix; also the next index to request.
    pub fn resolved_pages(&self) -> usize {
        self.contiguous_pages().count()
    }

    /// The logical list: users of the contiguous resolved pages, in page order.
    pub fn flattened_items(&self) -> impl Iterator<Item = &UserRecord> + '_ {
        self.contiguous_pages().flat_map(|p| p.users.iter())
    }

    pub fn loaded_count(&self) -> usize {
        self.contiguous_pages().map(Page::len).sum()
    }

    /// `total` as reported by the first page. Later pages are not consulted.
    pub fn total_count(&self) -> Option<u64> {
        self.pages.get(&0).map(|p| p.total)
    }

    pub fn has_data(&self) -> bool {
        self.pages.contains_key(&0)
    }

    /// The user at logical `index`.
    ///
    /// With full pages this is page `index / page_size` at offset `index % page_size`. Only the
    /// last contiguous page may be short, so walking the prefix gives the same answer.
    pub fn item(&self, index: usize) -> Option<&UserRecord> {
        let mut rest = index;
        for page in self.contiguous_pages() {
            if rest < page.len() {
                return page.users.get(rest);
            }
            rest -= page.len();
        }
        None
    }

    /// Drops every page, state and failure and starts a new session.
    pub fn reset(&mut self) {
        self.states.clear();
        self.pages.clear();
        self.failure = None;
        self.session = self.session.wrapping_add(1);
        fdebug!(session = self.session, "page cache reset");
    }
}
