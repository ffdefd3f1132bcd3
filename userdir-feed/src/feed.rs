use std::cell::Cell;
use std::sync::Arc;

use userdir_window::{Align, Window, WindowOptions};

use crate::{
    Completion, FetchError, FetchState, Outcome, Page, PageCache, PageRequest, Pagination,
    PaginationState, Progress, UserRecord,
};

/// A callback fired after the feed's observable state changes.
pub type FeedChangeCallback = Arc<dyn Fn(&Feed) + Send + Sync>;

/// Configuration for [`Feed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeedOptions {
    pub page_size: usize,
    /// Height of one user card in the scroll axis.
    pub item_height: u32,
    pub overscan: usize,
    /// See [`userdir_window::WindowOptions::near_end_threshold`].
    pub near_end_threshold: usize,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            page_size: 10,
            item_height: 6,
            overscan: 2,
            near_end_threshold: 2,
        }
    }
}

/// What the display surface should show as a whole.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No page has resolved yet.
    Loading,
    /// The first page failed; the only recovery is a refresh.
    Failed(FetchError),
    /// The first page resolved with no users.
    Empty,
    /// At least one user is loaded.
    Ready,
}

/// Observable state of a paginated user list.
///
/// `Feed` ties the page cache, the pagination controller and the list window together. It is a
/// single-owner state machine: every operation takes `&mut self`, returns the page request (if
/// any) the caller must execute, and notifies the `on_change` subscriber once.
///
/// Fetch results come back through [`Feed::complete`] (or [`Feed::apply`] for a driver
/// [`Outcome`]).
pub struct Feed {
    options: FeedOptions,
    cache: PageCache,
    pagination: Pagination,
    window: Window,
    inline_error: bool,
    on_change: Option<FeedChangeCallback>,

    notify_depth: Cell<usize>,
    notify_pending: Cell<bool>,
}

impl Feed {
    pub fn new(options: FeedOptions) -> Self {
        let window = Window::new(
            WindowOptions::new(0, options.item_height)
                .with_overscan(options.overscan)
                .with_near_end_threshold(options.near_end_threshold),
        );
        fdebug!(
            page_size = options.page_size,
            item_height = options.item_height,
            "Feed::new"
        );
        Self {
            cache: PageCache::new(options.page_size),
            pagination: Pagination::new(),
            window,
            inline_error: false,
            on_change: None,
            options,
            notify_depth: Cell::new(0),
            notify_pending: Cell::new(false),
        }
    }

    pub fn options(&self) -> &FeedOptions {
        &self.options
    }

    pub fn set_on_change(&mut self, on_change: Option<impl Fn(&Feed) + Send + Sync + 'static>) {
        self.on_change = on_change.map(|f| Arc::new(f) as _);
    }

    fn notify_now(&self) {
        if let Some(cb) = &self.on_change {
            cb(self);
        }
    }

    fn notify(&self) {
        if self.notify_depth.get() > 0 {
            self.notify_pending.set(true);
            return;
        }
        self.notify_now();
    }

    /// Runs `f` with notifications coalesced into at most one `on_change` call.
    pub fn batch_update<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let depth = self.notify_depth.get();
        self.notify_depth.set(depth.saturating_add(1));

        let out = f(self);

        let next = self.notify_depth.get().saturating_sub(1);
        self.notify_depth.set(next);
        if next == 0 && self.notify_pending.replace(false) {
            self.notify_now();
        }
        out
    }

    // ---- queries -------------------------------------------------------------------------

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn pagination_state(&self) -> PaginationState {
        self.pagination.state()
    }

    pub fn fetch_state(&self, page_index: usize) -> FetchState {
        self.cache.fetch_state(page_index)
    }

    pub fn session(&self) -> u64 {
        self.cache.session()
    }

    pub fn loaded_count(&self) -> usize {
        self.cache.loaded_count()
    }

    /// Server-side total; 0 until the first page resolves.
    pub fn total_count(&self) -> u64 {
        self.cache.total_count().unwrap_or(0)
    }

    /// Whether more pages may exist. Drives the trailing placeholder slot.
    pub fn has_more(&self) -> bool {
        !self.pagination.is_exhausted() && self.progress().has_more()
    }

    /// Slot count of the window: loaded users plus one placeholder while more may exist.
    pub fn item_count(&self) -> usize {
        let loaded = self.loaded_count();
        if self.has_more() { loaded + 1 } else { loaded }
    }

    pub fn item(&self, index: usize) -> Option<&UserRecord> {
        self.cache.item(index)
    }

    pub fn items(&self) -> impl Iterator<Item = &UserRecord> + '_ {
        self.cache.flattened_items()
    }

    pub fn phase(&self) -> Phase {
        if !self.cache.has_data() {
            return match self.cache.failure() {
                Some((0, error)) => Phase::Failed(error.clone()),
                _ => Phase::Loading,
            };
        }
        if self.loaded_count() == 0 {
            Phase::Empty
        } else {
            Phase::Ready
        }
    }

    /// `Showing X of Y users`.
    pub fn header(&self) -> String {
        format!(
            "Showing {} of {} users",
            self.loaded_count(),
            self.total_count()
        )
    }

    /// Whether a page after the first one is being fetched.
    pub fn is_loading_more(&self) -> bool {
        self.cache.has_data() && self.cache.in_flight().is_some()
    }

    /// The failure to show beneath the loaded list, unless it was dismissed.
    pub fn inline_error(&self) -> Option<&FetchError> {
        if !self.inline_error || !self.cache.has_data() {
            return None;
        }
        self.cache.failure().map(|(_, e)| e)
    }

    fn progress(&self) -> Progress {
        Progress {
            loaded: self.cache.loaded_count(),
            total: self.cache.total_count(),
            in_flight: self.cache.in_flight().is_some(),
            next_page: self.cache.resolved_pages(),
        }
    }

    // ---- session -------------------------------------------------------------------------

    /// Requests the first page if the session has not started yet.
    pub fn start(&mut self) -> Option<PageRequest> {
        if self.cache.fetch_state(0) != FetchState::NotRequested {
            return None;
        }
        self.batch_update(|f| {
            let request = f.cache.request_page(0)?;
            f.pagination.begin(0);
            f.notify();
            Some(request)
        })
    }

    /// Full reset: drops every page, returns to the top and requests page 0 again.
    ///
    /// Results of requests issued before the refresh are discarded when they arrive.
    pub fn refresh(&mut self) -> Option<PageRequest> {
        fdebug!(session = self.cache.session(), "Feed::refresh");
        self.batch_update(|f| {
            f.cache.reset();
            f.pagination.reset();
            f.inline_error = false;
            f.window.reset();
            f.sync_window();
            f.notify();
            f.start()
        })
    }

    /// Re-issues the failed page only.
    pub fn retry(&mut self) -> Option<PageRequest> {
        self.batch_update(|f| {
            let page = f.pagination.retry()?;
            f.inline_error = false;
            f.notify();
            let request = f.cache.request_page(page);
            if request.is_none() {
                fwarn!(page, "retry found the page already in flight or resolved");
                f.pagination.reset();
            }
            request
        })
    }

    /// Hides the inline error. The page stays failed until it is requested again.
    pub fn dismiss_error(&mut self) {
        if !self.inline_error {
            return;
        }
        self.inline_error = false;
        self.pagination.dismiss();
        self.notify();
    }

    /// Applies a fetch result and returns a follow-up request when the viewport is still
    /// near the end of the grown list.
    pub fn complete(
        &mut self,
        request: PageRequest,
        result: Result<Page, FetchError>,
    ) -> Option<PageRequest> {
        self.batch_update(|f| match f.cache.complete(request, result) {
            Completion::Stale => None,
            Completion::Resolved { page_index, len } => {
                let progress = f.progress();
                f.pagination.on_resolved(page_index, len, progress);
                f.sync_window();
                f.notify();
                let signal = f.window.observe().or_else(|| f.window.near_end())?;
                f.grow(signal.highest_visible)
            }
            Completion::Failed { page_index, .. } => {
                f.pagination.on_failed(page_index);
                f.inline_error = f.cache.has_data();
                f.notify();
                None
            }
        })
    }

    pub fn apply(&mut self, outcome: Outcome) -> Option<PageRequest> {
        self.complete(outcome.request, outcome.result)
    }

    // ---- viewport ------------------------------------------------------------------------

    pub fn set_viewport_height(&mut self, height: u32) -> Option<PageRequest> {
        self.batch_update(|f| {
            f.window.set_viewport_height(height);
            f.window.set_scroll_offset_clamped(f.window.scroll_offset());
            f.after_scroll()
        })
    }

    pub fn scroll_by(&mut self, delta: i64) -> Option<PageRequest> {
        self.batch_update(|f| {
            f.window.scroll_by(delta);
            f.after_scroll()
        })
    }

    pub fn scroll_to(&mut self, offset: u64) -> Option<PageRequest> {
        self.batch_update(|f| {
            f.window.set_scroll_offset_clamped(offset);
            f.after_scroll()
        })
    }

    pub fn scroll_to_index(&mut self, index: usize, align: Align) -> Option<PageRequest> {
        self.batch_update(|f| {
            f.window.scroll_to_index(index, align);
            f.after_scroll()
        })
    }

    pub fn scroll_to_end(&mut self) -> Option<PageRequest> {
        self.scroll_to(u64::MAX)
    }

    fn after_scroll(&mut self) -> Option<PageRequest> {
        self.notify();
        let signal = self.window.observe()?;
        self.grow(signal.highest_visible)
    }

    fn grow(&mut self, highest_visible: usize) -> Option<PageRequest> {
        let page = self.pagination.on_near_end(highest_visible, self.progress());
        if self.pagination.is_exhausted() {
            // Exhaustion removes the placeholder slot.
            self.sync_window();
        }
        let page = page?;
        let request = self.cache.request_page(page);
        if request.is_none() {
            fwarn!(page, "grow found the page already in flight or resolved");
            self.pagination.reset();
        }
        self.notify();
        request
    }

    fn sync_window(&mut self) {
        let count = self.item_count();
        let loaded = self.loaded_count();
        self.window.batch_update(|w| {
            w.set_counts(count, loaded);
            w.set_scroll_offset_clamped(w.scroll_offset());
        });
    }
}

impl core::fmt::Debug for Feed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Feed")
            .field("options", &self.options)
            .field("session", &self.cache.session())
            .field("loaded", &self.cache.loaded_count())
            .field("total", &self.cache.total_count())
            .field("pagination", &self.pagination.state())
            .field("inline_error", &self.inline_error)
            .finish_non_exhaustive()
    }
}
