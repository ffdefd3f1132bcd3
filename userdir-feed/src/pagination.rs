/// State of the pagination controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PaginationState {
    /// Waiting for a near-end signal.
    #[default]
    Idle,
    /// `page` has been requested and has not resolved yet.
    Growing { page: usize },
    /// Every page of the session has been loaded.
    Exhausted,
    /// Fetching `page` failed; only a user retry re-issues it.
    Error { page: usize },
}

/// Loading progress the controller bases its decisions on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub loaded: usize,
    /// Server-side total, once the first page has resolved.
    pub total: Option<u64>,
    /// Whether any page fetch is outstanding.
    pub in_flight: bool,
    /// Index of the page that would extend the contiguous prefix.
    pub next_page: usize,
}

impl Progress {
    pub fn has_more(&self) -> bool {
        self.total.is_some_and(|total| (self.loaded as u64) < total)
    }
}

/// Decides when the list grows.
///
/// At most one grow request is outstanding at a time: the controller only leaves `Idle` for
/// `Growing`, and only a resolution or failure brings it back.
#[derive(Clone, Debug, Default)]
pub struct Pagination {
    state: PaginationState,
}

impl Pagination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    pub fn is_growing(&self) -> bool {
        matches!(self.state, PaginationState::Growing { .. })
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == PaginationState::Exhausted
    }

    /// The page a retry would re-issue.
    pub fn failed_page(&self) -> Option<usize> {
        match self.state {
            PaginationState::Error { page } => Some(page),
            _ => None,
        }
    }

    /// Enters `Growing` for `page` unconditionally (initial load and refresh).
    pub fn begin(&mut self, page: usize) {
        ftrace!(page, "pagination begin");
        self.state = PaginationState::Growing { page };
    }

    /// Handles a near-end report from the window.
    ///
    /// Returns the page to request when `highest_visible` is within one item of the loaded
    /// count, more items exist, and nothing is in flight.
    pub fn on_near_end(&mut self, highest_visible: usize, progress: Progress) -> Option<usize> {
        if self.state != PaginationState::Idle || progress.in_flight {
            return None;
        }
        let total = progress.total?;
        if progress.loaded as u64 >= total {
            self.state = PaginationState::Exhausted;
            return None;
        }
        if highest_visible.saturating_add(1) < progress.loaded {
            return None;
        }
        fdebug!(
            highest_visible,
            loaded = progress.loaded,
            total,
            page = progress.next_page,
            "pagination growing"
        );
        self.state = PaginationState::Growing {
            page: progress.next_page,
        };
        Some(progress.next_page)
    }

    /// Handles a successful resolution of `page` that contained `len` users.
    ///
    /// An empty page ends the session even if `total` claims more.
    pub fn on_resolved(&mut self, page: usize, len: usize, progress: Progress) {
        if self.state != (PaginationState::Growing { page }) {
            return;
        }
        self.state = if len == 0 || !progress.has_more() {
            PaginationState::Exhausted
        } else {
            PaginationState::Idle
        };
        ftrace!(page, len, state = ?self.state, "pagination resolved");
    }

    pub fn on_failed(&mut self, page: usize) {
        if self.state == (PaginationState::Growing { page }) {
            self.state = PaginationState::Error { page };
        }
    }

    /// Re-enters `Growing` for the failed page and returns it.
    pub fn retry(&mut self) -> Option<usize> {
        let page = self.failed_page()?;
        self.state = PaginationState::Growing { page };
        Some(page)
    }

    /// Leaves `Error` without retrying; the next near-end report may request the page again.
    pub fn dismiss(&mut self) {
        if let PaginationState::Error { .. } = self.state {
            self.state = PaginationState::Idle;
        }
    }

    pub fn reset(&mut self) {
        self.state = PaginationState::Idle;
    }
}
