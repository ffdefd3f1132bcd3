use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{FetchError, Fetcher, Page, PageRequest};

/// The result of executing one [`PageRequest`].
#[derive(Debug)]
pub struct Outcome {
    pub request: PageRequest,
    pub result: Result<Page, FetchError>,
}

/// Executes page requests on the tokio runtime and hands results back in completion order.
///
/// The driver holds no list state. Requests come from [`crate::Feed`], outcomes go back to it
/// through [`crate::Feed::apply`], so every mutation stays on the task that owns the feed.
pub struct Driver<F> {
    fetcher: Arc<F>,
    tx: mpsc::UnboundedSender<Outcome>,
    rx: mpsc::UnboundedReceiver<Outcome>,
    in_flight: usize,
}

impl<F: Fetcher> Driver<F> {
    pub fn new(fetcher: F) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            fetcher: Arc::new(fetcher),
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Number of dispatched requests whose outcome has not been received yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Spawns the fetch for `request`. Must be called from within a tokio runtime.
    pub fn dispatch(&mut self, request: PageRequest) {
        fdebug!(
            page_index = request.page_index,
            session = request.session,
            "dispatching page request"
        );
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = fetcher.fetch(request.page_index).await;
            // The receiver lives as long as the driver; a send error means it was dropped.
            let _ = tx.send(Outcome { request, result });
        });
    }

    /// Dispatches `request` if there is one.
    pub fn dispatch_opt(&mut self, request: Option<PageRequest>) {
        if let Some(request) = request {
            self.dispatch(request);
        }
    }

    /// Waits for the next outcome.
    pub async fn next(&mut self) -> Option<Outcome> {
        let outcome = self.rx.recv().await?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(outcome)
    }

    /// Returns an outcome if one is ready, without waiting.
    pub fn try_next(&mut self) -> Option<Outcome> {
        let outcome = self.rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(outcome)
    }
}
