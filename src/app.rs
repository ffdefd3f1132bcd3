use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use ratatui::layout::Rect;
use userdir_feed::{Feed, FeedOptions, Outcome, PageRequest};
use userdir_window::Align;

use crate::ui;

/// Rows moved per mouse wheel notch.
const WHEEL_ROWS: i64 = 3;

/// Application state: the feed plus the bits the event loop needs.
///
/// Every handler returns the page request (if any) the caller has to dispatch; the app itself
/// never touches the network.
pub struct App {
    feed: Feed,
    dirty: Arc<AtomicBool>,
    should_quit: bool,
}

impl App {
    pub fn new(options: FeedOptions) -> Self {
        let dirty = Arc::new(AtomicBool::new(true));
        let mut feed = Feed::new(options);
        feed.set_on_change(Some({
            let dirty = Arc::clone(&dirty);
            move |_: &Feed| dirty.store(true, Ordering::Relaxed)
        }));
        Self {
            feed,
            dirty,
            should_quit: false,
        }
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Whether something changed since the last frame.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Relaxed)
    }

    pub fn mark_clean(&self) {
        self.dirty.store(false, Ordering::Relaxed);
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Relaxed);
    }

    pub fn start(&mut self) -> Option<PageRequest> {
        tracing::info!("loading first page");
        self.feed.start()
    }

    /// Fits the list viewport to a terminal of size `area`.
    pub fn resize(&mut self, area: Rect) -> Option<PageRequest> {
        let layout = ui::screen_layout(area, self.feed.inline_error().is_some());
        self.feed.set_viewport_height(u32::from(layout.list.height))
    }

    pub fn apply(&mut self, outcome: Outcome) -> Option<PageRequest> {
        if let Err(error) = &outcome.result {
            tracing::warn!(
                page_index = outcome.request.page_index,
                error = %error,
                "page fetch failed"
            );
        }
        self.feed.apply(outcome)
    }

    pub fn on_event(&mut self, event: Event) -> Option<PageRequest> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key(key),
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollDown => self.feed.scroll_by(WHEEL_ROWS),
                MouseEventKind::ScrollUp => self.feed.scroll_by(-WHEEL_ROWS),
                _ => None,
            },
            Event::Resize(..) => {
                self.mark_dirty();
                None
            }
            _ => None,
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Option<PageRequest> {
        let page = i64::from(self.feed.window().viewport_height()).max(1);
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                None
            }
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Char('j') | KeyCode::Down => self.feed.scroll_by(1),
            KeyCode::Char('k') | KeyCode::Up => self.feed.scroll_by(-1),
            KeyCode::PageDown | KeyCode::Char(' ') => self.feed.scroll_by(page),
            KeyCode::PageUp => self.feed.scroll_by(-page),
            KeyCode::Char('g') | KeyCode::Home => self.feed.scroll_to_index(0, Align::Start),
            KeyCode::Char('G') | KeyCode::End => self.feed.scroll_to_end(),
            KeyCode::Char('r') => {
                tracing::info!(session = self.feed.session(), "refresh");
                self.feed.refresh()
            }
            KeyCode::Char('t') => self.feed.retry(),
            KeyCode::Char('x') | KeyCode::Esc => {
                self.feed.dismiss_error();
                None
            }
            _ => None,
        }
    }
}
