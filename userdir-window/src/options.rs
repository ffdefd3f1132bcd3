use alloc::sync::Arc;

use crate::window::Window;

/// A callback fired when the window's state changes.
pub type OnChangeCallback = Arc<dyn Fn(&Window) + Send + Sync>;

/// Configuration for [`crate::Window`].
///
/// Cheap to clone: the callback is stored in an `Arc`, so adapters can tweak a field and call
/// `Window::set_options` without reallocating closures.
pub struct WindowOptions {
    /// Number of slots, including a trailing placeholder slot if the list may grow.
    pub count: usize,
    /// Number of leading slots backed by loaded data. Slots `>= loaded` are placeholders.
    pub loaded: usize,
    /// Height of every slot in the scroll axis.
    pub item_height: u32,
    /// Extra slots rendered on both sides of the visible range.
    pub overscan: usize,
    /// A [`crate::NearEnd`] signal fires when the highest visible index is within this many
    /// slots of `count`.
    pub near_end_threshold: usize,
    pub initial_offset: u64,
    pub on_change: Option<OnChangeCallback>,
}

impl Clone for WindowOptions {
    fn clone(&self) -> Self {
        Self {
            count: self.count,
            loaded: self.loaded,
            item_height: self.item_height,
            overscan: self.overscan,
            near_end_threshold: self.near_end_threshold,
            initial_offset: self.initial_offset,
            on_change: self.on_change.clone(),
        }
    }
}

impl WindowOptions {
    /// Creates options for `count` fully loaded slots of `item_height` each.
    pub fn new(count: usize, item_height: u32) -> Self {
        Self {
            count,
            loaded: count,
            item_height,
            overscan: 1,
            near_end_threshold: 2,
            initial_offset: 0,
            on_change: None,
        }
    }

    pub fn with_loaded(mut self, loaded: usize) -> Self {
        self.loaded = loaded;
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_near_end_threshold(mut self, threshold: usize) -> Self {
        self.near_end_threshold = threshold;
        self
    }

    pub fn with_initial_offset(mut self, initial_offset: u64) -> Self {
        self.initial_offset = initial_offset;
        self
    }

    pub fn with_on_change(
        mut self,
        on_change: Option<impl Fn(&Window) + Send + Sync + 'static>,
    ) -> Self {
        self.on_change = on_change.map(|f| Arc::new(f) as _);
        self
    }
}

impl core::fmt::Debug for WindowOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WindowOptions")
            .field("count", &self.count)
            .field("loaded", &self.loaded)
            .field("item_height", &self.item_height)
            .field("overscan", &self.overscan)
            .field("near_end_threshold", &self.near_end_threshold)
            .field("initial_offset", &self.initial_offset)
            .finish_non_exhaustive()
    }
}
