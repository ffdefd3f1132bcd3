use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::Cell;
use core::cmp;

use crate::math;
use crate::{Align, NearEnd, ScrollDirection, SlotKind, VirtualItem, VirtualRange, WindowOptions};

/// A headless window over a fixed-height list.
///
/// This type is UI-agnostic:
/// - It does not hold any UI objects or item data.
/// - Your adapter drives it by providing the viewport height and scroll offset.
/// - Rendering is exposed via zero-allocation iteration (`for_each_virtual_item`).
///
/// Growth is signalled through [`Window::observe`], which an adapter calls after each batch of
/// updates to learn whether the visible range now touches the end of the list.
#[derive(Clone, Debug)]
pub struct Window {
    options: WindowOptions,
    viewport_height: u32,
    scroll_offset: u64,
    scroll_direction: Option<ScrollDirection>,
    observed: Option<VirtualRange>,

    notify_depth: Cell<usize>,
    notify_pending: Cell<bool>,
}

impl Window {
    pub fn new(options: WindowOptions) -> Self {
        wdebug!(
            count = options.count,
            loaded = options.loaded,
            item_height = options.item_height,
            overscan = options.overscan,
            "Window::new"
        );
        Self {
            viewport_height: 0,
            scroll_offset: options.initial_offset,
            scroll_direction: None,
            observed: None,
            options,
            notify_depth: Cell::new(0),
            notify_pending: Cell::new(false),
        }
    }

    pub fn options(&self) -> &WindowOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: WindowOptions) {
        self.options = options;
        wtrace!(
            count = self.options.count,
            loaded = self.options.loaded,
            item_height = self.options.item_height,
            "Window::set_options"
        );
        self.notify();
    }

    /// Clones the current options, applies `f`, then delegates to `set_options`.
    pub fn update_options(&mut self, f: impl FnOnce(&mut WindowOptions)) {
        let mut next = self.options.clone();
        f(&mut next);
        self.set_options(next);
    }

    pub fn set_on_change(
        &mut self,
        on_change: Option<impl Fn(&Window) + Send + Sync + 'static>,
    ) {
        self.options.on_change = on_change.map(|f| Arc::new(f) as _);
        self.notify();
    }

    fn notify_now(&self) {
        if let Some(cb) = &self.options.on_change {
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

    /// Batches multiple updates into a single `on_change` notification.
    pub fn batch_update(&mut self, f: impl FnOnce(&mut Self)) {
        let depth = self.notify_depth.get();
        self.notify_depth.set(depth.saturating_add(1));

        f(self);

        let depth = self.notify_depth.get();
        debug_assert!(depth > 0, "notify_depth underflow");
        let next = depth.saturating_sub(1);
        self.notify_depth.set(next);

        if next == 0 && self.notify_pending.replace(false) {
            self.notify_now();
        }
    }

    pub fn count(&self) -> usize {
        self.options.count
    }

    pub fn loaded(&self) -> usize {
        self.options.loaded
    }

    pub fn item_height(&self) -> u32 {
        self.options.item_height
    }

    /// Updates the slot count and the number of loaded slots together.
    ///
    /// `loaded` is capped at `count`. The scroll offset is left untouched; shrinking lists are
    /// clamped lazily by the range queries.
    pub fn set_counts(&mut self, count: usize, loaded: usize) {
        let loaded = loaded.min(count);
        if self.options.count == count && self.options.loaded == loaded {
            return;
        }
        wtrace!(count, loaded, "Window::set_counts");
        self.options.count = count;
        self.options.loaded = loaded;
        self.notify();
    }

    pub fn set_item_height(&mut self, item_height: u32) {
        if self.options.item_height == item_height {
            return;
        }
        self.options.item_height = item_height;
        self.notify();
    }

    pub fn set_overscan(&mut self, overscan: usize) {
        self.options.overscan = overscan;
        self.notify();
    }

    pub fn viewport_height(&self) -> u32 {
        self.viewport_height
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        if self.viewport_height == height {
            return;
        }
        self.viewport_height = height;
        self.notify();
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn scroll_direction(&self) -> Option<ScrollDirection> {
        self.scroll_direction
    }

    pub fn set_scroll_offset(&mut self, offset: u64) {
        if self.scroll_offset == offset {
            return;
        }
        let prev = self.scroll_offset;
        self.scroll_offset = offset;
        self.scroll_direction = match offset.cmp(&prev) {
            cmp::Ordering::Greater => Some(ScrollDirection::Forward),
            cmp::Ordering::Less => Some(ScrollDirection::Backward),
            cmp::Ordering::Equal => self.scroll_direction,
        };
        self.notify();
    }

    pub fn set_scroll_offset_clamped(&mut self, offset: u64) {
        let clamped = self.clamp_scroll_offset(offset);
        self.set_scroll_offset(clamped);
    }

    /// Scrolls by a signed delta, clamped to `[0, max_scroll_offset]`.
    ///
    /// Returns the applied offset.
    pub fn scroll_by(&mut self, delta: i64) -> u64 {
        let target = if delta >= 0 {
            self.scroll_offset.saturating_add(delta as u64)
        } else {
            self.scroll_offset.saturating_sub(delta.unsigned_abs())
        };
        self.set_scroll_offset_clamped(target);
        self.scroll_offset
    }

    pub fn set_viewport_and_scroll_clamped(&mut self, viewport_height: u32, scroll_offset: u64) {
        self.batch_update(|w| {
            w.set_viewport_height(viewport_height);
            w.set_scroll_offset_clamped(scroll_offset);
        });
    }

    /// Returns to the initial scroll offset and forgets the last observed range.
    pub fn reset(&mut self) {
        wdebug!("Window::reset");
        self.batch_update(|w| {
            w.set_scroll_offset(w.options.initial_offset);
            w.scroll_direction = None;
            w.observed = None;
        });
    }

    pub fn total_size(&self) -> u64 {
        math::total_size(self.options.count, self.options.item_height)
    }

    pub fn max_scroll_offset(&self) -> u64 {
        math::max_scroll_offset(self.total_size(), self.viewport_height)
    }

    pub fn clamp_scroll_offset(&self, offset: u64) -> u64 {
        offset.min(self.max_scroll_offset())
    }

    /// Slots intersecting the viewport (no overscan).
    pub fn visible_range(&self) -> VirtualRange {
        self.visible_range_for(self.scroll_offset, self.viewport_height)
    }

    pub fn visible_range_for(&self, scroll_offset: u64, viewport_height: u32) -> VirtualRange {
        math::visible_range(
            scroll_offset,
            viewport_height,
            self.options.item_height,
            self.options.count,
        )
    }

    /// Slots to materialize: the visible range plus overscan.
    pub fn virtual_range(&self) -> VirtualRange {
        math::overscanned(self.visible_range(), self.options.overscan, self.options.count)
    }

    pub fn highest_visible_index(&self) -> Option<usize> {
        self.visible_range().last_index()
    }

    pub fn slot_kind(&self, index: usize) -> SlotKind {
        if index < self.options.loaded {
            SlotKind::Item
        } else {
            SlotKind::Placeholder
        }
    }

    pub fn item(&self, index: usize) -> Option<VirtualItem> {
        if index >= self.options.count {
            return None;
        }
        Some(self.item_unchecked(index))
    }

    fn item_unchecked(&self, index: usize) -> VirtualItem {
        let size = self.options.item_height;
        VirtualItem {
            index,
            start: (index as u64).saturating_mul(size as u64),
            size,
            kind: self.slot_kind(index),
        }
    }

    pub fn index_at_offset(&self, offset: u64) -> Option<usize> {
        let count = self.options.count;
        let h = self.options.item_height as u64;
        if count == 0 || h == 0 {
            return None;
        }
        Some(((offset / h) as usize).min(count - 1))
    }

    pub fn for_each_virtual_item(&self, mut f: impl FnMut(VirtualItem)) {
        let range = self.virtual_range();
        for i in range.start_index..range.end_index {
            f(self.item_unchecked(i));
        }
    }

    /// Collects virtual items into `out` (clears `out` first).
    ///
    /// For hot paths, prefer `for_each_virtual_item` and reuse a scratch buffer.
    pub fn collect_virtual_items(&self, out: &mut Vec<VirtualItem>) {
        out.clear();
        self.for_each_virtual_item(|it| out.push(it));
    }

    /// Programmatically scrolls to an index and returns the applied (clamped) offset.
    pub fn scroll_to_index(&mut self, index: usize, align: Align) -> u64 {
        let offset = self.scroll_to_index_offset(index, align);
        self.set_scroll_offset(offset);
        offset
    }

    pub fn scroll_to_index_offset(&self, index: usize, align: Align) -> u64 {
        if self.options.count == 0 {
            return 0;
        }
        let item = self.item_unchecked(index.min(self.options.count - 1));
        let view = self.viewport_height as u64;

        let target = match align {
            Align::Start => item.start,
            Align::End => item.end().saturating_sub(view),
            Align::Center => {
                let center = item.start.saturating_add(item.size as u64 / 2);
                center.saturating_sub(view / 2)
            }
            Align::Auto => {
                let cur = self.scroll_offset;
                let cur_end = cur.saturating_add(view);
                if item.start >= cur && item.end() <= cur_end {
                    cur
                } else if item.start < cur {
                    item.start
                } else {
                    item.end().saturating_sub(view)
                }
            }
        };

        self.clamp_scroll_offset(target)
    }

    /// The near-end signal for the current visible range, regardless of whether it changed.
    pub fn near_end(&self) -> Option<NearEnd> {
        let highest = self.highest_visible_index()?;
        let count = self.options.count;
        if !math::is_near_end(highest, count, self.options.near_end_threshold) {
            return None;
        }
        Some(NearEnd {
            highest_visible: highest,
            count,
        })
    }

    /// Records the current visible range and reports a [`NearEnd`] signal if the range changed
    /// since the previous call and now ends within `near_end_threshold` slots of `count`.
    ///
    /// A list that grows while the viewport stays put counts as a change only if the visible
    /// range itself moves; adapters that want to re-check after new data arrives call
    /// [`Window::near_end`] directly.
    pub fn observe(&mut self) -> Option<NearEnd> {
        let range = self.visible_range();
        if self.observed == Some(range) {
            return None;
        }
        self.observed = Some(range);
        let signal = self.near_end();
        if let Some(signal) = signal {
            wtrace!(
                highest_visible = signal.highest_visible,
                count = signal.count,
                "Window::observe near end"
            );
        }
        signal
    }
}
