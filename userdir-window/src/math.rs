//! Pure window arithmetic.
//!
//! Every function here is a function of its arguments only, so adapters (and tests) can compute
//! a window without building a [`crate::Window`].

use core::cmp;

use crate::VirtualRange;

/// Total scrollable height of `count` slots of `item_height` each.
pub fn total_size(count: usize, item_height: u32) -> u64 {
    (count as u64).saturating_mul(item_height as u64)
}

/// Largest scroll offset that still fills the viewport (0 when the content is shorter).
pub fn max_scroll_offset(total_size: u64, viewport_height: u32) -> u64 {
    total_size.saturating_sub(viewport_height as u64)
}

/// Range of slots intersecting `[scroll_offset, scroll_offset + viewport_height)`.
///
/// The scroll offset is clamped to [`max_scroll_offset`] first, so an offset past the end
/// yields the last screenful rather than an empty range.
pub fn visible_range(
    scroll_offset: u64,
    viewport_height: u32,
    item_height: u32,
    item_count: usize,
) -> VirtualRange {
    if item_count == 0 || viewport_height == 0 || item_height == 0 {
        return VirtualRange::EMPTY;
    }

    let h = item_height as u64;
    let total = total_size(item_count, item_height);
    let offset = scroll_offset.min(max_scroll_offset(total, viewport_height));
    let end_offset = offset.saturating_add(viewport_height as u64).min(total);

    let start = (offset / h) as usize;
    let end = end_offset.div_ceil(h) as usize;

    VirtualRange {
        start_index: cmp::min(start, item_count),
        end_index: cmp::min(end, item_count),
    }
}

/// Extends `range` by `overscan` slots on both sides, bounded by `count`.
pub fn overscanned(range: VirtualRange, overscan: usize, count: usize) -> VirtualRange {
    if range.is_empty() {
        return range;
    }
    VirtualRange {
        start_index: range.start_index.saturating_sub(overscan),
        end_index: cmp::min(count, range.end_index.saturating_add(overscan)),
    }
}

/// Whether `highest_visible` is within `threshold` slots of the end of a `count`-slot list.
pub fn is_near_end(highest_visible: usize, count: usize, threshold: usize) -> bool {
    count > 0 && highest_visible.saturating_add(threshold) >= count
}
