//! A headless windowing engine for fixed-height lists.
//!
//! The engine answers one question per frame: given a scroll offset and a viewport height,
//! which slots of the list intersect the viewport? Everything outside that window is only
//! accounted for as blank space (`total_size`) so scrollbars keep correct proportions.
//!
//! Two additions over a plain virtual list make it suitable for incrementally loaded data:
//! - slots at or beyond `loaded` are reported as [`SlotKind::Placeholder`], so a list can carry
//!   one trailing "loading" slot while more pages may exist;
//! - [`Window::observe`] reports a [`NearEnd`] signal whenever the visible range changes and
//!   its last index is close to the end of the list.
//!
//! It is UI-agnostic. A TUI/GUI layer is expected to provide:
//! - viewport height
//! - scroll offset
//! - the number of slots and how many of them are loaded
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod math;
mod options;
mod types;
mod window;


pub use math::{is_near_end, max_scroll_offset, overscanned, total_size, visible_range};
pub use options::{OnChangeCallback, WindowOptions};
pub use types::{Align, NearEnd, ScrollDirection, SlotKind, VirtualItem, VirtualRange};
pub use window::Window;
