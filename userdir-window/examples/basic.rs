// Example: a growing list with a trailing placeholder slot.
use userdir_window::{Align, SlotKind, Window, WindowOptions};

fn main() {
    // 10 loaded rows of height 6, one placeholder slot while more data may exist.
    let mut w = Window::new(WindowOptions::new(11, 6).with_loaded(10).with_overscan(2));
    w.set_viewport_and_scroll_clamped(24, 0);
    println!("total_size={}", w.total_size());
    println!("visible_range={:?}", w.visible_range());
    println!("near_end={:?}", w.observe());

    let off = w.scroll_to_index_offset(9, Align::End);
    w.set_scroll_offset_clamped(off);
    println!("after scroll_to_index: offset={}", w.scroll_offset());
    if let Some(signal) = w.observe() {
        println!("near end at {} of {}", signal.highest_visible, signal.count);
    }

    w.for_each_virtual_item(|it| {
        let label = match it.kind {
            SlotKind::Item => "item",
            SlotKind::Placeholder => "loading",
        };
        println!("#{:>2} start={:>3} {label}", it.index, it.start);
    });
}
