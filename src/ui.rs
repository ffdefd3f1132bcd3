use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{
        Block, BorderType, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Widget,
    },
};
use userdir_feed::{Feed, FetchError, Phase, UserRecord};
use userdir_window::{VirtualItem, Window};

use crate::app::App;

/// Skeleton cards shown before the first page arrives.
const INITIAL_SKELETONS: u16 = 6;

const ACCENT: Color = Color::Cyan;
const MUTED: Color = Color::DarkGray;

/// Where each part of the screen goes for a terminal of size `area`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenLayout {
    pub header: Rect,
    pub list: Rect,
    pub scrollbar: Rect,
    pub inline_error: Option<Rect>,
    pub footer: Rect,
}

pub fn screen_layout(area: Rect, inline_error: bool) -> ScreenLayout {
    let inner = Block::bordered().inner(area);

    let mut constraints = vec![Constraint::Length(1), Constraint::Min(0)];
    if inline_error {
        constraints.push(Constraint::Length(2));
    }
    constraints.push(Constraint::Length(1));
    let rows = Layout::vertical(constraints).split(inner);

    let [list, scrollbar] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(1)]).areas(rows[1]);

    ScreenLayout {
        header: rows[0],
        list,
        scrollbar,
        inline_error: inline_error.then(|| rows[2]),
        footer: rows[rows.len() - 1],
    }
}

pub fn draw(frame: &mut Frame<'_>, app: &App) {
    let feed = app.feed();
    let area = frame.area();

    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Style::new().fg(MUTED))
        .title(Line::from(" User Directory ").bold().fg(ACCENT));
    frame.render_widget(block, area);

    let inline_error = feed.inline_error();
    let layout = screen_layout(area, inline_error.is_some());

    let phase = feed.phase();
    render_header(frame, layout.header, feed, &phase);

    let item_height = feed.window().item_height();
    match &phase {
        Phase::Loading => render_initial_skeletons(frame.buffer_mut(), layout.list, item_height),
        Phase::Failed(error) => render_message(
            frame,
            layout.list,
            Line::from("Something went wrong").bold().fg(Color::Red),
            error.to_string(),
            "Press r to try again",
        ),
        Phase::Empty => render_message(
            frame,
            layout.list,
            Line::from("No users found").bold(),
            "There are no users to display at the moment.".to_string(),
            "Press r to refresh",
        ),
        Phase::Ready => {
            render_list(frame, layout.list, feed);
            render_scrollbar(frame, layout.scrollbar, feed.window());
        }
    }

    if let (Some(area), Some(error)) = (layout.inline_error, inline_error) {
        render_inline_error(frame, area, error);
    }
    render_footer(frame, layout.footer);
}

fn render_header(frame: &mut Frame<'_>, area: Rect, feed: &Feed, phase: &Phase) {
    let text = match phase {
        Phase::Loading => "Loading users...".to_string(),
        Phase::Failed(_) => String::new(),
        Phase::Empty | Phase::Ready => feed.header(),
    };
    frame.render_widget(Paragraph::new(text).bold(), area);

    if feed.is_loading_more() {
        frame.render_widget(
            Paragraph::new("Loading more...")
                .fg(ACCENT)
                .alignment(Alignment::Right),
            area,
        );
    }
}

/// Renders the cards of the window's virtual range, clipped to the viewport.
///
/// Cards are laid out in list coordinates on a scratch buffer that spans the whole range, then
/// the rows under the viewport are copied over. This keeps cards that straddle an edge intact
/// instead of squeezing them into the visible rows.
fn render_list(frame: &mut Frame<'_>, area: Rect, feed: &Feed) {
    let window = feed.window();
    let range = window.virtual_range();
    if range.is_empty() || area.is_empty() {
        return;
    }
    let first = window.item(range.start_index);
    let last = range.last_index().and_then(|i| window.item(i));
    let (Some(first), Some(last)) = (first, last) else {
        return;
    };

    let offset = window.scroll_offset();
    let base = first.start.min(offset);
    let span = u16::try_from(last.end() - base).unwrap_or(u16::MAX);
    let mut scratch = Buffer::empty(Rect::new(0, 0, area.width, span));

    window.for_each_virtual_item(|item| {
        let Some(rect) = slot_rect(&item, base, area.width, span) else {
            return;
        };
        match feed.item(item.index) {
            Some(user) if !item.is_placeholder() => render_card(user, rect, &mut scratch),
            _ => render_skeleton(rect, &mut scratch),
        }
    });

    let skip = u16::try_from(offset - base).unwrap_or(u16::MAX);
    blit_rows(&scratch, skip, frame.buffer_mut(), area);
}

/// The rect of `item` on a scratch buffer whose row 0 is list offset `base`.
fn slot_rect(item: &VirtualItem, base: u64, width: u16, span: u16) -> Option<Rect> {
    let y = u16::try_from(item.start.checked_sub(base)?).ok()?;
    if y >= span {
        return None;
    }
    let height = u16::try_from(item.size).unwrap_or(u16::MAX).min(span - y);
    Some(Rect::new(0, y, width, height))
}

/// Copies `dst_area.height` rows of `src`, starting at row `skip`, into `dst_area`.
fn blit_rows(src: &Buffer, skip: u16, dst: &mut Buffer, dst_area: Rect) {
    for y in 0..dst_area.height {
        let Some(sy) = skip.checked_add(y).filter(|sy| *sy < src.area.height) else {
            break;
        };
        for x in 0..dst_area.width.min(src.area.width) {
            if let (Some(cell), Some(target)) =
                (src.cell((x, sy)), dst.cell_mut((dst_area.x + x, dst_area.y + y)))
            {
                *target = cell.clone();
            }
        }
    }
}

fn card_block() -> Block<'static> {
    Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Style::new().fg(MUTED))
}

fn render_card(user: &UserRecord, area: Rect, buf: &mut Buffer) {
    let block = card_block();
    let inner = block.inner(area);
    block.render(area, buf);

    let label = Style::new().fg(MUTED);
    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" {} ", user.initials()),
                Style::new()
                    .fg(Color::Black)
                    .bg(ACCENT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(user.full_name(), Style::new().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!(" {} ", user.company.title),
                Style::new().fg(Color::Black).bg(Color::Blue),
            ),
        ]),
        Line::from(vec![
            Span::styled("Email       ", label),
            Span::raw(user.email.as_str()),
        ]),
        Line::from(vec![
            Span::styled("Phone       ", label),
            Span::raw(user.phone.as_str()),
        ]),
        Line::from(vec![
            Span::styled("University  ", label),
            Span::raw(user.university.as_str()),
        ]),
    ];
    Paragraph::new(lines).render(inner, buf);
}

fn render_skeleton(area: Rect, buf: &mut Buffer) {
    let block = card_block();
    let inner = block.inner(area);
    block.render(area, buf);

    let bar = |width: u16| -> Line<'static> {
        let width = usize::from(width.min(inner.width));
        Line::from("░".repeat(width)).fg(MUTED)
    };
    let w = inner.width;
    Paragraph::new(vec![bar(w / 2), bar(w / 3), bar(w / 4), bar(w / 3)]).render(inner, buf);
}

fn render_initial_skeletons(buf: &mut Buffer, area: Rect, item_height: u32) {
    let height = u16::try_from(item_height).unwrap_or(u16::MAX).max(1);
    for i in 0..INITIAL_SKELETONS {
        let Some(y) = i
            .checked_mul(height)
            .and_then(|dy| area.y.checked_add(dy))
            .filter(|y| *y < area.bottom())
        else {
            break;
        };
        let slot = Rect::new(area.x, y, area.width, height.min(area.bottom() - y));
        render_skeleton(slot, buf);
    }
}

fn render_message(
    frame: &mut Frame<'_>,
    area: Rect,
    title: Line<'static>,
    detail: String,
    action: &'static str,
) {
    let lines = vec![
        title,
        Line::from(""),
        Line::from(detail),
        Line::from(""),
        Line::from(action).fg(ACCENT),
    ];
    let height = (lines.len() as u16).min(area.height);
    let y = area.y + (area.height - height) / 2;
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        Rect::new(area.x, y, area.width, height),
    );
}

fn render_scrollbar(frame: &mut Frame<'_>, area: Rect, window: &Window) {
    if window.max_scroll_offset() == 0 {
        return;
    }
    let max = usize::try_from(window.max_scroll_offset()).unwrap_or(usize::MAX);
    let mut state = ScrollbarState::new(max)
        .viewport_content_length(window.viewport_height() as usize)
        .position(usize::try_from(window.scroll_offset()).unwrap_or(max));
    frame.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(None)
            .end_symbol(None)
            .thumb_style(Style::new().fg(ACCENT))
            .track_style(Style::new().fg(MUTED)),
        area,
        &mut state,
    );
}

fn render_inline_error(frame: &mut Frame<'_>, area: Rect, error: &FetchError) {
    let lines = vec![
        Line::from(vec![
            Span::styled(
                "Failed to load more users",
                Style::new().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(": {error}")),
        ]),
        Line::from(vec![
            Span::styled("[t]", Style::new().fg(ACCENT)),
            Span::raw(" Retry   "),
            Span::styled("[x]", Style::new().fg(ACCENT)),
            Span::raw(" Dismiss"),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_footer(frame: &mut Frame<'_>, area: Rect) {
    let key = Style::new().fg(ACCENT);
    let hints = [
        ("j/k", "scroll"),
        ("PgUp/PgDn", "page"),
        ("g/G", "top/bottom"),
        ("r", "refresh"),
        ("q", "quit"),
    ];
    let mut spans = Vec::with_capacity(hints.len() * 3);
    for (i, (k, what)) in hints.into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(k, key));
        spans.push(Span::styled(format!(" {what}"), Style::new().fg(MUTED)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
