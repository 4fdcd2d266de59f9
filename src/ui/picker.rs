//! Picker view
//!
//! Header with the breadcrumb trail, a filter input, the filtered list and a
//! status bar. Errors show as a popup over the list.

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, Paragraph},
};

use crate::models::ContentItem;
use crate::picker::{Picker, PickerMode, PickerState};
use crate::ui::Theme;

/// Draw the whole picker into `frame`
pub fn render(frame: &mut Frame, picker: &mut Picker) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], picker);
    render_filter(frame, chunks[1], picker);
    render_list(frame, chunks[2], picker);
    render_status_bar(frame, chunks[3], picker);

    if let PickerState::Error(message) = picker.state() {
        render_error_popup(frame, chunks[2], message);
    }
}

fn render_header(frame: &mut Frame, area: Rect, picker: &Picker) {
    let mut trail: Vec<&str> = picker.breadcrumbs();
    trail.push(picker.title());

    let line = Line::from(vec![
        Span::styled(" ♫ ", Theme::accent()),
        Span::styled(trail.join(" › "), Theme::title()),
        Span::styled(format!("  [{}]", mode_label(picker.mode())), Theme::dimmed()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_filter(frame: &mut Frame, area: Rect, picker: &Picker) {
    let line = Line::from(vec![
        Span::styled(picker.filter().to_string(), Theme::input()),
        Span::styled(" ", Theme::input_cursor()),
    ]);
    let input = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Theme::border())
            .title(Span::styled(" FILTER ", Theme::title())),
    );
    frame.render_widget(input, area);
}

fn render_list(frame: &mut Frame, area: Rect, picker: &mut Picker) {
    let visible_height = area.height.saturating_sub(2) as usize;
    picker.list_mut().scroll_into_view(visible_height);

    let title = match picker.state() {
        PickerState::Loading => " Loading... ".to_string(),
        _ if picker.items().is_empty() => " EMPTY ".to_string(),
        _ => format!(" {}/{} ", picker.list().selected + 1, picker.items().len()),
    };
    let title_style = if picker.state() == &PickerState::Loading {
        Theme::loading()
    } else {
        Theme::title()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border())
        .title(Span::styled(title, title_style));

    if picker.items().is_empty() {
        let empty = Paragraph::new("Nothing here")
            .style(Theme::dimmed())
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let list = picker.list();
    let rows: Vec<ListItem> = picker
        .items()
        .iter()
        .enumerate()
        .skip(list.offset)
        .take(visible_height)
        .map(|(i, item)| render_row(item, i == list.selected, picker.is_playable(item)))
        .collect();

    frame.render_widget(List::new(rows).block(block).style(Theme::text()), area);
}

fn render_row(item: &ContentItem, selected: bool, playable: bool) -> ListItem<'static> {
    let marker = if selected { "▸ " } else { "  " };
    let title_style = if selected {
        Theme::list_item_selected()
    } else if playable {
        Theme::text()
    } else {
        Theme::container()
    };

    let mut spans = vec![
        Span::styled(marker, if selected { Theme::accent() } else { Theme::dimmed() }),
        Span::styled(item.title.clone(), title_style),
    ];
    if !playable {
        spans.push(Span::styled("/", Theme::container()));
    }
    if let Some(artist) = item.artist() {
        spans.push(Span::styled(format!("  {}", artist), Theme::metadata()));
    }
    if let Some(ms) = item.duration_ms() {
        spans.push(Span::styled(format!("  {}", format_duration(ms)), Theme::metadata()));
    }

    ListItem::new(Line::from(spans))
}

fn render_status_bar(frame: &mut Frame, area: Rect, picker: &Picker) {
    let mut spans = Vec::new();
    if let Some(status) = picker.status() {
        spans.push(Span::styled(format!(" {} ", status), Theme::success()));
        spans.push(Span::raw("│"));
    }
    for (key, desc) in [
        ("enter", mode_label(picker.mode())),
        ("←", "back"),
        ("^A", "queue"),
        ("^D", "dequeue"),
        ("^X", "clear"),
        ("esc", "quit"),
    ] {
        spans.push(Span::styled(format!(" {}", key), Theme::keybind()));
        spans.push(Span::styled(format!(":{}", desc), Theme::keybind_desc()));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).style(Theme::status_bar()), area);
}

fn render_error_popup(frame: &mut Frame, area: Rect, error: &str) {
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 5.min(area.height);

    let popup_area = Rect {
        x: area.x + (area.width.saturating_sub(popup_width)) / 2,
        y: area.y + (area.height.saturating_sub(popup_height)) / 2,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let popup = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(error.to_string(), Theme::error())),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Theme::error())
            .title(Span::styled(" ✗ ERROR ", Theme::error()))
            .style(Style::default().bg(Theme::BACKGROUND)),
    );

    frame.render_widget(popup, popup_area);
}

fn mode_label(mode: PickerMode) -> &'static str {
    match mode {
        PickerMode::Play => "play",
        PickerMode::SaveFavorite => "save favorite",
        PickerMode::RemoveFavorite => "remove favorite",
        PickerMode::AddToQueue => "add to queue",
    }
}

/// Milliseconds as m:ss (or h:mm:ss)
pub fn format_duration(ms: u64) -> String {
    let secs = ms / 1000;
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}
