//! UI rendering functions for the TUI.
//!
//! Layout: a query bar on top, the history list beside a detail panel in
//! the middle, a follow-up bar underneath, and a status/shortcut strip at
//! the bottom.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use time::format_description;

use crate::session::HistoryEntry;

use super::app::{App, Focus};

/// Main rendering function for the TUI.
pub fn draw(frame: &mut Frame, app: &App) {
    let size = frame.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Query input
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Follow-up input
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Shortcut bar
        ])
        .split(size);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(35), // History list
            Constraint::Percentage(65), // Detail view
        ])
        .split(main_chunks[1]);

    render_input_bar(
        frame,
        main_chunks[0],
        "Query (natural language)",
        app.query_input(),
        matches!(app.focus(), Focus::QueryInput),
    );
    render_history_list(frame, app, content_chunks[0]);
    render_detail_view(frame, app, content_chunks[1]);
    render_input_bar(
        frame,
        main_chunks[2],
        "Ask about the results",
        app.ask_input(),
        matches!(app.focus(), Focus::AskInput),
    );
    render_status_line(frame, app, main_chunks[3]);
    render_shortcut_bar(frame, app, main_chunks[4]);
}

/// Renders one of the two text input bars, with a cursor when focused.
fn render_input_bar(frame: &mut Frame, area: Rect, title: &str, value: &str, is_focused: bool) {
    let border_style = if is_focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .border_style(border_style);

    let mut content = value.to_string();
    if is_focused {
        content.push('█'); // Cursor indicator
    }

    frame.render_widget(Paragraph::new(content).block(block), area);
}

/// Renders the history list: one line per observation or insight.
fn render_history_list(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = matches!(app.focus(), Focus::History);
    let border_style = if is_focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title("History")
        .border_style(border_style);

    let time_format = format_description::parse("[hour]:[minute]").expect("valid time format");

    let items: Vec<ListItem> = app
        .history()
        .iter()
        .map(|entry| {
            let (label, stamp, color) = match entry {
                HistoryEntry::Observation { fetched_at, .. } => {
                    (entry.label(), *fetched_at, Color::White)
                }
                HistoryEntry::Insight { created_at, .. } => {
                    (entry.label(), *created_at, Color::Green)
                }
            };

            // Truncate on char boundaries; insight labels carry free text.
            let label = if label.chars().count() > 40 {
                let truncated: String = label.chars().take(40).collect();
                format!("{truncated}...")
            } else {
                label
            };

            let stamp_str = stamp
                .format(&time_format)
                .unwrap_or_else(|_| "??:??".to_string());

            ListItem::new(Line::from(vec![
                Span::styled(label, Style::default().fg(color)),
                Span::raw(" "),
                Span::styled(
                    format!("[{stamp_str}]"),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::REVERSED),
    );

    let mut list_state = ListState::default();
    list_state.select(app.selected_index());

    frame.render_stateful_widget(list, area, &mut list_state);
}

/// Renders the detail panel for the selected history entry.
///
/// Observations show the metric breakdown plus the NDVI image URL (the
/// terminal cannot display the raster, so the URL is surfaced verbatim).
/// Insights render the generated answer as markdown.
fn render_detail_view(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = matches!(app.focus(), Focus::Detail);
    let border_style = if is_focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Detail")
        .border_style(border_style);

    let content = match app.selected_entry() {
        Some(HistoryEntry::Observation { record, .. }) => {
            let mut text = Text::default();
            text.lines.push(Line::from(vec![Span::styled(
                format!("{} ({} {})", record.state, record.month, record.year),
                Style::default().add_modifier(Modifier::BOLD),
            )]));
            text.lines.push(Line::from(""));
            text.lines
                .push(metric_line("NDVI", format!("{}", record.ndvi_value)));
            text.lines.push(metric_line(
                "Temperature",
                format!("{}°C", record.temperature),
            ));
            text.lines
                .push(metric_line("Rainfall", format!("{}mm", record.rainfall)));
            text.lines.push(metric_line(
                "Soil moisture",
                format!("{}%", record.soilmoisture),
            ));
            text.lines.push(Line::from(""));
            text.lines.push(Line::from(record.summary()));
            text.lines.push(Line::from(""));
            text.lines.push(Line::from(vec![
                Span::styled("Image: ", Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(
                    record.ndvi_url.clone(),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
            text
        }
        Some(HistoryEntry::Insight {
            question, answer, ..
        }) => {
            let mut text = Text::default();
            text.lines.push(Line::from(vec![Span::styled(
                format!("Q: {question}"),
                Style::default().add_modifier(Modifier::BOLD),
            )]));
            text.lines.push(Line::from(""));
            let rendered = tui_markdown::from_str(answer);
            text.lines.extend(rendered.lines);
            text
        }
        None => Text::from("No entry selected. Run a query to get started."),
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll(), 0));

    frame.render_widget(paragraph, area);
}

fn metric_line(name: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{name}: "),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(value),
    ])
}

/// Renders the one-line status area (query outcomes, notices, errors).
fn render_status_line(frame: &mut Frame, app: &App, area: Rect) {
    let status = app.status().unwrap_or("");
    let paragraph = Paragraph::new(Span::styled(
        status.to_string(),
        Style::default().fg(Color::Yellow),
    ));
    frame.render_widget(paragraph, area);
}

/// Renders the shortcut bar at the bottom of the screen.
fn render_shortcut_bar(frame: &mut Frame, app: &App, area: Rect) {
    let key_style = Style::default().fg(Color::Green);
    let sep_style = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
        Span::styled("Ctrl+C", key_style),
        Span::raw(": quit"),
        Span::styled(" | ", sep_style),
        Span::styled("Tab", key_style),
        Span::raw(": next panel"),
        Span::styled(" | ", sep_style),
        Span::styled("Esc", key_style),
        Span::raw(": reset"),
    ];

    match app.focus() {
        Focus::QueryInput | Focus::AskInput => {
            spans.push(Span::styled(" | ", sep_style));
            spans.push(Span::styled("Enter", key_style));
            spans.push(Span::raw(": submit"));
        }
        Focus::History => {
            spans.push(Span::styled(" | ", sep_style));
            spans.push(Span::styled("j/k", key_style));
            spans.push(Span::raw(": navigate"));
            spans.push(Span::styled(" | ", sep_style));
            spans.push(Span::styled("q", key_style));
            spans.push(Span::raw(": quit"));
        }
        Focus::Detail => {
            spans.push(Span::styled(" | ", sep_style));
            spans.push(Span::styled("j/k", key_style));
            spans.push(Span::raw(": scroll"));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
