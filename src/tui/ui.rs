use super::App;
use crate::data::AggregatedTab;
use crate::panel::ActionState;
use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};
use unicode_width::UnicodeWidthChar;

mod icons {
    pub const ACTIVE: &str = "●";
    pub const PINNED: &str = "▴";
    pub const AUDIBLE: &str = "♪";
    pub const SEARCH: &str = "󰍉";
    pub const DUPLICATE: &str = "⧉";
}

const STATUS_KEYS: &str = "j/k: nav | /: search | Enter: focus | x: close | \
                           X: close dups | r: refresh | ?: help | q: quit";

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header/search
            Constraint::Min(0),    // Tab table
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_tabs(f, app, chunks[1]);
    draw_status_bar(f, app, chunks[2]);

    if app.show_help {
        draw_help_popup(f);
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let border_style = if app.search_mode {
        Style::default().fg(Color::Yellow)
    } else if app.is_loading() {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let block = Block::default().borders(Borders::ALL).border_style(border_style);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let text = if app.search_mode {
        Line::from(vec![
            Span::styled(format!("{} Search: ", icons::SEARCH), Style::default().fg(Color::Yellow)),
            Span::styled(
                app.panel.query().to_string(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        let summary = app.panel.summary();
        let mut spans = vec![
            Span::styled(
                "tabscope ",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("│ {} tabs ", summary.total)),
        ];
        if summary.duplicated_urls > 0 {
            spans.push(Span::styled(
                format!(
                    "│ {} {} duplicated URL(s), {} redundant ",
                    icons::DUPLICATE,
                    summary.duplicated_urls,
                    summary.redundant
                ),
                Style::default().fg(Color::Yellow),
            ));
        }
        if !app.panel.query().trim().is_empty() {
            spans.push(Span::styled(
                format!(
                    "│ filter \"{}\": {} shown ",
                    app.panel.query(),
                    app.panel.visible().len()
                ),
                Style::default().fg(Color::Cyan),
            ));
        }
        if let ActionState::InFlight(op) = app.panel.state() {
            spans.push(Span::styled(
                format!("{} {}...", app.spinner_char(), op.label()),
                Style::default().fg(Color::Cyan),
            ));
        }
        Line::from(spans)
    };

    f.render_widget(Paragraph::new(text).alignment(Alignment::Left), inner);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let url_width = url_column_width(app.config.ui.url_width);
    let show_time = app.config.ui.show_last_accessed;

    let mut headers = vec!["", "Dup", "URL", "Title"];
    let mut widths = vec![
        Constraint::Length(3),
        Constraint::Length(4),
        Constraint::Length(url_width),
        Constraint::Min(10),
    ];
    if show_time {
        headers.push("Last Accessed");
        widths.push(Constraint::Length(19));
    }

    let header = Row::new(headers.into_iter().map(Cell::from))
        .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .panel
        .visible()
        .iter()
        .map(|agg| build_row(agg, usize::from(url_width), show_time))
        .collect();

    let empty = rows.is_empty();
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(" Tabs "))
        .row_highlight_style(
            Style::default()
                .bg(Color::Rgb(40, 40, 60))
                .add_modifier(Modifier::BOLD),
        );

    let mut state = TableState::default().with_selected((!empty).then_some(app.selected));
    f.render_stateful_widget(table, area, &mut state);

    if empty && !app.is_loading() {
        let msg = if app.panel.query().trim().is_empty() {
            "No open tabs"
        } else {
            "No tabs match the search"
        };
        let inner = Rect {
            x: area.x + 2,
            y: area.y + 2,
            width: area.width.saturating_sub(4),
            height: 1,
        };
        f.render_widget(
            Paragraph::new(msg).style(Style::default().fg(Color::DarkGray)),
            inner,
        );
    }
}

/// URL column width: at least 8 columns, capped at what a terminal can address.
fn url_column_width(configured: usize) -> u16 {
    u16::try_from(configured.max(8)).unwrap_or(u16::MAX)
}

fn build_row(agg: &AggregatedTab, url_width: usize, show_time: bool) -> Row<'static> {
    let tab = &agg.tab;

    let mut flags = String::new();
    if tab.active {
        flags.push_str(icons::ACTIVE);
    }
    if tab.pinned {
        flags.push_str(icons::PINNED);
    }
    if tab.audible {
        flags.push_str(icons::AUDIBLE);
    }

    let dup_style = if agg.is_duplicated() {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut cells = vec![
        Cell::from(flags).style(Style::default().fg(Color::Green)),
        Cell::from(agg.group_size().to_string()).style(dup_style),
        Cell::from(truncate_to_width(&tab.url, url_width)).style(Style::default().fg(Color::Cyan)),
        Cell::from(tab.title.clone()),
    ];
    if show_time {
        cells.push(
            Cell::from(format_last_accessed(tab.last_accessed))
                .style(Style::default().fg(Color::DarkGray)),
        );
    }
    Row::new(cells)
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let origin = app
        .panel
        .snapshot()
        .map(|s| s.origin.label())
        .unwrap_or("-");

    let status = if let Some(err) = app.panel.error() {
        Span::styled(format!(" {} ", err), Style::default().fg(Color::Red))
    } else if app.search_mode {
        Span::styled(
            " Type to search | Enter: keep filter | Esc: cancel ",
            Style::default().fg(Color::Yellow),
        )
    } else {
        Span::styled(
            format!(" {} [{}] ", STATUS_KEYS, origin),
            Style::default().fg(Color::DarkGray),
        )
    };

    f.render_widget(Paragraph::new(Line::from(status)), area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = centered_rect(60, 70, f.area());
    f.render_widget(Clear, area);

    let key = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let entry = |k: &'static str, desc: &'static str| {
        Line::from(vec![Span::styled(format!("  {:<12}", k), key), Span::raw(desc)])
    };

    let lines = vec![
        Line::from(Span::styled("Navigation", Style::default().add_modifier(Modifier::BOLD))),
        entry("j / k", "Move down / up"),
        entry("gg / G", "First / last tab"),
        entry("Ctrl-d / u", "Page down / up"),
        Line::from(""),
        Line::from(Span::styled("Actions", Style::default().add_modifier(Modifier::BOLD))),
        entry("Enter / f", "Focus tab in the browser"),
        entry("x", "Close tab"),
        entry("X", "Close every tab with this URL"),
        entry("D", "Close the other tabs with this URL"),
        entry("r", "Refresh"),
        Line::from(""),
        Line::from(Span::styled("Search", Style::default().add_modifier(Modifier::BOLD))),
        entry("/", "Filter by title or URL"),
        entry("Esc", "Clear filter"),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "  {} active  {} pinned  {} playing audio",
                icons::ACTIVE,
                icons::PINNED,
                icons::AUDIBLE
            ),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Help ")
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Cut `s` to at most `width` display columns, marking the cut with `…`.
pub fn truncate_to_width(s: &str, width: usize) -> String {
    let total: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= width {
        return s.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Local-time rendering of a last-access timestamp; `-` when unknown.
pub fn format_last_accessed(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}
