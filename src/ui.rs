use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};

use crate::app::App;
use crate::model::{DedupStatus, ToolbarButton};
use crate::nav::FocusDomain;

const BG: Color = Color::Rgb(14, 17, 12);
const PANEL: Color = Color::Rgb(26, 31, 22);
const ACCENT: Color = Color::Rgb(250, 204, 21);
const MUTED: Color = Color::Rgb(148, 163, 140);
const OK: Color = Color::Rgb(52, 211, 153);
const WARN: Color = Color::Rgb(251, 146, 60);
const ERROR: Color = Color::Rgb(248, 113, 113);

pub fn render(frame: &mut Frame, app: &App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_toolbar(frame, root[0], app);
    render_table(frame, root[1], app);
    render_status_bar(frame, root[2], app);

    if let Some(overlay) = app.logs_overlay() {
        render_logs_overlay(frame, &overlay.title, &overlay.content, overlay.scroll);
    }
    if app.show_help() {
        render_help_modal(frame);
    }
}

fn render_toolbar(frame: &mut Frame, area: Rect, app: &App) {
    let toolbar_focused = app.focus_domain() == FocusDomain::Toolbar;
    let highlighted = app.nav().highlighted_button();

    let mut spans = vec![Span::styled(" ", Style::default().bg(BG))];
    for (index, button) in app.buttons().iter().enumerate() {
        spans.push(button_span(
            button,
            toolbar_focused && highlighted == Some(index),
        ));
        spans.push(Span::styled("  ", Style::default().bg(BG)));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        area,
    );
}

fn button_span(button: &ToolbarButton, highlighted: bool) -> Span<'static> {
    let label = format!(" {} ", button.action.title());
    let style = if highlighted {
        Style::default()
            .bg(ACCENT)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    } else if button.enabled {
        Style::default().bg(PANEL).fg(Color::White)
    } else {
        Style::default().bg(BG).fg(MUTED).add_modifier(Modifier::DIM)
    };
    Span::styled(label, style)
}

fn render_table(frame: &mut Frame, area: Rect, app: &App) {
    let table_focused = app.focus_domain() == FocusDomain::Table;
    let store = app.nav().store();

    if app.table().is_empty() {
        let message = match &app.table().error {
            Some(error) => format!("No filesystems ({error})"),
            None => "No btrfs filesystems found.".to_string(),
        };
        frame.render_widget(
            Paragraph::new(message)
                .style(Style::default().bg(BG).fg(MUTED))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(" Filesystems ")
                        .style(Style::default().bg(BG)),
                ),
            area,
        );
        return;
    }

    let header = Row::new(vec![
        Cell::from("LABEL"),
        Cell::from("UUID"),
        Cell::from("STATUS"),
    ])
    .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .table()
        .rows
        .iter()
        .enumerate()
        .map(|(index, fs)| {
            let marker = if store.is_selected(index) { "▸" } else { " " };
            let mut style = Style::default().fg(Color::White);
            if store.is_selected(index) {
                style = style.fg(ACCENT);
            }
            Row::new(vec![
                Cell::from(format!("{marker} {}", fs.label)),
                Cell::from(fs.uuid.clone()),
                Cell::from(Span::styled(
                    fs.status.short_text(),
                    Style::default().fg(status_color(&fs.status)),
                )),
            ])
            .style(style)
        })
        .collect();

    let border_style = if table_focused {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(MUTED)
    };
    let refreshed = app
        .table()
        .last_refreshed
        .map(|at| format!(" Filesystems · {} ", at.format("%H:%M:%S")))
        .unwrap_or_else(|| " Filesystems ".to_string());

    let widget = Table::new(
        rows,
        [
            Constraint::Percentage(30),
            Constraint::Percentage(45),
            Constraint::Percentage(25),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(refreshed)
            .style(Style::default().bg(BG)),
    )
    .row_highlight_style(if table_focused {
        Style::default().bg(PANEL).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    });

    let mut state = TableState::default();
    if table_focused {
        state.select(store.highlight());
    }
    frame.render_stateful_widget(widget, area, &mut state);
}

fn status_color(status: &DedupStatus) -> Color {
    match status {
        DedupStatus::Deduplicating { .. } => OK,
        DedupStatus::NotRunning => MUTED,
        DedupStatus::FailedToRun => ERROR,
        DedupStatus::NotConfigured => WARN,
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let store = app.nav().store();
    let right = match store.highlight() {
        Some(index) => {
            let detail = app
                .table()
                .rows
                .get(index)
                .map(|fs| fs.status.text())
                .unwrap_or_default();
            format!("{} selected · {detail} ", store.selected().len())
        }
        None => String::new(),
    };

    let line = Line::from(vec![
        Span::styled(format!(" {}", app.status()), Style::default().fg(Color::White)),
        Span::raw(" "),
    ]);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(right.chars().count() as u16),
        ])
        .split(area);
    frame.render_widget(Paragraph::new(line).style(Style::default().bg(PANEL)), chunks[0]);
    frame.render_widget(
        Paragraph::new(right)
            .alignment(Alignment::Right)
            .style(Style::default().bg(PANEL).fg(MUTED)),
        chunks[1],
    );
}

fn render_logs_overlay(frame: &mut Frame, title: &str, content: &str, scroll: usize) {
    let area = centered_rect(frame.area(), 80, 80);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(content.to_string())
            .scroll((scroll as u16, 0))
            .wrap(Wrap { trim: false })
            .style(Style::default().bg(PANEL).fg(Color::White))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(ACCENT))
                    .title(format!(" {title} · Esc to close ")),
            ),
        area,
    );
}

fn render_help_modal(frame: &mut Frame) {
    let area = centered_rect(frame.area(), 70, 80);
    frame.render_widget(Clear, area);

    let lines: Vec<Line> = vec![
        help_heading("Table navigation"),
        help_line("↑ / ↓", "move the highlight; wraps past the first and last row"),
        help_line("Enter / Space", "add the highlighted filesystem to the selection"),
        help_line("Enter / Space again", "jump to the toolbar (after selecting)"),
        help_line("Shift+Enter", "select from the last selected row to the highlight"),
        help_line("Ctrl+A", "select all filesystems"),
        help_line("Ctrl+C", "copy UUIDs of the selection, one per line"),
        Line::default(),
        help_heading("Toolbar navigation"),
        help_line("→ / Tab, ← / Shift+Tab", "cycle buttons, skipping disabled ones"),
        help_line("Enter / Space", "activate the highlighted button"),
        help_line("↓ / Esc", "return to the table"),
        help_line("↑", "no effect in the toolbar"),
        Line::default(),
        help_heading("Escape and exit"),
        help_line("Esc (with selection)", "clear the selection"),
        help_line("Esc, Esc (no selection)", "exit — the second press confirms"),
        Line::default(),
        Line::from(Span::styled(
            "Highlight is the hover-like visual focus; selection is the set of rows an action operates on.",
            Style::default().fg(MUTED),
        )),
    ];

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .style(Style::default().bg(PANEL))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(ACCENT))
                    .title(" Keyboard navigation · any key to close "),
            ),
        area,
    );
}

fn help_heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    ))
}

fn help_line(keys: &str, what: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {keys:<24}"), Style::default().fg(Color::White)),
        Span::styled(what.to_string(), Style::default().fg(MUTED)),
    ])
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}
