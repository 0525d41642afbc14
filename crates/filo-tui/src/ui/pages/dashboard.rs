use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use filo_core::utils::{format_date, truncate};

use crate::app::App;
use crate::ui::styles;

/// Longest activity description shown before truncating
const MAX_ACTIVITY_LEN: usize = 120;

/// Render the Dashboard page - summary counters and the activity feed
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    render_stats(frame, app, chunks[0]);
    render_activities(frame, app, chunks[1]);
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Overview ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if app.stats.is_empty() {
        let message = if app.in_flight > 0 { "Loading..." } else { "No statistics available" };
        frame.render_widget(
            Paragraph::new(Span::styled(message, styles::muted_style())).block(block),
            area,
        );
        return;
    }

    let rows: Vec<Row> = app
        .stats
        .entries()
        .into_iter()
        .map(|(label, value)| {
            Row::new(vec![
                Cell::from(label).style(styles::list_item_style()),
                Cell::from(value).style(styles::highlight_style()),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Fill(2), Constraint::Fill(1)]).block(block);
    frame.render_widget(table, area);
}

fn render_activities(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![];

    if app.activities.is_empty() {
        lines.push(Line::from(Span::styled("No recent activity", styles::muted_style())));
    }

    for activity in &app.activities {
        let when = activity
            .timestamp
            .as_deref()
            .map(format_date)
            .unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled(format!("{:<12}", when), styles::muted_style()),
            Span::raw(truncate(&activity.description, MAX_ACTIVITY_LEN)),
        ]));
    }

    let block = Block::default()
        .title(" Recent Activity ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}
