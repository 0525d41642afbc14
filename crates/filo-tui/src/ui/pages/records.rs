use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::app::{App, AppState};
use crate::ui::styles;

/// Render a record page - searchable table with a detail panel
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let searching = app.state == AppState::Searching || !app.search_query.is_empty();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(if searching {
            vec![Constraint::Length(3), Constraint::Min(5)]
        } else {
            vec![Constraint::Length(0), Constraint::Min(5)]
        })
        .split(area);

    if searching {
        render_search_bar(frame, app, rows[0]);
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(rows[1]);

    render_table(frame, app, chunks[0]);
    render_detail(frame, app, chunks[1]);
}

fn render_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let active = app.state == AppState::Searching;
    let cursor = if active { "▌" } else { "" };
    let line = Line::from(vec![
        Span::styled(" / ", styles::search_style()),
        Span::styled(format!("{}{}", app.search_query, cursor), styles::list_item_style()),
    ]);
    let block = Block::default()
        .title(" Search ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(active));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let columns = app.page_columns();
    let page_rows = app.page_rows();

    let header = Row::new(columns.iter().map(|c| Cell::from(*c)))
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = page_rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if i == app.selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Row::new(row.cells.iter().map(|c| Cell::from(c.as_str()))).style(style)
        })
        .collect();

    // First column carries the record name and gets the extra room
    let widths: Vec<Constraint> = (0..columns.len())
        .map(|i| if i == 0 { Constraint::Fill(2) } else { Constraint::Fill(1) })
        .collect();

    let count = if page_rows.len() == app.page_total() {
        page_rows.len().to_string()
    } else {
        format!("{}/{}", page_rows.len(), app.page_total())
    };
    let title = format!(" {} ({}) ", app.route.title(), count);

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(app.state == AppState::Normal)),
        )
        .row_highlight_style(styles::selected_style());

    if page_rows.is_empty() {
        let message = if app.in_flight > 0 {
            "Loading..."
        } else if app.search_query.is_empty() {
            "No records yet. Press [n] to add one."
        } else {
            "No records match the search."
        };
        frame.render_widget(table, area);
        let inner = Rect::new(area.x + 2, area.y + 2, area.width.saturating_sub(4), 1);
        frame.render_widget(Paragraph::new(Span::styled(message, styles::muted_style())), inner);
        return;
    }

    let mut state = TableState::default();
    state.select(Some(app.selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![];

    match app.selected_record_fields() {
        Some((fields, values)) => {
            let width = fields.iter().map(|f| f.label.len()).max().unwrap_or(0) + 2;
            for (field, value) in fields.iter().zip(values.iter()) {
                let shown = app.form_display_value(field, value);
                let shown = if shown.is_empty() { "-".to_string() } else { shown };
                lines.push(Line::from(vec![
                    Span::styled(format!("{:<width$}", format!("{}:", field.label)), styles::muted_style()),
                    Span::raw(shown),
                ]));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "[e]dit  [d]elete",
                styles::muted_style(),
            )));
        }
        None => lines.push(Line::from(Span::styled("Nothing selected", styles::muted_style()))),
    }

    let block = Block::default()
        .title(" Details ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}
