//! Frame layout: title bar, page bar, page content, status bar and the
//! modal dialogs drawn over them.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use filo_core::auth::Route;

use crate::app::{App, AppState};

use super::pages::{dashboard, form, login, records};
use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let [title_area, pages_area, content_area, status_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(2),
        ])
        .areas(frame.area());

    render_title_bar(frame, app, title_area);
    render_page_bar(frame, app, pages_area);
    match app.route {
        Route::Login => login::render(frame, app, content_area),
        Route::Dashboard => dashboard::render(frame, app, content_area),
        _ => records::render(frame, app, content_area),
    }
    render_status_bar(frame, app, status_area);

    match app.state {
        AppState::ShowingHelp => render_help(frame),
        AppState::EditingRecord => form::render(frame, app),
        AppState::ConfirmingDelete => render_delete_confirm(frame, app),
        AppState::ConfirmingQuit => render_quit_confirm(frame),
        _ => {}
    }
}

/// Line with `left` flush left and `right` flush right across `width`
fn spread_line(left: Span<'static>, right: Span<'static>, width: u16) -> Line<'static> {
    let gap = (width as usize)
        .saturating_sub(left.content.chars().count())
        .saturating_sub(right.content.chars().count());
    Line::from(vec![left, Span::raw(" ".repeat(gap)), right])
}

fn bottom_rule() -> Block<'static> {
    Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style())
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let server = match app.route {
        Route::Login => String::from("[?] Help "),
        _ => format!("{}  [?] Help ", app.config.base_url()),
    };
    let line = spread_line(
        Span::styled("  Filo  Fleet Management", styles::title_style()),
        Span::styled(server, styles::muted_style()),
        area.width,
    );
    frame.render_widget(Paragraph::new(line).block(bottom_rule()), area);
}

fn render_page_bar(frame: &mut Frame, app: &App, area: Rect) {
    let spans: Vec<Span> = if app.route == Route::Login {
        vec![Span::raw(" "), Span::styled("Login", styles::active_page_style())]
    } else {
        let mut spans = vec![Span::raw(" ")];
        for (i, route) in Route::PAGES.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" | ", styles::muted_style()));
            }
            let style = if *route == app.route {
                styles::active_page_style()
            } else {
                styles::muted_style()
            };
            spans.push(Span::styled(format!("[{}] {}", i + 1, route.title()), style));
        }
        spans
    };
    frame.render_widget(Paragraph::new(Line::from(spans)).block(bottom_rule()), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.route {
        Route::Login => "Tab: next field | Enter: log in | Esc: quit ",
        Route::Dashboard => "[u]pdate | [L]ogout | [q]uit ",
        _ => "[n]ew | [e]dit | [d]elete | [/] search | [q]uit ",
    };

    let status = if let Some(toast) = &app.toast {
        Span::styled(format!(" {}", toast.message), styles::toast_style(toast.kind))
    } else if app.in_flight > 0 {
        Span::styled(" Loading...", styles::highlight_style())
    } else if app.is_authenticated() {
        Span::styled(" Logged in", styles::muted_style())
    } else {
        Span::styled(" Not logged in", styles::muted_style())
    };

    let line = spread_line(status, Span::styled(shortcuts, styles::muted_style()), area.width);
    frame.render_widget(Paragraph::new(line).style(styles::status_bar_style()), area);
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

/// Clear a centered box and draw `lines` inside a bordered block
fn render_dialog(frame: &mut Frame, width: u16, lines: Vec<Line<'static>>, border: Style) {
    let area = centered_rect_fixed(width, lines.len() as u16 + 2, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default().borders(Borders::ALL).border_style(border);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// "Press [Y] to <action>, [N] to cancel"
fn yes_no_line(action: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled("   Press ", styles::muted_style()),
        Span::styled("[Y]", styles::key_style()),
        Span::styled(format!(" to {}, ", action), styles::muted_style()),
        Span::styled("[N]", styles::key_style()),
        Span::styled(" to cancel", styles::muted_style()),
    ])
}

fn key_line(keys: &str, desc: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<12}", keys), styles::key_style()),
        Span::styled(desc.to_string(), styles::list_item_style()),
    ])
}

fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(format!(" {}", title), styles::highlight_style()))
}

fn render_help(frame: &mut Frame) {
    let lines = vec![
        Line::from(Span::styled("  Filo Fleet Management", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", env!("CARGO_PKG_VERSION")),
            styles::muted_style(),
        )),
        Line::from(""),
        section("Pages"),
        key_line("1-6", "Dashboard, Vehicles, Drivers, Tasks, ..."),
        key_line("←/→", "Previous/next page"),
        key_line("↑/↓ j/k", "Move in the table"),
        key_line("PgUp/PgDn", "Move by a screen"),
        key_line("Home/End", "First/last row"),
        Line::from(""),
        section("Records"),
        key_line("n", "New record"),
        key_line("e, Enter", "Edit selected record"),
        key_line("d, Del", "Delete selected record"),
        key_line("/", "Search this page"),
        key_line("u", "Reload this page"),
        Line::from(""),
        section("Session"),
        key_line("L", "Log out"),
        key_line("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled("       ? or Esc closes this window", styles::muted_style())),
    ];
    render_dialog(frame, 54, lines, styles::border_style(true));
}

fn render_delete_confirm(frame: &mut Frame, app: &App) {
    let Some(pending) = &app.pending_delete else {
        return;
    };
    let question = format!(
        "   Delete {} \"{}\"?",
        pending.resource.noun().to_lowercase(),
        pending.label
    );
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(question, styles::highlight_style())),
        Line::from(Span::styled("   This cannot be undone.", styles::muted_style())),
        Line::from(""),
        yes_no_line("delete"),
    ];
    render_dialog(frame, 54, lines, styles::error_style());
}

fn render_quit_confirm(frame: &mut Frame) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("   Quit Filo?", styles::highlight_style())),
        Line::from(""),
        yes_no_line("quit"),
    ];
    render_dialog(frame, 46, lines, styles::border_style(true));
}
