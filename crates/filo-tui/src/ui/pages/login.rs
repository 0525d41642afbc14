use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, LoginFocus};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

/// Visible width of the username and password boxes
const FIELD_WIDTH: usize = 22;

/// Render the login page - the only page reachable without a session
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let height = if app.login_error.is_some() { 13 } else { 11 };
    let area = centered_rect_fixed(50, height, area);

    // Clear the area
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("          Sign in to Filo", styles::title_style())),
        Line::from(Span::styled(
            format!("          {}", app.config.base_url()),
            styles::muted_style(),
        )),
        Line::from(""),
    ];

    // Username field
    let username_focused = app.login_focus == LoginFocus::Username;
    lines.push(input_line(
        "Username",
        &visible_tail(&app.login_username),
        username_focused,
    ));

    // Password field
    let password_focused = app.login_focus == LoginFocus::Password;
    let password_masked = "*".repeat(app.login_password.chars().count().min(FIELD_WIDTH));
    lines.push(input_line("Password", &password_masked, password_focused));

    // Login button
    let button_focused = app.login_focus == LoginFocus::Button;
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let button_label = if button_focused { " ▶ Login ◀ " } else { "   Login   " };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("                ["),
        Span::styled(button_label, button_style),
        Span::raw("]"),
    ]));

    // Error message
    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn input_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { " " };
    Line::from(vec![
        Span::raw("    "),
        Span::styled(format!("{}: [", label), styles::muted_style()),
        Span::styled(format!("{:<FIELD_WIDTH$}{}", value, cursor), style),
        Span::styled("]", styles::muted_style()),
    ])
}

/// Last characters of a long value, so the cursor end stays visible
fn visible_tail(value: &str) -> String {
    let count = value.chars().count();
    value.chars().skip(count.saturating_sub(FIELD_WIDTH)).collect()
}
