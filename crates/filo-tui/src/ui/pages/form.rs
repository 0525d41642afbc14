use ratatui::{
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use filo_core::models::FieldKind;

use crate::app::App;
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

const MODAL_WIDTH: u16 = 64;

/// Render the create/edit modal over the current page
pub fn render(frame: &mut Frame, app: &App) {
    let Some(form) = &app.form else {
        return;
    };

    let error_lines = form.error.as_ref().map_or(0, |e| e.lines().count() + 1);
    let height = (form.fields.len() + error_lines + 6) as u16;
    let area = centered_rect_fixed(MODAL_WIDTH, height, frame.area());
    frame.render_widget(Clear, area);

    let label_width = form.fields.iter().map(|f| f.label.len()).max().unwrap_or(0) + 2;
    let mut lines = vec![Line::from("")];

    for (i, (field, value)) in form.fields.iter().zip(form.values.iter()).enumerate() {
        let focused = i == form.focus;
        let marker = if field.required { "*" } else { " " };
        let shown = app.form_display_value(field, value);
        let shown = match field.kind {
            FieldKind::Choice(_) | FieldKind::VehicleRef | FieldKind::DriverRef if focused => {
                format!("◀ {} ▶", shown)
            }
            FieldKind::Flag => shown,
            _ if focused => format!("{}▌", shown),
            _ => shown,
        };

        lines.push(Line::from(vec![
            Span::styled(format!(" {}", marker), styles::error_style()),
            Span::styled(
                format!("{:<label_width$}", format!("{}:", field.label)),
                if focused { styles::highlight_style() } else { styles::muted_style() },
            ),
            Span::styled(shown, styles::field_style(focused)),
        ]));
    }

    if let Some(error) = &form.error {
        lines.push(Line::from(""));
        for line in error.lines() {
            lines.push(Line::from(Span::styled(format!("  {}", line), styles::error_style())));
        }
    }

    lines.push(Line::from(""));
    let footer = if form.saving {
        Line::from(Span::styled("  Saving...", styles::highlight_style()))
    } else {
        Line::from(vec![
            Span::styled("  Enter", styles::key_style()),
            Span::styled(" save  ", styles::muted_style()),
            Span::styled("Tab/↑↓", styles::key_style()),
            Span::styled(" move  ", styles::muted_style()),
            Span::styled("←/→", styles::key_style()),
            Span::styled(" pick  ", styles::muted_style()),
            Span::styled("Space", styles::key_style()),
            Span::styled(" toggle  ", styles::muted_style()),
            Span::styled("Esc", styles::key_style()),
            Span::styled(" cancel", styles::muted_style()),
        ])
    };
    lines.push(footer);

    let block = Block::default()
        .title(format!(" {} ", form.title()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}
