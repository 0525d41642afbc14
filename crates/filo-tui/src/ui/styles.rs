//! Color palette and text styles shared by every page.

use ratatui::style::{Color, Modifier, Style};

use crate::app::ToastKind;

// Palette
pub const PRIMARY: Color = Color::Rgb(46, 134, 171);
pub const SUCCESS: Color = Color::Rgb(88, 166, 92);
pub const ACCENT: Color = Color::Rgb(230, 170, 60);
pub const DANGER: Color = Color::Rgb(204, 72, 72);
pub const MUTED: Color = Color::Rgb(120, 124, 130);
pub const SELECTION_BG: Color = Color::Rgb(40, 52, 66);
pub const BAR_BG: Color = Color::Rgb(26, 30, 36);

fn fg(color: Color) -> Style {
    Style::default().fg(color)
}

fn bold(style: Style) -> Style {
    style.add_modifier(Modifier::BOLD)
}

pub fn title_style() -> Style {
    bold(fg(PRIMARY))
}

pub fn selected_style() -> Style {
    bold(Style::default().bg(SELECTION_BG))
}

pub fn list_item_style() -> Style {
    fg(Color::White)
}

pub fn muted_style() -> Style {
    fg(MUTED)
}

pub fn highlight_style() -> Style {
    fg(ACCENT)
}

pub fn error_style() -> Style {
    fg(DANGER)
}

pub fn toast_style(kind: ToastKind) -> Style {
    match kind {
        ToastKind::Success => bold(fg(SUCCESS)),
        ToastKind::Error => bold(fg(DANGER)),
    }
}

/// Current page in the page bar
pub fn active_page_style() -> Style {
    bold(fg(PRIMARY)).add_modifier(Modifier::UNDERLINED)
}

pub fn border_style(focused: bool) -> Style {
    fg(if focused { PRIMARY } else { MUTED })
}

/// Value of a form field; the focused one sits on the selection color
pub fn field_style(focused: bool) -> Style {
    if focused {
        fg(Color::White).bg(SELECTION_BG)
    } else {
        list_item_style()
    }
}

pub fn search_style() -> Style {
    fg(ACCENT)
}

pub fn status_bar_style() -> Style {
    fg(Color::White).bg(BAR_BG)
}

pub fn key_style() -> Style {
    bold(fg(ACCENT))
}
