//! Terminal UI module using ratatui.
//!
//! This module provides the TUI rendering and input handling:
//!
//! - `render`: Main frame rendering, layout and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color schemes and text styling
//! - `pages`: Page content rendering (login, dashboard, record tables, forms)

pub mod input;
pub mod pages;
pub mod render;
pub mod styles;
