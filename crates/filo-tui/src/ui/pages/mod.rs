//! Page content rendering, one module per kind of page.

pub mod dashboard;
pub mod form;
pub mod login;
pub mod records;
