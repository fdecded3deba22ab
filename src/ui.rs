//! Dashboard widgets: process table, shell pane and log pane.

pub mod dashboard;
pub mod shell;
pub mod state;
pub mod table;
pub mod theme;
