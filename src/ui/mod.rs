//! Ratatui front-end: the card grid, its header and footer, and the event
//! loop driving them.

mod app;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
