//! Persistence module split across logical submodules.

mod connection;
mod preferences;

pub use connection::{ensure_schema, init_schema};
pub use preferences::{load_card_order, load_theme, save_card_order, save_theme};
