//! Core library surface for the CryptoMonitor terminal dashboard.
//!
//! The binary wires these pieces together; keeping them in a library lets the
//! list pipeline and the persistence helpers be exercised without a terminal.
pub mod api;
pub mod color;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod rates;
pub mod ui;

/// Price fetching and the seam the UI consumes it through.
pub use api::{FetchError, PriceClient, RateSource};

pub use config::Config;

/// Persistence entry point used by `main.rs`.
pub use db::ensure_schema;

/// Domain types other layers manipulate.
pub use models::{Rate, SortMode, Theme};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
