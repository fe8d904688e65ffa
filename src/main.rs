//! Binary entry point: read configuration, route logs to a file, open the
//! preference store, and drive the Ratatui event loop until the user exits.
use std::sync::Arc;

use crypto_monitor::{ensure_schema, logging, run_app, App, Config, PriceClient};
use tracing::info;

/// Initialize configuration, logging and persistence, start the first fetch
/// in the background, and launch the dashboard.
///
/// Fatal initialization problems (an unwritable data directory, a terminal
/// that refuses raw mode) bubble up to the shell instead of crashing silently.
fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    logging::init(&config.log_path())?;
    info!(api_url = %config.api_url, data_dir = %config.data_dir.display(), "starting");

    let conn = ensure_schema(&config.db_path())?;
    let source = PriceClient::new(&config)?;

    let mut app = App::new(conn, Arc::new(source), config.default_theme)?;
    app.start_refresh();
    run_app(&mut app)
}
