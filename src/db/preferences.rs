use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use crate::models::Theme;

/// Key holding the `"dark"` / `"light"` flag.
const THEME_KEY: &str = "theme";
/// Key holding the JSON-encoded manual card order.
const CARD_ORDER_KEY: &str = "card_order";

fn get_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM preferences WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("failed to read preference '{key}'"))
}

fn set_value(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO preferences (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )
    .with_context(|| format!("failed to write preference '{key}'"))?;
    Ok(())
}

/// Persisted theme, or `None` when nothing (or something unrecognised) is
/// stored.
pub fn load_theme(conn: &Connection) -> Result<Option<Theme>> {
    Ok(get_value(conn, THEME_KEY)?.and_then(|value| Theme::parse(&value)))
}

pub fn save_theme(conn: &Connection, theme: Theme) -> Result<()> {
    set_value(conn, THEME_KEY, theme.as_str())
}

/// Saved manual order as a list of symbols. Undecodable data is logged and
/// reported as absent so the caller falls back to fetch order.
pub fn load_card_order(conn: &Connection) -> Result<Option<Vec<String>>> {
    let Some(raw) = get_value(conn, CARD_ORDER_KEY)? else {
        return Ok(None);
    };

    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(order) => Ok(Some(order)),
        Err(err) => {
            warn!(error = %err, "ignoring corrupt saved card order");
            Ok(None)
        }
    }
}

pub fn save_card_order(conn: &Connection, order: &[String]) -> Result<()> {
    let encoded = serde_json::to_string(order).context("failed to encode card order")?;
    set_value(conn, CARD_ORDER_KEY, &encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn memory_store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn theme_defaults_to_unset_and_persists() {
        let conn = memory_store();
        assert_eq!(load_theme(&conn).unwrap(), None);

        save_theme(&conn, Theme::Dark).unwrap();
        assert_eq!(load_theme(&conn).unwrap(), Some(Theme::Dark));

        save_theme(&conn, Theme::Light).unwrap();
        assert_eq!(load_theme(&conn).unwrap(), Some(Theme::Light));
    }

    #[test]
    fn unknown_theme_value_reads_as_unset() {
        let conn = memory_store();
        set_value(&conn, THEME_KEY, "sepia").unwrap();
        assert_eq!(load_theme(&conn).unwrap(), None);
    }

    #[test]
    fn card_order_round_trips_as_json() {
        let conn = memory_store();
        assert_eq!(load_card_order(&conn).unwrap(), None);

        let order: Vec<String> = ["ETH", "SOL", "BTC"].map(String::from).to_vec();
        save_card_order(&conn, &order).unwrap();
        assert_eq!(load_card_order(&conn).unwrap(), Some(order));

        let raw = get_value(&conn, CARD_ORDER_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"["ETH","SOL","BTC"]"#);
    }

    #[test]
    fn corrupt_card_order_is_ignored() {
        let conn = memory_store();
        set_value(&conn, CARD_ORDER_KEY, "{not json").unwrap();
        assert_eq!(load_card_order(&conn).unwrap(), None);

        set_value(&conn, CARD_ORDER_KEY, r#"{"BTC": 1}"#).unwrap();
        assert_eq!(load_card_order(&conn).unwrap(), None);
    }
}
