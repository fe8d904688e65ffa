//! Price API client. One GET retrieves the fiat price of every tracked asset;
//! the rest of the application only ever sees the derived [`Rate`] list.

use std::collections::HashMap;

use reqwest::blocking::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::models::{
    Asset, Rate, DEFAULT_ASSETS, FIAT_CURRENCY, REFERENCE_ASSET_ID, REFERENCE_SYMBOL,
};

/// Everything that can go wrong while producing a rate list.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport, timeout or body decoding failure from reqwest.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("price API error: {status} {reason}")]
    Status { status: u16, reason: String },

    /// The reference coin is absent or priced at zero, so no secondary
    /// price can be derived.
    #[error("unable to fetch {0} price")]
    MissingReferencePrice(String),

    #[error("no rates could be fetched")]
    NoRates,
}

impl FetchError {
    /// Message shown to the user for any failed fetch.
    pub fn user_message(&self) -> String {
        format!("Failed to fetch cryptocurrency rates: {self}")
    }
}

/// Fiat quote for a single asset as returned by `/simple/price`.
#[derive(Debug, Clone, Deserialize)]
pub struct FiatQuote {
    #[serde(default)]
    pub usd: Option<f64>,
}

/// Raw response body: asset id to quote.
pub type PriceTable = HashMap<String, FiatQuote>;

/// Anything able to produce a fresh rate list. The TUI only talks to this
/// trait so tests can substitute canned data for the network.
pub trait RateSource: Send + Sync {
    fn fetch_rates(&self) -> Result<Vec<Rate>, FetchError>;
}

/// Blocking HTTP client for the price API.
#[derive(Debug, Clone)]
pub struct PriceClient {
    http: Client,
    base_url: String,
    assets: &'static [Asset],
}

impl PriceClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(config.api_timeout).build()?;
        Ok(Self {
            http,
            base_url: config.api_url.clone(),
            assets: DEFAULT_ASSETS,
        })
    }

    /// Batch URL covering every tracked asset.
    pub fn price_url(&self) -> String {
        let ids = self
            .assets
            .iter()
            .map(|asset| asset.id)
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}/simple/price?ids={ids}&vs_currencies={FIAT_CURRENCY}",
            self.base_url
        )
    }
}

impl RateSource for PriceClient {
    fn fetch_rates(&self) -> Result<Vec<Rate>, FetchError> {
        let url = self.price_url();
        info!(%url, "fetching prices");

        let response = self.http.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let table: PriceTable = response.json()?;
        debug!(entries = table.len(), "price response decoded");

        let rates = rates_from_prices(self.assets, &table)?;
        info!(count = rates.len(), "rates fetched");
        Ok(rates)
    }
}

/// Usable price for `id`, treating absent, zero, negative and non-finite
/// values alike.
fn price_for(table: &PriceTable, id: &str) -> Option<f64> {
    table
        .get(id)
        .and_then(|quote| quote.usd)
        .filter(|price| price.is_finite() && *price > 0.0)
}

/// Convert a price table into rates in catalogue order. Assets without a
/// usable price are skipped; a missing reference price or an empty result
/// fails the whole batch.
pub fn rates_from_prices(assets: &[Asset], table: &PriceTable) -> Result<Vec<Rate>, FetchError> {
    let reference = price_for(table, REFERENCE_ASSET_ID)
        .ok_or_else(|| FetchError::MissingReferencePrice(REFERENCE_SYMBOL.to_string()))?;

    let rates: Vec<Rate> = assets
        .iter()
        .filter_map(|asset| match price_for(table, asset.id) {
            Some(price) => Some(Rate::new(asset.symbol, asset.name, price, price / reference)),
            None => {
                debug!(symbol = asset.symbol, "skipping asset without a price");
                None
            }
        })
        .collect();

    if rates.is_empty() {
        return Err(FetchError::NoRates);
    }
    Ok(rates)
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};
    use std::time::{Duration, Instant};

    use super::*;

    fn table(entries: &[(&str, Option<f64>)]) -> PriceTable {
        entries
            .iter()
            .map(|(id, usd)| (id.to_string(), FiatQuote { usd: *usd }))
            .collect()
    }

    const ASSETS: &[Asset] = &[
        Asset { symbol: "BTC", name: "Bitcoin", id: "bitcoin" },
        Asset { symbol: "ETH", name: "Ethereum", id: "ethereum" },
        Asset { symbol: "SOL", name: "Solana", id: "solana" },
    ];

    #[test]
    fn derives_reference_prices_in_catalogue_order() {
        let prices = table(&[
            ("solana", Some(150.0)),
            ("bitcoin", Some(50_000.0)),
            ("ethereum", Some(2_500.0)),
        ]);

        let rates = rates_from_prices(ASSETS, &prices).unwrap();
        let symbols: Vec<_> = rates.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, ["BTC", "ETH", "SOL"]);
        assert_eq!(rates[0].price_btc, 1.0);
        assert!((rates[1].price_btc - 0.05).abs() < 1e-12);
        assert!((rates[2].price_btc - 0.003).abs() < 1e-12);
    }

    #[test]
    fn skips_assets_without_a_usable_price() {
        let prices = table(&[
            ("bitcoin", Some(50_000.0)),
            ("ethereum", Some(0.0)),
            ("solana", None),
        ]);

        let rates = rates_from_prices(ASSETS, &prices).unwrap();
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].symbol, "BTC");
    }

    #[test]
    fn missing_reference_price_fails_the_batch() {
        let prices = table(&[("ethereum", Some(2_500.0))]);
        let err = rates_from_prices(ASSETS, &prices).unwrap_err();
        assert!(matches!(err, FetchError::MissingReferencePrice(ref s) if s == "BTC"));
        assert_eq!(
            err.user_message(),
            "Failed to fetch cryptocurrency rates: unable to fetch BTC price"
        );

        let zero = table(&[("bitcoin", Some(0.0)), ("ethereum", Some(2_500.0))]);
        assert!(matches!(
            rates_from_prices(ASSETS, &zero),
            Err(FetchError::MissingReferencePrice(_))
        ));
    }

    #[test]
    fn empty_result_is_an_error() {
        let only_reference = &[Asset { symbol: "ETH", name: "Ethereum", id: "ethereum" }];
        let prices = table(&[("bitcoin", Some(50_000.0))]);
        assert!(matches!(
            rates_from_prices(only_reference, &prices),
            Err(FetchError::NoRates)
        ));
    }

    #[test]
    fn decodes_the_simple_price_body() {
        let body = r#"{"bitcoin":{"usd":50000},"ethereum":{"usd":2500.5},"solana":{}}"#;
        let prices: PriceTable = serde_json::from_str(body).unwrap();
        let rates = rates_from_prices(ASSETS, &prices).unwrap();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[1].price_usd, 2500.5);
    }

    #[test]
    fn price_url_batches_every_asset() {
        let config = Config {
            api_url: "http://localhost:9000/api/v3".to_string(),
            ..Config::default()
        };
        let client = PriceClient::new(&config).unwrap();
        let url = client.price_url();
        assert!(url.starts_with("http://localhost:9000/api/v3/simple/price?ids=bitcoin,ethereum,"));
        assert!(url.ends_with("uniswap&vs_currencies=usd"));
    }

    /// Answer a single request with `status` and `body`, handing back the
    /// request line the client sent.
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}/api/v3", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::<u8>::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let read = stream.read(&mut chunk).unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..read]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            let request = String::from_utf8_lossy(&request).into_owned();
            request.lines().next().unwrap_or_default().to_string()
        });
        (base_url, handle)
    }

    fn client_for(api_url: String, timeout: Duration) -> PriceClient {
        let config = Config {
            api_url,
            api_timeout: timeout,
            ..Config::default()
        };
        PriceClient::new(&config).unwrap()
    }

    #[test]
    fn server_error_maps_to_status() {
        let (url, server) = serve_once("500 Internal Server Error", "{}");
        let client = client_for(url, Duration::from_secs(5));

        let err = client.fetch_rates().unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, FetchError::Status { status: 500, .. }));
        assert_eq!(
            err.user_message(),
            "Failed to fetch cryptocurrency rates: price API error: 500 Internal Server Error"
        );
    }

    #[test]
    fn fetch_decodes_the_response_and_skips_null_prices() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"bitcoin":{"usd":50000},"ethereum":{"usd":2500},"solana":{"usd":null}}"#,
        );
        let client = client_for(url, Duration::from_secs(5));

        let rates = client.fetch_rates().unwrap();
        let request_line = server.join().unwrap();
        assert!(request_line.starts_with("GET /api/v3/simple/price?ids=bitcoin,ethereum,"));
        assert!(request_line.ends_with("&vs_currencies=usd HTTP/1.1"));

        let symbols: Vec<_> = rates.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, ["BTC", "ETH"]);
        assert!((rates[1].price_btc - 0.05).abs() < 1e-12);
    }

    #[test]
    fn silent_server_hits_the_configured_timeout() {
        // Connections complete in the backlog but never get a response.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api/v3", listener.local_addr().unwrap());
        let client = client_for(url, Duration::from_millis(200));

        let started = Instant::now();
        let result = client.fetch_rates();
        assert!(matches!(result, Err(FetchError::Http(_))));
        assert!(started.elapsed() < Duration::from_secs(3));
        drop(listener);
    }
}
