//! Domain types shared by the fetch layer, the list pipeline and the TUI. They
//! stay plain data holders so the other layers can focus on presentation and
//! persistence.

use std::fmt;

/// Static catalogue entry describing one tracked asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    /// Short uppercase ticker shown on the card.
    pub symbol: &'static str,
    /// Human readable name, used for sorting and search.
    pub name: &'static str,
    /// Identifier understood by the price API.
    pub id: &'static str,
}

/// API identifier of the reference coin every secondary price is expressed in.
pub const REFERENCE_ASSET_ID: &str = "bitcoin";
/// Ticker of the reference coin, used in error messages and card labels.
pub const REFERENCE_SYMBOL: &str = "BTC";
/// Fiat currency requested from the price API.
pub const FIAT_CURRENCY: &str = "usd";

/// Assets requested on every fetch, in the order cards appear before any
/// manual reordering.
pub const DEFAULT_ASSETS: &[Asset] = &[
    Asset { symbol: "BTC", name: "Bitcoin", id: "bitcoin" },
    Asset { symbol: "ETH", name: "Ethereum", id: "ethereum" },
    Asset { symbol: "SOL", name: "Solana", id: "solana" },
    Asset { symbol: "ADA", name: "Cardano", id: "cardano" },
    Asset { symbol: "DOT", name: "Polkadot", id: "polkadot" },
    Asset { symbol: "AVAX", name: "Avalanche", id: "avalanche-2" },
    Asset { symbol: "MATIC", name: "Polygon", id: "matic-network" },
    Asset { symbol: "XRP", name: "Ripple", id: "ripple" },
    Asset { symbol: "DOGE", name: "Dogecoin", id: "dogecoin" },
    Asset { symbol: "LTC", name: "Litecoin", id: "litecoin" },
    Asset { symbol: "LINK", name: "Chainlink", id: "chainlink" },
    Asset { symbol: "UNI", name: "Uniswap", id: "uniswap" },
];

/// One asset's price record. Rates are replaced wholesale on refresh and only
/// ever reordered, never edited in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Rate {
    pub symbol: String,
    pub name: String,
    /// Price in the fiat reference unit. Always positive.
    pub price_usd: f64,
    /// `price_usd` divided by the reference coin's fiat price.
    pub price_btc: f64,
}

impl Rate {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        price_usd: f64,
        price_btc: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            price_usd,
            price_btc,
        }
    }

    /// Case-insensitive substring match against the name or the symbol.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.symbol.to_lowercase().contains(needle)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.symbol)
    }
}

/// How the visible card list is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Manual order, exactly as the user arranged the cards.
    #[default]
    Default,
    Name,
    PriceAsc,
    PriceDesc,
}

impl SortMode {
    const ALL: [SortMode; 4] = [
        SortMode::Default,
        SortMode::Name,
        SortMode::PriceAsc,
        SortMode::PriceDesc,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortMode::Default => "Manual order",
            SortMode::Name => "Sort by Name",
            SortMode::PriceAsc => "Price: Low to High",
            SortMode::PriceDesc => "Price: High to Low",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|mode| *mode == self).unwrap_or(0)
    }

    /// Next mode in selector order, wrapping around.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Light or dark presentation, persisted between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Parse the persisted flag. Anything other than the two known values is
    /// treated as unset.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        matches!(self, Theme::Dark)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_mode_cycles_through_all_modes() {
        let mut mode = SortMode::Default;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(mode);
            mode = mode.next();
        }
        assert_eq!(mode, SortMode::Default);
        assert_eq!(
            seen,
            vec![SortMode::Default, SortMode::Name, SortMode::PriceAsc, SortMode::PriceDesc]
        );
        assert_eq!(SortMode::Default.previous(), SortMode::PriceDesc);
    }

    #[test]
    fn theme_round_trips_through_its_flag() {
        assert_eq!(Theme::parse("dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse(Theme::Light.as_str()), Some(Theme::Light));
        assert_eq!(Theme::parse("solarized"), None);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }

    #[test]
    fn rate_matches_name_or_symbol() {
        let rate = Rate::new("ETH", "Ethereum", 2500.0, 0.05);
        assert!(rate.matches("eth"));
        assert!(rate.matches("reum"));
        assert!(!rate.matches("btc"));
    }

    #[test]
    fn catalogue_symbols_are_unique() {
        let mut symbols: Vec<_> = DEFAULT_ASSETS.iter().map(|asset| asset.symbol).collect();
        symbols.sort_unstable();
        symbols.dedup();
        assert_eq!(symbols.len(), DEFAULT_ASSETS.len());
        assert_eq!(DEFAULT_ASSETS[0].id, REFERENCE_ASSET_ID);
    }
}
