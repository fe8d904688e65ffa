//! Pure list transforms over rates: the three sorts, the search filter, and
//! the manual-order helpers used by drag and drop. Every function returns a
//! fresh vector and leaves its input untouched.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::{Rate, SortMode};

/// Identity pass-through. Keeps the manual (drag) order intact.
pub fn sort_by_default(rates: &[Rate]) -> Vec<Rate> {
    rates.to_vec()
}

/// Case-insensitive name order. Names that only differ in case fall back to
/// the raw text so the ordering is total; the sort is stable on full ties.
///
/// This is not locale collation: lowercase names compare by code point, so
/// accented names such as `Éther` sort after every ASCII name. The bundled
/// asset catalogue is all ASCII.
pub fn sort_by_name(rates: &[Rate]) -> Vec<Rate> {
    let mut sorted = rates.to_vec();
    sorted.sort_by(|a, b| compare_names(&a.name, &b.name));
    sorted
}

fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = a.to_lowercase().cmp(&b.to_lowercase());
    if folded != Ordering::Equal {
        return folded;
    }
    a.cmp(b)
}

/// Order by fiat price, highest first unless `ascending`. Equal prices keep
/// their relative order.
pub fn sort_by_price(rates: &[Rate], ascending: bool) -> Vec<Rate> {
    let mut sorted = rates.to_vec();
    sorted.sort_by(|a, b| {
        let order = a.price_usd.total_cmp(&b.price_usd);
        if ascending {
            order
        } else {
            order.reverse()
        }
    });
    sorted
}

/// Keep rates whose name or symbol contains `query`, ignoring case. The query
/// is matched as typed, surrounding spaces included; an empty query keeps
/// everything.
pub fn filter_rates(rates: &[Rate], query: &str) -> Vec<Rate> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return rates.to_vec();
    }
    rates
        .iter()
        .filter(|rate| rate.matches(&needle))
        .cloned()
        .collect()
}

/// The view the grid renders: filter first, then sort.
pub fn visible_rates(rates: &[Rate], query: &str, mode: SortMode) -> Vec<Rate> {
    let filtered = filter_rates(rates, query);
    match mode {
        SortMode::Default => sort_by_default(&filtered),
        SortMode::Name => sort_by_name(&filtered),
        SortMode::PriceAsc => sort_by_price(&filtered, true),
        SortMode::PriceDesc => sort_by_price(&filtered, false),
    }
}

/// Remove the element at `from` and reinsert it at `to`. Out-of-range
/// indices return the list unchanged.
pub fn move_rate(rates: &[Rate], from: usize, to: usize) -> Vec<Rate> {
    let mut moved = rates.to_vec();
    if from >= moved.len() || to >= moved.len() || from == to {
        return moved;
    }
    let rate = moved.remove(from);
    moved.insert(to, rate);
    moved
}

/// Drop `active` where `over` currently sits, resolving both symbols in the
/// full list. `None` when nothing would change.
pub fn reorder_by_symbol(rates: &[Rate], active: &str, over: &str) -> Option<Vec<Rate>> {
    if active == over {
        return None;
    }
    let from = rates.iter().position(|rate| rate.symbol == active)?;
    let to = rates.iter().position(|rate| rate.symbol == over)?;
    Some(move_rate(rates, from, to))
}

/// Symbols in list order, the form the manual order is persisted in.
pub fn symbol_order(rates: &[Rate]) -> Vec<String> {
    rates.iter().map(|rate| rate.symbol.clone()).collect()
}

/// Arrange `rates` by a previously saved symbol list. The saved list only
/// applies when it names exactly the fetched symbols, each once; any other
/// shape (assets added or dropped since, duplicates, unknown symbols) yields
/// `None` and the caller keeps fetch order.
pub fn apply_saved_order(rates: &[Rate], order: &[String]) -> Option<Vec<Rate>> {
    if order.len() != rates.len() {
        return None;
    }

    let mut seen = HashSet::with_capacity(order.len());
    let mut arranged = Vec::with_capacity(rates.len());
    for symbol in order {
        if !seen.insert(symbol.as_str()) {
            return None;
        }
        let rate = rates.iter().find(|rate| &rate.symbol == symbol)?;
        arranged.push(rate.clone());
    }
    Some(arranged)
}
