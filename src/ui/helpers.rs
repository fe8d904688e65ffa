use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::color::card_palette;
use crate::models::{Rate, Theme, REFERENCE_SYMBOL};

/// Terminal colors for one theme.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ThemeColors {
    pub(crate) background: Color,
    pub(crate) text: Color,
    pub(crate) muted: Color,
    pub(crate) border: Color,
    pub(crate) accent: Color,
}

pub(crate) fn theme_colors(theme: Theme) -> ThemeColors {
    match theme {
        Theme::Dark => ThemeColors {
            background: Color::Rgb(2, 6, 23),
            text: Color::Rgb(241, 245, 249),
            muted: Color::Rgb(100, 116, 139),
            border: Color::Rgb(51, 65, 85),
            accent: Color::Rgb(96, 165, 250),
        },
        Theme::Light => ThemeColors {
            background: Color::Rgb(248, 250, 252),
            text: Color::Rgb(15, 23, 42),
            muted: Color::Rgb(100, 116, 139),
            border: Color::Rgb(203, 213, 225),
            accent: Color::Rgb(37, 99, 235),
        },
    }
}

/// Dollar amount with thousands separators and two decimals, e.g.
/// `$50,000.00`.
pub(crate) fn format_usd(price: f64) -> String {
    let fixed = format!("{:.2}", price.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, digit) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if price < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{fraction}")
}

/// Reference-coin value with seven decimals.
pub(crate) fn format_reference(price: f64) -> String {
    format!("{price:.7} {REFERENCE_SYMBOL}")
}

/// Build the textual payload for a rate card: a colored badge with the first
/// letter of the symbol, name, symbol, and both prices.
pub(crate) fn build_rate_card_lines(
    rate: &Rate,
    theme: Theme,
    selected: bool,
) -> Vec<Line<'static>> {
    let colors = theme_colors(theme);
    let palette = card_palette(&rate.symbol, theme);
    let initial = rate.symbol.chars().next().unwrap_or('?');

    let badge = Span::styled(
        format!(" {initial} "),
        Style::default()
            .bg(Color::from(palette.background))
            .fg(Color::from(palette.text))
            .add_modifier(Modifier::BOLD),
    );
    let mut name_style = Style::default().fg(colors.text).add_modifier(Modifier::BOLD);
    if selected {
        name_style = name_style.add_modifier(Modifier::UNDERLINED);
    }

    vec![
        Line::from(vec![
            badge,
            Span::raw(" "),
            Span::styled(rate.name.clone(), name_style),
        ]),
        Line::from(Span::styled(
            format!("    {}", rate.symbol),
            Style::default().fg(colors.muted),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format_usd(rate.price_usd),
            Style::default().fg(colors.text).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format_reference(rate.price_btc),
            Style::default().fg(colors.muted),
        )),
    ]
}

/// Placeholder card shown while the first fetch is in flight.
pub(crate) fn build_skeleton_lines(theme: Theme, width: u16) -> Vec<Line<'static>> {
    let style = Style::default().fg(theme_colors(theme).border);
    let width = width as usize;
    let bar = |fraction: usize| "░".repeat(width * fraction / 4);
    vec![
        Line::from(Span::styled(bar(2), style)),
        Line::from(Span::styled(bar(1), style)),
        Line::from(""),
        Line::from(Span::styled(bar(3), style)),
        Line::from(Span::styled(bar(2), style)),
    ]
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[test]
    fn usd_prices_are_grouped() {
        assert_eq!(format_usd(50_000.0), "$50,000.00");
        assert_eq!(format_usd(1_234_567.891), "$1,234,567.89");
        assert_eq!(format_usd(999.999), "$1,000.00");
        assert_eq!(format_usd(0.98), "$0.98");
        assert_eq!(format_usd(150.0), "$150.00");
    }

    #[test]
    fn reference_prices_use_seven_decimals() {
        assert_eq!(format_reference(0.05), "0.0500000 BTC");
        assert_eq!(format_reference(1.0), "1.0000000 BTC");
    }

    #[test]
    fn card_lines_show_both_prices() {
        let rate = Rate::new("ETH", "Ethereum", 2_500.0, 0.05);
        let lines = build_rate_card_lines(&rate, Theme::Dark, false);
        let text: Vec<String> = lines.iter().map(|line| line.to_string()).collect();
        assert_eq!(text[0], " E  Ethereum");
        assert_eq!(text[1], "    ETH");
        assert_eq!(text[3], "$2,500.00");
        assert_eq!(text[4], "0.0500000 BTC");
    }

    #[test]
    fn surface_error_prefers_root_cause() {
        let err = Err::<(), _>(anyhow!("disk full"))
            .context("failed to write preference 'theme'")
            .unwrap_err();
        assert_eq!(surface_error(&err), "disk full");
    }
}
