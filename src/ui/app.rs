use std::mem;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use anyhow::Result;
use chrono::Local;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;
use tracing::{error, info, warn};

use crate::api::{FetchError, RateSource};
use crate::db::{load_card_order, load_theme, save_card_order, save_theme};
use crate::models::{Rate, SortMode, Theme, DEFAULT_ASSETS};
use crate::rates::{apply_saved_order, reorder_by_symbol, symbol_order};

use super::helpers::{
    build_rate_card_lines, build_skeleton_lines, centered_rect, surface_error, theme_colors,
};
use super::screens::{RateBoard, GRID_COLUMNS};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Title, controls line and the bottom border.
const HEADER_HEIGHT: u16 = 3;
/// Borders plus the five lines of card content.
const CARD_HEIGHT: u16 = 7;

type FetchResult = Result<Vec<Rate>, FetchError>;

/// Fine-grained interaction modes.
enum Mode {
    Normal,
    /// Keystrokes edit the search text live.
    Searching,
    Dragging(DragState),
}

/// A card that has been picked up and waits to be dropped on the selected
/// card.
struct DragState {
    symbol: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    conn: Connection,
    source: Arc<dyn RateSource>,
    board: RateBoard,
    theme: Theme,
    mode: Mode,
    status: Option<StatusMessage>,
    /// Receiving end of the in-flight fetch, if any.
    pending: Option<Receiver<FetchResult>>,
    /// Whether any fetch has succeeded this session.
    loaded: bool,
    load_error: Option<String>,
    updated_at: Option<String>,
}

impl App {
    /// Build the app with an empty board. The persisted theme wins over
    /// `default_theme`.
    pub fn new(
        conn: Connection,
        source: Arc<dyn RateSource>,
        default_theme: Theme,
    ) -> Result<Self> {
        let theme = load_theme(&conn)?.unwrap_or(default_theme);
        Ok(Self {
            conn,
            source,
            board: RateBoard::new(Vec::new()),
            theme,
            mode: Mode::Normal,
            status: None,
            pending: None,
            loaded: false,
            load_error: None,
            updated_at: None,
        })
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn is_refreshing(&self) -> bool {
        self.pending.is_some()
    }

    /// Symbols in the current manual order.
    pub fn manual_order(&self) -> Vec<String> {
        symbol_order(&self.board.rates)
    }

    /// Symbols of the cards currently on screen, in display order.
    pub fn visible_symbols(&self) -> Vec<String> {
        symbol_order(&self.board.visible)
    }

    pub fn sort_mode(&self) -> SortMode {
        self.board.sort
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Kick off a fetch on a worker thread. Ignored while one is already in
    /// flight; returns whether a new fetch started.
    pub fn start_refresh(&mut self) -> bool {
        if self.pending.is_some() {
            return false;
        }

        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        let spawned = thread::Builder::new()
            .name("price-fetch".to_string())
            .spawn(move || {
                // The receiver is gone only when the app already quit.
                let _ = tx.send(source.fetch_rates());
            });

        match spawned {
            Ok(_) => {
                self.pending = Some(rx);
                true
            }
            Err(err) => {
                error!(error = %err, "failed to spawn fetch worker");
                self.set_status(format!("Failed to start refresh: {err}"), StatusKind::Error);
                false
            }
        }
    }

    /// Apply the fetch result if the worker has finished. Returns whether a
    /// result (success or failure) was consumed.
    pub fn poll_refresh(&mut self) -> bool {
        let Some(rx) = &self.pending else {
            return false;
        };

        match rx.try_recv() {
            Ok(result) => {
                self.pending = None;
                self.apply_fetch_result(result);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                error!("fetch worker exited without a result");
                self.set_status("Refresh stopped unexpectedly.", StatusKind::Error);
                true
            }
        }
    }

    /// Replace the list wholesale with a fetched batch, or surface the error
    /// while keeping whatever data is already on screen.
    pub(crate) fn apply_fetch_result(&mut self, result: FetchResult) {
        match result {
            Ok(rates) => {
                let count = rates.len();
                let rates = self.restore_saved_order(rates);
                self.board.replace_rates(rates);
                self.loaded = true;
                self.load_error = None;
                self.updated_at = Some(Local::now().format("%H:%M:%S").to_string());
                self.set_status(format!("Loaded {count} rates."), StatusKind::Info);
            }
            Err(err) => {
                let message = err.user_message();
                error!(error = %err, "fetch failed");
                if !self.loaded {
                    self.load_error = Some(message.clone());
                }
                self.set_status(message, StatusKind::Error);
            }
        }
    }

    /// Reapply the persisted manual order when it still names exactly the
    /// fetched symbols.
    fn restore_saved_order(&self, rates: Vec<Rate>) -> Vec<Rate> {
        let order = match load_card_order(&self.conn) {
            Ok(Some(order)) => order,
            Ok(None) => return rates,
            Err(err) => {
                warn!(error = %err, "could not read saved card order");
                return rates;
            }
        };

        match apply_saved_order(&rates, &order) {
            Some(arranged) => arranged,
            None => {
                info!("saved card order does not match fetched assets, using fetch order");
                rates
            }
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Searching => self.handle_search(code),
            Mode::Dragging(drag) => self.handle_drag(code, drag)?,
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Left => self.board.move_horizontal(-1),
            KeyCode::Right => self.board.move_horizontal(1),
            KeyCode::Up => self.board.move_vertical(-1),
            KeyCode::Down => self.board.move_vertical(1),
            KeyCode::Home => self.board.select_first(),
            KeyCode::End => self.board.select_last(),
            KeyCode::Char('/') | KeyCode::Char('f') => {
                self.clear_status();
                return Ok(Mode::Searching);
            }
            KeyCode::Char('c') => {
                if self.board.has_query() {
                    self.board.set_query(String::new());
                    self.set_status("Search cleared.", StatusKind::Info);
                }
            }
            KeyCode::Char('s') => self.change_sort(self.board.sort.next()),
            KeyCode::Char('S') => self.change_sort(self.board.sort.previous()),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if self.start_refresh() {
                    self.set_status("Refreshing rates...", StatusKind::Info);
                }
            }
            KeyCode::Char('t') | KeyCode::Char('T') => self.toggle_theme(),
            KeyCode::Char(' ') => {
                if let Some(symbol) = self.board.current_symbol() {
                    self.set_status(
                        format!("Moving {symbol}. Choose a spot and press Space to drop."),
                        StatusKind::Info,
                    );
                    return Ok(Mode::Dragging(DragState { symbol }));
                } else {
                    self.set_status("No card selected to move.", StatusKind::Error);
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_search(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Esc => {
                self.board.set_query(String::new());
                return Mode::Normal;
            }
            KeyCode::Enter => return Mode::Normal,
            KeyCode::Left => self.board.move_horizontal(-1),
            KeyCode::Right => self.board.move_horizontal(1),
            KeyCode::Up => self.board.move_vertical(-1),
            KeyCode::Down => self.board.move_vertical(1),
            KeyCode::Backspace => self.board.pop_query_char(),
            KeyCode::Char(ch) if !ch.is_control() => self.board.push_query_char(ch),
            _ => {}
        }
        Mode::Searching
    }

    fn handle_drag(&mut self, code: KeyCode, drag: DragState) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.board.select_symbol(&drag.symbol);
                self.set_status("Move cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                self.drop_card(&drag.symbol)?;
                Ok(Mode::Normal)
            }
            KeyCode::Left => {
                self.board.move_horizontal(-1);
                Ok(Mode::Dragging(drag))
            }
            KeyCode::Right => {
                self.board.move_horizontal(1);
                Ok(Mode::Dragging(drag))
            }
            KeyCode::Up => {
                self.board.move_vertical(-1);
                Ok(Mode::Dragging(drag))
            }
            KeyCode::Down => {
                self.board.move_vertical(1);
                Ok(Mode::Dragging(drag))
            }
            _ => Ok(Mode::Dragging(drag)),
        }
    }

    /// Move `active` onto the selected card's slot in the manual order,
    /// persist the new order, and fall back to manual sorting so the move is
    /// visible.
    fn drop_card(&mut self, active: &str) -> Result<()> {
        let Some(over) = self.board.current_symbol() else {
            return Ok(());
        };

        let Some(reordered) = reorder_by_symbol(&self.board.rates, active, &over) else {
            self.board.select_symbol(active);
            self.set_status(format!("{active} left in place."), StatusKind::Info);
            return Ok(());
        };

        self.board.rates = reordered;
        self.board.sort = SortMode::Default;
        self.board.apply_filter();
        self.board.select_symbol(active);

        let order = symbol_order(&self.board.rates);
        match save_card_order(&self.conn, &order) {
            Ok(()) => {
                info!(order = ?order, "saved card order");
                self.set_status(format!("Moved {active}."), StatusKind::Info);
            }
            Err(err) => {
                error!(error = %err, "failed to save card order");
                self.set_status(surface_error(&err), StatusKind::Error);
            }
        }
        Ok(())
    }

    fn change_sort(&mut self, sort: SortMode) {
        self.board.set_sort(sort);
        self.set_status(sort.label(), StatusKind::Info);
    }

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        match save_theme(&self.conn, self.theme) {
            Ok(()) => self.set_status(
                format!("Switched to {} mode.", self.theme),
                StatusKind::Info,
            ),
            Err(err) => {
                error!(error = %err, "failed to save theme");
                self.set_status(surface_error(&err), StatusKind::Error);
            }
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let colors = theme_colors(self.theme);
        frame.render_widget(
            Block::default().style(Style::default().bg(colors.background).fg(colors.text)),
            area,
        );

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_header(frame, chunks[0]);
        self.draw_status_bar(frame, chunks[1]);
        self.draw_rate_grid(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let colors = theme_colors(self.theme);
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(colors.border));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let title = Line::from(vec![
            Span::styled(
                "⚡ CryptoMonitor",
                Style::default()
                    .fg(colors.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("  LIVE MARKET DATA", Style::default().fg(colors.muted)),
        ]);

        let label_style = Style::default().fg(colors.muted);
        let searching = matches!(self.mode, Mode::Searching);
        let query_span = if self.board.query.is_empty() && !searching {
            Span::styled(
                "Search coins...",
                label_style.add_modifier(Modifier::ITALIC),
            )
        } else {
            Span::styled(self.board.query.clone(), Style::default().fg(colors.text))
        };
        let refresh_span = if self.is_refreshing() {
            Span::styled("⟳ Refreshing...", Style::default().fg(colors.accent))
        } else {
            Span::styled("⟳ Refresh [r]", label_style)
        };

        let controls = Line::from(vec![
            Span::styled("Search: ", label_style),
            query_span,
            Span::styled("   Sort: ", label_style),
            Span::raw(self.board.sort.label()),
            Span::styled("   Theme: ", label_style),
            Span::raw(self.theme.as_str()),
            Span::raw("   "),
            refresh_span,
        ]);

        frame.render_widget(Paragraph::new(vec![title, controls]), inner);

        if searching && inner.height >= 2 {
            let cursor_x =
                inner.x + "Search: ".len() as u16 + self.board.query.chars().count() as u16;
            let cursor_x = cursor_x.min(inner.right().saturating_sub(1));
            frame.set_cursor_position((cursor_x, inner.y + 1));
        }
    }

    fn draw_status_bar(&self, frame: &mut Frame, area: Rect) {
        let colors = theme_colors(self.theme);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(20)])
            .split(area);

        let mut left = vec![
            Span::styled("Displaying ", Style::default().fg(colors.muted)),
            Span::styled(
                self.board.visible.len().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" of {} assets", self.board.rates.len()),
                Style::default().fg(colors.muted),
            ),
        ];
        if self.board.has_query() {
            left.push(Span::styled(
                "   Clear filter [c]",
                Style::default().fg(colors.accent),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(left)), columns[0]);

        if let Some(updated_at) = &self.updated_at {
            let right = Paragraph::new(Line::from(Span::styled(
                format!("Updated: {updated_at}"),
                Style::default().fg(colors.muted),
            )))
            .alignment(Alignment::Right);
            frame.render_widget(right, columns[1]);
        }
    }

    fn draw_rate_grid(&self, frame: &mut Frame, area: Rect) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        if self.board.visible.is_empty() {
            if !self.loaded && self.is_refreshing() {
                self.draw_skeleton_grid(frame, area);
            } else {
                self.draw_empty_state(frame, area);
            }
            return;
        }

        let colors = theme_colors(self.theme);
        let dragging = match &self.mode {
            Mode::Dragging(drag) => Some(drag.symbol.as_str()),
            _ => None,
        };

        let capacity = (area.height / CARD_HEIGHT).max(1) as usize;
        let selected_row = self.board.selected / GRID_COLUMNS;
        let first_row = if selected_row >= capacity {
            selected_row + 1 - capacity
        } else {
            0
        };
        let last_row = (first_row + capacity).min(self.board.row_count());

        let rows = split_rows(area, last_row - first_row);
        for (offset, row_chunk) in rows.into_iter().enumerate() {
            let row_idx = first_row + offset;
            for (col_idx, cell) in split_columns(row_chunk).into_iter().enumerate() {
                let index = row_idx * GRID_COLUMNS + col_idx;
                let Some(rate) = self.board.visible.get(index) else {
                    break;
                };
                let selected = index == self.board.selected;
                let picked_up = dragging == Some(rate.symbol.as_str());

                let mut block = Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(colors.border));
                if picked_up {
                    block = block
                        .title(" moving ")
                        .border_style(Style::default().fg(Color::Cyan));
                } else if selected {
                    let title = if dragging.is_some() { " drop here " } else { "" };
                    block = block
                        .title(title)
                        .border_style(Style::default().fg(Color::Yellow));
                }

                let card = Paragraph::new(build_rate_card_lines(rate, self.theme, selected))
                    .block(block)
                    .alignment(Alignment::Left);
                frame.render_widget(card, cell);
            }
        }
    }

    fn draw_skeleton_grid(&self, frame: &mut Frame, area: Rect) {
        let colors = theme_colors(self.theme);
        let capacity = (area.height / CARD_HEIGHT).max(1) as usize;
        let placeholder_rows = DEFAULT_ASSETS.len().div_ceil(GRID_COLUMNS).min(capacity);

        for row_chunk in split_rows(area, placeholder_rows) {
            for cell in split_columns(row_chunk) {
                let block = Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(colors.border));
                let inner_width = cell.width.saturating_sub(2);
                let card =
                    Paragraph::new(build_skeleton_lines(self.theme, inner_width)).block(block);
                frame.render_widget(card, cell);
            }
        }
    }

    fn draw_empty_state(&self, frame: &mut Frame, area: Rect) {
        let colors = theme_colors(self.theme);
        let heading = Style::default().add_modifier(Modifier::BOLD);
        let body = Style::default().fg(colors.muted);

        let lines = if self.board.has_query() {
            vec![
                Line::from(Span::styled(
                    format!("No results for \"{}\"", self.board.query),
                    heading,
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Check your spelling or try using the cryptocurrency symbol (e.g. BTC, ETH).",
                    body,
                )),
                Line::from(Span::styled("Press c to clear the search.", body)),
            ]
        } else if let Some(message) = &self.load_error {
            vec![
                Line::from(Span::styled("Unable to load market data", heading)),
                Line::from(""),
                Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red))),
                Line::from(Span::styled("Press r to try again.", body)),
            ]
        } else {
            vec![
                Line::from(Span::styled("Loading Market Data", heading)),
                Line::from(""),
                Line::from(Span::styled(
                    "Connecting to the price API for real-time exchange rates...",
                    body,
                )),
            ]
        };

        let popup_area = centered_rect(80, 50, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors.border));
        let paragraph = Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(theme_colors(self.theme).border));
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match &self.mode {
            Mode::Searching => Line::from(vec![
                Span::styled("[type]", key_style),
                Span::raw(" Filter   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Keep   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Clear"),
            ]),
            Mode::Dragging(_) => Line::from(vec![
                Span::styled("[←↑↓→]", key_style),
                Span::raw(" Choose Spot   "),
                Span::styled("[Space/Enter]", key_style),
                Span::raw(" Drop   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            Mode::Normal => Line::from(vec![
                Span::styled("[←↑↓→]", key_style),
                Span::raw(" Select   "),
                Span::styled("[/]", key_style),
                Span::raw(" Search   "),
                Span::styled("[s]", key_style),
                Span::raw(" Sort   "),
                Span::styled("[Space]", key_style),
                Span::raw(" Move Card   "),
                Span::styled("[r]", key_style),
                Span::raw(" Refresh   "),
                Span::styled("[t]", key_style),
                Span::raw(" Theme   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

/// Fixed-height card rows, top-aligned inside `area`.
fn split_rows(area: Rect, rows: usize) -> Vec<Rect> {
    let mut constraints = vec![Constraint::Length(CARD_HEIGHT); rows];
    constraints.push(Constraint::Min(0));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);
    chunks.iter().take(rows).cloned().collect()
}

fn split_columns(area: Rect) -> Vec<Rect> {
    let columns = GRID_COLUMNS.max(1) as u16;
    let percent = (100 / columns).max(1);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Percentage(percent); columns as usize])
        .split(area);
    chunks.iter().cloned().collect()
}
