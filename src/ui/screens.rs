use crate::models::{Rate, SortMode};
use crate::rates::visible_rates;

/// Number of rate cards shown in each row of the grid.
pub(crate) const GRID_COLUMNS: usize = 4;

/// The card grid: the manual-order list plus the filtered and sorted view
/// derived from it. `selected` always indexes into `visible`.
pub(crate) struct RateBoard {
    pub(crate) rates: Vec<Rate>,
    pub(crate) visible: Vec<Rate>,
    pub(crate) query: String,
    pub(crate) sort: SortMode,
    pub(crate) selected: usize,
}

impl RateBoard {
    pub(crate) fn new(rates: Vec<Rate>) -> Self {
        let mut board = Self {
            visible: Vec::new(),
            rates,
            query: String::new(),
            sort: SortMode::Default,
            selected: 0,
        };
        board.apply_filter();
        board
    }

    /// Recompute the visible view from the list, the query and the sort mode.
    pub(crate) fn apply_filter(&mut self) {
        self.visible = visible_rates(&self.rates, &self.query, self.sort);
        self.ensure_in_bounds();
    }

    pub(crate) fn set_query(&mut self, query: String) {
        self.query = query;
        self.apply_filter();
    }

    pub(crate) fn push_query_char(&mut self, ch: char) {
        self.query.push(ch);
        self.apply_filter();
    }

    pub(crate) fn pop_query_char(&mut self) {
        self.query.pop();
        self.apply_filter();
    }

    pub(crate) fn has_query(&self) -> bool {
        !self.query.is_empty()
    }

    /// Change the sort mode while keeping the same card selected.
    pub(crate) fn set_sort(&mut self, sort: SortMode) {
        let focus = self.current_symbol();
        self.sort = sort;
        self.apply_filter();
        if let Some(symbol) = focus {
            self.select_symbol(&symbol);
        }
    }

    /// Swap in a freshly fetched list, keeping the selection on the same
    /// symbol when it survived the refresh.
    pub(crate) fn replace_rates(&mut self, rates: Vec<Rate>) {
        let focus = self.current_symbol();
        self.rates = rates;
        self.apply_filter();
        if let Some(symbol) = focus {
            self.select_symbol(&symbol);
        }
    }

    pub(crate) fn current_rate(&self) -> Option<&Rate> {
        self.visible.get(self.selected)
    }

    pub(crate) fn current_symbol(&self) -> Option<String> {
        self.current_rate().map(|rate| rate.symbol.clone())
    }

    /// Select the visible card with `symbol`. Returns whether it was found.
    pub(crate) fn select_symbol(&mut self, symbol: &str) -> bool {
        match self.visible.iter().position(|rate| rate.symbol == symbol) {
            Some(index) => {
                self.selected = index;
                true
            }
            None => false,
        }
    }

    pub(crate) fn move_horizontal(&mut self, offset: isize) {
        let new_index = self.selected as isize + offset;
        if (0..self.visible.len() as isize).contains(&new_index) {
            self.selected = new_index as usize;
        }
    }

    pub(crate) fn move_vertical(&mut self, offset: isize) {
        let new_index = self.selected as isize + offset * GRID_COLUMNS as isize;
        if (0..self.visible.len() as isize).contains(&new_index) {
            self.selected = new_index as usize;
        }
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.visible.len().saturating_sub(1);
    }

    pub(crate) fn row_count(&self) -> usize {
        self.visible.len().div_ceil(GRID_COLUMNS)
    }

    fn ensure_in_bounds(&mut self) {
        if self.visible.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.visible.len() {
            self.selected = self.visible.len() - 1;
        }
    }
}
