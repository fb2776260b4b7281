//! Terminal display utilities for the results grid.
//!
//! Handles terminal size detection, unicode-aware truncation and the
//! layout of the book table and its pagination footer.

use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};
use std::io::{self, IsTerminal};
use std::sync::OnceLock;
use terminal_size::terminal_size;
use unicode_width::UnicodeWidthChar;

use crate::config::SearchConfig;
use crate::controller::{SearchState, SearchStatus};
use crate::models::Book;

/// Terminal information with cached size and capabilities.
#[derive(Debug, Clone)]
pub struct Terminal {
    width: usize,
    is_tty: bool,
}

static TERMINAL_INFO: OnceLock<Terminal> = OnceLock::new();

/// Default width when terminal size cannot be determined.
pub const DEFAULT_WIDTH: usize = 100;

/// Get the global terminal information, initialized on first call.
pub fn terminal_info() -> &'static Terminal {
    TERMINAL_INFO.get_or_init(|| Terminal {
        width: terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(DEFAULT_WIDTH),
        is_tty: io::stdout().is_terminal(),
    })
}

/// Get the current terminal width in characters.
#[inline]
pub fn terminal_width() -> usize {
    terminal_info().width
}

/// Check if stdout is a terminal.
#[inline]
pub fn is_terminal() -> bool {
    terminal_info().is_tty
}

fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(1)
}

/// Display width of `text` in terminal columns.
pub fn display_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

/// Truncate text to fit within `max_width` columns, appending an ellipsis
/// if anything was cut.
///
/// ```
/// use book_finder::utils::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
/// assert_eq!(truncate_with_ellipsis("Hi", 8), "Hi");
/// ```
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if display_width(text) <= max_width {
        return text.to_string();
    }

    let budget = max_width.saturating_sub(3);
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = char_width(c);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

/// Truncate at the last word boundary that fits, falling back to
/// [`truncate_with_ellipsis`] when a single word is too long.
pub fn truncate_at_word(text: &str, max_width: usize) -> String {
    if display_width(text) <= max_width {
        return text.to_string();
    }

    let budget = max_width.saturating_sub(3);
    let mut used = 0;
    let mut last_break = None;
    for (idx, c) in text.char_indices() {
        let w = char_width(c);
        if used + w > budget {
            break;
        }
        if c.is_whitespace() {
            last_break = Some(idx);
        }
        used += w;
    }

    match last_break {
        Some(idx) if idx > 0 => format!("{}...", text[..idx].trim_end()),
        _ => truncate_with_ellipsis(text, max_width),
    }
}

/// Column width configuration for table display.
#[derive(Debug, Clone, Copy)]
pub struct ColumnConfig {
    pub min_width: usize,
    pub max_width: usize,
    pub weight: usize,
}

impl ColumnConfig {
    /// Create a new column config with minimum width.
    pub fn new(min_width: usize) -> Self {
        ColumnConfig {
            min_width,
            max_width: usize::MAX,
            weight: 1,
        }
    }

    /// Set the maximum width.
    pub fn max(mut self, max_width: usize) -> Self {
        self.max_width = max_width;
        self
    }

    /// Set the weight for space distribution.
    pub fn weight(mut self, weight: usize) -> Self {
        self.weight = weight;
        self
    }
}

/// Share `terminal_width` between columns: every column gets its minimum,
/// the rest is handed out by weight without exceeding any maximum.
pub fn calculate_column_widths(terminal_width: usize, configs: &[ColumnConfig]) -> Vec<usize> {
    let mut widths: Vec<usize> = configs.iter().map(|c| c.min_width).collect();
    if configs.is_empty() {
        return widths;
    }

    // one separator column between neighbours plus the outer borders
    let available = terminal_width.saturating_sub(configs.len() + 1);
    let mut remaining = available.saturating_sub(widths.iter().sum());

    while remaining > 0 {
        let growable: Vec<usize> = (0..configs.len())
            .filter(|&i| configs[i].weight > 0 && widths[i] < configs[i].max_width)
            .collect();
        let total_weight: usize = growable.iter().map(|&i| configs[i].weight).sum();
        if total_weight == 0 {
            break;
        }

        let round = remaining;
        for &i in &growable {
            let share = (round * configs[i].weight / total_weight).max(1);
            let room = configs[i].max_width - widths[i];
            let take = share.min(room).min(remaining);
            widths[i] += take;
            remaining -= take;
            if remaining == 0 {
                break;
            }
        }
    }

    widths
}

/// Column widths for the results grid: (title, authors, year, link)
pub fn book_table_columns(terminal_width: usize) -> (usize, usize, usize, usize) {
    let configs = [
        ColumnConfig::new(20).max(70).weight(3),
        ColumnConfig::new(14).max(40).weight(2),
        ColumnConfig::new(4).max(4).weight(0),
        ColumnConfig::new(24).max(60).weight(1),
    ];
    let widths = calculate_column_widths(terminal_width, &configs);
    (widths[0], widths[1], widths[2], widths[3])
}

/// Format a first-publication year for display.
pub fn format_year(year: Option<i32>) -> String {
    year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Build the results grid: one row per book with its cover, title,
/// authors, year and outbound link.
pub fn results_table(books: &[Book], config: &SearchConfig, terminal_width: usize) -> Table {
    let (title_w, authors_w, _, link_w) = book_table_columns(terminal_width);
    let covers = config.cover_resolver();

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(terminal_width.min(u16::MAX as usize) as u16)
        .set_header(vec!["Title", "Authors", "Year", "Link", "Cover"]);

    for book in books {
        table.add_row(vec![
            Cell::new(truncate_at_word(&book.title, title_w)).add_attribute(Attribute::Bold),
            Cell::new(truncate_with_ellipsis(&book.author_line(), authors_w)),
            Cell::new(format_year(book.first_publish_year)),
            Cell::new(truncate_with_ellipsis(
                &book.link_with(&config.site_base, &config.archive_base),
                link_w,
            )),
            Cell::new(covers.resolve(book.cover_id, config.cover_size)),
        ]);
    }

    table
}

/// One-line pagination summary, e.g. `Page 2 of 42 · 1000 results · ‹ prev | next ›`
pub fn pagination_footer(state: &SearchState, last_page: u32) -> String {
    let page = state.params.effective_page();
    let total = state.num_found().unwrap_or(0);
    let prev = if page > 1 { "‹ prev" } else { "  -   " };
    let next = if state.status == SearchStatus::Success && page < last_page {
        "next ›"
    } else {
        "  -   "
    };
    format!(
        "Page {} of {} · {} results · {} | {}",
        page, last_page, total, prev, next
    )
}
