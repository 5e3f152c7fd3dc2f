//! Locates the passenger volume table on a yearly page and turns its rows
//! into [`VolumeRecord`]s.
//!
//! The page layout is not stable, so the table is chosen by an ordered list of
//! [`TableMatcher`] strategies: the first strategy that accepts any table wins.
//! Rows are parsed one by one and a malformed row never stops the rest.

use crate::domain::model::{Series, VolumeRecord};
use crate::domain::ports::RunObserver;
use crate::utils::error::RowParseError;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;

// Selector::parse only fails on malformed CSS; these literals are valid.
static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static HEADER_CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("th").unwrap());
static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("td, th").unwrap());

pub const DEFAULT_HEADER_KEYWORDS: &[&str] = &["date", "tsa"];

#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Case-insensitive substrings that mark a table header as the data table.
    pub header_keywords: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            header_keywords: DEFAULT_HEADER_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

/// Text of an element with each text node trimmed, then concatenated.
fn element_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect::<String>()
}

fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    row.select(&CELL_SELECTOR).map(element_text).collect()
}

/// One table-selection heuristic.
pub trait TableMatcher: Send + Sync {
    fn name(&self) -> &'static str;
    fn matches(&self, table: ElementRef<'_>) -> bool;
}

/// Accepts a table whose joined `th` text contains one of the keywords.
pub struct HeaderKeywordMatcher {
    keywords: Vec<String>,
}

impl HeaderKeywordMatcher {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }
}

impl TableMatcher for HeaderKeywordMatcher {
    fn name(&self) -> &'static str {
        "header-keyword"
    }

    fn matches(&self, table: ElementRef<'_>) -> bool {
        let headers: Vec<String> = table.select(&HEADER_CELL_SELECTOR).map(element_text).collect();
        if headers.is_empty() {
            return false;
        }
        let header_text = headers.join(" ").to_lowercase();
        self.keywords.iter().any(|k| header_text.contains(k.as_str()))
    }
}

/// Accepts a table whose first data row starts with something like `1/1/2025`.
pub struct DateShapedRowMatcher;

impl TableMatcher for DateShapedRowMatcher {
    fn name(&self) -> &'static str {
        "date-shaped-row"
    }

    fn matches(&self, table: ElementRef<'_>) -> bool {
        // row 0 is the header row, row 1 the first data row
        let Some(first_data_row) = table.select(&ROW_SELECTOR).nth(1) else {
            return false;
        };
        let cells = row_cells(first_data_row);
        if cells.len() < 2 {
            return false;
        }
        let first = &cells[0];
        first.contains('/') && first.chars().any(|c| c.is_ascii_digit())
    }
}

/// A table picked by a [`TableLocator`].
#[derive(Debug, Clone, Copy)]
pub struct TableMatch<'a> {
    pub table: ElementRef<'a>,
    pub index: usize,
    pub matcher: &'static str,
}

/// Ordered matcher list; every table is tried against matcher 1 before matcher 2 sees any.
pub struct TableLocator {
    matchers: Vec<Box<dyn TableMatcher>>,
}

impl TableLocator {
    pub fn new(matchers: Vec<Box<dyn TableMatcher>>) -> Self {
        Self { matchers }
    }

    pub fn from_config(config: &ExtractConfig) -> Self {
        Self::new(vec![
            Box::new(HeaderKeywordMatcher::new(&config.header_keywords)),
            Box::new(DateShapedRowMatcher),
        ])
    }

    /// Adds a lower-priority heuristic after the existing ones.
    pub fn with_matcher(mut self, matcher: Box<dyn TableMatcher>) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn matcher_names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    pub fn locate<'a>(&self, document: &'a Html) -> Option<TableMatch<'a>> {
        let tables: Vec<ElementRef<'a>> = document.select(&TABLE_SELECTOR).collect();

        self.matchers.iter().find_map(|matcher| {
            tables
                .iter()
                .position(|table| matcher.matches(*table))
                .map(|index| TableMatch {
                    table: tables[index],
                    index,
                    matcher: matcher.name(),
                })
        })
    }
}

fn small_number(text: &str) -> Option<u32> {
    if text.is_empty() || text.len() > 2 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Parses `M/D/YYYY`, `MM/DD/YY` (read as 20YY) or ISO `YYYY-MM-DD`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    if text.contains('/') {
        let parts: Vec<&str> = text.split('/').map(str::trim).collect();
        let [month, day, year] = parts.as_slice() else {
            return None;
        };

        let year = if year.len() == 2 {
            format!("20{}", year)
        } else {
            year.to_string()
        };
        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        NaiveDate::from_ymd_opt(year.parse().ok()?, small_number(month)?, small_number(day)?)
    } else {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
    }
}

/// Parses a count such as `2,345,678`.
pub fn parse_volume(text: &str) -> Option<u64> {
    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse().ok()
}

/// Cell 0 is the date and cell 1 the volume; extra cells are ignored.
pub fn parse_row<S: AsRef<str>>(cells: &[S], year: i32) -> Result<VolumeRecord, RowParseError> {
    let [date_text, volume_text, ..] = cells else {
        return Err(RowParseError::TooFewCells(cells.len()));
    };
    let (date_text, volume_text) = (date_text.as_ref(), volume_text.as_ref());

    let date =
        parse_date(date_text).ok_or_else(|| RowParseError::InvalidDate(date_text.to_string()))?;
    let volume = parse_volume(volume_text)
        .ok_or_else(|| RowParseError::InvalidVolume(volume_text.to_string()))?;

    Ok(VolumeRecord::new(date, volume, year))
}

/// Keeps every `Ok`, hands each `Err` with its position to `on_error`.
pub fn collect_successes<T, E, I, F>(results: I, mut on_error: F) -> Vec<T>
where
    I: IntoIterator<Item = Result<T, E>>,
    F: FnMut(usize, &E),
{
    results
        .into_iter()
        .enumerate()
        .filter_map(|(index, result)| match result {
            Ok(value) => Some(value),
            Err(e) => {
                on_error(index, &e);
                None
            }
        })
        .collect()
}

/// Result of one page extraction, with enough detail for diagnostics.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub series: Series,
    pub matcher: Option<&'static str>,
    pub table_index: Option<usize>,
    pub rows_seen: usize,
    pub rows_skipped: usize,
}

pub struct TableExtractor {
    locator: TableLocator,
    observer: Arc<dyn RunObserver>,
}

impl TableExtractor {
    pub fn new(config: &ExtractConfig, observer: Arc<dyn RunObserver>) -> Self {
        Self::with_locator(TableLocator::from_config(config), observer)
    }

    pub fn with_locator(locator: TableLocator, observer: Arc<dyn RunObserver>) -> Self {
        Self { locator, observer }
    }

    pub fn extract(&self, markup: &str, year: i32) -> Series {
        self.extract_detailed(markup, year).series
    }

    pub fn extract_detailed(&self, markup: &str, year: i32) -> Extraction {
        let document = Html::parse_document(markup);

        let Some(found) = self.locator.locate(&document) else {
            self.observer.table_not_found(year);
            return Extraction {
                series: Series::new(),
                matcher: None,
                table_index: None,
                rows_seen: 0,
                rows_skipped: 0,
            };
        };
        self.observer.table_selected(year, found.matcher, found.index);

        let parsed: Vec<Result<VolumeRecord, RowParseError>> = found
            .table
            .select(&ROW_SELECTOR)
            .skip(1)
            .map(|row| parse_row(&row_cells(row), year))
            .collect();
        let rows_seen = parsed.len();

        let mut rows_skipped = 0;
        let records = collect_successes(parsed, |index, error| {
            rows_skipped += 1;
            // +1 for the header row
            self.observer.row_skipped(year, index + 1, error);
        });

        Extraction {
            series: Series::from_unsorted(records),
            matcher: Some(found.matcher),
            table_index: Some(found.index),
            rows_seen,
            rows_skipped,
        }
    }
}
