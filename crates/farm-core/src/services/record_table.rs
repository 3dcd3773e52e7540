//! Searchable, sortable, paginated record listings
//!
//! Columns are declared up front with a typed accessor, so sorting compares
//! values of a known kind instead of whatever a field happens to hold.

use super::aggregation::CowIndex;
use crate::error::{FarmError, Result};
use chrono::NaiveDate;
use farm_types::{Cow, FeedRecord, HealthRecord, MilkRecord};
use std::cmp::Ordering;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A single cell with its declared kind
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Missing,
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn optional_text(value: Option<&str>) -> Self {
        value.map_or(Self::Missing, Self::text)
    }

    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => format!("{}", n),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Missing => "-".to_string(),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::Date(_) => 1,
            Self::Text(_) => 2,
            Self::Missing => 3,
        }
    }

    /// Ascending order within a kind; across kinds by kind, missing last
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (a, b) => a.kind_rank().cmp(&b.kind_rank()),
        }
    }
}

/// Column descriptor: key, header label, accessor, sortable flag
pub struct Column<'a, T> {
    pub key: &'static str,
    pub label: &'static str,
    pub sortable: bool,
    accessor: Box<dyn Fn(&T) -> CellValue + 'a>,
}

impl<'a, T> Column<'a, T> {
    pub fn new(
        key: &'static str,
        label: &'static str,
        accessor: impl Fn(&T) -> CellValue + 'a,
    ) -> Self {
        Self { key, label, sortable: false, accessor: Box::new(accessor) }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn value(&self, row: &T) -> CellValue {
        (self.accessor)(row)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortConfig {
    pub key: String,
    pub direction: SortDirection,
}

impl SortConfig {
    /// Clicking a column header: same column flips direction, a new one
    /// starts ascending
    pub fn toggle(current: Option<&SortConfig>, key: &str) -> SortConfig {
        match current {
            Some(c) if c.key == key => SortConfig {
                key: key.to_string(),
                direction: match c.direction {
                    SortDirection::Ascending => SortDirection::Descending,
                    SortDirection::Descending => SortDirection::Ascending,
                },
            },
            _ => SortConfig { key: key.to_string(), direction: SortDirection::Ascending },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    pub search: Option<String>,
    pub sort: Option<SortConfig>,
    /// 1-based; clamped into the available pages
    pub page: usize,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self { search: None, sort: None, page: 1 }
    }
}

/// One page of a table view
#[derive(Debug)]
pub struct TablePage<'r, T> {
    pub rows: Vec<&'r T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_rows: usize,
    /// 1-based index of the first row shown; 0 when empty
    pub first_row: usize,
    pub last_row: usize,
}

impl<'r, T> TablePage<'r, T> {
    pub fn summary(&self) -> String {
        format!("Showing {} to {} of {} results", self.first_row, self.last_row, self.total_rows)
    }
}

pub struct RecordTable<'r, 'c, T> {
    rows: &'r [T],
    columns: Vec<Column<'c, T>>,
    search_keys: Vec<&'static str>,
    page_size: usize,
}

impl<'r, 'c, T> RecordTable<'r, 'c, T> {
    pub fn new(rows: &'r [T], columns: Vec<Column<'c, T>>) -> Self {
        Self { rows, columns, search_keys: Vec::new(), page_size: DEFAULT_PAGE_SIZE }
    }

    pub fn with_search_keys(mut self, keys: &[&'static str]) -> Self {
        self.search_keys = keys.to_vec();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn columns(&self) -> &[Column<'c, T>] {
        &self.columns
    }

    fn column(&self, key: &str) -> Result<&Column<'c, T>> {
        self.columns
            .iter()
            .find(|c| c.key == key)
            .ok_or_else(|| FarmError::InvalidQuery(format!("unknown column '{}'", key)))
    }

    fn matches_search(&self, row: &T, needle: &str) -> bool {
        self.columns
            .iter()
            .filter(|c| self.search_keys.contains(&c.key))
            .any(|c| c.value(row).display().to_lowercase().contains(needle))
    }

    /// Apply search, sort and pagination, in that order
    pub fn view(&self, query: &TableQuery) -> Result<TablePage<'r, T>> {
        let mut rows: Vec<&'r T> = match query.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                self.rows.iter().filter(|r| self.matches_search(r, &needle)).collect()
            }
            _ => self.rows.iter().collect(),
        };

        if let Some(sort) = &query.sort {
            let column = self.column(&sort.key)?;
            if !column.sortable {
                return Err(FarmError::InvalidQuery(format!("column '{}' is not sortable", sort.key)));
            }
            let mut keyed: Vec<(CellValue, &'r T)> =
                rows.into_iter().map(|r| (column.value(r), r)).collect();
            // Missing cells stay at the end in either direction
            keyed.sort_by(|(a, _), (b, _)| match (a, b) {
                (CellValue::Missing, CellValue::Missing) => Ordering::Equal,
                (CellValue::Missing, _) => Ordering::Greater,
                (_, CellValue::Missing) => Ordering::Less,
                _ => match sort.direction {
                    SortDirection::Ascending => a.compare(b),
                    SortDirection::Descending => a.compare(b).reverse(),
                },
            });
            rows = keyed.into_iter().map(|(_, r)| r).collect();
        }

        let total_rows = rows.len();
        let total_pages = (total_rows + self.page_size - 1) / self.page_size;
        let page = query.page.clamp(1, total_pages.max(1));
        let start = (page - 1) * self.page_size;
        let end = (start + self.page_size).min(total_rows);

        Ok(TablePage {
            rows: rows[start.min(end)..end].to_vec(),
            page,
            total_pages,
            total_rows,
            first_row: if total_rows == 0 { 0 } else { start + 1 },
            last_row: end,
        })
    }

    /// Rendered cells of a page, in column order
    pub fn cells(&self, page: &TablePage<'r, T>) -> Vec<Vec<String>> {
        page.rows
            .iter()
            .map(|row| self.columns.iter().map(|c| c.value(row).display()).collect())
            .collect()
    }
}

pub fn cow_columns<'c>() -> Vec<Column<'c, Cow>> {
    vec![
        Column::new("name", "Name", |c: &Cow| CellValue::text(&c.name)).sortable(),
        Column::new("breed", "Breed", |c: &Cow| CellValue::text(&c.breed)).sortable(),
        Column::new("dob", "Date of Birth", |c: &Cow| CellValue::Date(c.dob)).sortable(),
        Column::new("numberOfCalves", "Calves", |c: &Cow| {
            CellValue::Number(f64::from(c.number_of_calves))
        })
        .sortable(),
        Column::new("status", "Status", |c: &Cow| CellValue::text(c.status.as_str())).sortable(),
        Column::new("remarks", "Remarks", |c: &Cow| CellValue::optional_text(c.remarks.as_deref())),
    ]
}

pub const COW_SEARCH_KEYS: &[&str] = &["name", "breed", "status"];

pub fn milk_columns<'c>(cows: &'c CowIndex<'c>) -> Vec<Column<'c, MilkRecord>> {
    vec![
        Column::new("cowName", "Cow", move |r: &MilkRecord| CellValue::text(cows.name(&r.cow_id)))
            .sortable(),
        Column::new("date", "Date", |r: &MilkRecord| CellValue::Date(r.date)).sortable(),
        Column::new("morningLitres", "Morning (L)", |r: &MilkRecord| CellValue::Number(r.morning_litres)),
        Column::new("noonLitres", "Midday (L)", |r: &MilkRecord| CellValue::Number(r.noon_litres)),
        Column::new("eveningLitres", "Evening (L)", |r: &MilkRecord| CellValue::Number(r.evening_litres)),
        Column::new("totalLitres", "Total (L)", |r: &MilkRecord| CellValue::Number(r.total_litres))
            .sortable(),
        Column::new("recordedBy", "Recorded By", |r: &MilkRecord| {
            CellValue::optional_text(r.recorded_by.as_deref())
        }),
    ]
}

pub const MILK_SEARCH_KEYS: &[&str] = &["cowName", "recordedBy"];

pub fn feed_columns<'c>(cows: &'c CowIndex<'c>) -> Vec<Column<'c, FeedRecord>> {
    vec![
        Column::new("cowName", "Cow", move |r: &FeedRecord| CellValue::text(cows.name(&r.cow_id)))
            .sortable(),
        Column::new("date", "Date", |r: &FeedRecord| CellValue::Date(r.date)).sortable(),
        Column::new("feedType", "Feed Type", |r: &FeedRecord| CellValue::text(&r.feed_type)).sortable(),
        Column::new("quantity", "Quantity", |r: &FeedRecord| CellValue::Number(r.quantity)).sortable(),
        Column::new("unit", "Unit", |r: &FeedRecord| CellValue::text(r.unit.as_str())),
    ]
}

pub const FEED_SEARCH_KEYS: &[&str] = &["cowName", "feedType", "unit"];

pub fn health_columns<'c>(cows: &'c CowIndex<'c>) -> Vec<Column<'c, HealthRecord>> {
    vec![
        Column::new("cowName", "Cow", move |r: &HealthRecord| CellValue::text(cows.name(&r.cow_id)))
            .sortable(),
        Column::new("date", "Date", |r: &HealthRecord| CellValue::Date(r.date)).sortable(),
        Column::new("healthStatus", "Status", |r: &HealthRecord| {
            CellValue::text(r.health_status.as_str())
        })
        .sortable(),
        Column::new("illness", "Details", |r: &HealthRecord| {
            CellValue::optional_text(r.illness.as_deref())
        }),
        Column::new("attendedBy", "Attended By", |r: &HealthRecord| {
            CellValue::optional_text(r.attended_by.as_deref())
        }),
    ]
}

pub const HEALTH_SEARCH_KEYS: &[&str] = &["cowName", "healthStatus", "illness", "attendedBy"];
