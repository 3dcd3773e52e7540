//! Assembles the farm analytics report for one scope

use super::document::{ReportDocument, ReportSection, ReportTable};
use crate::error::Result;
use crate::services::aggregation::{
    active_cow_count, average_per_cow, total_milk, CowIndex, ScopedRecords, NOT_AVAILABLE,
};
use crate::store::FarmSnapshot;
use chrono::{NaiveDate, NaiveDateTime};
use farm_types::{CowFilter, CowStatus, FeedRecord, HealthRecord, MilkRecord, Scope};

pub const REPORT_SUBTITLE: &str = "Farm Analytics Report";
pub const SECTION_UNAVAILABLE: &str = "Section unavailable: the data for this section could not be prepared";

pub const KEY_METRICS: &str = "Key Metrics";
pub const HERD_STATUS: &str = "Herd Status Breakdown";
pub const MILK_RECORDS: &str = "Milk Production Records";
pub const FEED_RECORDS: &str = "Feed Distribution Records";
pub const HEALTH_RECORDS: &str = "Health Management Records";

const FOOTER_RULE_WIDTH: usize = 80;

/// `Jan 5, 2024`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// `January 5, 2024`
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// `January 5, 2024 3:07:09 PM`
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format("%B %-d, %Y %-I:%M:%S %p").to_string()
}

fn format_optional_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| NOT_AVAILABLE.to_string(), format_date)
}

/// One date for a single day, otherwise `from - to`
pub fn period_description(scope: &Scope) -> String {
    if scope.range.is_single_day() {
        format_long_date(scope.range.from())
    } else {
        format!("{} - {}", format_date(scope.range.from()), format_date(scope.range.to()))
    }
}

/// "All Cows", the selected cow's name, or "Unknown Cow" for a dangling id
pub fn scope_label(snapshot: &FarmSnapshot, cow_filter: &CowFilter) -> String {
    match cow_filter {
        CowFilter::All => "All Cows".to_string(),
        CowFilter::Cow(id) => snapshot
            .cow(id)
            .map_or_else(|| "Unknown Cow".to_string(), |c| c.name.clone()),
    }
}

/// Stable sort, most recent date first
fn newest_first<'a, T>(records: &[&'a T], date: impl Fn(&T) -> NaiveDate) -> Vec<&'a T> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| date(*b).cmp(&date(*a)));
    sorted
}

pub struct ReportBuilder<'a> {
    snapshot: &'a FarmSnapshot,
    scope: &'a Scope,
    records: ScopedRecords<'a>,
    cows: CowIndex<'a>,
    farm_name: String,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(snapshot: &'a FarmSnapshot, scope: &'a Scope, farm_name: impl Into<String>) -> Self {
        Self {
            snapshot,
            scope,
            records: ScopedRecords::select(snapshot, scope),
            cows: CowIndex::new(&snapshot.cows),
            farm_name: farm_name.into(),
        }
    }

    pub fn build(&self, generated_at: NaiveDateTime) -> ReportDocument {
        let mut sections = vec![self.section(KEY_METRICS, self.metrics_table())];
        if self.scope.cow_filter.is_all() {
            sections.push(self.section(HERD_STATUS, self.herd_status_table()));
        }
        sections.push(self.section(MILK_RECORDS, self.milk_table()));
        sections.push(self.section(FEED_RECORDS, self.feed_table()));
        sections.push(self.section(HEALTH_RECORDS, self.health_table()));

        ReportDocument {
            title: self.farm_name.clone(),
            subtitle: REPORT_SUBTITLE.to_string(),
            header_lines: vec![
                format!("Generated: {}", format_timestamp(generated_at)),
                format!("Report Period: {}", period_description(self.scope)),
                format!("Data Scope: {}", scope_label(self.snapshot, &self.scope.cow_filter)),
                format!("Total Days Analyzed: {}", self.scope.range.day_count()),
            ],
            sections,
            footer_lines: vec![
                "-".repeat(FOOTER_RULE_WIDTH),
                "END OF REPORT".to_string(),
                "TRYDT Farmstead Management System".to_string(),
            ],
        }
    }

    fn section(&self, heading: &str, table: Result<ReportTable>) -> ReportSection {
        match table {
            Ok(table) => ReportSection::table(heading, table),
            Err(e) => {
                log::warn!("Report section '{}' failed: {}", heading, e);
                ReportSection::unavailable(heading, SECTION_UNAVAILABLE)
            }
        }
    }

    pub fn metrics_table(&self) -> Result<ReportTable> {
        let total = total_milk(self.records.milk.iter().copied());
        let active = active_cow_count(&self.snapshot.cows, &self.scope.cow_filter);
        let all = self.scope.cow_filter.is_all();

        let mut table = ReportTable::new(&["Metric", "Value", "Unit"]);
        table.push_row(vec![
            "Total Milk Production".to_string(),
            format!("{:.2}", total),
            "Litres".to_string(),
        ])?;
        table.push_row(vec![
            format!("Average per {}", if all { "Cow" } else { "Day" }),
            format!("{:.2}", average_per_cow(total, active)),
            "Litres".to_string(),
        ])?;
        table.push_row(vec![
            format!("{} Cows", if all { "Active" } else { "Total" }),
            active.to_string(),
            "Count".to_string(),
        ])?;
        table.push_row(vec![
            "Feed Distribution Events".to_string(),
            self.records.feed.len().to_string(),
            "Count".to_string(),
        ])?;
        table.push_row(vec![
            "Health Check Records".to_string(),
            self.records.health.len().to_string(),
            "Count".to_string(),
        ])?;
        Ok(table)
    }

    /// Every status, including empty ones, against the unfiltered herd
    pub fn herd_status_table(&self) -> Result<ReportTable> {
        let herd_size = self.snapshot.cows.len();
        let mut table = ReportTable::new(&["Status", "Count", "Percentage"]);

        for status in CowStatus::ALL {
            let count = self.snapshot.cows.iter().filter(|c| c.status == status).count();
            let percentage = if herd_size == 0 {
                0.0
            } else {
                count as f64 / herd_size as f64 * 100.0
            };
            table.push_row(vec![
                status.label().to_string(),
                count.to_string(),
                format!("{:.1}%", percentage),
            ])?;
        }
        Ok(table)
    }

    pub fn milk_table(&self) -> Result<ReportTable> {
        let mut table = ReportTable::new(&[
            "Date", "Cow Name", "Breed", "Morning (L)", "Midday (L)", "Evening (L)", "Total (L)",
            "Recorded By",
        ]);

        for record in newest_first(&self.records.milk, |r: &MilkRecord| r.date) {
            table.push_row(vec![
                format_date(record.date),
                self.cows.name(&record.cow_id).to_string(),
                self.cows.breed(&record.cow_id).to_string(),
                format!("{:.1}", record.morning_litres),
                format!("{:.1}", record.noon_litres),
                format!("{:.1}", record.evening_litres),
                format!("{:.1}", record.total_litres),
                record.recorded_by.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ])?;
        }
        Ok(table)
    }

    pub fn feed_table(&self) -> Result<ReportTable> {
        let mut table = ReportTable::new(&["Date", "Cow Name", "Feed Type", "Quantity", "Unit"]);

        for record in newest_first(&self.records.feed, |r: &FeedRecord| r.date) {
            table.push_row(vec![
                format_date(record.date),
                self.cows.name(&record.cow_id).to_string(),
                record.feed_type.clone(),
                format!("{:.1}", record.quantity),
                record.unit.to_string(),
            ])?;
        }
        Ok(table)
    }

    pub fn health_table(&self) -> Result<ReportTable> {
        let mut table = ReportTable::new(&[
            "Date", "Cow Name", "Health Status", "Vaccination", "Spray", "Deworming", "Attended By",
            "Notes",
        ]);

        for record in newest_first(&self.records.health, |r: &HealthRecord| r.date) {
            table.push_row(vec![
                format_date(record.date),
                self.cows.name(&record.cow_id).to_string(),
                record.health_status.to_string(),
                format_optional_date(record.vaccination_date),
                format_optional_date(record.spray_date),
                format_optional_date(record.deworming_date),
                record.attended_by.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                record.illness.clone().unwrap_or_else(|| "No issues".to_string()),
            ])?;
        }
        Ok(table)
    }
}
