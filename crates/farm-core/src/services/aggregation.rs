//! Aggregates over the cached record collections
//!
//! Every function here is pure: it borrows the collections, never mutates
//! them, and answers an empty selection with zero or an empty list.

use crate::store::FarmSnapshot;
use chrono::NaiveDate;
use farm_types::{
    Cow, CowFilter, CowId, CowStatus, DateRange, FeedRecord, HealthRecord, MilkRecord, Scope,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Label used when a record points at a cow that is not in the herd
pub const UNKNOWN_COW: &str = "Unknown";

/// Placeholder for an absent optional value
pub const NOT_AVAILABLE: &str = "N/A";

/// A record that belongs to one cow on one day
pub trait ScopedRecord {
    fn cow_id(&self) -> &CowId;
    fn date(&self) -> NaiveDate;
}

impl ScopedRecord for MilkRecord {
    fn cow_id(&self) -> &CowId {
        &self.cow_id
    }

    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl ScopedRecord for FeedRecord {
    fn cow_id(&self) -> &CowId {
        &self.cow_id
    }

    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl ScopedRecord for HealthRecord {
    fn cow_id(&self) -> &CowId {
        &self.cow_id
    }

    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Records dated inside `range` (both ends included) that belong to the
/// selected cow, in collection order
pub fn filter_by_scope<'a, R: ScopedRecord>(
    records: &'a [R],
    cow_filter: &CowFilter,
    range: &DateRange,
) -> Vec<&'a R> {
    records
        .iter()
        .filter(|r| range.contains(r.date()) && cow_filter.matches(r.cow_id()))
        .collect()
}

pub fn total_milk<'a, I>(records: I) -> f64
where
    I: IntoIterator<Item = &'a MilkRecord>,
{
    records.into_iter().map(|r| r.total_litres).sum()
}

/// Active cows in the herd, or 1/0 for a single selected cow
pub fn active_cow_count(cows: &[Cow], cow_filter: &CowFilter) -> usize {
    match cow_filter {
        CowFilter::All => cows.iter().filter(|c| c.status == CowStatus::Active).count(),
        CowFilter::Cow(id) => cows
            .iter()
            .find(|c| &c.id == id)
            .map_or(0, |c| usize::from(c.status == CowStatus::Active)),
    }
}

/// Round half away from zero to `places` decimals
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Milk per active cow, two decimals; zero when no cow is active
pub fn average_per_cow(total_milk: f64, active_cows: usize) -> f64 {
    if active_cows == 0 {
        return 0.0;
    }
    round_to(total_milk / active_cows as f64, 2)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub litres: f64,
}

/// Litres per day, ascending by date, one point per distinct date
pub fn time_series<'a, I>(records: I) -> Vec<DailyTotal>
where
    I: IntoIterator<Item = &'a MilkRecord>,
{
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in records {
        *by_date.entry(record.date).or_insert(0.0) += record.total_litres;
    }

    by_date
        .into_iter()
        .map(|(date, litres)| DailyTotal { date, litres })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CowTotal {
    pub cow_id: CowId,
    pub name: String,
    pub litres: f64,
}

/// Name and breed lookup over the herd
pub struct CowIndex<'a> {
    by_id: HashMap<&'a CowId, &'a Cow>,
}

impl<'a> CowIndex<'a> {
    pub fn new(cows: &'a [Cow]) -> Self {
        Self {
            by_id: cows.iter().map(|c| (&c.id, c)).collect(),
        }
    }

    pub fn get(&self, id: &CowId) -> Option<&'a Cow> {
        self.by_id.get(id).copied()
    }

    pub fn name(&self, id: &CowId) -> &'a str {
        self.get(id).map_or(UNKNOWN_COW, |c| c.name.as_str())
    }

    pub fn breed(&self, id: &CowId) -> &'a str {
        self.get(id).map_or(NOT_AVAILABLE, |c| c.breed.as_str())
    }
}

/// Top producers by summed litres, highest first.
///
/// Cows with equal totals keep the order in which they first appear in
/// `records`.
pub fn per_cow_leaderboard<'a, I>(records: I, cows: &[Cow], limit: usize) -> Vec<CowTotal>
where
    I: IntoIterator<Item = &'a MilkRecord>,
{
    let mut order: Vec<(&CowId, f64)> = Vec::new();
    let mut slots: HashMap<&CowId, usize> = HashMap::new();

    for record in records {
        let slot = *slots.entry(&record.cow_id).or_insert_with(|| {
            order.push((&record.cow_id, 0.0));
            order.len() - 1
        });
        order[slot].1 += record.total_litres;
    }

    let index = CowIndex::new(cows);
    let mut totals: Vec<CowTotal> = order
        .into_iter()
        .map(|(cow_id, litres)| CowTotal {
            cow_id: cow_id.clone(),
            name: index.name(cow_id).to_string(),
            litres,
        })
        .collect();

    // stable: ties stay in first-appearance order
    totals.sort_by(|a, b| b.litres.total_cmp(&a.litres));
    totals.truncate(limit);
    totals
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: CowStatus,
    pub count: usize,
}

/// Cows per status across the whole herd, omitting empty statuses
pub fn status_breakdown(cows: &[Cow]) -> Vec<StatusCount> {
    CowStatus::ALL
        .iter()
        .map(|&status| StatusCount {
            status,
            count: cows.iter().filter(|c| c.status == status).count(),
        })
        .filter(|s| s.count > 0)
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordTypeCounts {
    pub milk: usize,
    pub feed: usize,
    pub health: usize,
}

impl RecordTypeCounts {
    pub fn total(&self) -> usize {
        self.milk + self.feed + self.health
    }

    /// Labelled counts for a bar breakdown
    pub fn entries(&self) -> [(&'static str, usize); 3] {
        [
            ("Milk Records", self.milk),
            ("Feed Records", self.feed),
            ("Health Records", self.health),
        ]
    }
}

pub fn record_type_counts(
    milk: &[&MilkRecord],
    feed: &[&FeedRecord],
    health: &[&HealthRecord],
) -> RecordTypeCounts {
    RecordTypeCounts {
        milk: milk.len(),
        feed: feed.len(),
        health: health.len(),
    }
}

/// The three dated collections narrowed to one scope
#[derive(Debug, Clone)]
pub struct ScopedRecords<'a> {
    pub milk: Vec<&'a MilkRecord>,
    pub feed: Vec<&'a FeedRecord>,
    pub health: Vec<&'a HealthRecord>,
}

impl<'a> ScopedRecords<'a> {
    pub fn select(snapshot: &'a FarmSnapshot, scope: &Scope) -> Self {
        Self {
            milk: filter_by_scope(&snapshot.milk_records, &scope.cow_filter, &scope.range),
            feed: filter_by_scope(&snapshot.feed_records, &scope.cow_filter, &scope.range),
            health: filter_by_scope(&snapshot.health_records, &scope.cow_filter, &scope.range),
        }
    }

    pub fn counts(&self) -> RecordTypeCounts {
        record_type_counts(&self.milk, &self.feed, &self.health)
    }
}

/// Every dashboard figure for one scope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub scope: Scope,
    pub total_milk: f64,
    pub active_cows: usize,
    pub average_per_cow: f64,
    pub herd_size: usize,
    /// Status of the selected cow; `None` for the whole herd or a dangling id
    pub selected_status: Option<CowStatus>,
    pub time_series: Vec<DailyTotal>,
    pub leaderboard: Vec<CowTotal>,
    pub status_breakdown: Vec<StatusCount>,
    pub record_counts: RecordTypeCounts,
}

impl DashboardSummary {
    pub fn compute(snapshot: &FarmSnapshot, scope: &Scope, leaderboard_limit: usize) -> Self {
        let records = ScopedRecords::select(snapshot, scope);
        let total = total_milk(records.milk.iter().copied());
        let active_cows = active_cow_count(&snapshot.cows, &scope.cow_filter);

        let selected_status = match &scope.cow_filter {
            CowFilter::All => None,
            CowFilter::Cow(id) => snapshot.cow(id).map(|c| c.status),
        };

        Self {
            scope: scope.clone(),
            total_milk: total,
            active_cows,
            average_per_cow: average_per_cow(total, active_cows),
            herd_size: snapshot.cows.len(),
            selected_status,
            time_series: time_series(records.milk.iter().copied()),
            leaderboard: per_cow_leaderboard(
                records.milk.iter().copied(),
                &snapshot.cows,
                leaderboard_limit,
            ),
            status_breakdown: status_breakdown(&snapshot.cows),
            record_counts: records.counts(),
        }
    }

    pub fn is_single_day(&self) -> bool {
        self.scope.range.is_single_day()
    }

    pub fn total_records(&self) -> usize {
        self.record_counts.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn cow(id: &str, name: &str, status: CowStatus) -> Cow {
        Cow {
            id: CowId::from(id),
            name: name.to_string(),
            breed: "Jersey".to_string(),
            dob: day(1),
            number_of_calves: 0,
            last_calving_date: None,
            status,
            remarks: None,
        }
    }

    fn milk(cow_id: &str, date: NaiveDate, total: f64) -> MilkRecord {
        MilkRecord {
            id: format!("{}-{}-{}", cow_id, date, total),
            cow_id: CowId::from(cow_id),
            date,
            morning_litres: total,
            noon_litres: 0.0,
            evening_litres: 0.0,
            total_litres: total,
            recorded_by: None,
        }
    }

    #[test]
    fn test_average_is_zero_without_active_cows() {
        assert_eq!(average_per_cow(125.0, 0), 0.0);
        assert_eq!(average_per_cow(0.0, 0), 0.0);
    }

    #[test]
    fn test_average_rounds_to_two_places() {
        assert_eq!(average_per_cow(10.0, 3), 3.33);
        assert_eq!(average_per_cow(20.0, 3), 6.67);
    }

    #[test]
    fn test_active_count_for_single_cow() {
        let cows = vec![cow("a", "Amy", CowStatus::Active), cow("b", "Bea", CowStatus::Dry)];
        assert_eq!(active_cow_count(&cows, &CowFilter::All), 1);
        assert_eq!(active_cow_count(&cows, &CowFilter::Cow(CowId::from("a"))), 1);
        assert_eq!(active_cow_count(&cows, &CowFilter::Cow(CowId::from("b"))), 0);
        assert_eq!(active_cow_count(&cows, &CowFilter::Cow(CowId::from("zz"))), 0);
    }

    #[test]
    fn test_time_series_merges_same_day() {
        let records = vec![milk("a", day(2), 1.5), milk("b", day(1), 2.0), milk("a", day(2), 2.5)];
        let series = time_series(&records);
        assert_eq!(
            series,
            vec![
                DailyTotal { date: day(1), litres: 2.0 },
                DailyTotal { date: day(2), litres: 4.0 },
            ]
        );
    }

    #[test]
    fn test_empty_inputs_yield_identities() {
        let none: Vec<MilkRecord> = Vec::new();
        assert_eq!(total_milk(&none), 0.0);
        assert!(time_series(&none).is_empty());
        assert!(per_cow_leaderboard(&none, &[], 10).is_empty());
        assert!(status_breakdown(&[]).is_empty());
        assert_eq!(record_type_counts(&[], &[], &[]).total(), 0);
    }

    #[test]
    fn test_leaderboard_ties_keep_first_appearance() {
        let cows = vec![cow("a", "Amy", CowStatus::Active), cow("b", "Bea", CowStatus::Active)];
        let records = vec![milk("b", day(2), 5.0), milk("a", day(1), 2.0), milk("a", day(1), 3.0)];

        let board = per_cow_leaderboard(&records, &cows, 10);
        let names: Vec<_> = board.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Bea", "Amy"]);
        assert_eq!(board[1].litres, 5.0);
    }

    #[test]
    fn test_cow_index_placeholders() {
        let cows = vec![cow("a", "Amy", CowStatus::Active)];
        let index = CowIndex::new(&cows);
        assert_eq!(index.name(&CowId::from("a")), "Amy");
        assert_eq!(index.name(&CowId::from("x")), UNKNOWN_COW);
        assert_eq!(index.breed(&CowId::from("x")), NOT_AVAILABLE);
    }
}
