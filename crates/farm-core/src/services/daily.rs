//! Single-day report per cow

use super::aggregation::{filter_by_scope, total_milk};
use crate::store::FarmSnapshot;
use chrono::NaiveDate;
use farm_types::{Cow, CowFilter, DateRange, FeedRecord, HealthRecord, MilkRecord};
use serde::Serialize;

/// What one cow produced and received on the report day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCowRow {
    pub cow: Cow,
    pub milk_litres: f64,
    /// First milk record of the day, for the session breakdown
    pub milk_detail: Option<MilkRecord>,
    /// Sum of feed quantities as entered, regardless of unit
    pub feed_quantity: f64,
    pub feed: Vec<FeedRecord>,
    pub health: Option<HealthRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub cow_filter: CowFilter,
    pub rows: Vec<DailyCowRow>,
    pub total_milk: f64,
    pub total_feed: f64,
}

impl DailyReport {
    /// Build the day view. The whole herd gets one row per cow in herd
    /// order, including cows with nothing recorded; a single cow gets its
    /// own row, or none when the id is not in the herd.
    pub fn build(snapshot: &FarmSnapshot, cow_filter: &CowFilter, date: NaiveDate) -> Self {
        let day = DateRange::single_day(date);
        let milk = filter_by_scope(&snapshot.milk_records, cow_filter, &day);
        let feed = filter_by_scope(&snapshot.feed_records, cow_filter, &day);
        let health = filter_by_scope(&snapshot.health_records, cow_filter, &day);

        let rows = snapshot
            .cows
            .iter()
            .filter(|cow| cow_filter.matches(&cow.id))
            .map(|cow| {
                let cow_milk: Vec<&MilkRecord> =
                    milk.iter().copied().filter(|r| r.cow_id == cow.id).collect();
                let cow_feed: Vec<FeedRecord> = feed
                    .iter()
                    .filter(|r| r.cow_id == cow.id)
                    .map(|r| (*r).clone())
                    .collect();

                DailyCowRow {
                    cow: cow.clone(),
                    milk_litres: total_milk(cow_milk.iter().copied()),
                    milk_detail: cow_milk.first().map(|r| (*r).clone()),
                    feed_quantity: cow_feed.iter().map(|f| f.quantity).sum(),
                    feed: cow_feed,
                    health: health.iter().find(|r| r.cow_id == cow.id).map(|r| (*r).clone()),
                }
            })
            .collect();

        Self {
            date,
            cow_filter: cow_filter.clone(),
            rows,
            total_milk: total_milk(milk.iter().copied()),
            total_feed: feed.iter().map(|f| f.quantity).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
