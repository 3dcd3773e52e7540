//! Fixtures shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use farm_core::clients::{Notice, NoticeLevel};
use farm_core::{FarmBackend, FarmError, InMemoryBackend, Notifier, Result};
use farm_types::{
    Cow, CowId, CowStatus, CowUpdate, FeedRecord, FeedUnit, HealthRecord, HealthStatus,
    MilkRecord, NewCow, NewFeedRecord, NewHealthRecord, NewMilkRecord, NewSale, Sale,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn cow(id: &str, name: &str, status: CowStatus) -> Cow {
    Cow {
        id: CowId::from(id),
        name: name.to_string(),
        breed: "Friesian".to_string(),
        dob: date(2020, 5, 1),
        number_of_calves: 1,
        last_calving_date: None,
        status,
        remarks: None,
    }
}

pub fn milk(id: &str, cow_id: &str, day: NaiveDate, total: f64) -> MilkRecord {
    MilkRecord {
        id: id.to_string(),
        cow_id: CowId::from(cow_id),
        date: day,
        morning_litres: total,
        noon_litres: 0.0,
        evening_litres: 0.0,
        total_litres: total,
        recorded_by: Some("Wanjiru".to_string()),
    }
}

pub fn feed(id: &str, cow_id: &str, day: NaiveDate, quantity: f64) -> FeedRecord {
    FeedRecord {
        id: id.to_string(),
        cow_id: CowId::from(cow_id),
        date: day,
        feed_type: "Napier grass".to_string(),
        quantity,
        unit: FeedUnit::Bundles,
    }
}

pub fn health(id: &str, cow_id: &str, day: NaiveDate, status: HealthStatus) -> HealthRecord {
    HealthRecord {
        id: id.to_string(),
        cow_id: CowId::from(cow_id),
        date: day,
        vaccination_date: None,
        spray_date: None,
        deworming_date: None,
        health_status: status,
        attended_by: None,
        illness: None,
        treatment_period: None,
    }
}

/// Collects every notice for later assertions
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn messages(&self, level: NoticeLevel) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|n| n.level == level)
            .map(|n| n.message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// In-memory backend with switchable failures and call counters
#[derive(Default)]
pub struct FlakyBackend {
    pub inner: InMemoryBackend,
    pub fail_listing: AtomicBool,
    pub fail_writes: AtomicBool,
    pub listing_calls: AtomicUsize,
    pub write_calls: AtomicUsize,
}

impl FlakyBackend {
    pub fn new(inner: InMemoryBackend) -> Self {
        Self { inner, ..Default::default() }
    }

    fn listing(&self) -> Result<()> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(FarmError::ServiceUnavailable("listing refused".to_string()));
        }
        Ok(())
    }

    fn write(&self) -> Result<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FarmError::Backend {
                operation: "insert".to_string(),
                status: 409,
                message: "conflict".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FarmBackend for FlakyBackend {
    async fn list_cows(&self) -> Result<Vec<Cow>> {
        self.listing()?;
        self.inner.list_cows().await
    }

    async fn list_milk_records(&self) -> Result<Vec<MilkRecord>> {
        self.listing()?;
        self.inner.list_milk_records().await
    }

    async fn list_feed_records(&self) -> Result<Vec<FeedRecord>> {
        self.listing()?;
        self.inner.list_feed_records().await
    }

    async fn list_health_records(&self) -> Result<Vec<HealthRecord>> {
        self.listing()?;
        self.inner.list_health_records().await
    }

    async fn list_sales(&self) -> Result<Vec<Sale>> {
        self.listing()?;
        self.inner.list_sales().await
    }

    async fn insert_cow(&self, cow: &NewCow) -> Result<()> {
        self.write()?;
        self.inner.insert_cow(cow).await
    }

    async fn update_cow(&self, id: &CowId, update: &CowUpdate) -> Result<()> {
        self.write()?;
        self.inner.update_cow(id, update).await
    }

    async fn insert_milk_record(&self, record: &NewMilkRecord) -> Result<()> {
        self.write()?;
        self.inner.insert_milk_record(record).await
    }

    async fn insert_feed_record(&self, record: &NewFeedRecord) -> Result<()> {
        self.write()?;
        self.inner.insert_feed_record(record).await
    }

    async fn insert_health_record(&self, record: &NewHealthRecord) -> Result<()> {
        self.write()?;
        self.inner.insert_health_record(record).await
    }

    async fn insert_sale(&self, sale: &NewSale) -> Result<()> {
        self.write()?;
        self.inner.insert_sale(sale).await
    }
}
