//! Process-local backend used for demos and tests

use super::backend::FarmBackend;
use crate::error::{FarmError, Result};
use async_trait::async_trait;
use farm_types::{
    Cow, CowId, CowUpdate, FeedRecord, HealthRecord, MilkRecord, NewCow, NewFeedRecord,
    NewHealthRecord, NewMilkRecord, NewSale, Sale,
};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    cows: Vec<Cow>,
    milk: Vec<MilkRecord>,
    feed: Vec<FeedRecord>,
    health: Vec<HealthRecord>,
    sales: Vec<Sale>,
}

/// In-memory tables with the same ordering rules as the hosted backend:
/// cows newest first, dated records most recent date first
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    tables: Mutex<Tables>,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the backend with existing rows, kept in the given order
    pub fn with_data(
        cows: Vec<Cow>,
        milk: Vec<MilkRecord>,
        feed: Vec<FeedRecord>,
        health: Vec<HealthRecord>,
        sales: Vec<Sale>,
    ) -> Self {
        Self {
            tables: Mutex::new(Tables { cows, milk, feed, health, sales }),
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| FarmError::ServiceUnavailable("in-memory backend lock poisoned".to_string()))
    }
}

/// Most recent date first; rows sharing a date keep their stored order
fn by_date_desc<T: Clone>(rows: &[T], date: impl Fn(&T) -> chrono::NaiveDate) -> Vec<T> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| date(b).cmp(&date(a)));
    sorted
}

#[async_trait]
impl FarmBackend for InMemoryBackend {
    async fn list_cows(&self) -> Result<Vec<Cow>> {
        Ok(self.tables()?.cows.clone())
    }

    async fn list_milk_records(&self) -> Result<Vec<MilkRecord>> {
        Ok(by_date_desc(&self.tables()?.milk, |r| r.date))
    }

    async fn list_feed_records(&self) -> Result<Vec<FeedRecord>> {
        Ok(by_date_desc(&self.tables()?.feed, |r| r.date))
    }

    async fn list_health_records(&self) -> Result<Vec<HealthRecord>> {
        Ok(by_date_desc(&self.tables()?.health, |r| r.date))
    }

    async fn list_sales(&self) -> Result<Vec<Sale>> {
        Ok(by_date_desc(&self.tables()?.sales, |s| s.date))
    }

    async fn insert_cow(&self, cow: &NewCow) -> Result<()> {
        let cow = cow.clone().into_cow(CowId::new(new_id()));
        self.tables()?.cows.insert(0, cow);
        Ok(())
    }

    async fn update_cow(&self, id: &CowId, update: &CowUpdate) -> Result<()> {
        let mut tables = self.tables()?;
        let cow = tables.cows
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| FarmError::NotFound(format!("Cow {} not found", id)))?;
        update.apply_to(cow);
        Ok(())
    }

    async fn insert_milk_record(&self, record: &NewMilkRecord) -> Result<()> {
        self.tables()?.milk.push(record.clone().into_record(new_id()));
        Ok(())
    }

    async fn insert_feed_record(&self, record: &NewFeedRecord) -> Result<()> {
        self.tables()?.feed.push(record.clone().into_record(new_id()));
        Ok(())
    }

    async fn insert_health_record(&self, record: &NewHealthRecord) -> Result<()> {
        self.tables()?.health.push(record.clone().into_record(new_id()));
        Ok(())
    }

    async fn insert_sale(&self, sale: &NewSale) -> Result<()> {
        self.tables()?.sales.push(sale.clone().into_sale(new_id()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use farm_types::CowStatus;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn new_cow(name: &str) -> NewCow {
        NewCow {
            name: name.to_string(),
            breed: "Ayrshire".to_string(),
            dob: day(1),
            number_of_calves: 0,
            last_calving_date: None,
            status: CowStatus::Active,
            remarks: None,
        }
    }

    #[tokio::test]
    async fn test_cows_listed_newest_first() {
        let backend = InMemoryBackend::new();
        backend.insert_cow(&new_cow("First")).await.unwrap();
        backend.insert_cow(&new_cow("Second")).await.unwrap();

        let cows = backend.list_cows().await.unwrap();
        assert_eq!(cows[0].name, "Second");
        assert_eq!(cows[1].name, "First");
        assert_ne!(cows[0].id, cows[1].id);
    }

    #[tokio::test]
    async fn test_milk_listed_by_date_desc() {
        let backend = InMemoryBackend::new();
        let cow = CowId::from("c1");
        backend.insert_milk_record(&NewMilkRecord::new(cow.clone(), day(1), 1.0, 0.0, 0.0)).await.unwrap();
        backend.insert_milk_record(&NewMilkRecord::new(cow.clone(), day(3), 3.0, 0.0, 0.0)).await.unwrap();
        backend.insert_milk_record(&NewMilkRecord::new(cow, day(2), 2.0, 0.0, 0.0)).await.unwrap();

        let dates: Vec<_> = backend.list_milk_records().await.unwrap().iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(3), day(2), day(1)]);
    }

    #[tokio::test]
    async fn test_update_unknown_cow_is_not_found() {
        let backend = InMemoryBackend::new();
        let result = backend.update_cow(&CowId::from("missing"), &CowUpdate::default()).await;
        assert!(matches!(result, Err(FarmError::NotFound(_))));
    }
}
