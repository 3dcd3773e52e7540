//! Data access collaborator seam

use async_trait::async_trait;
use crate::error::Result;
use farm_types::{
    Cow, CowId, CowUpdate, FeedRecord, HealthRecord, MilkRecord, NewCow, NewFeedRecord,
    NewHealthRecord, NewMilkRecord, NewSale, Sale,
};

/// Storage operations the record cache depends on
///
/// Listings return every row of a collection. Writes return once the backend
/// has accepted the row; nothing is read back.
#[async_trait]
pub trait FarmBackend: Send + Sync {
    async fn list_cows(&self) -> Result<Vec<Cow>>;

    async fn list_milk_records(&self) -> Result<Vec<MilkRecord>>;

    async fn list_feed_records(&self) -> Result<Vec<FeedRecord>>;

    async fn list_health_records(&self) -> Result<Vec<HealthRecord>>;

    async fn list_sales(&self) -> Result<Vec<Sale>>;

    async fn insert_cow(&self, cow: &NewCow) -> Result<()>;

    async fn update_cow(&self, id: &CowId, update: &CowUpdate) -> Result<()>;

    async fn insert_milk_record(&self, record: &NewMilkRecord) -> Result<()>;

    async fn insert_feed_record(&self, record: &NewFeedRecord) -> Result<()>;

    async fn insert_health_record(&self, record: &NewHealthRecord) -> Result<()>;

    async fn insert_sale(&self, sale: &NewSale) -> Result<()>;
}
