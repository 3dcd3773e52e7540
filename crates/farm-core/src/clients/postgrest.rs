//! PostgREST client for the hosted farm database

use super::backend::FarmBackend;
use crate::config::BackendConfig;
use crate::error::{FarmError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use farm_types::{
    Cow, CowId, CowStatus, CowUpdate, FeedRecord, FeedUnit, HealthRecord, HealthStatus,
    MilkRecord, NewCow, NewFeedRecord, NewHealthRecord, NewMilkRecord, NewSale, PaymentMethod,
    Sale, TreatmentPeriod,
};
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const COWS_TABLE: &str = "cows";
const MILK_TABLE: &str = "milk_records";
const FEED_TABLE: &str = "feed_records";
const HEALTH_TABLE: &str = "health_records";
const SALES_TABLE: &str = "milk_sales";

pub struct PostgrestClient {
    config: BackendConfig,
    http_client: HttpClient,
}

impl PostgrestClient {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url.trim_end_matches('/'), table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.config.access_token.as_deref().unwrap_or(&self.config.api_key);
        request
            .header("apikey", &self.config.api_key)
            .header("Authorization", format!("Bearer {}", token))
    }

    async fn ensure_success(response: Response, operation: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
        Err(FarmError::Backend {
            operation: operation.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    /// Fetch every row of a table in the given order
    async fn select<T: DeserializeOwned>(&self, table: &str, order: &str) -> Result<Vec<T>> {
        let request = self.http_client
            .get(self.table_url(table))
            .query(&[("select", "*"), ("order", order)]);

        let response = self.authorize(request).send().await?;
        let response = Self::ensure_success(response, &format!("list {}", table)).await?;
        let body = response.text().await?;

        let rows: Vec<T> = serde_json::from_str(&body)
            .map_err(|e| FarmError::Deserialization(format!("Failed to parse {} rows: {}", table, e)))?;

        log::debug!("Fetched {} rows from {}", rows.len(), table);
        Ok(rows)
    }

    async fn insert<T: Serialize + ?Sized>(&self, table: &str, row: &T) -> Result<()> {
        let request = self.http_client
            .post(self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(row);

        let response = self.authorize(request).send().await?;
        Self::ensure_success(response, &format!("insert into {}", table)).await?;
        Ok(())
    }
}

#[async_trait]
impl FarmBackend for PostgrestClient {
    async fn list_cows(&self) -> Result<Vec<Cow>> {
        let rows: Vec<CowRow> = self.select(COWS_TABLE, "created_at.desc").await?;
        Ok(rows.into_iter().map(Cow::from).collect())
    }

    async fn list_milk_records(&self) -> Result<Vec<MilkRecord>> {
        let rows: Vec<MilkRow> = self.select(MILK_TABLE, "date.desc").await?;
        Ok(rows.into_iter().map(MilkRecord::from).collect())
    }

    async fn list_feed_records(&self) -> Result<Vec<FeedRecord>> {
        let rows: Vec<FeedRow> = self.select(FEED_TABLE, "date.desc").await?;
        Ok(rows.into_iter().map(FeedRecord::from).collect())
    }

    async fn list_health_records(&self) -> Result<Vec<HealthRecord>> {
        let rows: Vec<HealthRow> = self.select(HEALTH_TABLE, "date.desc").await?;
        Ok(rows.into_iter().map(HealthRecord::from).collect())
    }

    async fn list_sales(&self) -> Result<Vec<Sale>> {
        let rows: Vec<SaleRow> = self.select(SALES_TABLE, "date.desc").await?;
        Ok(rows.into_iter().map(Sale::from).collect())
    }

    async fn insert_cow(&self, cow: &NewCow) -> Result<()> {
        if cow.last_calving_date.is_some() {
            log::warn!("Hosted cows table has no last_calving_date column; value not stored");
        }
        self.insert(COWS_TABLE, &CowWriteRow::from(cow)).await
    }

    async fn update_cow(&self, id: &CowId, update: &CowUpdate) -> Result<()> {
        if update.last_calving_date.is_some() {
            log::warn!("Hosted cows table has no last_calving_date column; value not stored");
        }
        let request = self.http_client
            .patch(self.table_url(COWS_TABLE))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=minimal")
            .json(&CowWriteRow::from(update));

        let response = self.authorize(request).send().await?;
        Self::ensure_success(response, "update cows").await?;
        Ok(())
    }

    async fn insert_milk_record(&self, record: &NewMilkRecord) -> Result<()> {
        self.insert(MILK_TABLE, record).await
    }

    async fn insert_feed_record(&self, record: &NewFeedRecord) -> Result<()> {
        self.insert(FEED_TABLE, record).await
    }

    async fn insert_health_record(&self, record: &NewHealthRecord) -> Result<()> {
        if record.treatment_period.is_some() {
            log::warn!("Hosted health_records table has no treatment columns; period not stored");
        }
        self.insert(HEALTH_TABLE, &HealthInsertRow::from(record)).await
    }

    async fn insert_sale(&self, sale: &NewSale) -> Result<()> {
        self.insert(SALES_TABLE, &sale.normalized()).await
    }
}

// Row shapes as stored; nullable columns are optional here and defaulted on conversion

#[derive(Debug, Deserialize)]
struct CowRow {
    id: String,
    name: String,
    breed: String,
    dob: NaiveDate,
    number_of_calves: Option<u32>,
    #[serde(default)]
    last_calving_date: Option<NaiveDate>,
    status: CowStatus,
    remarks: Option<String>,
}

impl From<CowRow> for Cow {
    fn from(row: CowRow) -> Self {
        Self {
            id: CowId::new(row.id),
            name: row.name,
            breed: row.breed,
            dob: row.dob,
            number_of_calves: row.number_of_calves.unwrap_or(0),
            last_calving_date: row.last_calving_date,
            status: row.status,
            remarks: row.remarks.filter(|r| !r.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MilkRow {
    id: String,
    cow_id: String,
    date: NaiveDate,
    morning_litres: Option<f64>,
    noon_litres: Option<f64>,
    evening_litres: Option<f64>,
    total_litres: f64,
    recorded_by: Option<String>,
}

impl From<MilkRow> for MilkRecord {
    fn from(row: MilkRow) -> Self {
        Self {
            id: row.id,
            cow_id: CowId::new(row.cow_id),
            date: row.date,
            morning_litres: row.morning_litres.unwrap_or(0.0),
            noon_litres: row.noon_litres.unwrap_or(0.0),
            evening_litres: row.evening_litres.unwrap_or(0.0),
            total_litres: row.total_litres,
            recorded_by: row.recorded_by.filter(|r| !r.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeedRow {
    id: String,
    cow_id: String,
    date: NaiveDate,
    feed_type: String,
    quantity: f64,
    unit: FeedUnit,
}

impl From<FeedRow> for FeedRecord {
    fn from(row: FeedRow) -> Self {
        Self {
            id: row.id,
            cow_id: CowId::new(row.cow_id),
            date: row.date,
            feed_type: row.feed_type,
            quantity: row.quantity,
            unit: row.unit,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HealthRow {
    id: String,
    cow_id: String,
    date: NaiveDate,
    vaccination_date: Option<NaiveDate>,
    spray_date: Option<NaiveDate>,
    deworming_date: Option<NaiveDate>,
    health_status: HealthStatus,
    attended_by: Option<String>,
    illness: Option<String>,
    #[serde(default)]
    treatment_from: Option<NaiveDate>,
    #[serde(default)]
    treatment_to: Option<NaiveDate>,
}

impl From<HealthRow> for HealthRecord {
    fn from(row: HealthRow) -> Self {
        let treatment_period = match (row.treatment_from, row.treatment_to) {
            (Some(from), Some(to)) => Some(TreatmentPeriod { from, to }),
            _ => None,
        };

        Self {
            id: row.id,
            cow_id: CowId::new(row.cow_id),
            date: row.date,
            vaccination_date: row.vaccination_date,
            spray_date: row.spray_date,
            deworming_date: row.deworming_date,
            health_status: row.health_status,
            attended_by: row.attended_by.filter(|a| !a.is_empty()),
            illness: row.illness.filter(|i| !i.is_empty()),
            treatment_period,
        }
    }
}

/// Cow columns accepted on insert and patch; unset fields are left out
#[derive(Debug, Default, Serialize)]
struct CowWriteRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    breed: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dob: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    number_of_calves: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<CowStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remarks: Option<&'a str>,
}

impl<'a> From<&'a NewCow> for CowWriteRow<'a> {
    fn from(cow: &'a NewCow) -> Self {
        Self {
            name: Some(cow.name.as_str()),
            breed: Some(cow.breed.as_str()),
            dob: Some(cow.dob),
            number_of_calves: Some(cow.number_of_calves),
            status: Some(cow.status),
            remarks: cow.remarks.as_deref(),
        }
    }
}

impl<'a> From<&'a CowUpdate> for CowWriteRow<'a> {
    fn from(update: &'a CowUpdate) -> Self {
        Self {
            name: update.name.as_deref(),
            breed: update.breed.as_deref(),
            dob: update.dob,
            number_of_calves: update.number_of_calves,
            status: update.status,
            remarks: update.remarks.as_deref(),
        }
    }
}

/// Health columns accepted on insert; the treatment window is not stored
#[derive(Debug, Serialize)]
struct HealthInsertRow<'a> {
    cow_id: &'a CowId,
    date: NaiveDate,
    vaccination_date: Option<NaiveDate>,
    spray_date: Option<NaiveDate>,
    deworming_date: Option<NaiveDate>,
    health_status: HealthStatus,
    attended_by: Option<&'a str>,
    illness: Option<&'a str>,
}

impl<'a> From<&'a NewHealthRecord> for HealthInsertRow<'a> {
    fn from(record: &'a NewHealthRecord) -> Self {
        Self {
            cow_id: &record.cow_id,
            date: record.date,
            vaccination_date: record.vaccination_date,
            spray_date: record.spray_date,
            deworming_date: record.deworming_date,
            health_status: record.health_status,
            attended_by: record.attended_by.as_deref(),
            illness: record.illness.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SaleRow {
    id: String,
    date: NaiveDate,
    customer_name: String,
    litres: f64,
    amount: f64,
    payment_method: PaymentMethod,
    recorded_by: Option<String>,
}

impl From<SaleRow> for Sale {
    fn from(row: SaleRow) -> Self {
        Self {
            id: row.id,
            date: row.date,
            customer_name: row.customer_name,
            litres: row.litres,
            amount: row.amount,
            payment_method: row.payment_method,
            recorded_by: row.recorded_by,
        }
    }
}
