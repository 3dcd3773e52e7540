//! Shared record types for the farm record system

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Tolerance used when checking that a milk total matches its sessions
pub const MILK_TOTAL_TOLERANCE: f64 = 1e-6;

/// Error for an enum value that is not part of the closed set
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid {kind} value: '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Error raised by write payload validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be a finite number (got {value})")]
    NotFinite { field: &'static str, value: f64 },

    #[error("total litres {total} does not equal morning + noon + evening ({sum})")]
    TotalMismatch { total: f64, sum: f64 },

    #[error("date range is inverted: {from} is after {to}")]
    InvertedRange { from: NaiveDate, to: NaiveDate },
}

/// Strongly typed cow identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CowId(String);

impl CowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Herd status of a cow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CowStatus {
    Active,
    Pregnant,
    Dry,
    Sick,
}

impl CowStatus {
    /// Every status in display order
    pub const ALL: [CowStatus; 4] = [Self::Active, Self::Pregnant, Self::Dry, Self::Sick];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pregnant => "pregnant",
            Self::Dry => "dry",
            Self::Sick => "sick",
        }
    }

    /// Capitalised label used in tables and charts
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Pregnant => "Pregnant",
            Self::Dry => "Dry",
            Self::Sick => "Sick",
        }
    }
}

impl fmt::Display for CowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CowStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "pregnant" => Ok(Self::Pregnant),
            "dry" => Ok(Self::Dry),
            "sick" => Ok(Self::Sick),
            other => Err(ParseEnumError { kind: "cow status", value: other.to_string() }),
        }
    }
}

/// Unit a feed quantity is measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedUnit {
    Kg,
    Bags,
    Bundles,
}

impl FeedUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kg => "kg",
            Self::Bags => "bags",
            Self::Bundles => "bundles",
        }
    }
}

impl fmt::Display for FeedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedUnit {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kg" => Ok(Self::Kg),
            "bags" => Ok(Self::Bags),
            "bundles" => Ok(Self::Bundles),
            other => Err(ParseEnumError { kind: "feed unit", value: other.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Sickness,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Sickness => "sickness",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "healthy" => Ok(Self::Healthy),
            "sickness" => Ok(Self::Sickness),
            other => Err(ParseEnumError { kind: "health status", value: other.to_string() }),
        }
    }
}

/// How a milk sale was paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Mpesa,
    Cash,
    Bank,
    Credit,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [Self::Mpesa, Self::Cash, Self::Bank, Self::Credit];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mpesa => "mpesa",
            Self::Cash => "cash",
            Self::Bank => "bank",
            Self::Credit => "credit",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Mpesa => "M-Pesa",
            Self::Cash => "Cash",
            Self::Bank => "Bank",
            Self::Credit => "Credit",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mpesa" => Ok(Self::Mpesa),
            "cash" => Ok(Self::Cash),
            "bank" => Ok(Self::Bank),
            "credit" => Ok(Self::Credit),
            other => Err(ParseEnumError { kind: "payment method", value: other.to_string() }),
        }
    }
}

/// A registered cow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cow {
    pub id: CowId,
    pub name: String,
    pub breed: String,
    pub dob: NaiveDate,
    pub number_of_calves: u32,
    pub last_calving_date: Option<NaiveDate>,
    pub status: CowStatus,
    pub remarks: Option<String>,
}

/// Milk yield of one cow on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilkRecord {
    pub id: String,
    pub cow_id: CowId,
    pub date: NaiveDate,
    pub morning_litres: f64,
    pub noon_litres: f64,
    pub evening_litres: f64,
    /// Sum of the three sessions, fixed when the record was written
    pub total_litres: f64,
    pub recorded_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedRecord {
    pub id: String,
    pub cow_id: CowId,
    pub date: NaiveDate,
    pub feed_type: String,
    pub quantity: f64,
    pub unit: FeedUnit,
}

/// Inclusive treatment window attached to a health record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentPeriod {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: String,
    pub cow_id: CowId,
    pub date: NaiveDate,
    pub vaccination_date: Option<NaiveDate>,
    pub spray_date: Option<NaiveDate>,
    pub deworming_date: Option<NaiveDate>,
    pub health_status: HealthStatus,
    pub attended_by: Option<String>,
    pub illness: Option<String>,
    pub treatment_period: Option<TreatmentPeriod>,
}

/// Milk sold to a customer; not tied to a cow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    pub date: NaiveDate,
    pub customer_name: String,
    pub litres: f64,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub recorded_by: Option<String>,
}

fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(())
}

fn require_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field, value });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}

/// Registration payload for a new cow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCow {
    pub name: String,
    pub breed: String,
    pub dob: NaiveDate,
    pub number_of_calves: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_calving_date: Option<NaiveDate>,
    pub status: CowStatus,
    pub remarks: Option<String>,
}

impl NewCow {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("breed", &self.breed)
    }

    pub fn into_cow(self, id: CowId) -> Cow {
        Cow {
            id,
            name: self.name,
            breed: self.breed,
            dob: self.dob,
            number_of_calves: self.number_of_calves,
            last_calving_date: self.last_calving_date,
            status: self.status,
            remarks: self.remarks,
        }
    }
}

/// Partial edit of a cow; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CowUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_calves: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_calving_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CowStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl CowUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(breed) = &self.breed {
            require_text("breed", breed)?;
        }
        Ok(())
    }

    pub fn apply_to(&self, cow: &mut Cow) {
        if let Some(name) = &self.name {
            cow.name = name.clone();
        }
        if let Some(breed) = &self.breed {
            cow.breed = breed.clone();
        }
        if let Some(dob) = self.dob {
            cow.dob = dob;
        }
        if let Some(calves) = self.number_of_calves {
            cow.number_of_calves = calves;
        }
        if let Some(date) = self.last_calving_date {
            cow.last_calving_date = Some(date);
        }
        if let Some(status) = self.status {
            cow.status = status;
        }
        if let Some(remarks) = &self.remarks {
            cow.remarks = Some(remarks.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMilkRecord {
    pub cow_id: CowId,
    pub date: NaiveDate,
    pub morning_litres: f64,
    pub noon_litres: f64,
    pub evening_litres: f64,
    pub total_litres: f64,
    pub recorded_by: Option<String>,
}

impl NewMilkRecord {
    /// Build a record whose total is the sum of the three sessions
    pub fn new(cow_id: CowId, date: NaiveDate, morning: f64, noon: f64, evening: f64) -> Self {
        Self {
            cow_id,
            date,
            morning_litres: morning,
            noon_litres: noon,
            evening_litres: evening,
            total_litres: morning + noon + evening,
            recorded_by: None,
        }
    }

    pub fn recorded_by(mut self, who: impl Into<String>) -> Self {
        self.recorded_by = Some(who.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("cow_id", self.cow_id.as_str())?;
        require_non_negative("morning_litres", self.morning_litres)?;
        require_non_negative("noon_litres", self.noon_litres)?;
        require_non_negative("evening_litres", self.evening_litres)?;
        require_non_negative("total_litres", self.total_litres)?;
        let sum = self.morning_litres + self.noon_litres + self.evening_litres;
        if (self.total_litres - sum).abs() > MILK_TOTAL_TOLERANCE {
            return Err(ValidationError::TotalMismatch { total: self.total_litres, sum });
        }
        Ok(())
    }

    pub fn into_record(self, id: String) -> MilkRecord {
        MilkRecord {
            id,
            cow_id: self.cow_id,
            date: self.date,
            morning_litres: self.morning_litres,
            noon_litres: self.noon_litres,
            evening_litres: self.evening_litres,
            total_litres: self.total_litres,
            recorded_by: self.recorded_by,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFeedRecord {
    pub cow_id: CowId,
    pub date: NaiveDate,
    pub feed_type: String,
    pub quantity: f64,
    pub unit: FeedUnit,
}

impl NewFeedRecord {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("cow_id", self.cow_id.as_str())?;
        require_text("feed_type", &self.feed_type)?;
        require_non_negative("quantity", self.quantity)
    }

    pub fn into_record(self, id: String) -> FeedRecord {
        FeedRecord {
            id,
            cow_id: self.cow_id,
            date: self.date,
            feed_type: self.feed_type,
            quantity: self.quantity,
            unit: self.unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHealthRecord {
    pub cow_id: CowId,
    pub date: NaiveDate,
    pub vaccination_date: Option<NaiveDate>,
    pub spray_date: Option<NaiveDate>,
    pub deworming_date: Option<NaiveDate>,
    pub health_status: HealthStatus,
    pub attended_by: Option<String>,
    pub illness: Option<String>,
    pub treatment_period: Option<TreatmentPeriod>,
}

impl NewHealthRecord {
    /// A plain check-up with no treatments recorded
    pub fn checkup(cow_id: CowId, date: NaiveDate, health_status: HealthStatus) -> Self {
        Self {
            cow_id,
            date,
            vaccination_date: None,
            spray_date: None,
            deworming_date: None,
            health_status,
            attended_by: None,
            illness: None,
            treatment_period: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("cow_id", self.cow_id.as_str())?;
        if let Some(period) = &self.treatment_period {
            if period.from > period.to {
                return Err(ValidationError::InvertedRange { from: period.from, to: period.to });
            }
        }
        Ok(())
    }

    pub fn into_record(self, id: String) -> HealthRecord {
        HealthRecord {
            id,
            cow_id: self.cow_id,
            date: self.date,
            vaccination_date: self.vaccination_date,
            spray_date: self.spray_date,
            deworming_date: self.deworming_date,
            health_status: self.health_status,
            attended_by: self.attended_by,
            illness: self.illness,
            treatment_period: self.treatment_period,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSale {
    pub date: NaiveDate,
    pub customer_name: String,
    pub litres: f64,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub recorded_by: Option<String>,
}

impl NewSale {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("customer_name", &self.customer_name)?;
        require_non_negative("litres", self.litres)?;
        require_non_negative("amount", self.amount)
    }

    /// The payload as stored, customer name trimmed
    pub fn normalized(&self) -> Self {
        Self {
            customer_name: self.customer_name.trim().to_string(),
            ..self.clone()
        }
    }

    pub fn into_sale(self, id: String) -> Sale {
        let sale = self.normalized();
        Sale {
            id,
            date: sale.date,
            customer_name: sale.customer_name,
            litres: sale.litres,
            amount: sale.amount,
            payment_method: sale.payment_method,
            recorded_by: sale.recorded_by,
        }
    }
}

/// Which cows a view covers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CowFilter {
    All,
    Cow(CowId),
}

impl CowFilter {
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn matches(&self, cow_id: &CowId) -> bool {
        match self {
            Self::All => true,
            Self::Cow(selected) => selected == cow_id,
        }
    }
}

impl fmt::Display for CowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Cow(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for CowFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(ValidationError::Empty("cow filter")),
            "all" => Ok(Self::All),
            id => Ok(Self::Cow(CowId::new(id))),
        }
    }
}

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = ValidationError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        Self::new(raw.from, raw.to)
    }
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ValidationError> {
        if from > to {
            return Err(ValidationError::InvertedRange { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self { from: date, to: date }
    }

    /// The `days` days before `end` through `end` itself
    pub fn ending_on(end: NaiveDate, days: i64) -> Self {
        Self { from: end - Duration::days(days.max(0)), to: end }
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn is_single_day(&self) -> bool {
        self.from == self.to
    }

    /// Number of calendar days covered, both ends included
    pub fn day_count(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

/// A cow selection together with a date range
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub cow_filter: CowFilter,
    pub range: DateRange,
}

impl Scope {
    pub fn new(cow_filter: CowFilter, range: DateRange) -> Self {
        Self { cow_filter, range }
    }

    pub fn all_cows(range: DateRange) -> Self {
        Self::new(CowFilter::All, range)
    }
}
