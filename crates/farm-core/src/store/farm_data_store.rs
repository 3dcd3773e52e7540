//! Write-through cache of the farm record collections

use crate::clients::{FarmBackend, Notice, Notifier};
use crate::error::Result;
use farm_types::{
    Cow, CowId, CowUpdate, FeedRecord, HealthRecord, MilkRecord, NewCow, NewFeedRecord,
    NewHealthRecord, NewMilkRecord, NewSale, Sale, ValidationError,
};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// One consistent view of every cached collection
#[derive(Debug, Clone, Default, Serialize)]
pub struct FarmSnapshot {
    pub cows: Vec<Cow>,
    pub milk_records: Vec<MilkRecord>,
    pub feed_records: Vec<FeedRecord>,
    pub health_records: Vec<HealthRecord>,
    pub sales: Vec<Sale>,
}

impl FarmSnapshot {
    pub fn cow(&self, id: &CowId) -> Option<&Cow> {
        self.cows.iter().find(|c| &c.id == id)
    }
}

/// Messages shown for one kind of write
struct WriteNotices {
    success: &'static str,
    failure: &'static str,
}

/// Owns the cached collections and keeps them in step with the backend.
///
/// Every successful write is followed by a full refresh before it returns,
/// so callers never see a locally patched cache. A refresh replaces the
/// whole snapshot at once or leaves it untouched.
pub struct FarmDataStore {
    backend: Arc<dyn FarmBackend>,
    notifier: Arc<dyn Notifier>,
    snapshot: RwLock<Arc<FarmSnapshot>>,
    loading: AtomicBool,
}

impl FarmDataStore {
    pub fn new(backend: Arc<dyn FarmBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            notifier,
            snapshot: RwLock::new(Arc::new(FarmSnapshot::default())),
            loading: AtomicBool::new(true),
        }
    }

    /// Current cache contents; unaffected by later refreshes
    pub fn snapshot(&self) -> Arc<FarmSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// True until the first refresh has settled
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Reload every collection. Returns whether the cache was replaced;
    /// failures are reported through the notifier, never to the caller.
    pub async fn refresh(&self) -> bool {
        let replaced = match self.fetch_snapshot().await {
            Ok(snapshot) => {
                log::info!(
                    "Loaded {} cows, {} milk, {} feed, {} health records and {} sales",
                    snapshot.cows.len(),
                    snapshot.milk_records.len(),
                    snapshot.feed_records.len(),
                    snapshot.health_records.len(),
                    snapshot.sales.len()
                );
                *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
                true
            }
            Err(e) => {
                log::error!("Error fetching farm data: {}", e);
                self.notifier.notify(Notice::error("Failed to load farm data"));
                false
            }
        };

        self.loading.store(false, Ordering::SeqCst);
        replaced
    }

    async fn fetch_snapshot(&self) -> Result<FarmSnapshot> {
        let (cows, milk_records, feed_records, health_records, sales) = tokio::try_join!(
            self.backend.list_cows(),
            self.backend.list_milk_records(),
            self.backend.list_feed_records(),
            self.backend.list_health_records(),
            self.backend.list_sales(),
        )?;

        Ok(FarmSnapshot {
            cows,
            milk_records,
            feed_records,
            health_records,
            sales,
        })
    }

    async fn write_through<F>(
        &self,
        validation: std::result::Result<(), ValidationError>,
        write: F,
        notices: WriteNotices,
    ) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        let outcome = match validation {
            Ok(()) => write.await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = outcome {
            log::error!("{}: {}", notices.failure, e);
            self.notifier.notify(Notice::error(notices.failure));
            return Err(e);
        }

        self.notifier.notify(Notice::success(notices.success));
        self.refresh().await;
        Ok(())
    }

    pub async fn add_cow(&self, cow: NewCow) -> Result<()> {
        self.write_through(
            cow.validate(),
            self.backend.insert_cow(&cow),
            WriteNotices { success: "Cow added successfully", failure: "Failed to add cow" },
        )
        .await
    }

    pub async fn update_cow(&self, id: &CowId, update: CowUpdate) -> Result<()> {
        self.write_through(
            update.validate(),
            self.backend.update_cow(id, &update),
            WriteNotices { success: "Cow updated successfully", failure: "Failed to update cow" },
        )
        .await
    }

    pub async fn add_milk_record(&self, record: NewMilkRecord) -> Result<()> {
        self.write_through(
            record.validate(),
            self.backend.insert_milk_record(&record),
            WriteNotices { success: "Milk record added", failure: "Failed to add milk record" },
        )
        .await
    }

    pub async fn add_feed_record(&self, record: NewFeedRecord) -> Result<()> {
        self.write_through(
            record.validate(),
            self.backend.insert_feed_record(&record),
            WriteNotices { success: "Feed record added", failure: "Failed to add feed record" },
        )
        .await
    }

    pub async fn add_health_record(&self, record: NewHealthRecord) -> Result<()> {
        self.write_through(
            record.validate(),
            self.backend.insert_health_record(&record),
            WriteNotices { success: "Health record added", failure: "Failed to add health record" },
        )
        .await
    }

    pub async fn add_sale(&self, sale: NewSale) -> Result<()> {
        self.write_through(
            sale.validate(),
            self.backend.insert_sale(&sale),
            WriteNotices {
                success: "Milk sale recorded successfully",
                failure: "Failed to record milk sale",
            },
        )
        .await
    }
}
