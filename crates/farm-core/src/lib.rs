//! TRYDT Farmstead core library
//!
//! Record cache, aggregation engine and report export for the farm record
//! system. Storage lives behind the [`FarmBackend`] collaborator; everything
//! in here works on the cached collections.

pub mod config;
pub mod clients;
pub mod store;
pub mod services;
pub mod report;
pub mod error;

// Re-export main types for easy access
pub use config::FarmConfig;
pub use error::{FarmError, Result};

// Re-export all client types
pub use clients::{
    FarmBackend,
    InMemoryBackend,
    PostgrestClient,
    PdfService,
    Notifier,
    LogNotifier,
};

// Re-export store types
pub use store::{FarmDataStore, FarmSnapshot};

// Re-export service types
pub use services::{
    DashboardSummary,
    DailyReport,
    SalesSummary,
    RecordTable,
};

// Re-export report types
pub use report::{
    ReportDocument,
    ReportExporter,
    DocumentRenderer,
    TextRenderer,
    JsonRenderer,
    PdfServiceRenderer,
};
