//! Aggregations and views over the cached farm records

pub mod aggregation;
pub mod daily;
pub mod sales;
pub mod record_table;

pub use aggregation::{
    CowIndex,
    CowTotal,
    DailyTotal,
    DashboardSummary,
    RecordTypeCounts,
    ScopedRecords,
    StatusCount,
};
pub use daily::{DailyCowRow, DailyReport};
pub use sales::{PaymentTotal, SalesSummary};
pub use record_table::{
    CellValue,
    Column,
    RecordTable,
    SortConfig,
    SortDirection,
    TablePage,
    TableQuery,
};
