//! Cached farm records

pub mod farm_data_store;

pub use farm_data_store::{FarmDataStore, FarmSnapshot};
