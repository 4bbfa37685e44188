//! # litfetch
//!
//! A command-line client for searching a remote literature index and
//! downloading document artifacts.
//!
//! ## Architecture
//!
//! - [`models`]: Core data structures (records, queries, result pages)
//! - [`store`]: Access to the remote index, behind the [`store::RecordStore`] trait
//! - [`navigator`]: Visit-order page cache with cursor-based navigation
//! - [`transfer`]: Segmented concurrent download engine
//! - [`config`]: Layered configuration (TOML file + environment)
//! - [`ui`]: Terminal presentation helpers

pub mod config;
pub mod models;
pub mod navigator;
pub mod store;
pub mod transfer;
pub mod ui;

// Re-export commonly used types
pub use models::{Record, ResultPage, SearchQuery};
pub use navigator::{Navigator, NavigatorError};
pub use store::{HttpStore, RecordStore, StoreError};
pub use transfer::{TransferEngine, TransferError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
