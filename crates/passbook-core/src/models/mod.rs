//! Data models shared across the pipeline.

pub mod category;
pub mod config;
pub mod transaction;

pub use category::{slugify, CategoryDefinition};
pub use config::PassbookConfig;
pub use transaction::{CategorySource, Currency, RawAuditLine, Transaction, TransactionType};
