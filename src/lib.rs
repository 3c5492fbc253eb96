pub mod config;
pub mod models;
pub mod service;

pub use config::{AppConfig, ParserConfig};
pub use service::normalizer;
pub use service::{AllocationEngine, ReceiptParser};
