//! HTTP handlers

pub mod health;
pub mod history;
pub mod transfer;

pub use health::health_check;
pub use history::{HistoryQuery, get_transactions_history};
pub use transfer::{IDEMPOTENCY_KEY_HEADER, TransferBody, create_transfer};
