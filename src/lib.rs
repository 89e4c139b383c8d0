//! pay_bank - Exactly-Once Funds Transfers
//!
//! Moves money between customer accounts over PostgreSQL with exactly-once
//! effect per idempotency key, no lost updates and no overdrafts.
//!
//! # Modules
//!
//! - [`core_types`] - Identifier newtypes (CustomerId, AccountId, etc.)
//! - [`transfer`] - Transfer coordinator, ledger stores and history
//! - [`account`] - Customer onboarding storage
//! - [`user_auth`] - Sign-up, login and JWT middleware
//! - [`gateway`] - axum HTTP adapter
//! - [`config`] - YAML configuration with env overrides
//! - [`logging`] - tracing subscriber setup
//! - [`db`] - PostgreSQL pool and migrations

// Core types - must be first!
pub mod core_types;

pub mod config;
pub mod db;
pub mod logging;

pub mod account;
pub mod gateway;
pub mod transfer;
pub mod user_auth;

// Convenient re-exports at crate root
pub use core_types::{AccountId, CustomerId, IdempotencyKey, MinorUnits, TransferId};
pub use transfer::{
    PgLedger, TransferCoordinator, TransferError, TransferOutcome, TransferRecord,
    TransferRequest,
};
