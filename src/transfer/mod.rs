//! Funds Transfer
//!
//! Moves money between two customer accounts exactly once per idempotency
//! key, without lost updates and without ever driving a balance negative.
//!
//! # Flow
//!
//! ```text
//! validate → idempotency pre-check → resolve accounts → balance pre-check
//!     → BEGIN → insert record → debit/credit (account-id order) → COMMIT
//!                     ↓ key conflict              ↓ error / timeout
//!                  ROLLBACK (Replayed)          ROLLBACK
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Relative Deltas**: balances change only through store-side `balance + delta`
//! 2. **Store-Side Guard**: a delta that would go below zero is refused under the row lock
//! 3. **Unique Key**: at most one record per idempotency key, conflicts resolve to replay
//! 4. **All or Nothing**: both deltas and the record commit together or not at all

pub mod coordinator;
pub mod db;
pub mod error;
pub mod store;
pub mod types;


// Re-exports for convenience
pub use coordinator::{DEFAULT_TRANSFER_TIMEOUT, TransferCoordinator};
pub use db::PgLedger;
pub use error::TransferError;
pub use store::{AccountStore, LedgerStore, TransferStore, UnitOfWork};
pub use types::{
    Account, TransferHistoryEntry, TransferOutcome, TransferParty, TransferRecord,
    TransferRequest,
};
