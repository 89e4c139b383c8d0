//! Transfer Core Types
//!
//! Requests, records and outcomes flowing through the transfer orchestrator
//! and its ledger stores.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::core_types::{AccountId, CustomerId, IdempotencyKey, MinorUnits, TransferId};

/// Balance record, one per customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    /// Owning customer (one-to-one)
    pub customer_id: CustomerId,
    /// Balance in minor units, never negative
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

/// Validated transfer request handed over by the adapter layer
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Authenticated sender
    pub sender: CustomerId,
    pub receiver: CustomerId,
    pub idempotency_key: IdempotencyKey,
    /// Amount in minor units
    pub amount: MinorUnits,
}

impl TransferRequest {
    pub fn new(
        sender: CustomerId,
        receiver: CustomerId,
        idempotency_key: IdempotencyKey,
        amount: MinorUnits,
    ) -> Self {
        Self {
            sender,
            receiver,
            idempotency_key,
            amount,
        }
    }
}

/// Immutable record of a settled transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub id: TransferId,
    pub sender_account: AccountId,
    pub receiver_account: AccountId,
    pub idempotency_key: IdempotencyKey,
    /// Amount in minor units, always > 0
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl TransferRecord {
    /// Create a record with a freshly generated id, stamped now
    pub fn new(
        sender_account: AccountId,
        receiver_account: AccountId,
        idempotency_key: IdempotencyKey,
        amount: i64,
    ) -> Self {
        Self {
            id: TransferId::new(),
            sender_account,
            receiver_account,
            idempotency_key,
            amount,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for TransferRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transfer[{}] {} -> {} amount={} key={}",
            self.id, self.sender_account, self.receiver_account, self.amount, self.idempotency_key
        )
    }
}

/// Successful result of [`TransferCoordinator::execute`](super::TransferCoordinator::execute)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Funds moved and a new record was persisted
    Settled(TransferRecord),
    /// The idempotency key was already used; nothing new happened
    Replayed,
}

impl TransferOutcome {
    #[inline]
    pub fn is_replay(&self) -> bool {
        matches!(self, TransferOutcome::Replayed)
    }
}

/// Result of a relative balance mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOutcome {
    /// Delta applied; carries the balance the store computed
    Applied { balance: i64 },
    /// Not applied: the delta would drive the balance below zero
    Rejected,
    /// No such account row
    Missing,
    /// `balance + delta` does not fit in a BIGINT
    Overflow,
}

/// Result of a transfer record insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record with the same idempotency key already exists
    Conflict,
}

/// One side of a history entry
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferParty {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub account_id: AccountId,
}

/// Transfer as shown in a customer's transaction history
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferHistoryEntry {
    pub id: TransferId,
    pub sender: TransferParty,
    pub receiver: TransferParty,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_record_new() {
        let sender = AccountId::new();
        let receiver = AccountId::new();
        let key = IdempotencyKey::new();

        let record = TransferRecord::new(sender, receiver, key, 2500);

        assert_eq!(record.sender_account, sender);
        assert_eq!(record.receiver_account, receiver);
        assert_eq!(record.idempotency_key, key);
        assert_eq!(record.amount, 2500);
        assert_ne!(record.id, TransferRecord::new(sender, receiver, key, 2500).id);
    }

    #[test]
    fn test_outcome_is_replay() {
        assert!(TransferOutcome::Replayed.is_replay());
        let record = TransferRecord::new(AccountId::new(), AccountId::new(), IdempotencyKey::new(), 1);
        assert!(!TransferOutcome::Settled(record).is_replay());
    }
}
