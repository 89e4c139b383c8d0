//! Transfer Coordinator
//!
//! Orchestrates a single funds transfer: business checks, idempotency
//! resolution and the atomic unit of work that moves the money.
//!
//! The balance pre-check is only a fast-path rejection. Overdraft safety
//! comes from the store refusing any delta that would drive a balance below
//! zero while it holds the row exclusively.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::error::TransferError;
use super::store::{LedgerStore, UnitOfWork};
use super::types::{Account, DeltaOutcome, InsertOutcome, TransferOutcome, TransferRecord, TransferRequest};
use crate::core_types::{AccountId, CustomerId};

/// Default upper bound for the unit of work
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(5);

/// Transfer Coordinator - the only writer of account balances
pub struct TransferCoordinator {
    ledger: Arc<dyn LedgerStore>,
    timeout: Duration,
}

impl TransferCoordinator {
    /// Create a new TransferCoordinator
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self::with_timeout(ledger, DEFAULT_TRANSFER_TIMEOUT)
    }

    /// Create coordinator with a specific unit-of-work timeout
    pub fn with_timeout(ledger: Arc<dyn LedgerStore>, timeout: Duration) -> Self {
        Self { ledger, timeout }
    }

    /// Execute a transfer exactly once per idempotency key
    ///
    /// Returns [`TransferOutcome::Replayed`] when the key was already used,
    /// whether that is noticed up front or by the uniqueness constraint at
    /// insert time. Business rejections and infrastructure failures leave no
    /// persistent side effect.
    pub async fn execute(&self, req: TransferRequest) -> Result<TransferOutcome, TransferError> {
        let result = self.run(&req).await;

        match &result {
            Ok(TransferOutcome::Settled(record)) => info!(
                transfer_id = %record.id,
                idempotency_key = %req.idempotency_key,
                amount = req.amount,
                "Transfer settled"
            ),
            Ok(TransferOutcome::Replayed) => info!(
                idempotency_key = %req.idempotency_key,
                "Transfer replayed, no new effect"
            ),
            Err(e) if e.is_business() => warn!(
                sender = %req.sender,
                receiver = %req.receiver,
                amount = req.amount,
                code = e.code(),
                "Transfer rejected"
            ),
            Err(e) if e.is_fatal() => error!(
                alert = true,
                sender = %req.sender,
                receiver = %req.receiver,
                idempotency_key = %req.idempotency_key,
                error = %e,
                "Ledger invariant violated"
            ),
            Err(e) => error!(
                idempotency_key = %req.idempotency_key,
                error = %e,
                "Transfer failed, rolled back"
            ),
        }

        result
    }

    async fn run(&self, req: &TransferRequest) -> Result<TransferOutcome, TransferError> {
        if req.sender == req.receiver {
            return Err(TransferError::SelfTransfer);
        }

        if req.amount == 0 {
            return Err(TransferError::ZeroAmount);
        }

        if let Some(existing) = self
            .ledger
            .find_by_idempotency_key(req.idempotency_key)
            .await?
        {
            debug!(transfer_id = %existing.id, "Idempotency key already settled");
            return Ok(TransferOutcome::Replayed);
        }

        let sender = self.resolve_account(req.sender, "sender").await?;
        let receiver = self.resolve_account(req.receiver, "receiver").await?;

        // An amount beyond i64 can never be covered by a BIGINT balance
        let Ok(amount) = i64::try_from(req.amount) else {
            return Err(TransferError::InsufficientBalance);
        };

        if sender.balance < amount {
            return Err(TransferError::InsufficientBalance);
        }

        let record = TransferRecord::new(sender.id, receiver.id, req.idempotency_key, amount);

        // Dropping an unfinished unit of work rolls it back
        match tokio::time::timeout(self.timeout, self.settle(&record)).await {
            Ok(result) => result,
            Err(_) => Err(TransferError::Timeout),
        }
    }

    async fn resolve_account(
        &self,
        customer_id: CustomerId,
        role: &str,
    ) -> Result<Account, TransferError> {
        self.ledger
            .find_by_customer(customer_id)
            .await?
            .ok_or_else(|| {
                TransferError::InvariantViolation(format!(
                    "{} customer {} has no account",
                    role, customer_id
                ))
            })
    }

    async fn settle(&self, record: &TransferRecord) -> Result<TransferOutcome, TransferError> {
        let mut uow = self.ledger.begin().await?;

        match apply_transfer(uow.as_mut(), record).await {
            Ok(InsertOutcome::Inserted) => {
                uow.commit().await?;
                Ok(TransferOutcome::Settled(record.clone()))
            }
            Ok(InsertOutcome::Conflict) => {
                // A concurrent request with the same key committed first
                if let Err(e) = uow.rollback().await {
                    warn!(transfer_id = %record.id, error = %e, "Rollback after key conflict failed");
                }
                Ok(TransferOutcome::Replayed)
            }
            Err(e) => {
                if let Err(rb) = uow.rollback().await {
                    warn!(transfer_id = %record.id, error = %rb, "Rollback failed");
                }
                Err(e)
            }
        }
    }
}

/// Record insertion, debit and credit inside one unit of work
///
/// The record goes in first. A concurrent duplicate of the same key waits on
/// the unique index and then conflicts before it touches any account row.
/// Legs are applied in ascending account-id order so two opposite transfers
/// between the same pair always lock rows in the same order.
async fn apply_transfer(
    uow: &mut dyn UnitOfWork,
    record: &TransferRecord,
) -> Result<InsertOutcome, TransferError> {
    if uow.insert_transfer(record).await? == InsertOutcome::Conflict {
        return Ok(InsertOutcome::Conflict);
    }

    let mut legs = [
        (record.sender_account, -record.amount),
        (record.receiver_account, record.amount),
    ];
    legs.sort_by_key(|(account_id, _)| *account_id);

    for (account_id, delta) in legs {
        let outcome = uow.apply_delta(account_id, delta).await?;
        check_leg(account_id, delta, outcome)?;
    }

    Ok(InsertOutcome::Inserted)
}

fn check_leg(
    account_id: AccountId,
    delta: i64,
    outcome: DeltaOutcome,
) -> Result<(), TransferError> {
    match outcome {
        DeltaOutcome::Applied { balance } => {
            debug!(account_id = %account_id, delta, balance, "Delta applied");
            Ok(())
        }
        DeltaOutcome::Rejected if delta < 0 => Err(TransferError::InsufficientBalance),
        DeltaOutcome::Rejected => Err(TransferError::InvariantViolation(format!(
            "account {} rejected a credit",
            account_id
        ))),
        DeltaOutcome::Missing => Err(TransferError::InvariantViolation(format!(
            "account {} disappeared during the transfer",
            account_id
        ))),
        DeltaOutcome::Overflow => Err(TransferError::InvariantViolation(format!(
            "account {} balance would overflow",
            account_id
        ))),
    }
}
