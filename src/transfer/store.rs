//! Ledger Store Seams
//!
//! Contracts the transfer orchestrator consumes. Production uses
//! [`PgLedger`](super::db::PgLedger); tests use [`mock::MemoryLedger`].
//!
//! # Invariants every implementation must uphold
//!
//! 1. **Relative deltas only**: `apply_delta` evaluates `balance + delta` in
//!    the store itself, in one step, and refuses to go below zero. A missing
//!    row and an out-of-range sum are reported as such, never as errors.
//! 2. **Row exclusivity**: a row touched by `apply_delta` stays exclusively
//!    held by that unit of work until commit or rollback.
//! 3. **Unique idempotency key**: `insert_transfer` reports
//!    [`InsertOutcome::Conflict`] instead of an error when the key exists.
//!    A record naming an account that does not exist is an
//!    [`TransferError::InvariantViolation`].
//! 4. **All or nothing**: a unit of work dropped without `commit` leaves no
//!    trace.

use async_trait::async_trait;

use super::error::TransferError;
use super::types::{Account, DeltaOutcome, InsertOutcome, TransferRecord};
use crate::core_types::{AccountId, CustomerId, IdempotencyKey};

/// Account Ledger Store: lookup side
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Find the account owned by a customer
    async fn find_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<Account>, TransferError>;
}

/// Transfer Record Store: lookup side
#[async_trait]
pub trait TransferStore: Send + Sync {
    /// Find a committed transfer by its idempotency key
    async fn find_by_idempotency_key(
        &self,
        key: IdempotencyKey,
    ) -> Result<Option<TransferRecord>, TransferError>;
}

/// Entry point for transactional work against both stores
#[async_trait]
pub trait LedgerStore: AccountStore + TransferStore {
    /// Open an atomic unit of work
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, TransferError>;
}

/// Atomic unit of work grouping balance deltas and a record insertion
#[async_trait]
pub trait UnitOfWork: Send {
    /// Apply `balance = balance + delta` to one account as a single store-side step
    async fn apply_delta(
        &mut self,
        account_id: AccountId,
        delta: i64,
    ) -> Result<DeltaOutcome, TransferError>;

    /// Insert a transfer record, enforcing idempotency-key uniqueness
    async fn insert_transfer(
        &mut self,
        record: &TransferRecord,
    ) -> Result<InsertOutcome, TransferError>;

    async fn commit(self: Box<Self>) -> Result<(), TransferError>;

    async fn rollback(self: Box<Self>) -> Result<(), TransferError>;
}

/// In-memory ledger for testing
///
/// Emulates the Postgres locking model: every touched account row is held
/// through an owned async mutex until the unit of work ends, and a per-key
/// mutex makes a concurrent duplicate insert wait for the first writer and
/// then conflict.
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use chrono::Utc;
    use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};

    #[derive(Default)]
    struct Shared {
        /// Committed view, what readers observe
        accounts: Mutex<HashMap<AccountId, Account>>,
        by_customer: Mutex<HashMap<CustomerId, AccountId>>,
        /// Working balances; the lock is the row lock
        rows: Mutex<HashMap<AccountId, Arc<RowLock<i64>>>>,
        records: Mutex<Vec<TransferRecord>>,
        key_locks: Mutex<HashMap<IdempotencyKey, Arc<RowLock<()>>>>,
        begin_count: AtomicUsize,
        commit_count: AtomicUsize,
        rollback_count: AtomicUsize,
        fail_insert: AtomicBool,
        commit_delay: Mutex<Option<Duration>>,
    }

    #[derive(Clone, Default)]
    pub struct MemoryLedger {
        shared: Arc<Shared>,
    }

    impl MemoryLedger {
        pub fn new() -> Self {
            Self::default()
        }

        /// Open an account for a customer with an initial balance
        pub fn open_account(&self, customer_id: CustomerId, balance: i64) -> AccountId {
            let now = Utc::now();
            let account = Account {
                id: AccountId::new(),
                customer_id,
                balance,
                created_at: now,
                updated_at: now,
            };
            let id = account.id;
            self.shared.accounts.lock().unwrap().insert(id, account);
            self.shared
                .by_customer
                .lock()
                .unwrap()
                .insert(customer_id, id);
            self.shared
                .rows
                .lock()
                .unwrap()
                .insert(id, Arc::new(RowLock::new(balance)));
            id
        }

        /// Committed balance of a customer's account
        pub fn balance_of(&self, customer_id: CustomerId) -> i64 {
            let id = self.shared.by_customer.lock().unwrap()[&customer_id];
            self.shared.accounts.lock().unwrap()[&id].balance
        }

        pub fn account(&self, customer_id: CustomerId) -> Account {
            let id = self.shared.by_customer.lock().unwrap()[&customer_id];
            self.shared.accounts.lock().unwrap()[&id].clone()
        }

        /// Committed transfer records
        pub fn records(&self) -> Vec<TransferRecord> {
            self.shared.records.lock().unwrap().clone()
        }

        pub fn begin_count(&self) -> usize {
            self.shared.begin_count.load(Ordering::SeqCst)
        }

        pub fn commit_count(&self) -> usize {
            self.shared.commit_count.load(Ordering::SeqCst)
        }

        pub fn rollback_count(&self) -> usize {
            self.shared.rollback_count.load(Ordering::SeqCst)
        }

        /// Make every subsequent record insertion fail with a database error
        pub fn set_fail_insert(&self, fail: bool) {
            self.shared.fail_insert.store(fail, Ordering::SeqCst);
        }

        /// Stall commits, to exercise timeouts and overlapping writers
        pub fn set_commit_delay(&self, delay: Option<Duration>) {
            *self.shared.commit_delay.lock().unwrap() = delay;
        }

        /// Delete an account row while leaving its last committed view readable
        pub fn delete_row(&self, account_id: AccountId) {
            self.shared.rows.lock().unwrap().remove(&account_id);
        }
    }

    #[async_trait]
    impl AccountStore for MemoryLedger {
        async fn find_by_customer(
            &self,
            customer_id: CustomerId,
        ) -> Result<Option<Account>, TransferError> {
            let id = self.shared.by_customer.lock().unwrap().get(&customer_id).copied();
            Ok(id.and_then(|id| self.shared.accounts.lock().unwrap().get(&id).cloned()))
        }
    }

    #[async_trait]
    impl TransferStore for MemoryLedger {
        async fn find_by_idempotency_key(
            &self,
            key: IdempotencyKey,
        ) -> Result<Option<TransferRecord>, TransferError> {
            Ok(self
                .shared
                .records
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.idempotency_key == key)
                .cloned())
        }
    }

    #[async_trait]
    impl LedgerStore for MemoryLedger {
        async fn begin(&self) -> Result<Box<dyn UnitOfWork>, TransferError> {
            self.shared.begin_count.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MemoryUnitOfWork {
                shared: self.shared.clone(),
                touched: Vec::new(),
                key_guards: Vec::new(),
                staged: Vec::new(),
                finished: false,
            }))
        }
    }

    struct Touched {
        account_id: AccountId,
        original: i64,
        guard: OwnedMutexGuard<i64>,
    }

    pub struct MemoryUnitOfWork {
        shared: Arc<Shared>,
        touched: Vec<Touched>,
        key_guards: Vec<OwnedMutexGuard<()>>,
        staged: Vec<TransferRecord>,
        finished: bool,
    }

    impl MemoryUnitOfWork {
        fn restore(&mut self) {
            for t in self.touched.iter_mut() {
                *t.guard = t.original;
            }
            self.touched.clear();
            self.key_guards.clear();
            self.staged.clear();
        }
    }

    impl Drop for MemoryUnitOfWork {
        fn drop(&mut self) {
            if !self.finished {
                self.restore();
                self.shared.rollback_count.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[async_trait]
    impl UnitOfWork for MemoryUnitOfWork {
        async fn apply_delta(
            &mut self,
            account_id: AccountId,
            delta: i64,
        ) -> Result<DeltaOutcome, TransferError> {
            if !self.touched.iter().any(|t| t.account_id == account_id) {
                let row = self.shared.rows.lock().unwrap().get(&account_id).cloned();
                let Some(row) = row else {
                    return Ok(DeltaOutcome::Missing);
                };
                let guard = row.lock_owned().await;
                let original = *guard;
                self.touched.push(Touched {
                    account_id,
                    original,
                    guard,
                });
            }

            let Some(touched) = self.touched.iter_mut().find(|t| t.account_id == account_id)
            else {
                return Ok(DeltaOutcome::Missing);
            };
            match touched.guard.checked_add(delta) {
                Some(balance) if balance >= 0 => {
                    *touched.guard = balance;
                    Ok(DeltaOutcome::Applied { balance })
                }
                Some(_) => Ok(DeltaOutcome::Rejected),
                None => Ok(DeltaOutcome::Overflow),
            }
        }

        async fn insert_transfer(
            &mut self,
            record: &TransferRecord,
        ) -> Result<InsertOutcome, TransferError> {
            if self.shared.fail_insert.load(Ordering::SeqCst) {
                return Err(TransferError::Database("injected insert failure".into()));
            }

            {
                let rows = self.shared.rows.lock().unwrap();
                for account_id in [record.sender_account, record.receiver_account] {
                    if !rows.contains_key(&account_id) {
                        return Err(TransferError::InvariantViolation(format!(
                            "transfer {} references missing account {}",
                            record.id, account_id
                        )));
                    }
                }
            }

            let lock = self
                .shared
                .key_locks
                .lock()
                .unwrap()
                .entry(record.idempotency_key)
                .or_default()
                .clone();
            let guard = lock.lock_owned().await;

            let exists = self
                .shared
                .records
                .lock()
                .unwrap()
                .iter()
                .any(|r| r.idempotency_key == record.idempotency_key)
                || self
                    .staged
                    .iter()
                    .any(|r| r.idempotency_key == record.idempotency_key);
            if exists {
                return Ok(InsertOutcome::Conflict);
            }

            self.key_guards.push(guard);
            self.staged.push(record.clone());
            Ok(InsertOutcome::Inserted)
        }

        async fn commit(mut self: Box<Self>) -> Result<(), TransferError> {
            let delay = *self.shared.commit_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let now = Utc::now();
            {
                let mut accounts = self.shared.accounts.lock().unwrap();
                for t in &self.touched {
                    if let Some(account) = accounts.get_mut(&t.account_id) {
                        account.balance = *t.guard;
                        account.updated_at = now;
                    }
                }
            }
            let staged = std::mem::take(&mut self.staged);
            self.shared.records.lock().unwrap().extend(staged);

            self.finished = true;
            self.shared.commit_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn rollback(mut self: Box<Self>) -> Result<(), TransferError> {
            self.restore();
            self.finished = true;
            self.shared.rollback_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_uncommitted_delta_is_invisible_and_discarded() {
            let ledger = MemoryLedger::new();
            let customer = CustomerId::new();
            let account = ledger.open_account(customer, 100);

            let mut uow = ledger.begin().await.unwrap();
            let outcome = uow.apply_delta(account, -40).await.unwrap();
            assert_eq!(outcome, DeltaOutcome::Applied { balance: 60 });
            assert_eq!(ledger.balance_of(customer), 100);

            drop(uow);
            assert_eq!(ledger.balance_of(customer), 100);
            assert_eq!(ledger.rollback_count(), 1);

            let mut uow = ledger.begin().await.unwrap();
            uow.apply_delta(account, -40).await.unwrap();
            uow.commit().await.unwrap();
            assert_eq!(ledger.balance_of(customer), 60);
        }

        #[tokio::test]
        async fn test_delta_below_zero_rejected() {
            let ledger = MemoryLedger::new();
            let account = ledger.open_account(CustomerId::new(), 5);

            let mut uow = ledger.begin().await.unwrap();
            assert_eq!(
                uow.apply_delta(account, -6).await.unwrap(),
                DeltaOutcome::Rejected
            );
            assert_eq!(
                uow.apply_delta(AccountId::new(), 1).await.unwrap(),
                DeltaOutcome::Missing
            );
        }

        #[tokio::test]
        async fn test_credit_past_i64_overflows() {
            let ledger = MemoryLedger::new();
            let customer = CustomerId::new();
            let account = ledger.open_account(customer, i64::MAX - 5);

            let mut uow = ledger.begin().await.unwrap();
            assert_eq!(
                uow.apply_delta(account, 10).await.unwrap(),
                DeltaOutcome::Overflow
            );
            drop(uow);
            assert_eq!(ledger.balance_of(customer), i64::MAX - 5);
        }

        #[tokio::test]
        async fn test_record_with_unknown_account_is_invariant_violation() {
            let ledger = MemoryLedger::new();
            let sender = ledger.open_account(CustomerId::new(), 10);
            let record = TransferRecord::new(sender, AccountId::new(), IdempotencyKey::new(), 1);

            let mut uow = ledger.begin().await.unwrap();
            let err = uow.insert_transfer(&record).await.unwrap_err();
            assert!(err.is_fatal());
        }

        #[tokio::test]
        async fn test_duplicate_key_conflicts() {
            let ledger = MemoryLedger::new();
            let sender = ledger.open_account(CustomerId::new(), 10);
            let receiver = ledger.open_account(CustomerId::new(), 0);
            let record = TransferRecord::new(sender, receiver, IdempotencyKey::new(), 1);

            let mut uow = ledger.begin().await.unwrap();
            assert_eq!(
                uow.insert_transfer(&record).await.unwrap(),
                InsertOutcome::Inserted
            );
            uow.commit().await.unwrap();

            let mut uow = ledger.begin().await.unwrap();
            let again = TransferRecord { id: crate::core_types::TransferId::new(), ..record };
            assert_eq!(
                uow.insert_transfer(&again).await.unwrap(),
                InsertOutcome::Conflict
            );
        }
    }
}

#[cfg(test)]
pub use mock::MemoryLedger;
