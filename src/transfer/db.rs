//! Transfer Database Layer
//!
//! PostgreSQL implementation of the ledger stores.
//!
//! Balances are only ever changed by
//! `UPDATE accounts SET balance = balance + $delta ... WHERE balance + $delta >= 0`,
//! so Postgres computes the new value under the row lock the statement
//! takes and keeps it until the transaction ends. The transfer row is
//! inserted before either update; its foreign keys only take `KEY SHARE`
//! locks, which never block the balance updates of other transfers.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use super::error::TransferError;
use super::store::{AccountStore, LedgerStore, TransferStore, UnitOfWork};
use super::types::{
    Account, DeltaOutcome, InsertOutcome, TransferHistoryEntry, TransferParty, TransferRecord,
};
use crate::core_types::{AccountId, CustomerId, IdempotencyKey};

/// Ledger backed by the `accounts` and `transfers` tables
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    /// Create a new PgLedger with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Transfers sent or received by a customer, newest first
    pub async fn history(
        &self,
        customer_id: CustomerId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TransferHistoryEntry>, TransferError> {
        let rows = sqlx::query(
            r#"
            SELECT t.id            AS transfer_id,
                   cs.id           AS sender_customer_id,
                   cs.name         AS sender_customer_name,
                   asnd.id         AS sender_account_id,
                   cr.id           AS receiver_customer_id,
                   cr.name         AS receiver_customer_name,
                   arec.id         AS receiver_account_id,
                   t.amount,
                   t.created_at
            FROM transfers t
            JOIN accounts asnd ON t.account_sender_id = asnd.id
            JOIN customers cs  ON asnd.customer_id = cs.id
            JOIN accounts arec ON t.account_receiver_id = arec.id
            JOIN customers cr  ON arec.customer_id = cr.id
            WHERE cs.id = $1 OR cr.id = $1
            ORDER BY t.created_at DESC, t.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(customer_id.inner())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_history).collect()
    }
}

fn row_to_account(row: &PgRow) -> Result<Account, TransferError> {
    Ok(Account {
        id: row.try_get::<Uuid, _>("id")?.into(),
        customer_id: row.try_get::<Uuid, _>("customer_id")?.into(),
        balance: row.try_get("balance")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_record(row: &PgRow) -> Result<TransferRecord, TransferError> {
    Ok(TransferRecord {
        id: row.try_get::<Uuid, _>("id")?.into(),
        sender_account: row.try_get::<Uuid, _>("account_sender_id")?.into(),
        receiver_account: row.try_get::<Uuid, _>("account_receiver_id")?.into(),
        idempotency_key: row.try_get::<Uuid, _>("idempotency_key")?.into(),
        amount: row.try_get("amount")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_history(row: &PgRow) -> Result<TransferHistoryEntry, TransferError> {
    Ok(TransferHistoryEntry {
        id: row.try_get::<Uuid, _>("transfer_id")?.into(),
        sender: TransferParty {
            customer_id: row.try_get::<Uuid, _>("sender_customer_id")?.into(),
            customer_name: row.try_get("sender_customer_name")?,
            account_id: row.try_get::<Uuid, _>("sender_account_id")?.into(),
        },
        receiver: TransferParty {
            customer_id: row.try_get::<Uuid, _>("receiver_customer_id")?.into(),
            customer_name: row.try_get("receiver_customer_name")?,
            account_id: row.try_get::<Uuid, _>("receiver_account_id")?.into(),
        },
        amount: row.try_get("amount")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl AccountStore for PgLedger {
    async fn find_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<Account>, TransferError> {
        let row = sqlx::query(
            r#"
            SELECT id, customer_id, balance, created_at, updated_at
            FROM accounts
            WHERE customer_id = $1
            "#,
        )
        .bind(customer_id.inner())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_account).transpose()
    }
}

#[async_trait]
impl TransferStore for PgLedger {
    async fn find_by_idempotency_key(
        &self,
        key: IdempotencyKey,
    ) -> Result<Option<TransferRecord>, TransferError> {
        let row = sqlx::query(
            r#"
            SELECT id, account_sender_id, account_receiver_id, idempotency_key, amount, created_at
            FROM transfers
            WHERE idempotency_key = $1
            "#,
        )
        .bind(key.inner())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_record).transpose()
    }
}

#[async_trait]
impl LedgerStore for PgLedger {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, TransferError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

/// SQLSTATE 22003, raised when `balance + delta` leaves the BIGINT range
fn is_out_of_range(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "22003")
}

/// Unit of work over one Postgres transaction
///
/// `sqlx::Transaction` rolls back on drop, which is what makes a cancelled
/// or timed-out transfer leave nothing behind.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn apply_delta(
        &mut self,
        account_id: AccountId,
        delta: i64,
    ) -> Result<DeltaOutcome, TransferError> {
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE accounts
            SET balance = balance + $1, updated_at = NOW()
            WHERE id = $2 AND balance + $1 >= 0
            RETURNING balance
            "#,
        )
        .bind(delta)
        .bind(account_id.inner())
        .fetch_optional(&mut *self.tx)
        .await;

        let balance = match result {
            Ok(balance) => balance,
            Err(e) if is_out_of_range(&e) => return Ok(DeltaOutcome::Overflow),
            Err(e) => return Err(e.into()),
        };
        if let Some(balance) = balance {
            return Ok(DeltaOutcome::Applied { balance });
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM accounts WHERE id = $1)")
                .bind(account_id.inner())
                .fetch_one(&mut *self.tx)
                .await?;

        Ok(if exists {
            DeltaOutcome::Rejected
        } else {
            DeltaOutcome::Missing
        })
    }

    async fn insert_transfer(
        &mut self,
        record: &TransferRecord,
    ) -> Result<InsertOutcome, TransferError> {
        let result = sqlx::query(
            r#"
            INSERT INTO transfers
                (id, account_sender_id, account_receiver_id, idempotency_key, amount, created_at)
            VALUES
                ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (idempotency_key) DO NOTHING
            "#,
        )
        .bind(record.id.inner())
        .bind(record.sender_account.inner())
        .bind(record.receiver_account.inner())
        .bind(record.idempotency_key.inner())
        .bind(record.amount)
        .bind(record.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            let missing_account = e
                .as_database_error()
                .is_some_and(|db| db.is_foreign_key_violation());
            if missing_account {
                TransferError::InvariantViolation(format!(
                    "transfer {} references a missing account",
                    record.id
                ))
            } else {
                TransferError::from(e)
            }
        })?;

        Ok(if result.rows_affected() > 0 {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::Conflict
        })
    }

    async fn commit(self: Box<Self>) -> Result<(), TransferError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), TransferError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
