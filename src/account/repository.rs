//! Repository layer for customer onboarding

use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use thiserror::Error;
use uuid::Uuid;

use super::models::{Customer, NewCustomer};
use crate::core_types::{AccountId, CustomerId};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("email already registered")]
    EmailTaken,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

fn row_to_customer(r: &PgRow) -> Result<Customer, sqlx::Error> {
    Ok(Customer {
        id: r.try_get::<Uuid, _>("id")?.into(),
        name: r.try_get("name")?,
        email: r.try_get("email")?,
        password_hash: r.try_get("password_hash")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

/// Customer repository
pub struct CustomerRepository;

impl CustomerRepository {
    /// Get customer by (normalized) email
    pub async fn get_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT id, name, email, password_hash, created_at, updated_at
               FROM customers WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(row.as_ref().map(row_to_customer).transpose()?)
    }

    /// Insert a customer and its account in one transaction
    ///
    /// Either both rows exist afterwards or neither does.
    pub async fn create_with_account(
        pool: &PgPool,
        customer: &NewCustomer,
        initial_balance: i64,
    ) -> Result<(CustomerId, AccountId), RepositoryError> {
        let customer_id = CustomerId::new();
        let account_id = AccountId::new();
        let now = Utc::now();

        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO customers (id, name, email, password_hash, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $5)"#,
        )
        .bind(customer_id.inner())
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.password_hash)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepositoryError::EmailTaken
            } else {
                RepositoryError::Database(e)
            }
        })?;

        sqlx::query(
            r#"INSERT INTO accounts (id, customer_id, balance, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $4)"#,
        )
        .bind(account_id.inner())
        .bind(customer_id.inner())
        .bind(initial_balance)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(customer_id = %customer_id, account_id = %account_id, "Customer onboarded");
        Ok((customer_id, account_id))
    }
}
