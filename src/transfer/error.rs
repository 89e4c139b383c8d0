//! Transfer Error Types
//!
//! Business rejections, fatal invariant violations and infrastructure
//! failures are distinct variants so adapters can map each class without
//! string matching.

use thiserror::Error;

/// Transfer error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    // === Business Errors (no state touched) ===
    #[error("you cannot transfer to yourself")]
    SelfTransfer,

    #[error("the amount to be transferred cannot be zero")]
    ZeroAmount,

    #[error("the sender does not have enough balance to make the transfer")]
    InsufficientBalance,

    // === Invariant Violations (data corruption, never user-facing) ===
    #[error("ledger invariant violated: {0}")]
    InvariantViolation(String),

    // === Infrastructure Errors (rolled back, safe to retry) ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("transfer timed out before commit")]
    Timeout,
}

impl TransferError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::SelfTransfer => "SELF_TRANSFER",
            TransferError::ZeroAmount => "ZERO_AMOUNT",
            TransferError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            TransferError::InvariantViolation(_) => "INVARIANT_VIOLATION",
            TransferError::Database(_) => "DATABASE_ERROR",
            TransferError::Timeout => "TIMEOUT",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::SelfTransfer
            | TransferError::ZeroAmount
            | TransferError::InsufficientBalance => 409,
            TransferError::InvariantViolation(_) | TransferError::Database(_) => 500,
            TransferError::Timeout => 503,
        }
    }

    /// Expected, recoverable rejection safe to show to the end user
    #[inline]
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            TransferError::SelfTransfer
                | TransferError::ZeroAmount
                | TransferError::InsufficientBalance
        )
    }

    /// Referential corruption the orchestrator cannot repair
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransferError::InvariantViolation(_))
    }

    /// The whole operation may be retried with the same idempotency key
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransferError::Database(_) | TransferError::Timeout)
    }
}

impl From<sqlx::Error> for TransferError {
    fn from(e: sqlx::Error) -> Self {
        TransferError::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(TransferError::SelfTransfer.code(), "SELF_TRANSFER");
        assert_eq!(
            TransferError::InsufficientBalance.code(),
            "INSUFFICIENT_BALANCE"
        );
        assert_eq!(
            TransferError::InvariantViolation("x".into()).code(),
            "INVARIANT_VIOLATION"
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(TransferError::SelfTransfer.http_status(), 409);
        assert_eq!(TransferError::ZeroAmount.http_status(), 409);
        assert_eq!(TransferError::InsufficientBalance.http_status(), 409);
        assert_eq!(TransferError::Database("down".into()).http_status(), 500);
        assert_eq!(TransferError::Timeout.http_status(), 503);
    }

    #[test]
    fn test_classification() {
        assert!(TransferError::ZeroAmount.is_business());
        assert!(!TransferError::ZeroAmount.is_fatal());

        let fatal = TransferError::InvariantViolation("sender account missing".into());
        assert!(fatal.is_fatal());
        assert!(!fatal.is_business());
        assert!(!fatal.is_retryable());

        assert!(TransferError::Timeout.is_retryable());
        assert!(TransferError::Database("reset".into()).is_retryable());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            TransferError::InsufficientBalance.to_string(),
            "the sender does not have enough balance to make the transfer"
        );
    }
}
