use std::sync::Arc;

use crate::db::Database;
use crate::transfer::{PgLedger, TransferCoordinator};
use crate::user_auth::UserAuthService;

/// Gateway shared state
#[derive(Clone)]
pub struct AppState {
    /// Connection pool, used by the health check
    pub db: Database,
    /// The single writer of balances
    pub coordinator: Arc<TransferCoordinator>,
    /// Read side for transaction history
    pub history: PgLedger,
    pub user_auth: Arc<UserAuthService>,
}

impl AppState {
    pub fn new(
        db: Database,
        coordinator: Arc<TransferCoordinator>,
        user_auth: Arc<UserAuthService>,
    ) -> Self {
        let history = PgLedger::new(db.pool().clone());
        Self {
            db,
            coordinator,
            history,
            user_auth,
        }
    }
}
