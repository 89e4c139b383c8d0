//! Customer and account onboarding storage

pub mod models;
pub mod repository;

// Re-export commonly used types
pub use models::{Customer, NewCustomer};
pub use repository::{CustomerRepository, RepositoryError};
