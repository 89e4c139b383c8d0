//! Gateway types module
//!
//! - [`ApiResponse<T>`]: Unified API response wrapper
//! - [`ApiError`]: Error response carrying its HTTP status
//! - [`error_codes`]: Standard error code constants

pub mod response;

// Re-export commonly used types at module root
pub use response::{ApiError, ApiResponse, ApiResult, error_codes, ok};
