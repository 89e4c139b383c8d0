//! Customer authentication
//!
//! Sign-up with argon2 password hashing, login issuing HS256 JWTs, and the
//! bearer-token middleware guarding customer routes.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod service;

pub use error::AuthError;
pub use middleware::AuthenticatedCustomer;
pub use service::{AuthResponse, Claims, LoginRequest, SignUpRequest, SignUpResponse, UserAuthService};
