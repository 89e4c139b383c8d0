use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use validator::Validate;

use super::error::AuthError;
use crate::account::{CustomerRepository, NewCustomer, models::normalize_email};
use crate::config::{AuthConfig, OnboardingConfig};
use crate::core_types::{AccountId, CustomerId};

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (customer id)
    pub exp: usize,  // Expiration time (as UTC timestamp)
    pub iat: usize,  // Issued at
}

impl Claims {
    pub fn customer_id(&self) -> Result<CustomerId, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Customer Sign-up Request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignUpRequest {
    #[validate(length(min = 2, message = "name must have at least 2 characters"))]
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[validate(email(message = "email is not valid"))]
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[validate(length(min = 6, message = "password must have at least 6 characters"))]
    #[schema(example = "secret123")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    pub customer_id: CustomerId,
    pub account_id: AccountId,
}

/// Customer Login Request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "email is not valid"))]
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    #[schema(example = "secret123")]
    pub password: String,
}

/// Auth Response (JWT)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
}

pub struct UserAuthService {
    db: PgPool,
    jwt_secret: String,
    token_ttl_secs: i64,
    initial_balance: i64,
}

impl UserAuthService {
    pub fn new(db: PgPool, auth: &AuthConfig, onboarding: &OnboardingConfig) -> Self {
        Self {
            db,
            jwt_secret: auth.jwt_secret.clone(),
            token_ttl_secs: auth.token_ttl_secs,
            initial_balance: onboarding.initial_balance,
        }
    }

    /// Register a customer and open their account with the initial balance
    pub async fn sign_up(&self, req: SignUpRequest) -> Result<SignUpResponse, AuthError> {
        req.validate()?;

        let password = req.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("hashing task failed: {}", e)))??;

        let customer = NewCustomer::new(&req.name, &req.email, password_hash);
        let (customer_id, account_id) =
            CustomerRepository::create_with_account(&self.db, &customer, self.initial_balance)
                .await?;

        Ok(SignUpResponse {
            customer_id,
            account_id,
        })
    }

    /// Login customer and issue JWT
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AuthError> {
        req.validate()?;

        let customer = CustomerRepository::get_by_email(&self.db, &normalize_email(&req.email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let password = req.password;
        let stored = customer.password_hash;
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| AuthError::Internal(format!("verification task failed: {}", e)))?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(AuthResponse {
            access_token: self.issue_token(customer.id)?,
        })
    }

    pub fn issue_token(&self, customer_id: CustomerId) -> Result<String, AuthError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(Duration::seconds(self.token_ttl_secs))
            .ok_or_else(|| AuthError::Internal("token expiry out of range".into()))?;

        let claims = Claims {
            sub: customer_id.to_string(),
            exp: expiration.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("failed to generate token: {}", e)))
    }

    /// Verify JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        let token_data =
            decode::<Claims>(token, &decoding_key, &validation).map_err(|_| AuthError::InvalidToken)?;
        Ok(token_data.claims)
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Internal(format!("hashing failed: {}", e)))
}

fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}
