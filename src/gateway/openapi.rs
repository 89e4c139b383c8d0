//! OpenAPI Documentation
//!
//! OpenAPI 3 document for the pay_bank API, served as JSON at
//! `/api-docs/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::gateway::handlers::TransferBody;
use crate::transfer::{TransferHistoryEntry, TransferParty};
use crate::user_auth::{AuthResponse, LoginRequest, SignUpRequest, SignUpResponse};

/// Bearer JWT issued by `/v1/login`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "pay_bank API",
        version = "1.0.0",
        description = "Exactly-once funds transfers between customer accounts.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::user_auth::handlers::sign_up,
        crate::user_auth::handlers::login,
        crate::gateway::handlers::transfer::create_transfer,
        crate::gateway::handlers::history::get_transactions_history,
    ),
    components(
        schemas(
            SignUpRequest,
            SignUpResponse,
            LoginRequest,
            AuthResponse,
            TransferBody,
            TransferParty,
            TransferHistoryEntry,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Sign-up and login"),
        (name = "Transfer", description = "Funds transfers and history (JWT required)"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;
