use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use sha2::{Digest, Sha256};

use crate::errors::AppError;
use crate::handlers::AppState;
use crate::models::Customer;
use crate::policy::{self, Operation};

/// SHA-256 hex digest of an API token. Only digests are ever stored.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Extracts the token from `Authorization: Bearer <t>` or `Authorization: Token <t>`.
///
/// Returns `Ok(None)` when the header is absent.
pub fn token_from_headers(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AppError::Unauthorized("Malformed Authorization header".to_string()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| AppError::Unauthorized("Malformed Authorization header".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") && !scheme.eq_ignore_ascii_case("token") {
        return Err(AppError::Unauthorized(format!(
            "Unsupported authorization scheme '{}'",
            scheme
        )));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized("Empty token".to_string()));
    }

    Ok(Some(token))
}

/// Identity of the caller, resolved from the request's token if one was sent.
///
/// A token that is present but unknown or expired rejects the request.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    customer: Option<Customer>,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self { customer: None }
    }

    pub fn customer(customer: Customer) -> Self {
        Self {
            customer: Some(customer),
        }
    }

    pub fn identity(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    /// Checks `operation` against the policy table.
    pub fn authorize(&self, operation: Operation) -> Result<(), AppError> {
        policy::authorize(operation, self.identity())
    }

    /// Checks `operation` and returns the authenticated customer.
    pub fn require(&self, operation: Operation) -> Result<&Customer, AppError> {
        self.authorize(operation)?;
        self.identity().ok_or_else(|| {
            AppError::Unauthorized("Authentication credentials were not provided".to_string())
        })
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = token_from_headers(&parts.headers)? else {
            return Ok(Caller::anonymous());
        };

        let customer = state
            .customers
            .customer_for_token_hash(&hash_token(token))
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        tracing::debug!("Authenticated customer {}", customer.id);
        Ok(Caller::customer(customer))
    }
}
