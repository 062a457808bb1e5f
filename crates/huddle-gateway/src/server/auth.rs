//! Connection gatekeeper
//!
//! Verifies the bearer credential of an upgrade request and resolves the
//! identity behind it. Any failure rejects the upgrade with 401 before a
//! session exists.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use huddle_common::AppError;
use huddle_core::IdentityProfile;
use serde::Deserialize;

use super::GatewayState;
use crate::handlers::GatewayError;

/// Identity verified at handshake time
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    pub profile: IdentityProfile,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

#[async_trait]
impl FromRequestParts<GatewayState> for AuthenticatedIdentity {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &GatewayState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts, state).await.ok_or(AppError::MissingAuth)?;

        let (_, identity) = state.jwt().validate_access_token(&token).map_err(|e| {
            tracing::warn!(error = %e, "Rejected gateway credential");
            e
        })?;

        let profile = state
            .directory()
            .find_profile(identity)
            .await
            .map_err(|e| {
                tracing::warn!(identity_id = %identity, error = %e, "Identity lookup failed");
                AppError::Domain(e)
            })?
            .ok_or_else(|| {
                tracing::warn!(identity_id = %identity, "Credential names an unknown identity");
                AppError::UnknownIdentity
            })?;

        Ok(Self { profile })
    }
}

/// Header first, then the `token` query parameter
async fn bearer_token(parts: &mut Parts, state: &GatewayState) -> Option<String> {
    if let Ok(TypedHeader(Authorization(bearer))) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await
    {
        return Some(bearer.token().to_string());
    }

    Query::<TokenQuery>::from_request_parts(parts, state)
        .await
        .ok()
        .and_then(|Query(query)| query.token)
        .filter(|token| !token.is_empty())
}
