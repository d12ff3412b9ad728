//! Authentication context extractor.

use super::app_state::AppState;
use crate::services::jwt_service::JwtService;
use axum::extract::FromRequestParts;
use axum::http::{StatusCode, header::AUTHORIZATION, request::Parts};
use uuid::Uuid;

/// Authentication context extracted from request
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub session_id: String,
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(JwtService::extract_bearer_token)
            .ok_or_else(|| {
                tracing::warn!("No authorization token provided");
                StatusCode::UNAUTHORIZED
            })?;

        let claims = state.jwt.validate_access_token(token).map_err(|e| {
            tracing::warn!("JWT validation failed: {}", e);
            StatusCode::UNAUTHORIZED
        })?;

        Ok(AuthContext {
            user_id: claims.sub,
            session_id: claims.session_id,
        })
    }
}
