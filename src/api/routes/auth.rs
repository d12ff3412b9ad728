//! Authentication routes.
//!
//! Tokens are issued out of band (see `JwtService::generate_token_pair`);
//! these endpoints only inspect and refresh them.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::app_state::AppState;
use crate::services::{JwtService, SharedJwtService, TokenPair};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
    pub user_id: Option<Uuid>,
    pub token_expires_at: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/status", get(get_auth_status))
        .route("/refresh", post(refresh_token))
}

/// GET /auth/status - Report whether the bearer token is a valid access token
#[utoipa::path(
    get,
    path = "/auth/status",
    tag = "Auth",
    responses(
        (status = 200, description = "Authentication status", body = AuthStatusResponse)
    )
)]
pub async fn get_auth_status(
    State(jwt): State<SharedJwtService>,
    headers: HeaderMap,
) -> Json<AuthStatusResponse> {
    let claims = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(JwtService::extract_bearer_token)
        .and_then(|token| jwt.validate_access_token(token).ok());

    Json(match claims {
        Some(claims) => AuthStatusResponse {
            authenticated: true,
            user_id: Some(claims.sub),
            token_expires_at: Some(claims.exp),
        },
        None => AuthStatusResponse {
            authenticated: false,
            user_id: None,
            token_expires_at: None,
        },
    })
}

/// POST /auth/refresh - Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "Auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Invalid or expired refresh token")
    )
)]
pub async fn refresh_token(
    State(jwt): State<SharedJwtService>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<TokenPair>, StatusCode> {
    let tokens = jwt.refresh_access_token(&request.refresh_token).map_err(|e| {
        warn!("Invalid refresh token: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    info!("Refreshed tokens");
    Ok(Json(tokens))
}
