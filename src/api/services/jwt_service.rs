//! JWT Service for token generation and validation.
//!
//! Provides time-scoped JWT tokens for API authentication.
//! - Access tokens: Short-lived (15 minutes) for API requests
//! - Refresh tokens: Longer-lived (7 days) for obtaining new access tokens

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

const DEV_SECRET: &str = "dev-secret-do-not-use-in-production-change-me-now";

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: Uuid,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Token type: "access" or "refresh"
    pub token_type: TokenType,
    /// Session ID (for tracking/revocation)
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Token pair returned after authentication
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: i64,
    pub refresh_token_expires_at: i64,
    pub token_type: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum JwtError {
    #[error("JWT_SECRET environment variable is required in production")]
    MissingSecret,
    #[error("JWT_SECRET must be at least 32 characters in production")]
    SecretTooShort,
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token format")]
    InvalidFormat,
    #[error("Invalid token signature")]
    InvalidSignature,
    #[error("Invalid token type: expected {0:?} token")]
    WrongTokenType(TokenType),
    #[error("Token validation failed: {0}")]
    Validation(String),
    #[error("Failed to encode token: {0}")]
    Encoding(String),
}

/// JWT Service configuration
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_duration: Duration,
    refresh_token_duration: Duration,
}

impl JwtService {
    /// Create a new JWT service with the given secret
    ///
    /// # Arguments
    /// * `secret` - The secret key for signing tokens (should be at least 32 bytes)
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_duration: Duration::minutes(15),
            refresh_token_duration: Duration::days(7),
        }
    }

    /// Create a JWT service from `JWT_SECRET` / `APP_ENV`.
    ///
    /// In development a missing or short secret only produces a warning; in
    /// any other environment it is an error.
    pub fn from_env() -> Result<Self, JwtError> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "production".to_string());
        let is_development = app_env.eq_ignore_ascii_case("development");

        let secret = match std::env::var("JWT_SECRET") {
            Ok(s) => s,
            Err(_) if is_development => {
                warn!(
                    "JWT_SECRET not set! Using default secret for development. DO NOT USE IN PRODUCTION!"
                );
                DEV_SECRET.to_string()
            }
            Err(_) => return Err(JwtError::MissingSecret),
        };

        if secret.len() < 32 {
            if is_development {
                warn!("JWT_SECRET is less than 32 characters. Consider using a longer secret.");
            } else {
                return Err(JwtError::SecretTooShort);
            }
        }

        Ok(Self::new(&secret))
    }

    /// Generate a token pair (access + refresh) for a user
    pub fn generate_token_pair(
        &self,
        user_id: Uuid,
        session_id: &str,
    ) -> Result<TokenPair, JwtError> {
        let now = Utc::now();

        let access_exp = now + self.access_token_duration;
        let access_token = self.encode_claims(&Claims {
            sub: user_id,
            exp: access_exp.timestamp(),
            iat: now.timestamp(),
            token_type: TokenType::Access,
            session_id: session_id.to_string(),
        })?;

        let refresh_exp = now + self.refresh_token_duration;
        let refresh_token = self.encode_claims(&Claims {
            sub: user_id,
            exp: refresh_exp.timestamp(),
            iat: now.timestamp(),
            token_type: TokenType::Refresh,
            session_id: session_id.to_string(),
        })?;

        info!(
            "Generated token pair for user {} (session: {}), access expires: {}",
            user_id, session_id, access_exp
        );

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_token_expires_at: access_exp.timestamp(),
            refresh_token_expires_at: refresh_exp.timestamp(),
            token_type: "Bearer".to_string(),
        })
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| JwtError::Encoding(e.to_string()))
    }

    /// Validate an access token and return the claims
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate_kind(token, TokenType::Access)
    }

    /// Validate a refresh token and return the claims
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate_kind(token, TokenType::Refresh)
    }

    fn validate_kind(&self, token: &str, expected: TokenType) -> Result<Claims, JwtError> {
        let token_data = self.decode_token(token)?;
        if token_data.claims.token_type != expected {
            return Err(JwtError::WrongTokenType(expected));
        }
        Ok(token_data.claims)
    }

    /// Decode and validate a token (checks signature and expiration)
    fn decode_token(&self, token: &str) -> Result<TokenData<Claims>, JwtError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidToken => JwtError::InvalidFormat,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            _ => JwtError::Validation(e.to_string()),
        })
    }

    /// Generate a new token pair from a valid refresh token
    pub fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenPair, JwtError> {
        let claims = self.validate_refresh_token(refresh_token)?;
        self.generate_token_pair(claims.sub, &claims.session_id)
    }

    /// Extract bearer token from Authorization header
    pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
        auth_header.strip_prefix("Bearer ")
    }
}

/// Shared JWT service for use across the application
pub type SharedJwtService = Arc<JwtService>;
