//! Bearer token identities.
//!
//! Tokens are HS256 JWTs whose `sub` claim names the caller:
//!
//! - `user_<id>`: a registered patient account
//! - `hospital_<id>`: a hospital staff account
//! - `<id>`: legacy tokens, accepted for either role
//!
//! Handlers take [`AuthUser`], [`AuthHospital`] or [`AnyIdentity`] as
//! extractors. A missing or invalid token is rejected with 401, a token for
//! the wrong role with 403.

use crate::types::{HospitalId, UserId};
use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use pocketcare_web::{AppError, BearerToken};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Token signing or verification failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Signing failed.
    #[error("Failed to encode token: {0}")]
    Encode(String),
    /// Signature, expiry or claims are invalid.
    #[error("Invalid token: {0}")]
    Invalid(String),
    /// `sub` does not name a user or hospital.
    #[error("Unrecognised token subject: {0}")]
    Subject(String),
}

// ============================================================================
// Identity
// ============================================================================

/// Caller named by a token's subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// Patient account.
    User(UserId),
    /// Hospital account.
    Hospital(HospitalId),
    /// Untagged legacy subject.
    Legacy(i64),
}

impl Identity {
    /// Parse a `sub` claim.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Subject`] for anything but `user_<id>`,
    /// `hospital_<id>` or a bare id.
    pub fn parse(subject: &str) -> Result<Self, TokenError> {
        let invalid = || TokenError::Subject(subject.to_string());
        if let Some(id) = subject.strip_prefix("user_") {
            return id.parse().map(|id| Self::User(UserId(id))).map_err(|_| invalid());
        }
        if let Some(id) = subject.strip_prefix("hospital_") {
            return id
                .parse()
                .map(|id| Self::Hospital(HospitalId(id)))
                .map_err(|_| invalid());
        }
        subject.parse().map(Self::Legacy).map_err(|_| invalid())
    }

    /// Acting user, if this identity may act as one.
    #[must_use]
    pub const fn as_user(self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(id),
            Self::Legacy(id) => Some(UserId(id)),
            Self::Hospital(_) => None,
        }
    }

    /// Acting hospital, if this identity may act as one.
    #[must_use]
    pub const fn as_hospital(self) -> Option<HospitalId> {
        match self {
            Self::Hospital(id) => Some(id),
            Self::Legacy(id) => Some(HospitalId(id)),
            Self::User(_) => None,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user_{id}"),
            Self::Hospital(id) => write!(f, "hospital_{id}"),
            Self::Legacy(id) => write!(f, "{id}"),
        }
    }
}

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum Subject {
    Text(String),
    Number(i64),
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: Subject,
    exp: i64,
    iat: i64,
}

/// HS256 signing and verification keys.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKeys").finish_non_exhaustive()
    }
}

impl TokenKeys {
    /// Keys derived from a shared secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Sign a token for `identity`, valid for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encode`] if signing fails.
    pub fn issue(&self, identity: Identity, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: Subject::Text(identity.to_string()),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Verify a token and return the identity it names.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Invalid`] for a bad signature or expired token,
    /// and [`TokenError::Subject`] for an unrecognised subject.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;
        match data.claims.sub {
            Subject::Text(subject) => Identity::parse(&subject),
            Subject::Number(id) => Ok(Identity::Legacy(id)),
        }
    }
}

// ============================================================================
// Extractors
// ============================================================================

/// Any authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnyIdentity(pub Identity);

/// Authenticated patient account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

/// Authenticated hospital account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthHospital(pub HospitalId);

#[async_trait]
impl<S> FromRequestParts<S> for AnyIdentity
where
    S: Send + Sync,
    Arc<TokenKeys>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let keys = Arc::<TokenKeys>::from_ref(state);
        keys.verify(&token).map(Self).map_err(|err| {
            tracing::debug!(error = %err, "Rejected bearer token");
            AppError::unauthorized("Invalid or expired token")
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<TokenKeys>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AnyIdentity(identity) = AnyIdentity::from_request_parts(parts, state).await?;
        identity
            .as_user()
            .map(Self)
            .ok_or_else(|| AppError::forbidden("User access required"))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthHospital
where
    S: Send + Sync,
    Arc<TokenKeys>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AnyIdentity(identity) = AnyIdentity::from_request_parts(parts, state).await?;
        identity
            .as_hospital()
            .map(Self)
            .ok_or_else(|| AppError::forbidden("Hospital access required"))
    }
}
