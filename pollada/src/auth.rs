//! Staff authentication.
//!
//! Staff members present `Authorization: Bearer <token>`. Tokens are
//! configured up front as `name:token` pairs and compared in constant time.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pollada::auth::StaffSession;
//!
//! async fn redeem(staff: StaffSession) -> Result<Json<Redeemed>, AppError> {
//!     // staff.actor is an authenticated staff member
//! }
//! ```

use crate::api::error::AppError;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use constant_time_eq::constant_time_eq;
use pollada_core::PolladaError;
use pollada_core::environment::{StaffActor, StaffAuthenticator};
use std::sync::Arc;

/// Fixed set of staff tokens.
#[derive(Clone, Default)]
pub struct StaticTokenAuthenticator {
    staff: Vec<(StaffActor, String)>,
}

impl StaticTokenAuthenticator {
    /// Build from `(name, token)` pairs.
    #[must_use]
    pub fn new<I, N, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: Into<String>,
    {
        Self {
            staff: pairs
                .into_iter()
                .map(|(name, token)| (StaffActor::new(name), token.into()))
                .collect(),
        }
    }

    /// Number of configured staff members
    #[must_use]
    pub fn len(&self) -> usize {
        self.staff.len()
    }

    /// Whether no staff member can log in
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.staff.is_empty()
    }
}

impl std::fmt::Debug for StaticTokenAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenAuthenticator")
            .field("staff", &self.staff.iter().map(|(a, _)| &a.name).collect::<Vec<_>>())
            .finish()
    }
}

impl StaffAuthenticator for StaticTokenAuthenticator {
    fn authenticate(&self, token: &str) -> Option<StaffActor> {
        // Every entry is compared so timing does not depend on which one matched.
        let mut found = None;
        for (actor, expected) in &self.staff {
            if constant_time_eq(token.as_bytes(), expected.as_bytes()) && found.is_none() {
                found = Some(actor.clone());
            }
        }
        found
    }
}

/// Bearer token extracted from `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
        })?;

        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::unauthorized("Empty bearer token"));
        }

        Ok(Self(token.to_string()))
    }
}

/// Authenticated staff member.
///
/// Use as a handler parameter to require a staff login.
#[derive(Debug, Clone)]
pub struct StaffSession {
    /// The authenticated staff member
    pub actor: StaffActor,
}

#[async_trait]
impl<S> FromRequestParts<S> for StaffSession
where
    S: Send + Sync,
    Arc<dyn StaffAuthenticator>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let bearer = BearerToken::from_request_parts(parts, state).await?;
        let authenticator = <Arc<dyn StaffAuthenticator> as FromRef<S>>::from_ref(state);

        let actor = authenticator.authenticate(&bearer.0).ok_or_else(|| {
            tracing::warn!("Rejected unknown staff token");
            AppError::from(PolladaError::Unauthorized)
        })?;

        Ok(Self { actor })
    }
}
