use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::request::InboundRequest;

pub const WEB_GUARD: &str = "web";
pub const API_GUARD: &str = "api";
pub const AUTH_COOKIE: &str = "auth-token";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_id: String,
    pub role: String,
    pub exp: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserIdentity {
    pub id: String,
    pub email: String,
    pub role: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Claims> for UserIdentity {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.user_id,
            email: claims.sub,
            role: claims.role,
            expires_at: i64::try_from(claims.exp)
                .ok()
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
        }
    }
}

/// Decides who, if anyone, is behind a request.
pub trait Guard: Send + Sync {
    fn user(&self, request: &dyn InboundRequest) -> Option<UserIdentity>;

    fn check(&self, request: &dyn InboundRequest) -> bool {
        self.user(request).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Bearer,
    Cookie(String),
}

/// HS256 JWT guard. Sources are tried in order and the first token found is the only one decoded.
pub struct JwtGuard {
    name: String,
    key: DecodingKey,
    validation: Validation,
    sources: Vec<TokenSource>,
}

impl JwtGuard {
    pub fn new(name: impl Into<String>, secret: &str, sources: Vec<TokenSource>) -> Self {
        Self {
            name: name.into(),
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            sources,
        }
    }

    fn token(&self, request: &dyn InboundRequest) -> Option<String> {
        self.sources.iter().find_map(|source| match source {
            TokenSource::Bearer => request.bearer_token().map(str::to_owned),
            TokenSource::Cookie(name) => request.cookie(name),
        })
    }
}

impl Guard for JwtGuard {
    fn user(&self, request: &dyn InboundRequest) -> Option<UserIdentity> {
        let token = self.token(request)?;

        match decode::<Claims>(&token, &self.key, &self.validation) {
            Ok(token_data) => Some(token_data.claims.into()),
            Err(e) => {
                tracing::debug!(guard = %self.name, error = ?e, "JWT validation failed");
                None
            }
        }
    }
}

/// Named guards plus the one used when the caller does not name any.
#[derive(Clone)]
pub struct AuthManager {
    default_guard: String,
    guards: HashMap<String, Arc<dyn Guard>>,
}

impl AuthManager {
    pub fn new(default_guard: impl Into<String>) -> Self {
        Self {
            default_guard: default_guard.into(),
            guards: HashMap::new(),
        }
    }

    pub fn with_guard(mut self, name: impl Into<String>, guard: impl Guard + 'static) -> Self {
        self.guards.insert(name.into(), Arc::new(guard));
        self
    }

    /// `web` reads the `auth-token` cookie, `api` prefers the bearer token and falls back to
    /// the same cookie.
    pub fn from_settings(settings: &Settings) -> Self {
        let secret = settings.token_secret.as_str();

        Self::new(settings.default_guard.as_str())
            .with_guard(
                WEB_GUARD,
                JwtGuard::new(
                    WEB_GUARD,
                    secret,
                    vec![TokenSource::Cookie(AUTH_COOKIE.to_string())],
                ),
            )
            .with_guard(
                API_GUARD,
                JwtGuard::new(
                    API_GUARD,
                    secret,
                    vec![
                        TokenSource::Bearer,
                        TokenSource::Cookie(AUTH_COOKIE.to_string()),
                    ],
                ),
            )
    }

    pub fn default_guard(&self) -> &str {
        &self.default_guard
    }

    pub fn guard(&self, name: Option<&str>) -> Option<&dyn Guard> {
        let name = name.unwrap_or(self.default_guard.as_str());
        let guard = self.guards.get(name).map(|g| g.as_ref());
        if guard.is_none() {
            tracing::warn!(guard = name, "Auth guard is not defined");
        }
        guard
    }

    pub fn current_user(
        &self,
        request: &dyn InboundRequest,
        guard: Option<&str>,
    ) -> Option<UserIdentity> {
        self.guard(guard)?.user(request)
    }

    pub fn is_authenticated(&self, request: &dyn InboundRequest, guard: Option<&str>) -> bool {
        self.guard(guard).is_some_and(|g| g.check(request))
    }
}
