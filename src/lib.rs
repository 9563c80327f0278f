//! Request metadata helpers for axum services.
//!
//! The request is always passed in explicitly and authentication is an injected
//! [`auth::AuthManager`], so every helper can be called from handlers, middleware or tests alike.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod helpers;
pub mod request;
pub mod system;
pub mod version;

use std::sync::Arc;

use crate::auth::AuthManager;
use crate::config::Settings;

#[derive(Clone)]
pub struct InnerState {
    pub settings: Arc<Settings>,
    pub auth: AuthManager,
}

impl InnerState {
    pub fn new(settings: Settings) -> Self {
        let auth = AuthManager::from_settings(&settings);
        Self {
            settings: Arc::new(settings),
            auth,
        }
    }
}
