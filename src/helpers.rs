//! One-line accessors over the current request and the auth capability.

use std::collections::BTreeMap;
use std::net::IpAddr;

use axum::http::header;

use crate::auth::{AuthManager, UserIdentity, API_GUARD};
use crate::config::Settings;
use crate::request::InboundRequest;

pub fn client_ip<R: InboundRequest + ?Sized>(request: &R) -> Option<IpAddr> {
    request.ip()
}

/// Raw `Accept-Language` value, or the configured locale.
pub fn request_locale<'a, R: InboundRequest + ?Sized>(
    request: &'a R,
    settings: &'a Settings,
) -> &'a str {
    request.header_or(header::ACCEPT_LANGUAGE.as_str(), &settings.locale)
}

pub fn request_token<R: InboundRequest + ?Sized>(request: &R) -> Option<&str> {
    request.bearer_token()
}

pub fn request_content_type<R: InboundRequest + ?Sized>(request: &R) -> Option<&str> {
    request.header(header::CONTENT_TYPE.as_str())
}

pub fn is_secure_request<R: InboundRequest + ?Sized>(request: &R) -> bool {
    request.secure()
}

pub fn request_headers<R: InboundRequest + ?Sized>(request: &R) -> BTreeMap<String, Vec<String>> {
    request.all_headers()
}

pub fn is_api_authenticated<R: InboundRequest>(request: &R, auth: &AuthManager) -> bool {
    auth.is_authenticated(request, Some(API_GUARD))
}

/// User behind the default guard.
pub fn auth_user<R: InboundRequest>(request: &R, auth: &AuthManager) -> Option<UserIdentity> {
    auth.current_user(request, None)
}

pub fn api_user<R: InboundRequest>(request: &R, auth: &AuthManager) -> Option<UserIdentity> {
    auth.current_user(request, Some(API_GUARD))
}
