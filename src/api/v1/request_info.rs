use std::collections::BTreeMap;
use std::net::IpAddr;

use axum::{
    extract::{Request, State},
    Extension, Json,
};
use serde::Serialize;

use crate::api::common::tracing::redacted_headers;
use crate::api::common::ApiResponse;
use crate::auth::UserIdentity;
use crate::helpers::{
    api_user, auth_user, client_ip, is_api_authenticated, is_secure_request, request_content_type,
    request_locale, request_token,
};
use crate::request::InboundRequest;
use crate::version::{is_api_request, resolve_version};
use crate::InnerState;

/// Everything the helpers can tell about one request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    pub path: String,
    pub api_version: Option<u64>,
    pub is_api_request: bool,
    pub client_ip: Option<IpAddr>,
    pub locale: String,
    pub content_type: Option<String>,
    pub secure: bool,
    pub has_bearer_token: bool,
    pub api_authenticated: bool,
    pub user: Option<UserIdentity>,
    pub api_user: Option<UserIdentity>,
    pub headers: BTreeMap<String, Vec<String>>,
}

impl RequestInfo {
    pub fn collect<R: InboundRequest>(request: &R, state: &InnerState) -> Self {
        Self {
            path: request.path().to_owned(),
            api_version: resolve_version(request),
            is_api_request: is_api_request(request),
            client_ip: client_ip(request),
            locale: request_locale(request, &state.settings).to_owned(),
            content_type: request_content_type(request).map(str::to_owned),
            secure: is_secure_request(request),
            has_bearer_token: request_token(request).is_some(),
            api_authenticated: is_api_authenticated(request, &state.auth),
            user: auth_user(request, &state.auth),
            api_user: api_user(request, &state.auth),
            headers: redacted_headers(request),
        }
    }
}

#[tracing::instrument(name = "Describe request", skip(state, request), fields(path = %request.uri().path()))]
pub async fn request_info(State(state): State<InnerState>, request: Request) -> Json<RequestInfo> {
    let info = RequestInfo::collect(&request, &state);
    tracing::debug!(
        api_version = ?info.api_version,
        is_api_request = info.is_api_request,
        "Collected request metadata"
    );
    Json(info)
}

#[tracing::instrument(name = "Get current user", skip(user), fields(user_id = %user.id))]
pub async fn me(Extension(user): Extension<UserIdentity>) -> Json<ApiResponse<UserIdentity>> {
    Json(ApiResponse::success(user))
}
