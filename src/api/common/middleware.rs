use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};

use crate::auth::API_GUARD;
use crate::errors::AppError;
use crate::version::resolve_version;
use crate::InnerState;

pub const API_VERSION_HEADER: &str = "x-api-version";

/// Rejects requests the `api` guard does not recognise and hands the resolved user to handlers
/// through the request extensions.
pub async fn auth_middleware(
    State(state): State<InnerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = state
        .auth
        .current_user(&request, Some(API_GUARD))
        .ok_or_else(|| AppError::Authentication(anyhow::anyhow!("Missing or invalid token")))?;

    tracing::debug!(user_id = %user.id, "Request authenticated");
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Echoes the resolved API version back in `X-Api-Version`.
pub async fn api_version_middleware(request: Request, next: Next) -> Response {
    let version = resolve_version(&request);
    let mut response = next.run(request).await;

    if let Some(version) = version {
        response
            .headers_mut()
            .insert(API_VERSION_HEADER, HeaderValue::from(version));
    }
    response
}
