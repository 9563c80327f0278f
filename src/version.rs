//! API version resolution.
//!
//! A request names its API version either in the path (`/api/v3/...`) or in the
//! `Accept-Version` header (`v3`, `3`, `3-beta`, ...). The path wins when both are present.

use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::request::InboundRequest;

pub const ACCEPT_VERSION: &str = "accept-version";

/// Headers whose presence alone marks a request as an API call.
const API_HEADERS: [&str; 3] = [ACCEPT_VERSION, "x-api-key", "authorization"];

static PATH_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"api/v([0-9]+)").expect("Invalid path version pattern"));

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("Invalid digits pattern"));

/// The API version a request asks for, `None` when it does not say.
///
/// `Some(0)` is a real version and is never used to mean "unknown". Each call derives the
/// value again from the current path and headers.
pub fn resolve_version<R: InboundRequest + ?Sized>(request: &R) -> Option<u64> {
    version_from_path(request.path())
        .or_else(|| request.header(ACCEPT_VERSION).and_then(version_from_header))
}

fn version_from_path(path: &str) -> Option<u64> {
    PATH_VERSION.captures(path)?.get(1)?.as_str().parse().ok()
}

fn version_from_header(value: &str) -> Option<u64> {
    DIGITS.find(value)?.as_str().parse().ok()
}

pub fn is_version<R: InboundRequest + ?Sized>(request: &R, target: u64) -> bool {
    resolve_version(request) == Some(target)
}

pub fn is_version_at_least<R: InboundRequest + ?Sized>(request: &R, minimum: u64) -> bool {
    resolve_version(request).is_some_and(|version| version >= minimum)
}

/// Whether the request targets the API rather than a browser page.
pub fn is_api_request<R: InboundRequest + ?Sized>(request: &R) -> bool {
    request.path().starts_with("api/")
        || request.expects_json()
        || API_HEADERS.iter().any(|name| {
            request
                .headers()
                .get(*name)
                .is_some_and(|value| !value.is_empty())
        })
}

/// Extractor for the resolved version. Never rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiVersion(pub Option<u64>);

#[async_trait]
impl<S> FromRequestParts<S> for ApiVersion
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ApiVersion(resolve_version(&*parts)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    fn request(uri: &str, headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn version_from_anywhere_in_path() {
        assert_eq!(resolve_version(&request("/api/v12", &[])), Some(12));
        assert_eq!(resolve_version(&request("/api/v12/users/7", &[])), Some(12));
        assert_eq!(resolve_version(&request("/tenant/api/v12/x", &[])), Some(12));
    }

    #[test]
    fn first_path_match_wins() {
        assert_eq!(resolve_version(&request("/api/v7/api/v9", &[])), Some(7));
    }

    #[test]
    fn path_beats_header() {
        let req = request("/api/v2/users", &[("Accept-Version", "v5")]);
        assert_eq!(resolve_version(&req), Some(2));
    }

    #[test]
    fn header_first_digit_run() {
        let req = request("/users", &[("Accept-Version", "v3-beta")]);
        assert_eq!(resolve_version(&req), Some(3));

        let req = request("/users", &[("accept-version", "release 4.1")]);
        assert_eq!(resolve_version(&req), Some(4));

        let req = request("/users", &[("Accept-Version", "latest")]);
        assert_eq!(resolve_version(&req), None);
    }

    #[test]
    fn leading_zeros_and_zero() {
        assert_eq!(resolve_version(&request("/api/v007/x", &[])), Some(7));

        let zero = request("/api/v0/x", &[]);
        assert_eq!(resolve_version(&zero), Some(0));
        assert!(is_version(&zero, 0));
    }

    #[test]
    fn header_with_non_ascii_text() {
        let mut req = request("/users", &[]);
        req.headers_mut().insert(
            ACCEPT_VERSION,
            HeaderValue::from_bytes("v3-bêta".as_bytes()).unwrap(),
        );
        assert_eq!(resolve_version(&req), Some(3));
    }

    #[test]
    fn only_ascii_digits_count() {
        // Arabic-Indic three
        let mut req = request("/users", &[]);
        req.headers_mut().insert(
            ACCEPT_VERSION,
            HeaderValue::from_bytes("v\u{0663}".as_bytes()).unwrap(),
        );
        assert_eq!(resolve_version(&req), None);
    }

    #[test]
    fn header_version_zero_is_present() {
        let req = request("/users", &[("Accept-Version", "0")]);
        assert_eq!(resolve_version(&req), Some(0));
        assert!(is_version(&req, 0));
        assert!(is_version_at_least(&req, 0));
        assert!(!is_version_at_least(&req, 1));
    }

    #[test]
    fn overflowing_path_version_falls_through_to_header() {
        let req = request(
            "/api/v99999999999999999999999/x",
            &[("Accept-Version", "4")],
        );
        assert_eq!(resolve_version(&req), Some(4));

        let bare = request("/api/v99999999999999999999999/x", &[]);
        assert_eq!(resolve_version(&bare), None);
    }

    #[test]
    fn path_without_digits_does_not_match() {
        assert_eq!(resolve_version(&request("/api/version/x", &[])), None);
    }

    #[test]
    fn absent_version() {
        let req = request("/home", &[]);
        assert_eq!(resolve_version(&req), None);
        assert!(!is_version(&req, 0));
        assert!(!is_version_at_least(&req, 0));
    }

    #[test]
    fn version_comparisons() {
        let req = request("/api/v5/orders", &[]);
        assert!(is_version(&req, 5));
        assert!(!is_version(&req, 4));
        assert!(is_version_at_least(&req, 5));
        assert!(is_version_at_least(&req, 1));
        assert!(!is_version_at_least(&req, 6));
    }

    #[test]
    fn resolution_follows_header_changes() {
        let mut req = request("/orders", &[("Accept-Version", "1")]);
        assert_eq!(resolve_version(&req), Some(1));

        req.headers_mut()
            .insert("accept-version", "v8".parse().unwrap());
        assert_eq!(resolve_version(&req), Some(8));
    }

    #[test]
    fn api_request_detection() {
        assert!(is_api_request(&request("/api/users", &[])));
        assert!(is_api_request(&request("/home", &[("X-API-KEY", "abc")])));
        assert!(is_api_request(&request("/home", &[("Authorization", "Bearer t")])));
        assert!(is_api_request(&request("/home", &[("Accept-Version", "2")])));
        assert!(is_api_request(&request("/home", &[("Accept", "application/json")])));
        assert!(!is_api_request(&request("/home", &[])));
        assert!(!is_api_request(&request("/home", &[("X-API-KEY", "")])));
        assert!(!is_api_request(&request("/apiary", &[])));
    }

    #[tokio::test]
    async fn extractor_reads_header() {
        let (mut parts, _) = request("/orders", &[("Accept-Version", "9")]).into_parts();
        let ApiVersion(version) = ApiVersion::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(version, Some(9));
    }
}
