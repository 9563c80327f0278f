//! The "current request" abstraction the helpers read from.
//!
//! Everything here is derived from three things a request already carries: its URI, its header
//! map and its extensions. The trait is implemented for full `http::Request`s (middleware and
//! handlers that own the request) and for `http::request::Parts` (extractors).

use std::collections::{BTreeMap, HashSet};
use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::{header, request::Parts, Extensions, HeaderMap, Request, Uri};
use cookie::Cookie;

/// Peers whose `X-Forwarded-*` headers are believed.
///
/// Put it in the request extensions (for example with an `Extension` layer). A request without
/// it trusts nobody.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedProxies(HashSet<IpAddr>);

impl TrustedProxies {
    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.0.contains(ip)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<IpAddr> for TrustedProxies {
    fn from_iter<I: IntoIterator<Item = IpAddr>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub trait InboundRequest {
    fn uri(&self) -> &Uri;
    fn headers(&self) -> &HeaderMap;
    fn extensions(&self) -> &Extensions;

    /// Path without surrounding slashes, `/` for the root.
    fn path(&self) -> &str {
        let path = self.uri().path().trim_matches('/');
        if path.is_empty() {
            "/"
        } else {
            path
        }
    }

    /// First value of a header as text. Any valid UTF-8 is accepted, not only visible ASCII;
    /// values that are not valid UTF-8 count as missing.
    fn header(&self, name: &str) -> Option<&str> {
        self.headers()
            .get(name)
            .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
    }

    fn header_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.header(name).unwrap_or(default)
    }

    /// Token following the last case-insensitive `Bearer ` marker in `Authorization`.
    ///
    /// The marker must start the value or follow whitespace or a `,`, so `xbearer y` is no token.
    fn bearer_token(&self) -> Option<&str> {
        let value = self.header(header::AUTHORIZATION.as_str())?;
        let lower = value.to_ascii_lowercase();
        let (position, marker) = lower.rmatch_indices("bearer ").find(|(position, _)| {
            lower[..*position]
                .chars()
                .next_back()
                .map_or(true, |c| c.is_whitespace() || c == ',')
        })?;
        let start = position + marker.len();
        let token = value[start..].split(',').next().unwrap_or_default().trim();

        (!token.is_empty()).then_some(token)
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.headers()
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|c| Cookie::parse(c.trim()).ok())
            .find(|c| c.name() == name)
            .map(|c| c.value().to_string())
    }

    fn peer_addr(&self) -> Option<IpAddr> {
        self.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    }

    fn from_trusted_proxy(&self) -> bool {
        match (self.peer_addr(), self.extensions().get::<TrustedProxies>()) {
            (Some(peer), Some(trusted)) => trusted.contains(&peer),
            _ => false,
        }
    }

    /// Client address.
    ///
    /// When the peer is a trusted proxy, `X-Forwarded-For` is walked from the right and the
    /// first hop that is not itself a trusted proxy wins. If every hop is trusted the left-most
    /// one is used. Otherwise the socket peer is the client.
    fn ip(&self) -> Option<IpAddr> {
        if self.from_trusted_proxy() {
            let hops: Vec<IpAddr> = self
                .header("x-forwarded-for")
                .map(|v| v.split(',').filter_map(|hop| hop.trim().parse().ok()).collect())
                .unwrap_or_default();

            let trusted = self.extensions().get::<TrustedProxies>();
            let client = hops
                .iter()
                .rev()
                .find(|hop| !trusted.is_some_and(|t| t.contains(hop)))
                .or_else(|| hops.first());

            if let Some(client) = client {
                return Some(*client);
            }
        }

        self.peer_addr()
    }

    fn secure(&self) -> bool {
        if self.uri().scheme_str() == Some("https") {
            return true;
        }

        self.from_trusted_proxy()
            && self.header("x-forwarded-proto").is_some_and(|proto| {
                proto
                    .split(',')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .eq_ignore_ascii_case("https")
            })
    }

    /// Media ranges from `Accept`, highest quality first. Ranges with `q=0` are dropped.
    fn acceptable_content_types(&self) -> Vec<&str> {
        self.header(header::ACCEPT.as_str())
            .map(parse_accept)
            .unwrap_or_default()
    }

    fn accepts_any_content_type(&self) -> bool {
        match self.acceptable_content_types().first() {
            None => true,
            Some(first) => *first == "*/*" || *first == "*",
        }
    }

    fn wants_json(&self) -> bool {
        self.acceptable_content_types()
            .first()
            .map(|first| first.to_ascii_lowercase())
            .is_some_and(|first| first.contains("/json") || first.contains("+json"))
    }

    fn expects_json(&self) -> bool {
        let ajax = self.header("x-requested-with") == Some("XMLHttpRequest");
        let pjax = self
            .header("x-pjax")
            .is_some_and(|v| !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"));

        (ajax && !pjax && self.accepts_any_content_type()) || self.wants_json()
    }

    /// Every header, keyed by lower-case name, with all of its values.
    fn all_headers(&self) -> BTreeMap<String, Vec<String>> {
        let mut all: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in self.headers() {
            all.entry(name.as_str().to_owned())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }
        all
    }
}

fn parse_accept(accept: &str) -> Vec<&str> {
    let mut ranges: Vec<(&str, f32)> = accept
        .split(',')
        .filter_map(|item| {
            let mut params = item.split(';');
            let media = params.next()?.trim();
            if media.is_empty() {
                return None;
            }
            let quality = params
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            Some((media, quality))
        })
        .collect();

    // stable: equal weights keep listing order
    ranges.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranges
        .into_iter()
        .filter(|(_, quality)| *quality > 0.0)
        .map(|(media, _)| media)
        .collect()
}

impl<B> InboundRequest for Request<B> {
    fn uri(&self) -> &Uri {
        Request::uri(self)
    }

    fn headers(&self) -> &HeaderMap {
        Request::headers(self)
    }

    fn extensions(&self) -> &Extensions {
        Request::extensions(self)
    }
}

impl InboundRequest for Parts {
    fn uri(&self) -> &Uri {
        &self.uri
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn extensions(&self) -> &Extensions {
        &self.extensions
    }
}
