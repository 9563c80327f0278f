use std::net::IpAddr;

use crate::auth::WEB_GUARD;
use crate::errors::AppError;
use crate::request::TrustedProxies;

const DEFAULT_LOCALE: &str = "en";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Locale reported when a request has no `Accept-Language`.
    pub locale: String,
    pub token_secret: String,
    pub default_guard: String,
    pub trusted_proxies: TrustedProxies,
    pub bind_addr: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token_secret = non_empty("TOKEN").ok_or_else(|| {
            tracing::error!("TOKEN not set");
            AppError::Configuration("TOKEN must be set".to_string())
        })?;

        let trusted_proxies = match non_empty("TRUSTED_PROXIES") {
            Some(raw) => parse_trusted_proxies(&raw)?,
            None => TrustedProxies::default(),
        };

        Ok(Self {
            locale: non_empty("APP_LOCALE").unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            token_secret,
            default_guard: non_empty("AUTH_DEFAULT_GUARD").unwrap_or_else(|| WEB_GUARD.to_string()),
            trusted_proxies,
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        })
    }
}

fn parse_trusted_proxies(raw: &str) -> Result<TrustedProxies, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry.parse::<IpAddr>().map_err(|e| {
                AppError::Configuration(format!("Invalid TRUSTED_PROXIES entry '{entry}': {e}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let settings = settings(&[("TOKEN", "s3cret")]).unwrap();
        assert_eq!(settings.locale, "en");
        assert_eq!(settings.default_guard, "web");
        assert_eq!(settings.bind_addr, "0.0.0.0:3001");
        assert!(settings.trusted_proxies.is_empty());
    }

    #[test]
    fn token_is_required() {
        let err = settings(&[("APP_LOCALE", "de")]).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));

        let err = settings(&[("TOKEN", "  ")]).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn overrides_and_proxies() {
        let settings = settings(&[
            ("TOKEN", "s3cret"),
            ("APP_LOCALE", "pt-BR"),
            ("AUTH_DEFAULT_GUARD", "api"),
            ("TRUSTED_PROXIES", "10.0.0.1, ::1,"),
        ])
        .unwrap();

        assert_eq!(settings.locale, "pt-BR");
        assert_eq!(settings.default_guard, "api");
        assert!(settings.trusted_proxies.contains(&"10.0.0.1".parse().unwrap()));
        assert!(settings.trusted_proxies.contains(&"::1".parse().unwrap()));
    }

    #[test]
    fn invalid_proxy_entry() {
        let err = settings(&[("TOKEN", "s3cret"), ("TRUSTED_PROXIES", "10.0.0.1,proxy.local")])
            .unwrap_err();
        assert!(err.to_string().contains("proxy.local"));
    }
}
