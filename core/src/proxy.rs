//! Outbound proxy configuration.
//!
//! The proxy is given as a single `scheme://host[:port]` string. A missing
//! port means 80. Credentials are only attached when a username is present.

use std::fmt;

use url::Url;

use crate::error::{LoadTestError, Result};

const DEFAULT_PROXY_PORT: u16 = 80;

#[derive(Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub username: String,
    password: String,
}

impl ProxyCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub credentials: Option<ProxyCredentials>,
}

impl ProxyConfig {
    /// Parse `scheme://host[:port]`. A single trailing `/` is tolerated.
    pub fn parse(proxy_url: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            LoadTestError::configuration(format!(
                "Invalid proxy URL '{proxy_url}': {reason}. \
                 Use the pattern http(s)://<host>:<port> or leave it blank"
            ))
        };

        let (scheme, rest) = proxy_url
            .trim()
            .split_once("://")
            .ok_or_else(|| invalid("missing scheme separator '://'"))?;
        if scheme.is_empty() {
            return Err(invalid("missing scheme"));
        }
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        if rest.contains('/') {
            return Err(invalid("a path is not allowed"));
        }

        let (host, port) = match rest.split_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| invalid("port is not a number"))?;
                (host, port)
            }
            None => (rest, DEFAULT_PROXY_PORT),
        };
        if host.is_empty() {
            return Err(invalid("missing host"));
        }

        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            host: host.to_string(),
            port,
            credentials: None,
        })
    }

    /// Build the optional proxy from the raw constructor inputs.
    ///
    /// An empty or absent URL yields `None`. Credentials are attached only
    /// when `user` is non-empty.
    pub fn from_parts(
        proxy_url: Option<&str>,
        user: Option<&str>,
        password: Option<&str>,
    ) -> Result<Option<Self>> {
        let Some(proxy_url) = proxy_url.filter(|url| !url.trim().is_empty()) else {
            return Ok(None);
        };
        let mut proxy = Self::parse(proxy_url)?;
        if let Some(user) = user.filter(|user| !user.is_empty()) {
            proxy.credentials = Some(ProxyCredentials::new(user, password.unwrap_or_default()));
        }
        Ok(Some(proxy))
    }

    /// Convert into the agent's proxy setting, embedding credentials as userinfo.
    pub fn to_ureq(&self) -> Result<ureq::Proxy> {
        let mut url = Url::parse(&format!("{}://{}:{}", self.scheme, self.host, self.port))
            .map_err(|e| LoadTestError::configuration(format!("Invalid proxy address: {e}")))?;
        if let Some(credentials) = &self.credentials {
            url.set_username(&credentials.username)
                .and_then(|()| url.set_password(Some(&credentials.password)))
                .map_err(|()| {
                    LoadTestError::configuration("Proxy address cannot carry credentials")
                })?;
        }
        ureq::Proxy::new(url.as_str())
            .map_err(|e| LoadTestError::configuration(format!("Unsupported proxy: {e}")))
    }
}
