//! Session configuration and its file loader.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LoadTestError, Result};
use crate::urls::WebProtocol;

pub const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 100;
pub const DEFAULT_MAX_IDLE_CONNECTIONS_PER_HOST: usize = 20;

fn default_max_idle_connections() -> usize {
    DEFAULT_MAX_IDLE_CONNECTIONS
}

fn default_max_idle_connections_per_host() -> usize {
    DEFAULT_MAX_IDLE_CONNECTIONS_PER_HOST
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub protocol: WebProtocol,
    pub server: String,
    pub domain: String,
    pub project: String,
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default)]
    pub proxy_user: Option<String>,
    #[serde(default)]
    pub proxy_password: Option<String>,
    /// Idle connections kept for reuse. Active connections are not capped.
    #[serde(default = "default_max_idle_connections")]
    pub max_idle_connections: usize,
    #[serde(default = "default_max_idle_connections_per_host")]
    pub max_idle_connections_per_host: usize,
    /// Overall per-request timeout. Unset means the transport defaults apply.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl SessionConfig {
    pub fn new(
        protocol: WebProtocol,
        server: impl Into<String>,
        domain: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            protocol,
            server: server.into(),
            domain: domain.into(),
            project: project.into(),
            proxy_url: None,
            proxy_user: None,
            proxy_password: None,
            max_idle_connections: DEFAULT_MAX_IDLE_CONNECTIONS,
            max_idle_connections_per_host: DEFAULT_MAX_IDLE_CONNECTIONS_PER_HOST,
            timeout_secs: None,
            user_agent: None,
        }
    }

    pub fn with_proxy(
        mut self,
        url: impl Into<String>,
        user: Option<String>,
        password: Option<String>,
    ) -> Self {
        self.proxy_url = Some(url.into());
        self.proxy_user = user;
        self.proxy_password = password;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Load a `.toml` or `.json` configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LoadTestError::configuration(format!("Failed to read '{}': {e}", path.display()))
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => serde_json::from_str(&content).map_err(|e| {
                LoadTestError::configuration(format!("Invalid JSON in '{}': {e}", path.display()))
            }),
            Some(ext) => Err(LoadTestError::configuration(format!(
                "Unsupported config extension '{ext}'"
            ))),
            None => Err(LoadTestError::configuration(
                "Config file has no extension",
            )),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| LoadTestError::configuration(format!("Invalid TOML: {e}")))
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("protocol", &self.protocol)
            .field("server", &self.server)
            .field("domain", &self.domain)
            .field("project", &self.project)
            .field("proxy_url", &self.proxy_url)
            .field("proxy_user", &self.proxy_user)
            .field("proxy_password", &self.proxy_password.as_ref().map(|_| "<redacted>"))
            .field("max_idle_connections", &self.max_idle_connections)
            .field("max_idle_connections_per_host", &self.max_idle_connections_per_host)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn toml_fills_pool_defaults() {
        let config = SessionConfig::from_toml_str(
            r#"
protocol = "http"
server = "pc.example.com:8080"
domain = "DEFAULT"
project = "perf"
"#,
        )
        .unwrap();
        assert_eq!(config.protocol, WebProtocol::Http);
        assert_eq!(config.max_idle_connections, 100);
        assert_eq!(config.max_idle_connections_per_host, 20);
        assert!(config.proxy_url.is_none());
        assert!(config.timeout().is_none());
    }

    #[test]
    fn protocol_defaults_to_https() {
        let config =
            SessionConfig::from_toml_str("server = \"s\"\ndomain = \"d\"\nproject = \"p\"\n").unwrap();
        assert_eq!(config.protocol, WebProtocol::Https);
    }

    #[test]
    fn missing_server_is_a_configuration_error() {
        let err = SessionConfig::from_toml_str("domain = \"d\"\nproject = \"p\"\n").unwrap_err();
        assert!(matches!(err, LoadTestError::Configuration { .. }));
    }

    #[test]
    fn loads_json_file_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"server":"s","domain":"d","project":"p","proxy_url":"http://proxy:3128","timeout_secs":30}}"#
        )
        .unwrap();
        let config = SessionConfig::from_file(file.path()).unwrap();
        assert_eq!(config.proxy_url.as_deref(), Some("http://proxy:3128"));
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(matches!(
            SessionConfig::from_file(file.path()),
            Err(LoadTestError::Configuration { .. })
        ));
    }

    #[test]
    fn debug_redacts_proxy_password() {
        let config = SessionConfig::new(WebProtocol::Https, "s", "d", "p").with_proxy(
            "http://proxy:3128",
            Some("bob".to_string()),
            Some("hunter2".to_string()),
        );
        let rendered = format!("{config:?}");
        assert!(rendered.contains("bob"));
        assert!(!rendered.contains("hunter2"));
    }
}
