use serde::Deserialize;
use std::fs::File;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),

    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Path prefix must start with '/': {0}")]
    InvalidPathPrefix(String),

    #[error("Empty store credential")]
    EmptyStoreToken,

    #[error("Empty email credential")]
    EmptyEmailApiKey,

    #[error("Email notify list is empty")]
    EmptyNotifyList,
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3001,
        }
    }
}

/// Document-store connection and database ids.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StoreConfig {
    pub token: String,
    #[serde(default = "default_store_url")]
    pub api_url: Url,
    pub databases: Databases,
}

/// Database ids for each record kind. The states table is optional; without
/// it the hardcoded fallback table is served.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Databases {
    pub exports: String,
    pub products: String,
    pub producers: String,
    pub requests: String,
    #[serde(default)]
    pub states: Option<String>,
}

/// Transactional email API credentials and addressing.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct EmailConfig {
    pub api_key: String,
    #[serde(default = "default_email_url")]
    pub api_url: Url,
    /// Sender, e.g. "Loon Trading Co. <samples@loontradingco.com>"
    pub from: String,
    /// Staff addresses that receive the internal notice
    pub notify: Vec<String>,
    /// Brand name used in customer-facing subjects and sign-offs
    pub brand: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct GeoConfig {
    #[serde(default = "default_geo_url")]
    pub api_url: Url,
}

impl Default for GeoConfig {
    fn default() -> Self {
        GeoConfig {
            api_url: default_geo_url(),
        }
    }
}

fn default_store_url() -> Url {
    Url::parse("https://api.notion.com").expect("static URL")
}

fn default_email_url() -> Url {
    Url::parse("https://api.resend.com").expect("static URL")
}

fn default_geo_url() -> Url {
    Url::parse("http://ip-api.com").expect("static URL")
}

fn default_path_prefix() -> String {
    "/api".to_string()
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub listener: Listener,
    /// Public base URL used to build shareable sample-request links
    pub base_url: Url,
    /// Fixed prefix stripped before routing, "/api" by default
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,
    /// Absent section disables persistence (writes are logged and dropped)
    #[serde(default)]
    pub store: Option<StoreConfig>,
    /// Absent section disables all email sending
    #[serde(default)]
    pub email: Option<EmailConfig>,
    #[serde(default)]
    pub geo: GeoConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: Config = serde_yaml::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listener.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if !self.path_prefix.starts_with('/') {
            return Err(ConfigError::InvalidPathPrefix(self.path_prefix.clone()));
        }
        if let Some(store) = &self.store
            && store.token.is_empty()
        {
            return Err(ConfigError::EmptyStoreToken);
        }
        if let Some(email) = &self.email {
            if email.api_key.is_empty() {
                return Err(ConfigError::EmptyEmailApiKey);
            }
            if email.notify.is_empty() {
                return Err(ConfigError::EmptyNotifyList);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");
        tmp
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
listener:
    host: "0.0.0.0"
    port: 3001
base_url: "https://samples.loontradingco.com"
store:
    token: secret-token
    databases:
        exports: db-exports
        products: db-products
        producers: db-producers
        requests: db-requests
        states: db-states
email:
    api_key: re-key
    from: "Loon Trading Co. <samples@loontradingco.com>"
    notify:
        - john@loontradingco.com
    brand: "Loon Trading Co."
"#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert_eq!(config.listener.port, 3001);
        assert_eq!(config.path_prefix, "/api");
        let store = config.store.expect("store config");
        assert_eq!(store.api_url.as_str(), "https://api.notion.com/");
        assert_eq!(store.databases.states.as_deref(), Some("db-states"));
        let email = config.email.expect("email config");
        assert_eq!(email.notify, vec!["john@loontradingco.com"]);
        assert_eq!(config.geo.api_url.as_str(), "http://ip-api.com/");
    }

    #[test]
    fn test_integrations_are_optional() {
        let tmp = write_tmp_file("base_url: \"http://localhost:3001\"\n");
        let config = Config::from_file(tmp.path()).expect("load config");
        assert!(config.store.is_none());
        assert!(config.email.is_none());
        assert_eq!(config.listener, Listener::default());
    }

    #[test]
    fn test_validation_errors() {
        let yaml = r#"
listener: {host: "0.0.0.0", port: 0}
base_url: "http://localhost:3001"
"#;
        let tmp = write_tmp_file(yaml);
        assert!(matches!(
            Config::from_file(tmp.path()).unwrap_err(),
            ConfigError::InvalidPort
        ));

        let yaml = r#"
base_url: "http://localhost:3001"
path_prefix: "api"
"#;
        let tmp = write_tmp_file(yaml);
        assert!(matches!(
            Config::from_file(tmp.path()).unwrap_err(),
            ConfigError::InvalidPathPrefix(_)
        ));

        let yaml = r#"
base_url: "http://localhost:3001"
email:
    api_key: re-key
    from: "x@y.z"
    notify: []
    brand: "Loon Trading Co."
"#;
        let tmp = write_tmp_file(yaml);
        assert!(matches!(
            Config::from_file(tmp.path()).unwrap_err(),
            ConfigError::EmptyNotifyList
        ));
    }

    #[test]
    fn test_deserialization_errors() {
        // Invalid base URL
        let tmp = write_tmp_file("base_url: not-a-url\n");
        assert!(Config::from_file(tmp.path()).is_err());

        // Missing required field
        let tmp = write_tmp_file("listener: {host: \"0.0.0.0\", port: 3001}\n");
        assert!(Config::from_file(tmp.path()).is_err());
    }
}
