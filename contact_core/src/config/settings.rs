use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub form: FormConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Where submissions are delivered. The same URL is the action of the
/// native form fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    pub endpoint: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// JSON file holding rate-limit records; empty keeps them in memory.
    pub storage_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            form: FormConfig::default(),
            rate_limit: RateLimitConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8888/".to_string(),
            request_timeout_seconds: 10,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            storage_path: String::new(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("cors.allowed_origins"),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.form.endpoint.trim().is_empty() {
            return Err(ConfigError::Message(
                "Form endpoint cannot be empty".to_string(),
            ));
        }

        if !self.form.endpoint.starts_with("http://") && !self.form.endpoint.starts_with("https://") {
            return Err(ConfigError::Message(
                "Form endpoint must be an http(s) URL".to_string(),
            ));
        }

        if self.form.request_timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "Form request timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn rate_limit_storage_path(&self) -> Option<PathBuf> {
        let path = self.rate_limit.storage_path.trim();
        if path.is_empty() {
            None
        } else {
            Some(PathBuf::from(path))
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.form.request_timeout_seconds, 10);
        assert!(config.rate_limit_storage_path().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.server.port = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.form.endpoint = String::new();
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.form.endpoint = "ftp://forms.example".to_string();
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.form.request_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bind_address() {
        let mut config = AppConfig::default();
        config.server.host = "0.0.0.0".to_string();
        config.server.port = 8080;
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_storage_path() {
        let mut config = AppConfig::default();
        config.rate_limit.storage_path = "  ./data/limits.json ".to_string();
        assert_eq!(
            config.rate_limit_storage_path(),
            Some(PathBuf::from("./data/limits.json"))
        );
    }

    #[test]
    fn test_config_loading() {
        let config = AppConfig::load().expect("Should load default configuration");

        assert!(!config.server.host.is_empty());
        assert!(config.server.port > 0);
        assert!(config.validate().is_ok());
    }
}
