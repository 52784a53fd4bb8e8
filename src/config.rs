//! Environment driven server configuration.

use std::env;
use std::path::PathBuf;

use pushkind_common::models::config::CommonServerConfig;
use thiserror::Error;

use crate::domain::order::tracking_url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),
    #[error("{name} has an invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
}

/// Deployment flavour; development exposes internal error details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnvironment {
    Development,
    #[default]
    Production,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub address: String,
    pub port: u16,
    /// Cookie signing secret; a random key is generated when absent.
    pub secret: Option<String>,
    pub auth_service_url: String,
    pub domain: String,
    /// Base URL used to build public tracking links.
    pub public_base_url: String,
    pub upload_dir: PathBuf,
    pub environment: AppEnvironment,
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match value("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => 8080,
        };

        let environment = match value("APP_ENV").as_deref().map(str::trim) {
            None | Some("production") => AppEnvironment::Production,
            Some("development") => AppEnvironment::Development,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "APP_ENV",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            database_url: value("DATABASE_URL").unwrap_or_else(|| "app.db".to_string()),
            address: value("ADDRESS").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            secret: value("SECRET_KEY"),
            auth_service_url: value("AUTH_SERVICE_URL")
                .ok_or(ConfigError::Missing("AUTH_SERVICE_URL"))?,
            domain: value("DOMAIN").unwrap_or_else(|| "localhost".to_string()),
            public_base_url: value("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:8080".to_string())
                .trim_end_matches('/')
                .to_string(),
            upload_dir: value("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./uploads")),
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == AppEnvironment::Development
    }

    /// Settings shared with the `pushkind-common` middleware and helpers.
    pub fn common(&self) -> CommonServerConfig {
        CommonServerConfig {
            secret: self.secret.clone().unwrap_or_default(),
            auth_service_url: self.auth_service_url.clone(),
        }
    }

    /// Public tracking page of the order with `token`.
    pub fn tracking_url(&self, token: &str) -> String {
        tracking_url(&self.public_base_url, token)
    }
}
