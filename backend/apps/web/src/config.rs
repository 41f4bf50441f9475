//! Application Settings
//!
//! Read once at startup from the environment (after `.env` is loaded).
//! Hierarchical keys such as `EmailSender:Host` are looked up as
//! `EmailSender__Host`.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose;
use identity::IdentityConfig;
use mailer::EmailSenderConfig;
use thiserror::Error;

use crate::pipeline::PipelineOptions;

const DEFAULT_ADDRESS: &str = "0.0.0.0:5000";
const DEFAULT_WEB_ROOT: &str = "wwwroot";
const DEFAULT_PUBLIC_BASE_URL: &str = "https://localhost:5001";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration value '{0}' is required")]
    Missing(String),

    #[error("Configuration value '{key}' is invalid: {message}")]
    Invalid { key: String, message: String },
}

impl ConfigError {
    fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Hosting environment.
///
/// Only Development changes behaviour; every other name (Staging, QA, ...)
/// runs the production pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppEnvironment {
    Development,
    #[default]
    Production,
    Other(String),
}

impl AppEnvironment {
    pub fn is_development(&self) -> bool {
        matches!(self, AppEnvironment::Development)
    }

    fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("development") {
            AppEnvironment::Development
        } else if value.is_empty() || value.eq_ignore_ascii_case("production") {
            AppEnvironment::Production
        } else {
            AppEnvironment::Other(value.to_string())
        }
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppEnvironment::Development => write!(f, "Development"),
            AppEnvironment::Production => write!(f, "Production"),
            AppEnvironment::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Facebook app credentials
#[derive(Clone, PartialEq, Eq)]
pub struct FacebookSettings {
    pub app_id: String,
    pub app_secret: String,
}

impl fmt::Debug for FacebookSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacebookSettings")
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .finish()
    }
}

/// Everything the process needs, assembled once
#[derive(Clone)]
pub struct AppSettings {
    pub environment: AppEnvironment,
    pub server_address: SocketAddr,
    /// `None` disables HTTPS redirection
    pub https_port: Option<u16>,
    pub web_root: PathBuf,
    pub public_base_url: String,
    /// `None` in Development means a random per-process secret
    pub session_secret: Option<[u8; 32]>,
    pub database_url: String,
    pub email_sender: EmailSenderConfig,
    pub facebook: Option<FacebookSettings>,
}

impl AppSettings {
    /// Read settings from process environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, which receives environment variable names
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source { lookup };

        let environment = match source.raw("APP_ENVIRONMENT") {
            Some(value) => AppEnvironment::parse(&value),
            None => AppEnvironment::default(),
        };

        let server_address = source
            .get("Server:Address")
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
        let server_address = server_address
            .parse()
            .map_err(|e| ConfigError::invalid("Server:Address", format!("{e}")))?;

        let https_port = source
            .get("Server:HttpsPort")
            .map(|value| parse_port("Server:HttpsPort", &value))
            .transpose()?;

        let web_root = source
            .get("Server:WebRoot")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WEB_ROOT));

        let public_base_url = source
            .get("App:PublicBaseUrl")
            .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string());

        let session_secret = match source.get("Identity:SessionSecret") {
            Some(value) => Some(decode_secret(&value)?),
            None if environment.is_development() => None,
            None => return Err(ConfigError::Missing("Identity:SessionSecret".to_string())),
        };

        let database_url = source
            .get("ConnectionStrings:DefaultConnection")
            .ok_or_else(|| ConfigError::Missing("ConnectionStrings:DefaultConnection".to_string()))?;

        Ok(Self {
            environment,
            server_address,
            https_port,
            web_root,
            public_base_url,
            session_secret,
            database_url,
            email_sender: email_sender(&source)?,
            facebook: facebook(&source)?,
        })
    }

    /// Identity settings for this environment
    pub fn identity_config(&self) -> IdentityConfig {
        let base = match self.session_secret {
            Some(secret) => IdentityConfig {
                session_secret: secret,
                ..IdentityConfig::default()
            },
            None => IdentityConfig::with_random_secret(),
        };

        IdentityConfig {
            cookie_secure: !self.environment.is_development(),
            public_base_url: self.public_base_url.clone(),
            ..base
        }
    }

    pub fn pipeline(&self) -> PipelineOptions {
        PipelineOptions {
            environment: self.environment.clone(),
            https_port: self.https_port,
            web_root: self.web_root.clone(),
        }
    }
}

impl fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSettings")
            .field("environment", &self.environment)
            .field("server_address", &self.server_address)
            .field("https_port", &self.https_port)
            .field("web_root", &self.web_root)
            .field("public_base_url", &self.public_base_url)
            .field("session_secret", &self.session_secret.map(|_| "[REDACTED]"))
            .field("database_url", &"[REDACTED]")
            .field("email_sender", &self.email_sender)
            .field("facebook", &self.facebook)
            .finish()
    }
}

struct Source<F> {
    lookup: F,
}

impl<F> Source<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
    }

    /// `Section:Key` through its `Section__Key` variable
    fn get(&self, key: &str) -> Option<String> {
        self.raw(&key.replace(':', "__"))
    }
}

/// Missing strings are empty, a missing port is 0, a missing flag is false
fn email_sender<F>(source: &Source<F>) -> ConfigResult<EmailSenderConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let port = match source.get("EmailSender:Port") {
        Some(value) => parse_port("EmailSender:Port", &value)?,
        None => 0,
    };
    let enable_ssl = match source.get("EmailSender:EnableSSL") {
        Some(value) => parse_bool("EmailSender:EnableSSL", &value)?,
        None => false,
    };

    Ok(EmailSenderConfig::new(
        source.get("EmailSender:Host").unwrap_or_default(),
        port,
        enable_ssl,
        source.get("EmailSender:UserName").unwrap_or_default(),
        source.get("EmailSender:Password").unwrap_or_default(),
        source.get("EmailSender:SenderEmail").unwrap_or_default(),
    ))
}

fn facebook<F>(source: &Source<F>) -> ConfigResult<Option<FacebookSettings>>
where
    F: Fn(&str) -> Option<String>,
{
    const APP_ID: &str = "Authentication:CoderPro:Facebook:AppId";
    const APP_SECRET: &str = "Authentication:CoderPro:Facebook:AppSecret";

    match (source.get(APP_ID), source.get(APP_SECRET)) {
        (Some(app_id), Some(app_secret)) => Ok(Some(FacebookSettings { app_id, app_secret })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::Missing(APP_SECRET.to_string())),
        (None, Some(_)) => Err(ConfigError::Missing(APP_ID.to_string())),
    }
}

fn parse_port(key: &str, value: &str) -> ConfigResult<u16> {
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::invalid(key, format!("'{value}' is not a port number: {e}")))
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::invalid(key, format!("'{value}' is not a boolean"))),
    }
}

fn decode_secret(value: &str) -> ConfigResult<[u8; 32]> {
    const KEY: &str = "Identity:SessionSecret";

    let bytes = general_purpose::STANDARD
        .decode(value.trim())
        .map_err(|e| ConfigError::invalid(KEY, format!("not base64: {e}")))?;

    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| ConfigError::invalid(KEY, format!("expected 32 bytes, got {}", bytes.len())))
}
