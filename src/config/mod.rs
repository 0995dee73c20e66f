//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "vetrina";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_STORE_DATASET: &str = "production";
const DEFAULT_STORE_API_VERSION: &str = "2024-01-01";
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CONTACT_WINDOW_SECS: u64 = 300;
const DEFAULT_CONTACT_MAX_REQUESTS: u64 = 5;
const DEFAULT_QUERY_CACHE_ENTRIES: u64 = 256;
const DEFAULT_PAGE_CACHE_ENTRIES: u64 = 128;

/// Command-line arguments for the Vetrina binary.
#[derive(Debug, Parser)]
#[command(name = "vetrina", version, about = "Vetrina portfolio API server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "VETRINA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the content store project id.
    #[arg(long = "store-project-id", value_name = "ID")]
    pub store_project_id: Option<String>,

    /// Override the content store dataset.
    #[arg(long = "store-dataset", value_name = "NAME")]
    pub store_dataset: Option<String>,

    /// Override the content store API version.
    #[arg(long = "store-api-version", value_name = "VERSION")]
    pub store_api_version: Option<String>,

    /// Override the content store request timeout.
    #[arg(long = "store-timeout-seconds", value_name = "SECONDS")]
    pub store_timeout_seconds: Option<u64>,

    /// Override the contact rate limit window size.
    #[arg(long = "contact-window-seconds", value_name = "SECONDS")]
    pub contact_window_seconds: Option<u64>,

    /// Override the contact rate limit request ceiling.
    #[arg(long = "contact-max-requests", value_name = "COUNT")]
    pub contact_max_requests: Option<u64>,

    /// Override the query cache capacity.
    #[arg(long = "cache-query-entries", value_name = "COUNT")]
    pub cache_query_entries: Option<u64>,

    /// Override the page cache capacity.
    #[arg(long = "cache-page-entries", value_name = "COUNT")]
    pub cache_page_entries: Option<u64>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub store: StoreSettings,
    pub revalidate: RevalidateSettings,
    pub contact: ContactSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

/// Content store connection. A missing project id means the store is not
/// configured and the client runs disabled.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub project_id: Option<String>,
    pub dataset: String,
    pub api_version: String,
    pub token: Option<String>,
    /// Full endpoint override; when absent the endpoint is derived from the
    /// project id.
    pub endpoint: Option<Url>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RevalidateSettings {
    pub secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContactSettings {
    pub window: Duration,
    pub max_requests: NonZeroU32,
    pub email_api_key: Option<String>,
    pub email_endpoint: Option<Url>,
    pub email_from: Option<String>,
    pub email_recipient: Option<String>,
}

impl ContactSettings {
    /// Notifications need a key, a sender, and a recipient; anything less
    /// and the contact form runs without email.
    pub fn email_enabled(&self) -> bool {
        self.email_api_key.is_some() && self.email_from.is_some() && self.email_recipient.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub query_entries: NonZeroU32,
    pub page_entries: NonZeroU32,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("VETRINA").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    store: RawStoreSettings,
    revalidate: RawRevalidateSettings,
    contact: RawContactSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(project_id) = overrides.store_project_id.as_ref() {
            self.store.project_id = Some(project_id.clone());
        }
        if let Some(dataset) = overrides.store_dataset.as_ref() {
            self.store.dataset = Some(dataset.clone());
        }
        if let Some(version) = overrides.store_api_version.as_ref() {
            self.store.api_version = Some(version.clone());
        }
        if let Some(seconds) = overrides.store_timeout_seconds {
            self.store.timeout_seconds = Some(seconds);
        }
        if let Some(window) = overrides.contact_window_seconds {
            self.contact.window_seconds = Some(window);
        }
        if let Some(max) = overrides.contact_max_requests {
            self.contact.max_requests = Some(max);
        }
        if let Some(entries) = overrides.cache_query_entries {
            self.cache.query_entries = Some(entries);
        }
        if let Some(entries) = overrides.cache_page_entries {
            self.cache.page_entries = Some(entries);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            store,
            revalidate,
            contact,
            cache,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            store: build_store_settings(store)?,
            revalidate: build_revalidate_settings(revalidate),
            contact: build_contact_settings(contact)?,
            cache: build_cache_settings(cache)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_store_settings(store: RawStoreSettings) -> Result<StoreSettings, LoadError> {
    let project_id = store.project_id.and_then(non_empty);

    let dataset = store
        .dataset
        .and_then(non_empty)
        .unwrap_or_else(|| DEFAULT_STORE_DATASET.to_string());
    let api_version = store
        .api_version
        .and_then(non_empty)
        .unwrap_or_else(|| DEFAULT_STORE_API_VERSION.to_string());

    let endpoint = store
        .endpoint
        .and_then(non_empty)
        .map(|value| {
            Url::parse(&value)
                .map_err(|err| LoadError::invalid("store.endpoint", err.to_string()))
        })
        .transpose()?;

    let timeout_secs = store.timeout_seconds.unwrap_or(DEFAULT_STORE_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "store.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(StoreSettings {
        project_id,
        dataset,
        api_version,
        token: store.token.and_then(non_empty),
        endpoint,
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_revalidate_settings(revalidate: RawRevalidateSettings) -> RevalidateSettings {
    RevalidateSettings {
        secret: revalidate.secret.and_then(non_empty),
    }
}

fn build_contact_settings(contact: RawContactSettings) -> Result<ContactSettings, LoadError> {
    let window_secs = contact
        .window_seconds
        .unwrap_or(DEFAULT_CONTACT_WINDOW_SECS);
    if window_secs == 0 {
        return Err(LoadError::invalid(
            "contact.window_seconds",
            "must be greater than zero",
        ));
    }

    let max_requests = non_zero_u32(
        contact.max_requests.unwrap_or(DEFAULT_CONTACT_MAX_REQUESTS),
        "contact.max_requests",
    )?;

    let email_endpoint = contact
        .email_endpoint
        .and_then(non_empty)
        .map(|value| {
            Url::parse(&value)
                .map_err(|err| LoadError::invalid("contact.email_endpoint", err.to_string()))
        })
        .transpose()?;

    Ok(ContactSettings {
        window: Duration::from_secs(window_secs),
        max_requests,
        email_api_key: contact.email_api_key.and_then(non_empty),
        email_endpoint,
        email_from: contact.email_from.and_then(non_empty),
        email_recipient: contact.email_recipient.and_then(non_empty),
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    Ok(CacheSettings {
        query_entries: non_zero_u32(
            cache.query_entries.unwrap_or(DEFAULT_QUERY_CACHE_ENTRIES),
            "cache.query_entries",
        )?,
        page_entries: non_zero_u32(
            cache.page_entries.unwrap_or(DEFAULT_PAGE_CACHE_ENTRIES),
            "cache.page_entries",
        )?,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStoreSettings {
    project_id: Option<String>,
    dataset: Option<String>,
    api_version: Option<String>,
    token: Option<String>,
    endpoint: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRevalidateSettings {
    secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContactSettings {
    window_seconds: Option<u64>,
    max_requests: Option<u64>,
    email_api_key: Option<String>,
    email_endpoint: Option<String>,
    email_from: Option<String>,
    email_recipient: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    query_entries: Option<u64>,
    page_entries: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(4000);
        raw.logging.level = Some("info".to_string());

        let overrides = ServeOverrides {
            server_port: Some(4321),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.server.addr.port(), 4321);
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    }

    #[test]
    fn store_defaults_apply_when_unset() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
        assert!(settings.store.project_id.is_none());
        assert_eq!(settings.store.dataset, DEFAULT_STORE_DATASET);
        assert_eq!(settings.store.api_version, DEFAULT_STORE_API_VERSION);
        assert_eq!(
            settings.store.timeout,
            Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS)
        );
    }

    #[test]
    fn blank_project_id_counts_as_unconfigured() {
        let mut raw = RawSettings::default();
        raw.store.project_id = Some("   ".to_string());
        let settings = Settings::from_raw(raw).expect("valid settings");
        assert!(settings.store.project_id.is_none());
    }

    #[test]
    fn invalid_store_endpoint_is_rejected() {
        let mut raw = RawSettings::default();
        raw.store.endpoint = Some("not a url".to_string());
        let result = Settings::from_raw(raw);
        assert!(matches!(
            result,
            Err(LoadError::Invalid {
                key: "store.endpoint",
                ..
            })
        ));
    }

    #[test]
    fn contact_defaults_to_five_per_five_minutes() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
        assert_eq!(settings.contact.window, Duration::from_secs(300));
        assert_eq!(settings.contact.max_requests.get(), 5);
        assert!(!settings.contact.email_enabled());
    }

    #[test]
    fn email_requires_key_from_and_recipient() {
        let mut raw = RawSettings::default();
        raw.contact.email_api_key = Some("re_key".to_string());
        raw.contact.email_from = Some("noreply@example.com".to_string());
        let partial = Settings::from_raw(raw.clone()).expect("valid settings");
        assert!(!partial.contact.email_enabled());

        raw.contact.email_recipient = Some("me@example.com".to_string());
        let full = Settings::from_raw(raw).expect("valid settings");
        assert!(full.contact.email_enabled());
    }

    #[test]
    fn zero_contact_window_is_rejected() {
        let mut raw = RawSettings::default();
        raw.contact.window_seconds = Some(0);
        assert!(Settings::from_raw(raw).is_err());
    }

    #[test]
    fn cli_json_logging_enforces_format() {
        let mut raw = RawSettings::default();
        let overrides = ServeOverrides {
            log_json: Some(true),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn default_to_serve_command() {
        let args = CliArgs::parse_from(["vetrina"]);
        let command = args
            .command
            .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
        assert!(matches!(command, Command::Serve(_)));
    }

    #[test]
    fn parse_serve_overrides() {
        let args = CliArgs::parse_from([
            "vetrina",
            "serve",
            "--server-host",
            "0.0.0.0",
            "--store-project-id",
            "abc123",
        ]);

        match args.command.expect("serve command") {
            Command::Serve(serve) => {
                assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
                assert_eq!(
                    serve.overrides.store_project_id.as_deref(),
                    Some("abc123")
                );
            }
        }
    }
}
