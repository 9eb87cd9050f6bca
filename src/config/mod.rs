//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{fs, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "zefiro";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SITE_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_SITE_TITLE: &str = "Zefiro";
const DEFAULT_SITE_DESCRIPTION: &str = "Notes on systems, protocols, and the web.";
const DEFAULT_SITE_AUTHOR: &str = "Marco Ferrante";
const DEFAULT_VIEWS_TIMEOUT_MS: u64 = 2_000;

/// Command-line arguments for the Zefiro binary.
#[derive(Debug, Parser)]
#[command(name = "zefiro", version, about = "Zefiro personal site server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "ZEFIRO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the public listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the public listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

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

    /// Override the public site base URL used in canonical links and feeds.
    #[arg(long = "site-url", value_name = "URL")]
    pub site_url: Option<String>,

    /// Override the view-counter store endpoint URL.
    #[arg(long = "views-endpoint", value_name = "URL")]
    pub views_endpoint: Option<String>,

    /// Read the view-counter store token from a file.
    #[arg(long = "views-token-file", value_name = "PATH")]
    pub views_token_file: Option<PathBuf>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub site: SiteSettings,
    pub views: ViewsSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub public_addr: SocketAddr,
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

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub public_url: String,
    pub title: String,
    pub description: String,
    pub author: String,
}

/// External view-counter store. Endpoint and token must be supplied together;
/// with neither present the counter runs disabled and pages render zero views.
#[derive(Debug, Clone)]
pub struct ViewsSettings {
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub request_timeout: Duration,
}

impl ViewsSettings {
    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.token.is_some()
    }
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

    builder = builder.add_source(Environment::with_prefix("ZEFIRO").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_serve_overrides(&cli.overrides)?;

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
    site: RawSiteSettings,
    views: RawViewsSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) -> Result<(), LoadError> {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.site_url.as_ref() {
            self.site.public_url = Some(url.clone());
        }
        if let Some(endpoint) = overrides.views_endpoint.as_ref() {
            self.views.endpoint = Some(endpoint.clone());
        }
        if let Some(path) = overrides.views_token_file.as_ref() {
            let token = fs::read_to_string(path).map_err(|err| {
                LoadError::invalid(
                    "views.token_file",
                    format!("failed to read `{}`: {err}", path.display()),
                )
            })?;
            self.views.token = Some(token.trim().to_string());
        }
        Ok(())
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            site,
            views,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            site: build_site_settings(site)?,
            views: build_views_settings(views)?,
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

    let public_addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.public_addr", reason))?;

    Ok(ServerSettings { public_addr })
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

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let public_url = site
        .public_url
        .unwrap_or_else(|| DEFAULT_SITE_URL.to_string());
    Url::parse(&public_url)
        .map_err(|err| LoadError::invalid("site.public_url", err.to_string()))?;

    Ok(SiteSettings {
        public_url,
        title: site.title.unwrap_or_else(|| DEFAULT_SITE_TITLE.to_string()),
        description: site
            .description
            .unwrap_or_else(|| DEFAULT_SITE_DESCRIPTION.to_string()),
        author: site.author.unwrap_or_else(|| DEFAULT_SITE_AUTHOR.to_string()),
    })
}

fn build_views_settings(views: RawViewsSettings) -> Result<ViewsSettings, LoadError> {
    let endpoint = views.endpoint.and_then(non_empty);
    let token = views.token.and_then(non_empty);

    if let Some(endpoint) = endpoint.as_ref() {
        Url::parse(endpoint)
            .map_err(|err| LoadError::invalid("views.endpoint", err.to_string()))?;
    }
    match (&endpoint, &token) {
        (Some(_), None) => {
            return Err(LoadError::invalid(
                "views.token",
                "an endpoint is configured but no token is set",
            ));
        }
        (None, Some(_)) => {
            return Err(LoadError::invalid(
                "views.endpoint",
                "a token is configured but no endpoint is set",
            ));
        }
        _ => {}
    }

    let timeout_ms = views.request_timeout_ms.unwrap_or(DEFAULT_VIEWS_TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(LoadError::invalid(
            "views.request_timeout_ms",
            "must be greater than zero",
        ));
    }

    Ok(ViewsSettings {
        endpoint,
        token,
        request_timeout: Duration::from_millis(timeout_ms),
    })
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    public_url: Option<String>,
    title: Option<String>,
    description: Option<String>,
    author: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawViewsSettings {
    endpoint: Option<String>,
    token: Option<String>,
    request_timeout_ms: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}
