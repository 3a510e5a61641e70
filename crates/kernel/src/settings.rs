use std::path::PathBuf;

use anyhow::{anyhow, Context};
use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "SHELF_ENV";
const CONFIG_DIR_ENV: &str = "SHELF_CONFIG_DIR";
const ENV_PREFIX: &str = "SHELF";

/// `.env` names used by existing deployments, mapped onto settings keys.
/// They only provide defaults; config files and `SHELF__*` variables win.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("POSTGRES_USER", "database.user"),
    ("POSTGRES_PASSWORD", "database.password"),
    ("PORT", "database.port"),
    ("DATABASE", "database.name"),
];

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .with_context(|| "unable to resolve current directory")?
                .join("config"),
        };

        let builder = with_legacy_defaults(config::Config::builder(), |var| {
            std::env::var(var).ok()
        })?
            .add_source(config::File::from(config_dir.join("base.toml")).required(false))
            .add_source(
                config::File::from(config_dir.join(format!("{}.toml", environment)))
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::from_builder(builder, &environment)
    }

    /// Build settings from an already layered source stack.
    pub fn from_builder(
        builder: ConfigBuilder<DefaultState>,
        environment: &str,
    ) -> anyhow::Result<Self> {
        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // Override environment field with parsed enum variant.
        settings.environment = Environment::parse(environment)?;

        Ok(settings)
    }
}

/// Seed `builder` with defaults taken from the legacy variable names.
fn with_legacy_defaults(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ConfigBuilder<DefaultState>> {
    for (var, key) in LEGACY_ENV_KEYS {
        if let Some(value) = lookup(var) {
            builder = builder
                .set_default(*key, value)
                .with_context(|| format!("invalid value for {}", var))?;
        }
    }
    Ok(builder)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }

    /// `host:port` string suitable for binding a listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "DatabaseSettings::default_host")]
    pub host: String,
    #[serde(default = "DatabaseSettings::default_port")]
    pub port: u16,
    #[serde(default = "DatabaseSettings::default_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "DatabaseSettings::default_name")]
    pub name: String,
    #[serde(default = "DatabaseSettings::default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "DatabaseSettings::default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
    /// Store author/publisher in the `price`/`company` columns.
    #[serde(default)]
    pub legacy_columns: bool,
}

impl DatabaseSettings {
    fn default_host() -> String {
        "localhost".to_string()
    }

    fn default_port() -> u16 {
        5432
    }

    fn default_user() -> String {
        "postgres".to_string()
    }

    fn default_name() -> String {
        "postgres".to_string()
    }

    fn default_max_connections() -> u32 {
        5
    }

    fn default_acquire_timeout_ms() -> u64 {
        5000
    }

    /// Connection endpoint without credentials, for logging.
    pub fn endpoint(&self) -> String {
        format!("postgres://{}:{}/{}", self.host, self.port, self.name)
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            user: Self::default_user(),
            password: String::new(),
            name: Self::default_name(),
            max_connections: Self::default_max_connections(),
            acquire_timeout_ms: Self::default_acquire_timeout_ms(),
            legacy_columns: false,
        }
    }
}

// Hand-written so the password never ends up in logs.
impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_ms", &self.acquire_timeout_ms)
            .field("legacy_columns", &self.legacy_columns)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn from_toml(toml: &str, environment: &str) -> anyhow::Result<Settings> {
        let builder = config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
        Settings::from_builder(builder, environment)
    }

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_server_listens_on_8080() {
        let settings = Settings::default();
        assert_eq!(settings.server.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn default_database_endpoint_is_localhost() {
        let settings = Settings::default();
        assert_eq!(settings.database.endpoint(), "postgres://localhost:5432/postgres");
        assert!(!settings.database.legacy_columns);
    }

    #[test]
    fn file_values_override_defaults() {
        let settings = from_toml(
            r#"
            [server]
            port = 9090

            [database]
            user = "books"
            password = "hunter2"
            name = "library"
            legacy_columns = true

            [telemetry]
            log_format = "json"
            "#,
            "staging",
        )
        .unwrap();

        assert_eq!(settings.environment, Environment::Staging);
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.database.user, "books");
        assert_eq!(settings.database.name, "library");
        assert_eq!(settings.database.max_connections, 5);
        assert!(settings.database.legacy_columns);
        assert_eq!(settings.telemetry.log_format, LogFormat::Json);
    }

    fn legacy_env(var: &str) -> Option<String> {
        let value = match var {
            "POSTGRES_USER" => "shelf",
            "POSTGRES_PASSWORD" => "hunter2",
            "PORT" => "6543",
            "DATABASE" => "books",
            _ => return None,
        };
        Some(value.to_string())
    }

    #[test]
    fn legacy_variables_fill_database_settings() {
        let builder = with_legacy_defaults(config::Config::builder(), legacy_env).unwrap();
        let settings = Settings::from_builder(builder, "local").unwrap();

        assert_eq!(settings.database.port, 6543);
        assert_eq!(settings.database.user, "shelf");
        assert_eq!(settings.database.password, "hunter2");
        assert_eq!(settings.database.name, "books");
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn config_file_overrides_legacy_variables() {
        let builder = with_legacy_defaults(config::Config::builder(), legacy_env)
            .unwrap()
            .add_source(File::from_str(
                r#"
                [database]
                port = 7000
                user = "library"
                "#,
                FileFormat::Toml,
            ));
        let settings = Settings::from_builder(builder, "local").unwrap();

        assert_eq!(settings.database.port, 7000);
        assert_eq!(settings.database.user, "library");
        assert_eq!(settings.database.name, "books");
    }

    #[test]
    fn missing_legacy_variables_leave_defaults() {
        let builder = with_legacy_defaults(config::Config::builder(), |_| None).unwrap();
        let settings = Settings::from_builder(builder, "local").unwrap();

        assert_eq!(settings.database.endpoint(), "postgres://localhost:5432/postgres");
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let err = from_toml("", "qa").unwrap_err();
        assert!(err.to_string().contains("unsupported environment 'qa'"));
    }

    #[test]
    fn debug_output_redacts_password() {
        let database = DatabaseSettings {
            password: "hunter2".to_string(),
            ..Default::default()
        };
        let rendered = format!("{:?}", database);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
