//! Configuration for the exporter daemon.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags (and their environment variables, e.g. `DRONE_URL`, `THREADS`)
//! 2. Environment variables prefixed with `DRONE_EXPORTER_`, sections split by `__`
//!    (e.g. `DRONE_EXPORTER_INFLUXDB__DATABASE`)
//! 3. YAML config file (`--config`, or `./config.yml` if it exists)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```yaml
//! exporter:
//!   threads: 4
//!   interval: 15          # minutes between cycles
//!   driver: influxdb
//! influxdb:
//!   address: http://localhost:8086
//!   database: drone
//!   username: admin       # optional
//!   password: secret      # optional
//! drone:
//!   url: https://drone.example.com
//!   token: "..."
//! repos:                  # optional allow-list, empty exports everything
//!   - octocat/hello-world
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use drone_exporter::store::{Driver, StoreSettings};
use drone_exporter::{CursorPolicy, ExporterOptions, FailurePolicy, ShortPagePolicy, SyncOptions};
use serde::Deserialize;
use thiserror::Error;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("missing required setting '{0}'")]
    Missing(&'static str),

    #[error("invalid value for '{key}': {message}")]
    Invalid { key: &'static str, message: String },
}

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub exporter: ExporterConfig,
    pub influxdb: InfluxDbConfig,
    pub drone: DroneConfig,
    /// Repository slugs to export. Empty exports every repository.
    pub repos: Vec<String>,
}

/// Scheduling and policy options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Repositories processed concurrently.
    pub threads: usize,
    /// Minutes between cycles.
    pub interval: u64,
    /// Store backend name.
    pub driver: String,
    /// `discard` or `keep`.
    pub short_page: String,
    /// `resync` or `skip`.
    pub cursor_policy: String,
    /// `abort` or `continue`.
    pub failure_policy: String,
    /// Deadline for each HTTP request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            interval: 15,
            driver: "influxdb".to_string(),
            short_page: "discard".to_string(),
            cursor_policy: "resync".to_string(),
            failure_policy: "abort".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// InfluxDB connection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InfluxDbConfig {
    pub address: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Drone server connection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DroneConfig {
    pub url: String,
    pub token: String,
    /// Proactive request rate limit. Unset disables limiting.
    pub requests_per_second: Option<u32>,
}

/// Values given on the command line, applied over every other source.
#[derive(Debug, Default)]
pub struct Overrides {
    pub threads: Option<usize>,
    pub interval: Option<u64>,
    pub driver: Option<String>,
    pub influxdb_address: Option<String>,
    pub influxdb_database: Option<String>,
    pub influxdb_username: Option<String>,
    pub influxdb_password: Option<String>,
    pub drone_url: Option<String>,
    pub drone_token: Option<String>,
}

impl Config {
    /// Load configuration from every source.
    ///
    /// An explicit `path` must exist; the default `./config.yml` is optional.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => Some((path.to_path_buf(), true)),
            None => {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                local.exists().then_some((local, false))
            }
        };

        let mut builder = ConfigBuilder::builder();

        if let Some((path, required)) = file {
            tracing::debug!("Loading config from {:?}", path);
            builder = builder.add_source(
                File::from(path)
                    .format(FileFormat::Yaml)
                    .required(required),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("DRONE_EXPORTER")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("repos")
                .try_parsing(true),
        );

        let builder = apply_overrides(builder, overrides)?;
        let config: Config = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Check that every required setting is present and parseable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.drone.url.trim().is_empty() {
            return Err(ConfigError::Missing("drone.url"));
        }
        if self.drone.token.trim().is_empty() {
            return Err(ConfigError::Missing("drone.token"));
        }
        if self.influxdb.address.trim().is_empty() {
            return Err(ConfigError::Missing("influxdb.address"));
        }
        if self.influxdb.database.trim().is_empty() {
            return Err(ConfigError::Missing("influxdb.database"));
        }
        if self.exporter.threads == 0 {
            return Err(ConfigError::Invalid {
                key: "exporter.threads",
                message: "must be at least 1".to_string(),
            });
        }
        self.driver()?;
        self.exporter_options()?;
        Ok(())
    }

    /// Selected store backend.
    pub fn driver(&self) -> Result<Driver, ConfigError> {
        self.exporter
            .driver
            .parse()
            .map_err(|e: drone_exporter::StoreError| ConfigError::Invalid {
                key: "exporter.driver",
                message: e.to_string(),
            })
    }

    /// Per-request deadline.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.exporter.request_timeout_secs.max(1))
    }

    /// Options for the exporter.
    pub fn exporter_options(&self) -> Result<ExporterOptions, ConfigError> {
        let short_page: ShortPagePolicy =
            self.exporter
                .short_page
                .parse()
                .map_err(|message| ConfigError::Invalid {
                    key: "exporter.short_page",
                    message,
                })?;
        let cursor_policy: CursorPolicy =
            self.exporter
                .cursor_policy
                .parse()
                .map_err(|message| ConfigError::Invalid {
                    key: "exporter.cursor_policy",
                    message,
                })?;
        let failure_policy: FailurePolicy =
            self.exporter
                .failure_policy
                .parse()
                .map_err(|message| ConfigError::Invalid {
                    key: "exporter.failure_policy",
                    message,
                })?;

        Ok(ExporterOptions {
            threads: self.exporter.threads.max(1),
            interval: Duration::from_secs(self.exporter.interval * 60),
            sync: SyncOptions {
                short_page,
                ..SyncOptions::default()
            },
            cursor_policy,
            failure_policy,
            repos: self.repos.clone(),
        })
    }

    /// Connection settings for the store.
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            address: self.influxdb.address.clone(),
            database: self.influxdb.database.clone(),
            username: self.influxdb.username.clone(),
            password: self.influxdb.password.clone(),
            source_address: self.drone.url.trim_end_matches('/').to_string(),
            timeout: self.request_timeout(),
        }
    }
}

fn apply_overrides<St: config::builder::BuilderState>(
    builder: config::builder::ConfigBuilder<St>,
    o: &Overrides,
) -> Result<config::builder::ConfigBuilder<St>, config::ConfigError> {
    Ok(builder
        .set_override_option("exporter.threads", o.threads.map(|v| v as i64))?
        .set_override_option("exporter.interval", o.interval.map(|v| v as i64))?
        .set_override_option("exporter.driver", o.driver.clone())?
        .set_override_option("influxdb.address", o.influxdb_address.clone())?
        .set_override_option("influxdb.database", o.influxdb_database.clone())?
        .set_override_option("influxdb.username", o.influxdb_username.clone())?
        .set_override_option("influxdb.password", o.influxdb_password.clone())?
        .set_override_option("drone.url", o.drone_url.clone())?
        .set_override_option("drone.token", o.drone_token.clone())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_yaml(yaml: &str, overrides: &Overrides) -> Config {
        let builder = ConfigBuilder::builder().add_source(File::from_str(yaml, FileFormat::Yaml));
        apply_overrides(builder, overrides)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    fn complete() -> &'static str {
        r#"
            influxdb:
              address: http://localhost:8086
              database: drone
            drone:
              url: https://drone.example.com/
              token: secret
        "#
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.exporter.threads, 4);
        assert_eq!(config.exporter.interval, 15);
        assert_eq!(config.exporter.driver, "influxdb");
        assert_eq!(config.exporter.request_timeout_secs, 30);
        assert!(config.repos.is_empty());
        assert!(config.drone.requests_per_second.is_none());
    }

    #[test]
    fn test_yaml_sections_and_defaults() {
        let config = from_yaml(
            r#"
                exporter:
                  threads: 8
                influxdb:
                  address: http://influx:8086
                  database: ci
                  username: admin
                  password: pw
                drone:
                  url: https://drone.example.com
                  token: abc
                repos:
                  - octocat/hello-world
                  - octocat/spoon-knife
            "#,
            &Overrides::default(),
        );

        assert_eq!(config.exporter.threads, 8);
        assert_eq!(config.exporter.interval, 15);
        assert_eq!(config.influxdb.username.as_deref(), Some("admin"));
        assert_eq!(config.repos.len(), 2);
        config.validate().unwrap();
    }

    #[test]
    fn test_flags_override_file() {
        let overrides = Overrides {
            threads: Some(2),
            interval: Some(1),
            drone_url: Some("https://ci.internal".to_string()),
            ..Default::default()
        };
        let config = from_yaml(complete(), &overrides);

        assert_eq!(config.exporter.threads, 2);
        assert_eq!(config.drone.url, "https://ci.internal");
        assert_eq!(config.drone.token, "secret");

        let options = config.exporter_options().unwrap();
        assert_eq!(options.interval, Duration::from_secs(60));
        assert_eq!(options.threads, 2);
    }

    #[test]
    fn test_missing_drone_token_is_rejected() {
        let config = from_yaml(
            r#"
                influxdb:
                  address: http://localhost:8086
                  database: drone
                drone:
                  url: https://drone.example.com
            "#,
            &Overrides::default(),
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("drone.token"))
        ));
    }

    #[test]
    fn test_unknown_driver_is_rejected() {
        let overrides = Overrides {
            driver: Some("prometheus".to_string()),
            ..Default::default()
        };
        let config = from_yaml(complete(), &overrides);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                key: "exporter.driver",
                ..
            })
        ));
    }

    #[test]
    fn test_policies_are_parsed() {
        let config = from_yaml(
            r#"
                exporter:
                  short_page: keep
                  cursor_policy: skip
                  failure_policy: continue
            "#,
            &Overrides::default(),
        );
        let options = config.exporter_options().unwrap();
        assert_eq!(options.sync.short_page, ShortPagePolicy::Keep);
        assert_eq!(options.cursor_policy, CursorPolicy::SkipRepository);
        assert_eq!(options.failure_policy, FailurePolicy::Continue);
        assert_eq!(options.sync.page_size, 25);
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        let config = from_yaml("exporter:\n  failure_policy: sometimes\n", &Overrides::default());
        assert!(matches!(
            config.exporter_options(),
            Err(ConfigError::Invalid {
                key: "exporter.failure_policy",
                ..
            })
        ));
    }

    #[test]
    fn test_store_settings_use_drone_url_as_source() {
        let config = from_yaml(complete(), &Overrides::default());
        let settings = config.store_settings();
        assert_eq!(settings.source_address, "https://drone.example.com");
        assert_eq!(settings.database, "drone");
        assert_eq!(settings.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let err = Config::load(
            Some(Path::new("/nonexistent/drone-exporter.yml")),
            &Overrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
