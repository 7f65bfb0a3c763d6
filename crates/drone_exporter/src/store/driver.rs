//! Backend registry.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use super::MetricsStore;
use super::errors::StoreError;
use crate::influxdb::InfluxDb;

/// Connection settings shared by every backend.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Store base URL, e.g. `http://localhost:8086`.
    pub address: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// CI server URL recorded in the `DroneAddress` tag. Cursor queries filter on it.
    pub source_address: String,
    /// Per-request deadline.
    pub timeout: StdDuration,
}

/// A metrics store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Driver {
    #[default]
    InfluxDb,
}

impl Driver {
    /// Name used in configuration.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InfluxDb => "influxdb",
        }
    }

    /// Build a store for this backend.
    pub fn connect(&self, settings: &StoreSettings) -> Result<Arc<dyn MetricsStore>, StoreError> {
        match self {
            Self::InfluxDb => Ok(Arc::new(InfluxDb::new(settings)?)),
        }
    }
}

impl FromStr for Driver {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "influxdb" | "influx" => Ok(Self::InfluxDb),
            _ => Err(StoreError::UnknownDriver(s.to_string())),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(address: &str) -> StoreSettings {
        StoreSettings {
            address: address.to_string(),
            database: "drone".to_string(),
            username: None,
            password: None,
            source_address: "https://drone.example.com".to_string(),
            timeout: StdDuration::from_secs(5),
        }
    }

    #[test]
    fn parses_known_driver_names() {
        assert_eq!("influxdb".parse::<Driver>().expect("parse"), Driver::InfluxDb);
        assert_eq!(" InfluxDB ".parse::<Driver>().expect("parse"), Driver::InfluxDb);
        assert_eq!(Driver::InfluxDb.to_string(), "influxdb");
    }

    #[test]
    fn rejects_unknown_driver() {
        let err = "prometheus".parse::<Driver>().expect_err("unknown");
        assert!(matches!(err, StoreError::UnknownDriver(name) if name == "prometheus"));
    }

    #[test]
    fn connect_builds_influx_store() {
        let store = Driver::InfluxDb.connect(&settings("http://localhost:8086"));
        assert!(store.is_ok());
    }

    #[test]
    fn connect_rejects_invalid_address() {
        let err = Driver::InfluxDb
            .connect(&settings("not a url"))
            .err()
            .expect("invalid address");
        assert!(matches!(err, StoreError::Config(_)));
    }
}
