//! InfluxDB v1 HTTP client.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use url::Url;

use super::error::InfluxError;
use super::line_protocol::{encode_points, quote_ident, quote_literal};
use super::types::QueryResponse;
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpRequest, HttpTransport};
use crate::point::{BUILDS_MEASUREMENT, Point};
use crate::store::{self, MetricsStore, StoreSettings};

/// Upper bound on points sent in one write request.
pub const MAX_POINTS_PER_WRITE: usize = 500;

/// Timestamp precision for queries and writes.
const PRECISION: &str = "s";

/// Column alias of the cursor query.
const LAST_ID: &str = "last_id";

/// InfluxDB v1 store.
///
/// Credentials, when configured, are sent as HTTP basic auth.
#[derive(Clone)]
pub struct InfluxDb {
    transport: Arc<dyn HttpTransport>,
    address: Url,
    database: String,
    authorization: Option<String>,
    source_address: String,
}

impl InfluxDb {
    /// Create a store backed by reqwest.
    pub fn new(settings: &StoreSettings) -> Result<Self, InfluxError> {
        let transport = ReqwestTransport::with_timeout(settings.timeout)
            .map_err(|e| InfluxError::Config(e.to_string()))?;
        Self::new_with_transport(settings, Arc::new(transport))
    }

    pub fn new_with_transport(
        settings: &StoreSettings,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, InfluxError> {
        let address = Url::parse(settings.address.trim_end_matches('/')).map_err(|e| {
            InfluxError::Config(format!("invalid InfluxDB address {:?}: {}", settings.address, e))
        })?;
        if settings.database.is_empty() {
            return Err(InfluxError::Config("InfluxDB database is empty".to_string()));
        }

        let authorization = settings
            .username
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|u| basic_auth(u, settings.password.as_deref().unwrap_or_default()));

        Ok(Self {
            transport,
            address,
            database: settings.database.clone(),
            authorization,
            source_address: settings.source_address.clone(),
        })
    }

    /// Build `{address}/{endpoint}?db=..` plus `extra` pairs.
    fn endpoint(&self, endpoint: &str, extra: &[(&str, &str)]) -> String {
        let mut url = self.address.clone();
        let path = format!("{}/{}", url.path().trim_end_matches('/'), endpoint);
        url.set_path(&path);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            pairs.append_pair("db", &self.database);
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
        }
        url.to_string()
    }

    pub(crate) fn query_url(&self, query: &str) -> String {
        self.endpoint("query", &[("q", query), ("epoch", PRECISION)])
    }

    pub(crate) fn write_url(&self) -> String {
        self.endpoint("write", &[("precision", PRECISION)])
    }

    fn authorized(&self, request: HttpRequest) -> HttpRequest {
        match &self.authorization {
            Some(value) => request.with_header("Authorization", value.clone()),
            None => request,
        }
    }

    /// InfluxQL selecting the newest recorded build number of `slug`.
    #[must_use]
    pub fn last_build_query(&self, slug: &str) -> String {
        format!(
            "SELECT last(\"BuildId\") AS \"{}\" FROM {}.\"autogen\".\"{}\" WHERE \"Slug\"={} AND \"DroneAddress\"={}",
            LAST_ID,
            quote_ident(&self.database),
            BUILDS_MEASUREMENT,
            quote_literal(slug),
            quote_literal(&self.source_address),
        )
    }

    /// Run the cursor query.
    pub async fn query_last_build(&self, slug: &str) -> Result<Option<i64>, InfluxError> {
        let url = self.query_url(&self.last_build_query(slug));
        let response = self.transport.send(self.authorized(HttpRequest::get(url))).await?;

        if !response.is_success() {
            return Err(InfluxError::Status {
                status: response.status,
                message: response.body_text(),
            });
        }

        let parsed: QueryResponse = serde_json::from_slice(&response.body)?;
        parse_last_build(parsed)
    }

    /// Write points in chunks of at most [`MAX_POINTS_PER_WRITE`].
    pub async fn write(&self, points: &[Point]) -> Result<(), InfluxError> {
        let url = self.write_url();
        for chunk in points.chunks(MAX_POINTS_PER_WRITE) {
            let body = encode_points(chunk).into_bytes();
            let request = self.authorized(
                HttpRequest::post(url.clone(), body)
                    .with_header("Content-Type", "text/plain; charset=utf-8"),
            );
            let response = self.transport.send(request).await?;

            if !response.is_success() {
                return Err(InfluxError::Status {
                    status: response.status,
                    message: response.body_text(),
                });
            }
            tracing::debug!(points = chunk.len(), "wrote chunk to InfluxDB");
        }
        Ok(())
    }
}

fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

fn parse_last_build(response: QueryResponse) -> Result<Option<i64>, InfluxError> {
    if let Some(error) = response.error {
        return Err(InfluxError::Query(error));
    }
    let Some(result) = response.results.into_iter().next() else {
        return Ok(None);
    };
    if let Some(error) = result.error {
        return Err(InfluxError::Query(error));
    }
    let Some(series) = result.series.first() else {
        return Ok(None);
    };

    match series.first_value(LAST_ID) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| InfluxError::Query(format!("unexpected {} value {}", LAST_ID, n))),
        Some(Value::String(s)) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| InfluxError::Query(format!("unexpected {} value {:?}", LAST_ID, s))),
        Some(other) => Err(InfluxError::Query(format!(
            "unexpected {} value {}",
            LAST_ID, other
        ))),
    }
}

#[async_trait]
impl MetricsStore for InfluxDb {
    async fn last_build_number(&self, slug: &str) -> store::Result<Option<i64>> {
        Ok(self.query_last_build(slug).await?)
    }

    async fn batch(&self, points: &[Point]) -> store::Result<()> {
        Ok(self.write(points).await?)
    }
}
