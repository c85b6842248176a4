//! Column-store connection handle.
//!
//! The core issues a small, fixed set of operations (create, insert,
//! truncate, optimize, exists-check, view-create); [`SqlExecutor`] is that
//! boundary. The HTTP implementation talks to ClickHouse's HTTP interface.
//! The handle is passed explicitly to the table manager and view
//! orchestrator — there is no ambient connection singleton.

use async_trait::async_trait;
use log::debug;

use super::error::SinkError;
use crate::loglake::config::DatabaseConfig;

/// Executes statements against the column store.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Run a statement with no interesting result (DDL, TRUNCATE, OPTIMIZE).
    async fn command(&self, sql: &str) -> Result<(), SinkError>;

    /// Run an INSERT whose data travels in the request body.
    async fn insert(&self, sql: &str, body: String) -> Result<(), SinkError>;

    /// Run a statement returning a single scalar (e.g. an exists-check).
    async fn query_scalar(&self, sql: &str) -> Result<String, SinkError>;
}

/// ClickHouse client over the HTTP interface.
#[derive(Debug, Clone)]
pub struct ClickHouseHttpClient {
    url: String,
    user: String,
    password: String,
    http: reqwest::Client,
}

impl ClickHouseHttpClient {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            url: format!("http://{}:{}/", config.host, config.port),
            user: config.user.clone(),
            password: config.password.clone(),
            http: reqwest::Client::new(),
        }
    }

    /// POST to the server; the statement travels either as the body or, for
    /// inserts, as the `query` parameter with the data as the body.
    async fn post(&self, query_param: Option<&str>, body: String) -> Result<String, SinkError> {
        let mut request = self
            .http
            .post(&self.url)
            .basic_auth(&self.user, Some(&self.password))
            .body(body);
        if let Some(query) = query_param {
            request = request.query(&[("query", query)]);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(SinkError::Server {
                status: status.as_u16(),
                message: text.trim().to_string(),
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl SqlExecutor for ClickHouseHttpClient {
    async fn command(&self, sql: &str) -> Result<(), SinkError> {
        debug!("executing: {}", sql);
        self.post(None, sql.to_string()).await.map(|_| ())
    }

    async fn insert(&self, sql: &str, body: String) -> Result<(), SinkError> {
        debug!("executing insert: {}", sql);
        self.post(Some(sql), body).await.map(|_| ())
    }

    async fn query_scalar(&self, sql: &str) -> Result<String, SinkError> {
        debug!("executing query: {}", sql);
        self.post(None, sql.to_string())
            .await
            .map(|text| text.trim().to_string())
    }
}
