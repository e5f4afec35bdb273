//! Statement submission to the ClickHouse HTTP interface.

use std::time::Duration;
use thiserror::Error;

/// Longest backend response kept in an error message
pub const MAX_ERROR_BODY: usize = 200;

/// Marker ClickHouse puts in the body of failed queries
const EXCEPTION_MARKER: &str = "Exception";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("{0}")]
    Backend(String),
}

/// Sends one SQL statement per call.
pub trait Transport {
    fn submit(&mut self, sql: &str) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn submit(&mut self, sql: &str) -> Result<(), TransportError> {
        (**self).submit(sql)
    }
}

/// Cut a response body to [`MAX_ERROR_BODY`] characters.
pub fn truncate_body(body: &str) -> String {
    body.trim().chars().take(MAX_ERROR_BODY).collect()
}

/// Classify an HTTP response: non-2xx statuses and bodies carrying an
/// exception are failures.
pub fn check_response(status: u16, body: &str) -> Result<(), TransportError> {
    if !(200..300).contains(&status) {
        return Err(TransportError::Status {
            status,
            body: truncate_body(body),
        });
    }
    if body.contains(EXCEPTION_MARKER) {
        return Err(TransportError::Backend(truncate_body(body)));
    }
    Ok(())
}

/// Connection settings for [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub timeout: Duration,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            database: None,
            user: None,
            password: None,
        }
    }
}

/// Blocking HTTP transport. Each statement is POSTed as the request body to
/// `<url>/`.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    endpoint: String,
    params: Vec<(&'static str, String)>,
}

impl HttpTransport {
    pub fn new(url: &str, options: &HttpOptions) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .build()?;

        let mut params = Vec::new();
        if let Some(db) = &options.database {
            params.push(("database", db.clone()));
        }
        if let Some(user) = &options.user {
            params.push(("user", user.clone()));
        }
        if let Some(password) = &options.password {
            params.push(("password", password.clone()));
        }

        Ok(Self {
            client,
            endpoint: format!("{}/", url.trim_end_matches('/')),
            params,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    fn submit(&mut self, sql: &str) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&self.params)
            .body(sql.to_string())
            .send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        check_response(status, &body)
    }
}
