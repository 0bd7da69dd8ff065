use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;

use churn_common::{CustomerRecord, PredictionResponse};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/predict_churn";

/// The three ways a submission can fail, each shown differently to the user.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not connect to {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server responded with HTTP {status}")]
    Server { status: u16, body: String },

    #[error("{0}")]
    Unexpected(String),
}

impl ClientError {
    fn from_transport(error: reqwest::Error, url: &str) -> Self {
        if error.is_connect() || error.is_timeout() {
            ClientError::Connection {
                url: url.to_string(),
                source: error,
            }
        } else {
            ClientError::Unexpected(error.to_string())
        }
    }

    /// Message shown to the person at the terminal.
    pub fn present(&self) -> String {
        match self {
            ClientError::Connection { url, .. } => format!(
                "Connection error: could not reach the prediction service at {url}. \
                 Make sure churn-server is running."
            ),
            ClientError::Server { status, body } => format!(
                "API error (HTTP {status}): the service could not process the request. \
                 Check the server logs.\n{}",
                pretty_body(body)
            ),
            ClientError::Unexpected(message) => {
                format!("An unexpected error occurred: {message}")
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            ClientError::Connection { .. } => 2,
            ClientError::Server { .. } => 3,
            ClientError::Unexpected(_) => 1,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(error: std::io::Error) -> Self {
        ClientError::Unexpected(error.to_string())
    }
}

fn pretty_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| body.to_string())
}

#[derive(Debug)]
pub struct ApiClient {
    client: Client,
    url: String,
}

impl ApiClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Unexpected(e.to_string()))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn predict(&self, record: &CustomerRecord) -> Result<PredictionResponse, ClientError> {
        let response = self
            .client
            .post(&self.url)
            .json(record)
            .send()
            .map_err(|e| ClientError::from_transport(e, &self.url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<PredictionResponse>()
            .map_err(|e| ClientError::Unexpected(format!("malformed response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presentations_are_distinct() {
        let server = ClientError::Server {
            status: 500,
            body: r#"{"success":false,"error":"scoring failed"}"#.to_string(),
        };
        let unexpected = ClientError::Unexpected("boom".to_string());

        assert!(server.present().starts_with("API error (HTTP 500)"));
        assert!(server.present().contains("\"error\": \"scoring failed\""));
        assert!(unexpected.present().starts_with("An unexpected error occurred"));
        assert_ne!(server.exit_code(), unexpected.exit_code());
    }

    #[test]
    fn non_json_bodies_are_shown_verbatim() {
        assert_eq!(pretty_body("Bad Gateway"), "Bad Gateway");
    }
}
