use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::settings::RouterSettings;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("router unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("router rejected credentials (401)")]
    Unauthorized,

    #[error("router denied the request (403)")]
    Forbidden,

    #[error("router rejected request ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("malformed router response: {0}")]
    Malformed(String),
}

/// Thin HTTP client for a router's REST endpoint (`/rest`).
///
/// Every call authenticates with HTTP Basic credentials. There are no
/// retries and no imposed timeout; transient failures propagate to the
/// caller immediately.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
}

impl RestClient {
    pub fn new(settings: &RouterSettings) -> Result<Self, RouterError> {
        let scheme = if settings.use_tls { "https" } else { "http" };
        let base_url = format!("{scheme}://{}:{}/rest", settings.host, settings.port);

        let http = Client::builder()
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .build()?;

        Ok(Self {
            http,
            base_url,
            username: settings.username.clone(),
            password: settings.password.clone(),
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RouterError> {
        let body = self.send(Method::GET, path, None::<&()>).await?;
        parse_body(&body)
    }

    /// The router echoes the created record back on PUT.
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RouterError> {
        let text = self.send(Method::PUT, path, Some(body)).await?;
        parse_body(&text)
    }

    pub async fn patch<B: Serialize>(&self, path: &str, body: &B) -> Result<(), RouterError> {
        self.send(Method::PATCH, path, Some(body)).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<(), RouterError> {
        self.send(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<String, RouterError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%method, url = %url, "router request");

        let mut request = self
            .http
            .request(method, &url)
            .basic_auth(&self.username, Some(&self.password));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(status = status.as_u16(), "router response");

        match status {
            s if s.is_success() => Ok(text),
            StatusCode::UNAUTHORIZED => {
                warn!("router returned 401, check ROUTEROS_USERNAME/ROUTEROS_PASSWORD");
                Err(RouterError::Unauthorized)
            }
            StatusCode::FORBIDDEN => Err(RouterError::Forbidden),
            s => {
                let detail = error_detail(&text);
                warn!(status = s.as_u16(), detail = %detail, "router rejected request");
                Err(RouterError::Rejected {
                    status: s.as_u16(),
                    detail,
                })
            }
        }
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, RouterError> {
    serde_json::from_str(body).map_err(|e| RouterError::Malformed(e.to_string()))
}

/// Router error bodies look like `{"error":400,"message":"Bad Request","detail":"..."}`.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value
            .get("detail")
            .or_else(|| value.get("message"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        Err(_) => body.to_string(),
    }
}
