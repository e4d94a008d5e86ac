//! HTTP implementation of the Remote Save Gateway.
//!
//! `POST <base_url><endpoint>` with the candidate as JSON body. A 2xx response must carry a
//! `SaveResponse`; anything else is a transport failure.

use cyimport_domain::{GatewayError, SaveGateway};
use cyimport_types::candidate::ImportCandidate;
use cyimport_types::wire::SaveResponse;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("cyimport/", env!("CARGO_PKG_VERSION"));

/// Longest response body kept in a `Status` error.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Bearer token sent as `Authorization`.
    pub token: Option<String>,
}

impl HttpGatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            token: None,
        }
    }
}

/// Save gateway over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSaveGateway {
    http_client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpSaveGateway {
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Transport {
                message: e.to_string(),
            })?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    pub fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }
}

impl SaveGateway for HttpSaveGateway {
    async fn save(
        &self,
        endpoint: &str,
        candidate: &ImportCandidate,
    ) -> Result<SaveResponse, GatewayError> {
        let url = self.url_for(endpoint);
        debug!(url = %url, "posting candidate");

        let mut request = self.http_client.post(&url).json(candidate.as_value());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| GatewayError::Transport {
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| GatewayError::Transport {
            message: e.to_string(),
        })?;
        let parsed: SaveResponse =
            serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode {
                message: e.to_string(),
            })?;

        debug!(
            url = %url,
            success = parsed.success,
            errors = parsed.errors.len(),
            "gateway answered"
        );
        Ok(parsed)
    }
}
