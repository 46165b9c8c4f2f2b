//! HTTP Compilation Service client
//!
//! Every operation is a JSON `POST {base_url}/{endpoint}`. A non-success status
//! becomes [`ClientError::Status`], carrying the service's `{"error": ...}`
//! message when the body has one.

use crate::config::ServiceConfig;
use crate::error::{ClientError, Result};
use crate::service::CompilationService;
use crate::wire::*;
use async_trait::async_trait;
use pipec_core::{AstNode, GeneratedCode, Source, Token, TypeError};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Compilation Service reached over HTTP
pub struct HttpCompilationService {
    /// HTTP client for making requests
    client: Client,

    /// Base URL without trailing slash
    base_url: String,

    /// Optional API key for authentication
    api_key: Option<String>,
}

impl HttpCompilationService {
    /// Create a client with default settings for `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::from_config(&ServiceConfig::new(base_url))
    }

    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an http(s) URL or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|e| {
            ClientError::InvalidConfiguration(format!("invalid base URL '{}': {}", base_url, e))
        })?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidConfiguration(format!(
                "base URL must use http or https: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                ClientError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!("POST {}", url);

        let mut request = self.client.post(&url).json(body);
        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(endpoint, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::from_reqwest(endpoint, e))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => body.error,
                Err(_) if text.trim().is_empty() => status
                    .canonical_reason()
                    .unwrap_or("no response body")
                    .to_string(),
                Err(_) => text,
            };
            tracing::warn!("{} returned {}: {}", endpoint, status, message);
            return Err(ClientError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| ClientError::InvalidResponse {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl CompilationService for HttpCompilationService {
    async fn tokenize(&self, source: &Source) -> Result<Vec<Token>> {
        let resp: TokenizeResponse = self
            .post(
                "tokenize",
                &TokenizeRequest {
                    source: source.as_str(),
                },
            )
            .await?;
        Ok(resp.tokens)
    }

    async fn parse(&self, tokens: &[Token]) -> Result<Vec<AstNode>> {
        let resp: ParseResponse = self.post("parse", &ParseRequest { tokens }).await?;
        Ok(resp.ast)
    }

    async fn typecheck(&self, ast: &[AstNode]) -> Result<Vec<TypeError>> {
        let resp: TypeCheckResponse = self.post("typecheck", &AstRequest { ast }).await?;
        Ok(resp.errors)
    }

    async fn generate(&self, ast: &[AstNode]) -> Result<GeneratedCode> {
        let resp: GenerateResponse = self.post("generate", &AstRequest { ast }).await?;
        Ok(resp.nasm_code)
    }

    fn name(&self) -> &str {
        "http"
    }
}
