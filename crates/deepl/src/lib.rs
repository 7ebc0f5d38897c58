//! DeepL translation client
//!
//! Implements `polyglot_core::Translator` on top of the DeepL REST API
//! (`POST /v2/translate`). One request per call, no retries. Any failure is
//! logged and reported to the caller as "translation unavailable".
//!
//! `GET /v2/usage` is exposed for health checks; it does not consume quota.

use std::time::Duration;

use async_trait::async_trait;
use polyglot_core::config::DeepLConfig;
use polyglot_core::{TranslationRequest, Translator};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

const PRO_API_BASE: &str = "https://api.deepl.com";
const FREE_API_BASE: &str = "https://api-free.deepl.com";
const FREE_KEY_SUFFIX: &str = ":fx";

#[derive(Debug, Error)]
pub enum DeepLError {
    #[error("could not build deepl http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("deepl request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("deepl responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("deepl response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("deepl response contained no translations")]
    EmptyResponse,
}

impl DeepLError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::Status { status, .. } if status.as_u16() == 456)
    }
}

/// Characters translated in the current billing period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Usage {
    pub character_count: u64,
    pub character_limit: u64,
}

impl Usage {
    pub fn is_exhausted(&self) -> bool {
        self.character_limit > 0 && self.character_count >= self.character_limit
    }
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
    #[serde(default)]
    detected_source_language: Option<String>,
}

pub struct DeepLClient {
    http: Client,
    auth_key: SecretString,
    base_url: String,
    endpoint: String,
}

impl DeepLClient {
    pub fn new(config: &DeepLConfig) -> Result<Self, DeepLError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(DeepLError::Client)?;
        let base_url =
            api_base_url(config.auth_key.expose_secret(), config.api_base_url.as_deref());

        let base_url = base_url.trim_end_matches('/').to_owned();

        Ok(Self {
            http,
            auth_key: config.auth_key.clone(),
            endpoint: format!("{base_url}/v2/translate"),
            base_url,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorization(&self) -> String {
        format!("DeepL-Auth-Key {}", self.auth_key.expose_secret())
    }

    pub async fn usage(&self) -> Result<Usage, DeepLError> {
        let response = self
            .http
            .get(format!("{}/v2/usage", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .send()
            .await
            .map_err(DeepLError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeepLError::Status { status, body });
        }
        response.json().await.map_err(DeepLError::Decode)
    }

    pub async fn try_translate(&self, request: &TranslationRequest) -> Result<String, DeepLError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .form(&[("text", request.text()), ("target_lang", request.language().code())])
            .send()
            .await
            .map_err(DeepLError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeepLError::Status { status, body });
        }

        let payload: TranslateResponse = response.json().await.map_err(DeepLError::Decode)?;
        let translation = payload.translations.into_iter().next().ok_or(DeepLError::EmptyResponse)?;
        debug!(
            event_name = "translate.deepl.completed",
            target_lang = request.language().code(),
            detected_source_language =
                translation.detected_source_language.as_deref().unwrap_or("unknown"),
            "deepl translation completed"
        );
        Ok(translation.text)
    }
}

#[async_trait]
impl Translator for DeepLClient {
    async fn translate(&self, request: &TranslationRequest) -> Option<String> {
        match self.try_translate(request).await {
            Ok(text) => Some(text),
            Err(error) => {
                warn!(
                    event_name = "translate.deepl.failed",
                    target_lang = request.language().code(),
                    quota_exceeded = error.is_quota_exceeded(),
                    error = %error,
                    "deepl translation unavailable"
                );
                None
            }
        }
    }
}

/// Free-plan keys carry a `:fx` suffix and live on a separate host.
fn api_base_url<'a>(auth_key: &str, configured: Option<&'a str>) -> &'a str {
    match configured {
        Some(base_url) => base_url,
        None if auth_key.ends_with(FREE_KEY_SUFFIX) => FREE_API_BASE,
        None => PRO_API_BASE,
    }
}
