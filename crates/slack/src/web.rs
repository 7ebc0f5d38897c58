use async_trait::async_trait;
use polyglot_core::{ThreadMessage, ThreadSnapshot};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::blocks::View;

/// Upper bound on `conversations.replies` pages read for one thread.
const MAX_REPLY_PAGES: usize = 10;
const REPLY_PAGE_SIZE: &str = "200";

#[derive(Debug, Error)]
pub enum SlackApiError {
    #[error("slack api request to {method} failed: {source}")]
    Transport {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("slack api {method} returned error `{error}`")]
    Api { method: &'static str, error: String },
    #[error("slack api {method} response could not be decoded: {source}")]
    Decode {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// The Slack Web API calls the bot makes.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// Root message first, then replies, oldest to newest.
    async fn fetch_thread_replies(
        &self,
        channel_id: &str,
        parent_ts: &str,
    ) -> Result<ThreadSnapshot, SlackApiError>;

    async fn post_thread_reply(
        &self,
        channel_id: &str,
        parent: &ThreadMessage,
        text: &str,
    ) -> Result<(), SlackApiError>;

    async fn open_view(&self, trigger_id: &str, view: &View) -> Result<(), SlackApiError>;

    async fn update_view(&self, view_id: &str, view: &View) -> Result<(), SlackApiError>;
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct RepliesResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Vec<ThreadMessage>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

pub struct SlackWebClient {
    http: Client,
    bot_token: SecretString,
    api_base_url: String,
}

impl SlackWebClient {
    pub fn new(http: Client, bot_token: SecretString, api_base_url: impl Into<String>) -> Self {
        let api_base_url = api_base_url.into().trim_end_matches('/').to_owned();
        Self { http, bot_token, api_base_url }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_base_url)
    }

    async fn post_json(&self, method: &'static str, body: Value) -> Result<(), SlackApiError> {
        let response = self
            .http
            .post(self.url(method))
            .bearer_auth(self.bot_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|source| SlackApiError::Transport { method, source })?;

        let payload: ApiResponse =
            response.json().await.map_err(|source| SlackApiError::Decode { method, source })?;
        if !payload.ok {
            return Err(SlackApiError::Api {
                method,
                error: payload.error.unwrap_or_else(|| "unknown_error".to_owned()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SlackApi for SlackWebClient {
    async fn fetch_thread_replies(
        &self,
        channel_id: &str,
        parent_ts: &str,
    ) -> Result<ThreadSnapshot, SlackApiError> {
        const METHOD: &str = "conversations.replies";

        let mut messages = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_REPLY_PAGES {
            let mut query = vec![
                ("channel", channel_id),
                ("ts", parent_ts),
                ("inclusive", "true"),
                ("limit", REPLY_PAGE_SIZE),
            ];
            if let Some(cursor) = cursor.as_deref() {
                query.push(("cursor", cursor));
            }

            let response = self
                .http
                .get(self.url(METHOD))
                .bearer_auth(self.bot_token.expose_secret())
                .query(&query)
                .send()
                .await
                .map_err(|source| SlackApiError::Transport { method: METHOD, source })?;

            let page: RepliesResponse = response
                .json()
                .await
                .map_err(|source| SlackApiError::Decode { method: METHOD, source })?;
            if !page.ok {
                return Err(SlackApiError::Api {
                    method: METHOD,
                    error: page.error.unwrap_or_else(|| "unknown_error".to_owned()),
                });
            }
            messages.extend(page.messages);

            cursor = page
                .response_metadata
                .and_then(|metadata| metadata.next_cursor)
                .filter(|cursor| !cursor.is_empty());
            if cursor.is_none() {
                break;
            }
        }

        debug!(
            event_name = "slack.thread.fetched",
            channel_id,
            thread_ts = parent_ts,
            message_count = messages.len(),
            "fetched thread replies"
        );
        Ok(ThreadSnapshot::new(messages))
    }

    async fn post_thread_reply(
        &self,
        channel_id: &str,
        parent: &ThreadMessage,
        text: &str,
    ) -> Result<(), SlackApiError> {
        self.post_json(
            "chat.postMessage",
            json!({
                "channel": channel_id,
                "thread_ts": parent.reply_anchor(),
                "text": text,
            }),
        )
        .await
    }

    async fn open_view(&self, trigger_id: &str, view: &View) -> Result<(), SlackApiError> {
        self.post_json("views.open", json!({ "trigger_id": trigger_id, "view": view })).await
    }

    async fn update_view(&self, view_id: &str, view: &View) -> Result<(), SlackApiError> {
        self.post_json("views.update", json!({ "view_id": view_id, "view": view })).await
    }
}
