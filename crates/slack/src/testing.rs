//! In-memory fakes for the Slack and translation collaborators.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use polyglot_core::{
    LanguageResolver, ThreadMessage, ThreadSnapshot, TranslationRequest, Translator,
};
use tokio::sync::Mutex;

use crate::blocks::View;
use crate::services::TranslationServices;
use crate::web::{SlackApi, SlackApiError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedPost {
    pub channel_id: String,
    pub thread_ts: String,
    pub text: String,
}

#[derive(Default)]
struct SlackState {
    thread: ThreadSnapshot,
    fail_fetch: bool,
    fail_update: bool,
    fetches: usize,
    posts: Vec<RecordedPost>,
    opened: Vec<(String, View)>,
    updated: Vec<(String, View)>,
}

#[derive(Clone, Default)]
pub struct FakeSlack {
    state: Arc<Mutex<SlackState>>,
}

impl FakeSlack {
    /// Thread of `(ts, text)` pairs; the first pair is the root.
    pub fn with_thread(messages: Vec<(&str, &str)>) -> Self {
        let messages = messages
            .into_iter()
            .map(|(ts, text)| ThreadMessage {
                ts: ts.to_owned(),
                text: Some(text.to_owned()),
                ..ThreadMessage::default()
            })
            .collect();
        Self::with_snapshot(ThreadSnapshot::new(messages))
    }

    pub fn with_snapshot(thread: ThreadSnapshot) -> Self {
        let slack = Self::default();
        slack.state.try_lock().expect("fresh fake is unlocked").thread = thread;
        slack
    }

    pub async fn fail_fetches(&self) {
        self.state.lock().await.fail_fetch = true;
    }

    pub async fn fail_updates(&self) {
        self.state.lock().await.fail_update = true;
    }

    pub async fn fetches(&self) -> usize {
        self.state.lock().await.fetches
    }

    pub async fn posts(&self) -> Vec<RecordedPost> {
        self.state.lock().await.posts.clone()
    }

    pub async fn opened(&self) -> Vec<(String, View)> {
        self.state.lock().await.opened.clone()
    }

    pub async fn updated(&self) -> Vec<(String, View)> {
        self.state.lock().await.updated.clone()
    }
}

#[async_trait]
impl SlackApi for FakeSlack {
    async fn fetch_thread_replies(
        &self,
        _channel_id: &str,
        _parent_ts: &str,
    ) -> Result<ThreadSnapshot, SlackApiError> {
        let mut state = self.state.lock().await;
        state.fetches += 1;
        if state.fail_fetch {
            return Err(SlackApiError::Api {
                method: "conversations.replies",
                error: "channel_not_found".to_owned(),
            });
        }
        Ok(state.thread.clone())
    }

    async fn post_thread_reply(
        &self,
        channel_id: &str,
        parent: &ThreadMessage,
        text: &str,
    ) -> Result<(), SlackApiError> {
        let mut state = self.state.lock().await;
        let post = RecordedPost {
            channel_id: channel_id.to_owned(),
            thread_ts: parent.reply_anchor().to_owned(),
            text: text.to_owned(),
        };
        state.posts.push(post);
        state.thread.messages.push(ThreadMessage {
            ts: format!("{}.reply", parent.ts),
            thread_ts: Some(parent.reply_anchor().to_owned()),
            text: Some(text.to_owned()),
            ..ThreadMessage::default()
        });
        Ok(())
    }

    async fn open_view(&self, trigger_id: &str, view: &View) -> Result<(), SlackApiError> {
        self.state.lock().await.opened.push((trigger_id.to_owned(), view.clone()));
        Ok(())
    }

    async fn update_view(&self, view_id: &str, view: &View) -> Result<(), SlackApiError> {
        let mut state = self.state.lock().await;
        if state.fail_update {
            return Err(SlackApiError::Api {
                method: "views.update",
                error: "not_found".to_owned(),
            });
        }
        state.updated.push((view_id.to_owned(), view.clone()));
        Ok(())
    }
}

#[derive(Default)]
struct TranslatorState {
    responses: VecDeque<Option<String>>,
    fallback: Option<String>,
    requests: Vec<TranslationRequest>,
}

#[derive(Clone, Default)]
pub struct FakeTranslator {
    state: Arc<Mutex<TranslatorState>>,
}

impl FakeTranslator {
    /// Answers every request with `response`.
    pub fn returning(response: Option<&str>) -> Self {
        let translator = Self::default();
        translator.state.try_lock().expect("fresh fake is unlocked").fallback =
            response.map(str::to_owned);
        translator
    }

    /// Answers requests with `responses` in order, then with `None`.
    pub fn scripted(responses: Vec<Option<&str>>) -> Self {
        let translator = Self::default();
        translator.state.try_lock().expect("fresh fake is unlocked").responses =
            responses.into_iter().map(|response| response.map(str::to_owned)).collect();
        translator
    }

    pub async fn requests(&self) -> Vec<TranslationRequest> {
        self.state.lock().await.requests.clone()
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, request: &TranslationRequest) -> Option<String> {
        let mut state = self.state.lock().await;
        state.requests.push(request.clone());
        match state.responses.pop_front() {
            Some(response) => response,
            None => state.fallback.clone(),
        }
    }
}

pub fn services(slack: FakeSlack, translator: FakeTranslator) -> TranslationServices {
    TranslationServices::new(Arc::new(slack), Arc::new(translator), LanguageResolver::default())
}
