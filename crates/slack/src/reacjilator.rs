//! Reaction-triggered translation.
//!
//! A flag reaction on a message posts the message's translation as a thread
//! reply. Every stop condition is silent: the workflow logs and returns a
//! `ReacjiOutcome::Skipped` instead of surfacing anything to the channel.

use polyglot_core::{is_already_posted, sanitize, TargetLanguage, TranslationRequest};
use tracing::{debug, info, warn};

use crate::events::{EventContext, ReactionAddedEvent};
use crate::services::TranslationServices;

const MESSAGE_ITEM_TYPE: &str = "message";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReacjiOutcome {
    Posted { channel_id: String, thread_ts: String, language: TargetLanguage },
    Skipped(SkipReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    NotAMessage,
    UnknownReaction,
    ThreadUnavailable,
    EmptyRootMessage,
    TranslationUnavailable,
    AlreadyPosted,
    PostFailed,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAMessage => "not_a_message",
            Self::UnknownReaction => "unknown_reaction",
            Self::ThreadUnavailable => "thread_unavailable",
            Self::EmptyRootMessage => "empty_root_message",
            Self::TranslationUnavailable => "translation_unavailable",
            Self::AlreadyPosted => "already_posted",
            Self::PostFailed => "post_failed",
        }
    }
}

pub struct Reacjilator {
    services: TranslationServices,
}

impl Reacjilator {
    pub fn new(services: TranslationServices) -> Self {
        Self { services }
    }

    pub async fn run(&self, event: &ReactionAddedEvent, ctx: &EventContext) -> ReacjiOutcome {
        let outcome = self.translate_reaction(event, ctx).await;
        if let ReacjiOutcome::Skipped(reason) = &outcome {
            debug!(
                event_name = "reacji.skipped",
                correlation_id = %ctx.correlation_id,
                reaction = %event.reaction,
                reason = reason.as_str(),
                "reaction did not produce a translation"
            );
        }
        outcome
    }

    async fn translate_reaction(
        &self,
        event: &ReactionAddedEvent,
        ctx: &EventContext,
    ) -> ReacjiOutcome {
        let (Some(channel_id), Some(message_ts)) = (
            event.channel_id.as_deref().filter(|channel| !channel.is_empty()),
            event.message_ts.as_deref().filter(|ts| !ts.is_empty()),
        ) else {
            return ReacjiOutcome::Skipped(SkipReason::NotAMessage);
        };
        if event.item_type != MESSAGE_ITEM_TYPE {
            return ReacjiOutcome::Skipped(SkipReason::NotAMessage);
        }

        let Some(language) = self.services.resolver.resolve(&event.reaction) else {
            return ReacjiOutcome::Skipped(SkipReason::UnknownReaction);
        };

        let thread = match self.services.slack.fetch_thread_replies(channel_id, message_ts).await {
            Ok(thread) => thread,
            Err(error) => {
                warn!(
                    event_name = "reacji.thread_fetch_failed",
                    correlation_id = %ctx.correlation_id,
                    channel_id,
                    thread_ts = message_ts,
                    error = %error,
                    "could not fetch thread for reaction"
                );
                return ReacjiOutcome::Skipped(SkipReason::ThreadUnavailable);
            }
        };
        let Some(root) = thread.root() else {
            return ReacjiOutcome::Skipped(SkipReason::ThreadUnavailable);
        };
        let Some(root_text) = root.non_empty_text() else {
            return ReacjiOutcome::Skipped(SkipReason::EmptyRootMessage);
        };

        let Ok(request) = TranslationRequest::new(root_text, language) else {
            return ReacjiOutcome::Skipped(SkipReason::EmptyRootMessage);
        };
        let Some(translated) = self.services.translator.translate(&request).await else {
            return ReacjiOutcome::Skipped(SkipReason::TranslationUnavailable);
        };

        let translated = sanitize(&translated);
        if translated.is_empty() {
            return ReacjiOutcome::Skipped(SkipReason::TranslationUnavailable);
        }
        if is_already_posted(&thread, &translated) {
            return ReacjiOutcome::Skipped(SkipReason::AlreadyPosted);
        }

        let thread_ts = root.reply_anchor().to_owned();
        if let Err(error) =
            self.services.slack.post_thread_reply(channel_id, root, &translated).await
        {
            warn!(
                event_name = "reacji.post_failed",
                correlation_id = %ctx.correlation_id,
                channel_id,
                thread_ts = %thread_ts,
                language = language.code(),
                error = %error,
                "could not post translation reply"
            );
            return ReacjiOutcome::Skipped(SkipReason::PostFailed);
        }

        info!(
            event_name = "reacji.posted",
            correlation_id = %ctx.correlation_id,
            channel_id,
            thread_ts = %thread_ts,
            language = language.code(),
            "posted translation reply"
        );
        ReacjiOutcome::Posted { channel_id: channel_id.to_owned(), thread_ts, language }
    }
}
