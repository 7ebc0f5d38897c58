use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use polyglot_core::DomainError;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::{
    blocks::{AckPayload, INPUT_ACTION_ID, LANGUAGE_BLOCK_ID, TEXT_BLOCK_ID},
    reacjilator::{ReacjiOutcome, Reacjilator},
    runner::ModalRunner,
    services::TranslationServices,
    web::SlackApiError,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    ReactionAdded(ReactionAddedEvent),
    Shortcut(ShortcutEvent),
    ViewSubmission(ViewSubmissionEvent),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::ReactionAdded(_) => SlackEventType::ReactionAdded,
            Self::Shortcut(_) => SlackEventType::Shortcut,
            Self::ViewSubmission(_) => SlackEventType::ViewSubmission,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    ReactionAdded,
    Shortcut,
    ViewSubmission,
    Unsupported,
}

/// `reaction_added` from the Events API. Reactions on files or file comments
/// carry no channel/ts pair, hence the options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReactionAddedEvent {
    pub item_type: String,
    pub channel_id: Option<String>,
    pub message_ts: Option<String>,
    pub reaction: String,
    pub user_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortcutEvent {
    pub callback_id: String,
    pub trigger_id: String,
    pub user_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewSubmissionEvent {
    pub view_id: String,
    pub callback_id: String,
    pub private_metadata: String,
    pub user_id: Option<String>,
    pub source_text: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Error)]
pub enum EnvelopeParseError {
    #[error("socket mode frame is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("socket mode frame has no envelope_id")]
    MissingEnvelopeId,
}

#[derive(Deserialize)]
struct RawEnvelope {
    envelope_id: Option<String>,
    #[serde(rename = "type")]
    envelope_type: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Deserialize)]
struct RawReactionAdded {
    reaction: String,
    user: Option<String>,
    item: RawReactionItem,
}

#[derive(Deserialize)]
struct RawReactionItem {
    #[serde(rename = "type")]
    item_type: String,
    channel: Option<String>,
    ts: Option<String>,
}

#[derive(Deserialize)]
struct RawUser {
    id: String,
}

#[derive(Deserialize)]
struct RawShortcut {
    callback_id: String,
    trigger_id: String,
    user: Option<RawUser>,
}

#[derive(Deserialize)]
struct RawViewSubmission {
    user: Option<RawUser>,
    view: RawView,
}

#[derive(Deserialize)]
struct RawView {
    id: String,
    #[serde(default)]
    callback_id: String,
    #[serde(default)]
    private_metadata: String,
    #[serde(default)]
    state: Value,
}

/// Parses a Socket Mode frame that carries an envelope. Control frames such as
/// `hello` and `disconnect` are handled by the transport before this point.
pub fn parse_envelope(raw: &str) -> Result<SlackEnvelope, EnvelopeParseError> {
    let raw: RawEnvelope = serde_json::from_str(raw)?;
    let envelope_id = raw.envelope_id.ok_or(EnvelopeParseError::MissingEnvelopeId)?;

    let event = match raw.envelope_type.as_str() {
        "events_api" => parse_events_api(raw.payload)?,
        "interactive" => parse_interactive(raw.payload)?,
        other => SlackEvent::Unsupported { event_type: other.to_owned() },
    };

    Ok(SlackEnvelope { envelope_id, event })
}

fn parse_events_api(payload: Value) -> Result<SlackEvent, EnvelopeParseError> {
    let event = payload.get("event").cloned().unwrap_or(Value::Null);
    let event_type = event.get("type").and_then(Value::as_str).unwrap_or("unknown").to_owned();

    if event_type != "reaction_added" {
        return Ok(SlackEvent::Unsupported { event_type });
    }

    let raw: RawReactionAdded = serde_json::from_value(event)?;
    Ok(SlackEvent::ReactionAdded(ReactionAddedEvent {
        item_type: raw.item.item_type,
        channel_id: raw.item.channel,
        message_ts: raw.item.ts,
        reaction: raw.reaction,
        user_id: raw.user,
    }))
}

fn parse_interactive(payload: Value) -> Result<SlackEvent, EnvelopeParseError> {
    let interaction_type =
        payload.get("type").and_then(Value::as_str).unwrap_or("unknown").to_owned();

    match interaction_type.as_str() {
        "shortcut" | "message_action" => {
            let raw: RawShortcut = serde_json::from_value(payload)?;
            Ok(SlackEvent::Shortcut(ShortcutEvent {
                callback_id: raw.callback_id,
                trigger_id: raw.trigger_id,
                user_id: raw.user.map(|user| user.id),
            }))
        }
        "view_submission" => {
            let raw: RawViewSubmission = serde_json::from_value(payload)?;
            let state = &raw.view.state;
            Ok(SlackEvent::ViewSubmission(ViewSubmissionEvent {
                view_id: raw.view.id,
                callback_id: raw.view.callback_id,
                private_metadata: raw.view.private_metadata,
                user_id: raw.user.map(|user| user.id),
                source_text: state_value(state, TEXT_BLOCK_ID, "value"),
                language: state_value(state, LANGUAGE_BLOCK_ID, "selected_option"),
            }))
        }
        _ => Ok(SlackEvent::Unsupported { event_type: interaction_type }),
    }
}

/// Reads `state.values.<block>.a.<field>`; a selected option yields its value.
fn state_value(state: &Value, block_id: &str, field: &str) -> Option<String> {
    let value = state.get("values")?.get(block_id)?.get(INPUT_ACTION_ID)?.get(field)?;
    let value = if field == "selected_option" { value.get("value")? } else { value };
    value.as_str().map(str::to_owned)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Processed,
    Ignored,
}

#[derive(Debug, Error)]
pub enum EventHandlerError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Slack(#[from] SlackApiError),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;

    /// Payload to send with the envelope acknowledgment. Runs before `handle`.
    fn acknowledgement(&self, _envelope: &SlackEnvelope) -> Option<AckPayload> {
        None
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub fn acknowledgement(&self, envelope: &SlackEnvelope) -> Option<AckPayload> {
        self.handlers.get(&envelope.event.event_type())?.acknowledgement(envelope)
    }

    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

pub fn translation_dispatcher(services: TranslationServices) -> EventDispatcher {
    let runner = ModalRunner::new(services.clone());
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(ReactionAddedHandler::new(Reacjilator::new(services)));
    dispatcher.register(ShortcutHandler::new(runner.clone()));
    dispatcher.register(ViewSubmissionHandler::new(runner));
    dispatcher
}

pub struct ReactionAddedHandler {
    reacjilator: Reacjilator,
}

impl ReactionAddedHandler {
    pub fn new(reacjilator: Reacjilator) -> Self {
        Self { reacjilator }
    }
}

#[async_trait]
impl EventHandler for ReactionAddedHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::ReactionAdded
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::ReactionAdded(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        Ok(match self.reacjilator.run(event, ctx).await {
            ReacjiOutcome::Posted { .. } => HandlerResult::Processed,
            ReacjiOutcome::Skipped(_) => HandlerResult::Ignored,
        })
    }
}

pub struct ShortcutHandler {
    runner: ModalRunner,
}

impl ShortcutHandler {
    pub fn new(runner: ModalRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl EventHandler for ShortcutHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::Shortcut
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::Shortcut(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        self.runner.open(event, ctx).await
    }
}

pub struct ViewSubmissionHandler {
    runner: ModalRunner,
}

impl ViewSubmissionHandler {
    pub fn new(runner: ModalRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl EventHandler for ViewSubmissionHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::ViewSubmission
    }

    fn acknowledgement(&self, envelope: &SlackEnvelope) -> Option<AckPayload> {
        let SlackEvent::ViewSubmission(event) = &envelope.event else {
            return None;
        };
        self.runner.acknowledgement(event)
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::ViewSubmission(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        self.runner.complete(event, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use polyglot_core::modal::RUN_TRANSLATION_CALLBACK_ID;
    use serde_json::json;

    use super::{
        parse_envelope, translation_dispatcher, EnvelopeParseError, EventContext, EventDispatcher,
        HandlerResult, ReactionAddedEvent, SlackEnvelope, SlackEvent, SlackEventType,
    };
    use crate::blocks::AckPayload;
    use crate::testing::{services, FakeSlack, FakeTranslator};

    fn frame(envelope_type: &str, payload: serde_json::Value) -> String {
        json!({"envelope_id": "env-1", "type": envelope_type, "payload": payload}).to_string()
    }

    #[test]
    fn parses_reaction_added_events() {
        let raw = frame(
            "events_api",
            json!({"event": {
                "type": "reaction_added",
                "user": "U1",
                "reaction": "flag-es",
                "item": {"type": "message", "channel": "C1", "ts": "1700000000.0001"}
            }}),
        );

        let envelope = parse_envelope(&raw).expect("parse");

        assert_eq!(envelope.envelope_id, "env-1");
        assert_eq!(
            envelope.event,
            SlackEvent::ReactionAdded(ReactionAddedEvent {
                item_type: "message".to_owned(),
                channel_id: Some("C1".to_owned()),
                message_ts: Some("1700000000.0001".to_owned()),
                reaction: "flag-es".to_owned(),
                user_id: Some("U1".to_owned()),
            })
        );
    }

    #[test]
    fn file_reactions_parse_without_channel_or_ts() {
        let raw = frame(
            "events_api",
            json!({"event": {
                "type": "reaction_added",
                "reaction": "jp",
                "item": {"type": "file", "file": "F1"}
            }}),
        );

        let SlackEvent::ReactionAdded(event) = parse_envelope(&raw).expect("parse").event else {
            panic!("expected reaction");
        };
        assert_eq!(event.item_type, "file");
        assert_eq!(event.channel_id, None);
        assert_eq!(event.message_ts, None);
    }

    #[test]
    fn parses_shortcuts_and_view_submissions() {
        let shortcut = frame(
            "interactive",
            json!({
                "type": "shortcut",
                "callback_id": "deepl-translation",
                "trigger_id": "T1",
                "user": {"id": "U1"}
            }),
        );
        let SlackEvent::Shortcut(event) = parse_envelope(&shortcut).expect("parse").event else {
            panic!("expected shortcut");
        };
        assert_eq!(event.callback_id, "deepl-translation");
        assert_eq!(event.trigger_id, "T1");

        let submission = frame(
            "interactive",
            json!({"type": "view_submission", "user": {"id": "U1"}, "view": {
                "id": "V1",
                "callback_id": RUN_TRANSLATION_CALLBACK_ID,
                "private_metadata": "meta",
                "state": {"values": {
                    "text": {"a": {"type": "plain_text_input", "value": "Hello"}},
                    "lang": {"a": {"type": "static_select", "selected_option": {"value": "ES"}}}
                }}
            }}),
        );
        let SlackEvent::ViewSubmission(event) = parse_envelope(&submission).expect("parse").event
        else {
            panic!("expected submission");
        };
        assert_eq!(event.view_id, "V1");
        assert_eq!(event.private_metadata, "meta");
        assert_eq!(event.source_text.as_deref(), Some("Hello"));
        assert_eq!(event.language.as_deref(), Some("ES"));
    }

    #[test]
    fn unselected_language_parses_as_none() {
        let submission = frame(
            "interactive",
            json!({"type": "view_submission", "view": {
                "id": "V1",
                "callback_id": RUN_TRANSLATION_CALLBACK_ID,
                "state": {"values": {
                    "text": {"a": {"type": "plain_text_input", "value": "Hello"}},
                    "lang": {"a": {"type": "static_select", "selected_option": null}}
                }}
            }}),
        );

        let SlackEvent::ViewSubmission(event) = parse_envelope(&submission).expect("parse").event
        else {
            panic!("expected submission");
        };
        assert_eq!(event.language, None);
    }

    #[test]
    fn other_frames_are_unsupported() {
        let message = frame("events_api", json!({"event": {"type": "message", "text": "hi"}}));
        assert_eq!(
            parse_envelope(&message).expect("parse").event,
            SlackEvent::Unsupported { event_type: "message".to_owned() }
        );

        let slash = frame("slash_commands", json!({"command": "/translate"}));
        assert_eq!(
            parse_envelope(&slash).expect("parse").event.event_type(),
            SlackEventType::Unsupported
        );
    }

    #[test]
    fn frames_without_envelope_id_are_rejected() {
        let error = parse_envelope(r#"{"type":"hello"}"#).expect_err("missing id");
        assert!(matches!(error, EnvelopeParseError::MissingEnvelopeId));
        assert!(matches!(parse_envelope("not json"), Err(EnvelopeParseError::Json(_))));
    }

    #[tokio::test]
    async fn dispatcher_returns_ignored_when_no_handler_registered() {
        let dispatcher = EventDispatcher::new();
        let envelope = SlackEnvelope {
            envelope_id: "env-2".to_owned(),
            event: SlackEvent::Unsupported { event_type: "app_mention".to_owned() },
        };

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Ignored);
        assert_eq!(dispatcher.acknowledgement(&envelope), None);
    }

    #[test]
    fn translation_dispatcher_registers_handlers() {
        let dispatcher =
            translation_dispatcher(services(FakeSlack::default(), FakeTranslator::default()));
        assert_eq!(dispatcher.handler_count(), 3);
    }

    #[tokio::test]
    async fn dispatcher_routes_reactions_to_the_reacjilator() {
        let slack = FakeSlack::with_thread(vec![("1.0", "Hello")]);
        let translator = FakeTranslator::returning(Some("Hola"));
        let dispatcher = translation_dispatcher(services(slack.clone(), translator));
        let envelope = SlackEnvelope {
            envelope_id: "env-3".to_owned(),
            event: SlackEvent::ReactionAdded(ReactionAddedEvent {
                item_type: "message".to_owned(),
                channel_id: Some("C1".to_owned()),
                message_ts: Some("1.0".to_owned()),
                reaction: "flag-es".to_owned(),
                user_id: Some("U1".to_owned()),
            }),
        };

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Processed);
        assert_eq!(slack.posts().await.len(), 1);
        assert_eq!(dispatcher.acknowledgement(&envelope), None);
    }

    #[test]
    fn view_submissions_acknowledge_with_the_loading_view() {
        let dispatcher =
            translation_dispatcher(services(FakeSlack::default(), FakeTranslator::default()));
        let envelope = SlackEnvelope {
            envelope_id: "env-4".to_owned(),
            event: SlackEvent::ViewSubmission(super::ViewSubmissionEvent {
                view_id: "V1".to_owned(),
                callback_id: RUN_TRANSLATION_CALLBACK_ID.to_owned(),
                private_metadata: String::new(),
                user_id: None,
                source_text: Some("Hello".to_owned()),
                language: Some("ES".to_owned()),
            }),
        };

        let Some(AckPayload::Update { view }) = dispatcher.acknowledgement(&envelope) else {
            panic!("expected update ack");
        };
        assert_eq!(view.callback_id, polyglot_core::modal::LOADING_CALLBACK_ID);
    }
}
