//! Interactive translation dialog over Slack modals.
//!
//! The global shortcut opens the input view. A `run-translation` submission is
//! acknowledged with the loading view, then translated, then replaced with the
//! result view through `views.update`. A `new-runner` submission is
//! acknowledged with a fresh input view.

use polyglot_core::{
    transition, DomainError, ModalEvent, ModalStage, ModalView, TargetLanguage,
    TranslationRequest, ViewDelivery,
};
use tracing::{debug, info, warn};

use crate::blocks::{render_view, AckPayload, LANGUAGE_BLOCK_ID, TEXT_BLOCK_ID};
use crate::events::{
    EventContext, EventHandlerError, HandlerResult, ShortcutEvent, ViewSubmissionEvent,
};
use crate::services::TranslationServices;

pub const SHORTCUT_CALLBACK_ID: &str = "deepl-translation";

#[derive(Clone)]
pub struct ModalRunner {
    services: TranslationServices,
}

impl ModalRunner {
    pub fn new(services: TranslationServices) -> Self {
        Self { services }
    }

    pub async fn open(
        &self,
        shortcut: &ShortcutEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        if shortcut.callback_id != SHORTCUT_CALLBACK_ID {
            return Ok(HandlerResult::Ignored);
        }

        self.services
            .slack
            .open_view(&shortcut.trigger_id, &render_view(&ModalView::initial()))
            .await?;
        info!(
            event_name = "modal.opened",
            correlation_id = %ctx.correlation_id,
            user_id = shortcut.user_id.as_deref().unwrap_or("unknown"),
            "opened translation modal"
        );
        Ok(HandlerResult::Processed)
    }

    /// View to hand back inside the submission acknowledgment.
    pub fn acknowledgement(&self, submission: &ViewSubmissionEvent) -> Option<AckPayload> {
        let stage = ModalStage::from_callback_id(&submission.callback_id)?;
        let event = match stage {
            ModalStage::Input => match parse_submission(submission) {
                Ok((source_text, language)) => ModalEvent::Submitted { source_text, language },
                Err(error) => return Some(field_error(&error)),
            },
            ModalStage::Result => ModalEvent::NewRunnerRequested {
                private_metadata: submission.private_metadata.clone(),
            },
            ModalStage::Loading | ModalStage::NewRunner => return None,
        };

        let next = transition(stage, event)
            .ok()
            .filter(|next| next.delivery == ViewDelivery::Acknowledge)?;
        Some(AckPayload::Update { view: render_view(&next.next) })
    }

    /// Work left after the acknowledgment: translating and pushing the result.
    pub async fn complete(
        &self,
        submission: &ViewSubmissionEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        match ModalStage::from_callback_id(&submission.callback_id) {
            Some(ModalStage::Input) => {}
            Some(ModalStage::Result) => return Ok(HandlerResult::Processed),
            _ => return Ok(HandlerResult::Ignored),
        }

        let (source_text, language) = match parse_submission(submission) {
            Ok(parsed) => parsed,
            Err(error) if error.is_filtered_input() => {
                debug!(
                    event_name = "modal.submission_rejected",
                    correlation_id = %ctx.correlation_id,
                    view_id = %submission.view_id,
                    error = %error,
                    "translation submission was incomplete"
                );
                return Ok(HandlerResult::Ignored);
            }
            Err(error) => return Err(error.into()),
        };

        let request = TranslationRequest::new(source_text.clone(), language)?;
        let translated = self.services.translator.translate(&request).await;
        if translated.is_none() {
            warn!(
                event_name = "modal.translation_unavailable",
                correlation_id = %ctx.correlation_id,
                view_id = %submission.view_id,
                language = language.code(),
                "showing translation fallback"
            );
        }

        let next = transition(
            ModalStage::Loading,
            ModalEvent::TranslationFinished { language, source_text, translated },
        )
        .map_err(DomainError::from)?;
        self.services.slack.update_view(&submission.view_id, &render_view(&next.next)).await?;

        info!(
            event_name = "modal.result_shown",
            correlation_id = %ctx.correlation_id,
            view_id = %submission.view_id,
            language = language.code(),
            "updated modal with translation result"
        );
        Ok(HandlerResult::Processed)
    }
}

fn parse_submission(
    submission: &ViewSubmissionEvent,
) -> Result<(String, TargetLanguage), DomainError> {
    let source_text = submission
        .source_text
        .clone()
        .filter(|text| !text.trim().is_empty())
        .ok_or(DomainError::EmptySourceText)?;
    let language = submission
        .language
        .as_deref()
        .ok_or_else(|| DomainError::UnsupportedLanguage(String::new()))?
        .parse::<TargetLanguage>()?;
    Ok((source_text, language))
}

fn field_error(error: &DomainError) -> AckPayload {
    match error {
        DomainError::EmptySourceText => {
            AckPayload::field_error(TEXT_BLOCK_ID, "Enter some text to translate")
        }
        _ => AckPayload::field_error(LANGUAGE_BLOCK_ID, "Choose a target language"),
    }
}

#[cfg(test)]
mod tests {
    use polyglot_core::modal::{
        LOADING_CALLBACK_ID, NEW_RUNNER_CALLBACK_ID, RUN_TRANSLATION_CALLBACK_ID,
    };
    use polyglot_core::{TargetLanguage, TRANSLATION_FAILED_FALLBACK};

    use super::{ModalRunner, SHORTCUT_CALLBACK_ID};
    use crate::blocks::{AckPayload, LANGUAGE_BLOCK_ID, TEXT_BLOCK_ID};
    use crate::events::{EventContext, HandlerResult, ShortcutEvent, ViewSubmissionEvent};
    use crate::testing::{services, FakeSlack, FakeTranslator};

    fn submission(
        callback_id: &str,
        text: Option<&str>,
        language: Option<&str>,
    ) -> ViewSubmissionEvent {
        ViewSubmissionEvent {
            view_id: "V1".to_owned(),
            callback_id: callback_id.to_owned(),
            private_metadata: "C1".to_owned(),
            user_id: Some("U1".to_owned()),
            source_text: text.map(str::to_owned),
            language: language.map(str::to_owned),
        }
    }

    fn result_text(view: &crate::blocks::View) -> String {
        let rendered = serde_json::to_value(view).expect("serialize");
        rendered["blocks"][0]["text"]["text"].as_str().map(str::to_owned).unwrap_or_default()
    }

    #[tokio::test]
    async fn shortcut_opens_the_input_view() {
        let slack = FakeSlack::default();
        let runner = ModalRunner::new(services(slack.clone(), FakeTranslator::default()));
        let shortcut = ShortcutEvent {
            callback_id: SHORTCUT_CALLBACK_ID.to_owned(),
            trigger_id: "T1".to_owned(),
            user_id: None,
        };

        let result = runner.open(&shortcut, &EventContext::default()).await.expect("open");

        assert_eq!(result, HandlerResult::Processed);
        let opened = slack.opened().await;
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].0, "T1");
        assert_eq!(opened[0].1.callback_id, RUN_TRANSLATION_CALLBACK_ID);
    }

    #[tokio::test]
    async fn other_shortcuts_are_ignored() {
        let slack = FakeSlack::default();
        let runner = ModalRunner::new(services(slack.clone(), FakeTranslator::default()));
        let shortcut = ShortcutEvent {
            callback_id: "something-else".to_owned(),
            trigger_id: "T1".to_owned(),
            user_id: None,
        };

        let result = runner.open(&shortcut, &EventContext::default()).await.expect("open");

        assert_eq!(result, HandlerResult::Ignored);
        assert!(slack.opened().await.is_empty());
    }

    #[tokio::test]
    async fn submission_acks_loading_then_updates_to_result() {
        let slack = FakeSlack::default();
        let translator = FakeTranslator::returning(Some("Hola <!channel>"));
        let runner = ModalRunner::new(services(slack.clone(), translator.clone()));
        let event = submission(RUN_TRANSLATION_CALLBACK_ID, Some("Hello"), Some("ES"));

        let Some(AckPayload::Update { view }) = runner.acknowledgement(&event) else {
            panic!("expected loading view in ack");
        };
        assert_eq!(view.callback_id, LOADING_CALLBACK_ID);
        assert!(translator.requests().await.is_empty(), "ack is computed before translating");

        let result = runner.complete(&event, &EventContext::default()).await.expect("complete");

        assert_eq!(result, HandlerResult::Processed);
        let updated = slack.updated().await;
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].0, "V1");
        assert_eq!(updated[0].1.callback_id, NEW_RUNNER_CALLBACK_ID);
        assert_eq!(result_text(&updated[0].1), "Hola ");
        assert_eq!(translator.requests().await[0].language(), TargetLanguage::Spanish);
    }

    #[tokio::test]
    async fn failed_translation_shows_the_fallback() {
        let slack = FakeSlack::default();
        let runner = ModalRunner::new(services(slack.clone(), FakeTranslator::returning(None)));
        let event = submission(RUN_TRANSLATION_CALLBACK_ID, Some("Hello"), Some("DE"));

        runner.complete(&event, &EventContext::default()).await.expect("complete");

        let updated = slack.updated().await;
        assert_eq!(result_text(&updated[0].1), TRANSLATION_FAILED_FALLBACK);
    }

    #[tokio::test]
    async fn duplicate_submissions_are_each_translated() {
        let slack = FakeSlack::default();
        let translator = FakeTranslator::scripted(vec![Some("Hola"), Some("Hola")]);
        let runner = ModalRunner::new(services(slack.clone(), translator.clone()));
        let event = submission(RUN_TRANSLATION_CALLBACK_ID, Some("Hello"), Some("ES"));

        for _ in 0..2 {
            assert!(runner.acknowledgement(&event).is_some());
            runner.complete(&event, &EventContext::default()).await.expect("complete");
        }

        assert_eq!(translator.requests().await.len(), 2);
        assert_eq!(slack.updated().await.len(), 2);
    }

    #[tokio::test]
    async fn new_runner_submission_acks_a_fresh_input_view() {
        let slack = FakeSlack::default();
        let translator = FakeTranslator::default();
        let runner = ModalRunner::new(services(slack.clone(), translator.clone()));
        let event = submission(NEW_RUNNER_CALLBACK_ID, None, None);

        let Some(AckPayload::Update { view }) = runner.acknowledgement(&event) else {
            panic!("expected new runner view");
        };
        assert_eq!(view.callback_id, RUN_TRANSLATION_CALLBACK_ID);
        assert_eq!(view.private_metadata, "C1");

        let result = runner.complete(&event, &EventContext::default()).await.expect("complete");
        assert_eq!(result, HandlerResult::Processed);
        assert!(translator.requests().await.is_empty());
        assert!(slack.updated().await.is_empty());
    }

    #[tokio::test]
    async fn incomplete_submissions_ack_with_field_errors() {
        let slack = FakeSlack::default();
        let translator = FakeTranslator::returning(Some("Hola"));
        let runner = ModalRunner::new(services(slack.clone(), translator.clone()));

        let missing_language = submission(RUN_TRANSLATION_CALLBACK_ID, Some("Hello"), None);
        let Some(AckPayload::Errors { errors }) = runner.acknowledgement(&missing_language) else {
            panic!("expected field errors");
        };
        assert!(errors.contains_key(LANGUAGE_BLOCK_ID));

        let blank_text = submission(RUN_TRANSLATION_CALLBACK_ID, Some("  "), Some("ES"));
        let Some(AckPayload::Errors { errors }) = runner.acknowledgement(&blank_text) else {
            panic!("expected field errors");
        };
        assert!(errors.contains_key(TEXT_BLOCK_ID));

        let result =
            runner.complete(&missing_language, &EventContext::default()).await.expect("complete");
        assert_eq!(result, HandlerResult::Ignored);
        assert!(translator.requests().await.is_empty());
    }

    #[tokio::test]
    async fn update_failures_are_reported_to_the_dispatcher() {
        let slack = FakeSlack::default();
        slack.fail_updates().await;
        let runner = ModalRunner::new(services(slack, FakeTranslator::returning(Some("Hola"))));
        let event = submission(RUN_TRANSLATION_CALLBACK_ID, Some("Hello"), Some("ES"));

        let error =
            runner.complete(&event, &EventContext::default()).await.expect_err("update fails");
        assert!(error.to_string().contains("views.update"));
    }

    #[test]
    fn unknown_callback_ids_get_a_plain_ack() {
        let runner = ModalRunner::new(services(FakeSlack::default(), FakeTranslator::default()));
        let event = submission("someone-elses-modal", Some("Hello"), Some("ES"));
        assert_eq!(runner.acknowledgement(&event), None);
    }
}
