//! Interactive translation dialog.
//!
//! The dialog is a small state machine over four views. Transitions are pure:
//! `transition` decides the next view and how it must be delivered, and the
//! Slack adapter does the sending.
//!
//! ```text
//! Input/NewRunner --Submitted--> Loading      (sent inside the submission ack)
//! Loading --TranslationFinished--> Result     (sent as a follow-up views.update)
//! Result --NewRunnerRequested--> NewRunner    (sent inside the submission ack)
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::language::TargetLanguage;
use crate::sanitize::sanitize;
use crate::translate::TRANSLATION_FAILED_FALLBACK;

pub const RUN_TRANSLATION_CALLBACK_ID: &str = "run-translation";
pub const LOADING_CALLBACK_ID: &str = "translation-loading";
pub const NEW_RUNNER_CALLBACK_ID: &str = "new-runner";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModalView {
    Input { private_metadata: String },
    Loading { language: TargetLanguage, source_text: String },
    Result { language: TargetLanguage, source_text: String, translated_text: String },
    NewRunner { private_metadata: String },
}

impl ModalView {
    pub fn initial() -> Self {
        Self::Input { private_metadata: String::new() }
    }

    pub fn stage(&self) -> ModalStage {
        match self {
            Self::Input { .. } => ModalStage::Input,
            Self::Loading { .. } => ModalStage::Loading,
            Self::Result { .. } => ModalStage::Result,
            Self::NewRunner { .. } => ModalStage::NewRunner,
        }
    }

    pub fn callback_id(&self) -> &'static str {
        self.stage().callback_id()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModalStage {
    Input,
    Loading,
    Result,
    NewRunner,
}

impl ModalStage {
    pub fn callback_id(&self) -> &'static str {
        match self {
            Self::Input | Self::NewRunner => RUN_TRANSLATION_CALLBACK_ID,
            Self::Loading => LOADING_CALLBACK_ID,
            Self::Result => NEW_RUNNER_CALLBACK_ID,
        }
    }

    /// A fresh runner renders exactly like the input view, so submissions from
    /// either come back as `Input`.
    pub fn from_callback_id(callback_id: &str) -> Option<Self> {
        match callback_id {
            RUN_TRANSLATION_CALLBACK_ID => Some(Self::Input),
            LOADING_CALLBACK_ID => Some(Self::Loading),
            NEW_RUNNER_CALLBACK_ID => Some(Self::Result),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModalEvent {
    Submitted { source_text: String, language: TargetLanguage },
    TranslationFinished {
        language: TargetLanguage,
        source_text: String,
        translated: Option<String>,
    },
    NewRunnerRequested { private_metadata: String },
}

impl ModalEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submitted { .. } => "submitted",
            Self::TranslationFinished { .. } => "translation_finished",
            Self::NewRunnerRequested { .. } => "new_runner_requested",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewDelivery {
    /// Returned as `response_action: update` in the submission acknowledgment.
    Acknowledge,
    /// Pushed afterwards with a `views.update` call.
    Update,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModalTransition {
    pub from: ModalStage,
    pub next: ModalView,
    pub delivery: ViewDelivery,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ModalTransitionError {
    #[error("invalid modal transition from {stage:?} using event {event}")]
    InvalidTransition { stage: ModalStage, event: &'static str },
}

pub fn transition(
    current: ModalStage,
    event: ModalEvent,
) -> Result<ModalTransition, ModalTransitionError> {
    use ModalEvent::{NewRunnerRequested, Submitted, TranslationFinished};

    let (next, delivery) = match (current, event) {
        (ModalStage::Input | ModalStage::NewRunner, Submitted { source_text, language }) => {
            (ModalView::Loading { language, source_text }, ViewDelivery::Acknowledge)
        }
        (ModalStage::Loading, TranslationFinished { language, source_text, translated }) => {
            let translated_text = translated
                .as_deref()
                .map(sanitize)
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| TRANSLATION_FAILED_FALLBACK.to_owned());
            (ModalView::Result { language, source_text, translated_text }, ViewDelivery::Update)
        }
        (ModalStage::Result, NewRunnerRequested { private_metadata }) => {
            (ModalView::NewRunner { private_metadata }, ViewDelivery::Acknowledge)
        }
        (stage, event) => {
            return Err(ModalTransitionError::InvalidTransition { stage, event: event.name() })
        }
    };

    Ok(ModalTransition { from: current, next, delivery })
}
