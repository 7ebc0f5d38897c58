//! Polyglot Core - translation domain shared by every adapter
//!
//! Apart from loading configuration, nothing in this crate performs I/O. Slack
//! and DeepL adapters live in their own crates and plug in through the
//! `Translator` trait and the plain data types defined here.

pub mod config;
pub mod errors;
pub mod language;
pub mod modal;
pub mod reacji;
pub mod sanitize;
pub mod thread;
pub mod translate;

pub use errors::DomainError;
pub use language::TargetLanguage;
pub use modal::{
    transition, ModalEvent, ModalStage, ModalTransition, ModalTransitionError, ModalView,
    ViewDelivery,
};
pub use reacji::LanguageResolver;
pub use sanitize::{sanitize, sanitize_optional};
pub use thread::{is_already_posted, ThreadMessage, ThreadSnapshot};
pub use translate::{TranslationRequest, Translator, TRANSLATION_FAILED_FALLBACK};
