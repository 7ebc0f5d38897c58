use async_trait::async_trait;

use crate::errors::DomainError;
use crate::language::TargetLanguage;

/// Shown in the dialog result when the provider gave nothing back.
pub const TRANSLATION_FAILED_FALLBACK: &str = ":x: Failed to translate it for some reason";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslationRequest {
    text: String,
    language: TargetLanguage,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, language: TargetLanguage) -> Result<Self, DomainError> {
        let text = text.into();
        if text.is_empty() {
            return Err(DomainError::EmptySourceText);
        }
        Ok(Self { text, language })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn language(&self) -> TargetLanguage {
        self.language
    }
}

/// A remote translation call. `None` means the translation is unavailable;
/// implementations swallow provider failures and never retry.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, request: &TranslationRequest) -> Option<String>;
}
