use thiserror::Error;

use crate::modal::ModalTransitionError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("translation source text must not be empty")]
    EmptySourceText,
    #[error("unsupported target language `{0}`")]
    UnsupportedLanguage(String),
    #[error(transparent)]
    ModalTransition(#[from] ModalTransitionError),
}

impl DomainError {
    /// Filtered input never reaches the chat surface; these errors only end up in logs.
    pub fn is_filtered_input(&self) -> bool {
        matches!(self, Self::EmptySourceText | Self::UnsupportedLanguage(_))
    }
}
