use std::sync::Arc;

use polyglot_core::{LanguageResolver, Translator};

use crate::web::SlackApi;

/// Collaborators shared by every workflow invocation. Built once at startup.
#[derive(Clone)]
pub struct TranslationServices {
    pub slack: Arc<dyn SlackApi>,
    pub translator: Arc<dyn Translator>,
    pub resolver: Arc<LanguageResolver>,
}

impl TranslationServices {
    pub fn new(
        slack: Arc<dyn SlackApi>,
        translator: Arc<dyn Translator>,
        resolver: LanguageResolver,
    ) -> Self {
        Self { slack, translator, resolver: Arc::new(resolver) }
    }
}
