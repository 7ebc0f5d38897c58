use std::collections::HashMap;

use crate::language::TargetLanguage;

/// Reaction names that trigger a translation, keyed by the normalized emoji name.
const DEFAULT_REACJI: &[(&str, TargetLanguage)] = &[
    ("flag-bg", TargetLanguage::Bulgarian),
    ("flag-cz", TargetLanguage::Czech),
    ("flag-dk", TargetLanguage::Danish),
    ("de", TargetLanguage::German),
    ("flag-de", TargetLanguage::German),
    ("flag-at", TargetLanguage::German),
    ("flag-ch", TargetLanguage::German),
    ("flag-gr", TargetLanguage::Greek),
    ("flag-cy", TargetLanguage::Greek),
    ("gb", TargetLanguage::EnglishBritish),
    ("uk", TargetLanguage::EnglishBritish),
    ("flag-gb", TargetLanguage::EnglishBritish),
    ("flag-england", TargetLanguage::EnglishBritish),
    ("flag-scotland", TargetLanguage::EnglishBritish),
    ("flag-wales", TargetLanguage::EnglishBritish),
    ("flag-ie", TargetLanguage::EnglishBritish),
    ("flag-au", TargetLanguage::EnglishBritish),
    ("flag-nz", TargetLanguage::EnglishBritish),
    ("us", TargetLanguage::EnglishAmerican),
    ("flag-us", TargetLanguage::EnglishAmerican),
    ("flag-ca", TargetLanguage::EnglishAmerican),
    ("flag-um", TargetLanguage::EnglishAmerican),
    ("es", TargetLanguage::Spanish),
    ("flag-es", TargetLanguage::Spanish),
    ("flag-mx", TargetLanguage::Spanish),
    ("flag-ar", TargetLanguage::Spanish),
    ("flag-co", TargetLanguage::Spanish),
    ("flag-cl", TargetLanguage::Spanish),
    ("flag-pe", TargetLanguage::Spanish),
    ("flag-ee", TargetLanguage::Estonian),
    ("flag-fi", TargetLanguage::Finnish),
    ("fr", TargetLanguage::French),
    ("flag-fr", TargetLanguage::French),
    ("flag-be", TargetLanguage::French),
    ("flag-hu", TargetLanguage::Hungarian),
    ("flag-id", TargetLanguage::Indonesian),
    ("it", TargetLanguage::Italian),
    ("flag-it", TargetLanguage::Italian),
    ("jp", TargetLanguage::Japanese),
    ("flag-jp", TargetLanguage::Japanese),
    ("kr", TargetLanguage::Korean),
    ("flag-kr", TargetLanguage::Korean),
    ("flag-lt", TargetLanguage::Lithuanian),
    ("flag-lv", TargetLanguage::Latvian),
    ("flag-no", TargetLanguage::Norwegian),
    ("flag-nl", TargetLanguage::Dutch),
    ("flag-pl", TargetLanguage::Polish),
    ("flag-br", TargetLanguage::PortugueseBrazilian),
    ("flag-pt", TargetLanguage::PortugueseEuropean),
    ("flag-ro", TargetLanguage::Romanian),
    ("ru", TargetLanguage::Russian),
    ("flag-ru", TargetLanguage::Russian),
    ("flag-sk", TargetLanguage::Slovak),
    ("flag-si", TargetLanguage::Slovenian),
    ("flag-se", TargetLanguage::Swedish),
    ("flag-tr", TargetLanguage::Turkish),
    ("flag-ua", TargetLanguage::Ukrainian),
    ("cn", TargetLanguage::Chinese),
    ("flag-cn", TargetLanguage::Chinese),
    ("flag-tw", TargetLanguage::Chinese),
    ("flag-hk", TargetLanguage::Chinese),
    ("flag-sg", TargetLanguage::Chinese),
];

/// Maps reaction emoji names to the language a message should be translated into.
#[derive(Clone, Debug)]
pub struct LanguageResolver {
    table: HashMap<String, TargetLanguage>,
}

impl Default for LanguageResolver {
    fn default() -> Self {
        Self {
            table: DEFAULT_REACJI
                .iter()
                .map(|(emoji, language)| ((*emoji).to_owned(), *language))
                .collect(),
        }
    }
}

impl LanguageResolver {
    pub fn with_mapping(mut self, emoji: &str, language: TargetLanguage) -> Self {
        self.table.insert(normalize_reaction_token(emoji), language);
        self
    }

    pub fn resolve(&self, reaction: &str) -> Option<TargetLanguage> {
        self.table.get(&normalize_reaction_token(reaction)).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

fn normalize_reaction_token(reaction: &str) -> String {
    let trimmed = reaction.trim().trim_matches(':');
    let without_skin_tone = match trimmed.split_once("::skin-tone-") {
        Some((name, _)) => name,
        None => trimmed,
    };
    without_skin_tone.to_ascii_lowercase()
}
