use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::DomainError;

/// Target languages accepted by the translation provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetLanguage {
    Bulgarian,
    Czech,
    Danish,
    German,
    Greek,
    EnglishBritish,
    EnglishAmerican,
    Spanish,
    Estonian,
    Finnish,
    French,
    Hungarian,
    Indonesian,
    Italian,
    Japanese,
    Korean,
    Lithuanian,
    Latvian,
    Norwegian,
    Dutch,
    Polish,
    PortugueseBrazilian,
    PortugueseEuropean,
    Romanian,
    Russian,
    Slovak,
    Slovenian,
    Swedish,
    Turkish,
    Ukrainian,
    Chinese,
}

impl TargetLanguage {
    /// Selector order for the modal's language dropdown.
    pub const ALL: [TargetLanguage; 31] = [
        Self::EnglishAmerican,
        Self::EnglishBritish,
        Self::Japanese,
        Self::Chinese,
        Self::Korean,
        Self::German,
        Self::French,
        Self::Spanish,
        Self::Italian,
        Self::PortugueseBrazilian,
        Self::PortugueseEuropean,
        Self::Dutch,
        Self::Polish,
        Self::Russian,
        Self::Ukrainian,
        Self::Bulgarian,
        Self::Czech,
        Self::Danish,
        Self::Greek,
        Self::Estonian,
        Self::Finnish,
        Self::Hungarian,
        Self::Indonesian,
        Self::Lithuanian,
        Self::Latvian,
        Self::Norwegian,
        Self::Romanian,
        Self::Slovak,
        Self::Slovenian,
        Self::Swedish,
        Self::Turkish,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Bulgarian => "BG",
            Self::Czech => "CS",
            Self::Danish => "DA",
            Self::German => "DE",
            Self::Greek => "EL",
            Self::EnglishBritish => "EN-GB",
            Self::EnglishAmerican => "EN-US",
            Self::Spanish => "ES",
            Self::Estonian => "ET",
            Self::Finnish => "FI",
            Self::French => "FR",
            Self::Hungarian => "HU",
            Self::Indonesian => "ID",
            Self::Italian => "IT",
            Self::Japanese => "JA",
            Self::Korean => "KO",
            Self::Lithuanian => "LT",
            Self::Latvian => "LV",
            Self::Norwegian => "NB",
            Self::Dutch => "NL",
            Self::Polish => "PL",
            Self::PortugueseBrazilian => "PT-BR",
            Self::PortugueseEuropean => "PT-PT",
            Self::Romanian => "RO",
            Self::Russian => "RU",
            Self::Slovak => "SK",
            Self::Slovenian => "SL",
            Self::Swedish => "SV",
            Self::Turkish => "TR",
            Self::Ukrainian => "UK",
            Self::Chinese => "ZH",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Bulgarian => "Bulgarian",
            Self::Czech => "Czech",
            Self::Danish => "Danish",
            Self::German => "German",
            Self::Greek => "Greek",
            Self::EnglishBritish => "English (British)",
            Self::EnglishAmerican => "English (American)",
            Self::Spanish => "Spanish",
            Self::Estonian => "Estonian",
            Self::Finnish => "Finnish",
            Self::French => "French",
            Self::Hungarian => "Hungarian",
            Self::Indonesian => "Indonesian",
            Self::Italian => "Italian",
            Self::Japanese => "Japanese",
            Self::Korean => "Korean",
            Self::Lithuanian => "Lithuanian",
            Self::Latvian => "Latvian",
            Self::Norwegian => "Norwegian (Bokmål)",
            Self::Dutch => "Dutch",
            Self::Polish => "Polish",
            Self::PortugueseBrazilian => "Portuguese (Brazilian)",
            Self::PortugueseEuropean => "Portuguese (European)",
            Self::Romanian => "Romanian",
            Self::Russian => "Russian",
            Self::Slovak => "Slovak",
            Self::Slovenian => "Slovenian",
            Self::Swedish => "Swedish",
            Self::Turkish => "Turkish",
            Self::Ukrainian => "Ukrainian",
            Self::Chinese => "Chinese (simplified)",
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TargetLanguage {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().replace('_', "-").to_ascii_uppercase();
        // Bare codes the provider deprecated for targets.
        let canonical = match normalized.as_str() {
            "EN" => "EN-US",
            "PT" => "PT-BR",
            other => other,
        };

        Self::ALL
            .into_iter()
            .find(|language| language.code() == canonical)
            .ok_or_else(|| DomainError::UnsupportedLanguage(value.trim().to_owned()))
    }
}

impl Serialize for TargetLanguage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for TargetLanguage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
