use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use snafu::ensure;

use super::gateway::{GatewayError, GatewayResult, InvalidLanguageCodeSnafu};

/// Target languages offered to the user, in selector order.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("tr", "Turkish"),
    ("fr", "French"),
];

pub const DEFAULT_TARGET_LANGUAGE: &str = "es";

/// Lowercase BCP 47 style language code, e.g. `en` or `zh-hant`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn parse(raw: &str) -> GatewayResult<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        let mut subtags = normalized.split('-');
        let primary = subtags.next().unwrap_or_default();

        ensure!(
            (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic()),
            InvalidLanguageCodeSnafu {
                stage: "parse-language-code",
                raw: raw.to_string(),
            }
        );
        ensure!(
            subtags.all(|tag| !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric())),
            InvalidLanguageCodeSnafu {
                stage: "parse-language-subtag",
                raw: raw.to_string(),
            }
        );

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// English display name for codes in [`SUPPORTED_LANGUAGES`].
    pub fn display_name(&self) -> Option<&'static str> {
        SUPPORTED_LANGUAGES
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, name)| *name)
    }

    pub fn is_supported(&self) -> bool {
        self.display_name().is_some()
    }

    pub fn default_target() -> Self {
        Self(DEFAULT_TARGET_LANGUAGE.to_string())
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl FromStr for LanguageCode {
    type Err = GatewayError;

    fn from_str(raw: &str) -> GatewayResult<Self> {
        Self::parse(raw)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = GatewayError;

    fn try_from(value: String) -> GatewayResult<Self> {
        Self::parse(&value)
    }
}

impl From<LanguageCode> for String {
    fn from(value: LanguageCode) -> Self {
        value.0
    }
}

impl PartialEq<str> for LanguageCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for LanguageCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
