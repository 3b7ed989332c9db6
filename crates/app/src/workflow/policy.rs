use langai_llm::LanguageCode;
use langai_storage::MessageRecord;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SUMMARIZE_MIN_LENGTH: usize = 150;
pub const DEFAULT_SUMMARIZE_LANGUAGE: &str = "en";

/// When the presenter offers a summary for a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizePolicy {
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default = "default_language_filter")]
    pub language_filter: LanguageCode,
}

impl Default for SummarizePolicy {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            language_filter: default_language_filter(),
        }
    }
}

impl SummarizePolicy {
    /// Offered when the text is strictly longer than `min_length` characters and
    /// was detected as `language_filter`.
    pub fn offers(&self, record: &MessageRecord) -> bool {
        record.char_count() > self.min_length
            && record.detected_language.code() == Some(&self.language_filter)
    }
}

/// What to do with a completion that a newer invocation of the same operation
/// on the same record has superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleResultPolicy {
    /// Every completion lands; the last one to resolve wins.
    #[default]
    Apply,
    Discard,
}

fn default_min_length() -> usize {
    DEFAULT_SUMMARIZE_MIN_LENGTH
}

fn default_language_filter() -> LanguageCode {
    LanguageCode::parse(DEFAULT_SUMMARIZE_LANGUAGE).unwrap_or_else(|_| LanguageCode::default_target())
}
