use langai_llm::LanguageCode;

use super::ids::{MessageIndex, RequestSeq};

pub const DETECTING_LABEL: &str = "Detecting...";
pub const DETECTION_ERROR_LABEL: &str = "Error detecting language";

/// Outcome of the one detect step each message gets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DetectedLanguage {
    #[default]
    Pending,
    Detected(LanguageCode),
    Failed,
}

impl DetectedLanguage {
    pub fn code(&self) -> Option<&LanguageCode> {
        match self {
            Self::Detected(code) => Some(code),
            Self::Pending | Self::Failed => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Pending => DETECTING_LABEL,
            Self::Detected(code) => code.as_str(),
            Self::Failed => DETECTION_ERROR_LABEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub index: MessageIndex,
    pub text: String,
    pub detected_language: DetectedLanguage,
    pub target_language: LanguageCode,
    pub translation: Option<String>,
    pub summary: Option<String>,
    pub error: Option<String>,
}

impl MessageRecord {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// True when the detected language already is the target language.
    pub fn targets_own_language(&self) -> bool {
        self.detected_language.code() == Some(&self.target_language)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub text: String,
    pub target_language: LanguageCode,
}

impl NewMessage {
    pub fn new(text: impl Into<String>, target_language: LanguageCode) -> Self {
        Self {
            text: text.into(),
            target_language,
        }
    }
}

/// Field-level update applied to one record as a single step.
///
/// `None` leaves a field untouched; `error: Some(None)` clears the error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessagePatch {
    pub detected_language: Option<DetectedLanguage>,
    pub target_language: Option<LanguageCode>,
    pub translation: Option<String>,
    pub summary: Option<String>,
    pub error: Option<Option<String>>,
}

impl MessagePatch {
    pub fn detected(language: DetectedLanguage) -> Self {
        Self {
            detected_language: Some(language),
            ..Self::default()
        }
    }

    pub fn target(language: LanguageCode) -> Self {
        Self {
            target_language: Some(language),
            ..Self::default()
        }
    }

    pub fn translation(text: impl Into<String>) -> Self {
        Self {
            translation: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn summary(text: impl Into<String>) -> Self {
        Self {
            summary: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(Some(message.into())),
            ..Self::default()
        }
    }

    pub fn clear_error() -> Self {
        Self {
            error: Some(None),
            ..Self::default()
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(Some(message.into()));
        self
    }

    pub(crate) fn apply_to(self, record: &mut MessageRecord) {
        if let Some(language) = self.detected_language {
            record.detected_language = language;
        }
        if let Some(language) = self.target_language {
            record.target_language = language;
        }
        if let Some(translation) = self.translation {
            record.translation = Some(translation);
        }
        if let Some(summary) = self.summary {
            record.summary = Some(summary);
        }
        if let Some(error) = self.error {
            record.error = error;
        }
    }
}

/// Operations that may be re-triggered on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Translate,
    Summarize,
}

/// Issued when a translate/summarize starts; identifies that invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    pub index: MessageIndex,
    pub operation: Operation,
    pub seq: RequestSeq,
}
