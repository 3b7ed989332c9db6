use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use snafu::Snafu;

use super::language::LanguageCode;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
pub type GatewayResult<T> = Result<T, GatewayError>;

/// One of the three delegated capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Detection,
    Translation,
    Summarization,
}

impl fmt::Display for Capability {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Detection => "language detection",
            Self::Translation => "translation",
            Self::Summarization => "summarization",
        };
        formatter.write_str(name)
    }
}

/// Readiness reported by a capability before it is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Readily,
    /// Usable after a one-time download/readiness step the gateway awaits itself.
    AfterDownload,
    No,
}

impl Availability {
    pub fn is_available(self) -> bool {
        !matches!(self, Self::No)
    }
}

/// Opaque translator created for one language pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TranslatorHandle {
    id: u64,
    from: LanguageCode,
    to: LanguageCode,
}

impl TranslatorHandle {
    pub fn new(id: u64, from: LanguageCode, to: LanguageCode) -> Self {
        Self { id, from, to }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn from_language(&self) -> &LanguageCode {
        &self.from
    }

    pub fn to_language(&self) -> &LanguageCode {
        &self.to
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryKind {
    #[default]
    KeyPoints,
    Tldr,
    Teaser,
    Headline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryFormat {
    #[default]
    Markdown,
    PlainText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

pub const DEFAULT_SUMMARY_CONTEXT: &str = "This is an output field summary.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeOptions {
    #[serde(default)]
    pub kind: SummaryKind,
    #[serde(default)]
    pub format: SummaryFormat,
    #[serde(default)]
    pub length: SummaryLength,
    #[serde(default)]
    pub context: Option<String>,
}

impl Default for SummarizeOptions {
    fn default() -> Self {
        Self {
            kind: SummaryKind::default(),
            format: SummaryFormat::default(),
            length: SummaryLength::default(),
            context: Some(DEFAULT_SUMMARY_CONTEXT.to_string()),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum GatewayError {
    #[snafu(display("{capability} capability is unavailable"))]
    Unavailable {
        stage: &'static str,
        capability: Capability,
    },
    #[snafu(display("translation from '{from}' to '{to}' is not supported"))]
    Unsupported {
        stage: &'static str,
        from: LanguageCode,
        to: LanguageCode,
    },
    #[snafu(display("language detection failed: {details}"))]
    DetectionFailed {
        stage: &'static str,
        details: String,
    },
    #[snafu(display("translation failed: {details}"))]
    TranslationFailed {
        stage: &'static str,
        details: String,
    },
    #[snafu(display("summarization failed: {details}"))]
    SummarizationFailed {
        stage: &'static str,
        details: String,
    },
    #[snafu(display("'{raw}' is not a valid language code"))]
    InvalidLanguageCode { stage: &'static str, raw: String },
    #[snafu(display("provider '{provider_id}' is not supported"))]
    UnsupportedProvider {
        stage: &'static str,
        provider_id: String,
    },
    #[snafu(display("http client failed on `{stage}`, {source}"))]
    HttpClient {
        stage: &'static str,
        source: rig::http_client::Error,
    },
    #[snafu(display("completions failed on `{stage}`, {source}"))]
    CompletionsFailed {
        stage: &'static str,
        source: rig::completion::CompletionError,
    },
}

/// Detection, translation and summarization as seen by the workflow.
///
/// Implementations own model management and any one-time download; callers only
/// check availability and await the returned futures.
pub trait CapabilityGateway: Send + Sync {
    fn name(&self) -> &str;

    fn detection_availability(&self) -> BoxFuture<'_, GatewayResult<Availability>>;
    /// Awaits the detector's one-time readiness step.
    fn prepare_detector(&self) -> BoxFuture<'_, GatewayResult<()>>;
    fn detect<'a>(&'a self, text: &'a str) -> BoxFuture<'a, GatewayResult<LanguageCode>>;

    fn translation_supported<'a>(
        &'a self,
        from: &'a LanguageCode,
        to: &'a LanguageCode,
    ) -> BoxFuture<'a, GatewayResult<bool>>;
    fn create_translator<'a>(
        &'a self,
        from: &'a LanguageCode,
        to: &'a LanguageCode,
    ) -> BoxFuture<'a, GatewayResult<Option<TranslatorHandle>>>;
    fn translate<'a>(
        &'a self,
        handle: &'a TranslatorHandle,
        text: &'a str,
    ) -> BoxFuture<'a, GatewayResult<String>>;

    fn summarization_availability(&self) -> BoxFuture<'_, GatewayResult<Availability>>;
    fn summarize<'a>(
        &'a self,
        text: &'a str,
        options: &'a SummarizeOptions,
    ) -> BoxFuture<'a, GatewayResult<String>>;
}
