mod coordinator;
mod policy;
#[cfg(test)]
mod testing;

use langai_storage::StoreError;
use snafu::Snafu;

pub use coordinator::WorkflowCoordinator;
pub use policy::{
    DEFAULT_SUMMARIZE_LANGUAGE, DEFAULT_SUMMARIZE_MIN_LENGTH, StaleResultPolicy, SummarizePolicy,
};

pub const INITIALIZATION_FAILED_MESSAGE: &str = "Failed to initialize language detector.";
pub const DETECTOR_NOT_READY_MESSAGE: &str = "Language detector is not ready.";
pub const DETECTION_FAILED_MESSAGE: &str = "Failed to detect language.";
pub const TRANSLATION_FAILED_MESSAGE: &str = "Error translating text.";
pub const SUMMARIZATION_FAILED_MESSAGE: &str = "Error summarizing text.";

/// Errors surfaced to coordinator callers. Gateway failures never appear here;
/// they are recorded on the affected message instead.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum WorkflowError {
    #[snafu(display("message store rejected `{stage}`: {source}"))]
    MessageStore {
        stage: &'static str,
        source: StoreError,
    },
}

impl WorkflowError {
    pub fn is_out_of_range(&self) -> bool {
        match self {
            Self::MessageStore { source, .. } => source.is_out_of_range(),
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
