use std::sync::Arc;

mod gateway;
mod language;
mod rig_adapter;
mod translator;

pub use gateway::{
    Availability, BoxFuture, Capability, CapabilityGateway, DEFAULT_SUMMARY_CONTEXT,
    GatewayError, GatewayResult, SummarizeOptions, SummaryFormat, SummaryKind, SummaryLength,
    TranslatorHandle,
};
pub use gateway::{
    DetectionFailedSnafu, SummarizationFailedSnafu, TranslationFailedSnafu, UnavailableSnafu,
    UnsupportedSnafu,
};
pub use language::{DEFAULT_TARGET_LANGUAGE, LanguageCode, SUPPORTED_LANGUAGES};
pub use rig_adapter::{
    DEFAULT_OPENAI_MODEL, ProviderConfig, RIG_OPENAI_PROVIDER_ID, RigCapabilityGateway,
};
pub use translator::{LanguagePair, TranslatorCache, acquire_translator};

pub fn create_gateway(mut config: ProviderConfig) -> GatewayResult<Arc<dyn CapabilityGateway>> {
    if config.provider_id.trim().is_empty() {
        config.provider_id = RIG_OPENAI_PROVIDER_ID.to_string();
    }

    match config.provider_id.as_str() {
        "openai" | "rig-openai" => {
            config.provider_id = RIG_OPENAI_PROVIDER_ID.to_string();
            Ok(Arc::new(RigCapabilityGateway::new(config)))
        }
        _ => Err(GatewayError::UnsupportedProvider {
            stage: "create-gateway",
            provider_id: config.provider_id,
        }),
    }
}
