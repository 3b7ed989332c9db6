use std::sync::atomic::{AtomicU64, Ordering};

use futures::StreamExt;
use rig::completion::{CompletionModel, Message as RigMessage};
use rig::prelude::CompletionClient;
use rig::providers::openai;
use rig::streaming::StreamedAssistantContent;
use snafu::{ResultExt, ensure};

use super::gateway::{
    Availability, BoxFuture, Capability, CapabilityGateway, CompletionsFailedSnafu,
    DetectionFailedSnafu, GatewayError, GatewayResult, HttpClientSnafu, SummarizationFailedSnafu,
    SummarizeOptions, SummaryFormat, SummaryKind, SummaryLength, TranslationFailedSnafu,
    TranslatorHandle, UnavailableSnafu, UnsupportedSnafu,
};
use super::language::LanguageCode;

pub const RIG_OPENAI_PROVIDER_ID: &str = "openai";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

const DETECT_PREAMBLE: &str = "Identify the language of the user's text. \
Reply with its ISO 639-1 code in lowercase and nothing else.";

type RigStreamingResponse = rig::streaming::StreamingCompletionResponse<
    rig::providers::openai::responses_api::streaming::StreamingCompletionResponse,
>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider_id: String,
    pub api_key: String,
    pub endpoint: String,
    pub model_id: String,
}

impl ProviderConfig {
    pub fn new(
        provider_id: impl Into<String>,
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        let model_id = model_id.into().trim().to_string();
        Self {
            provider_id: provider_id.into().trim().to_string(),
            api_key: api_key.into().trim().to_string(),
            endpoint: endpoint.into().trim().to_string(),
            model_id: if model_id.is_empty() {
                DEFAULT_OPENAI_MODEL.to_string()
            } else {
                model_id
            },
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Gateway backed by an OpenAI-compatible completion model through rig.
///
/// Every capability is a single prompted completion; there is no download step,
/// so availability is `Readily` whenever an API key is configured.
pub struct RigCapabilityGateway {
    config: ProviderConfig,
    next_translator_id: AtomicU64,
}

impl RigCapabilityGateway {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            next_translator_id: AtomicU64::new(1),
        }
    }

    fn availability(&self) -> Availability {
        if self.config.has_api_key() {
            Availability::Readily
        } else {
            Availability::No
        }
    }

    fn ensure_available(&self, stage: &'static str, capability: Capability) -> GatewayResult<()> {
        ensure!(
            self.config.has_api_key(),
            UnavailableSnafu { stage, capability }
        );
        Ok(())
    }

    fn build_client(config: &ProviderConfig) -> GatewayResult<openai::Client> {
        let mut builder = openai::Client::builder().api_key(config.api_key.as_str());
        if !config.endpoint.is_empty() {
            builder = builder.base_url(config.endpoint.as_str());
        }
        builder.build().context(HttpClientSnafu {
            stage: "build-client",
        })
    }

    async fn open_stream(
        config: &ProviderConfig,
        preamble: String,
        text: &str,
    ) -> GatewayResult<RigStreamingResponse> {
        let client = Self::build_client(config)?;
        let model = client.completion_model(config.model_id.clone());

        model
            .completion_request(RigMessage::user(text.to_string()))
            .preamble(preamble)
            .temperature(0.0)
            .stream()
            .await
            .context(CompletionsFailedSnafu {
                stage: "open-stream",
            })
    }

    /// Runs one prompted completion and returns the collected assistant text.
    async fn complete(&self, preamble: String, text: &str) -> GatewayResult<String> {
        let mut stream = Self::open_stream(&self.config, preamble, text).await?;
        let mut output = String::new();

        while let Some(item) = stream.next().await {
            match item {
                Ok(StreamedAssistantContent::Text(chunk)) => output.push_str(&chunk.text),
                Ok(_) => {}
                Err(source) => {
                    tracing::warn!(
                        provider_id = %self.config.provider_id,
                        model_id = %self.config.model_id,
                        error = %source,
                        "provider stream emitted an error chunk"
                    );
                    return Err(GatewayError::CompletionsFailed {
                        stage: "stream-chunk",
                        source,
                    });
                }
            }
        }

        Ok(output.trim().to_string())
    }

    fn pair_supported(from: &LanguageCode, to: &LanguageCode) -> bool {
        from != to && from.is_supported() && to.is_supported()
    }

    fn translate_preamble(handle: &TranslatorHandle) -> String {
        let from = handle.from_language();
        let to = handle.to_language();
        format!(
            "Translate the user's text from {} to {}. Reply with the translation only.",
            from.display_name().unwrap_or(from.as_str()),
            to.display_name().unwrap_or(to.as_str()),
        )
    }

    fn summarize_preamble(options: &SummarizeOptions) -> String {
        let shape = match options.kind {
            SummaryKind::KeyPoints => "the key points of the user's text as a list",
            SummaryKind::Tldr => "a short overview of the user's text",
            SummaryKind::Teaser => "an intriguing teaser for the user's text",
            SummaryKind::Headline => "a single headline for the user's text",
        };
        let length = match options.length {
            SummaryLength::Short => "Keep it short.",
            SummaryLength::Medium => "Keep it medium length.",
            SummaryLength::Long => "It may be long.",
        };
        let format = match options.format {
            SummaryFormat::Markdown => "Format the answer as markdown.",
            SummaryFormat::PlainText => "Answer in plain text without markup.",
        };

        let mut preamble = format!("Write {shape}. {length} {format}");
        if let Some(context) = options.context.as_deref()
            && !context.trim().is_empty()
        {
            preamble.push_str("\nContext: ");
            preamble.push_str(context.trim());
        }
        preamble
    }

    /// First token of the model reply, stripped of quotes and punctuation.
    fn parse_detected_code(reply: &str) -> GatewayResult<LanguageCode> {
        let token = reply
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '-');

        LanguageCode::parse(token).map_err(|_| GatewayError::DetectionFailed {
            stage: "parse-detected-code",
            details: format!("model replied with '{reply}'"),
        })
    }
}

impl CapabilityGateway for RigCapabilityGateway {
    fn name(&self) -> &str {
        "Rig OpenAI"
    }

    fn detection_availability(&self) -> BoxFuture<'_, GatewayResult<Availability>> {
        Box::pin(async move { Ok(self.availability()) })
    }

    fn prepare_detector(&self) -> BoxFuture<'_, GatewayResult<()>> {
        Box::pin(async move {
            self.ensure_available("prepare-detector", Capability::Detection)?;
            // Surfaces a malformed endpoint during start-up.
            Self::build_client(&self.config)?;
            tracing::info!(
                provider_id = %self.config.provider_id,
                model_id = %self.config.model_id,
                "language detector ready"
            );
            Ok(())
        })
    }

    fn detect<'a>(&'a self, text: &'a str) -> BoxFuture<'a, GatewayResult<LanguageCode>> {
        Box::pin(async move {
            self.ensure_available("detect", Capability::Detection)?;
            let reply = self.complete(DETECT_PREAMBLE.to_string(), text).await?;
            ensure!(
                !reply.is_empty(),
                DetectionFailedSnafu {
                    stage: "detect-empty-reply",
                    details: "model returned no text",
                }
            );
            Self::parse_detected_code(&reply)
        })
    }

    fn translation_supported<'a>(
        &'a self,
        from: &'a LanguageCode,
        to: &'a LanguageCode,
    ) -> BoxFuture<'a, GatewayResult<bool>> {
        Box::pin(async move { Ok(self.config.has_api_key() && Self::pair_supported(from, to)) })
    }

    fn create_translator<'a>(
        &'a self,
        from: &'a LanguageCode,
        to: &'a LanguageCode,
    ) -> BoxFuture<'a, GatewayResult<Option<TranslatorHandle>>> {
        Box::pin(async move {
            self.ensure_available("create-translator", Capability::Translation)?;
            if !Self::pair_supported(from, to) {
                return Ok(None);
            }

            let id = self.next_translator_id.fetch_add(1, Ordering::Relaxed);
            Ok(Some(TranslatorHandle::new(id, from.clone(), to.clone())))
        })
    }

    fn translate<'a>(
        &'a self,
        handle: &'a TranslatorHandle,
        text: &'a str,
    ) -> BoxFuture<'a, GatewayResult<String>> {
        Box::pin(async move {
            self.ensure_available("translate", Capability::Translation)?;
            ensure!(
                Self::pair_supported(handle.from_language(), handle.to_language()),
                UnsupportedSnafu {
                    stage: "translate-check-handle",
                    from: handle.from_language().clone(),
                    to: handle.to_language().clone(),
                }
            );

            let translated = self.complete(Self::translate_preamble(handle), text).await?;
            ensure!(
                !translated.is_empty(),
                TranslationFailedSnafu {
                    stage: "translate-empty-reply",
                    details: "model returned no text",
                }
            );
            Ok(translated)
        })
    }

    fn summarization_availability(&self) -> BoxFuture<'_, GatewayResult<Availability>> {
        Box::pin(async move { Ok(self.availability()) })
    }

    fn summarize<'a>(
        &'a self,
        text: &'a str,
        options: &'a SummarizeOptions,
    ) -> BoxFuture<'a, GatewayResult<String>> {
        Box::pin(async move {
            self.ensure_available("summarize", Capability::Summarization)?;
            let summary = self.complete(Self::summarize_preamble(options), text).await?;
            ensure!(
                !summary.is_empty(),
                SummarizationFailedSnafu {
                    stage: "summarize-empty-reply",
                    details: "model returned no text",
                }
            );
            Ok(summary)
        })
    }
}
