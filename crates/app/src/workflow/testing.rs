use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use langai_llm::{
    Availability, BoxFuture, Capability, CapabilityGateway, DetectionFailedSnafu, GatewayResult,
    LanguageCode, SummarizationFailedSnafu, SummarizeOptions, TranslationFailedSnafu,
    TranslatorHandle, UnavailableSnafu,
};
use tokio::sync::{mpsc, oneshot};

/// What a scripted capability answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reply {
    Ok(String),
    Fail,
}

impl Reply {
    pub(crate) fn ok(text: impl Into<String>) -> Self {
        Self::Ok(text.into())
    }
}

/// A gateway call parked until the test resolves it.
#[derive(Debug)]
pub(crate) struct PendingCall {
    pub text: String,
    pub target: Option<LanguageCode>,
    respond: oneshot::Sender<Reply>,
}

impl PendingCall {
    pub(crate) fn resolve(self, reply: Reply) {
        let _ = self.respond.send(reply);
    }
}

enum Script {
    /// Translation answers `"<target>: <text>"`.
    Echo,
    Fixed(Reply),
    Gated(mpsc::UnboundedSender<PendingCall>),
}

impl Script {
    async fn resolve(&self, text: &str, target: Option<&LanguageCode>, echo: String) -> Reply {
        match self {
            Self::Echo => Reply::Ok(echo),
            Self::Fixed(reply) => reply.clone(),
            Self::Gated(calls) => {
                let (respond, response) = oneshot::channel();
                let call = PendingCall {
                    text: text.to_string(),
                    target: target.cloned(),
                    respond,
                };
                if calls.send(call).is_err() {
                    return Reply::Fail;
                }
                response.await.unwrap_or(Reply::Fail)
            }
        }
    }
}

/// In-process gateway whose answers are scripted per capability.
pub(crate) struct ScriptedGateway {
    detection_availability: Availability,
    preparation_fails: bool,
    detection: Script,
    translation: Script,
    unsupported_pairs: Vec<(String, String)>,
    summarization_availability: Availability,
    summarization: Script,
    next_handle: AtomicU64,
    detect_calls: AtomicUsize,
    translator_creations: AtomicUsize,
    translate_calls: AtomicUsize,
    summarize_calls: AtomicUsize,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self {
            detection_availability: Availability::Readily,
            preparation_fails: false,
            detection: Script::Fixed(Reply::ok("en")),
            translation: Script::Echo,
            unsupported_pairs: Vec::new(),
            summarization_availability: Availability::Readily,
            summarization: Script::Fixed(Reply::ok("summary")),
            next_handle: AtomicU64::new(1),
            detect_calls: AtomicUsize::new(0),
            translator_creations: AtomicUsize::new(0),
            translate_calls: AtomicUsize::new(0),
            summarize_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn detecting(mut self, code: &str) -> Self {
        self.detection = Script::Fixed(Reply::ok(code));
        self
    }

    pub(crate) fn failing_detection(mut self) -> Self {
        self.detection = Script::Fixed(Reply::Fail);
        self
    }

    pub(crate) fn gated_detection(mut self) -> (Self, mpsc::UnboundedReceiver<PendingCall>) {
        let (calls, pending) = mpsc::unbounded_channel();
        self.detection = Script::Gated(calls);
        (self, pending)
    }

    pub(crate) fn failing_preparation(mut self) -> Self {
        self.preparation_fails = true;
        self
    }

    pub(crate) fn failing_translation(mut self) -> Self {
        self.translation = Script::Fixed(Reply::Fail);
        self
    }

    pub(crate) fn gated_translation(mut self) -> (Self, mpsc::UnboundedReceiver<PendingCall>) {
        let (calls, pending) = mpsc::unbounded_channel();
        self.translation = Script::Gated(calls);
        (self, pending)
    }

    pub(crate) fn unsupported_pair(mut self, from: &str, to: &str) -> Self {
        self.unsupported_pairs.push((from.to_string(), to.to_string()));
        self
    }

    pub(crate) fn summarizing(mut self, summary: &str) -> Self {
        self.summarization = Script::Fixed(Reply::ok(summary));
        self
    }

    pub(crate) fn failing_summarization(mut self) -> Self {
        self.summarization = Script::Fixed(Reply::Fail);
        self
    }

    pub(crate) fn gated_summarization(mut self) -> (Self, mpsc::UnboundedReceiver<PendingCall>) {
        let (calls, pending) = mpsc::unbounded_channel();
        self.summarization = Script::Gated(calls);
        (self, pending)
    }

    pub(crate) fn without_summarizer(mut self) -> Self {
        self.summarization_availability = Availability::No;
        self
    }

    pub(crate) fn detect_calls(&self) -> usize {
        self.detect_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn translator_creations(&self) -> usize {
        self.translator_creations.load(Ordering::SeqCst)
    }

    pub(crate) fn translate_calls(&self) -> usize {
        self.translate_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn summarize_calls(&self) -> usize {
        self.summarize_calls.load(Ordering::SeqCst)
    }

    fn pair_supported(&self, from: &LanguageCode, to: &LanguageCode) -> bool {
        !self
            .unsupported_pairs
            .iter()
            .any(|(source, target)| from == source.as_str() && to == target.as_str())
    }
}

impl CapabilityGateway for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    fn detection_availability(&self) -> BoxFuture<'_, GatewayResult<Availability>> {
        Box::pin(async move { Ok(self.detection_availability) })
    }

    fn prepare_detector(&self) -> BoxFuture<'_, GatewayResult<()>> {
        Box::pin(async move {
            if self.preparation_fails {
                return UnavailableSnafu {
                    stage: "scripted-prepare-detector",
                    capability: Capability::Detection,
                }
                .fail();
            }
            Ok(())
        })
    }

    fn detect<'a>(&'a self, text: &'a str) -> BoxFuture<'a, GatewayResult<LanguageCode>> {
        Box::pin(async move {
            self.detect_calls.fetch_add(1, Ordering::SeqCst);
            match self.detection.resolve(text, None, String::new()).await {
                Reply::Ok(code) => LanguageCode::parse(&code),
                Reply::Fail => DetectionFailedSnafu {
                    stage: "scripted-detect",
                    details: "scripted failure",
                }
                .fail(),
            }
        })
    }

    fn translation_supported<'a>(
        &'a self,
        from: &'a LanguageCode,
        to: &'a LanguageCode,
    ) -> BoxFuture<'a, GatewayResult<bool>> {
        Box::pin(async move { Ok(self.pair_supported(from, to)) })
    }

    fn create_translator<'a>(
        &'a self,
        from: &'a LanguageCode,
        to: &'a LanguageCode,
    ) -> BoxFuture<'a, GatewayResult<Option<TranslatorHandle>>> {
        Box::pin(async move {
            if !self.pair_supported(from, to) {
                return Ok(None);
            }
            self.translator_creations.fetch_add(1, Ordering::SeqCst);
            let id = self.next_handle.fetch_add(1, Ordering::SeqCst);
            Ok(Some(TranslatorHandle::new(id, from.clone(), to.clone())))
        })
    }

    fn translate<'a>(
        &'a self,
        handle: &'a TranslatorHandle,
        text: &'a str,
    ) -> BoxFuture<'a, GatewayResult<String>> {
        Box::pin(async move {
            self.translate_calls.fetch_add(1, Ordering::SeqCst);
            let target = handle.to_language();
            let echo = format!("{target}: {text}");
            match self.translation.resolve(text, Some(target), echo).await {
                Reply::Ok(translation) => Ok(translation),
                Reply::Fail => TranslationFailedSnafu {
                    stage: "scripted-translate",
                    details: "scripted failure",
                }
                .fail(),
            }
        })
    }

    fn summarization_availability(&self) -> BoxFuture<'_, GatewayResult<Availability>> {
        Box::pin(async move { Ok(self.summarization_availability) })
    }

    fn summarize<'a>(
        &'a self,
        text: &'a str,
        _options: &'a SummarizeOptions,
    ) -> BoxFuture<'a, GatewayResult<String>> {
        Box::pin(async move {
            self.summarize_calls.fetch_add(1, Ordering::SeqCst);
            match self.summarization.resolve(text, None, String::new()).await {
                Reply::Ok(summary) => Ok(summary),
                Reply::Fail => SummarizationFailedSnafu {
                    stage: "scripted-summarize",
                    details: "scripted failure",
                }
                .fail(),
            }
        })
    }
}
