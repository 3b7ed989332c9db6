use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use langai_llm::{
    Availability, Capability, CapabilityGateway, GatewayResult, LanguageCode, TranslatorCache,
    UnavailableSnafu, acquire_translator,
};
use langai_storage::{
    DetectedLanguage, MemoryMessageStore, MessageIndex, MessagePatch, MessageRecord, MessageStore,
    NewMessage, Operation, RequestTicket,
};
use snafu::ResultExt;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::{
    DETECTION_FAILED_MESSAGE, DETECTOR_NOT_READY_MESSAGE, INITIALIZATION_FAILED_MESSAGE,
    MessageStoreSnafu, SUMMARIZATION_FAILED_MESSAGE, StaleResultPolicy, TRANSLATION_FAILED_MESSAGE,
    WorkflowResult,
};
use crate::events::{Indicators, Snapshot, StoreEvent};
use crate::settings::WorkflowSettings;

const EVENT_CHANNEL_CAPACITY: usize = 256;

struct Inner {
    gateway: Arc<dyn CapabilityGateway>,
    store: Arc<dyn MessageStore>,
    translators: TranslatorCache,
    settings: WorkflowSettings,
    default_target: Mutex<LanguageCode>,
    detector_ready: AtomicBool,
    global_error: Mutex<Option<String>>,
    indicators: Mutex<Indicators>,
    events: broadcast::Sender<StoreEvent>,
}

/// Runs detection on submission and translate/summarize on request, writing every
/// outcome back into the message store.
///
/// Gateway failures are recorded on the affected message; only an unknown index
/// is reported back to the caller. Cloning is cheap and shares all state.
#[derive(Clone)]
pub struct WorkflowCoordinator {
    inner: Arc<Inner>,
}

impl WorkflowCoordinator {
    pub fn new(gateway: Arc<dyn CapabilityGateway>, settings: WorkflowSettings) -> Self {
        Self::with_store(gateway, Arc::new(MemoryMessageStore::new()), settings)
    }

    pub fn with_store(
        gateway: Arc<dyn CapabilityGateway>,
        store: Arc<dyn MessageStore>,
        settings: WorkflowSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                gateway,
                store,
                translators: TranslatorCache::default(),
                default_target: Mutex::new(settings.default_target_language.clone()),
                settings,
                detector_ready: AtomicBool::new(false),
                global_error: Mutex::new(None),
                indicators: Mutex::new(Indicators::default()),
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.inner.settings
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            messages: self.inner.store.list_messages(),
            indicators: *lock(&self.inner.indicators),
            global_error: lock(&self.inner.global_error).clone(),
        }
    }

    pub fn message(&self, index: MessageIndex) -> WorkflowResult<MessageRecord> {
        self.inner
            .store
            .get_message(index)
            .context(MessageStoreSnafu {
                stage: "get-message",
            })
    }

    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    pub fn default_target_language(&self) -> LanguageCode {
        lock(&self.inner.default_target).clone()
    }

    /// Target given to messages submitted from now on. Existing records keep theirs.
    pub fn set_default_target_language(&self, language: LanguageCode) {
        tracing::info!(%language, "default target language changed");
        *lock(&self.inner.default_target) = language;
    }

    pub fn summarize_offered(&self, record: &MessageRecord) -> bool {
        self.inner.settings.summarize.offers(record)
    }

    pub fn is_detector_ready(&self) -> bool {
        self.inner.detector_ready.load(Ordering::Acquire)
    }

    /// Awaits the detector's readiness step. On failure the global error is set
    /// and every later detection reports the detector as not ready.
    pub async fn initialize(&self) -> bool {
        let gateway = &self.inner.gateway;
        let prepared = match gateway.detection_availability().await {
            Ok(Availability::No) => UnavailableSnafu {
                stage: "check-detector-availability",
                capability: Capability::Detection,
            }
            .fail(),
            Ok(availability) => {
                tracing::debug!(gateway = gateway.name(), ?availability, "preparing detector");
                gateway.prepare_detector().await
            }
            Err(error) => Err(error),
        };

        match prepared {
            Ok(()) => {
                self.inner.detector_ready.store(true, Ordering::Release);
                tracing::info!(gateway = gateway.name(), "language detector ready");
                true
            }
            Err(error) => {
                tracing::warn!(gateway = gateway.name(), error = %error, "detector initialization failed");
                *lock(&self.inner.global_error) = Some(INITIALIZATION_FAILED_MESSAGE.to_string());
                self.publish(StoreEvent::InitializationFailed(
                    INITIALIZATION_FAILED_MESSAGE.to_string(),
                ));
                false
            }
        }
    }

    /// Appends `text` and runs detection on it. Blank input is ignored.
    pub async fn submit(&self, text: impl Into<String>) -> Option<MessageIndex> {
        let record = self.append(text.into())?;
        self.run_detection(record.index, &record.text).await;
        Some(record.index)
    }

    /// Appends `text` right away and runs detection on a spawned task.
    pub fn spawn_submit(&self, text: impl Into<String>) -> Option<(MessageIndex, JoinHandle<()>)> {
        let record = self.append(text.into())?;
        let coordinator = self.clone();
        let index = record.index;
        let task = tokio::spawn(async move {
            coordinator.run_detection(index, &record.text).await;
        });
        Some((index, task))
    }

    /// Changes the target language without re-translating; any existing
    /// translation stays as it is.
    pub fn set_target_language(
        &self,
        index: MessageIndex,
        language: LanguageCode,
    ) -> WorkflowResult<MessageRecord> {
        let record = self
            .inner
            .store
            .update_message(index, MessagePatch::target(language))
            .context(MessageStoreSnafu {
                stage: "set-target-language",
            })?;
        self.publish(StoreEvent::Updated(record.clone()));
        Ok(record)
    }

    pub async fn translate(&self, index: MessageIndex) -> WorkflowResult<()> {
        let ticket = self
            .inner
            .store
            .begin_request(index, Operation::Translate)
            .context(MessageStoreSnafu {
                stage: "begin-translate",
            })?;
        let record = self.clear_error(index, "clear-translate-error")?;

        let patch = match record.detected_language.code() {
            None => {
                tracing::debug!(%index, "translation requested before a language was detected");
                MessagePatch::failure(TRANSLATION_FAILED_MESSAGE)
            }
            Some(from) if from == &record.target_language => {
                MessagePatch::translation(record.text.clone())
            }
            Some(from) => {
                self.update_indicators(|indicators| indicators.translating = Some(index));
                let outcome = self
                    .request_translation(from, &record.target_language, &record.text)
                    .await;
                self.update_indicators(|indicators| indicators.translating = None);

                match outcome {
                    Ok(translation) => MessagePatch::translation(translation),
                    Err(error) => {
                        tracing::warn!(%index, %from, to = %record.target_language, error = %error, "translation failed");
                        MessagePatch::failure(TRANSLATION_FAILED_MESSAGE)
                    }
                }
            }
        };

        self.apply_completion(&ticket, patch)
    }

    pub async fn summarize(&self, index: MessageIndex) -> WorkflowResult<()> {
        let ticket = self
            .inner
            .store
            .begin_request(index, Operation::Summarize)
            .context(MessageStoreSnafu {
                stage: "begin-summarize",
            })?;
        let record = self.message(index)?;
        if record.text.trim().is_empty() {
            return Ok(());
        }
        self.clear_error(index, "clear-summarize-error")?;

        self.update_indicators(|indicators| indicators.summarizing = Some(index));
        let outcome = self.request_summary(&record.text).await;
        self.update_indicators(|indicators| indicators.summarizing = None);

        let patch = match outcome {
            Ok(summary) => MessagePatch::summary(summary),
            Err(error) => {
                tracing::warn!(%index, error = %error, "summarization failed");
                MessagePatch::failure(SUMMARIZATION_FAILED_MESSAGE)
            }
        };

        self.apply_completion(&ticket, patch)
    }

    fn append(&self, text: String) -> Option<MessageRecord> {
        if text.trim().is_empty() {
            tracing::debug!("ignoring blank submission");
            return None;
        }

        let target = self.default_target_language();
        let record = self.inner.store.append_message(NewMessage::new(text, target));
        tracing::debug!(index = %record.index, "message appended");
        self.publish(StoreEvent::Appended(record.clone()));
        Some(record)
    }

    async fn run_detection(&self, index: MessageIndex, text: &str) {
        let patch = if !self.is_detector_ready() {
            MessagePatch::detected(DetectedLanguage::Failed).with_error(DETECTOR_NOT_READY_MESSAGE)
        } else {
            match self.inner.gateway.detect(text).await {
                Ok(code) => MessagePatch::detected(DetectedLanguage::Detected(code)),
                Err(error) => {
                    tracing::warn!(%index, error = %error, "language detection failed");
                    MessagePatch::detected(DetectedLanguage::Failed)
                        .with_error(DETECTION_FAILED_MESSAGE)
                }
            }
        };

        let record = match self.inner.store.update_message(index, patch) {
            Ok(record) => record,
            Err(error) => {
                tracing::error!(%index, error = %error, "failed to record detected language");
                return;
            }
        };
        self.publish(StoreEvent::Updated(record.clone()));

        if self.inner.settings.prewarm_translator {
            self.prewarm(&record).await;
        }
    }

    async fn prewarm(&self, record: &MessageRecord) {
        let Some(from) = record.detected_language.code() else {
            return;
        };
        if record.targets_own_language() {
            return;
        }

        let to = &record.target_language;
        if let Err(error) =
            acquire_translator(self.inner.gateway.as_ref(), &self.inner.translators, from, to)
                .await
        {
            tracing::debug!(index = %record.index, %from, %to, error = %error, "translator pre-warm skipped");
        }
    }

    async fn request_translation(
        &self,
        from: &LanguageCode,
        to: &LanguageCode,
        text: &str,
    ) -> GatewayResult<String> {
        let gateway = self.inner.gateway.as_ref();
        let handle = acquire_translator(gateway, &self.inner.translators, from, to).await?;
        gateway.translate(&handle, text).await
    }

    async fn request_summary(&self, text: &str) -> GatewayResult<String> {
        let gateway = self.inner.gateway.as_ref();
        if !gateway.summarization_availability().await?.is_available() {
            return UnavailableSnafu {
                stage: "check-summarizer-availability",
                capability: Capability::Summarization,
            }
            .fail();
        }
        gateway
            .summarize(text, &self.inner.settings.summary_options)
            .await
    }

    fn clear_error(&self, index: MessageIndex, stage: &'static str) -> WorkflowResult<MessageRecord> {
        let record = self
            .inner
            .store
            .update_message(index, MessagePatch::clear_error())
            .context(MessageStoreSnafu { stage })?;
        self.publish(StoreEvent::Updated(record.clone()));
        Ok(record)
    }

    fn apply_completion(&self, ticket: &RequestTicket, patch: MessagePatch) -> WorkflowResult<()> {
        let store = &self.inner.store;
        let applied = match self.inner.settings.stale_results {
            StaleResultPolicy::Apply => Some(store.update_message(ticket.index, patch)),
            StaleResultPolicy::Discard => store.update_if_latest(ticket, patch).transpose(),
        };

        if let Some(record) = applied.transpose().context(MessageStoreSnafu {
            stage: "apply-completion",
        })? {
            self.publish(StoreEvent::Updated(record));
        }
        Ok(())
    }

    fn update_indicators(&self, change: impl FnOnce(&mut Indicators)) {
        let indicators = {
            let mut indicators = lock(&self.inner.indicators);
            change(&mut indicators);
            *indicators
        };
        self.publish(StoreEvent::IndicatorsChanged(indicators));
    }

    fn publish(&self, event: StoreEvent) {
        // No subscribers is not an error; presenters may attach later.
        let _ = self.inner.events.send(event);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
