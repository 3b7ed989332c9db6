use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use super::gateway::{CapabilityGateway, GatewayResult, TranslatorHandle, UnsupportedSnafu};
use super::language::LanguageCode;

/// Source/target pair a translator is created for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguagePair {
    pub from: LanguageCode,
    pub to: LanguageCode,
}

impl LanguagePair {
    pub fn new(from: LanguageCode, to: LanguageCode) -> Self {
        Self { from, to }
    }
}

struct CacheEntry {
    handle: TranslatorHandle,
    created_at: Instant,
}

/// Session-scoped cache of translator handles keyed by language pair.
pub struct TranslatorCache {
    entries: RwLock<HashMap<LanguagePair, CacheEntry>>,
    ttl: Duration,
}

impl TranslatorCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(Duration::from_secs(60 * 60))
    }

    pub async fn get_fresh(&self, pair: &LanguagePair) -> Option<TranslatorHandle> {
        let entries = self.entries.read().await;
        entries.get(pair).and_then(|entry| {
            if entry.created_at.elapsed() < self.ttl {
                Some(entry.handle.clone())
            } else {
                None
            }
        })
    }

    pub async fn set(&self, pair: LanguagePair, handle: TranslatorHandle) {
        let mut entries = self.entries.write().await;
        entries.insert(
            pair,
            CacheEntry {
                handle,
                created_at: Instant::now(),
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for TranslatorCache {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}

/// Returns a cached translator for the pair or asks the gateway for a new one.
///
/// A pair the gateway reports as unsupported, or for which it declines to create a
/// translator, fails with `Unsupported`.
pub async fn acquire_translator(
    gateway: &dyn CapabilityGateway,
    cache: &TranslatorCache,
    from: &LanguageCode,
    to: &LanguageCode,
) -> GatewayResult<TranslatorHandle> {
    let pair = LanguagePair::new(from.clone(), to.clone());
    if let Some(handle) = cache.get_fresh(&pair).await {
        return Ok(handle);
    }

    if !gateway.translation_supported(from, to).await? {
        tracing::debug!(gateway = gateway.name(), %from, %to, "language pair not supported");
        return UnsupportedSnafu {
            stage: "check-translation-pair",
            from: from.clone(),
            to: to.clone(),
        }
        .fail();
    }

    let Some(handle) = gateway.create_translator(from, to).await? else {
        return UnsupportedSnafu {
            stage: "create-translator",
            from: from.clone(),
            to: to.clone(),
        }
        .fail();
    };

    tracing::debug!(handle_id = handle.id(), %from, %to, "created translator");
    cache.set(pair, handle.clone()).await;
    Ok(handle)
}
