/*!
 * Core translation service implementation.
 *
 * This module contains the TranslationService, which resolves one subtitle
 * line to a translation: from the persistent cache when the exact text was
 * seen before, otherwise from the provider, storing the answer for next time.
 */

use anyhow::{Context, Result};
use log::debug;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::cache::{CacheStats, TranslationCache};
use crate::providers::{Provider, TranslateRequest, TranslationResult};

/// A resolved translation and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub result: TranslationResult,
    pub from_cache: bool,
}

/// Cache-or-provider translation service
#[derive(Debug)]
pub struct TranslationService {
    /// Provider implementation
    provider: Box<dyn Provider>,

    /// Translation cache for storing and retrieving translations
    cache: TranslationCache,

    /// Language translations are requested in
    target_language: String,

    /// Source language hint; detected by the provider when unset
    source_language: Option<String>,

    /// Provider calls made by this service
    provider_calls: AtomicUsize,
}

impl TranslationService {
    /// Create a new translation service
    pub fn new(
        provider: Box<dyn Provider>,
        cache: TranslationCache,
        target_language: impl Into<String>,
        source_language: Option<String>,
    ) -> Self {
        Self {
            provider,
            cache,
            target_language: target_language.into(),
            source_language,
            provider_calls: AtomicUsize::new(0),
        }
    }

    /// Resolve one text through the cache, falling back to the provider.
    ///
    /// A provider failure is returned as is; nothing is stored for that text.
    pub async fn resolve(&self, text: &str) -> Result<Resolution> {
        if let Some(result) = self
            .cache
            .get(text)
            .await
            .with_context(|| format!("Failed to read cached translation for '{}'", text))?
        {
            return Ok(Resolution {
                result,
                from_cache: true,
            });
        }

        let request = TranslateRequest::new(text, self.target_language.as_str())
            .with_source_language(self.source_language.clone());

        self.provider_calls.fetch_add(1, Ordering::SeqCst);
        let result = self
            .provider
            .translate(&request)
            .await
            .with_context(|| format!("{} provider failed to translate '{}'", self.provider.name(), text))?;
        debug!("Provider result: {:?}", result);

        self.cache
            .store(text, &result)
            .await
            .with_context(|| format!("Failed to cache translation for '{}'", text))?;

        Ok(Resolution {
            result,
            from_cache: false,
        })
    }

    /// Resolve and return only the translated text
    pub async fn translate_text(&self, text: &str) -> Result<String> {
        Ok(self.resolve(text).await?.result.translated_text)
    }

    pub fn provider_calls(&self) -> usize {
        self.provider_calls.load(Ordering::SeqCst)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Release the provider and hand back the cache so it can be closed
    pub fn into_cache(self) -> TranslationCache {
        self.cache
    }
}
