/*!
 * Tests for the provider abstraction and cache-or-provider resolution
 */

use sub2anki::errors::ProviderError;
use sub2anki::providers::mock::MockProvider;
use sub2anki::providers::{Provider, TranslateRequest, TranslationResult};
use sub2anki::translation::{TranslationCache, TranslationService};

fn service_with(provider: &MockProvider, cache: &TranslationCache, source: Option<&str>) -> TranslationService {
    TranslationService::new(
        Box::new(provider.clone()),
        cache.clone(),
        "en",
        source.map(str::to_string),
    )
}

#[tokio::test]
async fn test_mockProvider_withSourceLanguage_shouldNotReportDetection() {
    let provider = MockProvider::echo();
    let request = TranslateRequest::new("Bonjour", "en").with_source_language(Some("fr".to_string()));

    let result = provider.translate(&request).await.unwrap();
    assert_eq!(result.translated_text, "[en] Bonjour");
    assert!(result.detected_source_language.is_none());
}

#[tokio::test]
async fn test_mockProvider_failing_shouldReturnServerError() {
    let provider = MockProvider::failing();
    let err = provider.translate(&TranslateRequest::new("A", "en")).await.unwrap_err();

    assert!(matches!(err, ProviderError::ApiError { status_code: 500, .. }));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_resolve_withRepeatedText_shouldCallProviderOnce() {
    let provider = MockProvider::with_table([("A", "X")]);
    let cache = TranslationCache::in_memory().unwrap();
    let service = service_with(&provider, &cache, None);

    let first = service.resolve("A").await.unwrap();
    let second = service.resolve("A").await.unwrap();

    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(second.result.translated_text, "X");
    assert_eq!(provider.call_count(), 1);
    assert_eq!(service.provider_calls(), 1);
    assert_eq!(service.cache_stats().hits, 1);
}

#[tokio::test]
async fn test_resolve_withCachedEntry_shouldReturnStoredPayloadUnchanged() {
    let provider = MockProvider::with_table([("A", "fresh")]);
    let cache = TranslationCache::in_memory().unwrap();
    let stored = TranslationResult {
        translated_text: "stale".to_string(),
        detected_source_language: Some("he".to_string()),
        input: "A".to_string(),
        model: Some("nmt".to_string()),
    };
    cache.store("A", &stored).await.unwrap();

    let service = service_with(&provider, &cache, None);
    let resolution = service.resolve("A").await.unwrap();

    assert_eq!(resolution.result, stored);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_resolve_withProviderFailure_shouldNotCacheAnything() {
    let provider = MockProvider::failing();
    let cache = TranslationCache::in_memory().unwrap();
    let service = service_with(&provider, &cache, None);

    let err = service.resolve("A").await.unwrap_err();

    assert!(format!("{:#}", err).contains("mock provider failed to translate 'A'"));
    assert!(err.downcast_ref::<ProviderError>().is_some());
    assert!(cache.is_empty().await.unwrap());
}

#[tokio::test]
async fn test_resolve_withSourceLanguage_shouldForwardIt() {
    let provider = MockProvider::echo();
    let cache = TranslationCache::in_memory().unwrap();
    let service = service_with(&provider, &cache, Some("he"));

    let text = service.translate_text("שלום").await.unwrap();

    assert_eq!(text, "[en] שלום");
    assert_eq!(provider.requested_texts(), vec!["שלום"]);
}
