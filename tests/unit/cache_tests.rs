/*!
 * Tests for the persistent translation cache
 */

use sub2anki::errors::CacheError;
use sub2anki::providers::TranslationResult;
use sub2anki::translation::cache::{CacheStats, TranslationCache};

use crate::common;

fn translation(text: &str) -> TranslationResult {
    TranslationResult {
        translated_text: text.to_string(),
        detected_source_language: Some("he".to_string()),
        input: String::new(),
        model: None,
    }
}

#[tokio::test]
async fn test_cache_get_withMissingKey_shouldReturnNone() {
    let cache = TranslationCache::in_memory().unwrap();
    assert!(cache.get("nonexistent").await.unwrap().is_none());
    assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 1 });
}

#[tokio::test]
async fn test_cache_store_shouldRoundTripPayload() {
    let cache = TranslationCache::in_memory().unwrap();
    let stored = translation("Hello");
    cache.store("שלום", &stored).await.unwrap();

    let loaded = cache.get("שלום").await.unwrap().unwrap();
    assert_eq!(loaded, stored);
    assert_eq!(cache.stats().hits, 1);
}

#[tokio::test]
async fn test_cache_reopen_shouldKeepEntriesAcrossRuns() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("translations.db");

    let cache = TranslationCache::open(&path).unwrap();
    cache.store("A", &translation("X")).await.unwrap();
    cache.store("B", &translation("Y")).await.unwrap();
    cache.close().unwrap();

    let reopened = TranslationCache::open(&path).unwrap();
    assert_eq!(reopened.len().await.unwrap(), 2);
    assert_eq!(reopened.get("B").await.unwrap().unwrap().translated_text, "Y");
}

#[tokio::test]
async fn test_cache_get_withCorruptPayload_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("translations.db");
    TranslationCache::open(&path).unwrap().close().unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute(
        "INSERT INTO translations (source_text, payload, created_at) VALUES ('A', '{\"model\": \"nmt\"}', 'now')",
        [],
    )
    .unwrap();
    conn.close().unwrap();

    let cache = TranslationCache::open(&path).unwrap();
    let err = cache.get("A").await.unwrap_err();
    assert!(matches!(err, CacheError::CorruptEntry { ref key, .. } if key == "A"));
}

#[tokio::test]
async fn test_cache_payload_shouldUseCamelCaseKeys() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("translations.db");
    let cache = TranslationCache::open(&path).unwrap();
    cache.store("A", &translation("X")).await.unwrap();
    cache.close().unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    let payload: String = conn
        .query_row("SELECT payload FROM translations WHERE source_text = 'A'", [], |row| row.get(0))
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&payload).unwrap();

    assert_eq!(value["translatedText"], "X");
    assert_eq!(value["detectedSourceLanguage"], "he");
}

#[tokio::test]
async fn test_cache_close_withLiveClone_shouldReportInUse() {
    let cache = TranslationCache::in_memory().unwrap();
    let _other = cache.clone();

    assert!(matches!(cache.close(), Err(CacheError::InUse)));
}

#[tokio::test]
async fn test_cache_stats_hitRate_shouldReflectLookups() {
    let cache = TranslationCache::in_memory().unwrap();
    assert_eq!(cache.stats().hit_rate(), 0.0);

    cache.store("A", &translation("X")).await.unwrap();
    cache.get("A").await.unwrap();
    cache.get("A").await.unwrap();
    cache.get("A").await.unwrap();
    cache.get("B").await.unwrap();

    assert_eq!(cache.stats().hit_rate(), 0.75);
}
