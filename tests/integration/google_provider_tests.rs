/*!
 * Tests for the Google Translate client against a local HTTP stub
 */

use sub2anki::app_config::{TextFormat, TranslationConfig};
use sub2anki::errors::ProviderError;
use sub2anki::providers::google::GoogleTranslate;
use sub2anki::providers::{Provider, TranslateRequest};

use crate::common::{self, StubResponse};

const HELLO_RESPONSE: &str =
    r#"{"data":{"translations":[{"translatedText":"Bonjour","detectedSourceLanguage":"en"}]}}"#;

fn config_for(endpoint: &str) -> TranslationConfig {
    TranslationConfig {
        endpoint: endpoint.to_string(),
        api_key: "test-key".to_string(),
        timeout_secs: 5,
        retry_count: 2,
        retry_backoff_ms: 1,
        ..TranslationConfig::default()
    }
}

#[tokio::test]
async fn test_translate_withSuccess_shouldSendV2Request() {
    common::init_test_logger();
    let (base_url, requests) = common::spawn_http_stub(vec![StubResponse::new(200, HELLO_RESPONSE)]).await;
    let provider = GoogleTranslate::new(&config_for(&base_url)).unwrap();

    let result = provider
        .translate(&TranslateRequest::new("Hello", "fr"))
        .await
        .unwrap();

    assert_eq!(result.translated_text, "Bonjour");
    assert_eq!(result.detected_source_language.as_deref(), Some("en"));
    assert_eq!(result.input, "Hello");

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("POST /language/translate/v2?key=test-key"));
    assert!(requests[0].contains(r#""q":["Hello"]"#));
    assert!(requests[0].contains(r#""target":"fr""#));
    assert!(requests[0].contains(r#""format":"html""#));
    assert!(!requests[0].contains(r#""source""#));
}

#[tokio::test]
async fn test_translate_withSourceAndTextFormat_shouldIncludeThem() {
    let (base_url, requests) = common::spawn_http_stub(vec![StubResponse::new(
        200,
        r#"{"data":{"translations":[{"translatedText":"Hello","model":"nmt"}]}}"#,
    )])
    .await;
    let mut config = config_for(&base_url);
    config.format = TextFormat::Text;
    config.model = Some("nmt".to_string());
    let provider = GoogleTranslate::new(&config).unwrap();

    let request = TranslateRequest::new("שלום", "en").with_source_language(Some("he".to_string()));
    let result = provider.translate(&request).await.unwrap();

    assert_eq!(result.model.as_deref(), Some("nmt"));
    assert!(result.detected_source_language.is_none());

    let requests = requests.lock().unwrap();
    assert!(requests[0].contains(r#""source":"he""#));
    assert!(requests[0].contains(r#""format":"text""#));
    assert!(requests[0].contains(r#""model":"nmt""#));
}

#[tokio::test]
async fn test_translate_withServerErrorThenSuccess_shouldRetry() {
    common::init_test_logger();
    let (base_url, requests) = common::spawn_http_stub(vec![
        StubResponse::new(503, r#"{"error":{"code":503,"message":"Backend unavailable"}}"#),
        StubResponse::new(200, HELLO_RESPONSE),
    ])
    .await;
    let provider = GoogleTranslate::new(&config_for(&base_url)).unwrap();

    let result = provider
        .translate(&TranslateRequest::new("Hello", "fr"))
        .await
        .unwrap();

    assert_eq!(result.translated_text, "Bonjour");
    assert_eq!(requests.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_translate_withBadKey_shouldFailWithoutRetry() {
    let (base_url, requests) = common::spawn_http_stub(vec![StubResponse::new(
        401,
        r#"{"error":{"code":401,"message":"API key not valid"}}"#,
    )])
    .await;
    let provider = GoogleTranslate::new(&config_for(&base_url)).unwrap();

    let err = provider
        .translate(&TranslateRequest::new("Hello", "fr"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::AuthenticationError(ref m) if m == "API key not valid"));
    assert_eq!(requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_translate_withBadRequest_shouldReturnApiError() {
    let (base_url, _requests) = common::spawn_http_stub(vec![StubResponse::new(
        400,
        r#"{"error":{"code":400,"message":"Invalid Value"}}"#,
    )])
    .await;
    let provider = GoogleTranslate::new(&config_for(&base_url)).unwrap();

    let err = provider
        .translate(&TranslateRequest::new("Hello", "xx"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::ApiError { status_code: 400, ref message } if message == "Invalid Value"));
}

#[tokio::test]
async fn test_translate_withRefusedConnection_shouldReturnConnectionError() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = config_for(&format!("http://{}", addr));
    config.retry_count = 0;
    let provider = GoogleTranslate::new(&config).unwrap();

    let err = provider
        .translate(&TranslateRequest::new("Hello", "fr"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::ConnectionError(_)));
}

#[tokio::test]
async fn test_translate_withAccessToken_shouldSendBearerInsteadOfKey() {
    let (base_url, requests) = common::spawn_http_stub(vec![StubResponse::new(200, HELLO_RESPONSE)]).await;
    let mut config = config_for(&base_url);
    config.api_key = String::new();
    config.access_token = "ya29.token".to_string();
    config.quota_project = Some("my-project".to_string());
    let provider = GoogleTranslate::new(&config).unwrap();

    provider
        .translate(&TranslateRequest::new("Hello", "fr"))
        .await
        .unwrap();

    let requests = requests.lock().unwrap();
    let request = requests[0].to_lowercase();
    assert!(request.starts_with("post /language/translate/v2 http/1.1"));
    assert!(request.contains("authorization: bearer ya29.token"));
    assert!(request.contains("x-goog-user-project: my-project"));
}
