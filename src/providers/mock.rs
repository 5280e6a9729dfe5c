/*!
 * Mock provider implementation for testing.
 *
 * The mock answers from a fixed translation table and can simulate failures:
 * - `MockProvider::with_table(..)` - Translates known texts, fails on unknown ones
 * - `MockProvider::echo()` - Returns a tagged copy of the input
 * - `MockProvider::failing()` - Always fails with an error
 *
 * Clones share their call counter and request log, so a test can hand one
 * clone to the pipeline and inspect the other afterwards.
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::ProviderError;
use crate::providers::{Provider, TranslateRequest, TranslationResult};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Look the text up in the translation table
    Table,
    /// Return `[<target>] <text>`
    Echo,
    /// Always fail with a server error
    Failing,
    /// Fail when asked for this exact text, otherwise behave like `Table`
    FailOn(String),
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Known translations
    table: HashMap<String, String>,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Texts requested so far, in order
    requested: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            table: HashMap::new(),
            request_count: Arc::new(AtomicUsize::new(0)),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock provider that answers from a fixed table
    pub fn with_table<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut provider = Self::new(MockBehavior::Table);
        provider.table = pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        provider
    }

    /// Create a mock provider that echoes its input
    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Fail on one text, keep the table for the others
    pub fn fail_on(mut self, text: impl Into<String>) -> Self {
        self.behavior = MockBehavior::FailOn(text.into());
        self
    }

    /// Number of translate calls across all clones
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Texts requested so far, in call order
    pub fn requested_texts(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|texts| texts.clone())
            .unwrap_or_default()
    }

    fn lookup(&self, request: &TranslateRequest) -> Result<String, ProviderError> {
        self.table.get(&request.text).cloned().ok_or_else(|| ProviderError::ApiError {
            status_code: 400,
            message: format!("No mock translation for '{}'", request.text),
        })
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior.clone(),
            table: self.table.clone(),
            request_count: Arc::clone(&self.request_count),
            requested: Arc::clone(&self.requested),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn translate(&self, request: &TranslateRequest) -> Result<TranslationResult, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut texts) = self.requested.lock() {
            texts.push(request.text.clone());
        }

        let translated_text = match &self.behavior {
            MockBehavior::Table => self.lookup(request)?,
            MockBehavior::Echo => format!("[{}] {}", request.target_language, request.text),
            MockBehavior::Failing => {
                return Err(ProviderError::ApiError {
                    message: "Simulated provider failure".to_string(),
                    status_code: 500,
                });
            }
            MockBehavior::FailOn(text) if *text == request.text => {
                return Err(ProviderError::ConnectionError(format!(
                    "Simulated connection failure on '{}'",
                    text
                )));
            }
            MockBehavior::FailOn(_) => self.lookup(request)?,
        };

        Ok(TranslationResult {
            translated_text,
            detected_source_language: request.source_language.is_none().then(|| "xx".to_string()),
            input: request.text.clone(),
            model: None,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
