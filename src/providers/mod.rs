/*!
 * Provider implementations for translation services.
 *
 * This module contains the provider contract used by the translation step and
 * its implementations:
 * - Google: Google Cloud Translation v2 REST API
 * - Mock: scripted provider for tests
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;

/// A single translation request
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateRequest {
    /// The text to translate, sent verbatim
    pub text: String,
    /// Target language code
    pub target_language: String,
    /// Source language code; the service detects it when unset
    pub source_language: Option<String>,
}

impl TranslateRequest {
    pub fn new(text: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target_language: target_language.into(),
            source_language: None,
        }
    }

    pub fn with_source_language(mut self, source_language: Option<String>) -> Self {
        self.source_language = source_language;
        self
    }
}

/// Translation payload as returned by the service and stored in the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    /// Translated text
    pub translated_text: String,

    /// Language the service detected, when no source language was given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_source_language: Option<String>,

    /// The text that was translated
    #[serde(default)]
    pub input: String,

    /// Model that produced the translation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Common trait for all translation providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the translation service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Translate one text
    ///
    /// # Arguments
    /// * `request` - The text and languages to translate with
    ///
    /// # Returns
    /// * `Result<TranslationResult, ProviderError>` - The translation or an error
    async fn translate(&self, request: &TranslateRequest) -> Result<TranslationResult, ProviderError>;

    /// Short provider name for logs
    fn name(&self) -> &'static str;
}

pub mod google;
pub mod mock;
