/*!
 * # sub2anki - subtitle lines to translated Anki flashcards
 *
 * A Rust library that turns a subtitle file into an Anki deck: every line
 * becomes a note with the original text on the front and its translation on
 * the back.
 *
 * ## Features
 *
 * - SRT parsing with encoding detection for legacy code pages
 * - Translation through Google Cloud Translation (v2)
 * - Persistent SQLite cache so a line is only translated once across runs
 * - `.apkg` output importable by Anki, with stable deck ids and note GUIDs
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: Subtitle file decoding and parsing
 * - `providers`: Translation provider contract and clients:
 *   - `providers::google`: Google Cloud Translation v2 client
 *   - `providers::mock`: Scripted provider for tests
 * - `database`: SQLite connection and cache schema
 * - `translation`: Cache-or-provider resolution of subtitle lines:
 *   - `translation::core`: Translation service
 *   - `translation::cache`: Persistent translation cache
 * - `anki`: Deck model and `.apkg` writer
 * - `app_controller`: Pipeline driver
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod anki;
pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod subtitle_processor;
pub mod translation;

// Re-export main types for easier usage
pub use anki::{Deck, Model, Note, deck_id_from_name};
pub use app_config::Config;
pub use app_controller::{Controller, PipelineOptions, RunSummary};
pub use errors::{CacheError, PackageError, ProviderError, SubtitleError};
pub use subtitle_processor::{SubtitleCollection, SubtitleEntry};
pub use translation::{TranslationCache, TranslationService};
