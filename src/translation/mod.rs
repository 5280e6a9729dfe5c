/*!
 * Translation of subtitle lines.
 *
 * - `core`: cache-or-provider resolution of one line
 * - `cache`: persistent cache of translation payloads
 */

// Re-export main types for easier usage
pub use self::cache::{CacheStats, TranslationCache};
pub use self::core::{Resolution, TranslationService};

// Submodules
pub mod cache;
pub mod core;
