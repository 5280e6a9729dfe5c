use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::anki::{Deck, Model, Note, write_package};
use crate::app_config::Config;
use crate::database::connection::DatabaseStats;
use crate::language_utils;
use crate::providers::Provider;
use crate::subtitle_processor::SubtitleCollection;
use crate::translation::{TranslationCache, TranslationService};

// @module: Pipeline driver from subtitle file to deck package

/// Per-run inputs resolved from the command line
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    // @field: Subtitle file to read
    pub srt_in: PathBuf,

    // @field: Zero-based index at which to stop; every entry when unset
    pub stop_short: Option<usize>,

    // @field: Deck display name
    pub deck_name: String,

    // @field: Explicit deck id; derived from the name when unset
    pub deck_id: Option<u32>,

    // @field: Package to write
    pub anki_out: PathBuf,

    // @field: Persistent translation cache
    pub translations_cache: PathBuf,

    // @field: Draw a progress bar on stderr
    pub show_progress: bool,
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub notes_added: usize,
    pub cache_hits: usize,
    pub provider_calls: usize,
    pub deck_id: u32,
    pub output_path: PathBuf,
}

/// Main application controller for deck building
#[derive(Debug)]
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Translation provider, consumed by the run
    provider: Box<dyn Provider>,
}

impl Controller {
    // @method: Create a new controller with the given configuration and provider
    pub fn new(config: Config, provider: Box<dyn Provider>) -> Self {
        Self { config, provider }
    }

    /// Run the pipeline: translate every subtitle line and write the deck.
    ///
    /// Any error aborts the run. Translations fetched before the failure stay
    /// in the cache; no package is written.
    pub async fn run(self, options: &PipelineOptions) -> Result<RunSummary> {
        let start_time = Instant::now();
        let Controller { config, provider } = self;

        let cache = TranslationCache::open(&options.translations_cache).with_context(|| {
            format!(
                "Failed to open translation cache {}",
                options.translations_cache.display()
            )
        })?;

        let subtitles = SubtitleCollection::from_file(&options.srt_in)
            .with_context(|| format!("Failed to load subtitles from {}", options.srt_in.display()))?;
        info!(
            "Loaded {} subtitle entries from {} ({})",
            subtitles.len(),
            options.srt_in.display(),
            subtitles.encoding
        );

        let language_name = language_utils::get_language_name(&config.target_language)
            .unwrap_or_else(|_| config.target_language.clone());
        info!("Translating into {} with the {} provider", language_name, provider.name());

        let service = TranslationService::new(
            provider,
            cache,
            config.target_language.clone(),
            config.source_language.clone(),
        );

        let mut deck = Deck::new(
            options.deck_name.clone(),
            options.deck_id,
            Model::question_answer(&config.deck),
        );

        let total = options
            .stop_short
            .map_or(subtitles.len(), |limit| limit.min(subtitles.len()));
        let progress_bar = Self::progress_bar(total as u64, options.show_progress);

        let outcome = Self::translate_entries(&service, &subtitles, options.stop_short, &mut deck, &progress_bar).await;
        match &outcome {
            Ok(()) => progress_bar.finish_and_clear(),
            Err(_) => progress_bar.abandon(),
        }
        outcome?;

        let provider_calls = service.provider_calls();
        let cache_stats = service.cache_stats();
        let cache = service.into_cache();

        write_package(&deck, &options.anki_out)
            .with_context(|| format!("Failed to write deck package {}", options.anki_out.display()))?;

        cache.close().context("Failed to close translation cache")?;

        let summary = RunSummary {
            notes_added: deck.len(),
            cache_hits: cache_stats.hits,
            provider_calls,
            deck_id: deck.id,
            output_path: options.anki_out.clone(),
        };

        info!(
            "Done in {}: {} notes, {} cache hits ({:.0}%), {} provider calls",
            Self::format_duration(start_time.elapsed()),
            summary.notes_added,
            summary.cache_hits,
            cache_stats.hit_rate() * 100.0,
            summary.provider_calls
        );

        Ok(summary)
    }

    /// Resolve entries in file order, stopping at the stop-short index
    async fn translate_entries(
        service: &TranslationService,
        subtitles: &SubtitleCollection,
        stop_short: Option<usize>,
        deck: &mut Deck,
        progress_bar: &ProgressBar,
    ) -> Result<()> {
        for (index, entry) in subtitles.entries.iter().enumerate() {
            if stop_short == Some(index) {
                debug!("Stopping short at entry index {}", index);
                break;
            }

            debug!("Subtitle {}", entry);
            let resolution = service
                .resolve(&entry.text)
                .await
                .with_context(|| format!("Failed to translate subtitle #{}", entry.seq_num))?;

            let translated = resolution.result.translated_text;
            progress_bar.suspend(|| {
                info!(
                    "Adding note {}{}: {} => {}",
                    index + 1,
                    if resolution.from_cache { " (cached)" } else { "" },
                    entry.text.replace('\n', " / "),
                    translated.replace('\n', " / ")
                )
            });
            deck.add_note(Note::question_answer(entry.text.clone(), translated));
            progress_bar.inc(1);
        }

        Ok(())
    }

    fn progress_bar(len: u64, visible: bool) -> ProgressBar {
        if !visible {
            return ProgressBar::hidden();
        }

        let progress_bar = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({percent}%) {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

/// Entry count and size of an existing translation cache
pub fn cache_info(path: &Path) -> Result<DatabaseStats> {
    if !path.exists() {
        return Err(anyhow!("No translation cache at {}", path.display()));
    }

    let cache = TranslationCache::open(path)
        .with_context(|| format!("Failed to open translation cache {}", path.display()))?;
    let stats = cache.database_stats()?;
    cache.close()?;
    Ok(stats)
}
