use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;

// @module: Subtitle reading and SRT parsing

// @const: SRT timing line, `,` or `.` before the milliseconds
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}:\d{2}:\d{2}[,.]\d{3})\s*-->\s*(\d{1,2}:\d{2}:\d{2}[,.]\d{3})")
        .expect("timestamp pattern is valid")
});

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    // @field: Sequence number as written in the file
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Subtitle text, lines joined with '\n'
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text,
        }
    }

    /// Parse an SRT timestamp (`HH:MM:SS,mmm` or `HH:MM:SS.mmm`) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(anyhow!("Invalid timestamp format: {}", timestamp));
        }

        let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
        let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
        let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
        let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
        }

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "#{} [{} --> {}] {}",
            self.seq_num,
            Self::format_timestamp(self.start_time_ms),
            Self::format_timestamp(self.end_time_ms),
            self.text.replace('\n', " / ")
        )
    }
}

/// Subtitle entries read from one file, in file order
#[derive(Debug)]
pub struct SubtitleCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// Name of the encoding the file was decoded with
    pub encoding: &'static str,

    /// List of subtitle entries
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleCollection {
    /// Read, decode and parse an SRT file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SubtitleError::NotFound(path.to_path_buf()));
        }

        let bytes = fs::read(path).map_err(|source| SubtitleError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let (content, encoding) = decode_subtitle_bytes(&bytes);
        debug!("Decoded {} as {}", path.display(), encoding.name());

        let entries = Self::parse_srt_string(&content);
        if entries.is_empty() {
            return Err(SubtitleError::NoEntries(path.to_path_buf()));
        }

        Ok(SubtitleCollection {
            source_file: path.to_path_buf(),
            encoding: encoding.name(),
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse SRT format string into subtitle entries.
    ///
    /// Entries keep their file order. Blocks with a broken timing line or no
    /// text are skipped with a warning. Text lines are only right-trimmed.
    pub fn parse_srt_string(content: &str) -> Vec<SubtitleEntry> {
        let mut entries = Vec::new();

        // State variables for parsing
        let mut current_seq_num: Option<usize> = None;
        let mut current_times: Option<(u64, u64)> = None;
        let mut current_text = String::new();

        for (line_idx, line) in content.lines().enumerate() {
            let line_count = line_idx + 1;
            let line = line.trim_start_matches('\u{feff}');
            let trimmed = line.trim();

            // A blank line closes the current block once its timing is known
            if trimmed.is_empty() {
                if let (Some(seq_num), Some(times)) = (current_seq_num, current_times) {
                    Self::finish_entry(&mut entries, seq_num, times, &mut current_text);
                    current_seq_num = None;
                    current_times = None;
                }
                continue;
            }

            // Sequence number opens a new block
            if current_seq_num.is_none() && current_times.is_none() {
                if let Ok(num) = trimmed.parse::<usize>() {
                    current_seq_num = Some(num);
                    continue;
                }
            }

            // Timing line; blocks without a sequence number are numbered by position
            if current_times.is_none() {
                if let Some(times) = Self::parse_timing_line(trimmed) {
                    current_times = Some(times);
                    if current_seq_num.is_none() {
                        current_seq_num = Some(entries.len() + 1);
                    }
                    continue;
                }

                if let Some(seq_num) = current_seq_num.take() {
                    warn!(
                        "Invalid timing line for subtitle {} at line {}: {}",
                        seq_num, line_count, trimmed
                    );
                } else {
                    warn!("Unexpected text at line {} before sequence number or timestamp: {}", line_count, trimmed);
                }
                continue;
            }

            if !current_text.is_empty() {
                current_text.push('\n');
            }
            current_text.push_str(line.trim_end());
        }

        // Add the last entry if there is one
        if let (Some(seq_num), Some(times)) = (current_seq_num, current_times) {
            Self::finish_entry(&mut entries, seq_num, times, &mut current_text);
        }

        entries
    }

    fn finish_entry(entries: &mut Vec<SubtitleEntry>, seq_num: usize, times: (u64, u64), text: &mut String) {
        if text.trim().is_empty() {
            warn!("Skipping empty subtitle entry {}", seq_num);
            text.clear();
        } else {
            entries.push(SubtitleEntry::new(seq_num, times.0, times.1, std::mem::take(text)));
        }
    }

    /// Start and end of a `start --> end` line, or `None` when it is not one
    fn parse_timing_line(line: &str) -> Option<(u64, u64)> {
        let caps = TIMESTAMP_REGEX.captures(line)?;
        let start = SubtitleEntry::parse_timestamp(&caps[1]).ok()?;
        let end = SubtitleEntry::parse_timestamp(&caps[2]).ok()?;
        Some((start, end))
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Encoding: {}", self.encoding)?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}

/// Decode raw subtitle bytes: BOM first, then strict UTF-8, then a guess
pub fn decode_subtitle_bytes(bytes: &[u8]) -> (Cow<'_, str>, &'static Encoding) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return (text, encoding);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return (Cow::Borrowed(text), encoding_rs::UTF_8);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!("Subtitle text contains bytes that are invalid in {}", encoding.name());
    }

    (text, encoding)
}
