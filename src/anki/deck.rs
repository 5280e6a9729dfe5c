/*!
 * In-memory deck model.
 *
 * A `Deck` owns its notes in insertion order. Identifiers and note GUIDs are
 * derived deterministically so re-importing a rebuilt deck updates the
 * existing notes in Anki instead of duplicating them.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use sha1::{Digest as _, Sha1};
use sha2::Sha256;

use crate::app_config::DeckConfig;

/// Alphabet Anki uses for note GUIDs
const BASE91_TABLE: &[u8; 91] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!#$%&()*+,-./:;<=>?@[]^_`{|}~";

static HTML_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid"));

/// Derive a deck id from its display name.
///
/// SHA-1 of the UTF-8 name read as a big-endian integer, modulo 2^32.
pub fn deck_id_from_name(name: &str) -> u32 {
    let digest = Sha1::digest(name.as_bytes());
    u32::from_be_bytes([digest[16], digest[17], digest[18], digest[19]])
}

/// Anki-compatible GUID for a set of field values
pub fn guid_for(fields: &[&str]) -> String {
    let joined = fields.join("__");
    let digest = Sha256::digest(joined.as_bytes());

    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    let mut value = u64::from_be_bytes(head);

    let mut reversed = Vec::new();
    while value > 0 {
        reversed.push(BASE91_TABLE[(value % 91) as usize]);
        value /= 91;
    }
    reversed.iter().rev().map(|&b| b as char).collect()
}

/// Duplicate-detection checksum of a note's first field
pub fn field_checksum(field: &str) -> i64 {
    let stripped = HTML_TAG_REGEX.replace_all(field, "");
    let digest = Sha1::digest(stripped.as_bytes());
    i64::from(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}

/// Card template of a model
#[derive(Debug, Clone, PartialEq)]
pub struct CardTemplate {
    pub name: String,
    pub question_format: String,
    pub answer_format: String,
}

/// Note type: field names, card templates and styling
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub id: i64,
    pub name: String,
    pub fields: Vec<String>,
    pub templates: Vec<CardTemplate>,
    pub css: String,
}

impl Model {
    /// Two-field question/answer model
    pub fn question_answer(config: &DeckConfig) -> Self {
        Self {
            id: config.model_id,
            name: config.model_name.clone(),
            fields: vec!["Question".to_string(), "Answer".to_string()],
            templates: vec![CardTemplate {
                name: "Card 1".to_string(),
                question_format: "{{Question}}".to_string(),
                answer_format: "{{FrontSide}}<hr id=\"answer\">{{Answer}}".to_string(),
            }],
            css: config.css.clone(),
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::question_answer(&DeckConfig::default())
    }
}

/// One flashcard note
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub fields: Vec<String>,
    pub guid: String,
    pub tags: Vec<String>,
}

impl Note {
    pub fn new(fields: Vec<String>) -> Self {
        let refs: Vec<&str> = fields.iter().map(String::as_str).collect();
        let guid = guid_for(&refs);
        Self {
            fields,
            guid,
            tags: Vec::new(),
        }
    }

    /// Note with the source line as question and its translation as answer
    pub fn question_answer(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self::new(vec![question.into(), answer.into()])
    }

    /// Sort field shown in the browser
    pub fn sort_field(&self) -> &str {
        self.fields.first().map(String::as_str).unwrap_or_default()
    }
}

/// Deck of notes sharing one model
#[derive(Debug, Clone)]
pub struct Deck {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub model: Model,
    notes: Vec<Note>,
}

impl Deck {
    /// Create a deck; the id is derived from the name when not given
    pub fn new(name: impl Into<String>, id: Option<u32>, model: Model) -> Self {
        let name = name.into();
        let id = id.unwrap_or_else(|| deck_id_from_name(&name));
        Self {
            id,
            name,
            description: String::new(),
            model,
            notes: Vec::new(),
        }
    }

    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
