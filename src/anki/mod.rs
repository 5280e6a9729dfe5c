/*!
 * Anki deck building and packaging.
 *
 * - `deck`: deck, note and model types plus deterministic identifiers
 * - `package`: `.apkg` serialization
 */

pub mod deck;
pub mod package;

pub use deck::{CardTemplate, Deck, Model, Note, deck_id_from_name, guid_for};
pub use package::write_package;
