/*!
 * `.apkg` package writer.
 *
 * A package is a zip archive holding `collection.anki2`, an SQLite
 * collection in schema version 11, and a `media` index. The collection is
 * built in a scratch directory, zipped into a temporary file next to the
 * output and renamed into place, so a failed write leaves no partial file.
 */

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use log::{debug, info};
use rusqlite::{Connection, params};
use serde_json::{Map, Value, json};
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::deck::{Deck, Model, field_checksum};
use crate::errors::PackageError;

const COLLECTION_FILENAME: &str = "collection.anki2";
const MEDIA_FILENAME: &str = "media";

// Id of the built-in "Default" deck
pub const DEFAULT_DECK_ID: u32 = 1;

// Unit separator between note fields
const FIELD_SEPARATOR: &str = "\x1f";

const COLLECTION_SCHEMA: &str = r#"
CREATE TABLE col (
    id              integer primary key,
    crt             integer not null,
    mod             integer not null,
    scm             integer not null,
    ver             integer not null,
    dty             integer not null,
    usn             integer not null,
    ls              integer not null,
    conf            text not null,
    models          text not null,
    decks           text not null,
    dconf           text not null,
    tags            text not null
);
CREATE TABLE notes (
    id              integer primary key,
    guid            text not null,
    mid             integer not null,
    mod             integer not null,
    usn             integer not null,
    tags            text not null,
    flds            text not null,
    sfld            integer not null,
    csum            integer not null,
    flags           integer not null,
    data            text not null
);
CREATE TABLE cards (
    id              integer primary key,
    nid             integer not null,
    did             integer not null,
    ord             integer not null,
    mod             integer not null,
    usn             integer not null,
    type            integer not null,
    queue           integer not null,
    due             integer not null,
    ivl             integer not null,
    factor          integer not null,
    reps            integer not null,
    lapses          integer not null,
    left            integer not null,
    odue            integer not null,
    odid            integer not null,
    flags           integer not null,
    data            text not null
);
CREATE TABLE revlog (
    id              integer primary key,
    cid             integer not null,
    usn             integer not null,
    ease            integer not null,
    ivl             integer not null,
    lastIvl         integer not null,
    factor          integer not null,
    time            integer not null,
    type            integer not null
);
CREATE TABLE graves (
    usn             integer not null,
    oid             integer not null,
    type            integer not null
);
CREATE INDEX ix_notes_usn on notes (usn);
CREATE INDEX ix_cards_usn on cards (usn);
CREATE INDEX ix_revlog_usn on revlog (usn);
CREATE INDEX ix_cards_nid on cards (nid);
CREATE INDEX ix_cards_sched on cards (did, queue, due);
CREATE INDEX ix_revlog_cid on revlog (cid);
CREATE INDEX ix_notes_csum on notes (csum);
"#;

const LATEX_PRE: &str = "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage[utf8]{inputenc}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n";
const LATEX_POST: &str = "\\end{document}";

/// Collection-wide settings of a fresh collection
fn default_conf() -> Value {
    json!({
        "activeDecks": [1],
        "addToCur": true,
        "collapseTime": 1200,
        "curDeck": 1,
        "curModel": "1425279151691",
        "dueCounts": true,
        "estTimes": true,
        "newBury": true,
        "newSpread": 0,
        "nextPos": 1,
        "sortBackwards": false,
        "sortType": "noteFld",
        "timeLim": 0
    })
}

/// The built-in "Default" deck every collection carries
fn default_decks() -> Map<String, Value> {
    let mut decks = Map::new();
    decks.insert(
        DEFAULT_DECK_ID.to_string(),
        json!({
            "collapsed": false,
            "conf": 1,
            "desc": "",
            "dyn": 0,
            "extendNew": 10,
            "extendRev": 50,
            "id": 1,
            "lrnToday": [0, 0],
            "mod": 1425279151,
            "name": "Default",
            "newToday": [0, 0],
            "revToday": [0, 0],
            "timeToday": [0, 0],
            "usn": 0
        }),
    );
    decks
}

fn default_deck_config() -> Value {
    json!({
        "1": {
            "autoplay": true,
            "id": 1,
            "lapse": {"delays": [10], "leechAction": 0, "leechFails": 8, "minInt": 1, "mult": 0},
            "maxTaken": 60,
            "mod": 0,
            "name": "Default",
            "new": {
                "bury": true,
                "delays": [1, 10],
                "initialFactor": 2500,
                "ints": [1, 4, 7],
                "order": 1,
                "perDay": 20,
                "separate": true
            },
            "replayq": true,
            "rev": {"bury": true, "ease4": 1.3, "fuzz": 0.05, "ivlFct": 1, "maxIvl": 36500, "minSpace": 1, "perDay": 100},
            "timer": 0,
            "usn": 0
        }
    })
}

fn deck_json(deck: &Deck, modified: i64) -> Value {
    json!({
        "collapsed": false,
        "conf": 1,
        "desc": deck.description,
        "dyn": 0,
        "extendNew": 0,
        "extendRev": 50,
        "id": deck.id,
        "lrnToday": [0, 0],
        "mod": modified,
        "name": deck.name,
        "newToday": [0, 0],
        "revToday": [0, 0],
        "timeToday": [0, 0],
        "usn": -1
    })
}

fn model_json(model: &Model, deck_id: u32, modified: i64) -> Value {
    let fields: Vec<Value> = model
        .fields
        .iter()
        .enumerate()
        .map(|(ord, name)| {
            json!({
                "font": "Liberation Sans",
                "media": [],
                "name": name,
                "ord": ord,
                "rtl": false,
                "size": 20,
                "sticky": false
            })
        })
        .collect();

    let templates: Vec<Value> = model
        .templates
        .iter()
        .enumerate()
        .map(|(ord, tmpl)| {
            json!({
                "afmt": tmpl.answer_format,
                "bafmt": "",
                "bqfmt": "",
                "did": null,
                "name": tmpl.name,
                "ord": ord,
                "qfmt": tmpl.question_format
            })
        })
        .collect();

    // Each template needs the first field to produce a card
    let req: Vec<Value> = (0..model.templates.len())
        .map(|ord| json!([ord, "any", [0]]))
        .collect();

    json!({
        "css": model.css,
        "did": deck_id,
        "flds": fields,
        "id": model.id.to_string(),
        "latexPost": LATEX_POST,
        "latexPre": LATEX_PRE,
        "latexsvg": false,
        "mod": modified,
        "name": model.name,
        "req": req,
        "sortf": 0,
        "tags": [],
        "tmpls": templates,
        "type": 0,
        "usn": -1,
        "vers": []
    })
}

/// Build the collection database for `deck` at `db_path`
fn build_collection(deck: &Deck, db_path: &Path) -> Result<(), PackageError> {
    if deck.id == DEFAULT_DECK_ID {
        return Err(PackageError::ReservedDeckId(deck.id));
    }

    let model = &deck.model;
    for (index, note) in deck.notes().iter().enumerate() {
        if note.fields.len() != model.fields.len() {
            return Err(PackageError::FieldMismatch {
                index,
                found: note.fields.len(),
                expected: model.fields.len(),
                model: model.name.clone(),
            });
        }
    }

    let now = Utc::now();
    let modified = now.timestamp();
    let mut next_id = now.timestamp_millis();

    let mut decks = default_decks();
    decks.insert(deck.id.to_string(), deck_json(deck, modified));
    let mut models = Map::new();
    models.insert(model.id.to_string(), model_json(model, deck.id, modified));

    let mut conn = Connection::open(db_path)?;
    conn.execute_batch(COLLECTION_SCHEMA)?;

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO col VALUES(NULL, 1411124400, 1425279151694, 1425279151690, 11, 0, 0, 0, ?1, ?2, ?3, ?4, '{}')",
        params![
            serde_json::to_string(&default_conf())?,
            serde_json::to_string(&Value::Object(models))?,
            serde_json::to_string(&Value::Object(decks))?,
            serde_json::to_string(&default_deck_config())?,
        ],
    )?;

    {
        let mut insert_note = tx.prepare(
            "INSERT INTO notes VALUES(?1, ?2, ?3, ?4, -1, ?5, ?6, ?7, ?8, 0, '')",
        )?;
        let mut insert_card = tx.prepare(
            "INSERT INTO cards VALUES(?1, ?2, ?3, ?4, ?5, -1, 0, 0, ?6, 0, 0, 0, 0, 0, 0, 0, 0, '')",
        )?;

        for (ordinal, note) in deck.notes().iter().enumerate() {
            let note_id = next_id;
            next_id += 1;

            let tags = if note.tags.is_empty() {
                String::new()
            } else {
                format!(" {} ", note.tags.join(" "))
            };

            insert_note.execute(params![
                note_id,
                note.guid,
                model.id,
                modified,
                tags,
                note.fields.join(FIELD_SEPARATOR),
                note.sort_field(),
                field_checksum(note.sort_field()),
            ])?;

            for ord in 0..model.templates.len() {
                insert_card.execute(params![
                    next_id,
                    note_id,
                    deck.id,
                    ord as i64,
                    modified,
                    ordinal as i64,
                ])?;
                next_id += 1;
            }
        }
    }

    tx.commit()?;
    conn.close().map_err(|(_, e)| PackageError::Database(e))?;
    Ok(())
}

/// Write `deck` as an `.apkg` file at `output`.
///
/// The file appears only once it is complete; an existing file is replaced.
pub fn write_package(deck: &Deck, output: &Path) -> Result<(), PackageError> {
    let scratch = tempfile::tempdir()?;
    let db_path = scratch.path().join(COLLECTION_FILENAME);
    build_collection(deck, &db_path)?;
    let collection = fs::read(&db_path)?;
    debug!("Collection for deck '{}' is {} bytes", deck.name, collection.len());

    let out_dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(out_dir)?;

    {
        let mut zip = ZipWriter::new(tmp.as_file_mut());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file(COLLECTION_FILENAME, options)?;
        zip.write_all(&collection)?;

        zip.start_file(MEDIA_FILENAME, options)?;
        zip.write_all(b"{}")?;

        zip.finish()?;
    }

    tmp.as_file().sync_all()?;
    tmp.persist(output).map_err(|e| PackageError::Io(e.error))?;

    info!(
        "Wrote {} notes of deck '{}' (id {}) to {}",
        deck.len(),
        deck.name,
        deck.id,
        output.display()
    );
    Ok(())
}
