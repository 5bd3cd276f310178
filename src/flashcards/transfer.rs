//! Import and export of decks
//!
//! Two formats are supported:
//! - JSON: one deck with its cards and their scheduling state
//! - TSV: `front<TAB>back[<TAB>tags]` per line, tags separated by spaces.
//!   Lines starting with `#` are comments. Imported cards start as new.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::models::{CardMemoryState, Flashcard};
use super::storage::{FlashcardStorage, FlashcardStorageError};

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Line {line}: expected at least front and back separated by a tab")]
    MalformedRow { line: u64 },

    #[error(transparent)]
    Storage(#[from] FlashcardStorageError),
}

pub type Result<T> = std::result::Result<T, TransferError>;

/// Serialized form of a deck
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckExport {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub cards: Vec<CardExport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardExport {
    pub front: String,
    pub back: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Scheduling state; cards without one are imported as new
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<CardMemoryState>,
}

impl From<&Flashcard> for CardExport {
    fn from(card: &Flashcard) -> Self {
        Self {
            front: card.front.clone(),
            back: card.back.clone(),
            tags: card.tags.clone(),
            memory: Some(card.memory.clone()),
        }
    }
}

/// Outcome of an import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub deck_id: Uuid,
    pub imported: usize,
}

// ==================== JSON ====================

/// Export a deck (and optionally its sub-decks' cards) as pretty JSON
pub fn export_deck_json(storage: &FlashcardStorage, deck_id: Uuid, recursive: bool) -> Result<String> {
    let deck = storage.get_deck(deck_id)?;
    let cards = storage.list_cards(deck_id, recursive)?;

    let export = DeckExport {
        name: deck.name,
        description: deck.description,
        cards: cards.iter().map(CardExport::from).collect(),
    };
    Ok(serde_json::to_string_pretty(&export)?)
}

/// Import a JSON deck export as a new deck under `parent_id`
pub fn import_deck_json(
    storage: &mut FlashcardStorage,
    content: &str,
    parent_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<ImportSummary> {
    let export: DeckExport = serde_json::from_str(content)?;
    let deck = storage.create_deck(export.name, export.description, parent_id)?;

    let imported = export.cards.len();
    for exported in export.cards {
        let mut card = Flashcard::new(deck.id, exported.front, exported.back, now);
        card.tags = exported.tags;
        if let Some(mut memory) = exported.memory {
            if memory.normalize() {
                log::warn!("Repaired out-of-range schedule of imported card '{}'", card.front);
            }
            card.memory = memory;
        }
        storage.insert_card(card)?;
    }

    log::info!("Imported {} card(s) into new deck '{}'", imported, deck.name);
    Ok(ImportSummary {
        deck_id: deck.id,
        imported,
    })
}

// ==================== TSV ====================

/// Export the cards of a deck as TSV
pub fn export_deck_tsv(storage: &FlashcardStorage, deck_id: Uuid, recursive: bool) -> Result<String> {
    let cards = storage.list_cards(deck_id, recursive)?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_writer(Vec::new());

    for card in &cards {
        if card.tags.is_empty() {
            writer.write_record([card.front.as_str(), card.back.as_str()])?;
        } else {
            let tags = card.tags.join(" ");
            writer.write_record([card.front.as_str(), card.back.as_str(), tags.as_str()])?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TransferError::Csv(csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Import TSV rows into an existing deck. Nothing is added if any row is malformed.
pub fn import_tsv(
    storage: &mut FlashcardStorage,
    deck_id: Uuid,
    content: &str,
    now: DateTime<Utc>,
) -> Result<ImportSummary> {
    storage.get_deck(deck_id)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());

        let front = record.get(0).map(str::trim).unwrap_or_default();
        let back = record.get(1).map(str::trim).unwrap_or_default();
        if front.is_empty() || back.is_empty() {
            return Err(TransferError::MalformedRow { line });
        }

        let tags: Vec<String> = record
            .get(2)
            .map(|t| t.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        rows.push((front.to_string(), back.to_string(), tags));
    }

    let imported = rows.len();
    for (front, back, tags) in rows {
        storage.create_card(deck_id, front, back, tags, now)?;
    }

    log::info!("Imported {} card(s) from TSV into deck {}", imported, deck_id);
    Ok(ImportSummary { deck_id, imported })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::algorithm::MIN_EASE;
    use crate::flashcards::models::{CardStatus, Rating};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap()
    }

    fn create_test_storage() -> (FlashcardStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FlashcardStorage::open(temp_dir.path().join("collection.json")).unwrap();
        (storage, temp_dir)
    }

    #[test]
    fn test_tsv_import_with_tags_and_comments() {
        let (mut storage, _temp) = create_test_storage();
        let deck = storage.create_deck("Capitals".to_string(), None, None).unwrap();

        let tsv = "# capitals\nFrance\tParis\tgeo europe\nJapan\tTokyo\n\nPeru\tLima\n";
        let summary = import_tsv(&mut storage, deck.id, tsv, now()).unwrap();
        assert_eq!(summary.imported, 3);

        let cards = storage.list_cards(deck.id, false).unwrap();
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].front, "France");
        assert_eq!(cards[0].back, "Paris");
        assert_eq!(cards[0].tags, vec!["geo", "europe"]);
        assert!(cards[1].tags.is_empty());
        assert!(cards.iter().all(|c| c.memory.status == CardStatus::New));
    }

    #[test]
    fn test_tsv_import_rejects_malformed_row() {
        let (mut storage, _temp) = create_test_storage();
        let deck = storage.create_deck("Bad".to_string(), None, None).unwrap();

        let tsv = "one\tuno\ntwo without tab\n";
        let result = import_tsv(&mut storage, deck.id, tsv, now());
        assert!(matches!(result, Err(TransferError::MalformedRow { line: 2 })));
        assert!(storage.list_cards(deck.id, false).unwrap().is_empty());
    }

    #[test]
    fn test_tsv_export_quotes_embedded_tabs() {
        let (mut storage, _temp) = create_test_storage();
        let deck = storage.create_deck("Out".to_string(), None, None).unwrap();
        storage
            .create_card(deck.id, "a\tb".to_string(), "c".to_string(), vec!["t1".to_string()], now())
            .unwrap();

        let tsv = export_deck_tsv(&storage, deck.id, false).unwrap();
        assert_eq!(tsv, "\"a\tb\"\tc\tt1\n");

        let other = storage.create_deck("In".to_string(), None, None).unwrap();
        import_tsv(&mut storage, other.id, &tsv, now()).unwrap();
        let cards = storage.list_cards(other.id, false).unwrap();
        assert_eq!(cards[0].front, "a\tb");
        assert_eq!(cards[0].tags, vec!["t1"]);
    }

    #[test]
    fn test_json_export_keeps_schedule() {
        let (mut storage, _temp) = create_test_storage();
        let deck = storage.create_deck("Source".to_string(), None, None).unwrap();
        let card = storage
            .create_card(deck.id, "q".to_string(), "a".to_string(), Vec::new(), now())
            .unwrap();
        storage.submit_review(card.id, Rating::Easy, now()).unwrap();

        let json = export_deck_json(&storage, deck.id, false).unwrap();
        storage.delete_deck(deck.id).unwrap();

        let summary = import_deck_json(&mut storage, &json, None, now()).unwrap();
        assert_eq!(summary.imported, 1);

        let imported = storage.list_cards(summary.deck_id, false).unwrap();
        assert_eq!(imported[0].memory.interval, 4);
        assert_eq!(imported[0].memory.status, CardStatus::Learning);
        assert_ne!(imported[0].id, card.id);
        assert_eq!(storage.get_deck(summary.deck_id).unwrap().name, "Source");
    }

    #[test]
    fn test_json_import_without_memory_starts_new() {
        let (mut storage, _temp) = create_test_storage();
        let json = r#"{"name": "Plain", "cards": [{"front": "x", "back": "y"}]}"#;

        let summary = import_deck_json(&mut storage, json, None, now()).unwrap();
        let cards = storage.list_cards(summary.deck_id, false).unwrap();
        assert_eq!(cards[0].memory.status, CardStatus::New);
        assert_eq!(cards[0].memory.due_date, now());
    }

    #[test]
    fn test_json_import_repairs_invalid_memory() {
        let (mut storage, _temp) = create_test_storage();
        let content = r#"{"name":"X","cards":[{"front":"a","back":"b","memory":{"interval":5,"ease":0.4,"status":"new","dueDate":0}}]}"#;

        let summary = import_deck_json(&mut storage, content, None, now()).unwrap();
        let cards = storage.list_cards(summary.deck_id, false).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].memory.ease, MIN_EASE);
        assert_eq!(cards[0].memory.interval, 0);
        assert_eq!(cards[0].memory.status, CardStatus::New);
        assert_eq!(cards[0].memory.due_date.timestamp_millis(), 0);
    }

    #[test]
    fn test_json_import_duplicate_deck_name() {
        let (mut storage, _temp) = create_test_storage();
        storage.create_deck("Plain".to_string(), None, None).unwrap();
        let json = r#"{"name": "Plain", "cards": []}"#;

        let result = import_deck_json(&mut storage, json, None, now());
        assert!(matches!(
            result,
            Err(TransferError::Storage(FlashcardStorageError::DuplicateDeck(_)))
        ));
    }
}
