//! Storage operations for flashcards
//!
//! The whole collection lives in a single JSON document:
//! ```text
//! {data_dir}/collection.json
//! {
//!   "decks":   [ ... ],
//!   "cards":   [ ... ],   # card content plus flattened memory state
//!   "reviews": [ ... ]    # append-only review log
//! }
//! ```
//! The document is loaded on open, mutated in memory and written back in
//! one piece by [`FlashcardStorage::save`]. Schedules read from disk are
//! repaired with [`CardMemoryState::normalize`], since the file may have been
//! edited by hand.
//!
//! Days are UTC calendar days: "today" in the statistics and the streak both
//! roll over at midnight UTC, whatever the user's local time zone.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::algorithm::schedule_card_at;
use super::models::*;

#[derive(Error, Debug)]
pub enum FlashcardStorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Deck not found: {0}")]
    DeckNotFound(Uuid),

    #[error("Card not found: {0}")]
    CardNotFound(Uuid),

    #[error("A deck named '{0}' already exists here")]
    DuplicateDeck(String),

    #[error("Deck {0} cannot be moved under its own sub-deck")]
    DeckCycle(Uuid),
}

pub type Result<T> = std::result::Result<T, FlashcardStorageError>;

/// Everything persisted for one user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(default)]
    pub decks: Vec<Deck>,
    #[serde(default)]
    pub cards: Vec<Flashcard>,
    #[serde(default)]
    pub reviews: Vec<ReviewRecord>,
}

/// Card store backed by a single JSON file
pub struct FlashcardStorage {
    path: PathBuf,
    collection: Collection,
}

impl FlashcardStorage {
    /// Load the collection at `path`, starting empty if the file does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut collection: Collection = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            Collection::default()
        };

        let repaired = collection
            .cards
            .iter_mut()
            .map(|card| card.memory.normalize())
            .filter(|&repaired| repaired)
            .count();
        if repaired > 0 {
            log::warn!("Repaired out-of-range schedules of {} card(s) in {:?}", repaired, path);
        }

        log::debug!(
            "Opened collection {:?} ({} decks, {} cards)",
            path,
            collection.decks.len(),
            collection.cards.len()
        );

        Ok(Self { path, collection })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Write the collection back to disk
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write to a sibling file first so a crash never leaves a truncated collection
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_string_pretty(&self.collection)?)?;
        fs::rename(&tmp_path, &self.path)?;

        log::debug!("Saved collection to {:?}", self.path);
        Ok(())
    }

    // ==================== Deck Operations ====================

    /// List all decks, parents before children, alphabetically within a level.
    ///
    /// Decks whose parent is missing are listed as top-level decks. Decks
    /// caught in a parent cycle come last, each listed once.
    pub fn list_decks(&self) -> Vec<Deck> {
        let known: HashSet<Uuid> = self.collection.decks.iter().map(|d| d.id).collect();
        let roots = self
            .collection
            .decks
            .iter()
            .filter(|d| d.parent_id.map_or(true, |p| !known.contains(&p)));

        let mut ordered = Vec::new();
        let mut visited = HashSet::new();
        for deck in sorted_by_name(roots) {
            self.collect_tree(deck, &mut visited, &mut ordered);
        }

        let stranded = self.collection.decks.iter().filter(|d| !visited.contains(&d.id));
        for deck in sorted_by_name(stranded) {
            self.collect_tree(deck, &mut visited, &mut ordered);
        }
        ordered
    }

    fn collect_tree(&self, deck: &Deck, visited: &mut HashSet<Uuid>, out: &mut Vec<Deck>) {
        if !visited.insert(deck.id) {
            return;
        }
        out.push(deck.clone());

        let children = self
            .collection
            .decks
            .iter()
            .filter(|d| d.parent_id == Some(deck.id));
        for child in sorted_by_name(children) {
            self.collect_tree(child, visited, out);
        }
    }

    /// Get a specific deck
    pub fn get_deck(&self, deck_id: Uuid) -> Result<Deck> {
        self.collection
            .decks
            .iter()
            .find(|d| d.id == deck_id)
            .cloned()
            .ok_or(FlashcardStorageError::DeckNotFound(deck_id))
    }

    /// Find a deck by name (case-insensitive). Accepts `Parent/Child` paths.
    pub fn find_deck_by_name(&self, name: &str) -> Option<Deck> {
        let mut parent_id = None;
        let mut found = None;
        for segment in name.split('/').map(str::trim).filter(|s| !s.is_empty()) {
            let segment = segment.to_lowercase();
            let deck = self
                .collection
                .decks
                .iter()
                .find(|d| d.parent_id == parent_id && d.name.to_lowercase() == segment)?;
            parent_id = Some(deck.id);
            found = Some(deck.clone());
        }
        found
    }

    /// Full `Parent/Child` path of a deck. The walk up stops at a missing
    /// parent or when it comes back to a deck it has already seen.
    pub fn deck_path(&self, deck_id: Uuid) -> Result<String> {
        let deck = self.get_deck(deck_id)?;
        let mut seen = HashSet::from([deck.id]);
        let mut current = deck.parent_id;
        let mut names = vec![deck.name];

        while let Some(id) = current {
            if !seen.insert(id) {
                break;
            }
            let Ok(parent) = self.get_deck(id) else {
                break;
            };
            names.push(parent.name);
            current = parent.parent_id;
        }
        names.reverse();
        Ok(names.join("/"))
    }

    /// Create a new deck, optionally nested under `parent_id`
    pub fn create_deck(
        &mut self,
        name: String,
        description: Option<String>,
        parent_id: Option<Uuid>,
    ) -> Result<Deck> {
        if let Some(parent) = parent_id {
            self.get_deck(parent)?;
        }
        self.ensure_unique_name(&name, parent_id, None)?;

        let mut deck = Deck::new(name, parent_id);
        deck.description = description;
        self.collection.decks.push(deck.clone());

        log::info!("Created deck '{}' ({})", deck.name, deck.id);
        Ok(deck)
    }

    /// Update a deck
    pub fn update_deck(&mut self, deck: &Deck) -> Result<()> {
        let pos = self
            .collection
            .decks
            .iter()
            .position(|d| d.id == deck.id)
            .ok_or(FlashcardStorageError::DeckNotFound(deck.id))?;

        if let Some(parent) = deck.parent_id {
            self.get_deck(parent)?;
            if self.deck_subtree(deck.id).contains(&parent) {
                return Err(FlashcardStorageError::DeckCycle(deck.id));
            }
        }
        self.ensure_unique_name(&deck.name, deck.parent_id, Some(deck.id))?;

        let mut updated = deck.clone();
        updated.updated_at = Utc::now();
        self.collection.decks[pos] = updated;
        Ok(())
    }

    /// Delete a deck, its sub-decks and all their cards
    pub fn delete_deck(&mut self, deck_id: Uuid) -> Result<usize> {
        self.get_deck(deck_id)?;
        let doomed = self.deck_subtree(deck_id);

        let card_ids: HashSet<Uuid> = self
            .collection
            .cards
            .iter()
            .filter(|c| doomed.contains(&c.deck_id))
            .map(|c| c.id)
            .collect();

        self.collection.cards.retain(|c| !card_ids.contains(&c.id));
        self.collection.reviews.retain(|r| !card_ids.contains(&r.card_id));
        self.collection.decks.retain(|d| !doomed.contains(&d.id));

        log::info!(
            "Deleted deck {} ({} decks, {} cards)",
            deck_id,
            doomed.len(),
            card_ids.len()
        );
        Ok(card_ids.len())
    }

    /// The deck itself plus every deck nested below it
    pub fn deck_subtree(&self, deck_id: Uuid) -> HashSet<Uuid> {
        let mut ids = HashSet::new();
        let mut pending = vec![deck_id];
        while let Some(id) = pending.pop() {
            if ids.insert(id) {
                pending.extend(
                    self.collection
                        .decks
                        .iter()
                        .filter(|d| d.parent_id == Some(id))
                        .map(|d| d.id),
                );
            }
        }
        ids
    }

    fn ensure_unique_name(&self, name: &str, parent_id: Option<Uuid>, except: Option<Uuid>) -> Result<()> {
        let lower = name.to_lowercase();
        let clash = self.collection.decks.iter().any(|d| {
            d.parent_id == parent_id && Some(d.id) != except && d.name.to_lowercase() == lower
        });
        if clash {
            return Err(FlashcardStorageError::DuplicateDeck(name.to_string()));
        }
        Ok(())
    }

    // ==================== Card Operations ====================

    /// List cards in a deck, including sub-decks when `recursive` is set
    pub fn list_cards(&self, deck_id: Uuid, recursive: bool) -> Result<Vec<Flashcard>> {
        self.get_deck(deck_id)?;
        let decks = if recursive {
            self.deck_subtree(deck_id)
        } else {
            HashSet::from([deck_id])
        };

        Ok(self
            .collection
            .cards
            .iter()
            .filter(|c| decks.contains(&c.deck_id))
            .cloned()
            .collect())
    }

    /// List all cards in the collection
    pub fn list_all_cards(&self) -> Vec<Flashcard> {
        self.collection.cards.clone()
    }

    /// Get a specific card
    pub fn get_card(&self, card_id: Uuid) -> Result<Flashcard> {
        self.collection
            .cards
            .iter()
            .find(|c| c.id == card_id)
            .cloned()
            .ok_or(FlashcardStorageError::CardNotFound(card_id))
    }

    /// Resolve a card from a full id or an unambiguous id prefix
    pub fn find_card_by_prefix(&self, prefix: &str) -> Option<Flashcard> {
        let prefix = prefix.trim().to_lowercase();
        if prefix.is_empty() {
            return None;
        }
        let mut matches = self
            .collection
            .cards
            .iter()
            .filter(|c| c.id.to_string().starts_with(&prefix));
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(first.clone())
    }

    /// Create a new card in its initial `new` state, due at `now`
    pub fn create_card(
        &mut self,
        deck_id: Uuid,
        front: String,
        back: String,
        tags: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<Flashcard> {
        self.get_deck(deck_id)?;

        let mut card = Flashcard::new(deck_id, front, back, now);
        card.tags = tags;
        self.collection.cards.push(card.clone());

        log::debug!("Created card {} in deck {}", card.id, deck_id);
        Ok(card)
    }

    /// Insert a fully-formed card, keeping its memory state
    pub fn insert_card(&mut self, card: Flashcard) -> Result<()> {
        self.get_deck(card.deck_id)?;
        self.collection.cards.push(card);
        Ok(())
    }

    /// Change the content of a card. Scheduling state is left untouched.
    pub fn update_card_content(
        &mut self,
        card_id: Uuid,
        front: Option<String>,
        back: Option<String>,
        tags: Option<Vec<String>>,
    ) -> Result<Flashcard> {
        let card = self.card_mut(card_id)?;
        if let Some(front) = front {
            card.front = front;
        }
        if let Some(back) = back {
            card.back = back;
        }
        if let Some(tags) = tags {
            card.tags = tags;
        }
        card.updated_at = Utc::now();
        Ok(card.clone())
    }

    /// Move a card to another deck
    pub fn move_card(&mut self, card_id: Uuid, deck_id: Uuid) -> Result<Flashcard> {
        self.get_deck(deck_id)?;
        let card = self.card_mut(card_id)?;
        card.deck_id = deck_id;
        card.updated_at = Utc::now();
        Ok(card.clone())
    }

    /// Delete a card and its review history
    pub fn delete_card(&mut self, card_id: Uuid) -> Result<()> {
        let before = self.collection.cards.len();
        self.collection.cards.retain(|c| c.id != card_id);
        if self.collection.cards.len() == before {
            return Err(FlashcardStorageError::CardNotFound(card_id));
        }
        self.collection.reviews.retain(|r| r.card_id != card_id);

        log::debug!("Deleted card {}", card_id);
        Ok(())
    }

    /// Forget all progress on a card, making it new and due at `now`
    pub fn reset_card(&mut self, card_id: Uuid, now: DateTime<Utc>) -> Result<Flashcard> {
        let card = self.card_mut(card_id)?;
        card.memory = CardMemoryState::new(now);
        card.updated_at = now;
        Ok(card.clone())
    }

    fn card_mut(&mut self, card_id: Uuid) -> Result<&mut Flashcard> {
        self.collection
            .cards
            .iter_mut()
            .find(|c| c.id == card_id)
            .ok_or(FlashcardStorageError::CardNotFound(card_id))
    }

    // ==================== Review Operations ====================

    /// Cards due at `now` (optionally within a deck and its sub-decks), oldest first
    pub fn get_due_cards(&self, deck_id: Option<Uuid>, now: DateTime<Utc>) -> Result<Vec<Flashcard>> {
        let cards = match deck_id {
            Some(id) => self.list_cards(id, true)?,
            None => self.list_all_cards(),
        };

        let mut due_cards: Vec<Flashcard> = cards
            .into_iter()
            .filter(|c| c.memory.is_due(now))
            .collect();

        due_cards.sort_by(|a, b| {
            a.memory
                .due_date
                .cmp(&b.memory.due_date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        Ok(due_cards)
    }

    /// Apply a rating to a card, record it in the review log and return the updated card
    pub fn submit_review(&mut self, card_id: Uuid, rating: Rating, now: DateTime<Utc>) -> Result<Flashcard> {
        let card = self.card_mut(card_id)?;
        card.memory = schedule_card_at(&card.memory, rating, now);
        let updated = card.clone();

        self.collection
            .reviews
            .push(ReviewRecord::new(card_id, rating, &updated.memory, now));

        log::debug!(
            "Reviewed card {} as {}: {} day(s), ease {:.2}, {}",
            card_id,
            rating,
            updated.memory.interval,
            updated.memory.ease,
            updated.memory.status
        );
        Ok(updated)
    }

    /// Undo the latest [`submit_review`](Self::submit_review) of a card: put
    /// back its previous memory state and drop its last review record
    pub fn revert_review(&mut self, card_id: Uuid, previous: CardMemoryState) -> Result<()> {
        let card = self.card_mut(card_id)?;
        card.memory = previous;

        if let Some(pos) = self.collection.reviews.iter().rposition(|r| r.card_id == card_id) {
            self.collection.reviews.remove(pos);
        }
        log::debug!("Reverted last review of card {}", card_id);
        Ok(())
    }

    /// Review history of a single card, oldest first
    pub fn card_reviews(&self, card_id: Uuid) -> Vec<ReviewRecord> {
        self.collection
            .reviews
            .iter()
            .filter(|r| r.card_id == card_id)
            .cloned()
            .collect()
    }

    /// Get review statistics (optionally filtered by deck and its sub-decks)
    pub fn get_review_stats(&self, deck_id: Option<Uuid>, now: DateTime<Utc>) -> Result<ReviewStats> {
        let cards = match deck_id {
            Some(id) => self.list_cards(id, true)?,
            None => self.list_all_cards(),
        };

        let mut stats = ReviewStats {
            total_cards: cards.len(),
            ..ReviewStats::default()
        };

        for card in &cards {
            match card.memory.status {
                CardStatus::New => stats.new_cards += 1,
                CardStatus::Learning => stats.learning_cards += 1,
                CardStatus::Review => stats.review_cards += 1,
            }
            if card.memory.is_due(now) {
                stats.due_cards += 1;
            }
        }

        let card_ids: HashSet<Uuid> = cards.iter().map(|c| c.id).collect();
        // UTC calendar day
        let today = now.date_naive();
        let mut review_days = HashSet::new();

        for review in self.collection.reviews.iter().filter(|r| card_ids.contains(&r.card_id)) {
            let day = review.reviewed_at.date_naive();
            review_days.insert(day);
            if day == today {
                stats.reviews_today += 1;
                if review.rating != Rating::Again {
                    stats.correct_today += 1;
                }
            }
        }

        stats.streak_days = streak_ending(today, &review_days);
        Ok(stats)
    }
}

fn sorted_by_name<'a>(decks: impl Iterator<Item = &'a Deck>) -> Vec<&'a Deck> {
    let mut decks: Vec<&Deck> = decks.collect();
    decks.sort_by_key(|d| d.name.to_lowercase());
    decks
}

/// Consecutive UTC days with at least one review, ending today
fn streak_ending(today: NaiveDate, days: &HashSet<NaiveDate>) -> u32 {
    let mut streak = 0;
    let mut day = today;
    while days.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}
