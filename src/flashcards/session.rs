//! Study sessions
//!
//! A session draws the due cards once when it starts, then presents them one
//! at a time. Each answer goes through the scheduler, is persisted, and the
//! next card is drawn. Cards rated `again` are due immediately and go to the
//! back of the queue. An answer that cannot be saved is rolled back and the
//! card stays in front.
//!
//! Daily caps count the work done on the current UTC calendar day, within
//! the deck being studied and its sub-decks.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::models::{CardStatus, Flashcard, Rating};
use super::storage::{FlashcardStorage, FlashcardStorageError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(#[from] FlashcardStorageError),

    #[error("No cards left in this study session")]
    Finished,
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Daily caps on how many cards a session may present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLimits {
    pub new_cards_per_day: u32,
    pub reviews_per_day: u32,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            new_cards_per_day: 20,
            reviews_per_day: 100,
        }
    }
}

/// Ratings given during a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub again: usize,
    pub hard: usize,
    pub good: usize,
    pub easy: usize,
}

impl SessionSummary {
    pub fn total(&self) -> usize {
        self.again + self.hard + self.good + self.easy
    }

    fn record(&mut self, rating: Rating) {
        match rating {
            Rating::Again => self.again += 1,
            Rating::Hard => self.hard += 1,
            Rating::Good => self.good += 1,
            Rating::Easy => self.easy += 1,
        }
    }
}

pub struct StudySession {
    deck_id: Option<Uuid>,
    queue: VecDeque<Uuid>,
    summary: SessionSummary,
}

impl StudySession {
    /// Build the queue for `deck_id` (or the whole collection).
    ///
    /// Learning and review cards come first, oldest due date first, followed
    /// by new cards. Deck overrides replace the given limits, and cards
    /// already studied today count against them.
    pub fn start(
        storage: &FlashcardStorage,
        deck_id: Option<Uuid>,
        limits: SessionLimits,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let limits = match deck_id {
            Some(id) => {
                let deck = storage.get_deck(id)?;
                SessionLimits {
                    new_cards_per_day: deck.new_cards_per_day.unwrap_or(limits.new_cards_per_day),
                    reviews_per_day: deck.reviews_per_day.unwrap_or(limits.reviews_per_day),
                }
            }
            None => limits,
        };

        let (new_done, reviews_done) = studied_today(storage, deck_id, now)?;
        let new_budget = limits.new_cards_per_day.saturating_sub(new_done) as usize;
        let review_budget = limits.reviews_per_day.saturating_sub(reviews_done) as usize;

        let (new_cards, seen_cards): (Vec<Flashcard>, Vec<Flashcard>) = storage
            .get_due_cards(deck_id, now)?
            .into_iter()
            .partition(|c| c.memory.status == CardStatus::New);

        let queue: VecDeque<Uuid> = seen_cards
            .iter()
            .take(review_budget)
            .chain(new_cards.iter().take(new_budget))
            .map(|c| c.id)
            .collect();

        log::info!(
            "Started study session with {} card(s) ({} due, {} new available)",
            queue.len(),
            seen_cards.len(),
            new_cards.len()
        );

        Ok(Self {
            deck_id,
            queue,
            summary: SessionSummary::default(),
        })
    }

    pub fn deck_id(&self) -> Option<Uuid> {
        self.deck_id
    }

    /// Id of the card being presented
    pub fn current_id(&self) -> Option<Uuid> {
        self.queue.front().copied()
    }

    /// The card being presented, as currently stored
    pub fn current(&self, storage: &FlashcardStorage) -> Result<Option<Flashcard>> {
        match self.current_id() {
            Some(id) => Ok(Some(storage.get_card(id)?)),
            None => Ok(None),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn is_finished(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    /// Rate the current card, persist the collection and advance
    pub fn answer(
        &mut self,
        storage: &mut FlashcardStorage,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<Flashcard> {
        let card_id = self.current_id().ok_or(SessionError::Finished)?;
        let previous = storage.get_card(card_id)?.memory;

        let updated = storage.submit_review(card_id, rating, now)?;
        if let Err(e) = storage.save() {
            log::warn!("Could not save review of card {}, rolling back: {}", card_id, e);
            storage.revert_review(card_id, previous)?;
            return Err(e.into());
        }

        self.queue.pop_front();
        self.summary.record(rating);
        if rating == Rating::Again {
            self.queue.push_back(card_id);
        }

        if self.queue.is_empty() {
            log::info!("Study session finished after {} answer(s)", self.summary.total());
        }
        Ok(updated)
    }
}

/// `(new cards introduced, reviews of older cards)` on the UTC day of `now`,
/// limited to the cards of `deck_id` and its sub-decks when given
fn studied_today(storage: &FlashcardStorage, deck_id: Option<Uuid>, now: DateTime<Utc>) -> Result<(u32, u32)> {
    let scope: Option<HashSet<Uuid>> = match deck_id {
        Some(id) => Some(storage.list_cards(id, true)?.iter().map(|c| c.id).collect()),
        None => None,
    };
    let in_scope = |card_id: &Uuid| scope.as_ref().map_or(true, |ids| ids.contains(card_id));

    let today = now.date_naive();
    let mut first_review: HashMap<Uuid, DateTime<Utc>> = HashMap::new();
    for review in &storage.collection().reviews {
        first_review
            .entry(review.card_id)
            .and_modify(|t| *t = (*t).min(review.reviewed_at))
            .or_insert(review.reviewed_at);
    }

    let mut new_cards = HashSet::new();
    let mut reviews = 0;
    for review in storage
        .collection()
        .reviews
        .iter()
        .filter(|r| r.reviewed_at.date_naive() == today && in_scope(&r.card_id))
    {
        let introduced_today = first_review
            .get(&review.card_id)
            .map_or(false, |t| t.date_naive() == today);
        if introduced_today {
            new_cards.insert(review.card_id);
        } else {
            reviews += 1;
        }
    }

    Ok((new_cards.len() as u32, reviews))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 19, 0, 0).unwrap()
    }

    fn setup(cards: usize) -> (FlashcardStorage, Uuid, Vec<Uuid>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut storage = FlashcardStorage::open(temp_dir.path().join("collection.json")).unwrap();
        let deck = storage.create_deck("Deck".to_string(), None, None).unwrap();
        let ids = (0..cards)
            .map(|i| {
                storage
                    .create_card(deck.id, format!("q{}", i), format!("a{}", i), Vec::new(), now() - Duration::minutes(10))
                    .unwrap()
                    .id
            })
            .collect();
        (storage, deck.id, ids, temp_dir)
    }

    #[test]
    fn test_session_presents_due_cards_and_persists() {
        let (mut storage, deck_id, ids, _temp) = setup(2);
        let mut session = StudySession::start(&storage, Some(deck_id), SessionLimits::default(), now()).unwrap();
        assert_eq!(session.remaining(), 2);

        let first = session.current(&storage).unwrap().unwrap();
        assert!(ids.contains(&first.id));

        let updated = session.answer(&mut storage, Rating::Good, now()).unwrap();
        assert_eq!(updated.memory.interval, 2);
        assert_eq!(session.remaining(), 1);

        let reopened = FlashcardStorage::open(storage.path().to_path_buf()).unwrap();
        assert_eq!(reopened.get_card(first.id).unwrap().memory.status, CardStatus::Learning);

        session.answer(&mut storage, Rating::Easy, now()).unwrap();
        assert!(session.is_finished());
        assert!(matches!(
            session.answer(&mut storage, Rating::Good, now()),
            Err(SessionError::Finished)
        ));
        assert_eq!(session.summary().total(), 2);
    }

    #[test]
    fn test_again_requeues_card() {
        let (mut storage, deck_id, _ids, _temp) = setup(2);
        let mut session = StudySession::start(&storage, Some(deck_id), SessionLimits::default(), now()).unwrap();

        let failed = session.current_id().unwrap();
        session.answer(&mut storage, Rating::Again, now()).unwrap();
        assert_eq!(session.remaining(), 2);

        session.answer(&mut storage, Rating::Good, now()).unwrap();
        assert_eq!(session.current_id(), Some(failed));

        let card = session.answer(&mut storage, Rating::Good, now()).unwrap();
        assert_eq!(card.id, failed);
        assert_eq!(card.memory.status, CardStatus::Review);
        assert_eq!(card.memory.interval, 1);
        assert!(session.is_finished());
        assert_eq!(session.summary().again, 1);
        assert_eq!(session.summary().good, 2);
    }

    #[test]
    fn test_reviews_come_before_new_cards() {
        let (mut storage, deck_id, ids, _temp) = setup(3);
        let yesterday = now() - Duration::days(1);
        storage.submit_review(ids[2], Rating::Hard, yesterday).unwrap();

        let session = StudySession::start(&storage, Some(deck_id), SessionLimits::default(), now()).unwrap();
        assert_eq!(session.remaining(), 3);
        assert_eq!(session.current_id(), Some(ids[2]));
    }

    #[test]
    fn test_new_card_limit_counts_todays_work() {
        let (mut storage, deck_id, ids, _temp) = setup(5);
        storage.submit_review(ids[0], Rating::Good, now() - Duration::hours(1)).unwrap();

        let limits = SessionLimits {
            new_cards_per_day: 3,
            reviews_per_day: 100,
        };
        let session = StudySession::start(&storage, Some(deck_id), limits, now()).unwrap();
        // ids[0] is no longer due and already used one of the three new slots
        assert_eq!(session.remaining(), 2);
    }

    #[test]
    fn test_deck_override_limits() {
        let (mut storage, deck_id, _ids, _temp) = setup(4);
        let mut deck = storage.get_deck(deck_id).unwrap();
        deck.new_cards_per_day = Some(1);
        storage.update_deck(&deck).unwrap();

        let session = StudySession::start(&storage, Some(deck_id), SessionLimits::default(), now()).unwrap();
        assert_eq!(session.remaining(), 1);

        let session = StudySession::start(&storage, None, SessionLimits::default(), now()).unwrap();
        assert_eq!(session.remaining(), 4);
    }

    #[test]
    fn test_limits_only_count_work_in_the_studied_deck() {
        let (mut storage, deck_id, _ids, _temp) = setup(1);
        let mut deck = storage.get_deck(deck_id).unwrap();
        deck.new_cards_per_day = Some(1);
        storage.update_deck(&deck).unwrap();

        let other = storage.create_deck("Other".to_string(), None, None).unwrap();
        let elsewhere = storage
            .create_card(other.id, "x".into(), "y".into(), Vec::new(), now() - Duration::minutes(10))
            .unwrap();
        storage.submit_review(elsewhere.id, Rating::Good, now() - Duration::minutes(5)).unwrap();

        let session = StudySession::start(&storage, Some(deck_id), SessionLimits::default(), now()).unwrap();
        assert_eq!(session.remaining(), 1);

        // The whole collection shares one budget
        let limits = SessionLimits {
            new_cards_per_day: 1,
            reviews_per_day: 100,
        };
        let session = StudySession::start(&storage, None, limits, now()).unwrap();
        assert!(session.is_finished());
    }

    #[test]
    fn test_failed_save_keeps_card_and_state() {
        let (mut storage, deck_id, _ids, _temp) = setup(2);
        let mut session = StudySession::start(&storage, Some(deck_id), SessionLimits::default(), now()).unwrap();
        let card_id = session.current_id().unwrap();

        // A directory where the collection file should go makes the final rename fail
        std::fs::create_dir(storage.path()).unwrap();
        let result = session.answer(&mut storage, Rating::Again, now());
        assert!(matches!(result, Err(SessionError::Storage(_))));

        assert_eq!(session.remaining(), 2);
        assert_eq!(session.current_id(), Some(card_id));
        assert_eq!(session.summary().total(), 0);
        let card = storage.get_card(card_id).unwrap();
        assert_eq!(card.memory.status, CardStatus::New);
        assert!(storage.card_reviews(card_id).is_empty());

        std::fs::remove_dir(storage.path()).unwrap();
        session.answer(&mut storage, Rating::Again, now()).unwrap();
        assert_eq!(session.remaining(), 2);
        assert_ne!(session.current_id(), Some(card_id));
        assert_eq!(storage.card_reviews(card_id).len(), 1);
    }

    #[test]
    fn test_nothing_due() {
        let (mut storage, deck_id, ids, _temp) = setup(1);
        storage.submit_review(ids[0], Rating::Easy, now() - Duration::days(1)).unwrap();

        let session = StudySession::start(&storage, Some(deck_id), SessionLimits::default(), now()).unwrap();
        assert!(session.is_finished());
        assert!(session.current(&storage).unwrap().is_none());
    }
}
