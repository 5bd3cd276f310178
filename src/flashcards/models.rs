//! Data models for the flashcard system

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::algorithm::{ScheduleError, INITIAL_EASE, MIN_EASE};

/// A deck is a named collection of flashcards. Decks with a parent act as
/// sub-folders of that parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    /// Overrides the configured daily new card limit for this deck
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_cards_per_day: Option<u32>,
    /// Overrides the configured daily review limit for this deck
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews_per_day: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deck {
    pub fn new(name: String, parent_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            description: None,
            parent_id,
            new_cards_per_day: None,
            reviews_per_day: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Status of a card in the spaced repetition system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    /// Never reviewed
    #[default]
    New,
    /// Between the first review and graduation
    Learning,
    /// Regular spaced review
    Review,
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Review => "review",
        }
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Self-assessed recall quality for one review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    /// All ratings in button order
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Again => "again",
            Self::Hard => "hard",
            Self::Good => "good",
            Self::Easy => "easy",
        }
    }

    /// Button number shown in the UI (1-4)
    pub fn button(&self) -> u8 {
        match self {
            Self::Again => 1,
            Self::Hard => 2,
            Self::Good => 3,
            Self::Easy => 4,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = ScheduleError;

    /// Accepts rating names (case-insensitive) or button numbers 1-4
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "again" | "1" => Ok(Self::Again),
            "hard" | "2" => Ok(Self::Hard),
            "good" | "3" => Ok(Self::Good),
            "easy" | "4" => Ok(Self::Easy),
            _ => Err(ScheduleError::InvalidRating(trimmed.to_string())),
        }
    }
}

impl TryFrom<i32> for Rating {
    type Error = ScheduleError;

    fn try_from(button: i32) -> Result<Self, Self::Error> {
        match button {
            1 => Ok(Self::Again),
            2 => Ok(Self::Hard),
            3 => Ok(Self::Good),
            4 => Ok(Self::Easy),
            other => Err(ScheduleError::InvalidRating(other.to_string())),
        }
    }
}

/// The scheduling-relevant part of a flashcard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMemoryState {
    /// Days until the next review
    #[serde(default)]
    pub interval: u32,
    #[serde(default = "default_ease")]
    pub ease: f64,
    #[serde(default)]
    pub status: CardStatus,
    /// When the card becomes eligible for study, stored as epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub due_date: DateTime<Utc>,
}

fn default_ease() -> f64 {
    INITIAL_EASE
}

impl CardMemoryState {
    /// Fresh state for a card added at `now`
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            interval: 0,
            ease: INITIAL_EASE,
            status: CardStatus::New,
            due_date: now,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_date <= now
    }

    /// Repair a state read from outside the scheduler (an imported deck or a
    /// hand-edited collection). Ease is floored at `MIN_EASE`, a `new` card
    /// has no interval and a `review` card has at least one day.
    /// Returns whether anything changed.
    pub fn normalize(&mut self) -> bool {
        let before = self.clone();
        if !self.ease.is_finite() {
            self.ease = INITIAL_EASE;
        }
        self.ease = self.ease.max(MIN_EASE);
        match self.status {
            CardStatus::New => self.interval = 0,
            CardStatus::Review => self.interval = self.interval.max(1),
            CardStatus::Learning => {}
        }
        *self != before
    }
}

/// A flashcard with question (front) and answer (back)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: Uuid,
    pub deck_id: Uuid,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub memory: CardMemoryState,
}

impl Flashcard {
    pub fn new(deck_id: Uuid, front: String, back: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            deck_id,
            front,
            back,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            memory: CardMemoryState::new(now),
        }
    }
}

/// A record of a single review
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub id: Uuid,
    pub card_id: Uuid,
    pub rating: Rating,
    /// Interval after the review (days)
    pub interval: u32,
    /// Ease factor after the review
    pub ease: f64,
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewRecord {
    pub fn new(card_id: Uuid, rating: Rating, state: &CardMemoryState, reviewed_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            card_id,
            rating,
            interval: state.interval,
            ease: state.ease,
            reviewed_at,
        }
    }
}

/// Statistics for a deck or the whole collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_cards: usize,
    pub new_cards: usize,
    pub learning_cards: usize,
    pub review_cards: usize,
    pub due_cards: usize,
    pub reviews_today: usize,
    pub correct_today: usize,
    pub streak_days: u32,
}
