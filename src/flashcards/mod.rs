//! Flashcards and spaced repetition
//!
//! This module provides:
//! - Deck management (nested decks act as folders)
//! - Flashcard CRUD
//! - The SM-2 style scheduler
//! - Study sessions over due cards
//! - JSON and TSV import/export

pub mod algorithm;
pub mod models;
pub mod session;
pub mod storage;
pub mod transfer;

pub use algorithm::{schedule_card, schedule_card_at, ScheduleError};
pub use models::*;
pub use session::{SessionError, SessionLimits, SessionSummary, StudySession};
pub use storage::{Collection, FlashcardStorage, FlashcardStorageError};
