//! Recall: a personal flashcard study tool built around an SM-2 style
//! spaced repetition scheduler.

pub mod config;
pub mod flashcards;

pub use config::AppConfig;
pub use flashcards::{schedule_card, schedule_card_at, CardMemoryState, CardStatus, Rating};
