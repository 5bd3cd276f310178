pub mod card;
pub mod config;
pub mod deck;
pub mod due;
pub mod stats;
pub mod study;
pub mod transfer;
