use recall_lib::flashcards::algorithm::format_interval;
use recall_lib::flashcards::{CardStatus, Flashcard};

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Wrap `text` in `color` when colors are enabled
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

pub fn status_color(status: CardStatus) -> &'static str {
    match status {
        CardStatus::New => Color::BLUE,
        CardStatus::Learning => Color::YELLOW,
        CardStatus::Review => Color::GREEN,
    }
}

/// One-line summary of a card: short id, status, interval, front
pub fn card_line(card: &Flashcard, use_color: bool) -> String {
    let id = card.id.to_string();
    let status = format!("{:<8}", card.memory.status.as_str());
    format!(
        "{}  {}  {:>4}  {}",
        paint(&id[..8], Color::GRAY, use_color),
        paint(&status, status_color(card.memory.status), use_color),
        format_interval(card.memory.interval),
        first_line(&card.front)
    )
}

/// First line of a multi-line field, marked when truncated
pub fn first_line(text: &str) -> String {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or_default();
    if lines.next().is_some() {
        format!("{} …", first)
    } else {
        first.to_string()
    }
}

pub fn format_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| format!("#{}", t))
        .collect::<Vec<_>>()
        .join(" ")
}
