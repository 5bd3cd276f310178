use anyhow::{Context, Result};
use chrono::Utc;

use recall_lib::flashcards::algorithm::format_interval;
use recall_lib::flashcards::Flashcard;

use crate::app::{parse_tags, App};
use crate::render::terminal::{self, paint, Color};
use crate::OutputFormat;

fn print_card(app: &App, card: &Flashcard, action: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(card)?),
        OutputFormat::Plain => {
            println!("{} card in \"{}\"", action, app.deck_path(card.deck_id));
            println!("  {}", terminal::card_line(card, use_color));
            println!("  ID: {}", card.id);
        }
    }
    Ok(())
}

pub fn run_add(
    app: &mut App,
    deck_name: &str,
    front: String,
    back: String,
    tags: Option<&str>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let deck = app.find_deck(deck_name)?;
    let tags = parse_tags(tags).unwrap_or_default();
    let card = app
        .storage
        .create_card(deck.id, front, back, tags, Utc::now())
        .context("Failed to create card")?;
    app.save()?;

    print_card(app, &card, "Added", format, use_color)
}

pub fn run_list(
    app: &App,
    deck_name: &str,
    recursive: bool,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let deck = app.find_deck(deck_name)?;
    let cards = app.storage.list_cards(deck.id, recursive)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&cards)?),
        OutputFormat::Plain => {
            if cards.is_empty() {
                println!("(no cards in \"{}\")", app.deck_path(deck.id));
            }
            for card in &cards {
                println!("{}", terminal::card_line(card, use_color));
            }
        }
    }
    Ok(())
}

pub fn run_show(app: &App, card_id: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let card = app.find_card(card_id)?;
    let reviews = app.storage.card_reviews(card.id);

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "card": card,
                "reviews": reviews,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{}", paint(&card.front, Color::BOLD, use_color));
            println!("{}", card.back);
            if !card.tags.is_empty() {
                println!("{}", paint(&terminal::format_tags(&card.tags), Color::DIM, use_color));
            }
            println!();
            println!("  Deck:     {}", app.deck_path(card.deck_id));
            println!(
                "  Status:   {}",
                paint(card.memory.status.as_str(), terminal::status_color(card.memory.status), use_color)
            );
            println!("  Interval: {}", format_interval(card.memory.interval));
            println!("  Ease:     {:.2}", card.memory.ease);
            println!("  Due:      {}", card.memory.due_date.to_rfc3339());
            println!("  Reviews:  {}", reviews.len());
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn run_edit(
    app: &mut App,
    card_id: &str,
    front: Option<String>,
    back: Option<String>,
    tags: Option<&str>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let card = app.find_card(card_id)?;
    let card = app
        .storage
        .update_card_content(card.id, front, back, parse_tags(tags))
        .context("Failed to update card")?;
    app.save()?;

    print_card(app, &card, "Updated", format, use_color)
}

pub fn run_move(
    app: &mut App,
    card_id: &str,
    deck_name: &str,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let card = app.find_card(card_id)?;
    let deck = app.find_deck(deck_name)?;
    let card = app
        .storage
        .move_card(card.id, deck.id)
        .context("Failed to move card")?;
    app.save()?;

    print_card(app, &card, "Moved", format, use_color)
}

pub fn run_delete(app: &mut App, card_id: &str, format: &OutputFormat) -> Result<()> {
    let card = app.find_card(card_id)?;
    app.storage
        .delete_card(card.id)
        .context("Failed to delete card")?;
    app.save()?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "id": card.id.to_string(), "deleted": true }));
        }
        OutputFormat::Plain => println!("Deleted card {}", card.id),
    }
    Ok(())
}

pub fn run_reset(app: &mut App, card_id: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let card = app.find_card(card_id)?;
    let card = app
        .storage
        .reset_card(card.id, Utc::now())
        .context("Failed to reset card")?;
    app.save()?;

    print_card(app, &card, "Reset", format, use_color)
}
