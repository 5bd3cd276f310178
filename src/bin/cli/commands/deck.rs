use anyhow::{Context, Result};
use chrono::Utc;

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

pub fn run_list(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let decks = app.storage.list_decks();
    let now = Utc::now();

    match format {
        OutputFormat::Json => {
            let mut output = Vec::new();
            for deck in &decks {
                let stats = app.storage.get_review_stats(Some(deck.id), now)?;
                output.push(serde_json::json!({
                    "id": deck.id.to_string(),
                    "name": deck.name,
                    "path": app.deck_path(deck.id),
                    "parentId": deck.parent_id.map(|id| id.to_string()),
                    "description": deck.description,
                    "cardCount": stats.total_cards,
                    "dueCount": stats.due_cards,
                }));
            }
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if decks.is_empty() {
                println!("(no decks)");
                return Ok(());
            }
            for deck in &decks {
                let depth = app.deck_path(deck.id).matches('/').count();
                let stats = app.storage.get_review_stats(Some(deck.id), now)?;
                let due = if stats.due_cards > 0 {
                    paint(&format!("{} due", stats.due_cards), Color::YELLOW, use_color)
                } else {
                    paint("0 due", Color::DIM, use_color)
                };
                println!(
                    "{}{} ({} cards, {})",
                    "  ".repeat(depth),
                    deck.name,
                    stats.total_cards,
                    due
                );
            }
        }
    }

    Ok(())
}

pub fn run_create(
    app: &mut App,
    name: &str,
    description: Option<String>,
    parent: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    let parent_id = app.find_optional_deck(parent)?.map(|d| d.id);
    let deck = app
        .storage
        .create_deck(name.to_string(), description, parent_id)
        .context("Failed to create deck")?;
    app.save()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&deck)?),
        OutputFormat::Plain => {
            println!("Created deck \"{}\"", app.deck_path(deck.id));
            println!("  ID: {}", deck.id);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn run_edit(
    app: &mut App,
    deck_name: &str,
    name: Option<String>,
    description: Option<String>,
    parent: Option<&str>,
    new_per_day: Option<u32>,
    reviews_per_day: Option<u32>,
    format: &OutputFormat,
) -> Result<()> {
    let mut deck = app.find_deck(deck_name)?;

    if let Some(name) = name {
        deck.name = name;
    }
    if let Some(description) = description {
        deck.description = if description.is_empty() { None } else { Some(description) };
    }
    match parent {
        // "/" moves the deck to the top level
        Some("/") => deck.parent_id = None,
        Some(parent) => deck.parent_id = Some(app.find_deck(parent)?.id),
        None => {}
    }
    if new_per_day.is_some() {
        deck.new_cards_per_day = new_per_day;
    }
    if reviews_per_day.is_some() {
        deck.reviews_per_day = reviews_per_day;
    }

    app.storage.update_deck(&deck).context("Failed to update deck")?;
    app.save()?;

    let deck = app.storage.get_deck(deck.id)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&deck)?),
        OutputFormat::Plain => println!("Updated deck \"{}\"", app.deck_path(deck.id)),
    }
    Ok(())
}

pub fn run_delete(app: &mut App, deck_name: &str, format: &OutputFormat) -> Result<()> {
    let deck = app.find_deck(deck_name)?;
    let path = app.deck_path(deck.id);
    let removed = app
        .storage
        .delete_deck(deck.id)
        .context("Failed to delete deck")?;
    app.save()?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "id": deck.id.to_string(),
                "cardsRemoved": removed,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => println!("Deleted deck \"{}\" and {} card(s)", path, removed),
    }
    Ok(())
}
