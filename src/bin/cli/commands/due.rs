use anyhow::Result;
use chrono::Utc;

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

pub fn run(app: &App, deck_name: Option<&str>, format: &OutputFormat, use_color: bool) -> Result<()> {
    let deck = app.find_optional_deck(deck_name)?;
    let cards = app.storage.get_due_cards(deck.as_ref().map(|d| d.id), Utc::now())?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&cards)?),
        OutputFormat::Plain => {
            if cards.is_empty() {
                println!("Nothing due. Come back later.");
                return Ok(());
            }
            println!("{} card(s) due", cards.len());
            for card in &cards {
                println!("{}", terminal::card_line(card, use_color));
            }
        }
    }
    Ok(())
}
