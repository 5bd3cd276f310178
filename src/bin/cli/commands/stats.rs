use anyhow::Result;
use chrono::Utc;

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

pub fn run(app: &App, deck_name: Option<&str>, format: &OutputFormat, use_color: bool) -> Result<()> {
    let deck = app.find_optional_deck(deck_name)?;
    let stats = app
        .storage
        .get_review_stats(deck.as_ref().map(|d| d.id), Utc::now())?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Plain => {
            let title = match &deck {
                Some(d) => app.deck_path(d.id),
                None => "All decks".to_string(),
            };
            println!("{}", paint(&title, Color::BOLD, use_color));
            println!("  Cards:     {}", stats.total_cards);
            println!("    new:      {}", paint(&stats.new_cards.to_string(), Color::BLUE, use_color));
            println!("    learning: {}", paint(&stats.learning_cards.to_string(), Color::YELLOW, use_color));
            println!("    review:   {}", paint(&stats.review_cards.to_string(), Color::GREEN, use_color));
            println!("  Due now:   {}", stats.due_cards);
            println!("  Today:     {} reviewed, {} recalled", stats.reviews_today, stats.correct_today);
            println!("  Streak:    {} day(s)", stats.streak_days);
        }
    }
    Ok(())
}
