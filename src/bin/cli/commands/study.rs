use std::io::{self, BufRead, Write};

use anyhow::Result;
use chrono::Utc;

use recall_lib::flashcards::algorithm::{format_interval, preview_intervals};
use recall_lib::flashcards::{Rating, SessionSummary, StudySession};

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

pub fn run(app: &mut App, deck_name: Option<&str>, format: &OutputFormat, use_color: bool) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let summary = study(app, deck_name, &mut stdin.lock(), &mut stdout.lock(), use_color)?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

enum Input {
    Line(String),
    Quit,
}

fn read_input<R: BufRead>(input: &mut R) -> Result<Input> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(Input::Quit);
    }
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
        return Ok(Input::Quit);
    }
    Ok(Input::Line(line.to_string()))
}

/// Run an interactive session: show the front, reveal the back, ask for a rating
pub fn study<R: BufRead, W: Write>(
    app: &mut App,
    deck_name: Option<&str>,
    input: &mut R,
    out: &mut W,
    use_color: bool,
) -> Result<SessionSummary> {
    let deck_id = app.find_optional_deck(deck_name)?.map(|d| d.id);
    let mut session = StudySession::start(&app.storage, deck_id, app.config.session_limits(), Utc::now())?;

    if session.is_finished() {
        writeln!(out, "Nothing due. Come back later.")?;
        return Ok(session.summary().clone());
    }

    'cards: while let Some(card) = session.current(&app.storage)? {
        writeln!(out)?;
        writeln!(
            out,
            "{}",
            paint(
                &format!("[{} left] {}", session.remaining(), app.deck_path(card.deck_id)),
                Color::GRAY,
                use_color
            )
        )?;
        writeln!(out, "{}", paint(&card.front, Color::BOLD, use_color))?;
        write!(out, "{}", paint("(enter to reveal, q to quit) ", Color::DIM, use_color))?;
        out.flush()?;
        if let Input::Quit = read_input(input)? {
            break;
        }

        writeln!(out, "{}", card.back)?;
        let preview = preview_intervals(&card.memory, Utc::now());
        let buttons: Vec<String> = Rating::ALL
            .iter()
            .zip(preview)
            .map(|(rating, days)| format!("{} {} ({})", rating.button(), rating, format_interval(days)))
            .collect();
        writeln!(out, "{}", buttons.join("  "))?;

        let rating = loop {
            write!(out, "> ")?;
            out.flush()?;
            match read_input(input)? {
                Input::Quit => break 'cards,
                Input::Line(line) => match line.parse::<Rating>() {
                    Ok(rating) => break rating,
                    Err(e) => writeln!(out, "{}", paint(&e.to_string(), Color::RED, use_color))?,
                },
            }
        };

        let updated = session.answer(&mut app.storage, rating, Utc::now())?;
        writeln!(
            out,
            "{}",
            paint(
                &format!("Next review in {}", format_interval(updated.memory.interval)),
                Color::DIM,
                use_color
            )
        )?;
    }

    let summary = session.summary().clone();
    writeln!(out)?;
    writeln!(
        out,
        "Reviewed {} card(s): {} again, {} hard, {} good, {} easy",
        summary.total(),
        summary.again,
        summary.hard,
        summary.good,
        summary.easy
    )?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_lib::flashcards::CardStatus;
    use tempfile::TempDir;

    fn test_app(temp: &TempDir) -> App {
        let mut app = App::new(
            Some(temp.path().join("config.toml")),
            Some(temp.path().join("data")),
        )
        .unwrap();
        let deck = app.storage.create_deck("Words".to_string(), None, None).unwrap();
        app.storage
            .create_card(deck.id, "gato".into(), "cat".into(), Vec::new(), Utc::now())
            .unwrap();
        app
    }

    #[test]
    fn test_study_rates_and_persists() {
        let temp = TempDir::new().unwrap();
        let mut app = test_app(&temp);

        let mut input = "\nfoo\ngood\n".as_bytes();
        let mut out = Vec::new();
        let summary = study(&mut app, Some("words"), &mut input, &mut out, false).unwrap();
        assert_eq!(summary.good, 1);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("gato"));
        assert!(text.contains("1 again (now)  2 hard (1d)  3 good (2d)  4 easy (4d)"));
        assert!(text.contains("Invalid rating"));
        assert!(text.contains("Next review in 2d"));

        let reopened = App::new(
            Some(temp.path().join("config.toml")),
            Some(temp.path().join("data")),
        )
        .unwrap();
        let card = &reopened.storage.list_all_cards()[0];
        assert_eq!(card.memory.status, CardStatus::Learning);
        assert_eq!(card.memory.interval, 2);
    }

    #[test]
    fn test_again_shows_card_again_and_quit_stops() {
        let temp = TempDir::new().unwrap();
        let mut app = test_app(&temp);

        let mut input = "\n1\nq\n".as_bytes();
        let mut out = Vec::new();
        let summary = study(&mut app, None, &mut input, &mut out, false).unwrap();
        assert_eq!(summary.again, 1);
        assert_eq!(summary.total(), 1);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("gato").count(), 2);
    }
}
