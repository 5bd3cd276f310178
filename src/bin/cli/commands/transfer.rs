use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;

use recall_lib::flashcards::transfer::{self, ImportSummary};

use crate::app::App;
use crate::OutputFormat;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum TransferFormat {
    Json,
    Tsv,
}

impl TransferFormat {
    /// Guess from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("txt") => Self::Tsv,
            _ => Self::Json,
        }
    }
}

pub fn run_export(
    app: &App,
    deck_name: &str,
    output: Option<&Path>,
    kind: Option<TransferFormat>,
    recursive: bool,
) -> Result<()> {
    let deck = app.find_deck(deck_name)?;
    let kind = kind
        .or_else(|| output.map(TransferFormat::from_path))
        .unwrap_or(TransferFormat::Json);

    let content = match kind {
        TransferFormat::Json => transfer::export_deck_json(&app.storage, deck.id, recursive)?,
        TransferFormat::Tsv => transfer::export_deck_tsv(&app.storage, deck.id, recursive)?,
    };

    match output {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Exported \"{}\" to {}", app.deck_path(deck.id), path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

pub fn run_import(
    app: &mut App,
    input: &Path,
    deck_name: Option<&str>,
    kind: Option<TransferFormat>,
    format: &OutputFormat,
) -> Result<()> {
    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let kind = kind.unwrap_or_else(|| TransferFormat::from_path(input));
    let now = Utc::now();

    let summary: ImportSummary = match kind {
        TransferFormat::Json => {
            // The named deck becomes the parent of the imported deck
            let parent_id = app.find_optional_deck(deck_name)?.map(|d| d.id);
            transfer::import_deck_json(&mut app.storage, &content, parent_id, now)?
        }
        TransferFormat::Tsv => {
            let Some(name) = deck_name else {
                bail!("TSV import needs a target deck (--deck)");
            };
            let deck = app.find_deck(name)?;
            transfer::import_tsv(&mut app.storage, deck.id, &content, now)?
        }
    };
    app.save()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Plain => println!(
            "Imported {} card(s) into \"{}\"",
            summary.imported,
            app.deck_path(summary.deck_id)
        ),
    }
    Ok(())
}
