mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::transfer::TransferFormat;

#[derive(Parser)]
#[command(name = "recall-cli", about = "Flashcards with spaced repetition", version)]
struct Cli {
    /// Config file (default: <config dir>/recall/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory from the config file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Manage decks
    #[command(subcommand)]
    Deck(DeckCommand),

    /// Manage cards
    #[command(subcommand)]
    Card(CardCommand),

    /// List cards that are due now
    Due {
        /// Limit to a deck and its sub-decks
        #[arg(long)]
        deck: Option<String>,
    },

    /// Study due cards interactively
    Study {
        /// Limit to a deck and its sub-decks
        #[arg(long)]
        deck: Option<String>,
    },

    /// Show review statistics
    Stats {
        /// Limit to a deck and its sub-decks
        #[arg(long)]
        deck: Option<String>,
    },

    /// Export a deck as JSON or TSV
    Export {
        /// Deck name or Parent/Child path
        deck: String,
        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// File format (default: from extension, else JSON)
        #[arg(long = "as")]
        kind: Option<TransferFormat>,
        /// Include cards of sub-decks
        #[arg(long, short)]
        recursive: bool,
    },

    /// Import a JSON deck or TSV cards
    Import {
        /// File to import
        file: PathBuf,
        /// TSV: deck to add cards to. JSON: parent of the new deck.
        #[arg(long)]
        deck: Option<String>,
        /// File format (default: from extension, else JSON)
        #[arg(long = "as")]
        kind: Option<TransferFormat>,
    },

    /// Show or create the config file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum DeckCommand {
    /// List decks as a tree
    List,

    /// Create a deck
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Nest under this deck
        #[arg(long)]
        parent: Option<String>,
    },

    /// Rename, re-parent or change limits of a deck
    Edit {
        deck: String,
        #[arg(long)]
        name: Option<String>,
        /// Empty string clears the description
        #[arg(long)]
        description: Option<String>,
        /// New parent deck, or "/" for top level
        #[arg(long)]
        parent: Option<String>,
        /// Daily new card limit for this deck
        #[arg(long)]
        new_per_day: Option<u32>,
        /// Daily review limit for this deck
        #[arg(long)]
        reviews_per_day: Option<u32>,
    },

    /// Delete a deck, its sub-decks and their cards
    Delete { deck: String },
}

#[derive(Subcommand)]
enum CardCommand {
    /// Add a card to a deck
    Add {
        deck: String,
        front: String,
        back: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },

    /// List cards in a deck
    List {
        deck: String,
        /// Include cards of sub-decks
        #[arg(long, short)]
        recursive: bool,
    },

    /// Show a card and its schedule
    Show {
        /// Card id or unique id prefix
        id: String,
    },

    /// Edit the content of a card
    Edit {
        id: String,
        #[arg(long)]
        front: Option<String>,
        #[arg(long)]
        back: Option<String>,
        /// Comma-separated tags (replaces existing tags)
        #[arg(long)]
        tags: Option<String>,
    },

    /// Move a card to another deck
    Move { id: String, deck: String },

    /// Delete a card
    Delete { id: String },

    /// Forget all progress on a card
    Reset { id: String },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Write the effective configuration to the config file
    Init {
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();
    let format = &cli.format;

    let mut app = app::App::new(cli.config, cli.data_dir)?;

    match cli.command {
        Command::Deck(subcmd) => match subcmd {
            DeckCommand::List => commands::deck::run_list(&app, format, use_color)?,
            DeckCommand::Create { name, description, parent } => {
                commands::deck::run_create(&mut app, &name, description, parent.as_deref(), format)?;
            }
            DeckCommand::Edit {
                deck,
                name,
                description,
                parent,
                new_per_day,
                reviews_per_day,
            } => {
                commands::deck::run_edit(
                    &mut app,
                    &deck,
                    name,
                    description,
                    parent.as_deref(),
                    new_per_day,
                    reviews_per_day,
                    format,
                )?;
            }
            DeckCommand::Delete { deck } => commands::deck::run_delete(&mut app, &deck, format)?,
        },
        Command::Card(subcmd) => match subcmd {
            CardCommand::Add { deck, front, back, tags } => {
                commands::card::run_add(&mut app, &deck, front, back, tags.as_deref(), format, use_color)?;
            }
            CardCommand::List { deck, recursive } => {
                commands::card::run_list(&app, &deck, recursive, format, use_color)?;
            }
            CardCommand::Show { id } => commands::card::run_show(&app, &id, format, use_color)?,
            CardCommand::Edit { id, front, back, tags } => {
                commands::card::run_edit(&mut app, &id, front, back, tags.as_deref(), format, use_color)?;
            }
            CardCommand::Move { id, deck } => {
                commands::card::run_move(&mut app, &id, &deck, format, use_color)?;
            }
            CardCommand::Delete { id } => commands::card::run_delete(&mut app, &id, format)?,
            CardCommand::Reset { id } => commands::card::run_reset(&mut app, &id, format, use_color)?,
        },
        Command::Due { deck } => commands::due::run(&app, deck.as_deref(), format, use_color)?,
        Command::Study { deck } => commands::study::run(&mut app, deck.as_deref(), format, use_color)?,
        Command::Stats { deck } => commands::stats::run(&app, deck.as_deref(), format, use_color)?,
        Command::Export { deck, output, kind, recursive } => {
            commands::transfer::run_export(&app, &deck, output.as_deref(), kind, recursive)?;
        }
        Command::Import { file, deck, kind } => {
            commands::transfer::run_import(&mut app, &file, deck.as_deref(), kind, format)?;
        }
        Command::Config(subcmd) => match subcmd {
            ConfigCommand::Show => commands::config::run_show(&app, format)?,
            ConfigCommand::Init { force } => commands::config::run_init(&app, force)?,
        },
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    use std::io::IsTerminal;
    std::io::stdout().is_terminal()
}
