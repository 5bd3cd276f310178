use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use recall_lib::config::{self, AppConfig};
use recall_lib::flashcards::{Deck, Flashcard, FlashcardStorage};

/// Shared application state for CLI commands
pub struct App {
    pub config: AppConfig,
    pub config_path: PathBuf,
    pub storage: FlashcardStorage,
}

impl App {
    /// Load config (from `config_path` or the default location) and open the collection
    pub fn new(config_path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => config::default_config_path().context("Failed to locate config directory")?,
        };

        let mut config = AppConfig::load(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
        if let Some(dir) = data_dir {
            config.data_dir = dir;
        }

        let collection_path = config.collection_path();
        let storage = FlashcardStorage::open(&collection_path)
            .with_context(|| format!("Failed to open collection {}", collection_path.display()))?;

        Ok(Self {
            config,
            config_path,
            storage,
        })
    }

    pub fn save(&self) -> Result<()> {
        self.storage.save().context("Failed to save collection")
    }

    /// Find a deck by `Parent/Child` path, exact name or unique name prefix
    pub fn find_deck(&self, name: &str) -> Result<Deck> {
        if let Some(deck) = self.storage.find_deck_by_name(name) {
            return Ok(deck);
        }

        let decks = self.storage.list_decks();
        let name_lower = name.to_lowercase();

        let exact: Vec<&Deck> = decks
            .iter()
            .filter(|d| d.name.to_lowercase() == name_lower)
            .collect();
        if exact.len() == 1 {
            return Ok(exact[0].clone());
        }

        let matches: Vec<&Deck> = if exact.is_empty() {
            decks
                .iter()
                .filter(|d| d.name.to_lowercase().starts_with(&name_lower))
                .collect()
        } else {
            exact
        };

        match matches.len() {
            0 => bail!(
                "No deck matching '{}'. Available decks:\n{}",
                name,
                self.deck_listing(&decks)
            ),
            1 => Ok(matches[0].clone()),
            _ => {
                let owned: Vec<Deck> = matches.into_iter().cloned().collect();
                bail!(
                    "Ambiguous deck name '{}'. Matches:\n{}",
                    name,
                    self.deck_listing(&owned)
                )
            }
        }
    }

    fn deck_listing(&self, decks: &[Deck]) -> String {
        decks
            .iter()
            .map(|d| format!("  - {}", self.deck_path(d.id)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn find_optional_deck(&self, name: Option<&str>) -> Result<Option<Deck>> {
        name.map(|n| self.find_deck(n)).transpose()
    }

    /// Find a card by full id or unique id prefix
    pub fn find_card(&self, id: &str) -> Result<Flashcard> {
        if let Ok(uuid) = Uuid::parse_str(id) {
            return self.storage.get_card(uuid).context("Card not found");
        }
        self.storage
            .find_card_by_prefix(id)
            .with_context(|| format!("No card (or more than one) with id starting '{}'", id))
    }

    pub fn deck_path(&self, deck_id: Uuid) -> String {
        self.storage
            .deck_path(deck_id)
            .unwrap_or_else(|_| deck_id.to_string())
    }
}

/// Split a comma-separated tag list
pub fn parse_tags(tags: Option<&str>) -> Option<Vec<String>> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
