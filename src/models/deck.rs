//! Deck is a named, user-owned collection of cards
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};

pub const MAX_DECK_NAME_LEN: usize = 100;
pub const MAX_DECK_DESCRIPTION_LEN: usize = 500;

#[derive(Clone, Debug, PartialEq)]
pub struct Deck {
    pub id: i64,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub ai_generation_used: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deck {
    /// True when the description is missing or only whitespace.
    pub fn has_description(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
    }
}

/// Deck row plus its derived card count, as shown in listings.
#[derive(Clone, Debug, PartialEq)]
pub struct DeckSummary {
    pub deck: Deck,
    pub card_count: i64,
}

/// User input for creating or editing a deck.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeckDraft {
    pub name: String,
    pub description: Option<String>,
}

impl DeckDraft {
    pub fn new(name: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            name: name.into(),
            description: description.map(str::to_string),
        }
    }

    /// Checks name and description bounds. Blank descriptions become `None`.
    pub fn validate(self) -> AppResult<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }
        if name.chars().count() > MAX_DECK_NAME_LEN {
            return Err(AppError::Validation("Name is too long".to_string()));
        }

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if let Some(d) = &description {
            if d.chars().count() > MAX_DECK_DESCRIPTION_LEN {
                return Err(AppError::Validation("Description is too long".to_string()));
            }
        }

        Ok(Self { name, description })
    }
}
