//! AI flashcard generation
//!
//! This module provides:
//! - The `CardGenerator` seam over a text-generation provider
//! - An OpenAI-compatible implementation
//! - The exact-count postcondition on what the provider returns
//! - Classification of provider failures into user-facing errors

pub mod openai;
pub mod prompt;

use crate::error::{AppError, AppResult};
use crate::models::CardDraft;
use thiserror::Error;
use tracing::{error, info, warn};

pub use openai::OpenAiGenerator;

/// Number of cards every generation must produce
pub const EXPECTED_CARD_COUNT: usize = 20;

/// What the provider is asked for.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    pub deck_id: i64,
    pub deck_name: String,
    pub prompt: String,
    pub card_count: usize,
}

impl GenerationRequest {
    pub fn new(deck_id: i64, deck_name: &str, description: Option<&str>) -> Self {
        Self {
            deck_id,
            deck_name: deck_name.to_string(),
            prompt: prompt::build_prompt(deck_name, description),
            card_count: EXPECTED_CARD_COUNT,
        }
    }
}

/// Failure reported by a provider integration. The message text is what
/// `classify_provider_error` inspects.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API key is not configured")]
    MissingApiKey,

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("No object generated: response did not match schema: {0}")]
    MalformedOutput(String),
}

impl ProviderError {
    pub fn is_malformed_output(&self) -> bool {
        matches!(self, ProviderError::MalformedOutput(_))
    }
}

/// Seam over the text-generation provider.
pub trait CardGenerator: Send + Sync {
    /// False when the integration lacks its credential. Checked before any
    /// request is made.
    fn is_configured(&self) -> bool;

    /// Returns the provider's cards in the order it produced them.
    fn generate(&self, request: &GenerationRequest) -> Result<Vec<CardDraft>, ProviderError>;
}

/// Maps a provider failure to a user-facing error by its message text.
pub fn classify_provider_error(err: &ProviderError) -> AppError {
    let message = err.to_string();
    let lower = message.to_lowercase();

    if lower.contains("did not match schema") || lower.contains("no object generated") {
        AppError::ProviderFormat
    } else if lower.contains("api key") {
        AppError::ProviderAuth
    } else if lower.contains("quota") || lower.contains("billing") {
        AppError::ProviderQuota
    } else if lower.contains("rate limit") {
        AppError::ProviderRateLimit
    } else {
        AppError::ProviderGeneric(message)
    }
}

/// Enforces the card-count postcondition.
///
/// Too few cards is an error and nothing is padded. Extra cards are dropped
/// from the end. A card with a blank side rejects the whole batch.
pub fn validate_generated(mut cards: Vec<CardDraft>) -> AppResult<Vec<CardDraft>> {
    if cards.is_empty() {
        error!("AI generation returned no cards");
        return Err(AppError::NoCardsGenerated);
    }

    if cards.len() < EXPECTED_CARD_COUNT {
        error!(
            "AI generated {} cards instead of {}",
            cards.len(),
            EXPECTED_CARD_COUNT
        );
        return Err(AppError::CountMismatch {
            actual: cards.len(),
            expected: EXPECTED_CARD_COUNT,
        });
    }

    if cards.len() > EXPECTED_CARD_COUNT {
        warn!(
            "AI generated {} cards, trimming to {}",
            cards.len(),
            EXPECTED_CARD_COUNT
        );
        cards.truncate(EXPECTED_CARD_COUNT);
    }

    cards
        .into_iter()
        .enumerate()
        .map(|(i, card)| {
            card.validate().map_err(|e| {
                error!("AI generated card {} is invalid: {}", i + 1, e);
                AppError::ProviderFormat
            })
        })
        .collect()
}

/// Runs one generation against the provider and validates the result.
/// Performs no writes.
pub fn request_cards(
    generator: &dyn CardGenerator,
    request: &GenerationRequest,
) -> AppResult<Vec<CardDraft>> {
    if !generator.is_configured() {
        return Err(AppError::ProviderConfig);
    }

    let cards = generator.generate(request).map_err(|e| {
        error!("AI generation error for deck {}: {}", request.deck_id, e);
        classify_provider_error(&e)
    })?;

    info!(
        "AI generated {} cards for deck: {}",
        cards.len(),
        request.deck_name
    );
    validate_generated(cards)
}
