//! Error types surfaced to the UI.
//!
//! Every variant's `Display` text is the message shown to the user, so the
//! wording here is user-facing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized: no user is signed in")]
    Unauthorized,

    #[error("Forbidden: {0} not found or access denied")]
    Forbidden(&'static str),

    #[error("{0}")]
    PlanLimitExceeded(String),

    #[error("{0}")]
    Validation(String),

    #[error(
        "The AI provider API key is not configured. Please set OPENAI_API_KEY or ai.api_key in the config file."
    )]
    ProviderConfig,

    #[error(
        "AI response format error. This might be a temporary issue. Please try again, or if the problem persists, try editing your deck description to be more specific."
    )]
    ProviderFormat,

    #[error("The AI provider API key is invalid. Please check your OPENAI_API_KEY.")]
    ProviderAuth,

    #[error("AI provider quota exceeded or billing issue. Please check your provider account.")]
    ProviderQuota,

    #[error("AI provider rate limit reached. Please try again in a few moments.")]
    ProviderRateLimit,

    #[error("AI generation failed: {0}")]
    ProviderGeneric(String),

    #[error("AI did not generate any flashcards. Please try again.")]
    NoCardsGenerated,

    #[error(
        "AI generated only {actual} cards instead of {expected}. This is likely a temporary issue. Please try generating again."
    )]
    CountMismatch { actual: usize, expected: usize },

    #[error("AI generation has already been used for this deck")]
    GenerationAlreadyUsed,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type AppResult<T> = Result<T, AppError>;
