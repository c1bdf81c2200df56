pub mod actions;
pub mod config;
pub mod database;
pub mod error;
pub mod generation;
pub mod models;

pub use error::{AppError, AppResult};
pub use models::{Card, CardDraft, Deck, DeckDraft, DeckSummary, Identity, StudySession};
