//! Ownership-checked operations called by the UI.
//!
//! Every action starts from the caller's `Identity`, re-verifies ownership
//! right before it mutates anything, and returns an `AppError` whose text is
//! shown to the user as-is.

pub mod ai;
pub mod cards;
pub mod decks;

use crate::database::db;
use crate::error::{AppError, AppResult};
use crate::models::{Deck, Identity};
use rusqlite::Connection;

pub use ai::{GenerationGate, GenerationOutcome, generate_cards, persist_generated, prepare_generation};
pub use cards::{create_card, delete_card, list_cards, update_card};
pub use decks::{create_deck, delete_deck, duplicate_deck, get_deck, list_decks, update_deck};

/// The signed-in user's ID, or `Unauthorized`.
pub(crate) fn require_user(identity: &Identity) -> AppResult<&str> {
    identity.user_id.as_deref().ok_or(AppError::Unauthorized)
}

/// Loads a deck the user owns. Someone else's deck and a missing deck look
/// the same to the caller.
pub(crate) fn require_deck(user_id: &str, deck_id: i64, conn: &Connection) -> AppResult<Deck> {
    db::get_user_deck_by_id(user_id, deck_id, conn)?.ok_or(AppError::Forbidden("Deck"))
}
