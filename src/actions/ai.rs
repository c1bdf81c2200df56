//! AI card generation for a deck.
//!
//! Split in three steps so the UI can run the provider call without holding
//! the database lock:
//! 1. `prepare_generation`: identity, plan access, ownership and the
//!    one-generation-per-deck check. No network.
//! 2. `generation::request_cards`: provider call plus count validation. No
//!    writes.
//! 3. `persist_generated`: one transaction that re-checks ownership, inserts
//!    the cards and sets the deck's flag.
//!
//! `generate_cards` runs all three in order.

use super::{require_deck, require_user};
use crate::database::db;
use crate::error::{AppError, AppResult};
use crate::generation::{self, CardGenerator, GenerationRequest};
use crate::models::{Card, CardDraft, Deck, Entitlements, Identity};
use rusqlite::Connection;
use tracing::info;

/// Whether the generate button should be offered for a deck, and why not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationGate {
    Available,
    NoAccess,
    AlreadyUsed,
    MissingDescription,
}

impl GenerationGate {
    pub fn check(entitlements: &Entitlements, deck: &Deck) -> Self {
        if !entitlements.has_ai_access() {
            GenerationGate::NoAccess
        } else if deck.ai_generation_used {
            GenerationGate::AlreadyUsed
        } else if !deck.has_description() {
            GenerationGate::MissingDescription
        } else {
            GenerationGate::Available
        }
    }

    pub fn is_available(self) -> bool {
        self == GenerationGate::Available
    }

    pub fn reason(self) -> Option<&'static str> {
        match self {
            GenerationGate::Available => None,
            GenerationGate::NoAccess => {
                Some("This is a paid feature. Upgrade your plan to generate flashcards with AI.")
            }
            GenerationGate::AlreadyUsed => Some("AI generation has already been used for this deck."),
            GenerationGate::MissingDescription => Some(
                "AI generation requires a deck description. Please add a description to your deck to generate flashcards with AI.",
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationOutcome {
    pub inserted_cards: Vec<Card>,
    pub count: usize,
}

/// Checks everything that can be checked before calling the provider.
pub fn prepare_generation(
    identity: &Identity,
    deck_id: i64,
    conn: &Connection,
) -> AppResult<GenerationRequest> {
    let user_id = require_user(identity)?;

    if !identity.entitlements.has_ai_access() {
        return Err(AppError::PlanLimitExceeded(
            "AI flashcard generation is not available on your plan. Upgrade to access this feature."
                .to_string(),
        ));
    }

    let deck = require_deck(user_id, deck_id, conn)?;
    if deck.ai_generation_used {
        return Err(AppError::GenerationAlreadyUsed);
    }

    Ok(GenerationRequest::new(
        deck.id,
        &deck.name,
        deck.description.as_deref(),
    ))
}

/// Stores validated cards and flags the deck, atomically.
pub fn persist_generated(
    identity: &Identity,
    deck_id: i64,
    cards: &[CardDraft],
    conn: &mut Connection,
) -> AppResult<GenerationOutcome> {
    let user_id = require_user(identity)?;
    let tx = conn.transaction()?;

    let deck = require_deck(user_id, deck_id, &tx)?;
    // another generation may have finished while the provider was busy
    if deck.ai_generation_used {
        return Err(AppError::GenerationAlreadyUsed);
    }

    let inserted_cards = db::insert_cards(deck_id, cards, &tx)?;
    db::mark_ai_generation_used(deck_id, &tx)?;
    tx.commit()?;

    info!(
        "Stored {} generated cards for deck: {}",
        inserted_cards.len(),
        deck.name
    );
    Ok(GenerationOutcome {
        count: inserted_cards.len(),
        inserted_cards,
    })
}

/// Generates exactly 20 cards for a deck the user owns.
pub fn generate_cards(
    identity: &Identity,
    deck_id: i64,
    generator: &dyn CardGenerator,
    conn: &mut Connection,
) -> AppResult<GenerationOutcome> {
    let request = prepare_generation(identity, deck_id, conn)?;
    let cards = generation::request_cards(generator, &request)?;
    persist_generated(identity, deck_id, &cards, conn)
}
