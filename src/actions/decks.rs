//! Deck actions: listing, CRUD and duplication.

use super::{require_deck, require_user};
use crate::database::db;
use crate::error::{AppError, AppResult};
use crate::models::deck::MAX_DECK_NAME_LEN;
use crate::models::{CardDraft, Deck, DeckDraft, DeckSummary, Identity};
use rusqlite::Connection;
use tracing::info;

pub fn list_decks(identity: &Identity, conn: &Connection) -> AppResult<Vec<DeckSummary>> {
    let user_id = require_user(identity)?;
    Ok(db::get_user_decks(user_id, conn)?)
}

pub fn get_deck(identity: &Identity, deck_id: i64, conn: &Connection) -> AppResult<Deck> {
    let user_id = require_user(identity)?;
    require_deck(user_id, deck_id, conn)
}

/// Fails when the user's plan caps the number of decks and the cap is reached.
fn ensure_deck_capacity(identity: &Identity, user_id: &str, conn: &Connection) -> AppResult<()> {
    if let Some(limit) = identity.entitlements.deck_limit() {
        let count = db::get_user_deck_count(user_id, conn)?;
        if count >= limit {
            return Err(AppError::PlanLimitExceeded(format!(
                "You've reached the maximum of {} decks. Upgrade to Pro for unlimited decks.",
                limit
            )));
        }
    }
    Ok(())
}

pub fn create_deck(identity: &Identity, draft: DeckDraft, conn: &Connection) -> AppResult<Deck> {
    let user_id = require_user(identity)?;
    let draft = draft.validate()?;
    ensure_deck_capacity(identity, user_id, conn)?;

    let deck = db::insert_deck(user_id, &draft, conn)?;
    info!("Deck '{}' created ({})", deck.name, deck.id);
    Ok(deck)
}

pub fn update_deck(
    identity: &Identity,
    deck_id: i64,
    draft: DeckDraft,
    conn: &Connection,
) -> AppResult<Deck> {
    let user_id = require_user(identity)?;
    let draft = draft.validate()?;
    require_deck(user_id, deck_id, conn)?;

    Ok(db::update_deck(deck_id, &draft, conn)?)
}

/// Deletes a deck and, through the cascade, all of its cards.
pub fn delete_deck(identity: &Identity, deck_id: i64, conn: &Connection) -> AppResult<()> {
    let user_id = require_user(identity)?;
    require_deck(user_id, deck_id, conn)?;

    db::delete_deck(deck_id, conn)?;
    info!("Deck {} deleted", deck_id);
    Ok(())
}

const COPY_SUFFIX: &str = " (Copy)";

/// Name for a copy, shortening the original so the result stays within the
/// name limit.
fn copy_name(name: &str) -> String {
    let keep = MAX_DECK_NAME_LEN - COPY_SUFFIX.chars().count();
    let base: String = name.chars().take(keep).collect();
    format!("{}{}", base.trim_end(), COPY_SUFFIX)
}

/// Copies a deck and all its cards in one transaction. The copy starts with
/// the AI generation flag cleared.
pub fn duplicate_deck(identity: &Identity, deck_id: i64, conn: &mut Connection) -> AppResult<Deck> {
    let user_id = require_user(identity)?;
    let tx = conn.transaction()?;

    let original = require_deck(user_id, deck_id, &tx)?;
    ensure_deck_capacity(identity, user_id, &tx)?;

    let draft = DeckDraft {
        name: copy_name(&original.name),
        description: original.description.clone(),
    };
    let copy = db::insert_deck(user_id, &draft, &tx)?;

    let drafts: Vec<_> = db::get_deck_cards(original.id, &tx)?
        .into_iter()
        .map(|card| CardDraft::new(card.front, card.back))
        .collect();
    if !drafts.is_empty() {
        db::insert_cards(copy.id, &drafts, &tx)?;
    }

    tx.commit()?;
    info!(
        "Deck {} duplicated as {} with {} cards",
        original.id,
        copy.id,
        drafts.len()
    );
    Ok(copy)
}
