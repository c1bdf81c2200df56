//! Card actions. Ownership is always checked through the card's deck.

use super::{require_deck, require_user};
use crate::database::db;
use crate::error::{AppError, AppResult};
use crate::models::{Card, CardDraft, Identity};
use rusqlite::Connection;

/// Cards of a deck the user owns, most recently updated first.
pub fn list_cards(identity: &Identity, deck_id: i64, conn: &Connection) -> AppResult<Vec<Card>> {
    let user_id = require_user(identity)?;
    require_deck(user_id, deck_id, conn)?;
    Ok(db::get_deck_cards(deck_id, conn)?)
}

fn require_card(user_id: &str, card_id: i64, conn: &Connection) -> AppResult<Card> {
    db::get_user_card_by_id(user_id, card_id, conn)?.ok_or(AppError::Forbidden("Card"))
}

pub fn create_card(
    identity: &Identity,
    deck_id: i64,
    draft: CardDraft,
    conn: &Connection,
) -> AppResult<Card> {
    let user_id = require_user(identity)?;
    let draft = draft.validate()?;
    require_deck(user_id, deck_id, conn)?;

    let card = db::insert_card(deck_id, &draft, conn)?;
    db::touch_deck(deck_id, conn)?;
    Ok(card)
}

pub fn update_card(
    identity: &Identity,
    card_id: i64,
    draft: CardDraft,
    conn: &Connection,
) -> AppResult<Card> {
    let user_id = require_user(identity)?;
    let draft = draft.validate()?;
    let existing = require_card(user_id, card_id, conn)?;

    let card = db::update_card(card_id, &draft, conn)?;
    db::touch_deck(existing.deck_id, conn)?;
    Ok(card)
}

pub fn delete_card(identity: &Identity, card_id: i64, conn: &Connection) -> AppResult<()> {
    let user_id = require_user(identity)?;
    let existing = require_card(user_id, card_id, conn)?;

    db::delete_card(card_id, conn)?;
    db::touch_deck(existing.deck_id, conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::decks::{create_deck, list_decks};
    use crate::actions::testing::{backdate_deck, deck_updated_at, free_user};
    use crate::models::DeckDraft;

    #[test]
    fn test_card_lifecycle_updates_deck() {
        let conn = db::open_in_memory().unwrap();
        let alice = free_user("alice");
        let deck = create_deck(&alice, DeckDraft::new("Spanish", None), &conn).unwrap();

        let before = backdate_deck(deck.id, &conn);
        let card = create_card(&alice, deck.id, CardDraft::new("hola", "hello"), &conn).unwrap();
        let summary = list_decks(&alice, &conn).unwrap().remove(0);
        assert_eq!(summary.card_count, 1);
        assert!(summary.deck.updated_at > before);

        let before = backdate_deck(deck.id, &conn);
        let card = update_card(&alice, card.id, CardDraft::new("hola", "hi"), &conn).unwrap();
        assert_eq!(list_cards(&alice, deck.id, &conn).unwrap(), vec![card.clone()]);
        assert!(deck_updated_at(deck.id, &conn) > before);

        let before = backdate_deck(deck.id, &conn);
        delete_card(&alice, card.id, &conn).unwrap();
        assert!(list_cards(&alice, deck.id, &conn).unwrap().is_empty());
        assert_eq!(list_decks(&alice, &conn).unwrap()[0].card_count, 0);
        assert!(deck_updated_at(deck.id, &conn) > before);
    }

    #[test]
    fn test_create_card_validates() {
        let conn = db::open_in_memory().unwrap();
        let alice = free_user("alice");
        let deck = create_deck(&alice, DeckDraft::new("Spanish", None), &conn).unwrap();

        let result = create_card(&alice, deck.id, CardDraft::new("hola", ""), &conn);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_cards_of_foreign_deck_are_forbidden() {
        let conn = db::open_in_memory().unwrap();
        let alice = free_user("alice");
        let bob = free_user("bob");
        let deck = create_deck(&alice, DeckDraft::new("Spanish", None), &conn).unwrap();
        let card = create_card(&alice, deck.id, CardDraft::new("hola", "hello"), &conn).unwrap();

        assert!(matches!(
            list_cards(&bob, deck.id, &conn),
            Err(AppError::Forbidden("Deck"))
        ));
        assert!(matches!(
            create_card(&bob, deck.id, CardDraft::new("x", "y"), &conn),
            Err(AppError::Forbidden("Deck"))
        ));
        assert!(matches!(
            update_card(&bob, card.id, CardDraft::new("x", "y"), &conn),
            Err(AppError::Forbidden("Card"))
        ));
        assert!(matches!(
            delete_card(&bob, card.id, &conn),
            Err(AppError::Forbidden("Card"))
        ));
        assert!(matches!(
            delete_card(&bob, 12345, &conn),
            Err(AppError::Forbidden("Card"))
        ));

        assert_eq!(list_cards(&alice, deck.id, &conn).unwrap().len(), 1);
    }
}
