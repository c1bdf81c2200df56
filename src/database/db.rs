//! Database operations for the flashcard application
//!
//! Handles SQLite initialization and CRUD helpers for decks and cards.
//! Helpers that take a `user_id` are ownership-scoped: they only ever see rows
//! belonging to that user. Access decisions are made by the callers in
//! `crate::actions`.

use crate::models::{Card, CardDraft, Deck, DeckDraft, DeckSummary};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result, Row, params};
use std::path::Path;
use tracing::debug;

const DECK_COLUMNS: &str =
    "d.id, d.user_id, d.name, d.description, d.ai_generation_used, d.created_at, d.updated_at";
const CARD_COLUMNS: &str = "c.id, c.deck_id, c.front, c.back, c.created_at, c.updated_at";

/// Opens (or creates) the database file and makes sure the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    debug!("Opened database at {:?}", path);
    Ok(conn)
}

/// In-memory database with the full schema, used by tests
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Creates the decks and cards tables
///
/// Foreign keys are switched on per connection so that deleting a deck
/// removes its cards.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS decks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            ai_generation_used INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deck_id INTEGER NOT NULL,
            front TEXT NOT NULL,
            back TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            FOREIGN KEY (deck_id) REFERENCES decks(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_decks_user ON decks(user_id);
        CREATE INDEX IF NOT EXISTS idx_cards_deck ON cards(deck_id);
        "#,
    )
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

fn deck_from_row(row: &Row<'_>) -> Result<Deck> {
    Ok(Deck {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        ai_generation_used: row.get(4)?,
        created_at: from_millis(row.get(5)?),
        updated_at: from_millis(row.get(6)?),
    })
}

fn card_from_row(row: &Row<'_>) -> Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        deck_id: row.get(1)?,
        front: row.get(2)?,
        back: row.get(3)?,
        created_at: from_millis(row.get(4)?),
        updated_at: from_millis(row.get(5)?),
    })
}

// ==================== Deck Operations ====================

/// All decks of a user with card counts, most recently updated first
pub fn get_user_decks(user_id: &str, conn: &Connection) -> Result<Vec<DeckSummary>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DECK_COLUMNS}, (SELECT COUNT(*) FROM cards c WHERE c.deck_id = d.id)
         FROM decks d
         WHERE d.user_id = ?1
         ORDER BY d.updated_at DESC, d.id DESC"
    ))?;

    let decks = stmt
        .query_map(params![user_id], |row| {
            Ok(DeckSummary {
                deck: deck_from_row(row)?,
                card_count: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>>>()?;

    Ok(decks)
}

/// A deck by ID, only if the user owns it
pub fn get_user_deck_by_id(user_id: &str, deck_id: i64, conn: &Connection) -> Result<Option<Deck>> {
    conn.query_row(
        &format!("SELECT {DECK_COLUMNS} FROM decks d WHERE d.id = ?1 AND d.user_id = ?2"),
        params![deck_id, user_id],
        deck_from_row,
    )
    .optional()
}

fn get_deck_by_id(deck_id: i64, conn: &Connection) -> Result<Deck> {
    conn.query_row(
        &format!("SELECT {DECK_COLUMNS} FROM decks d WHERE d.id = ?1"),
        params![deck_id],
        deck_from_row,
    )
}

pub fn get_user_deck_count(user_id: &str, conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM decks WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )
}

/// Creates a deck owned by `user_id`
pub fn insert_deck(user_id: &str, draft: &DeckDraft, conn: &Connection) -> Result<Deck> {
    let now = now_millis();
    conn.execute(
        "INSERT INTO decks (user_id, name, description, ai_generation_used, created_at, updated_at)
         VALUES (?1, ?2, ?3, 0, ?4, ?4)",
        params![user_id, draft.name, draft.description, now],
    )?;
    get_deck_by_id(conn.last_insert_rowid(), conn)
}

pub fn update_deck(deck_id: i64, draft: &DeckDraft, conn: &Connection) -> Result<Deck> {
    conn.execute(
        "UPDATE decks SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
        params![draft.name, draft.description, now_millis(), deck_id],
    )?;
    get_deck_by_id(deck_id, conn)
}

/// Deletes a deck; its cards go with it through the cascade
pub fn delete_deck(deck_id: i64, conn: &Connection) -> Result<usize> {
    conn.execute("DELETE FROM decks WHERE id = ?1", params![deck_id])
}

/// Advances a deck's `updated_at` after its cards changed
pub fn touch_deck(deck_id: i64, conn: &Connection) -> Result<()> {
    conn.execute(
        "UPDATE decks SET updated_at = ?1 WHERE id = ?2",
        params![now_millis(), deck_id],
    )?;
    Ok(())
}

/// Sets the AI generation flag. Nothing clears it.
pub fn mark_ai_generation_used(deck_id: i64, conn: &Connection) -> Result<()> {
    conn.execute(
        "UPDATE decks SET ai_generation_used = 1, updated_at = ?1 WHERE id = ?2",
        params![now_millis(), deck_id],
    )?;
    Ok(())
}

// ==================== Card Operations ====================

/// Cards of a deck, most recently updated first
///
/// Cards sharing a timestamp (bulk inserts) keep their insertion order.
pub fn get_deck_cards(deck_id: i64, conn: &Connection) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CARD_COLUMNS} FROM cards c
         WHERE c.deck_id = ?1
         ORDER BY c.updated_at DESC, c.id ASC"
    ))?;

    let cards = stmt
        .query_map(params![deck_id], card_from_row)?
        .collect::<Result<Vec<_>>>()?;

    Ok(cards)
}

/// A card by ID, only if the user owns the deck it belongs to
pub fn get_user_card_by_id(user_id: &str, card_id: i64, conn: &Connection) -> Result<Option<Card>> {
    conn.query_row(
        &format!(
            "SELECT {CARD_COLUMNS} FROM cards c
             INNER JOIN decks d ON c.deck_id = d.id
             WHERE c.id = ?1 AND d.user_id = ?2"
        ),
        params![card_id, user_id],
        card_from_row,
    )
    .optional()
}

fn get_card_by_id(card_id: i64, conn: &Connection) -> Result<Card> {
    conn.query_row(
        &format!("SELECT {CARD_COLUMNS} FROM cards c WHERE c.id = ?1"),
        params![card_id],
        card_from_row,
    )
}

pub fn insert_card(deck_id: i64, draft: &CardDraft, conn: &Connection) -> Result<Card> {
    conn.execute(
        "INSERT INTO cards (deck_id, front, back, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
        params![deck_id, draft.front, draft.back, now_millis()],
    )?;
    get_card_by_id(conn.last_insert_rowid(), conn)
}

/// Inserts several cards in order, sharing one timestamp
///
/// Does not open its own transaction; callers that need atomicity pass a
/// `Transaction`.
pub fn insert_cards(deck_id: i64, drafts: &[CardDraft], conn: &Connection) -> Result<Vec<Card>> {
    let now = now_millis();
    let mut stmt = conn.prepare(
        "INSERT INTO cards (deck_id, front, back, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
    )?;

    let mut ids = Vec::with_capacity(drafts.len());
    for draft in drafts {
        ids.push(stmt.insert(params![deck_id, draft.front, draft.back, now])?);
    }

    ids.into_iter().map(|id| get_card_by_id(id, conn)).collect()
}

pub fn update_card(card_id: i64, draft: &CardDraft, conn: &Connection) -> Result<Card> {
    conn.execute(
        "UPDATE cards SET front = ?1, back = ?2, updated_at = ?3 WHERE id = ?4",
        params![draft.front, draft.back, now_millis(), card_id],
    )?;
    get_card_by_id(card_id, conn)
}

pub fn delete_card(card_id: i64, conn: &Connection) -> Result<usize> {
    conn.execute("DELETE FROM cards WHERE id = ?1", params![card_id])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> DeckDraft {
        DeckDraft::new(name, Some("desc"))
    }

    #[test]
    fn test_insert_and_fetch_deck() {
        let conn = open_in_memory().unwrap();
        let deck = insert_deck("alice", &draft("Polish"), &conn).unwrap();

        assert_eq!(deck.owner_id, "alice");
        assert_eq!(deck.name, "Polish");
        assert_eq!(deck.description.as_deref(), Some("desc"));
        assert!(!deck.ai_generation_used);

        let fetched = get_user_deck_by_id("alice", deck.id, &conn).unwrap();
        assert_eq!(fetched, Some(deck));
    }

    #[test]
    fn test_deck_scoped_to_owner() {
        let conn = open_in_memory().unwrap();
        let deck = insert_deck("alice", &draft("Polish"), &conn).unwrap();

        assert_eq!(get_user_deck_by_id("bob", deck.id, &conn).unwrap(), None);
        assert_eq!(get_user_deck_count("bob", &conn).unwrap(), 0);
        assert!(get_user_decks("bob", &conn).unwrap().is_empty());
    }

    #[test]
    fn test_user_decks_have_card_counts() {
        let conn = open_in_memory().unwrap();
        let a = insert_deck("alice", &draft("A"), &conn).unwrap();
        insert_deck("alice", &draft("B"), &conn).unwrap();
        insert_cards(
            a.id,
            &[CardDraft::new("1", "one"), CardDraft::new("2", "two")],
            &conn,
        )
        .unwrap();

        let decks = get_user_decks("alice", &conn).unwrap();
        assert_eq!(decks.len(), 2);
        let a_summary = decks.iter().find(|d| d.deck.id == a.id).unwrap();
        assert_eq!(a_summary.card_count, 2);
    }

    #[test]
    fn test_delete_deck_cascades_to_cards() {
        let conn = open_in_memory().unwrap();
        let deck = insert_deck("alice", &draft("Polish"), &conn).unwrap();
        let card = insert_card(deck.id, &CardDraft::new("cześć", "hello"), &conn).unwrap();

        assert_eq!(delete_deck(deck.id, &conn).unwrap(), 1);
        assert_eq!(get_user_card_by_id("alice", card.id, &conn).unwrap(), None);
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_card_requires_existing_deck() {
        let conn = open_in_memory().unwrap();
        let result = insert_card(999, &CardDraft::new("a", "b"), &conn);
        assert!(result.is_err());
    }

    #[test]
    fn test_card_scoped_through_deck_owner() {
        let conn = open_in_memory().unwrap();
        let deck = insert_deck("alice", &draft("Polish"), &conn).unwrap();
        let card = insert_card(deck.id, &CardDraft::new("proszę", "please"), &conn).unwrap();

        assert_eq!(
            get_user_card_by_id("alice", card.id, &conn).unwrap(),
            Some(card.clone())
        );
        assert_eq!(get_user_card_by_id("bob", card.id, &conn).unwrap(), None);
    }

    #[test]
    fn test_bulk_insert_keeps_order() {
        let conn = open_in_memory().unwrap();
        let deck = insert_deck("alice", &draft("Numbers"), &conn).unwrap();
        let drafts: Vec<CardDraft> = (1..=5)
            .map(|i| CardDraft::new(format!("front {}", i), format!("back {}", i)))
            .collect();

        let inserted = insert_cards(deck.id, &drafts, &conn).unwrap();
        assert_eq!(inserted.len(), 5);

        let fronts: Vec<String> = get_deck_cards(deck.id, &conn)
            .unwrap()
            .into_iter()
            .map(|c| c.front)
            .collect();
        assert_eq!(fronts, vec!["front 1", "front 2", "front 3", "front 4", "front 5"]);
    }

    #[test]
    fn test_mark_ai_generation_used() {
        let conn = open_in_memory().unwrap();
        let deck = insert_deck("alice", &draft("Polish"), &conn).unwrap();
        mark_ai_generation_used(deck.id, &conn).unwrap();

        let deck = get_user_deck_by_id("alice", deck.id, &conn).unwrap().unwrap();
        assert!(deck.ai_generation_used);
    }

    #[test]
    fn test_update_card() {
        let conn = open_in_memory().unwrap();
        let deck = insert_deck("alice", &draft("Polish"), &conn).unwrap();
        let card = insert_card(deck.id, &CardDraft::new("dziękuję", "thanks"), &conn).unwrap();

        let updated = update_card(card.id, &CardDraft::new("dziękuję", "thank you"), &conn).unwrap();
        assert_eq!(updated.back, "thank you");
        assert!(updated.updated_at >= card.updated_at);
    }
}
