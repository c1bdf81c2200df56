//! Card is a pair <front, back>. Only text is used on both sides
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    pub id: i64,
    pub deck_id: i64,
    pub front: String,
    pub back: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Front/back pair without identity: user input, or one item of AI output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardDraft {
    pub front: String,
    pub back: String,
}

impl CardDraft {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }

    pub fn validate(self) -> AppResult<Self> {
        if self.front.trim().is_empty() {
            return Err(AppError::Validation("Front is required".to_string()));
        }
        if self.back.trim().is_empty() {
            return Err(AppError::Validation("Back is required".to_string()));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_draft_requires_both_sides() {
        assert!(CardDraft::new("hola", "hello").validate().is_ok());
        assert!(matches!(
            CardDraft::new("", "hello").validate(),
            Err(AppError::Validation(msg)) if msg == "Front is required"
        ));
        assert!(matches!(
            CardDraft::new("hola", "  ").validate(),
            Err(AppError::Validation(msg)) if msg == "Back is required"
        ));
    }

    #[test]
    fn test_card_draft_deserializes_from_provider_shape() {
        let draft: CardDraft = serde_json::from_str(r#"{"front":"gracias","back":"thank you"}"#).unwrap();
        assert_eq!(draft.front, "gracias");
        assert_eq!(draft.back, "thank you");
    }
}
