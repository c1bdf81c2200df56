//! Identity and plan flags handed to us by the identity/billing provider.
//!
//! Flags are opaque: they are read, never computed. The only plan logic in
//! this crate is the handful of checks built on top of `has`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const FREE_PLAN_DECK_LIMIT: i64 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    #[serde(rename = "unlimited_decks")]
    UnlimitedDecks,
    #[serde(rename = "3_decks_limit")]
    ThreeDecksLimit,
    #[serde(rename = "ai_flashcards_generation")]
    AiFlashcardsGeneration,
    #[serde(rename = "one_ai_flashcards_generation")]
    OneAiFlashcardsGeneration,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Pro,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlements {
    #[serde(default)]
    pub plan: PlanTier,
    #[serde(default)]
    pub features: BTreeSet<Feature>,
}

impl Entitlements {
    pub fn new(plan: PlanTier, features: impl IntoIterator<Item = Feature>) -> Self {
        Self {
            plan,
            features: features.into_iter().collect(),
        }
    }

    pub fn has(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub fn has_ai_access(&self) -> bool {
        self.has(Feature::AiFlashcardsGeneration) || self.has(Feature::OneAiFlashcardsGeneration)
    }

    /// Deck cap for this user, `None` when unlimited.
    pub fn deck_limit(&self) -> Option<i64> {
        if self.has(Feature::UnlimitedDecks) || !self.has(Feature::ThreeDecksLimit) {
            None
        } else {
            Some(FREE_PLAN_DECK_LIMIT)
        }
    }
}

/// The signed-in user as seen by the action layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<String>,
    pub entitlements: Entitlements,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, entitlements: Entitlements) -> Self {
        Self {
            user_id: Some(user_id.into()),
            entitlements,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}
