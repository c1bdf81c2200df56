pub mod card;
pub mod deck;
pub mod entitlements;
pub mod study_session;

pub use card::{Card, CardDraft};
pub use deck::{Deck, DeckDraft, DeckSummary};
pub use entitlements::{Entitlements, Feature, Identity, PlanTier};
pub use study_session::{StudyCommand, StudyKey, StudyPhase, StudyResult, StudySession};
