//! Study session management for one pass through a deck.
//! Tracks the working card order, the cursor, flip state and pass/fail results.
//!
//! A session is a plain value: every transition takes it by value and returns
//! the next session. Invalid transitions return the session unchanged. Nothing
//! here is persisted.

use super::Card;
use rand::Rng;

/// Where the session is for the current card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StudyPhase {
    /// Front shown.
    Question,
    /// Back shown, waiting for a grade.
    Answer,
    /// Last card graded.
    Complete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StudyResult {
    pub card_id: i64,
    pub correct: bool,
}

/// Commands reachable from the keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StudyCommand {
    Reveal,
    Grade(bool),
    Next,
    Previous,
}

/// Keys the study screen listens to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StudyKey {
    Space,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Digit1,
    Digit2,
}

impl StudyKey {
    pub fn command(self) -> StudyCommand {
        match self {
            StudyKey::Space | StudyKey::ArrowDown => StudyCommand::Reveal,
            StudyKey::Digit1 => StudyCommand::Grade(false),
            StudyKey::Digit2 => StudyCommand::Grade(true),
            StudyKey::ArrowRight => StudyCommand::Next,
            StudyKey::ArrowLeft => StudyCommand::Previous,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StudySession {
    deck_name: String,
    cards: Vec<Card>,
    index: usize,
    phase: StudyPhase,
    results: Vec<StudyResult>,
}

impl StudySession {
    /// Starts a session over `cards` in the given order. Returns `None` for an
    /// empty deck, which has nothing to study.
    pub fn new(deck_name: impl Into<String>, cards: Vec<Card>) -> Option<Self> {
        if cards.is_empty() {
            return None;
        }
        Some(Self {
            deck_name: deck_name.into(),
            cards,
            index: 0,
            phase: StudyPhase::Question,
            results: Vec::new(),
        })
    }

    pub fn deck_name(&self) -> &str {
        &self.deck_name
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.cards.get(self.index)
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> StudyPhase {
        self.phase
    }

    pub fn results(&self) -> &[StudyResult] {
        &self.results
    }

    pub fn is_complete(&self) -> bool {
        self.phase == StudyPhase::Complete
    }

    pub fn is_last_card(&self) -> bool {
        self.index + 1 == self.cards.len()
    }

    // ==================== Transitions ====================

    /// Shows the back of the current card.
    pub fn reveal(mut self) -> Self {
        if self.phase == StudyPhase::Question {
            self.phase = StudyPhase::Answer;
        }
        self
    }

    /// Records a result for the current card and moves on. Only valid once the
    /// answer is showing.
    pub fn grade(mut self, correct: bool) -> Self {
        if self.phase != StudyPhase::Answer {
            return self;
        }
        let Some(card) = self.cards.get(self.index) else {
            return self;
        };

        self.results.push(StudyResult {
            card_id: card.id,
            correct,
        });

        if self.is_last_card() {
            self.phase = StudyPhase::Complete;
        } else {
            self.index += 1;
            self.phase = StudyPhase::Question;
        }
        self
    }

    /// Reorders the cards with a uniform random permutation and starts over.
    pub fn shuffle(self) -> Self {
        self.shuffle_with(&mut rand::thread_rng())
    }

    /// Fisher-Yates over the working order using the given generator.
    pub fn shuffle_with<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
        for i in (1..self.cards.len()).rev() {
            let j = rng.gen_range(0..=i);
            self.cards.swap(i, j);
        }
        self.reset_to(0)
    }

    /// Starts over in the current order.
    pub fn restart(self) -> Self {
        self.reset_to(0)
    }

    /// After completion, jumps to the first card (in current order) that was
    /// answered incorrectly. The session then runs on from that card.
    pub fn review_incorrect(self) -> Self {
        if !self.is_complete() {
            return self;
        }

        let first_incorrect = self.cards.iter().position(|card| {
            self.results
                .iter()
                .any(|r| !r.correct && r.card_id == card.id)
        });

        match first_incorrect {
            Some(index) => self.reset_to(index),
            None => self,
        }
    }

    /// Moves to the next card without grading the current one.
    pub fn next(mut self) -> Self {
        if !self.is_complete() && !self.is_last_card() {
            self.index += 1;
            self.phase = StudyPhase::Question;
        }
        self
    }

    /// Moves to the previous card without grading the current one.
    pub fn previous(mut self) -> Self {
        if !self.is_complete() && self.index > 0 {
            self.index -= 1;
            self.phase = StudyPhase::Question;
        }
        self
    }

    /// Applies a keyboard command. Keys are ignored once the session is
    /// complete.
    pub fn apply(self, command: StudyCommand) -> Self {
        if self.is_complete() {
            return self;
        }
        match command {
            StudyCommand::Reveal => self.reveal(),
            StudyCommand::Grade(correct) => self.grade(correct),
            StudyCommand::Next => self.next(),
            StudyCommand::Previous => self.previous(),
        }
    }

    fn reset_to(mut self, index: usize) -> Self {
        self.index = index;
        self.phase = StudyPhase::Question;
        self.results.clear();
        self
    }

    // ==================== Statistics ====================

    pub fn total_count(&self) -> usize {
        self.cards.len()
    }

    pub fn completed_count(&self) -> usize {
        self.results.len()
    }

    pub fn correct_count(&self) -> usize {
        self.results.iter().filter(|r| r.correct).count()
    }

    pub fn incorrect_count(&self) -> usize {
        self.results.iter().filter(|r| !r.correct).count()
    }

    pub fn progress_percent(&self) -> f64 {
        if self.cards.is_empty() {
            return 0.0;
        }
        self.completed_count() as f64 / self.total_count() as f64 * 100.0
    }

    /// Rounded share of correct answers, `None` until something is graded.
    pub fn accuracy_percent(&self) -> Option<u32> {
        let completed = self.completed_count();
        if completed == 0 {
            return None;
        }
        Some((self.correct_count() as f64 / completed as f64 * 100.0).round() as u32)
    }

    pub fn is_perfect(&self) -> bool {
        self.is_complete() && self.correct_count() == self.total_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn card(id: i64) -> Card {
        let now = Utc::now();
        Card {
            id,
            deck_id: 1,
            front: format!("front {}", id),
            back: format!("back {}", id),
            created_at: now,
            updated_at: now,
        }
    }

    fn session(n: i64) -> StudySession {
        StudySession::new("Test Deck", (1..=n).map(card).collect()).unwrap()
    }

    fn ids(session: &StudySession) -> Vec<i64> {
        session.cards().iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_empty_deck_has_no_session() {
        assert!(StudySession::new("Empty", Vec::new()).is_none());
    }

    #[test]
    fn test_reveal_only_from_question() {
        let s = session(2).reveal();
        assert_eq!(s.phase(), StudyPhase::Answer);

        let again = s.clone().reveal();
        assert_eq!(again, s);
    }

    #[test]
    fn test_grade_in_question_is_noop() {
        let s = session(3);
        let graded = s.clone().grade(true);
        assert_eq!(graded, s);
        assert!(graded.results().is_empty());
    }

    #[test]
    fn test_grade_non_last_advances_by_one() {
        let s = session(3).reveal().grade(false);
        assert_eq!(s.current_index(), 1);
        assert_eq!(s.phase(), StudyPhase::Question);
        assert_eq!(
            s.results(),
            &[StudyResult {
                card_id: 1,
                correct: false
            }]
        );
    }

    #[test]
    fn test_grade_last_card_completes() {
        let s = session(2).reveal().grade(true).reveal().grade(true);
        assert_eq!(s.phase(), StudyPhase::Complete);
        assert_eq!(s.current_index(), 1);
    }

    #[test]
    fn test_all_correct_run() {
        let n = 7;
        let mut s = session(n);
        for _ in 0..n {
            s = s.reveal().grade(true);
        }
        assert!(s.is_complete());
        assert_eq!(s.correct_count(), n as usize);
        assert_eq!(s.accuracy_percent(), Some(100));
        assert!((s.progress_percent() - 100.0).abs() < f64::EPSILON);
        assert!(s.is_perfect());
    }

    #[test]
    fn test_accuracy_rounds() {
        // 2 of 3 correct is 66.67%
        let s = session(3)
            .reveal()
            .grade(true)
            .reveal()
            .grade(false)
            .reveal()
            .grade(true);
        assert_eq!(s.accuracy_percent(), Some(67));
        assert_eq!(s.incorrect_count(), 1);
        assert!(!s.is_perfect());
    }

    #[test]
    fn test_accuracy_undefined_before_grading() {
        let s = session(3);
        assert_eq!(s.accuracy_percent(), None);
        assert_eq!(s.progress_percent(), 0.0);
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = StdRng::seed_from_u64(42);
        for n in 1..=12 {
            let s = session(n).reveal().grade(true);
            let shuffled = s.shuffle_with(&mut rng);

            let mut sorted = ids(&shuffled);
            sorted.sort();
            assert_eq!(sorted, (1..=n).collect::<Vec<_>>());
            assert_eq!(shuffled.current_index(), 0);
            assert_eq!(shuffled.phase(), StudyPhase::Question);
            assert!(shuffled.results().is_empty());
        }
    }

    #[test]
    fn test_shuffle_from_complete_restarts() {
        let s = session(1).reveal().grade(false);
        assert!(s.is_complete());
        let s = s.shuffle();
        assert_eq!(s.phase(), StudyPhase::Question);
        assert_eq!(s.total_count(), 1);
    }

    #[test]
    fn test_restart_keeps_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let s = session(5).shuffle_with(&mut rng);
        let order = ids(&s);

        let s = s.reveal().grade(true).reveal().restart();
        assert_eq!(ids(&s), order);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.phase(), StudyPhase::Question);
        assert!(s.results().is_empty());
    }

    #[test]
    fn test_review_incorrect_without_mistakes_is_noop() {
        let s = session(2).reveal().grade(true).reveal().grade(true);
        let reviewed = s.clone().review_incorrect();
        assert_eq!(reviewed, s);
    }

    #[test]
    fn test_review_incorrect_jumps_to_first_incorrect() {
        let s = session(4)
            .reveal()
            .grade(true)
            .reveal()
            .grade(false)
            .reveal()
            .grade(true)
            .reveal()
            .grade(false);
        assert!(s.is_complete());

        let s = s.review_incorrect();
        assert_eq!(s.current_index(), 1);
        assert_eq!(s.phase(), StudyPhase::Question);
        assert!(s.results().is_empty());
    }

    #[test]
    fn test_review_incorrect_before_complete_is_noop() {
        let s = session(3).reveal().grade(false);
        let reviewed = s.clone().review_incorrect();
        assert_eq!(reviewed, s);
    }

    #[test]
    fn test_navigation_skips_grading() {
        let s = session(3).reveal().next();
        assert_eq!(s.current_index(), 1);
        assert_eq!(s.phase(), StudyPhase::Question);
        assert!(s.results().is_empty());

        let s = s.next().next();
        assert_eq!(s.current_index(), 2, "next stops at the last card");

        let s = s.previous().previous().previous();
        assert_eq!(s.current_index(), 0, "previous stops at the first card");
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(StudyKey::Space.command(), StudyCommand::Reveal);
        assert_eq!(StudyKey::ArrowDown.command(), StudyCommand::Reveal);
        assert_eq!(StudyKey::Digit1.command(), StudyCommand::Grade(false));
        assert_eq!(StudyKey::Digit2.command(), StudyCommand::Grade(true));
        assert_eq!(StudyKey::ArrowLeft.command(), StudyCommand::Previous);
        assert_eq!(StudyKey::ArrowRight.command(), StudyCommand::Next);
    }

    #[test]
    fn test_keys_ignored_when_complete() {
        let s = session(2).reveal().grade(true).reveal().grade(true);
        let after = s
            .clone()
            .apply(StudyCommand::Previous)
            .apply(StudyCommand::Reveal);
        assert_eq!(after, s);
    }

    #[test]
    fn test_keyboard_run() {
        let keys = [
            StudyKey::Space,
            StudyKey::Digit2,
            StudyKey::ArrowDown,
            StudyKey::Digit1,
        ];
        let s = keys
            .iter()
            .fold(session(2), |s, key| s.apply(key.command()));
        assert!(s.is_complete());
        assert_eq!(s.correct_count(), 1);
        assert_eq!(s.incorrect_count(), 1);
        assert_eq!(s.accuracy_percent(), Some(50));
    }
}
