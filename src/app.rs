//! Main application UI and state management.
//! Handles the deck dashboard, the deck screen with card management and AI
//! generation, and study sessions.

use chrono::{DateTime, Local, Utc};
use eframe::egui;
use flashdeck::actions::{self, GenerationGate, GenerationOutcome};
use flashdeck::generation::{self, CardGenerator};
use flashdeck::models::{
    Card, CardDraft, Deck, DeckDraft, DeckSummary, Feature, Identity, StudyCommand, StudyKey,
    StudyPhase, StudySession,
};
use flashdeck::{AppError, AppResult};
use rusqlite::Connection;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex};
use tracing::{error, info};

const CORRECT_COLOR: egui::Color32 = egui::Color32::from_rgb(22, 163, 74);
const INCORRECT_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 38, 38);

/// Application screen states
#[derive(Clone, Copy, Default, PartialEq)]
enum AppScreen {
    #[default]
    Dashboard,
    Deck(i64),
    Study(i64),
}

/// Destructive actions waiting for a yes/no
#[derive(Clone, Copy)]
enum PendingDelete {
    Deck(i64),
    Card(i64),
}

/// Deck screen actions, executed after rendering
enum DeckAction {
    Back,
    StartStudy,
    EditDeck,
    SaveDeck,
    CancelEditDeck,
    Duplicate,
    Delete,
    Generate,
    AddCard,
    EditCard(Card),
    SaveCard,
    CancelEditCard,
    DeleteCard(i64),
}

/// Study screen actions, executed after rendering
enum StudyAction {
    Command(StudyCommand),
    Shuffle,
    Restart,
    ReviewIncorrect,
    Back,
}

struct CardEditor {
    card_id: i64,
    front: String,
    back: String,
}

/// Main application state
pub struct MyApp {
    conn: Arc<Mutex<Connection>>,
    identity: Identity,
    generator: Arc<dyn CardGenerator>,

    current_screen: AppScreen,
    decks: Vec<DeckSummary>,
    current_deck: Option<Deck>,
    current_cards: Vec<Card>,
    study_session: Option<StudySession>,

    new_deck_name: String,
    new_deck_description: String,
    deck_editor: Option<DeckDraft>,
    new_card_front: String,
    new_card_back: String,
    card_editor: Option<CardEditor>,

    generation_rx: Option<Receiver<AppResult<GenerationOutcome>>>,

    pending_delete: Option<PendingDelete>,
    show_confirmation_dialog: bool,
    allowed_to_close: bool,
    message: Option<String>,
}

/// Formats a stored timestamp as local YYYY-MM-DD HH:MM
fn format_timestamp(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Study keys pressed this frame, in a fixed order
fn pressed_study_keys(ctx: &egui::Context) -> Vec<StudyKey> {
    const BINDINGS: [(egui::Key, StudyKey); 6] = [
        (egui::Key::Space, StudyKey::Space),
        (egui::Key::ArrowDown, StudyKey::ArrowDown),
        (egui::Key::ArrowLeft, StudyKey::ArrowLeft),
        (egui::Key::ArrowRight, StudyKey::ArrowRight),
        (egui::Key::Num1, StudyKey::Digit1),
        (egui::Key::Num2, StudyKey::Digit2),
    ];

    ctx.input(|i| {
        BINDINGS
            .iter()
            .filter(|(key, _)| i.key_pressed(*key))
            .map(|(_, study_key)| *study_key)
            .collect()
    })
}

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_generation();

        match self.current_screen {
            AppScreen::Dashboard => self.render_dashboard(ctx),
            AppScreen::Deck(_) => self.render_deck_screen(ctx),
            AppScreen::Study(_) => self.render_study_screen(ctx),
        }

        // Handle window close requests with confirmation dialog
        if ctx.input(|i| i.viewport().close_requested()) && !self.allowed_to_close {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.show_confirmation_dialog = true;
        }

        if self.show_confirmation_dialog {
            egui::Window::new("Do you want to quit?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    if self.study_session.is_some() {
                        ui.label("Study progress is not saved.");
                    }
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = false;
                        }

                        if ui.button("Yes").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = true;
                            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                });
        }

        if let Some(pending) = self.pending_delete {
            let mut confirmed = false;
            let mut cancelled = false;
            let prompt = match pending {
                PendingDelete::Deck(_) => "Delete this deck and all of its cards?",
                PendingDelete::Card(_) => "Delete this card?",
            };

            egui::Window::new("Confirm delete")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(prompt);
                    ui.horizontal(|ui| {
                        if ui.button("Cancel").clicked() {
                            cancelled = true;
                        }
                        if ui.button("Delete").clicked() {
                            confirmed = true;
                        }
                    });
                });

            if confirmed {
                self.pending_delete = None;
                self.handle_delete(pending);
            } else if cancelled {
                self.pending_delete = None;
            }
        }

        if let Some(message) = &self.message {
            let mut dismissed = false;
            egui::Window::new("Flashdeck")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(message.as_str());
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
            if dismissed {
                self.message = None;
            }
        }
    }
}

impl MyApp {
    /// Creates the application and loads the signed-in user's decks
    pub fn new(conn: Connection, identity: Identity, generator: Arc<dyn CardGenerator>) -> Self {
        let mut app = Self {
            conn: Arc::new(Mutex::new(conn)),
            identity,
            generator,
            current_screen: AppScreen::Dashboard,
            decks: Vec::new(),
            current_deck: None,
            current_cards: Vec::new(),
            study_session: None,
            new_deck_name: String::new(),
            new_deck_description: String::new(),
            deck_editor: None,
            new_card_front: String::new(),
            new_card_back: String::new(),
            card_editor: None,
            generation_rx: None,
            pending_delete: None,
            show_confirmation_dialog: false,
            allowed_to_close: false,
            message: None,
        };
        if app.identity.user_id.is_some() {
            app.refresh_decks();
            info!("Loaded {} decks from database", app.decks.len());
        }
        app
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> AppResult<T>) -> AppResult<T> {
        let mut guard = self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut *guard)
    }

    /// Shows an error to the user and hands back the value on success
    fn report<T>(&mut self, result: AppResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                error!("{}", e);
                self.message = Some(e.to_string());
                None
            }
        }
    }

    fn refresh_decks(&mut self) {
        let result = self.with_conn(|conn| actions::list_decks(&self.identity, conn));
        if let Some(decks) = self.report(result) {
            self.decks = decks;
        }
    }

    /// Loads a deck and its cards, going back to the dashboard if that fails
    fn open_deck(&mut self, deck_id: i64) {
        let result = self.with_conn(|conn| {
            let deck = actions::get_deck(&self.identity, deck_id, conn)?;
            let cards = actions::list_cards(&self.identity, deck_id, conn)?;
            Ok((deck, cards))
        });

        match self.report(result) {
            Some((deck, cards)) => {
                self.current_deck = Some(deck);
                self.current_cards = cards;
                self.current_screen = AppScreen::Deck(deck_id);
            }
            None => {
                self.current_deck = None;
                self.current_cards.clear();
                self.current_screen = AppScreen::Dashboard;
            }
        }
        self.refresh_decks();
    }

    fn go_to_dashboard(&mut self) {
        self.current_deck = None;
        self.current_cards.clear();
        self.deck_editor = None;
        self.card_editor = None;
        self.study_session = None;
        self.current_screen = AppScreen::Dashboard;
        self.refresh_decks();
    }

    /// Loads the deck's cards once and starts an in-memory session
    fn start_study_session(&mut self, deck_id: i64) {
        let result = self.with_conn(|conn| {
            let deck = actions::get_deck(&self.identity, deck_id, conn)?;
            let cards = actions::list_cards(&self.identity, deck_id, conn)?;
            Ok((deck, cards))
        });

        if let Some((deck, cards)) = self.report(result) {
            match StudySession::new(deck.name, cards) {
                Some(session) => {
                    self.study_session = Some(session);
                    self.current_screen = AppScreen::Study(deck_id);
                }
                None => {
                    self.message = Some(
                        "This deck doesn't have any cards yet. Add some cards to start studying!"
                            .to_string(),
                    );
                }
            }
        }
    }

    fn update_session(&mut self, f: impl FnOnce(StudySession) -> StudySession) {
        if let Some(session) = self.study_session.take() {
            self.study_session = Some(f(session));
        }
    }

    fn handle_delete(&mut self, pending: PendingDelete) {
        match pending {
            PendingDelete::Deck(deck_id) => {
                let result = self.with_conn(|conn| actions::delete_deck(&self.identity, deck_id, conn));
                if self.report(result).is_some() {
                    self.go_to_dashboard();
                }
            }
            PendingDelete::Card(card_id) => {
                let result = self.with_conn(|conn| actions::delete_card(&self.identity, card_id, conn));
                self.report(result);
                if let AppScreen::Deck(deck_id) = self.current_screen {
                    self.open_deck(deck_id);
                }
            }
        }
    }

    // ==================== AI Generation ====================

    /// Checks access up front, then runs the provider call on a worker thread.
    /// The database lock is not held while the provider works.
    fn start_generation(&mut self, ctx: &egui::Context, deck_id: i64) {
        if self.generation_rx.is_some() {
            return;
        }

        let result = self.with_conn(|conn| actions::prepare_generation(&self.identity, deck_id, conn));
        let Some(request) = self.report(result) else {
            return;
        };

        let (tx, rx) = mpsc::channel();
        let conn = Arc::clone(&self.conn);
        let identity = self.identity.clone();
        let generator = Arc::clone(&self.generator);
        let ctx = ctx.clone();

        std::thread::spawn(move || {
            let result = generation::request_cards(generator.as_ref(), &request).and_then(|cards| {
                let mut guard = conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                actions::persist_generated(&identity, deck_id, &cards, &mut *guard)
            });
            let _ = tx.send(result);
            ctx.request_repaint();
        });

        self.generation_rx = Some(rx);
    }

    fn poll_generation(&mut self) {
        let Some(rx) = &self.generation_rx else {
            return;
        };

        match rx.try_recv() {
            Ok(result) => {
                self.generation_rx = None;
                if let Some(outcome) = self.report(result) {
                    self.message = Some(format!(
                        "Successfully generated {} flashcards!",
                        outcome.count
                    ));
                }
                if let AppScreen::Deck(deck_id) = self.current_screen {
                    self.open_deck(deck_id);
                }
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.generation_rx = None;
                self.report::<()>(Err(AppError::ProviderGeneric(
                    "generation worker stopped unexpectedly".to_string(),
                )));
            }
        }
    }

    // ==================== Dashboard ====================

    /// Renders the dashboard with the deck list and the create form
    fn render_dashboard(&mut self, ctx: &egui::Context) {
        let mut action_open: Option<i64> = None;
        let mut action_study: Option<i64> = None;
        let mut action_create = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(user_id) = self.identity.user_id.clone() else {
                ui.heading("Not signed in");
                ui.label("Set identity.user_id in the config file to manage decks.");
                return;
            };

            let entitlements = &self.identity.entitlements;
            let deck_limit = entitlements.deck_limit();
            let at_limit = deck_limit.is_some_and(|limit| self.decks.len() as i64 >= limit);

            ui.horizontal(|ui| {
                ui.label(format!("Signed in as {}", user_id));
                ui.separator();
                ui.label(format!("Plan: {:?}", entitlements.plan));
            });
            if let Some(limit) = deck_limit {
                ui.label(format!("{} / {} decks used", self.decks.len(), limit));
                if at_limit {
                    ui.colored_label(
                        INCORRECT_COLOR,
                        "Deck limit reached. Upgrade to Pro for unlimited decks.",
                    );
                }
            }
            ui.separator();

            // Deck creation section
            ui.heading("Create New Deck");
            ui.horizontal(|ui| {
                ui.label("Name:");
                ui.text_edit_singleline(&mut self.new_deck_name);
            });
            ui.label("Description:");
            ui.add(egui::TextEdit::multiline(&mut self.new_deck_description).desired_rows(2));
            if ui
                .add_enabled(!at_limit, egui::Button::new("Create Deck"))
                .on_disabled_hover_text("Deck limit reached")
                .clicked()
            {
                action_create = true;
            }

            ui.separator();
            ui.heading(format!("Decks ({})", self.decks.len()));

            egui::ScrollArea::vertical()
                .id_source("decks_list")
                .show(ui, |ui| {
                    if self.decks.is_empty() {
                        ui.label("No decks yet. Create one above.");
                    }
                    for summary in &self.decks {
                        ui.horizontal(|ui| {
                            let label = format!(
                                "{} ({} cards)",
                                summary.deck.name, summary.card_count
                            );
                            if ui.selectable_label(false, label).clicked() {
                                action_open = Some(summary.deck.id);
                            }
                            if ui
                                .add_enabled(summary.card_count > 0, egui::Button::new("Study"))
                                .clicked()
                            {
                                action_study = Some(summary.deck.id);
                            }
                            ui.small(format!("updated {}", format_timestamp(summary.deck.updated_at)));
                        });
                    }
                });
        });

        // Execute deferred actions
        if action_create {
            let description = Some(self.new_deck_description.as_str());
            let draft = DeckDraft::new(self.new_deck_name.clone(), description);
            let result = self.with_conn(|conn| actions::create_deck(&self.identity, draft, conn));
            if self.report(result).is_some() {
                self.new_deck_name.clear();
                self.new_deck_description.clear();
                self.refresh_decks();
            }
        }
        if let Some(deck_id) = action_open {
            self.open_deck(deck_id);
        }
        if let Some(deck_id) = action_study {
            self.start_study_session(deck_id);
        }
    }

    // ==================== Deck Screen ====================

    /// Renders one deck: its details, card management and AI generation
    fn render_deck_screen(&mut self, ctx: &egui::Context) {
        let Some(deck) = self.current_deck.clone() else {
            self.go_to_dashboard();
            return;
        };
        let gate = GenerationGate::check(&self.identity.entitlements, &deck);
        let generating = self.generation_rx.is_some();
        let mut actions_queue: Vec<DeckAction> = Vec::new();

        egui::CentralPanel::default().show(ctx, |ui| {
            if ui.button("← Back to Dashboard").clicked() {
                actions_queue.push(DeckAction::Back);
            }
            ui.separator();

            match &mut self.deck_editor {
                Some(editor) => {
                    ui.heading("Edit Deck");
                    ui.horizontal(|ui| {
                        ui.label("Name:");
                        ui.text_edit_singleline(&mut editor.name);
                    });
                    ui.label("Description:");
                    let description = editor.description.get_or_insert_with(String::new);
                    ui.add(egui::TextEdit::multiline(description).desired_rows(2));
                    ui.horizontal(|ui| {
                        if ui.button("Save").clicked() {
                            actions_queue.push(DeckAction::SaveDeck);
                        }
                        if ui.button("Cancel").clicked() {
                            actions_queue.push(DeckAction::CancelEditDeck);
                        }
                    });
                }
                None => {
                    ui.heading(deck.name.as_str());
                    if let Some(description) = deck.description.as_deref() {
                        ui.label(description);
                    }
                    ui.small(format!(
                        "{} cards · created {} · updated {}",
                        self.current_cards.len(),
                        format_timestamp(deck.created_at),
                        format_timestamp(deck.updated_at)
                    ));
                    ui.horizontal(|ui| {
                        if ui
                            .add_enabled(!self.current_cards.is_empty(), egui::Button::new("Study"))
                            .clicked()
                        {
                            actions_queue.push(DeckAction::StartStudy);
                        }
                        if ui.button("Edit").clicked() {
                            actions_queue.push(DeckAction::EditDeck);
                        }
                        if ui.button("Duplicate").clicked() {
                            actions_queue.push(DeckAction::Duplicate);
                        }
                        if ui.button("Delete").clicked() {
                            actions_queue.push(DeckAction::Delete);
                        }
                    });
                }
            }

            ui.separator();

            // AI generation section
            ui.horizontal(|ui| {
                let button = ui
                    .add_enabled(
                        gate.is_available() && !generating,
                        egui::Button::new("Generate 20 cards with AI"),
                    )
                    .on_disabled_hover_text(gate.reason().unwrap_or("Generation in progress"));
                if button.clicked() {
                    actions_queue.push(DeckAction::Generate);
                }
                if generating {
                    ui.spinner();
                    ui.label("Generating...");
                }
            });
            if let Some(reason) = gate.reason() {
                ui.small(reason);
            }
            if self
                .identity
                .entitlements
                .has(Feature::OneAiFlashcardsGeneration)
                && !self.identity.entitlements.has(Feature::AiFlashcardsGeneration)
                && !deck.ai_generation_used
            {
                ui.small("You have 1 free AI generation available for this deck");
            }

            ui.separator();

            // Card creation section
            ui.heading("Add Card");
            ui.horizontal(|ui| {
                ui.label("Front:");
                ui.text_edit_singleline(&mut self.new_card_front);
            });
            ui.horizontal(|ui| {
                ui.label("Back:");
                ui.text_edit_singleline(&mut self.new_card_back);
            });
            if ui.button("Add Card").clicked() {
                actions_queue.push(DeckAction::AddCard);
            }

            ui.separator();
            ui.heading(format!("Cards ({})", self.current_cards.len()));

            egui::ScrollArea::vertical()
                .id_source("cards_list")
                .show(ui, |ui| {
                    if self.current_cards.is_empty() {
                        ui.label("No cards in this deck yet");
                    }
                    for (i, card) in self.current_cards.iter().enumerate() {
                        ui.group(|ui| {
                            match &mut self.card_editor {
                                Some(editor) if editor.card_id == card.id => {
                                    ui.horizontal(|ui| {
                                        ui.label("Front:");
                                        ui.text_edit_singleline(&mut editor.front);
                                    });
                                    ui.horizontal(|ui| {
                                        ui.label("Back:");
                                        ui.text_edit_singleline(&mut editor.back);
                                    });
                                    ui.horizontal(|ui| {
                                        if ui.button("Save").clicked() {
                                            actions_queue.push(DeckAction::SaveCard);
                                        }
                                        if ui.button("Cancel").clicked() {
                                            actions_queue.push(DeckAction::CancelEditCard);
                                        }
                                    });
                                }
                                _ => {
                                    ui.label(format!("{}. Front: {}", i + 1, card.front));
                                    ui.label(format!("   Back: {}", card.back));
                                    ui.horizontal(|ui| {
                                        if ui.small_button("Edit").clicked() {
                                            actions_queue.push(DeckAction::EditCard(card.clone()));
                                        }
                                        if ui.small_button("Delete").clicked() {
                                            actions_queue.push(DeckAction::DeleteCard(card.id));
                                        }
                                    });
                                }
                            }
                        });
                    }
                });
        });

        for action in actions_queue {
            self.handle_deck_action(ctx, &deck, action);
        }
    }

    fn handle_deck_action(&mut self, ctx: &egui::Context, deck: &Deck, action: DeckAction) {
        match action {
            DeckAction::Back => self.go_to_dashboard(),
            DeckAction::StartStudy => self.start_study_session(deck.id),
            DeckAction::EditDeck => {
                self.deck_editor = Some(DeckDraft::new(deck.name.clone(), deck.description.as_deref()));
            }
            DeckAction::CancelEditDeck => self.deck_editor = None,
            DeckAction::SaveDeck => {
                let Some(draft) = self.deck_editor.clone() else {
                    return;
                };
                let result =
                    self.with_conn(|conn| actions::update_deck(&self.identity, deck.id, draft, conn));
                if self.report(result).is_some() {
                    self.deck_editor = None;
                    self.open_deck(deck.id);
                }
            }
            DeckAction::Duplicate => {
                let result =
                    self.with_conn(|conn| actions::duplicate_deck(&self.identity, deck.id, conn));
                if let Some(copy) = self.report(result) {
                    self.message = Some(format!("Created '{}'", copy.name));
                    self.refresh_decks();
                }
            }
            DeckAction::Delete => self.pending_delete = Some(PendingDelete::Deck(deck.id)),
            DeckAction::Generate => self.start_generation(ctx, deck.id),
            DeckAction::AddCard => {
                let draft = CardDraft::new(self.new_card_front.clone(), self.new_card_back.clone());
                let result =
                    self.with_conn(|conn| actions::create_card(&self.identity, deck.id, draft, conn));
                if self.report(result).is_some() {
                    self.new_card_front.clear();
                    self.new_card_back.clear();
                    self.open_deck(deck.id);
                }
            }
            DeckAction::EditCard(card) => {
                self.card_editor = Some(CardEditor {
                    card_id: card.id,
                    front: card.front,
                    back: card.back,
                });
            }
            DeckAction::CancelEditCard => self.card_editor = None,
            DeckAction::SaveCard => {
                let Some(editor) = self.card_editor.as_ref() else {
                    return;
                };
                let card_id = editor.card_id;
                let draft = CardDraft::new(editor.front.clone(), editor.back.clone());
                let result =
                    self.with_conn(|conn| actions::update_card(&self.identity, card_id, draft, conn));
                if self.report(result).is_some() {
                    self.card_editor = None;
                    self.open_deck(deck.id);
                }
            }
            DeckAction::DeleteCard(card_id) => {
                self.pending_delete = Some(PendingDelete::Card(card_id));
            }
        }
    }

    // ==================== Study Screen ====================

    /// Renders the study session: progress, the current card and grading
    fn render_study_screen(&mut self, ctx: &egui::Context) {
        let AppScreen::Study(deck_id) = self.current_screen else {
            return;
        };
        let Some(session) = self.study_session.as_ref() else {
            self.open_deck(deck_id);
            return;
        };

        let mut queued: Vec<StudyAction> = pressed_study_keys(ctx)
            .into_iter()
            .map(|key| StudyAction::Command(key.command()))
            .collect();

        egui::CentralPanel::default().show(ctx, |ui| {
            if ui.button("← Back to Deck").clicked() {
                queued.push(StudyAction::Back);
            }
            ui.heading(format!("Studying: {}", session.deck_name()));
            ui.separator();

            // Progress section
            ui.horizontal(|ui| {
                ui.label(format!(
                    "{} / {} answered",
                    session.completed_count(),
                    session.total_count()
                ));
                if ui.button("Shuffle").clicked() {
                    queued.push(StudyAction::Shuffle);
                }
            });
            ui.add(egui::ProgressBar::new((session.progress_percent() / 100.0) as f32));
            ui.horizontal(|ui| {
                ui.colored_label(CORRECT_COLOR, format!("Correct: {}", session.correct_count()));
                ui.colored_label(
                    INCORRECT_COLOR,
                    format!("Incorrect: {}", session.incorrect_count()),
                );
                if let Some(accuracy) = session.accuracy_percent() {
                    ui.separator();
                    ui.strong(format!("Accuracy: {}%", accuracy));
                }
            });

            ui.add_space(20.0);

            if session.is_complete() {
                ui.vertical_centered(|ui| {
                    if session.is_perfect() {
                        ui.heading("Perfect Score!");
                    } else {
                        ui.heading("Study Complete!");
                    }
                    ui.label(format!(
                        "You've completed studying all {} cards in {}!",
                        session.total_count(),
                        session.deck_name()
                    ));
                    ui.add_space(10.0);
                    ui.label(format!(
                        "Total: {}   Correct: {}   Incorrect: {}",
                        session.completed_count(),
                        session.correct_count(),
                        session.incorrect_count()
                    ));
                    if let Some(accuracy) = session.accuracy_percent() {
                        ui.heading(format!("{}%", accuracy));
                        ui.label("Accuracy Rate");
                    }
                    ui.add_space(20.0);

                    ui.horizontal(|ui| {
                        if ui.button("Study Again").clicked() {
                            queued.push(StudyAction::Restart);
                        }
                        if ui.button("Shuffle & Restart").clicked() {
                            queued.push(StudyAction::Shuffle);
                        }
                        if session.incorrect_count() > 0
                            && ui
                                .button(format!("Review Incorrect ({})", session.incorrect_count()))
                                .clicked()
                        {
                            queued.push(StudyAction::ReviewIncorrect);
                        }
                    });
                });
            } else if let Some(card) = session.current_card() {
                let answer_shown = session.phase() == StudyPhase::Answer;

                ui.horizontal(|ui| {
                    ui.label(format!(
                        "Card {} of {}",
                        session.current_index() + 1,
                        session.total_count()
                    ));
                    ui.separator();
                    ui.label(if answer_shown { "Answer" } else { "Question" });
                });

                ui.group(|ui| {
                    ui.set_min_height(200.0);
                    ui.vertical_centered(|ui| {
                        ui.add_space(20.0);
                        ui.label(egui::RichText::new(&card.front).size(22.0));
                        if answer_shown {
                            ui.add_space(20.0);
                            ui.separator();
                            ui.label(egui::RichText::new(&card.back).size(22.0).strong());
                        }
                        ui.add_space(20.0);
                    });
                });

                ui.add_space(20.0);

                if answer_shown {
                    ui.label("Did you get it correct?");
                    ui.horizontal(|ui| {
                        if ui.button("✗ Incorrect").clicked() {
                            queued.push(StudyAction::Command(StudyCommand::Grade(false)));
                        }
                        if ui.button("✓ Correct").clicked() {
                            queued.push(StudyAction::Command(StudyCommand::Grade(true)));
                        }
                    });
                    ui.small("Press 1 for incorrect or 2 for correct");
                } else {
                    if ui.button("Show Answer").clicked() {
                        queued.push(StudyAction::Command(StudyCommand::Reveal));
                    }
                    ui.small("Press Space or ↓ to reveal, ← → to navigate cards");
                }
            }
        });

        for action in queued {
            match action {
                StudyAction::Command(command) => self.update_session(|s| s.apply(command)),
                StudyAction::Shuffle => self.update_session(StudySession::shuffle),
                StudyAction::Restart => self.update_session(StudySession::restart),
                StudyAction::ReviewIncorrect => self.update_session(StudySession::review_incorrect),
                StudyAction::Back => {
                    self.study_session = None;
                    self.open_deck(deck_id);
                    return;
                }
            }
        }
    }
}
