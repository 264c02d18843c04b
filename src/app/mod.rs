use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::config::themes::{Palette, ThemeRegistry};
use crate::config::AppConfig;
use crate::filters::EditMode;
use crate::session::{
    ActionAvailability, NavOutcome, ReviewError, ReviewSession, SearchOutcome, StopReason,
};
use crate::store::{Direction, Edge, ItemSource, WriteStatus};
use crate::ui;

pub mod state;

pub use state::{AppState, EditTarget, OverlayState, TextField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Quit,
    Adjacent(Direction),
    Edge(Edge),
    NextMatch,
    Back,
    Random,
    FastForward(Direction),
    ToggleMode,
    ToggleFocus,
    MoveCursor(isize),
    ToggleCurrent,
    SelectAll,
    EditNotes,
    EditTags,
    Favorite,
    Save,
    Skip,
    Delete,
    Rename,
    NewItem,
    Search,
    ToggleSort,
}

pub struct App<S> {
    pub config: Arc<AppConfig>,
    session: ReviewSession<S>,
    state: AppState,
    palette: Palette,
    should_quit: bool,
    tick_rate: Duration,
}

impl<S: ItemSource> App<S> {
    pub fn new(config: Arc<AppConfig>, store: S) -> Self {
        let session = ReviewSession::new(store, &config.vocabulary, &config.navigation);
        let palette = ThemeRegistry::default().palette(&config.theme);
        Self {
            config,
            session,
            state: AppState::default(),
            palette,
            should_quit: false,
            tick_rate: Duration::from_millis(250),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        self.session.initialize();
        let result = self.event_loop(&mut terminal);
        self.teardown();
        restore_terminal(&mut terminal)?;
        result
    }

    /// Runs on every exit from the event loop, including render and input errors.
    fn teardown(&mut self) {
        self.session.stop_fast_forward(StopReason::Cancelled);
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal
                .draw(|frame| ui::draw_app(frame, &self.session, &self.state, &self.palette))
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .session
                .time_until_fast_forward(Instant::now())
                .map_or(self.tick_rate, |wait| wait.min(self.tick_rate));

            if event::poll(timeout).context("polling for terminal events")? {
                if let Event::Key(key) = event::read().context("reading terminal event")? {
                    self.handle_key(key);
                }
            }

            self.session.poll_fast_forward(Instant::now());
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        // Terminals rarely report key releases, so any key ends a fast-forward.
        if self.session.is_fast_forwarding() {
            let reason = if key.code == KeyCode::Esc {
                StopReason::Cancelled
            } else {
                StopReason::Released
            };
            self.session.stop_fast_forward(reason);
            self.state.set_status_message(Some("Fast-forward stopped"));
            return;
        }

        if self.handle_overlay_key(key) {
            return;
        }

        if self.state.is_editing() {
            self.handle_editor_key(key);
            return;
        }

        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER);

        let action = match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Quit)
            }
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Save)
            }
            _ if !plain => None,
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('n') => Some(Action::Adjacent(Direction::Next)),
            KeyCode::Char('p') => Some(Action::Adjacent(Direction::Prev)),
            KeyCode::Char('g') => Some(Action::Edge(Edge::First)),
            KeyCode::Char('G') => Some(Action::Edge(Edge::Last)),
            KeyCode::Char('o') => Some(Action::NextMatch),
            KeyCode::Char('b') => Some(Action::Back),
            KeyCode::Char('r') => Some(Action::Random),
            KeyCode::Char('F') => Some(Action::FastForward(Direction::Next)),
            KeyCode::Char('B') => Some(Action::FastForward(Direction::Prev)),
            KeyCode::Char('m') => Some(Action::ToggleMode),
            KeyCode::Tab => Some(Action::ToggleFocus),
            KeyCode::Left | KeyCode::Char('h') => Some(Action::MoveCursor(-1)),
            KeyCode::Right | KeyCode::Char('l') => Some(Action::MoveCursor(1)),
            KeyCode::Char(' ') => Some(Action::ToggleCurrent),
            KeyCode::Char('*') => Some(Action::SelectAll),
            KeyCode::Char('e') => Some(Action::EditNotes),
            KeyCode::Char('i') => Some(Action::EditTags),
            KeyCode::Char('f') => Some(Action::Favorite),
            KeyCode::Char('s') => Some(Action::Save),
            KeyCode::Char('x') => Some(Action::Skip),
            KeyCode::Char('d') => Some(Action::Delete),
            KeyCode::Char('t') => Some(Action::Rename),
            KeyCode::Char('a') => Some(Action::NewItem),
            KeyCode::Char('/') => Some(Action::Search),
            KeyCode::Char('S') => Some(Action::ToggleSort),
            _ => None,
        };

        if let Some(action) = action {
            self.handle_action(action);
        }
    }

    fn handle_action(&mut self, action: Action) {
        if let Some(required) = required_flag(action) {
            if !self.session.availability().contains(required) {
                self.state
                    .set_status_message(Some(unavailable_message(required)));
                return;
            }
        }
        match action {
            Action::Quit => self.should_quit = true,
            Action::Adjacent(direction) => {
                let outcome = self.session.load_adjacent(direction);
                self.report(outcome);
            }
            Action::Edge(edge) => {
                let outcome = self.session.load_edge(edge);
                self.report(outcome);
            }
            Action::NextMatch => {
                let outcome = self.session.load_next();
                self.report(outcome);
            }
            Action::Back => match self.session.go_back() {
                Ok(outcome) => self.report(outcome),
                Err(err) => self.state.set_status_message(Some(err.to_string())),
            },
            Action::Random => {
                let outcome = self.session.load_random();
                self.report(outcome);
            }
            Action::FastForward(direction) => {
                if self.session.start_fast_forward(direction, Instant::now()) {
                    self.state.set_status_message(Some(format!(
                        "Fast-forward {direction}; press any key to stop"
                    )));
                } else {
                    self.state
                        .set_status_message(Some("Load a sujet before fast-forwarding"));
                }
            }
            Action::ToggleMode => {
                let mode = self.session.mode().flipped();
                self.session.set_mode(mode);
                self.state.set_status_message(Some(match mode {
                    EditMode::Filter => "Filter mode: toggles choose what to browse",
                    EditMode::Tag => "Tag mode: toggles edit this sujet",
                }));
            }
            Action::ToggleFocus => self.state.toggle_focus(),
            Action::MoveCursor(delta) => {
                self.session.move_toggle_cursor(self.state.focus, delta);
            }
            Action::ToggleCurrent => self.handle_toggle_current(),
            Action::SelectAll => self.session.select_all(self.state.focus),
            Action::EditNotes => {
                if let Some(loaded) = self.session.loaded() {
                    let notes = loaded.notes.clone();
                    self.state.begin_edit(EditTarget::Notes, &notes);
                    self.state
                        .set_status_message(Some("Editing notes: Esc to finish"));
                } else {
                    self.state.set_status_message(Some("Load a sujet first"));
                }
            }
            Action::EditTags => {
                if let Some(loaded) = self.session.loaded() {
                    let tags = loaded.tags.clone();
                    self.state.begin_edit(EditTarget::Tags, &tags);
                    self.state
                        .set_status_message(Some("Editing tags: Enter to apply, Esc to cancel"));
                } else {
                    self.state.set_status_message(Some("Load a sujet first"));
                }
            }
            Action::Favorite => match self.session.dispatcher().toggle_favorite() {
                Ok(true) => self.state.set_status_message(Some("Marked as favorite (unsaved)")),
                Ok(false) => self
                    .state
                    .set_status_message(Some("Favorite removed (unsaved)")),
                Err(err) => self.alert("Favorite", &err),
            },
            Action::Save => self.handle_save(),
            Action::Skip => match self.session.dispatcher().skip() {
                Ok(outcome) => {
                    self.state.set_status_message(Some("Sujet skipped"));
                    self.report(outcome);
                }
                Err(err) => self.alert("Skip failed", &err),
            },
            Action::Delete => {
                if let Some(loaded) = self.session.loaded() {
                    let (id, title) = (loaded.id(), loaded.title.title.clone());
                    self.state.open_confirm_delete(id, &title);
                }
            }
            Action::Rename => {
                if let Some(loaded) = self.session.loaded() {
                    let (id, title) = (loaded.id(), loaded.title.title.clone());
                    self.state.open_rename(id, &title);
                }
            }
            Action::NewItem => self.state.open_new_item(),
            Action::Search => {
                let current = self.session.filters().search().to_string();
                self.state.open_search(&current);
            }
            Action::ToggleSort => match self.session.dispatcher().toggle_sort() {
                Ok(outcome) => {
                    self.state.set_status_message(Some("Sort order toggled"));
                    self.report(outcome);
                }
                Err(err) => self.alert("Sort failed", &err),
            },
        }
    }

    fn handle_toggle_current(&mut self) {
        let group = self.state.focus;
        let Some(value) = self
            .session
            .board()
            .get(group)
            .cursor_value()
            .map(str::to_string)
        else {
            return;
        };
        if self.session.mode() == EditMode::Tag && self.session.loaded().is_none() {
            self.state
                .set_status_message(Some("Load a sujet before editing its tags"));
            return;
        }
        if let Some(outcome) = self.session.toggle(group, &value) {
            self.report(outcome);
        }
    }

    fn handle_save(&mut self) {
        match self.session.dispatcher().save() {
            Ok((WriteStatus::PartialSuccess { message }, outcome)) => {
                let detail = message.unwrap_or_else(|| "secondary log failed".to_string());
                self.state
                    .set_status_message(Some(format!("Saved with warnings: {detail}")));
                self.report(outcome);
            }
            Ok((_, outcome)) => {
                self.state.set_status_message(Some("Sujet saved"));
                self.report(outcome);
            }
            Err(err) => self.alert("Save failed", &err),
        }
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) -> bool {
        let Some(overlay) = self.state.overlay().cloned() else {
            return false;
        };
        match overlay {
            OverlayState::Alert { .. } => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ')) {
                    self.state.close_overlay();
                }
            }
            OverlayState::ConfirmDelete { id, .. } => match key.code {
                KeyCode::Enter | KeyCode::Char('y') => {
                    self.state.close_overlay();
                    self.submit_delete(id);
                }
                KeyCode::Esc | KeyCode::Char('n') => {
                    self.state.close_overlay();
                    self.state.set_status_message(Some("Delete canceled"));
                }
                _ => {}
            },
            OverlayState::Search(_) | OverlayState::RenameTitle { .. } | OverlayState::NewItem(_) => {
                match key.code {
                    KeyCode::Esc => {
                        self.state.close_overlay();
                        self.state.set_status_message(Some("Canceled"));
                    }
                    KeyCode::Enter => self.submit_overlay(),
                    _ => {
                        if let Some(field) = self.state.overlay_field_mut() {
                            apply_field_key(field, key);
                        }
                    }
                }
            }
        }
        true
    }

    fn submit_overlay(&mut self) {
        let Some(overlay) = self.state.close_overlay() else {
            return;
        };
        match overlay {
            OverlayState::Search(field) => match self.session.dispatcher().search(field.buffer()) {
                SearchOutcome::Jump(outcome) => self.report(outcome),
                SearchOutcome::Filtered(outcome) => {
                    let counts = self.session.counts();
                    self.state.set_status_message(Some(format!(
                        "{} of {} sujets match",
                        counts.filtered, counts.total
                    )));
                    self.report(outcome);
                }
            },
            OverlayState::RenameTitle { field, .. } => {
                match self.session.dispatcher().update_title(field.buffer()) {
                    Ok(outcome) => {
                        self.state.set_status_message(Some("Title updated"));
                        self.report(outcome);
                    }
                    Err(err) => self.alert("Rename failed", &err),
                }
            }
            OverlayState::NewItem(field) => match self.session.dispatcher().create_item(field.buffer()) {
                Ok(outcome) => {
                    self.state.set_status_message(Some("Sujet created"));
                    self.report(outcome);
                }
                Err(err) => self.alert("Create failed", &err),
            },
            OverlayState::ConfirmDelete { .. } | OverlayState::Alert { .. } => {}
        }
    }

    fn submit_delete(&mut self, id: i64) {
        if self.session.current_id() != Some(id) {
            return;
        }
        match self.session.dispatcher().delete() {
            Ok((_, outcome)) => {
                self.state
                    .set_status_message(Some(format!("Sujet {id} deleted")));
                self.report(outcome);
            }
            Err(err) => self.alert("Delete failed", &err),
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                let target = self.state.editing().map(|(target, _)| target);
                match target {
                    Some(EditTarget::Notes) => self.commit_edit(),
                    _ => {
                        self.state.finish_edit();
                        self.state.set_status_message(Some("Tag edit canceled"));
                    }
                }
            }
            KeyCode::Char('s') if ctrl => {
                self.commit_edit();
                self.handle_save();
            }
            KeyCode::Enter => {
                let multiline = self
                    .state
                    .editing()
                    .map(|(_, field)| field.is_multiline())
                    .unwrap_or(false);
                if multiline {
                    if let Some(field) = self.state.edit_field_mut() {
                        field.insert_newline();
                    }
                } else {
                    self.commit_edit();
                }
            }
            _ => {
                if let Some(field) = self.state.edit_field_mut() {
                    apply_field_key(field, key);
                }
            }
        }
    }

    fn commit_edit(&mut self) {
        match self.state.finish_edit() {
            Some((EditTarget::Notes, text)) => {
                self.session.set_notes(&text);
                self.state.set_status_message(Some("Notes updated (unsaved)"));
            }
            Some((EditTarget::Tags, text)) => {
                self.session.set_tag_string(&text);
                self.state.set_status_message(Some("Tags updated (unsaved)"));
            }
            None => {}
        }
    }

    fn report(&mut self, outcome: NavOutcome) {
        match outcome {
            NavOutcome::Loaded(id) => tracing::trace!(id, "sujet displayed"),
            NavOutcome::Throttled => {}
            NavOutcome::Exhausted | NavOutcome::Failed => self.state.clear_status_message(),
        }
    }

    fn alert(&mut self, title: &str, err: &ReviewError) {
        if !matches!(err, ReviewError::Validation(_)) {
            tracing::error!(?err, title, "action failed");
        }
        self.state.show_alert(title, err.to_string());
    }
}

fn required_flag(action: Action) -> Option<ActionAvailability> {
    match action {
        Action::Save => Some(ActionAvailability::SAVE),
        Action::Skip => Some(ActionAvailability::SKIP),
        Action::Delete => Some(ActionAvailability::DELETE),
        Action::Favorite => Some(ActionAvailability::FAVORITE),
        Action::Rename => Some(ActionAvailability::RENAME),
        Action::Back => Some(ActionAvailability::BACK),
        Action::Random => Some(ActionAvailability::RANDOM),
        Action::ToggleSort => Some(ActionAvailability::SORT),
        Action::Search => Some(ActionAvailability::SEARCH),
        Action::NewItem => Some(ActionAvailability::CREATE),
        _ => None,
    }
}

fn unavailable_message(flag: ActionAvailability) -> &'static str {
    if flag == ActionAvailability::BACK {
        "No earlier sujet in history"
    } else {
        "Load a sujet first"
    }
}

fn apply_field_key(field: &mut TextField, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Backspace => {
            field.backspace();
        }
        KeyCode::Delete => {
            field.delete();
        }
        KeyCode::Left if ctrl => {
            field.move_word_left();
        }
        KeyCode::Right if ctrl => {
            field.move_word_right();
        }
        KeyCode::Left => {
            field.move_left();
        }
        KeyCode::Right => {
            field.move_right();
        }
        KeyCode::Home => {
            field.move_home();
        }
        KeyCode::End => {
            field.move_end();
        }
        KeyCode::Char(ch)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER) =>
        {
            field.insert_char(ch);
        }
        _ => {}
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("restoring screen state")?;
    Ok(())
}
