//! The reviewer's session: which item is shown, how we got there, and
//! what the toggles currently mean.

use std::time::{Duration, Instant};

use bitflags::bitflags;

use crate::config::{NavigationOptions, VocabularyOptions};
use crate::filters::{EditMode, FilterState, QueryFilters};
use crate::history::{EmptyHistory, NavigationHistory};
use crate::store::{
    Direction, Edge, Fetched, Item, ItemSource, ItemTitle, StoreError, FAVORITE_TAG,
};
use crate::toggles::{ToggleBoard, ToggleChange, ToggleGroup, ToggleRegistry};
use crate::tokens::{contains_token, join_tokens, parse_csv};

pub mod actions;
pub mod throttle;

pub use actions::{ActionDispatcher, SearchOutcome};
pub use throttle::{FastForward, StopReason, Throttle};

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    EmptyHistory(#[from] EmptyHistory),
    #[error("no sujet is loaded")]
    NoCurrentItem,
}

bitflags! {
    /// Actions the reviewer may trigger in the current state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ActionAvailability: u16 {
        const SAVE = 1 << 0;
        const SKIP = 1 << 1;
        const DELETE = 1 << 2;
        const FAVORITE = 1 << 3;
        const RENAME = 1 << 4;
        const BACK = 1 << 5;
        const RANDOM = 1 << 6;
        const SORT = 1 << 7;
        const SEARCH = 1 << 8;
        const CREATE = 1 << 9;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryPolicy {
    Record,
    Skip,
}

/// Result of a read/navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    Loaded(i64),
    Exhausted,
    Failed,
    Throttled,
}

impl NavOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, NavOutcome::Loaded(_))
    }
}

/// The displayed item plus the reviewer's unsaved edits to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedItem {
    pub item: Item,
    pub title: ItemTitle,
    pub notes: String,
    pub tags: String,
    pub person: String,
}

impl LoadedItem {
    fn new(item: Item) -> Self {
        Self {
            title: item.title(),
            notes: item.user_notes.clone(),
            tags: item.user_tags.clone(),
            person: item.person.clone(),
            item,
        }
    }

    pub fn id(&self) -> i64 {
        self.item.id
    }

    pub fn is_favorite(&self) -> bool {
        contains_token(&parse_csv(&self.tags), FAVORITE_TAG)
    }

    pub fn is_dirty(&self) -> bool {
        self.notes != self.item.user_notes
            || self.tags != self.item.user_tags
            || self.person != self.item.person
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Loaded(LoadedItem),
    ErrorDisplay { message: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub filtered: u64,
    pub total: u64,
}

pub struct ReviewSession<S> {
    store: S,
    state: SessionState,
    offset: u64,
    history: NavigationHistory,
    filters: FilterState,
    mode: EditMode,
    board: ToggleBoard,
    throttle: Throttle,
    fast_forward: Option<FastForward>,
    fast_forward_interval: Duration,
    counts: Counts,
}

impl<S: ItemSource> ReviewSession<S> {
    pub fn new(store: S, vocabulary: &VocabularyOptions, navigation: &NavigationOptions) -> Self {
        let board = ToggleBoard::new(
            ToggleRegistry::render(
                ToggleGroup::Tags,
                &vocabulary.tags,
                &vocabulary.tag_abbreviations,
            ),
            ToggleRegistry::render(
                ToggleGroup::People,
                &vocabulary.people,
                &vocabulary.person_abbreviations,
            ),
        );
        Self {
            store,
            state: SessionState::Empty,
            offset: 0,
            history: NavigationHistory::with_capacity(navigation.history_capacity),
            filters: FilterState::default(),
            mode: EditMode::Filter,
            board,
            throttle: Throttle::new(navigation.cooldown(), navigation.fast_cooldown()),
            fast_forward: None,
            fast_forward_interval: navigation.fast_forward_interval(),
            counts: Counts::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn loaded(&self) -> Option<&LoadedItem> {
        match &self.state {
            SessionState::Loaded(loaded) => Some(loaded),
            _ => None,
        }
    }

    pub fn current_id(&self) -> Option<i64> {
        self.loaded().map(LoadedItem::id)
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SessionState::ErrorDisplay { message } => Some(message),
            _ => None,
        }
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn board(&self) -> &ToggleBoard {
        &self.board
    }

    pub fn move_toggle_cursor(&mut self, group: ToggleGroup, delta: isize) {
        self.board.get_mut(group).move_cursor(delta);
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn counts(&self) -> Counts {
        self.counts
    }

    pub fn effective_filters(&self) -> QueryFilters {
        self.filters.effective(self.mode)
    }

    pub fn dispatcher(&mut self) -> ActionDispatcher<'_, S> {
        ActionDispatcher::new(self)
    }

    /// Default filter state (everything selected), counts, first item.
    pub fn initialize(&mut self) -> NavOutcome {
        self.filters
            .set_selection(self.board.tags.all_values(), self.board.people.all_values());
        self.refresh_toggle_appearance();
        self.refresh_counts();
        self.load_next()
    }

    pub fn load_next(&mut self) -> NavOutcome {
        let filters = self.effective_filters();
        tracing::debug!(mode = %self.mode, offset = self.offset, ?filters, "loading next sujet");
        match self.store.fetch_paged(self.offset, &filters) {
            Ok(Fetched::Item(item)) => {
                let outcome = self.display(item, HistoryPolicy::Record);
                self.offset += 1;
                outcome
            }
            Ok(Fetched::Exhausted) => {
                let message = match self.mode {
                    EditMode::Filter => "No more sujets matching your filters.",
                    EditMode::Tag => "You have reached the end of the list.",
                };
                self.exhaust(message)
            }
            Err(err) => self.fail(format!("Error loading sujet: {err}")),
        }
    }

    pub fn load_adjacent(&mut self, direction: Direction) -> NavOutcome {
        self.load_adjacent_at(direction, Instant::now())
    }

    pub fn load_adjacent_at(&mut self, direction: Direction, now: Instant) -> NavOutcome {
        let fast = self.fast_forward.is_some();
        if !self.throttle.try_acquire(now, fast) {
            tracing::trace!(%direction, fast, "navigation throttled");
            return NavOutcome::Throttled;
        }
        self.step(direction)
    }

    /// Unthrottled adjacent load; wraps to the opposite edge when exhausted.
    fn step(&mut self, direction: Direction) -> NavOutcome {
        let Some(id) = self.current_id() else {
            return self.load_edge(direction.wrap_edge());
        };
        let filters = self.effective_filters();
        tracing::debug!(id, %direction, ?filters, "loading adjacent sujet");
        match self.store.fetch_adjacent(id, direction, &filters) {
            Ok(Fetched::Item(item)) => self.display(item, HistoryPolicy::Record),
            Ok(Fetched::Exhausted) => {
                let edge = direction.wrap_edge();
                tracing::debug!(id, %direction, %edge, "end of list, wrapping");
                self.load_edge(edge)
            }
            Err(err) => self.fail(format!("Error loading {direction} sujet: {err}")),
        }
    }

    pub fn load_edge(&mut self, edge: Edge) -> NavOutcome {
        let filters = self.effective_filters();
        tracing::debug!(%edge, ?filters, "loading edge sujet");
        match self.store.fetch_edge(edge, &filters) {
            Ok(Fetched::Item(item)) => self.display(item, HistoryPolicy::Record),
            Ok(Fetched::Exhausted) => self.exhaust(&format!(
                "Could not load the {edge} sujet. The database might be empty."
            )),
            Err(err) => self.fail(format!("Error loading {edge} sujet: {err}")),
        }
    }

    pub fn load_by_id(&mut self, id: i64, policy: HistoryPolicy) -> NavOutcome {
        tracing::debug!(id, ?policy, "loading sujet by id");
        match self.store.fetch_by_id(id) {
            Ok(Fetched::Item(item)) => self.display(item, policy),
            Ok(Fetched::Exhausted) => self.exhaust(&format!("Sujet {id} is no longer available.")),
            Err(err) => self.fail(format!("Error loading sujet ID {id}: {err}")),
        }
    }

    pub fn load_random(&mut self) -> NavOutcome {
        match self.store.fetch_random() {
            Ok(Fetched::Item(item)) => self.display(item, HistoryPolicy::Record),
            Ok(Fetched::Exhausted) => self.exhaust("There are no sujets to pick from."),
            Err(err) => self.fail(format!("Error getting a random sujet: {err}")),
        }
    }

    /// Re-displays the previous history entry without recording it again.
    pub fn go_back(&mut self) -> Result<NavOutcome, ReviewError> {
        let previous = self.history.back()?;
        Ok(self.load_by_id(previous, HistoryPolicy::Skip))
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        if self.mode == mode {
            return;
        }
        tracing::debug!(from = %self.mode, to = %mode, "switching edit mode");
        self.mode = mode;
        self.refresh_toggle_appearance();
    }

    /// Flips one toggle. In filter mode this re-queries from the first
    /// match and returns the load outcome.
    pub fn toggle(&mut self, group: ToggleGroup, value: &str) -> Option<NavOutcome> {
        match self.mode {
            EditMode::Filter => {
                let change = self.board.get_mut(group).toggle(value)?;
                self.apply_change(change);
                self.offset = 0;
                self.refresh_counts();
                Some(self.load_next())
            }
            EditMode::Tag => {
                self.loaded()?;
                let change = self.board.get_mut(group).toggle(value)?;
                self.apply_change(change);
                None
            }
        }
    }

    /// Select-all/clear-all on one group; never reloads.
    pub fn select_all(&mut self, group: ToggleGroup) {
        if self.mode == EditMode::Tag && self.loaded().is_none() {
            return;
        }
        if let Some(change) = self.board.get_mut(group).select_all() {
            self.apply_change(change);
        }
    }

    fn apply_change(&mut self, change: ToggleChange) {
        tracing::trace!(group = %change.group, active = ?change.active, "toggles changed");
        match self.mode {
            EditMode::Filter => self.filters.recompute_from_toggles(&self.board),
            EditMode::Tag => {
                let tags = join_tokens(&self.board.tags.active_labels());
                let person = join_tokens(&self.board.people.active_labels());
                if let SessionState::Loaded(loaded) = &mut self.state {
                    loaded.tags = tags;
                    loaded.person = person;
                }
            }
        }
    }

    pub fn refresh_toggle_appearance(&mut self) {
        match self.mode {
            EditMode::Filter => {
                self.board.tags.set_active(self.filters.tags());
                self.board.people.set_active(self.filters.people());
            }
            EditMode::Tag => {
                let Some(loaded) = self.loaded() else {
                    return;
                };
                let tags = parse_csv(&loaded.tags);
                let people = parse_csv(&loaded.person);
                self.board.tags.set_active(&tags);
                self.board.people.set_active(&people);
            }
        }
    }

    pub fn refresh_counts(&mut self) -> Counts {
        let filters = self.effective_filters();
        let filtered = self.store.count(&filters).unwrap_or_else(|err| {
            tracing::warn!(%err, "failed to fetch filtered sujet count");
            0
        });
        let total = self
            .store
            .count(&QueryFilters::default())
            .unwrap_or_else(|err| {
                tracing::warn!(%err, "failed to fetch total sujet count");
                0
            });
        self.counts = Counts { filtered, total };
        self.counts
    }

    pub fn set_notes(&mut self, notes: &str) {
        if let SessionState::Loaded(loaded) = &mut self.state {
            loaded.notes = notes.to_string();
        }
    }

    /// Replaces the draft tag string and re-syncs the toggles to it.
    pub fn set_tag_string(&mut self, tags: &str) {
        if let SessionState::Loaded(loaded) = &mut self.state {
            loaded.tags = tags.to_string();
        }
        self.refresh_toggle_appearance();
    }

    pub fn availability(&self) -> ActionAvailability {
        let mut flags = ActionAvailability::RANDOM
            | ActionAvailability::SORT
            | ActionAvailability::SEARCH
            | ActionAvailability::CREATE;
        if self.loaded().is_some() {
            flags |= ActionAvailability::SAVE
                | ActionAvailability::SKIP
                | ActionAvailability::DELETE
                | ActionAvailability::FAVORITE
                | ActionAvailability::RENAME;
        }
        if self.history.can_go_back() {
            flags |= ActionAvailability::BACK;
        }
        flags
    }

    pub fn is_fast_forwarding(&self) -> bool {
        self.fast_forward.is_some()
    }

    pub fn fast_forward_direction(&self) -> Option<Direction> {
        self.fast_forward.as_ref().map(FastForward::direction)
    }

    /// Starts repeating `direction`; refused while no item is loaded.
    pub fn start_fast_forward(&mut self, direction: Direction, now: Instant) -> bool {
        if self.current_id().is_none() {
            tracing::debug!(%direction, "fast-forward refused without a loaded sujet");
            return false;
        }
        self.stop_fast_forward(StopReason::Replaced);
        tracing::info!(%direction, "fast-forward started");
        self.fast_forward = Some(FastForward::start(
            direction,
            self.fast_forward_interval,
            now,
        ));
        true
    }

    /// Ends fast-forward; the next manual step is not held back by its ticks.
    pub fn stop_fast_forward(&mut self, reason: StopReason) -> bool {
        match self.fast_forward.take() {
            Some(task) => {
                tracing::info!(%reason, ticks = task.ticks(), "fast-forward stopped");
                self.throttle.reset();
                true
            }
            None => false,
        }
    }

    /// Runs the fast-forward task when it is due at `now`.
    pub fn poll_fast_forward(&mut self, now: Instant) -> Option<NavOutcome> {
        let task = self.fast_forward.as_mut()?;
        if !task.due(now) {
            return None;
        }
        let direction = task.direction();
        if self.current_id().is_none() {
            self.stop_fast_forward(StopReason::Disabled);
            return None;
        }
        let outcome = self.load_adjacent_at(direction, now);
        if !matches!(outcome, NavOutcome::Loaded(_) | NavOutcome::Throttled) {
            self.stop_fast_forward(StopReason::Failed);
        }
        Some(outcome)
    }

    pub fn time_until_fast_forward(&self, now: Instant) -> Option<Duration> {
        self.fast_forward
            .as_ref()
            .map(|task| task.time_until_due(now))
    }

    fn display(&mut self, item: Item, policy: HistoryPolicy) -> NavOutcome {
        let id = item.id;
        if policy == HistoryPolicy::Record {
            self.history.record(id);
        }
        self.state = SessionState::Loaded(LoadedItem::new(item));
        self.refresh_toggle_appearance();
        NavOutcome::Loaded(id)
    }

    fn exhaust(&mut self, message: &str) -> NavOutcome {
        tracing::debug!(message, "no sujet to show");
        self.enter_error_display(message.to_string());
        NavOutcome::Exhausted
    }

    fn fail(&mut self, message: String) -> NavOutcome {
        tracing::error!(%message, "sujet load failed");
        self.enter_error_display(message);
        NavOutcome::Failed
    }

    fn enter_error_display(&mut self, message: String) {
        self.state = SessionState::ErrorDisplay { message };
        self.stop_fast_forward(StopReason::Failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{sample_item, MemoryStore};
    use assert_matches::assert_matches;

    fn vocabulary() -> VocabularyOptions {
        VocabularyOptions {
            tags: vec!["AI".into(), "Work".into(), "Food & Drink".into()],
            people: vec!["S".into(), "MD".into()],
            tag_abbreviations: [("Food & Drink".to_string(), "Food".to_string())]
                .into_iter()
                .collect(),
            person_abbreviations: Default::default(),
        }
    }

    fn session(store: MemoryStore) -> ReviewSession<MemoryStore> {
        ReviewSession::new(store, &vocabulary(), &NavigationOptions::default())
    }

    fn tagged_store() -> MemoryStore {
        MemoryStore::with_items(vec![
            sample_item(1, "ai", "s"),
            sample_item(2, "work", "md"),
            sample_item(3, "ai, work", ""),
            sample_item(4, "food & drink", "s"),
        ])
    }

    #[test]
    fn initialize_selects_everything_and_loads_first_match() {
        let mut session = session(tagged_store());
        assert_eq!(session.initialize(), NavOutcome::Loaded(1));
        assert_eq!(session.filters().tags(), ["ai", "work", "food & drink"]);
        assert_eq!(session.board().people.active_values(), vec!["s", "md"]);
        assert_eq!(session.counts(), Counts { filtered: 3, total: 4 });
        assert_eq!(session.offset(), 1);
        assert_eq!(session.history().last(), Some(1));
    }

    #[test]
    fn load_next_pages_forward_and_keeps_offset_when_exhausted() {
        let mut session = session(MemoryStore::numbered(2));
        assert_eq!(session.load_next(), NavOutcome::Loaded(1));
        assert_eq!(session.load_next(), NavOutcome::Loaded(2));
        assert_eq!(session.load_next(), NavOutcome::Exhausted);
        assert_eq!(session.offset(), 2);
        assert_eq!(
            session.error_message(),
            Some("No more sujets matching your filters.")
        );
        assert_eq!(session.current_id(), None);
    }

    #[test]
    fn exhaustion_message_depends_on_mode() {
        let mut session = session(MemoryStore::numbered(0));
        session.set_mode(EditMode::Tag);
        assert_eq!(session.load_next(), NavOutcome::Exhausted);
        assert_eq!(
            session.error_message(),
            Some("You have reached the end of the list.")
        );
    }

    #[test]
    fn adjacent_wraps_to_opposite_edge() {
        let start = Instant::now();
        let mut session = session(MemoryStore::numbered(3));
        session.load_by_id(3, HistoryPolicy::Record);
        assert_eq!(
            session.load_adjacent_at(Direction::Next, start),
            NavOutcome::Loaded(1)
        );
        let later = start + Duration::from_millis(250);
        assert_eq!(
            session.load_adjacent_at(Direction::Prev, later),
            NavOutcome::Loaded(3)
        );
        assert_eq!(session.history().iter().collect::<Vec<_>>(), vec![3, 1, 3]);
    }

    #[test]
    fn adjacent_calls_inside_cooldown_are_dropped() {
        let start = Instant::now();
        let mut session = session(MemoryStore::numbered(5));
        session.load_by_id(1, HistoryPolicy::Record);
        assert_eq!(
            session.load_adjacent_at(Direction::Next, start),
            NavOutcome::Loaded(2)
        );
        assert_eq!(
            session.load_adjacent_at(Direction::Next, start + Duration::from_millis(100)),
            NavOutcome::Throttled
        );
        assert_eq!(session.current_id(), Some(2));
    }

    #[test]
    fn adjacent_without_current_item_starts_at_edge() {
        let mut session = session(MemoryStore::numbered(4));
        assert_eq!(
            session.load_adjacent_at(Direction::Prev, Instant::now()),
            NavOutcome::Loaded(4)
        );
    }

    #[test]
    fn failures_clear_current_item() {
        let mut session = session(MemoryStore::numbered(3));
        session.load_by_id(2, HistoryPolicy::Record);
        session
            .store()
            .fail_next(StoreError::network("connection refused"));
        assert_eq!(session.load_next(), NavOutcome::Failed);
        assert_eq!(session.current_id(), None);
        let message = session.error_message().expect("error shown");
        assert!(message.contains("connection refused"), "{message}");
        assert!(!session.availability().contains(ActionAvailability::SAVE));
        assert!(session.availability().contains(ActionAvailability::RANDOM));
    }

    #[test]
    fn back_reloads_previous_without_recording() {
        let mut session = session(MemoryStore::numbered(5));
        session.load_by_id(1, HistoryPolicy::Record);
        session.load_by_id(4, HistoryPolicy::Record);
        assert!(session.availability().contains(ActionAvailability::BACK));
        assert_eq!(session.go_back().expect("back"), NavOutcome::Loaded(1));
        assert_eq!(session.history().iter().collect::<Vec<_>>(), vec![1]);
        assert_matches!(session.go_back(), Err(ReviewError::EmptyHistory(_)));
    }

    #[test]
    fn random_always_records() {
        let mut session = session(MemoryStore::numbered(5));
        assert_eq!(session.load_random(), NavOutcome::Loaded(3));
        assert_eq!(session.history().last(), Some(3));
    }

    #[test]
    fn filter_toggle_requeries_from_first_match() {
        let mut session = session(tagged_store());
        session.initialize();
        session.load_next();
        assert_eq!(session.offset(), 2);

        session.select_all(ToggleGroup::Tags);
        assert!(session.filters().tags().is_empty());
        let outcome = session.toggle(ToggleGroup::Tags, "work");
        assert_eq!(outcome, Some(NavOutcome::Loaded(2)));
        assert_eq!(session.filters().tags(), ["work"]);
        assert_eq!(session.offset(), 1);
        assert_eq!(session.counts().filtered, 1);
    }

    #[test]
    fn tag_mode_toggles_edit_the_item_draft() {
        let mut session = session(tagged_store());
        session.initialize();
        session.set_mode(EditMode::Tag);
        assert_eq!(session.board().tags.active_values(), vec!["ai"]);

        assert_eq!(session.toggle(ToggleGroup::Tags, "food & drink"), None);
        let loaded = session.loaded().expect("loaded");
        assert_eq!(loaded.tags, "AI, Food & Drink");
        assert_eq!(loaded.person, "S");
        assert!(loaded.is_dirty());
        assert_eq!(
            session.filters().tags(),
            ["ai", "work", "food & drink"],
            "filter selection survives tag edits"
        );
    }

    #[test]
    fn tag_mode_queries_ignore_toggle_selection() {
        let mut session = session(tagged_store());
        session.initialize();
        session.select_all(ToggleGroup::Tags);
        session.toggle(ToggleGroup::Tags, "food & drink");
        assert_eq!(session.current_id(), Some(4));

        session.set_mode(EditMode::Tag);
        assert!(session.effective_filters().tags.is_empty());
        assert_eq!(session.refresh_counts().filtered, 4);
    }

    #[test]
    fn tag_mode_toggle_without_item_is_ignored() {
        let mut session = session(MemoryStore::numbered(0));
        session.set_mode(EditMode::Tag);
        assert_eq!(session.toggle(ToggleGroup::Tags, "ai"), None);
        assert!(session.board().tags.active_values().is_empty());
    }

    #[test]
    fn loading_overwrites_unsaved_edits() {
        let mut session = session(tagged_store());
        session.set_mode(EditMode::Tag);
        session.load_by_id(1, HistoryPolicy::Record);
        session.set_tag_string("work");
        assert_eq!(session.board().tags.active_values(), vec!["work"]);

        session.load_by_id(1, HistoryPolicy::Skip);
        assert_eq!(session.loaded().expect("loaded").tags, "ai");
        assert_eq!(session.board().tags.active_values(), vec!["ai"]);
    }

    #[test]
    fn fast_forward_ticks_and_stops_when_disabled() {
        let start = Instant::now();
        let mut session = session(MemoryStore::numbered(4));
        assert!(!session.start_fast_forward(Direction::Next, start));

        session.load_by_id(1, HistoryPolicy::Record);
        assert!(session.start_fast_forward(Direction::Next, start));
        assert_eq!(session.poll_fast_forward(start), Some(NavOutcome::Loaded(2)));
        assert_eq!(session.poll_fast_forward(start + Duration::from_millis(20)), None);
        assert_eq!(
            session.poll_fast_forward(start + Duration::from_millis(100)),
            Some(NavOutcome::Loaded(3))
        );

        session.store().fail_next(StoreError::network("down"));
        assert_eq!(
            session.poll_fast_forward(start + Duration::from_millis(200)),
            Some(NavOutcome::Failed)
        );
        assert!(!session.is_fast_forwarding());
        assert_eq!(session.poll_fast_forward(start + Duration::from_millis(300)), None);
    }

    #[test]
    fn fast_forward_stop_is_idempotent() {
        let now = Instant::now();
        let mut session = session(MemoryStore::numbered(2));
        session.load_by_id(1, HistoryPolicy::Record);
        session.start_fast_forward(Direction::Prev, now);
        assert_eq!(session.fast_forward_direction(), Some(Direction::Prev));
        assert!(session.stop_fast_forward(StopReason::Released));
        assert!(!session.stop_fast_forward(StopReason::Cancelled));
    }

    #[test]
    fn stopping_fast_forward_frees_the_next_step() {
        let start = Instant::now();
        let mut session = session(MemoryStore::numbered(4));
        session.load_by_id(1, HistoryPolicy::Record);
        assert!(session.start_fast_forward(Direction::Next, start));
        assert_eq!(session.poll_fast_forward(start), Some(NavOutcome::Loaded(2)));
        assert!(session.stop_fast_forward(StopReason::Released));

        let soon = start + Duration::from_millis(10);
        assert_eq!(
            session.load_adjacent_at(Direction::Next, soon),
            NavOutcome::Loaded(3)
        );
        assert_eq!(
            session.load_adjacent_at(Direction::Next, soon + Duration::from_millis(50)),
            NavOutcome::Throttled
        );
    }
}
