use once_cell::sync::Lazy;
use regex::Regex;

use super::{HistoryPolicy, NavOutcome, ReviewError, ReviewSession, SessionState};
use crate::store::{Direction, ItemEdit, ItemSource, WriteStatus, FAVORITE_TAG};
use crate::tokens::{join_tokens, parse_csv};

static ID_JUMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#?(\d+)$").expect("valid id pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The term was an item number and that item was requested directly.
    Jump(NavOutcome),
    /// The term became the search filter and paging restarted.
    Filtered(NavOutcome),
}

/// Write actions against the displayed item.
pub struct ActionDispatcher<'a, S> {
    session: &'a mut ReviewSession<S>,
}

impl<'a, S: ItemSource> ActionDispatcher<'a, S> {
    pub fn new(session: &'a mut ReviewSession<S>) -> Self {
        Self { session }
    }

    /// Persists the draft and moves on to the next item.
    pub fn save(&mut self) -> Result<(WriteStatus, NavOutcome), ReviewError> {
        let loaded = self.session.loaded().ok_or(ReviewError::NoCurrentItem)?;
        let edit = ItemEdit {
            id: loaded.id(),
            user_notes: loaded.notes.trim().to_string(),
            user_tags: loaded.tags.trim().to_string(),
            person: loaded.person.clone(),
        };
        tracing::debug!(id = edit.id, "saving sujet");
        let status = self.session.store.save(&edit).map_err(|err| {
            tracing::error!(id = edit.id, %err, "save failed");
            err
        })?;
        self.session.refresh_counts();
        Ok((status, self.session.step(Direction::Next)))
    }

    pub fn skip(&mut self) -> Result<NavOutcome, ReviewError> {
        let id = self.current_id()?;
        tracing::debug!(id, "skipping sujet");
        self.session.store.skip(id).map_err(|err| {
            tracing::error!(id, %err, "skip failed");
            err
        })?;
        Ok(self.session.step(Direction::Next))
    }

    /// Deletes the displayed item. Confirmation is the caller's job.
    pub fn delete(&mut self) -> Result<(WriteStatus, NavOutcome), ReviewError> {
        let id = self.current_id()?;
        tracing::debug!(id, "deleting sujet");
        let status = self.session.store.delete(id).map_err(|err| {
            tracing::error!(id, %err, "delete failed");
            err
        })?;
        self.session.history.remove(id);
        self.session.refresh_counts();
        Ok((status, self.session.step(Direction::Next)))
    }

    /// Adds or removes the favourite token in the draft; returns the new state.
    pub fn toggle_favorite(&mut self) -> Result<bool, ReviewError> {
        let SessionState::Loaded(loaded) = &mut self.session.state else {
            return Err(ReviewError::NoCurrentItem);
        };
        let mut tokens = parse_csv(&loaded.tags);
        let before = tokens.len();
        tokens.retain(|token| !token.eq_ignore_ascii_case(FAVORITE_TAG));
        let favorite = tokens.len() == before;
        if favorite {
            tokens.push(FAVORITE_TAG.to_string());
        }
        loaded.tags = join_tokens(&tokens);
        self.session.refresh_toggle_appearance();
        Ok(favorite)
    }

    pub fn update_title(&mut self, title: &str) -> Result<NavOutcome, ReviewError> {
        let id = self.current_id()?;
        let title = validate_title(title)?;
        self.session.store.update_title(id, title).map_err(|err| {
            tracing::error!(id, %err, "title update failed");
            err
        })?;
        Ok(self.session.load_by_id(id, HistoryPolicy::Skip))
    }

    pub fn create_item(&mut self, title: &str) -> Result<NavOutcome, ReviewError> {
        let title = validate_title(title)?;
        let item = self.session.store.create(title).map_err(|err| {
            tracing::error!(%err, "sujet creation failed");
            err
        })?;
        tracing::info!(id = item.id, "sujet created");
        let outcome = self.session.display(item, HistoryPolicy::Record);
        self.session.refresh_counts();
        Ok(outcome)
    }

    /// `#42` or `42` jumps to that item; anything else filters by text.
    pub fn search(&mut self, term: &str) -> SearchOutcome {
        let term = term.trim();
        if let Some(id) = parse_id_jump(term) {
            return SearchOutcome::Jump(self.session.load_by_id(id, HistoryPolicy::Record));
        }
        tracing::debug!(term, "applying search filter");
        self.session.filters.set_search(term);
        self.session.offset = 0;
        self.session.history.clear();
        self.session.refresh_counts();
        SearchOutcome::Filtered(self.session.load_next())
    }

    pub fn toggle_sort(&mut self) -> Result<NavOutcome, ReviewError> {
        self.session.store.toggle_sort().map_err(|err| {
            tracing::error!(%err, "sort toggle failed");
            err
        })?;
        if self.session.loaded().is_some() {
            self.session.history.clear();
        }
        self.session.offset = 0;
        self.session.refresh_counts();
        Ok(self.session.load_next())
    }

    fn current_id(&self) -> Result<i64, ReviewError> {
        self.session.current_id().ok_or(ReviewError::NoCurrentItem)
    }
}

fn validate_title(title: &str) -> Result<&str, ReviewError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ReviewError::Validation("Title cannot be empty.".into()));
    }
    Ok(title)
}

fn parse_id_jump(term: &str) -> Option<i64> {
    ID_JUMP
        .captures(term)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
