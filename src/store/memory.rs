//! In-process [`ItemSource`] used by the session tests.

use std::cell::{Cell, RefCell};

use super::{
    Direction, Edge, Fetched, Item, ItemEdit, ItemSource, StoreError, Vocabulary, WriteStatus,
};
use crate::filters::QueryFilters;
use crate::tokens::parse_csv;

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<Vec<Item>>,
    failure: RefCell<Option<StoreError>>,
    partial_writes: Cell<bool>,
    requests: RefCell<Vec<String>>,
    descending: Cell<bool>,
    next_id: Cell<i64>,
}

pub fn sample_item(id: i64, tags: &str, person: &str) -> Item {
    Item {
        id,
        original_sujet: format!("ID: {id} - Sujet {id}"),
        ai_suggestion: Some(format!("suggestion {id}")),
        user_notes: String::new(),
        user_tags: tags.to_string(),
        person: person.to_string(),
        view_count: Some(0),
        status: Some("needs_enrichment".to_string()),
        date_created: None,
    }
}

impl MemoryStore {
    pub fn with_items(items: Vec<Item>) -> Self {
        let store = Self::default();
        let max = items.iter().map(|item| item.id).max().unwrap_or(0);
        store.next_id.set(max + 1);
        *store.items.borrow_mut() = items;
        store.items.borrow_mut().sort_by_key(|item| item.id);
        store
    }

    /// Items `1..=n` with no tags.
    pub fn numbered(n: i64) -> Self {
        Self::with_items((1..=n).map(|id| sample_item(id, "", "")).collect())
    }

    /// Makes the next request fail with `error`.
    pub fn fail_next(&self, error: StoreError) {
        *self.failure.borrow_mut() = Some(error);
    }

    pub fn report_partial_writes(&self, partial: bool) {
        self.partial_writes.set(partial);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.borrow_mut().clear();
    }

    pub fn item(&self, id: i64) -> Option<Item> {
        self.items.borrow().iter().find(|item| item.id == id).cloned()
    }

    fn begin(&self, request: String) -> Result<(), StoreError> {
        self.requests.borrow_mut().push(request);
        match self.failure.borrow_mut().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn matching(&self, filters: &QueryFilters) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .items
            .borrow()
            .iter()
            .filter(|item| matches(item, filters))
            .cloned()
            .collect();
        if self.descending.get() {
            items.reverse();
        }
        items
    }

    fn write_status(&self) -> WriteStatus {
        if self.partial_writes.get() {
            WriteStatus::PartialSuccess {
                message: Some("secondary log failed".into()),
            }
        } else {
            WriteStatus::Success
        }
    }

    fn not_found(id: i64) -> StoreError {
        StoreError::not_found(format!("Sujet with ID {id} not found."))
    }
}

fn matches(item: &Item, filters: &QueryFilters) -> bool {
    let tags = item.user_tags.to_lowercase();
    let person = item.person.to_lowercase();
    let tag_ok = filters.tags.is_empty() || filters.tags.iter().any(|tag| tags.contains(tag));
    let person_ok =
        filters.people.is_empty() || filters.people.iter().any(|p| person.contains(p));
    let search = filters.search.trim().to_lowercase();
    let search_ok = search.is_empty()
        || item.original_sujet.to_lowercase().contains(&search)
        || item.user_notes.to_lowercase().contains(&search);
    tag_ok && person_ok && search_ok
}

fn found(item: Option<Item>) -> Fetched {
    item.map(Fetched::Item).unwrap_or(Fetched::Exhausted)
}

impl ItemSource for MemoryStore {
    fn count(&self, filters: &QueryFilters) -> Result<u64, StoreError> {
        self.begin(format!("count {filters:?}"))?;
        Ok(self.matching(filters).len() as u64)
    }

    fn fetch_paged(&self, offset: u64, filters: &QueryFilters) -> Result<Fetched, StoreError> {
        self.begin(format!("paged {offset}"))?;
        Ok(found(self.matching(filters).into_iter().nth(offset as usize)))
    }

    fn fetch_adjacent(
        &self,
        id: i64,
        direction: Direction,
        filters: &QueryFilters,
    ) -> Result<Fetched, StoreError> {
        self.begin(format!("adjacent {id} {direction}"))?;
        let items = self.matching(filters);
        let pick = match direction {
            Direction::Next => items.into_iter().filter(|item| item.id > id).min_by_key(|i| i.id),
            Direction::Prev => items.into_iter().filter(|item| item.id < id).max_by_key(|i| i.id),
        };
        Ok(found(pick))
    }

    fn fetch_by_id(&self, id: i64) -> Result<Fetched, StoreError> {
        self.begin(format!("by_id {id}"))?;
        self.item(id).map(Fetched::Item).ok_or_else(|| Self::not_found(id))
    }

    fn fetch_edge(&self, edge: Edge, filters: &QueryFilters) -> Result<Fetched, StoreError> {
        self.begin(format!("edge {edge}"))?;
        let items = self.matching(filters);
        let pick = match edge {
            Edge::First => items.into_iter().min_by_key(|item| item.id),
            Edge::Last => items.into_iter().max_by_key(|item| item.id),
        };
        Ok(found(pick))
    }

    fn fetch_random(&self) -> Result<Fetched, StoreError> {
        self.begin("random".to_string())?;
        let items = self.items.borrow();
        Ok(found(items.get(items.len() / 2).cloned()))
    }

    fn save(&self, edit: &ItemEdit) -> Result<WriteStatus, StoreError> {
        self.begin(format!("save {}", edit.id))?;
        let mut items = self.items.borrow_mut();
        let item = items
            .iter_mut()
            .find(|item| item.id == edit.id)
            .ok_or_else(|| Self::not_found(edit.id))?;
        item.user_notes = edit.user_notes.clone();
        item.user_tags = edit.user_tags.clone();
        item.person = edit.person.clone();
        item.status = Some("enriched".to_string());
        Ok(self.write_status())
    }

    fn skip(&self, id: i64) -> Result<WriteStatus, StoreError> {
        self.begin(format!("skip {id}"))?;
        let mut items = self.items.borrow_mut();
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        item.status = Some("skipped".to_string());
        Ok(WriteStatus::Ok)
    }

    fn delete(&self, id: i64) -> Result<WriteStatus, StoreError> {
        self.begin(format!("delete {id}"))?;
        let mut items = self.items.borrow_mut();
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(self.write_status())
    }

    fn update_title(&self, id: i64, title: &str) -> Result<WriteStatus, StoreError> {
        self.begin(format!("title {id}"))?;
        let mut items = self.items.borrow_mut();
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        item.original_sujet = format!("ID: {id} - {title}");
        Ok(WriteStatus::Success)
    }

    fn create(&self, title: &str) -> Result<Item, StoreError> {
        self.begin("create".to_string())?;
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let mut item = sample_item(id, "", "");
        item.original_sujet = format!("ID: {id} - {title}");
        self.items.borrow_mut().push(item.clone());
        Ok(item)
    }

    fn toggle_sort(&self) -> Result<WriteStatus, StoreError> {
        self.begin("toggle_sort".to_string())?;
        self.descending.set(!self.descending.get());
        Ok(WriteStatus::Ok)
    }

    fn vocabulary(&self) -> Result<Vocabulary, StoreError> {
        self.begin("vocabulary".to_string())?;
        let items = self.items.borrow();
        let mut tags: Vec<String> = items.iter().flat_map(|i| parse_csv(&i.user_tags)).collect();
        tags.sort();
        tags.dedup();
        let mut people: Vec<String> = items
            .iter()
            .map(|i| i.person.clone())
            .filter(|p| !p.is_empty())
            .collect();
        people.sort();
        people.dedup();
        Ok(Vocabulary { tags, people })
    }
}
