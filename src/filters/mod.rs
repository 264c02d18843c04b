use strum::{AsRefStr, Display, EnumString};

use crate::toggles::ToggleBoard;

/// What toggle clicks act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum EditMode {
    /// Toggles choose which items to browse.
    #[default]
    Filter,
    /// Toggles edit the displayed item's tags and people.
    Tag,
}

impl EditMode {
    pub fn flipped(self) -> Self {
        match self {
            EditMode::Filter => EditMode::Tag,
            EditMode::Tag => EditMode::Filter,
        }
    }
}

/// Filters as sent to the item store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilters {
    pub tags: Vec<String>,
    pub people: Vec<String>,
    pub search: String,
}

impl QueryFilters {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.people.is_empty() && self.search.trim().is_empty()
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if !self.tags.is_empty() {
            pairs.push(("tags", self.tags.join(",")));
        }
        if !self.people.is_empty() {
            pairs.push(("people", self.people.join(",")));
        }
        let search = self.search.trim();
        if !search.is_empty() {
            pairs.push(("search", search.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    tags: Vec<String>,
    people: Vec<String>,
    search: String,
}

impl FilterState {
    pub fn recompute_from_toggles(&mut self, board: &ToggleBoard) {
        self.tags = board.tags.active_values();
        self.people = board.people.active_values();
    }

    pub fn set_selection(&mut self, tags: Vec<String>, people: Vec<String>) {
        self.tags = tags;
        self.people = people;
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.trim().to_string();
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn people(&self) -> &[String] {
        &self.people
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Filters to query with; tag mode keeps only the search term.
    pub fn effective(&self, mode: EditMode) -> QueryFilters {
        match mode {
            EditMode::Filter => QueryFilters {
                tags: self.tags.clone(),
                people: self.people.clone(),
                search: self.search.clone(),
            },
            EditMode::Tag => QueryFilters {
                tags: Vec::new(),
                people: Vec::new(),
                search: self.search.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toggles::{ToggleGroup, ToggleRegistry};
    use indexmap::IndexMap;

    fn board() -> ToggleBoard {
        let none = IndexMap::new();
        ToggleBoard::new(
            ToggleRegistry::render(ToggleGroup::Tags, &["AI", "Work"], &none),
            ToggleRegistry::render(ToggleGroup::People, &["S", "MD"], &none),
        )
    }

    #[test]
    fn recompute_reads_both_registries() {
        let mut board = board();
        board.tags.toggle("work");
        board.people.toggle("md");
        let mut state = FilterState::default();
        state.recompute_from_toggles(&board);
        assert_eq!(state.tags(), ["work"]);
        assert_eq!(state.people(), ["md"]);
    }

    #[test]
    fn tag_mode_keeps_search_but_drops_selection() {
        let mut state = FilterState::default();
        state.set_selection(vec!["ai".into()], vec!["s".into()]);
        state.set_search("  rust ");
        let filtered = state.effective(EditMode::Filter);
        assert_eq!(filtered.tags, vec!["ai"]);
        assert_eq!(filtered.search, "rust");

        let tagging = state.effective(EditMode::Tag);
        assert!(tagging.tags.is_empty());
        assert!(tagging.people.is_empty());
        assert_eq!(tagging.search, "rust");
        assert_eq!(state.tags(), ["ai"]);
    }

    #[test]
    fn query_pairs_skip_empty_parts() {
        let filters = QueryFilters {
            tags: vec!["ai".into(), "food & drink".into()],
            people: Vec::new(),
            search: " ".into(),
        };
        assert_eq!(
            filters.query_pairs(),
            vec![("tags", "ai,food & drink".to_string())]
        );
        assert!(QueryFilters::default().query_pairs().is_empty());
    }

    #[test]
    fn mode_parses_and_flips() {
        assert_eq!("tag".parse::<EditMode>().ok(), Some(EditMode::Tag));
        assert_eq!(EditMode::Filter.flipped(), EditMode::Tag);
        assert_eq!(EditMode::Tag.to_string(), "tag");
    }
}
