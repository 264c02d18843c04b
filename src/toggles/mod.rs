//! Labelled on/off buttons rendered from a fixed vocabulary.

use indexmap::IndexMap;
use strum::{AsRefStr, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum ToggleGroup {
    Tags,
    People,
}

impl ToggleGroup {
    pub fn other(self) -> Self {
        match self {
            ToggleGroup::Tags => ToggleGroup::People,
            ToggleGroup::People => ToggleGroup::Tags,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleButton {
    /// Full vocabulary label.
    pub label: String,
    /// Text drawn on the button, possibly abbreviated.
    pub display: String,
    /// Trimmed, lower-cased label used for comparisons.
    pub value: String,
    pub active: bool,
}

impl ToggleButton {
    /// Full label when the button shows an abbreviation.
    pub fn tooltip(&self) -> Option<&str> {
        (self.display != self.label.trim()).then_some(self.label.as_str())
    }
}

/// Emitted whenever a registry's active set changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleChange {
    pub group: ToggleGroup,
    pub active: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ToggleRegistry {
    group: ToggleGroup,
    buttons: IndexMap<String, ToggleButton>,
    cursor: usize,
}

impl ToggleRegistry {
    pub fn render<S: AsRef<str>>(
        group: ToggleGroup,
        labels: &[S],
        abbreviations: &IndexMap<String, String>,
    ) -> Self {
        let mut buttons = IndexMap::with_capacity(labels.len());
        for label in labels {
            let label = label.as_ref();
            let value = normalize(label);
            if value.is_empty() {
                continue;
            }
            let display = abbreviations
                .get(label)
                .cloned()
                .unwrap_or_else(|| label.trim().to_string());
            buttons.entry(value.clone()).or_insert(ToggleButton {
                label: label.to_string(),
                display,
                value,
                active: false,
            });
        }
        Self {
            group,
            buttons,
            cursor: 0,
        }
    }

    pub fn group(&self) -> ToggleGroup {
        self.group
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    pub fn buttons(&self) -> impl Iterator<Item = &ToggleButton> {
        self.buttons.values()
    }

    pub fn is_active(&self, value: &str) -> bool {
        self.buttons
            .get(&normalize(value))
            .map(|button| button.active)
            .unwrap_or(false)
    }

    pub fn active_values(&self) -> Vec<String> {
        self.buttons
            .values()
            .filter(|button| button.active)
            .map(|button| button.value.clone())
            .collect()
    }

    pub fn active_labels(&self) -> Vec<String> {
        self.buttons
            .values()
            .filter(|button| button.active)
            .map(|button| button.label.trim().to_string())
            .collect()
    }

    pub fn all_values(&self) -> Vec<String> {
        self.buttons.keys().cloned().collect()
    }

    /// Makes exactly the buttons whose value appears in `values` active.
    pub fn set_active<S: AsRef<str>>(&mut self, values: &[S]) -> Option<ToggleChange> {
        let wanted: Vec<String> = values.iter().map(|v| normalize(v.as_ref())).collect();
        let mut changed = false;
        for button in self.buttons.values_mut() {
            let active = wanted.contains(&button.value);
            changed |= button.active != active;
            button.active = active;
        }
        changed.then(|| self.change())
    }

    pub fn toggle(&mut self, value: &str) -> Option<ToggleChange> {
        let button = self.buttons.get_mut(&normalize(value))?;
        button.active = !button.active;
        Some(self.change())
    }

    /// Activates everything when anything is off, otherwise clears the group.
    pub fn select_all(&mut self) -> Option<ToggleChange> {
        if self.buttons.is_empty() {
            return None;
        }
        let any_inactive = self.buttons.values().any(|button| !button.active);
        for button in self.buttons.values_mut() {
            button.active = any_inactive;
        }
        Some(self.change())
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn move_cursor(&mut self, delta: isize) {
        if self.buttons.is_empty() {
            self.cursor = 0;
            return;
        }
        let len = self.buttons.len() as isize;
        self.cursor = (self.cursor as isize + delta).rem_euclid(len) as usize;
    }

    pub fn cursor_value(&self) -> Option<&str> {
        self.buttons
            .get_index(self.cursor)
            .map(|(value, _)| value.as_str())
    }

    fn change(&self) -> ToggleChange {
        ToggleChange {
            group: self.group,
            active: self.active_values(),
        }
    }
}

/// The tag and people registries side by side.
#[derive(Debug, Clone)]
pub struct ToggleBoard {
    pub tags: ToggleRegistry,
    pub people: ToggleRegistry,
}

impl ToggleBoard {
    pub fn new(tags: ToggleRegistry, people: ToggleRegistry) -> Self {
        Self { tags, people }
    }

    pub fn get(&self, group: ToggleGroup) -> &ToggleRegistry {
        match group {
            ToggleGroup::Tags => &self.tags,
            ToggleGroup::People => &self.people,
        }
    }

    pub fn get_mut(&mut self, group: ToggleGroup) -> &mut ToggleRegistry {
        match group {
            ToggleGroup::Tags => &mut self.tags,
            ToggleGroup::People => &mut self.people,
        }
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abbreviations() -> IndexMap<String, String> {
        [("Food & Drink".to_string(), "Food".to_string())]
            .into_iter()
            .collect()
    }

    fn registry() -> ToggleRegistry {
        ToggleRegistry::render(
            ToggleGroup::Tags,
            &["AI", "Work", "Food & Drink", "", " ai "],
            &abbreviations(),
        )
    }

    #[test]
    fn render_skips_blank_and_duplicate_labels() {
        let reg = registry();
        assert_eq!(reg.all_values(), vec!["ai", "work", "food & drink"]);
    }

    #[test]
    fn abbreviated_buttons_keep_full_label_as_tooltip() {
        let reg = registry();
        let food = reg.buttons().find(|b| b.value == "food & drink").expect("food");
        assert_eq!(food.display, "Food");
        assert_eq!(food.tooltip(), Some("Food & Drink"));
        let ai = reg.buttons().next().expect("ai");
        assert_eq!(ai.tooltip(), None);
    }

    #[test]
    fn set_active_matches_normalized_values() {
        let mut reg = registry();
        let change = reg.set_active(&[" WORK", "unknown"]).expect("changed");
        assert_eq!(change.group, ToggleGroup::Tags);
        assert_eq!(change.active, vec!["work"]);
        assert!(reg.set_active(&["work"]).is_none());
        assert_eq!(reg.active_labels(), vec!["Work"]);
    }

    #[test]
    fn toggle_flips_single_button() {
        let mut reg = registry();
        assert!(reg.toggle("Food & Drink").is_some());
        assert!(reg.is_active("food & drink"));
        assert!(reg.toggle("food & drink").is_some());
        assert!(!reg.is_active("food & drink"));
        assert!(reg.toggle("missing").is_none());
    }

    #[test]
    fn select_all_activates_then_clears() {
        let mut reg = registry();
        reg.toggle("ai");
        let change = reg.select_all().expect("change");
        assert_eq!(change.active.len(), 3);
        let change = reg.select_all().expect("change");
        assert!(change.active.is_empty());
    }

    #[test]
    fn cursor_wraps_in_both_directions() {
        let mut reg = registry();
        reg.move_cursor(-1);
        assert_eq!(reg.cursor_value(), Some("food & drink"));
        reg.move_cursor(2);
        assert_eq!(reg.cursor_value(), Some("work"));
    }
}
