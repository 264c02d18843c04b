//! The remote item store as seen by the reviewer: item model, response
//! vocabulary and the [`ItemSource`] capability.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};
use strum::{AsRefStr, Display, EnumString};
use time::macros::format_description;
use time::{Date, PrimitiveDateTime};

use crate::filters::QueryFilters;

pub mod http;
#[cfg(test)]
pub mod memory;

pub use http::HttpItemStore;

/// Tag token that marks an item as a favourite.
pub const FAVORITE_TAG: &str = "fav";

static TITLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ID:\s*(\d+)\s*-\s*(.*)$").expect("valid title pattern"));

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub original_sujet: String,
    #[serde(default)]
    pub ai_suggestion: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub user_notes: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub user_tags: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub person: String,
    #[serde(default)]
    pub view_count: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub date_created: Option<String>,
}

impl Item {
    pub fn title(&self) -> ItemTitle {
        ItemTitle::parse(&self.original_sujet, self.id)
    }

    /// `date_created` as `DD Mon YYYY`, or verbatim when it is not a
    /// recognisable date.
    pub fn created_label(&self) -> Option<String> {
        let raw = self.date_created.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        let date = PrimitiveDateTime::parse(
            raw,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        )
        .map(|dt| dt.date())
        .or_else(|_| Date::parse(raw, format_description!("[year]-[month]-[day]")));
        let label = match date {
            Ok(date) => date
                .format(format_description!("[day] [month repr:short] [year]"))
                .unwrap_or_else(|_| raw.to_string()),
            Err(_) => raw.to_string(),
        };
        Some(label)
    }
}

/// Display number and title split out of `original_sujet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTitle {
    pub number: String,
    pub title: String,
}

impl ItemTitle {
    pub fn parse(original: &str, id: i64) -> Self {
        if let Some(caps) = TITLE_PATTERN.captures(original) {
            let number = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let title = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            if !number.is_empty() && !title.is_empty() {
                return Self {
                    number: number.to_string(),
                    title: title.to_string(),
                };
            }
        }
        Self {
            number: id.to_string(),
            title: original.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Next,
    Prev,
}

impl Direction {
    /// Edge to wrap around to once this direction is exhausted.
    pub fn wrap_edge(self) -> Edge {
        match self {
            Direction::Next => Edge::First,
            Direction::Prev => Edge::Last,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Edge {
    First,
    Last,
}

/// Outcome of a read that may legitimately find nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Item(Item),
    Exhausted,
}

/// Successful write acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    Ok,
    Success,
    /// Primary write went through but a secondary persistence step failed.
    PartialSuccess { message: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemEdit {
    pub id: i64,
    pub user_notes: String,
    pub user_tags: String,
    pub person: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    pub tags: Vec<String>,
    pub people: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("network error: {message}")]
    Network { message: String },
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("malformed response: {message}")]
    Malformed { message: String },
}

impl StoreError {
    pub fn network(message: impl Into<String>) -> Self {
        StoreError::Network {
            message: message.into(),
        }
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        StoreError::Server {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        StoreError::NotFound {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        StoreError::Malformed {
            message: message.into(),
        }
    }
}

/// Everything the reviewer needs from the item store.
///
/// Calls are sequential and each one is a single request/response exchange.
pub trait ItemSource {
    fn count(&self, filters: &QueryFilters) -> Result<u64, StoreError>;
    fn fetch_paged(&self, offset: u64, filters: &QueryFilters) -> Result<Fetched, StoreError>;
    fn fetch_adjacent(
        &self,
        id: i64,
        direction: Direction,
        filters: &QueryFilters,
    ) -> Result<Fetched, StoreError>;
    fn fetch_by_id(&self, id: i64) -> Result<Fetched, StoreError>;
    fn fetch_edge(&self, edge: Edge, filters: &QueryFilters) -> Result<Fetched, StoreError>;
    fn fetch_random(&self) -> Result<Fetched, StoreError>;
    fn save(&self, edit: &ItemEdit) -> Result<WriteStatus, StoreError>;
    fn skip(&self, id: i64) -> Result<WriteStatus, StoreError>;
    fn delete(&self, id: i64) -> Result<WriteStatus, StoreError>;
    fn update_title(&self, id: i64, title: &str) -> Result<WriteStatus, StoreError>;
    fn create(&self, title: &str) -> Result<Item, StoreError>;
    fn toggle_sort(&self) -> Result<WriteStatus, StoreError>;
    fn vocabulary(&self) -> Result<Vocabulary, StoreError>;
}
