use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;

use super::{
    Direction, Edge, Fetched, Item, ItemEdit, ItemSource, StoreError, Vocabulary, WriteStatus,
};
use crate::config::ServerOptions;
use crate::filters::QueryFilters;

/// JSON `status` values the item store answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Ok,
    Success,
    PartialSuccess,
    NoMoreSujets,
    #[default]
    #[serde(other)]
    Failure,
}

impl ResponseStatus {
    pub fn is_success(self) -> bool {
        matches!(
            self,
            ResponseStatus::Ok | ResponseStatus::Success | ResponseStatus::PartialSuccess
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub sujet: Option<Item>,
    #[serde(default)]
    pub count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListResponse {
    Bare(Vec<String>),
    Wrapped {
        #[serde(default)]
        status: ResponseStatus,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        tags: Option<Vec<String>>,
        #[serde(default)]
        people: Option<Vec<String>>,
    },
}

#[derive(Clone)]
pub struct HttpItemStore {
    client: Client,
    base_url: String,
}

impl HttpItemStore {
    pub fn new(options: &ServerOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout())
            .build()
            .context("building http client")?;
        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str, query: &[(&'static str, String)]) -> Result<(u16, String), StoreError> {
        tracing::debug!(path, ?query, "GET");
        self.send(self.client.get(self.url(path)).query(query))
    }

    fn send(&self, request: RequestBuilder) -> Result<(u16, String), StoreError> {
        let response = request
            .send()
            .map_err(|err| StoreError::network(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| StoreError::network(err.to_string()))?;
        Ok((status, body))
    }

    fn read(&self, path: &str, query: &[(&'static str, String)]) -> Result<Fetched, StoreError> {
        let (status, body) = self.get(path, query)?;
        decode_fetched(status, &body)
    }

    fn write(&self, request: RequestBuilder) -> Result<WriteStatus, StoreError> {
        let (status, body) = self.send(request)?;
        decode_write(status, &body)
    }

    fn list(&self, path: &str, key: &str) -> Result<Vec<String>, StoreError> {
        let (status, body) = self.get(path, &[])?;
        decode_list(status, &body, key)
    }
}

impl ItemSource for HttpItemStore {
    fn count(&self, filters: &QueryFilters) -> Result<u64, StoreError> {
        let (status, body) = self.get("/get_sujets_count", &filters.query_pairs())?;
        let envelope = decode_envelope(status, &body)?;
        check_status(status, &envelope)?;
        envelope
            .count
            .ok_or_else(|| StoreError::malformed("count missing from response"))
    }

    fn fetch_paged(&self, offset: u64, filters: &QueryFilters) -> Result<Fetched, StoreError> {
        let mut query = vec![("offset", offset.to_string())];
        query.extend(filters.query_pairs());
        self.read("/get_sujet", &query)
    }

    fn fetch_adjacent(
        &self,
        id: i64,
        direction: Direction,
        filters: &QueryFilters,
    ) -> Result<Fetched, StoreError> {
        let mut query = vec![
            ("id", id.to_string()),
            ("direction", direction.as_ref().to_string()),
        ];
        query.extend(filters.query_pairs());
        self.read("/get_adjacent_sujet", &query)
    }

    fn fetch_by_id(&self, id: i64) -> Result<Fetched, StoreError> {
        self.read(&format!("/get_sujet_by_id/{id}"), &[])
    }

    fn fetch_edge(&self, edge: Edge, filters: &QueryFilters) -> Result<Fetched, StoreError> {
        let path = match edge {
            Edge::First => "/get_first_sujet",
            Edge::Last => "/get_last_sujet",
        };
        self.read(path, &filters.query_pairs())
    }

    fn fetch_random(&self) -> Result<Fetched, StoreError> {
        self.read("/get_random_sujet", &[])
    }

    fn save(&self, edit: &ItemEdit) -> Result<WriteStatus, StoreError> {
        tracing::debug!(id = edit.id, "POST save");
        self.write(self.client.post(self.url("/save_sujet")).json(edit))
    }

    fn skip(&self, id: i64) -> Result<WriteStatus, StoreError> {
        tracing::debug!(id, "POST skip");
        self.write(
            self.client
                .post(self.url("/skip_sujet"))
                .json(&json!({ "id": id })),
        )
    }

    fn delete(&self, id: i64) -> Result<WriteStatus, StoreError> {
        tracing::debug!(id, "DELETE");
        self.write(self.client.delete(self.url(&format!("/delete_sujet/{id}"))))
    }

    fn update_title(&self, id: i64, title: &str) -> Result<WriteStatus, StoreError> {
        tracing::debug!(id, "POST update title");
        self.write(
            self.client
                .post(self.url(&format!("/update_title/{id}")))
                .json(&json!({ "title": title })),
        )
    }

    fn create(&self, title: &str) -> Result<Item, StoreError> {
        tracing::debug!("POST add");
        let (status, body) = self.send(
            self.client
                .post(self.url("/add_sujet"))
                .json(&json!({ "title": title })),
        )?;
        match decode_fetched(status, &body)? {
            Fetched::Item(item) => Ok(item),
            Fetched::Exhausted => Err(StoreError::malformed("created sujet missing from response")),
        }
    }

    fn toggle_sort(&self) -> Result<WriteStatus, StoreError> {
        self.write(self.client.post(self.url("/toggle_sort")))
    }

    fn vocabulary(&self) -> Result<Vocabulary, StoreError> {
        Ok(Vocabulary {
            tags: self.list("/get_all_tags", "tags")?,
            people: self.list("/get_all_people", "people")?,
        })
    }
}

pub fn decode_envelope(http_status: u16, body: &str) -> Result<Envelope, StoreError> {
    match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) => Ok(envelope),
        Err(err) if is_http_success(http_status) => Err(StoreError::malformed(err.to_string())),
        Err(_) if http_status == 404 => Err(StoreError::not_found(snippet(body))),
        Err(_) => Err(StoreError::server(http_status, snippet(body))),
    }
}

/// Accepts an envelope only when both the HTTP status and the JSON status
/// say so; `no_more_sujets` counts as an answer, not a failure.
pub fn check_status(http_status: u16, envelope: &Envelope) -> Result<(), StoreError> {
    let answered =
        envelope.status.is_success() || envelope.status == ResponseStatus::NoMoreSujets;
    if is_http_success(http_status) && answered {
        return Ok(());
    }
    let message = envelope
        .message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());
    if http_status == 404 {
        return Err(StoreError::not_found(message));
    }
    Err(StoreError::server(http_status, message))
}

pub fn decode_fetched(http_status: u16, body: &str) -> Result<Fetched, StoreError> {
    let envelope = decode_envelope(http_status, body)?;
    check_status(http_status, &envelope)?;
    match (envelope.status, envelope.sujet) {
        (ResponseStatus::NoMoreSujets, _) => Ok(Fetched::Exhausted),
        (_, Some(item)) => Ok(Fetched::Item(item)),
        (_, None) => Err(StoreError::malformed("sujet missing from response")),
    }
}

pub fn decode_write(http_status: u16, body: &str) -> Result<WriteStatus, StoreError> {
    let envelope = decode_envelope(http_status, body)?;
    check_status(http_status, &envelope)?;
    match envelope.status {
        ResponseStatus::Ok => Ok(WriteStatus::Ok),
        ResponseStatus::Success => Ok(WriteStatus::Success),
        ResponseStatus::PartialSuccess => {
            tracing::warn!(
                message = envelope.message.as_deref().unwrap_or(""),
                "store reported partial success"
            );
            Ok(WriteStatus::PartialSuccess {
                message: envelope.message,
            })
        }
        ResponseStatus::NoMoreSujets | ResponseStatus::Failure => Err(StoreError::server(
            http_status,
            envelope
                .message
                .unwrap_or_else(|| "Unknown error".to_string()),
        )),
    }
}

fn decode_list(http_status: u16, body: &str, key: &str) -> Result<Vec<String>, StoreError> {
    if !is_http_success(http_status) {
        return Err(StoreError::server(http_status, snippet(body)));
    }
    let parsed: ListResponse =
        serde_json::from_str(body).map_err(|err| StoreError::malformed(err.to_string()))?;
    match parsed {
        ListResponse::Bare(values) => Ok(values),
        ListResponse::Wrapped {
            status,
            message,
            tags,
            people,
        } => {
            if !status.is_success() {
                return Err(StoreError::server(
                    http_status,
                    message.unwrap_or_else(|| "Unknown error".to_string()),
                ));
            }
            let values = if key == "tags" { tags } else { people };
            values.ok_or_else(|| StoreError::malformed(format!("{key} missing from response")))
        }
    }
}

fn is_http_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn snippet(body: &str) -> String {
    const MAX: usize = 120;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX {
        trimmed.to_string()
    } else {
        let mut cut: String = trimmed.chars().take(MAX).collect();
        cut.push('…');
        cut
    }
}
