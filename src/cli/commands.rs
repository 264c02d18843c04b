use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::app::App;
use crate::filters::QueryFilters;
use crate::store::{Fetched, Item, ItemSource};
use crate::tokens::parse_optional_csv;

#[derive(Args, Debug, Clone, Default)]
pub struct CountArgs {
    /// Comma-separated tags; a sujet matches if it carries any of them
    #[arg(long)]
    pub tags: Option<String>,
    /// Comma-separated people; a sujet matches if it names any of them
    #[arg(long)]
    pub people: Option<String>,
    /// Text to look for in titles and notes
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RenameArgs {
    /// Sujet identifier
    pub id: i64,
    /// New title (whitespace trimmed)
    pub title: String,
}

pub fn run_tui<S: ItemSource>(app: &mut App<S>) -> Result<()> {
    app.run()
}

pub fn print(output: Result<String>) -> Result<()> {
    print!("{}", output?);
    Ok(())
}

pub fn show_item(store: &impl ItemSource, id: i64) -> Result<String> {
    match store
        .fetch_by_id(id)
        .with_context(|| format!("fetching sujet {id}"))?
    {
        Fetched::Item(item) => Ok(format_item(&item)),
        Fetched::Exhausted => bail!("sujet {id} not found"),
    }
}

pub fn count_items(store: &impl ItemSource, args: &CountArgs) -> Result<String> {
    let filters = QueryFilters {
        tags: parse_optional_csv(args.tags.as_deref()),
        people: parse_optional_csv(args.people.as_deref()),
        search: args.search.clone().unwrap_or_default(),
    };
    let filtered = store
        .count(&filters)
        .context("counting filtered sujets")?;
    let total = store
        .count(&QueryFilters::default())
        .context("counting all sujets")?;
    Ok(format!("{filtered} / {total}\n"))
}

pub fn random_item(store: &impl ItemSource) -> Result<String> {
    match store.fetch_random().context("fetching a random sujet")? {
        Fetched::Item(item) => Ok(format_item(&item)),
        Fetched::Exhausted => Ok("No sujets yet.\n".to_string()),
    }
}

pub fn add_item(store: &impl ItemSource, title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        bail!("sujet title cannot be empty");
    }
    let item = store.create(title).context("creating sujet")?;
    Ok(format!("Created sujet #{}: {}\n", item.id, item.title().title))
}

pub fn rename_item(store: &impl ItemSource, args: &RenameArgs) -> Result<String> {
    let title = args.title.trim();
    if title.is_empty() {
        bail!("sujet title cannot be empty");
    }
    store
        .update_title(args.id, title)
        .with_context(|| format!("renaming sujet {}", args.id))?;
    Ok(format!("Renamed sujet #{} to '{title}'\n", args.id))
}

pub fn vocabulary(store: &impl ItemSource) -> Result<String> {
    let vocabulary = store.vocabulary().context("fetching tags and people")?;
    let mut out = String::new();
    let _ = writeln!(&mut out, "tags    {}", format_list(&vocabulary.tags));
    let _ = writeln!(&mut out, "people  {}", format_list(&vocabulary.people));
    Ok(out)
}

fn format_item(item: &Item) -> String {
    let title = item.title();
    let mut out = String::new();
    let _ = writeln!(&mut out, "#{}  {}", title.number, title.title);
    let mut meta = Vec::new();
    if let Some(views) = item.view_count {
        meta.push(format!("{views} views"));
    }
    if let Some(status) = item.status.as_deref().filter(|s| !s.is_empty()) {
        meta.push(status.to_string());
    }
    if let Some(created) = item.created_label() {
        meta.push(format!("created {created}"));
    }
    if !meta.is_empty() {
        let _ = writeln!(&mut out, "    {}", meta.join(" · "));
    }
    if !item.user_tags.trim().is_empty() {
        let _ = writeln!(&mut out, "    tags    {}", item.user_tags.trim());
    }
    if !item.person.trim().is_empty() {
        let _ = writeln!(&mut out, "    people  {}", item.person.trim());
    }
    for (idx, line) in item.user_notes.lines().enumerate() {
        let label = if idx == 0 { "notes " } else { "      " };
        let _ = writeln!(&mut out, "    {label}  {line}");
    }
    if let Some(suggestion) = item.ai_suggestion.as_deref().filter(|s| !s.trim().is_empty()) {
        let _ = writeln!(&mut out, "    ai      {}", suggestion.trim());
    }
    out
}

fn format_list(values: &[String]) -> String {
    if values.is_empty() {
        "(none)".to_string()
    } else {
        values.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{sample_item, MemoryStore};
    use crate::store::StoreError;

    type TestResult<T = ()> = Result<T>;

    fn store() -> MemoryStore {
        let mut noted = sample_item(2, "ai, work", "S");
        noted.user_notes = "first line\nsecond line".into();
        noted.date_created = Some("2024-05-01 09:00:00".into());
        MemoryStore::with_items(vec![sample_item(1, "", ""), noted, sample_item(3, "work", "MD")])
    }

    #[test]
    fn show_prints_metadata_and_notes() -> TestResult {
        let output = show_item(&store(), 2)?;
        assert!(output.starts_with("#2  Sujet 2\n"), "{output}");
        assert!(output.contains("created 01 May 2024"));
        assert!(output.contains("tags    ai, work"));
        assert!(output.contains("people  S"));
        assert!(output.contains("notes   first line"));
        assert!(output.contains("        second line"));
        Ok(())
    }

    #[test]
    fn show_reports_missing_item() {
        let err = show_item(&store(), 99).expect_err("missing");
        assert!(format!("{err:#}").contains("not found"));
    }

    #[test]
    fn count_applies_csv_filters() -> TestResult {
        let args = CountArgs {
            tags: Some("Work, ".into()),
            people: Some("md".into()),
            search: None,
        };
        assert_eq!(count_items(&store(), &args)?, "1 / 3\n");
        assert_eq!(count_items(&store(), &CountArgs::default())?, "3 / 3\n");
        Ok(())
    }

    #[test]
    fn add_rejects_blank_titles() -> TestResult {
        let store = store();
        assert!(add_item(&store, "  ").is_err());
        assert!(store.requests().is_empty());
        assert_eq!(add_item(&store, " Fresh ")?, "Created sujet #4: Fresh\n");
        Ok(())
    }

    #[test]
    fn rename_updates_title() -> TestResult {
        let store = store();
        let args = RenameArgs {
            id: 3,
            title: "Better".into(),
        };
        rename_item(&store, &args)?;
        assert_eq!(
            store.item(3).map(|item| item.title().title),
            Some("Better".to_string())
        );
        Ok(())
    }

    #[test]
    fn vocabulary_lists_store_values() -> TestResult {
        let output = vocabulary(&store())?;
        assert_eq!(output, "tags    ai, work\npeople  MD, S\n");
        Ok(())
    }

    #[test]
    fn store_errors_carry_context() {
        let store = store();
        store.fail_next(StoreError::network("connection refused"));
        let err = random_item(&store).expect_err("network");
        let rendered = format!("{err:#}");
        assert!(rendered.contains("fetching a random sujet"));
        assert!(rendered.contains("connection refused"));
    }
}
