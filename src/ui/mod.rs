use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use regex::Regex;

use crate::app::state::{AppState, EditTarget, OverlayState, TextField};
use crate::config::themes::Palette;
use crate::filters::EditMode;
use crate::highlight::search_highlighter;
use crate::session::{ActionAvailability, LoadedItem, ReviewSession, SessionState};
use crate::store::ItemSource;
use crate::toggles::{ToggleGroup, ToggleRegistry};

const CURSOR: char = '▌';

pub fn draw_app<S: ItemSource>(
    frame: &mut Frame,
    session: &ReviewSession<S>,
    state: &AppState,
    palette: &Palette,
) {
    let area = frame.size();
    let board = session.board();
    let row_width = area.width.saturating_sub(2);
    let tags_height = toggle_row_height(&board.tags, row_width) + 2;
    let people_height = toggle_row_height(&board.people, row_width) + 2;

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(tags_height),
            Constraint::Length(people_height),
            Constraint::Length(3),
        ])
        .split(area);

    frame.render_widget(Paragraph::new(build_header(session, palette)), vertical[0]);

    let highlighter = search_highlighter(session.filters().search());
    let highlight_style = Style::default()
        .fg(palette.favorite)
        .add_modifier(Modifier::BOLD);
    let item_block = Block::default()
        .title("Sujet")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent));
    let body = match session.state() {
        SessionState::Loaded(loaded) => Paragraph::new(item_lines(
            loaded,
            state,
            palette,
            highlighter.as_ref(),
            highlight_style,
        ))
        .wrap(Wrap { trim: false }),
        SessionState::ErrorDisplay { message } => Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                message.clone(),
                Style::default()
                    .fg(palette.error)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press r for a random sujet, g/G for first/last, or / to search.",
                Style::default().fg(palette.muted),
            )),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true }),
        SessionState::Empty => Paragraph::new(Span::styled(
            "Loading sujets…",
            Style::default().fg(palette.muted),
        )),
    };
    frame.render_widget(body.block(item_block), vertical[1]);

    for (group, rect) in [
        (ToggleGroup::Tags, vertical[2]),
        (ToggleGroup::People, vertical[3]),
    ] {
        let registry = board.get(group);
        let focused = state.focus == group;
        let mut title = format!("{group}");
        if focused {
            if let Some(tooltip) = focused_tooltip(registry) {
                title.push_str(&format!(" · {tooltip}"));
            }
        }
        let border = if focused {
            Style::default().fg(palette.accent)
        } else {
            Style::default().fg(palette.muted)
        };
        let row = Paragraph::new(Line::from(toggle_spans(registry, focused, palette)))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(border),
            );
        frame.render_widget(row, rect);
    }

    frame.render_widget(
        Paragraph::new(build_status_line(session, state, palette)),
        vertical[4],
    );

    render_overlay(frame, state, palette);
}

fn build_header<S: ItemSource>(session: &ReviewSession<S>, palette: &Palette) -> Line<'static> {
    let counts = session.counts();
    let mode = match session.mode() {
        EditMode::Filter => "FILTER",
        EditMode::Tag => "TAG",
    };
    let mut spans = vec![
        Span::styled(
            "Sujets ",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("| Mode: "),
        Span::styled(mode, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" | "),
        Span::styled(
            format!("{} / {}", counts.filtered, counts.total),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];
    let search = session.filters().search();
    if !search.is_empty() {
        spans.push(Span::raw(" | Search: "));
        spans.push(Span::styled(
            search.to_string(),
            Style::default().fg(palette.favorite),
        ));
    }
    if let Some(direction) = session.fast_forward_direction() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("fast-forward {direction}"),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        ));
    }
    spans.push(Span::styled(
        " | S: toggle sort",
        Style::default().fg(palette.muted),
    ));
    Line::from(spans)
}

fn item_lines(
    loaded: &LoadedItem,
    state: &AppState,
    palette: &Palette,
    regex: Option<&Regex>,
    highlight_style: Style,
) -> Vec<Line<'static>> {
    let item = &loaded.item;
    let mut lines = Vec::new();

    let mut title = Vec::new();
    if loaded.is_favorite() {
        title.push(Span::styled(
            "★ ",
            Style::default()
                .fg(palette.favorite)
                .add_modifier(Modifier::BOLD),
        ));
    }
    title.push(Span::styled(
        format!("#{} ", loaded.title.number),
        Style::default().fg(palette.muted),
    ));
    title.extend(highlight_line(
        &loaded.title.title,
        regex,
        highlight_style,
        Style::default().add_modifier(Modifier::BOLD),
    ));
    if loaded.is_dirty() {
        title.push(Span::styled(
            " [modified]",
            Style::default()
                .fg(palette.favorite)
                .add_modifier(Modifier::ITALIC),
        ));
    }
    lines.push(Line::from(title));

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
        lines.push(Line::from(Span::styled(
            meta.join(" · "),
            Style::default().fg(palette.muted),
        )));
    }

    if let Some(suggestion) = item.ai_suggestion.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(Line::from(""));
        for line in suggestion.lines() {
            lines.push(Line::from(Span::styled(
                line.to_string(),
                Style::default()
                    .fg(palette.muted)
                    .add_modifier(Modifier::ITALIC),
            )));
        }
    }

    lines.push(Line::from(""));
    let editing = state.editing();
    lines.push(label_line("Notes", palette));
    match editing {
        Some((EditTarget::Notes, field)) => {
            for line in with_cursor(field).split('\n') {
                lines.push(Line::from(line.to_string()));
            }
        }
        _ if loaded.notes.is_empty() => lines.push(Line::from(Span::styled(
            "(none, press e to write)",
            Style::default().fg(palette.muted),
        ))),
        _ => {
            for line in loaded.notes.lines() {
                lines.push(Line::from(highlight_line(
                    line,
                    regex,
                    highlight_style,
                    Style::default(),
                )));
            }
        }
    }

    lines.push(Line::from(""));
    let tags = match editing {
        Some((EditTarget::Tags, field)) => with_cursor(field),
        _ => loaded.tags.clone(),
    };
    lines.push(Line::from(vec![
        Span::styled("Tags: ", Style::default().fg(palette.muted)),
        Span::raw(tags),
    ]));
    lines.push(Line::from(vec![
        Span::styled("People: ", Style::default().fg(palette.muted)),
        Span::raw(loaded.person.clone()),
    ]));
    lines
}

fn label_line(label: &str, palette: &Palette) -> Line<'static> {
    Line::from(Span::styled(
        label.to_string(),
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    ))
}

fn toggle_spans(registry: &ToggleRegistry, focused: bool, palette: &Palette) -> Vec<Span<'static>> {
    let mut spans = Vec::with_capacity(registry.len() * 2);
    for (idx, button) in registry.buttons().enumerate() {
        let mut style = if button.active {
            Style::default()
                .bg(palette.active_toggle)
                .fg(palette.active_text)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.muted)
        };
        if focused && idx == registry.cursor() {
            style = style.add_modifier(Modifier::UNDERLINED | Modifier::REVERSED);
        }
        spans.push(Span::styled(format!(" {} ", button.display), style));
        spans.push(Span::raw(" "));
    }
    if spans.is_empty() {
        spans.push(Span::styled(
            "(no vocabulary configured)",
            Style::default().fg(palette.muted),
        ));
    }
    spans
}

fn focused_tooltip(registry: &ToggleRegistry) -> Option<String> {
    registry
        .buttons()
        .nth(registry.cursor())
        .and_then(|button| button.tooltip().map(str::to_string))
}

/// Rows needed to lay the buttons of `registry` out in `width` columns.
fn toggle_row_height(registry: &ToggleRegistry, width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let mut rows = 1usize;
    let mut used = 0usize;
    for button in registry.buttons() {
        let cell = UnicodeWidthStr::width(button.display.as_str()) + 3;
        if used > 0 && used + cell > width {
            rows += 1;
            used = 0;
        }
        used += cell;
    }
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn build_status_line<S: ItemSource>(
    session: &ReviewSession<S>,
    state: &AppState,
    palette: &Palette,
) -> Text<'static> {
    let available = session.availability();
    let key = |label: &'static str, flag: ActionAvailability| {
        let style = if available.contains(flag) {
            Style::default().fg(palette.accent)
        } else {
            Style::default()
                .fg(palette.muted)
                .add_modifier(Modifier::CROSSED_OUT)
        };
        Span::styled(label, style)
    };

    let mut actions = vec![
        key("s save", ActionAvailability::SAVE),
        Span::raw(" • "),
        key("x skip", ActionAvailability::SKIP),
        Span::raw(" • "),
        key("d delete", ActionAvailability::DELETE),
        Span::raw(" • "),
        key("f fav", ActionAvailability::FAVORITE),
        Span::raw(" • "),
        key("t rename", ActionAvailability::RENAME),
        Span::raw(" • "),
        key("b back", ActionAvailability::BACK),
        Span::raw(" • "),
        key("r random", ActionAvailability::RANDOM),
        Span::raw(" • "),
        key("S sort", ActionAvailability::SORT),
    ];
    if let Some(message) = &state.status_message {
        actions.push(Span::raw(" | "));
        actions.push(Span::styled(
            message.clone(),
            Style::default().fg(palette.accent),
        ));
    }

    let help = if state.is_editing() {
        "Editing: type to change • Ctrl-←/→ word jump • Esc finish • Ctrl-s save"
    } else {
        "n/p next/prev • g/G first/last • o next match • F/B fast-forward • m mode • Tab row • ←/→ Space * toggles • e notes • i tags • a add • / search • q quit"
    };

    Text::from(vec![
        Line::from(actions),
        Line::from(Span::styled(help, Style::default().fg(palette.muted))),
    ])
}

fn with_cursor(field: &TextField) -> String {
    let mut text = field.buffer().to_string();
    text.insert(field.before_cursor().len(), CURSOR);
    text
}

fn highlight_line(
    text: &str,
    regex: Option<&Regex>,
    highlight_style: Style,
    base_style: Style,
) -> Vec<Span<'static>> {
    let Some(re) = regex else {
        return vec![Span::styled(text.to_string(), base_style)];
    };
    let mut spans = Vec::new();
    let mut last = 0;
    for mat in re.find_iter(text) {
        if mat.start() > last {
            spans.push(Span::styled(text[last..mat.start()].to_string(), base_style));
        }
        spans.push(Span::styled(mat.as_str().to_string(), highlight_style));
        last = mat.end();
    }
    if last < text.len() {
        spans.push(Span::styled(text[last..].to_string(), base_style));
    }
    if spans.is_empty() {
        spans.push(Span::styled(text.to_string(), base_style));
    }
    spans
}

fn render_overlay(frame: &mut Frame, state: &AppState, palette: &Palette) {
    let Some(overlay) = state.overlay() else {
        return;
    };
    let (title, lines, accent) = match overlay {
        OverlayState::Search(field) => (
            "Search".to_string(),
            vec![
                Line::from(Span::styled(
                    "Text to match, or #ID to jump",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(with_cursor(field)),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter to search • empty clears • Esc to cancel",
                    Style::default().fg(palette.muted),
                )),
            ],
            palette.accent,
        ),
        OverlayState::RenameTitle { id, field } => (
            format!("Rename Sujet #{id}"),
            vec![
                Line::from(Span::styled(
                    "New title",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(with_cursor(field)),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter to save • Esc to cancel",
                    Style::default().fg(palette.muted),
                )),
            ],
            palette.accent,
        ),
        OverlayState::NewItem(field) => (
            "New Sujet".to_string(),
            vec![
                Line::from(Span::styled(
                    "Title",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(with_cursor(field)),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter to create • Esc to cancel",
                    Style::default().fg(palette.muted),
                )),
            ],
            palette.accent,
        ),
        OverlayState::ConfirmDelete { id, title } => (
            format!("Confirm Delete (#{id})"),
            vec![
                Line::from(Span::styled(
                    "Delete Sujet",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(format!("Permanently delete '{title}'?")),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter or y to confirm • Esc or n to cancel",
                    Style::default().fg(palette.muted),
                )),
            ],
            palette.error,
        ),
        OverlayState::Alert { title, message } => (
            title.clone(),
            vec![
                Line::from(Span::styled(
                    message.clone(),
                    Style::default()
                        .fg(palette.error)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter or Esc to dismiss",
                    Style::default().fg(palette.muted),
                )),
            ],
            palette.error,
        ),
    };
    let area = centered_rect(60, 30, frame.size());
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
