//! View rendering.
//!
//! [`render`] turns a session and one read snapshot of the store into styled
//! text. It performs no mutation and takes the store's read lock once, so a
//! frame never mixes two store revisions.
//!
//! References held by the session may be stale: cursors are clamped to the
//! live item count and items that vanished render as placeholders.

use checklist_core::{Environment, Storage, StoreState, TodoItem, User};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
};

use crate::{
    Session, View,
    view::{EditField, EditForm, clamp_cursor},
};

/// Width of the user column in the progress matrix.
const USER_COLUMN: usize = 20;

/// Width of each item column in the progress matrix.
const ITEM_COLUMN: usize = 12;

/// Item names are cut to this many characters in the progress header.
const ITEM_NAME_CUT: usize = 10;

/// Render the session's current view.
pub fn render<E: Environment, S: Storage>(session: &Session<E, S>) -> Text<'static> {
    let state = session.store().read();
    let name = session.user().map_or(session.identity(), |user| user.display_name.as_str());
    let me = state.user(session.identity());

    let mut lines = match session.view() {
        View::AwaitingIdentity { input } => awaiting_identity(input),
        View::TodoList { cursor } => todo_list(&state, me, name, *cursor),
        View::TodoDetail { item } => todo_detail(&state, me, item),
        View::AdminHome { cursor } => admin_home(&state, name, *cursor),
        View::AdminEdit(form) => admin_edit(form),
        View::AdminProgress => admin_progress(&state),
        View::AdminDeleteConfirm { target, name } => match state.todo(target) {
            Some(item) => admin_delete_confirm(&item.name, true),
            None => admin_delete_confirm(name, false),
        },
    };

    if let Some(message) = session.status_message() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Yellow))));
    }

    Text::from(lines)
}

fn title(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(
        text.into(),
        Style::default().fg(Color::Indexed(205)).add_modifier(Modifier::BOLD),
    ))
}

fn hint(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(text, Style::default().add_modifier(Modifier::DIM)))
}

fn check() -> Span<'static> {
    Span::styled("✓", Style::default().fg(Color::LightGreen))
}

fn awaiting_identity(input: &str) -> Vec<Line<'static>> {
    vec![
        title("Welcome to Checklist App!"),
        Line::default(),
        Line::from("Please enter your username:"),
        Line::default(),
        Line::from(format!("> {input}")),
        Line::default(),
        hint("Press Enter to continue, Esc to quit"),
    ]
}

/// Numbered item line with the cursor marker.
fn item_line(index: usize, selected: bool, name: &str, suffix: Vec<Span<'static>>) -> Line<'static> {
    let marker = if selected { ">" } else { " " };
    let mut spans = vec![Span::raw(format!("{marker} {}. {name}", index + 1))];
    spans.extend(suffix);
    Line::from(spans)
}

fn todo_list(
    state: &StoreState,
    me: Option<&User>,
    name: &str,
    cursor: usize,
) -> Vec<Line<'static>> {
    let mut lines = vec![title(format!("Welcome, {name}!")), Line::default()];
    lines.push(Line::from("Todo Items:"));
    lines.push(Line::default());

    if state.todo_count() == 0 {
        lines.push(Line::from("No todo items yet. Wait for admin to add some!"));
    } else {
        let cursor = clamp_cursor(cursor, state.todo_count());
        for (i, item) in state.ordered_todos().enumerate() {
            let done = me.is_some_and(|user| user.has_completed(&item.id));
            let suffix = if done { vec![Span::raw(" "), check()] } else { Vec::new() };
            lines.push(item_line(i, i == cursor, &item.name, suffix));
        }
    }

    lines.push(Line::default());
    lines.push(hint("↑/↓: navigate • Enter: view details • q: quit"));
    lines
}

fn todo_detail(state: &StoreState, me: Option<&User>, item: &TodoItem) -> Vec<Line<'static>> {
    let mut lines = vec![title(item.name.clone()), Line::default()];

    if state.todo(&item.id).is_none() {
        lines.push(Line::from(Span::styled(
            "This item was removed.",
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::default());
        lines.push(hint("Esc: back"));
        return lines;
    }

    lines.extend(item.description.lines().map(|line| Line::from(line.to_string())));
    lines.push(Line::default());

    if me.is_some_and(|user| user.has_completed(&item.id)) {
        lines.push(Line::from(Span::styled(
            "✓ Completed",
            Style::default().fg(Color::LightGreen),
        )));
        lines.push(Line::default());
        lines.push(hint("Esc: back"));
    } else {
        lines.push(hint("Enter: mark complete • Esc: back"));
    }
    lines
}

fn admin_home(state: &StoreState, name: &str, cursor: usize) -> Vec<Line<'static>> {
    let mut lines = vec![title(format!("Admin Panel - {name}")), Line::default()];
    lines.push(Line::from("Todo Items:"));
    lines.push(Line::default());

    if state.todo_count() == 0 {
        lines.push(Line::from("No todo items yet."));
    } else {
        let cursor = clamp_cursor(cursor, state.todo_count());
        for (i, item) in state.ordered_todos().enumerate() {
            let stats = state.completion_stats(&item.id);
            let suffix = if stats.total > 0 {
                vec![Span::styled(
                    format!(" ({}/{})", stats.completed, stats.total),
                    Style::default().fg(Color::DarkGray),
                )]
            } else {
                Vec::new()
            };
            lines.push(item_line(i, i == cursor, &item.name, suffix));
        }
    }

    lines.push(Line::default());
    lines.push(hint(
        "↑/↓: navigate • Shift+J/K: move • a: add • e: edit • d: delete • p: progress • q: quit",
    ));
    lines
}

fn admin_edit(form: &EditForm) -> Vec<Line<'static>> {
    let heading = if form.target.is_some() { "Edit Todo" } else { "Add New Todo" };
    let label = |field: EditField, text: &str| {
        if form.field == field { format!("> {text}: ") } else { format!("{text}: ") }
    };

    vec![
        title(heading),
        Line::default(),
        Line::from(format!("{}{}", label(EditField::Name, "Name"), form.name)),
        Line::default(),
        Line::from(format!("{}{}", label(EditField::Description, "Description"), form.description)),
        Line::default(),
        hint("Tab: switch field • Enter: save • Esc: cancel"),
    ]
}

/// Display-only truncation by characters.
fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Left-align `text` in a column of `width` characters.
fn pad(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}

fn admin_progress(state: &StoreState) -> Vec<Line<'static>> {
    let mut lines = vec![title("Completion Progress"), Line::default()];

    if state.todo_count() == 0 {
        lines.push(Line::from("No todo items."));
        lines.push(Line::default());
        lines.push(hint("Esc: back"));
        return lines;
    }

    let mut header = pad("User", USER_COLUMN);
    for item in state.ordered_todos() {
        header.push_str(&pad(&truncate(&item.name, ITEM_NAME_CUT), ITEM_COLUMN));
    }
    lines.push(Line::from(header));
    lines.push(Line::from("-".repeat(USER_COLUMN + ITEM_COLUMN * state.todo_count())));

    let mut users: Vec<&User> = state.non_admin_users().collect();
    users.sort_by(|a, b| {
        a.display_name.cmp(&b.display_name).then_with(|| a.identity.cmp(&b.identity))
    });

    for user in users {
        let mut spans = vec![Span::raw(pad(&truncate(&user.display_name, USER_COLUMN), USER_COLUMN))];
        for item in state.ordered_todos() {
            if user.has_completed(&item.id) {
                spans.push(Span::styled(pad("✓", ITEM_COLUMN), Style::default().fg(Color::LightGreen)));
            } else {
                spans.push(Span::raw(pad("-", ITEM_COLUMN)));
            }
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::default());
    lines.push(hint("Esc: back"));
    lines
}

fn admin_delete_confirm(name: &str, exists: bool) -> Vec<Line<'static>> {
    let mut lines = vec![
        title("Confirm Delete"),
        Line::default(),
        Line::from(Span::styled(format!("Delete '{name}'?"), Style::default().fg(Color::Red))),
    ];
    if !exists {
        lines.push(Line::from(Span::styled(
            "(item no longer exists)",
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.extend([
        Line::default(),
        Line::from("This will remove the todo item and all completion records."),
        Line::default(),
        hint("y: confirm • n/Esc: cancel"),
    ]);
    lines
}

/// Plain text of a rendered frame, one string per line.
pub fn plain_lines(text: &Text<'_>) -> Vec<String> {
    text.lines
        .iter()
        .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
        .collect()
}
