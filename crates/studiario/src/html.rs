use anyhow::Result;
use chrono::NaiveDate;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fs;
use std::path::Path;

use crate::query::{self, Dashboard};
use crate::types::{Priority, Task, Urgency};

/// Generate a static HTML snapshot of the tracker page
pub fn generate_html(tasks: &[Task], today: NaiveDate, path: &Path) -> Result<()> {
    let html = render_page(tasks, "", today);
    fs::write(path, html.into_string())?;
    Ok(())
}

/// Render the main tracker page: form, search box, alert banner, task
/// list and dashboard
pub fn render_page(tasks: &[Task], filter: &str, today: NaiveDate) -> Markup {
    let visible = query::visible_tasks(tasks, filter);
    let stats = query::dashboard(tasks);
    let due = query::due_soon(tasks, today);

    page(html! {
        (render_header())
        @if !due.is_empty() {
            div.alert #"deadline-alert" {
                span { "You have " (due.len()) " task(s) due today or tomorrow!" }
                button #"dismiss-alert" type="button" { "Dismiss" }
            }
        }
        (render_task_form())
        form.search-form action="/" method="get" {
            input #"search" type="text" name="q" value=(filter)
                placeholder="Filter by subject...";
            button type="submit" { "Search" }
        }
        ul.task-list #"task-list" {
            @if visible.is_empty() {
                li.empty-state {
                    @if filter.is_empty() {
                        "No tasks yet. Add one above."
                    } @else {
                        "No tasks match this subject."
                    }
                }
            } @else {
                @for task in &visible {
                    (render_task_item(task, today))
                }
            }
        }
        (render_dashboard(&stats))
    })
}

/// Render the edit page for a single task, pre-filled with its fields
pub fn render_edit_page(task: &Task) -> Markup {
    page(html! {
        (render_header())
        h2 { "Edit task" }
        form.task-form action={"/tasks/" (task.id) "/edit"} method="post" {
            input #"task-name" type="text" name="name" value=(task.name) required;
            input #"task-deadline" type="date" name="deadline" value=(task.deadline) required;
            (priority_select(task.priority))
            input #"task-subject" type="text" name="subject" value=(task.subject) required;
            button type="submit" { "Save" }
            a.button href="/" { "Cancel" }
        }
    })
}

/// Render the per-date calendar page
pub fn render_calendar_page(date: &str, matches: &[&Task]) -> Markup {
    page(html! {
        (render_header())
        h2 { "Calendar" }
        form #"calendar-form" action="/calendar" method="get" {
            input #"calendar-date" type="date" name="date" value=(date);
        }
        ul.calendar-tasks #"calendar-tasks" {
            @if matches.is_empty() {
                li.empty-state { "No tasks for this date." }
            } @else {
                @for task in matches {
                    li { (task.name) " (" (task.subject) ") - " (task.priority) }
                }
            }
        }
    })
}

/// Shared page shell: head with inline styles, body with script
fn page(content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Studiario" }
                style { (PreEscaped(CSS)) }
            }
            body {
                div.container {
                    (content)
                }
                script { (PreEscaped(JAVASCRIPT)) }
            }
        }
    }
}

fn render_header() -> Markup {
    html! {
        header.topbar {
            h1 { a href="/" { "Studiario" } }
            nav {
                a.button href="/calendar" { "Calendar" }
                a.button href="/export" { "Export" }
                button #"toggle-theme" type="button" { "Theme" }
            }
        }
    }
}

fn render_task_form() -> Markup {
    html! {
        form.task-form #"task-form" action="/tasks" method="post" {
            input #"task-name" type="text" name="name" placeholder="Task name" required;
            input #"task-deadline" type="date" name="deadline" required;
            (priority_select(Priority::Medium))
            input #"task-subject" type="text" name="subject" placeholder="Subject" required;
            button type="submit" { "Add task" }
        }
    }
}

fn priority_select(selected: Priority) -> Markup {
    html! {
        select #"task-priority" name="priority" {
            @for p in Priority::ALL {
                option value=(p) selected[p == selected] { (p) }
            }
        }
    }
}

fn render_task_item(task: &Task, today: NaiveDate) -> Markup {
    let urgency = task.urgency(today);
    html! {
        li.task-item.(task.priority.css_class())
            .urgent[urgency == Urgency::Urgent]
            .past-due[urgency == Urgency::PastDue]
            .completed[task.completed] {
            form.toggle-form action={"/tasks/" (task.id) "/toggle"} method="post" {
                input.task-checkbox type="checkbox" checked[task.completed]
                    onchange="this.form.submit()";
            }
            span.task-name { strong { (task.name) } " (" (task.subject) ")" }
            span.task-deadline { "Deadline: " (task.deadline) " (" (days_left_label(task, today)) ")" }
            span.task-priority { "Priority: " (task.priority) }
            span.task-actions {
                a.button href={"/tasks/" (task.id) "/edit"} { "Edit" }
                form.delete-form action={"/tasks/" (task.id) "/delete"} method="post" {
                    button type="submit" { "Delete" }
                }
            }
        }
    }
}

fn days_left_label(task: &Task, today: NaiveDate) -> String {
    match task.days_left(today) {
        Some(days) if days < 0 => "Past due".to_string(),
        Some(days) => format!("{} day(s) left", days),
        None => "no date".to_string(),
    }
}

fn render_dashboard(stats: &Dashboard) -> Markup {
    html! {
        div.dashboard #"dashboard" {
            h3 { "Subject Breakdown" }
            @if stats.subjects.is_empty() {
                p.muted { "No tasks yet." }
            }
            @for (subject, count) in &stats.subjects {
                p { (subject) ": " (count) " task(s)" }
            }
            h3 { "Progress" }
            p { (stats.completed) " of " (stats.total) " tasks completed" }
            div.progress-bar {
                div.progress-fill style={"width: " (stats.percent()) "%"} {}
            }
        }
    }
}

const CSS: &str = r#"
:root {
    --bg: #f5f5f7;
    --fg: #1d1d1f;
    --card: #ffffff;
    --muted: #6e6e73;
    --border: #d2d2d7;
    --accent: #2b6cb0;
    --urgent-bg: #ffe0e0;
    --past-due-bg: #f3d6d6;
}

body.dark {
    --bg: #121214;
    --fg: #ececf0;
    --card: #1c1c1e;
    --muted: #98989d;
    --border: #3a3a3c;
    --accent: #63a4e0;
    --urgent-bg: #4a2326;
    --past-due-bg: #3a1d1f;
}

* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
    background: var(--bg);
    color: var(--fg);
    min-height: 100vh;
    line-height: 1.5;
}

.container {
    max-width: 860px;
    margin: 0 auto;
    padding: 32px 20px 60px;
}

.topbar {
    display: flex;
    align-items: center;
    justify-content: space-between;
    margin-bottom: 28px;
}

.topbar h1 a {
    color: var(--fg);
    text-decoration: none;
    font-size: 1.2em;
    letter-spacing: -0.02em;
}

.topbar nav {
    display: flex;
    gap: 8px;
}

.alert {
    display: flex;
    align-items: center;
    justify-content: space-between;
    background: var(--urgent-bg);
    border: 1px solid var(--border);
    border-radius: 8px;
    padding: 12px 16px;
    margin-bottom: 20px;
    font-weight: 600;
}

.task-form,
.search-form {
    display: flex;
    flex-wrap: wrap;
    gap: 8px;
    margin-bottom: 20px;
}

input[type="text"],
input[type="date"],
select {
    background: var(--card);
    color: var(--fg);
    border: 1px solid var(--border);
    border-radius: 6px;
    padding: 8px 10px;
    font-size: 0.95em;
}

.search-form input {
    flex: 1;
    min-width: 200px;
}

button,
a.button {
    background: var(--card);
    color: var(--fg);
    border: 1px solid var(--border);
    border-radius: 6px;
    padding: 8px 14px;
    font-size: 0.9em;
    cursor: pointer;
    text-decoration: none;
    display: inline-block;
}

button:hover,
a.button:hover {
    border-color: var(--accent);
}

.task-list {
    list-style: none;
    display: grid;
    gap: 10px;
    margin-bottom: 32px;
}

.task-item {
    display: flex;
    align-items: center;
    flex-wrap: wrap;
    gap: 12px;
    background: var(--card);
    border: 1px solid var(--border);
    border-left-width: 5px;
    border-radius: 8px;
    padding: 12px 16px;
}

.task-item.priority-high { border-left-color: crimson; }
.task-item.priority-medium { border-left-color: orange; }
.task-item.priority-low { border-left-color: green; }

.task-item.urgent { background: var(--urgent-bg); }
.task-item.past-due { background: var(--past-due-bg); }

.task-item.completed .task-name {
    text-decoration: line-through;
    color: var(--muted);
}

.task-checkbox {
    width: 18px;
    height: 18px;
    cursor: pointer;
}

.task-name {
    flex: 1;
    min-width: 160px;
}

.task-deadline,
.task-priority {
    color: var(--muted);
    font-size: 0.85em;
}

.task-actions {
    display: flex;
    gap: 6px;
    margin-left: auto;
}

.empty-state {
    padding: 32px 16px;
    text-align: center;
    color: var(--muted);
    background: var(--card);
    border: 1px dashed var(--border);
    border-radius: 8px;
    list-style: none;
}

.dashboard {
    background: var(--card);
    border: 1px solid var(--border);
    border-radius: 8px;
    padding: 16px 20px;
}

.dashboard h3 {
    margin: 8px 0 6px;
    font-size: 1em;
}

.dashboard p {
    font-size: 0.9em;
    color: var(--muted);
}

.progress-bar {
    height: 10px;
    background: var(--bg);
    border: 1px solid var(--border);
    border-radius: 5px;
    overflow: hidden;
    margin-top: 8px;
}

.progress-fill {
    height: 100%;
    background: var(--accent);
}

.calendar-tasks {
    list-style: none;
    display: grid;
    gap: 8px;
    margin-top: 16px;
}

.calendar-tasks li {
    background: var(--card);
    border: 1px solid var(--border);
    border-radius: 8px;
    padding: 10px 14px;
}

.muted {
    color: var(--muted);
}

@media (max-width: 600px) {
    .task-actions {
        margin-left: 0;
    }
}
"#;

const JAVASCRIPT: &str = r#"
// Apply the saved theme before anything else
if (localStorage.getItem('studiario-theme') === 'dark') {
    document.body.classList.add('dark');
}

const themeToggle = document.getElementById('toggle-theme');
if (themeToggle) {
    themeToggle.addEventListener('click', () => {
        const dark = document.body.classList.toggle('dark');
        localStorage.setItem('studiario-theme', dark ? 'dark' : 'light');
    });
}

// Re-render the list as soon as the filter changes
const searchInput = document.getElementById('search');
if (searchInput) {
    searchInput.addEventListener('change', () => searchInput.form.submit());
}

const calendarDate = document.getElementById('calendar-date');
if (calendarDate) {
    calendarDate.addEventListener('change', () => calendarDate.form.submit());
}

const dismiss = document.getElementById('dismiss-alert');
if (dismiss) {
    dismiss.addEventListener('click', () => {
        document.getElementById('deadline-alert').remove();
    });
}
"#;
