//! Command implementations for the CLI interface.
//!
//! This is the presentation layer: each handler builds or looks up tasks,
//! invokes the store's mutation operations, and hands the collection to the
//! storage gateway for an explicit save. Id generation, placeholder titles
//! and due-date parsing all happen here, not in the store.

use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use anyhow::{anyhow, bail};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use crate::cli::Cli;
use crate::fields::*;
use crate::storage::Storage;
use crate::store::TaskStore;
use crate::task::{Subtask, Task, UNTITLED_TITLE};

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Short title for the task. May be empty; a placeholder is stored.
        title: String,
        /// Category key (built-in or custom). May be repeated.
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Due date: YYYY-MM-DD [HH:MM], "today", "tomorrow", "in Nd", or a weekday.
        #[arg(long)]
        due: Option<String>,
        /// Recurrence: daily | weekly | monthly.
        #[arg(long, value_enum)]
        repeat: Option<Repeat>,
        /// Reminder offset in minutes before the due time.
        #[arg(long = "remind")]
        reminder_minutes_before: Option<u32>,
        /// Priority: low | medium | high.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Free-form notes.
        #[arg(long)]
        notes: Option<String>,
        /// Subtask title. May be repeated; order is preserved.
        #[arg(long = "subtask")]
        subtasks: Vec<String>,
    },

    /// List tasks, optionally filtered by category.
    List {
        /// Category key to filter by, or "all".
        #[arg(long, default_value = "all")]
        category: String,
        /// Include completed tasks.
        #[arg(long)]
        all: bool,
    },

    /// View a single task by id, id prefix, or title.
    View {
        /// Task reference.
        id: String,
    },

    /// Edit fields on a task.
    Edit {
        /// Task reference.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Due date: YYYY-MM-DD [HH:MM], "today", "tomorrow", "in Nd", or a weekday.
        #[arg(long)]
        due: Option<String>,
        /// Remove the due date.
        #[arg(long)]
        clear_due: bool,
        #[arg(long, value_enum)]
        repeat: Option<Repeat>,
        /// Remove the recurrence.
        #[arg(long)]
        clear_repeat: bool,
        #[arg(long = "remind")]
        reminder_minutes_before: Option<u32>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Category key to attach. May be repeated.
        #[arg(long = "add-category")]
        add_categories: Vec<String>,
        /// Category key to detach. May be repeated.
        #[arg(long = "rm-category")]
        rm_categories: Vec<String>,
    },

    /// Toggle completion on a task (completes or reopens it).
    Done {
        /// Task reference.
        id: String,
    },

    /// Manage a task's subtasks.
    Subtask {
        #[command(subcommand)]
        action: SubtaskAction,
    },

    /// Delete a task by id, id prefix, or title.
    Delete {
        /// Task reference.
        id: String,
    },

    /// List category keys, or manage user-defined ones.
    Categories {
        #[command(subcommand)]
        action: Option<CategoryAction>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum SubtaskAction {
    /// Append a subtask to a task.
    Add {
        /// Parent task reference.
        task: String,
        /// Subtask title.
        title: String,
    },
    /// Toggle completion on a subtask.
    Toggle {
        /// Parent task reference.
        task: String,
        /// Subtask id, id prefix, or title.
        subtask: String,
    },
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// Register a user-defined category key.
    Add {
        /// Category key to register.
        key: String,
    },
    /// Remove a user-defined category key.
    Rm {
        /// Category key to remove.
        key: String,
    },
}

/// Add a new task to the collection and persist it.
#[allow(clippy::too_many_arguments)]
pub fn cmd_add(
    store: &mut TaskStore,
    storage: &Storage,
    title: String,
    categories: Vec<String>,
    due: Option<String>,
    repeat: Option<Repeat>,
    reminder_minutes_before: Option<u32>,
    priority: Option<Priority>,
    notes: Option<String>,
    subtasks: Vec<String>,
) -> anyhow::Result<()> {
    let due_at = match due.as_deref() {
        Some(s) => Some(parse_due_input(s).ok_or_else(|| {
            anyhow!("unrecognised due date {s:?}; use YYYY-MM-DD [HH:MM], 'today', 'tomorrow', 'in Nd', or a weekday")
        })?),
        None => None,
    };

    let title = persistable_title(&title);
    let mut task = Task::draft(Uuid::new_v4().to_string(), title);
    task.categories = categories.iter().map(|s| Category::from_key(s.trim())).collect();
    task.due_at = due_at;
    task.repeat = repeat;
    task.reminder_minutes_before = reminder_minutes_before;
    task.priority = priority;
    task.notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    task.subtasks = subtasks
        .into_iter()
        .filter(|t| !t.trim().is_empty())
        .map(|t| Subtask {
            id: Uuid::new_v4().to_string(),
            title: t.trim().to_string(),
            done: false,
        })
        .collect();

    let id = task.id.clone();
    store.create(task);
    storage.save_tasks(store.tasks())?;
    println!("Added task {}", short_id(&id));
    Ok(())
}

/// List tasks, hiding completed ones unless asked.
pub fn cmd_list(store: &TaskStore, category: String, all: bool) -> anyhow::Result<()> {
    let filter = match category.as_str() {
        "all" => None,
        key => Some(Category::from_key(key)),
    };
    let rows: Vec<&Task> = store
        .filter_by_category(filter.as_ref())
        .into_iter()
        .filter(|t| all || !t.done)
        .collect();
    print_table(&rows);
    Ok(())
}

/// View detailed information about a single task.
pub fn cmd_view(store: &TaskStore, id: String) -> anyhow::Result<()> {
    let task_id = resolve_task_reference(store, &id)?;
    let task = store
        .get(&task_id)
        .ok_or_else(|| anyhow!("task {task_id} not found"))?;
    let now = Utc::now();

    println!("Id:          {}", task.id);
    println!("Title:       {}", task.title);
    println!("Done:        {}", if task.done { "yes" } else { "no" });
    println!("Categories:  {}", format_categories(&task.categories));
    println!(
        "Due:         {}",
        match task.due_at {
            Some(d) => format!(
                "{} ({})",
                d.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                format_due_relative(Some(d), now)
            ),
            None => "-".into(),
        }
    );
    println!("Repeat:      {}", format_repeat(task.repeat));
    println!(
        "Reminder:    {}",
        match task.reminder_minutes_before {
            Some(m) => format!("{m} min before"),
            None => "-".into(),
        }
    );
    println!("Priority:    {}", format_priority(task.priority));
    println!("Created:     {}", task.created_at.to_rfc3339());
    println!(
        "Updated:     {}",
        task.updated_at.map(|d| d.to_rfc3339()).unwrap_or_else(|| "-".into())
    );
    println!(
        "Completed:   {}",
        task.completed_at.map(|d| d.to_rfc3339()).unwrap_or_else(|| "-".into())
    );
    if let Some(notes) = &task.notes {
        println!("Notes:\n{notes}");
    }
    if !task.subtasks.is_empty() {
        println!("Subtasks:");
        for s in &task.subtasks {
            println!(
                "  [{}] {} ({})",
                if s.done { "x" } else { " " },
                s.title,
                short_id(&s.id)
            );
        }
    }
    Ok(())
}

/// Update fields on an existing task and persist the collection.
#[allow(clippy::too_many_arguments)]
pub fn cmd_edit(
    store: &mut TaskStore,
    storage: &Storage,
    id: String,
    title: Option<String>,
    notes: Option<String>,
    due: Option<String>,
    clear_due: bool,
    repeat: Option<Repeat>,
    clear_repeat: bool,
    reminder_minutes_before: Option<u32>,
    priority: Option<Priority>,
    add_categories: Vec<String>,
    rm_categories: Vec<String>,
) -> anyhow::Result<()> {
    let task_id = resolve_task_reference(store, &id)?;
    let mut task = store
        .get(&task_id)
        .ok_or_else(|| anyhow!("task {task_id} not found"))?
        .clone();

    if let Some(s) = title {
        task.title = persistable_title(&s);
    }
    if let Some(n) = notes {
        task.notes = if n.trim().is_empty() { None } else { Some(n.trim().to_string()) };
    }
    if clear_due {
        task.due_at = None;
    }
    if let Some(ds) = due {
        task.due_at = Some(parse_due_input(&ds).ok_or_else(|| {
            anyhow!("unrecognised due date {ds:?}; use YYYY-MM-DD [HH:MM], 'today', 'tomorrow', 'in Nd', or a weekday")
        })?);
    }
    if clear_repeat {
        task.repeat = None;
    }
    if let Some(r) = repeat {
        task.repeat = Some(r);
    }
    if let Some(m) = reminder_minutes_before {
        task.reminder_minutes_before = Some(m);
    }
    if let Some(p) = priority {
        task.priority = Some(p);
    }
    for key in &add_categories {
        let c = Category::from_key(key.trim());
        if !task.categories.contains(&c) {
            task.categories.push(c);
        }
    }
    let rm: Vec<Category> = rm_categories.iter().map(|k| Category::from_key(k.trim())).collect();
    task.categories.retain(|c| !rm.contains(c));

    store.update(task);
    storage.save_tasks(store.tasks())?;
    println!("Updated task {}", short_id(&task_id));
    Ok(())
}

/// Toggle completion on a task.
pub fn cmd_done(store: &mut TaskStore, storage: &Storage, id: String) -> anyhow::Result<()> {
    let task_id = resolve_task_reference(store, &id)?;
    store.toggle_done(&task_id);
    storage.save_tasks(store.tasks())?;
    match store.get(&task_id) {
        Some(t) if t.done => println!("Completed {}", short_id(&task_id)),
        _ => println!("Reopened {}", short_id(&task_id)),
    }
    Ok(())
}

/// Append a subtask to a task.
pub fn cmd_subtask_add(
    store: &mut TaskStore,
    storage: &Storage,
    task_ref: String,
    title: String,
) -> anyhow::Result<()> {
    if title.trim().is_empty() {
        bail!("subtask title cannot be empty");
    }
    let task_id = resolve_task_reference(store, &task_ref)?;
    let mut task = store
        .get(&task_id)
        .ok_or_else(|| anyhow!("task {task_id} not found"))?
        .clone();
    let sub_id = Uuid::new_v4().to_string();
    task.subtasks.push(Subtask {
        id: sub_id.clone(),
        title: title.trim().to_string(),
        done: false,
    });
    store.update(task);
    storage.save_tasks(store.tasks())?;
    println!("Added subtask {}", short_id(&sub_id));
    Ok(())
}

/// Toggle completion on one subtask.
pub fn cmd_subtask_toggle(
    store: &mut TaskStore,
    storage: &Storage,
    task_ref: String,
    subtask_ref: String,
) -> anyhow::Result<()> {
    let task_id = resolve_task_reference(store, &task_ref)?;
    let task = store
        .get(&task_id)
        .ok_or_else(|| anyhow!("task {task_id} not found"))?;
    let sub_id = resolve_subtask_reference(task, &subtask_ref)?;

    store.toggle_subtask_done(&task_id, &sub_id);
    storage.save_tasks(store.tasks())?;

    if let Some(task) = store.get(&task_id) {
        if let Some(sub) = task.subtasks.iter().find(|s| s.id == sub_id) {
            println!(
                "Subtask {} {}",
                short_id(&sub_id),
                if sub.done { "checked" } else { "unchecked" }
            );
        }
        if task.done && task.all_subtasks_done() {
            println!("All subtasks done; task {} completed", short_id(&task_id));
        }
    }
    Ok(())
}

/// Delete a task.
pub fn cmd_delete(store: &mut TaskStore, storage: &Storage, id: String) -> anyhow::Result<()> {
    let task_id = resolve_task_reference(store, &id)?;
    store.delete(&task_id);
    storage.save_tasks(store.tasks())?;
    println!("Deleted {}", short_id(&task_id));
    Ok(())
}

/// List category keys with usage counts, or add/remove custom keys.
pub fn cmd_categories(
    store: &TaskStore,
    storage: &Storage,
    action: Option<CategoryAction>,
) -> anyhow::Result<()> {
    let mut custom = storage.load_custom_categories();
    match action {
        None => {
            let in_use = store.categories_in_use();
            let count = |c: &Category| {
                store
                    .tasks()
                    .iter()
                    .filter(|t| t.categories.contains(c))
                    .count()
            };
            println!("{:<16} {:<8} {}", "Category", "Kind", "Tasks");
            for c in BUILT_IN_CATEGORIES {
                println!("{:<16} {:<8} {}", c.key(), "builtin", count(&c));
            }
            for key in &custom {
                let c = Category::from_key(key);
                println!("{:<16} {:<8} {}", truncate(key, 16), "custom", count(&c));
            }
            // Keys referenced by tasks but registered nowhere still matter
            // for filtering; surface them too.
            for c in in_use {
                if c.is_custom() && !custom.iter().any(|k| k == c.key()) {
                    println!("{:<16} {:<8} {}", truncate(c.key(), 16), "ad-hoc", count(&c));
                }
            }
        }
        Some(CategoryAction::Add { key }) => {
            let key = key.trim().to_string();
            if key.is_empty() {
                bail!("category key cannot be empty");
            }
            if !Category::from_key(&key).is_custom() {
                bail!("{key:?} is a built-in category");
            }
            if custom.iter().any(|k| *k == key) {
                println!("Category {key:?} already registered");
                return Ok(());
            }
            custom.push(key.clone());
            storage.save_custom_categories(&custom)?;
            println!("Registered category {key:?}");
        }
        Some(CategoryAction::Rm { key }) => {
            let before = custom.len();
            custom.retain(|k| *k != key);
            if custom.len() == before {
                println!("Category {key:?} not registered");
                return Ok(());
            }
            storage.save_custom_categories(&custom)?;
            println!("Removed category {key:?}");
        }
    }
    Ok(())
}

/// Print shell completions to stdout.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut std::io::stdout());
}

/// Substitute the placeholder title when the user left it blank.
fn persistable_title(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        UNTITLED_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Resolve a task reference (full id, unique id prefix, or exact
/// case-insensitive title) to a task id.
pub fn resolve_task_reference(store: &TaskStore, reference: &str) -> anyhow::Result<String> {
    if store.get(reference).is_some() {
        return Ok(reference.to_string());
    }

    let prefix_matches: Vec<&Task> = store
        .tasks()
        .iter()
        .filter(|t| t.id.starts_with(reference))
        .collect();
    match prefix_matches.len() {
        1 => return Ok(prefix_matches[0].id.clone()),
        n if n > 1 => {
            let mut msg = format!("id prefix {reference:?} is ambiguous:\n");
            for t in prefix_matches {
                msg.push_str(&format!("  {}  {}\n", short_id(&t.id), t.title));
            }
            msg.push_str("use a longer prefix or the full id");
            bail!(msg);
        }
        _ => {}
    }

    let title_matches: Vec<&Task> = store
        .tasks()
        .iter()
        .filter(|t| t.title.eq_ignore_ascii_case(reference))
        .collect();
    match title_matches.len() {
        0 => bail!("no task matches {reference:?}"),
        1 => Ok(title_matches[0].id.clone()),
        _ => {
            let mut msg = format!("multiple tasks titled {reference:?}:\n");
            for t in title_matches {
                msg.push_str(&format!("  {}  {}\n", short_id(&t.id), t.title));
            }
            msg.push_str("use the id instead");
            bail!(msg)
        }
    }
}

/// Resolve a subtask reference within one task, by id, id prefix, or exact
/// case-insensitive title.
fn resolve_subtask_reference(task: &Task, reference: &str) -> anyhow::Result<String> {
    if let Some(s) = task.subtasks.iter().find(|s| s.id == reference) {
        return Ok(s.id.clone());
    }
    let prefix: Vec<&Subtask> = task
        .subtasks
        .iter()
        .filter(|s| s.id.starts_with(reference))
        .collect();
    if prefix.len() == 1 {
        return Ok(prefix[0].id.clone());
    }
    if prefix.len() > 1 {
        bail!("subtask id prefix {reference:?} is ambiguous");
    }
    let by_title: Vec<&Subtask> = task
        .subtasks
        .iter()
        .filter(|s| s.title.eq_ignore_ascii_case(reference))
        .collect();
    match by_title.len() {
        1 => Ok(by_title[0].id.clone()),
        0 => bail!("no subtask of {:?} matches {reference:?}", task.title),
        _ => bail!("multiple subtasks of {:?} titled {reference:?}; use the id", task.title),
    }
}

/// Parse human-readable due input.
///
/// Supports:
/// - "today", "tomorrow"
/// - bare weekday names ("friday", "fri") for this week's occurrence
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD" with an optional "HH:MM"
///
/// Date-only input lands on 09:00 local time, matching the default slot the
/// original editor proposed for reminders to hang off.
pub fn parse_due_input(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim().to_lowercase();
    let today = Local::now().date_naive();

    let date_at = |d: NaiveDate, t: NaiveTime| -> Option<DateTime<Utc>> {
        Local
            .from_local_datetime(&d.and_time(t))
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    };
    let default_time = NaiveTime::from_hms_opt(9, 0, 0)?;

    match s.as_str() {
        "today" => return date_at(today, default_time),
        "tomorrow" => return date_at(today + Duration::days(1), default_time),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return date_at(today + Duration::days(days), default_time);
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return date_at(today + Duration::weeks(weeks), default_time);
            }
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    for (name, target) in weekdays {
        if s == name {
            let current = today.weekday().num_days_from_monday() as i64;
            let ahead = (target + 7 - current) % 7;
            return date_at(today + Duration::days(ahead), default_time);
        }
    }

    // "YYYY-MM-DD HH:MM" then plain "YYYY-MM-DD".
    if let Some((date_part, time_part)) = s.split_once(' ') {
        let d = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
        let t = NaiveTime::parse_from_str(time_part, "%H:%M").ok()?;
        return date_at(d, t);
    }
    let d = NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()?;
    date_at(d, default_time)
}

/// Format a due timestamp relative to now ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let days = d.with_timezone(&Local).date_naive()
                - now.with_timezone(&Local).date_naive();
            match days.num_days() {
                0 => "today".into(),
                1 => "tomorrow".into(),
                n if n > 1 => format!("in {n}d"),
                n => format!("{}d late", -n),
            }
        }
    }
}

/// First segment of a UUID, enough to reference tasks on the command line.
pub fn short_id(id: &str) -> &str {
    id.split('-').next().unwrap_or(id)
}

fn format_categories(categories: &[Category]) -> String {
    if categories.is_empty() {
        "-".into()
    } else {
        categories.iter().map(Category::key).collect::<Vec<_>>().join(",")
    }
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task]) {
    println!(
        "{:<9} {:<3} {:<6} {:<9} {:<6} {}",
        "ID", "Do", "Pri", "Due", "Subs", "Title [categories]"
    );
    let now = Utc::now();
    for t in tasks {
        let progress = match t.subtask_progress() {
            Some((done, total)) => format!("{done}/{total}"),
            None => "-".into(),
        };
        let cats = if t.categories.is_empty() {
            String::new()
        } else {
            format!(" [{}]", format_categories(&t.categories))
        };
        println!(
            "{:<9} {:<3} {:<6} {:<9} {:<6} {}{}",
            short_id(&t.id),
            if t.done { "x" } else { "-" },
            format_priority(t.priority),
            format_due_relative(t.due_at, now),
            progress,
            truncate(&t.title, 40),
            cats
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_parsing_relative_forms() {
        assert!(parse_due_input("today").is_some());
        assert!(parse_due_input("tomorrow").is_some());
        assert!(parse_due_input("in 3d").is_some());
        assert!(parse_due_input("in 2w").is_some());
        assert!(parse_due_input("friday").is_some());
        assert!(parse_due_input("fri").is_some());
        assert!(parse_due_input("not a date").is_none());
    }

    #[test]
    fn due_parsing_iso_forms() {
        let d = parse_due_input("2030-06-15").unwrap();
        assert_eq!(d.with_timezone(&Local).date_naive().to_string(), "2030-06-15");

        let dt = parse_due_input("2030-06-15 18:30").unwrap();
        let local = dt.with_timezone(&Local);
        assert_eq!(local.format("%H:%M").to_string(), "18:30");
    }

    #[test]
    fn relative_due_formatting() {
        let now = Utc::now();
        assert_eq!(format_due_relative(None, now), "-");
        assert_eq!(format_due_relative(Some(now), now), "today");
        assert_eq!(
            format_due_relative(Some(now + Duration::days(3)), now),
            "in 3d"
        );
        assert_eq!(
            format_due_relative(Some(now - Duration::days(2)), now),
            "2d late"
        );
    }

    #[test]
    fn reference_resolution_by_prefix_and_title() {
        let mut store = TaskStore::default();
        store.create(Task::draft("aaaa1111-x".into(), "Buy milk".into()));
        store.create(Task::draft("bbbb2222-x".into(), "Call plumber".into()));

        assert_eq!(resolve_task_reference(&store, "aaaa").unwrap(), "aaaa1111-x");
        assert_eq!(
            resolve_task_reference(&store, "call plumber").unwrap(),
            "bbbb2222-x"
        );
        assert!(resolve_task_reference(&store, "zzz").is_err());
    }

    #[test]
    fn ambiguous_prefix_is_an_error() {
        let mut store = TaskStore::default();
        store.create(Task::draft("abc1".into(), "one".into()));
        store.create(Task::draft("abc2".into(), "two".into()));
        assert!(resolve_task_reference(&store, "abc").is_err());
    }

    #[test]
    fn empty_title_gets_placeholder() {
        assert_eq!(persistable_title("   "), UNTITLED_TITLE);
        assert_eq!(persistable_title(" Walk dog "), "Walk dog");
    }

    #[test]
    fn truncate_is_char_aware() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title here", 8), "a longe…");
    }
}
