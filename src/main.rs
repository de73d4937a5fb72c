//! # todo - Personal Task Manager CLI
//!
//! A small file-backed to-do manager with categories, subtasks, recurrence,
//! reminders and priorities.
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a task with subtasks
//! todo add "Feed the animals" --category home \
//!     --subtask "Cat" --subtask "Dog" --subtask "Aquarium"
//!
//! # List open tasks, or one category only
//! todo list
//! todo list --category home
//!
//! # Check off a subtask (checking the last one completes the parent)
//! todo subtask toggle "Feed the animals" cat
//!
//! # Toggle a task done / reopen it
//! todo done "Feed the animals"
//! ```
//!
//! Tasks are referenced by full id, unique id prefix, or exact title.
//!
//! Data is stored in `~/.todo/` as two JSON files: the task list and the
//! user-defined category keys. Corrupt or missing files are treated as
//! empty rather than errors, so the tool always starts.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod cmd;
pub mod fields;
pub mod storage;
pub mod store;
pub mod task;

use cli::Cli;
use cmd::*;
use storage::Storage;
use store::TaskStore;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        cmd_completions(*shell);
        return Ok(());
    }

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".todo")
        }
    };

    let storage = Storage::new(data_dir);
    let mut store = TaskStore::new(storage.load_tasks());

    match cli.command {
        Commands::Completions { .. } => unreachable!("handled above"),

        Commands::Add {
            title, categories, due, repeat, reminder_minutes_before,
            priority, notes, subtasks,
        } => cmd_add(
            &mut store, &storage, title, categories, due, repeat,
            reminder_minutes_before, priority, notes, subtasks,
        ),

        Commands::List { category, all } => cmd_list(&store, category, all),

        Commands::View { id } => cmd_view(&store, id),

        Commands::Edit {
            id, title, notes, due, clear_due, repeat, clear_repeat,
            reminder_minutes_before, priority, add_categories, rm_categories,
        } => cmd_edit(
            &mut store, &storage, id, title, notes, due, clear_due, repeat,
            clear_repeat, reminder_minutes_before, priority, add_categories,
            rm_categories,
        ),

        Commands::Done { id } => cmd_done(&mut store, &storage, id),

        Commands::Subtask { action } => match action {
            SubtaskAction::Add { task, title } => {
                cmd_subtask_add(&mut store, &storage, task, title)
            }
            SubtaskAction::Toggle { task, subtask } => {
                cmd_subtask_toggle(&mut store, &storage, task, subtask)
            }
        },

        Commands::Delete { id } => cmd_delete(&mut store, &storage, id),

        Commands::Categories { action } => cmd_categories(&store, &storage, action),
    }
}
