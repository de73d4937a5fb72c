//! Task and subtask data structures.
//!
//! This module defines the core `Task` entity with its scheduling,
//! categorisation and completion metadata, and the `Subtask` checklist items
//! it owns. Deserialization goes through a raw record shape so that legacy
//! blobs written with a singular `category` field normalise into the current
//! multi-category form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::{Category, Priority, Repeat};

/// Title substituted when a task is persisted with an empty title.
pub const UNTITLED_TITLE: &str = "New task";

/// A child checklist item, exclusively owned by one task. Subtasks carry no
/// timestamps of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    pub done: bool,
}

/// A single to-do item.
///
/// `created_at` is assigned once at construction and never reassigned.
/// `updated_at` is stamped by the store on edits, not on creation.
/// `completed_at` is stamped on the first completion and retained even if
/// the task is later reopened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TaskRecord")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub categories: Vec<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<Repeat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_minutes_before: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub subtasks: Vec<Subtask>,
    pub done: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a draft task: empty categories and subtasks, not done, with
    /// `created_at` stamped now and no edit history.
    pub fn draft(id: String, title: String) -> Self {
        Task {
            id,
            title,
            categories: Vec::new(),
            due_at: None,
            repeat: None,
            reminder_minutes_before: None,
            priority: None,
            notes: None,
            subtasks: Vec::new(),
            done: false,
            created_at: Utc::now(),
            updated_at: None,
            completed_at: None,
        }
    }

    /// True when the task has at least one subtask and every one is done.
    pub fn all_subtasks_done(&self) -> bool {
        !self.subtasks.is_empty() && self.subtasks.iter().all(|s| s.done)
    }

    /// `(done, total)` subtask counts, or `None` when there are no subtasks.
    pub fn subtask_progress(&self) -> Option<(usize, usize)> {
        if self.subtasks.is_empty() {
            return None;
        }
        let done = self.subtasks.iter().filter(|s| s.done).count();
        Some((done, self.subtasks.len()))
    }

    /// Drop duplicate category keys, keeping the first occurrence of each
    /// so the declared display order survives.
    pub fn dedup_categories(&mut self) {
        let mut seen = Vec::with_capacity(self.categories.len());
        self.categories.retain(|c| {
            if seen.contains(c) {
                false
            } else {
                seen.push(c.clone());
                true
            }
        });
    }
}

/// Raw persisted shape of a task. Older blobs carried a singular `category`
/// string instead of the `categories` array; both shapes deserialise here
/// and normalise in the `From` conversion.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: String,
    #[serde(default)]
    title: String,
    categories: Option<Vec<Category>>,
    category: Option<Category>,
    due_at: Option<DateTime<Utc>>,
    repeat: Option<Repeat>,
    reminder_minutes_before: Option<u32>,
    priority: Option<Priority>,
    notes: Option<String>,
    #[serde(default)]
    subtasks: Vec<Subtask>,
    #[serde(default)]
    done: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<TaskRecord> for Task {
    fn from(rec: TaskRecord) -> Self {
        // An explicit categories array wins, even when empty. Records
        // predating multi-category support fall back to their singular
        // field, defaulting to "personal".
        let categories = rec
            .categories
            .unwrap_or_else(|| vec![rec.category.unwrap_or(Category::Personal)]);
        let mut task = Task {
            id: rec.id,
            title: rec.title,
            categories,
            due_at: rec.due_at,
            repeat: rec.repeat,
            reminder_minutes_before: rec.reminder_minutes_before,
            priority: rec.priority,
            notes: rec.notes,
            subtasks: rec.subtasks,
            done: rec.done,
            created_at: rec.created_at,
            updated_at: rec.updated_at,
            completed_at: rec.completed_at,
        };
        task.dedup_categories();
        task
    }
}
