//! Enumerations and field types for task categorisation.
//!
//! This module defines the structured field types carried by tasks: category
//! keys (a closed set of built-ins plus arbitrary user-defined keys),
//! recurrence intervals, and priority levels.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A category key attached to a task.
///
/// The six built-in keys are modelled as unit variants; anything else is a
/// user-defined key carried verbatim in `Custom`. On the wire a category is
/// always a plain JSON string, so `Custom("work")` never occurs: every
/// constructor goes through [`Category::from_key`], which collapses known
/// keys onto their variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Work,
    Home,
    Global,
    Habit,
    Personal,
    Urgent,
    Custom(String),
}

/// The built-in category keys, in display order.
pub const BUILT_IN_CATEGORIES: [Category; 6] = [
    Category::Work,
    Category::Home,
    Category::Global,
    Category::Habit,
    Category::Personal,
    Category::Urgent,
];

impl Category {
    /// Parse a key string. Unknown keys become `Custom`; never fails.
    pub fn from_key(s: &str) -> Category {
        match s {
            "work" => Category::Work,
            "home" => Category::Home,
            "global" => Category::Global,
            "habit" => Category::Habit,
            "personal" => Category::Personal,
            "urgent" => Category::Urgent,
            other => Category::Custom(other.to_string()),
        }
    }

    /// The stable string key used in storage and on the command line.
    pub fn key(&self) -> &str {
        match self {
            Category::Work => "work",
            Category::Home => "home",
            Category::Global => "global",
            Category::Habit => "habit",
            Category::Personal => "personal",
            Category::Urgent => "urgent",
            Category::Custom(s) => s,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Category::Custom(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Category::from_key(&s))
    }
}

/// Recurrence interval for a repeating task. A task with no recurrence
/// carries `None` at the field level rather than a dedicated variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Repeat {
    Daily,
    Weekly,
    Monthly,
}

/// Task priority level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Format a recurrence interval for display.
pub fn format_repeat(r: Option<Repeat>) -> &'static str {
    match r {
        Some(Repeat::Daily) => "daily",
        Some(Repeat::Weekly) => "weekly",
        Some(Repeat::Monthly) => "monthly",
        None => "-",
    }
}

/// Format a priority level for display.
pub fn format_priority(p: Option<Priority>) -> &'static str {
    match p {
        Some(Priority::Low) => "low",
        Some(Priority::Medium) => "medium",
        Some(Priority::High) => "high",
        None => "-",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_key_collapses_built_ins() {
        assert_eq!(Category::from_key("work"), Category::Work);
        assert_eq!(Category::from_key("personal"), Category::Personal);
        assert_eq!(
            Category::from_key("groceries"),
            Category::Custom("groceries".into())
        );
    }

    #[test]
    fn category_serialises_as_plain_string() {
        assert_eq!(serde_json::to_string(&Category::Home).unwrap(), "\"home\"");
        assert_eq!(
            serde_json::to_string(&Category::Custom("side-project".into())).unwrap(),
            "\"side-project\""
        );
    }

    #[test]
    fn category_deserialisation_never_produces_custom_built_in() {
        let c: Category = serde_json::from_str("\"urgent\"").unwrap();
        assert_eq!(c, Category::Urgent);
        assert!(!c.is_custom());
    }

    #[test]
    fn repeat_and_priority_wire_format() {
        assert_eq!(serde_json::to_string(&Repeat::Weekly).unwrap(), "\"weekly\"");
        let p: Priority = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(p, Priority::High);
    }
}
