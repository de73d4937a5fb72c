//! In-memory task store and its mutation operations.
//!
//! The store holds the authoritative task collection for the session and is
//! the only place completion invariants are enforced:
//!
//! - Marking a task done cascades `done = true` onto every subtask.
//!   Marking it not-done leaves subtasks untouched (the cascade is
//!   deliberately asymmetric).
//! - Checking off the last open subtask auto-completes the parent.
//!   Un-checking a subtask never reopens the parent.
//! - `completed_at` is stamped on the first completion only and survives
//!   later reopen/complete cycles.
//!
//! Mutations addressed at unknown ids are silent no-ops. Persistence is not
//! the store's concern; callers hand the collection to the storage gateway
//! after mutating.

use chrono::Utc;

use crate::fields::Category;
use crate::task::Task;

/// Authoritative in-memory collection of tasks for the current session.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        TaskStore { tasks }
    }

    /// The full collection, most recently created first.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Insert a fully-formed task at the front of the collection, or
    /// overwrite in place when the id already exists (an editor may save the
    /// same draft twice). Id uniqueness is the caller's contract; the store
    /// does not generate ids.
    pub fn create(&mut self, mut task: Task) {
        task.dedup_categories();
        match self.tasks.iter().position(|t| t.id == task.id) {
            Some(i) => self.tasks[i] = task,
            None => self.tasks.insert(0, task),
        }
    }

    /// Replace the stored task with the same id, stamping `updated_at`.
    /// No-op when the id is unknown: a best-effort replace, not an error.
    pub fn update(&mut self, mut task: Task) {
        if let Some(i) = self.tasks.iter().position(|t| t.id == task.id) {
            task.dedup_categories();
            task.updated_at = Some(Utc::now());
            self.tasks[i] = task;
        }
    }

    /// Flip `done` on a task. Completing a task marks every subtask done;
    /// reopening it leaves them as they are. No-op on an unknown id.
    pub fn toggle_done(&mut self, id: &str) {
        let now = Utc::now();
        if let Some(t) = self.get_mut(id) {
            t.done = !t.done;
            t.updated_at = Some(now);
            if t.done {
                if t.completed_at.is_none() {
                    t.completed_at = Some(now);
                }
                for s in &mut t.subtasks {
                    s.done = true;
                }
            }
        }
    }

    /// Flip `done` on one subtask. When that leaves every subtask done, the
    /// parent completes as well (with the same `completed_at` semantics as
    /// [`toggle_done`]). Un-checking never reopens the parent. No-op when
    /// either id is unknown.
    ///
    /// [`toggle_done`]: TaskStore::toggle_done
    pub fn toggle_subtask_done(&mut self, task_id: &str, subtask_id: &str) {
        let now = Utc::now();
        if let Some(t) = self.get_mut(task_id) {
            let Some(s) = t.subtasks.iter_mut().find(|s| s.id == subtask_id) else {
                return;
            };
            s.done = !s.done;
            t.updated_at = Some(now);
            if !t.done && t.all_subtasks_done() {
                t.done = true;
                if t.completed_at.is_none() {
                    t.completed_at = Some(now);
                }
            }
        }
    }

    /// Remove a task (and with it the subtasks it owns). No-op when absent.
    pub fn delete(&mut self, id: &str) {
        self.tasks.retain(|t| t.id != id);
    }

    /// Read-only projection: tasks carrying the given category key, in
    /// collection order. `None` means "all".
    pub fn filter_by_category<'a>(&'a self, filter: Option<&'a Category>) -> Vec<&'a Task> {
        match filter {
            None => self.tasks.iter().collect(),
            Some(c) => self
                .tasks
                .iter()
                .filter(|t| t.categories.contains(c))
                .collect(),
        }
    }

    /// Every distinct category key in use, in first-seen order.
    pub fn categories_in_use(&self) -> Vec<Category> {
        let mut out: Vec<Category> = Vec::new();
        for t in &self.tasks {
            for c in &t.categories {
                if !out.contains(c) {
                    out.push(c.clone());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Subtask;
    use chrono::{DateTime, Utc};

    fn sub(id: &str, done: bool) -> Subtask {
        Subtask {
            id: id.into(),
            title: id.into(),
            done,
        }
    }

    fn task_with_subtasks(id: &str, subtasks: Vec<Subtask>) -> Task {
        let mut t = Task::draft(id.into(), format!("task {id}"));
        t.subtasks = subtasks;
        t
    }

    #[test]
    fn create_inserts_at_front() {
        let mut store = TaskStore::default();
        store.create(Task::draft("1".into(), "first".into()));
        store.create(Task::draft("2".into(), "second".into()));
        let ids: Vec<_> = store.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["2", "1"]);
    }

    #[test]
    fn create_with_existing_id_overwrites_in_place() {
        let mut store = TaskStore::default();
        store.create(Task::draft("1".into(), "one".into()));
        store.create(Task::draft("2".into(), "two".into()));
        store.create(Task::draft("1".into(), "one, edited".into()));
        let titles: Vec<_> = store.tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["two", "one, edited"]);
    }

    #[test]
    fn create_dedups_categories_keeping_order() {
        let mut store = TaskStore::default();
        let mut t = Task::draft("1".into(), "t".into());
        t.categories = vec![
            Category::Work,
            Category::Home,
            Category::Work,
            Category::Custom("errands".into()),
        ];
        store.create(t);
        assert_eq!(
            store.get("1").unwrap().categories,
            vec![
                Category::Work,
                Category::Home,
                Category::Custom("errands".into())
            ]
        );
    }

    #[test]
    fn update_replaces_and_stamps_updated_at() {
        let mut store = TaskStore::default();
        store.create(Task::draft("1".into(), "before".into()));
        assert!(store.get("1").unwrap().updated_at.is_none());

        let mut edited = store.get("1").unwrap().clone();
        edited.title = "after".into();
        store.update(edited);

        let t = store.get("1").unwrap();
        assert_eq!(t.title, "after");
        assert!(t.updated_at.is_some());
    }

    #[test]
    fn update_preserves_created_at() {
        let mut store = TaskStore::default();
        store.create(Task::draft("1".into(), "t".into()));
        let created = store.get("1").unwrap().created_at;
        let edited = store.get("1").unwrap().clone();
        store.update(edited);
        store.toggle_done("1");
        store.toggle_done("1");
        assert_eq!(store.get("1").unwrap().created_at, created);
    }

    #[test]
    fn toggle_done_cascades_to_subtasks() {
        // Scenario B: completing the parent completes its subtasks.
        let mut store = TaskStore::default();
        store.create(task_with_subtasks("2", vec![sub("x", false)]));
        store.toggle_done("2");
        let t = store.get("2").unwrap();
        assert!(t.done);
        assert!(t.subtasks.iter().all(|s| s.done));
        assert!(t.completed_at.is_some());
    }

    #[test]
    fn reopening_does_not_uncheck_subtasks() {
        let mut store = TaskStore::default();
        store.create(task_with_subtasks("1", vec![sub("a", false), sub("b", false)]));
        store.toggle_done("1");
        store.toggle_done("1");
        let t = store.get("1").unwrap();
        assert!(!t.done);
        assert!(t.subtasks.iter().all(|s| s.done), "cascade is one-way");
    }

    #[test]
    fn last_subtask_auto_completes_parent() {
        // Scenario A: checking subtasks one by one.
        let mut store = TaskStore::default();
        store.create(task_with_subtasks("1", vec![sub("a", false), sub("b", false)]));

        store.toggle_subtask_done("1", "a");
        let t = store.get("1").unwrap();
        assert!(t.subtasks[0].done);
        assert!(!t.done, "parent stays open while a subtask remains");
        assert!(t.completed_at.is_none());

        store.toggle_subtask_done("1", "b");
        let t = store.get("1").unwrap();
        assert!(t.subtasks[1].done);
        assert!(t.done, "all subtasks done auto-completes the parent");
        assert!(t.completed_at.is_some());
    }

    #[test]
    fn unchecking_a_subtask_leaves_parent_done() {
        let mut store = TaskStore::default();
        store.create(task_with_subtasks("1", vec![sub("a", true), sub("b", false)]));
        store.toggle_subtask_done("1", "b"); // parent auto-completes
        assert!(store.get("1").unwrap().done);
        store.toggle_subtask_done("1", "a");
        let t = store.get("1").unwrap();
        assert!(!t.subtasks[0].done);
        assert!(t.done, "no symmetric cascade on uncheck");
    }

    #[test]
    fn completed_at_is_set_once_and_retained() {
        // Scenario C: reopen + re-complete keeps the original timestamp.
        let mut store = TaskStore::default();
        let mut t = Task::draft("3".into(), "t".into());
        t.done = true;
        let stamp: DateTime<Utc> = "2024-01-01T00:00:00Z".parse().unwrap();
        t.completed_at = Some(stamp);
        store.create(t);

        store.toggle_done("3"); // done -> false
        store.toggle_done("3"); // done -> true again
        assert_eq!(store.get("3").unwrap().completed_at, Some(stamp));
    }

    #[test]
    fn mutations_on_unknown_ids_are_noops() {
        let mut store = TaskStore::default();
        store.create(task_with_subtasks("1", vec![sub("a", false)]));
        let before: Vec<Task> = store.tasks().to_vec();

        store.toggle_done("nope");
        store.toggle_subtask_done("nope", "a");
        store.toggle_subtask_done("1", "nope");
        store.update(Task::draft("nope".into(), "ghost".into()));
        store.delete("nonexistent");

        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn delete_removes_task_and_its_subtasks() {
        let mut store = TaskStore::default();
        store.create(task_with_subtasks("1", vec![sub("a", false)]));
        store.create(Task::draft("2".into(), "keep".into()));
        store.delete("1");
        assert!(store.get("1").is_none());
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn filter_by_category_preserves_order() {
        let mut store = TaskStore::default();
        for (id, cat) in [("1", "work"), ("2", "home"), ("3", "work")] {
            let mut t = Task::draft(id.into(), id.into());
            t.categories = vec![Category::from_key(cat)];
            store.create(t);
        }
        // Collection order is most-recent-first: 3, 2, 1.
        let work = store.filter_by_category(Some(&Category::Work));
        let ids: Vec<_> = work.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["3", "1"]);

        let all = store.filter_by_category(None);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn categories_in_use_first_seen_order() {
        let mut store = TaskStore::default();
        let mut a = Task::draft("1".into(), "a".into());
        a.categories = vec![Category::Work, Category::Home];
        let mut b = Task::draft("2".into(), "b".into());
        b.categories = vec![Category::Home, Category::Custom("errands".into())];
        store.create(a);
        store.create(b);
        assert_eq!(
            store.categories_in_use(),
            vec![
                Category::Home,
                Category::Custom("errands".into()),
                Category::Work
            ]
        );
    }
}
