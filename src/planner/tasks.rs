use rand::Rng;
use tracing::{debug, info, warn};

use super::{Planner, validate_date};
use crate::database::KeyValueStore;
use crate::error::PlannerError;
use crate::models::{NewTask, Task, TaskId};
use crate::time::TimeSlot;

/// Whether an insert may go ahead when it overlaps existing tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConflictPolicy {
    Reject,
    Override,
}

impl<S: KeyValueStore> Planner<S> {
    /// Create a task. Fails with `DuplicateTask` on an identical
    /// (date, start time, title) and `SchedulingConflict` on any overlap.
    pub fn add_task(&mut self, candidate: NewTask) -> Result<Task, PlannerError> {
        self.insert_task(candidate, ConflictPolicy::Reject)
    }

    /// Create a task even if it overlaps others on the same day.
    /// Used once the caller has confirmed a `SchedulingConflict`.
    pub fn force_add_task(&mut self, candidate: NewTask) -> Result<Task, PlannerError> {
        self.insert_task(candidate, ConflictPolicy::Override)
    }

    fn insert_task(&mut self, candidate: NewTask, policy: ConflictPolicy) -> Result<Task, PlannerError> {
        let slot = validate_schedule(&candidate.date, &candidate.start_time, candidate.duration)?;

        let types = self.load_types()?;
        if !candidate.task_type.is_empty() && !types.contains(&candidate.task_type) {
            return Err(PlannerError::UnknownCategory(candidate.task_type));
        }

        let mut tasks = self.load_tasks()?;

        let is_duplicate = tasks.iter().any(|t| {
            t.date == candidate.date && t.start_time == candidate.start_time && t.title == candidate.title
        });
        if is_duplicate {
            debug!(date = %candidate.date, start = %candidate.start_time, "Rejected duplicate task");
            return Err(PlannerError::DuplicateTask {
                date: candidate.date,
                start_time: candidate.start_time,
                title: candidate.title,
            });
        }

        if policy == ConflictPolicy::Reject {
            let conflicts = find_conflicts(&tasks, &candidate.date, slot, None);
            if !conflicts.is_empty() {
                warn!(
                    date = %candidate.date,
                    start = %candidate.start_time,
                    count = conflicts.len(),
                    "Task overlaps existing schedule"
                );
                return Err(PlannerError::SchedulingConflict {
                    date: candidate.date,
                    conflicts,
                });
            }
        }

        let id = next_task_id(&tasks);
        let task = candidate.into_task(id);
        tasks.push(task.clone());
        self.save_tasks(tasks)?;

        info!(id, date = %task.date, forced = policy == ConflictPolicy::Override, "Added task");
        Ok(task)
    }

    /// Replace an existing task. The task's own previous slot is ignored
    /// when checking for overlaps; there is no forced variant.
    pub fn update_task(&mut self, task: Task) -> Result<Task, PlannerError> {
        let slot = validate_schedule(&task.date, &task.start_time, task.duration)?;

        let mut tasks = self.load_tasks()?;
        let index = tasks
            .iter()
            .position(|t| t.id == task.id)
            .ok_or(PlannerError::TaskNotFound(task.id))?;

        let conflicts = find_conflicts(&tasks, &task.date, slot, Some(task.id));
        if !conflicts.is_empty() {
            warn!(id = task.id, date = %task.date, "Updated task overlaps existing schedule");
            return Err(PlannerError::SchedulingConflict {
                date: task.date,
                conflicts,
            });
        }

        tasks[index] = task.clone();
        self.save_tasks(tasks)?;

        info!(id = task.id, "Updated task");
        Ok(task)
    }

    /// Flip completion. Unknown ids are ignored and yield `None`.
    pub fn toggle_task(&mut self, id: TaskId) -> Result<Option<Task>, PlannerError> {
        let mut tasks = self.load_tasks()?;
        let Some(index) = tasks.iter().position(|t| t.id == id) else {
            debug!(id, "Toggle ignored, no such task");
            self.tasks = tasks;
            return Ok(None);
        };
        tasks[index].is_completed = !tasks[index].is_completed;
        let toggled = tasks[index].clone();
        self.save_tasks(tasks)?;

        info!(id, completed = toggled.is_completed, "Toggled task");
        Ok(Some(toggled))
    }

    /// Remove a task; returns whether anything was removed
    pub fn delete_task(&mut self, id: TaskId) -> Result<bool, PlannerError> {
        let mut tasks = self.load_tasks()?;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            debug!(id, "Delete ignored, no such task");
            self.tasks = tasks;
            return Ok(false);
        }
        self.save_tasks(tasks)?;

        info!(id, "Deleted task");
        Ok(true)
    }

    pub fn get_task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks on `date`, earliest start first
    pub fn list_by_date(&self, date: &str) -> Vec<Task> {
        // HH:MM is fixed width, so string order is chronological
        let mut tasks: Vec<Task> = self.tasks.iter().filter(|t| t.date == date).cloned().collect();
        tasks.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        tasks
    }

    /// Tasks whose date starts with `year_month` (`YYYY-MM`)
    pub fn list_by_month_prefix(&self, year_month: &str) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|t| t.date.starts_with(year_month))
            .cloned()
            .collect()
    }
}

fn validate_schedule(date: &str, start_time: &str, duration: u32) -> Result<TimeSlot, PlannerError> {
    validate_date(date)?;
    if duration == 0 {
        return Err(PlannerError::InvalidFormat(
            "Duration must be at least one minute".to_string(),
        ));
    }
    TimeSlot::parse(start_time, duration)
}

/// Tasks on `date` whose slot overlaps `slot`, skipping `exclude`
fn find_conflicts(tasks: &[Task], date: &str, slot: TimeSlot, exclude: Option<TaskId>) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| t.date == date && Some(t.id) != exclude)
        .filter(|t| match TimeSlot::parse(&t.start_time, t.duration) {
            Ok(existing) => existing.overlaps(&slot),
            Err(_) => {
                warn!(id = t.id, start = %t.start_time, "Skipping stored task with unreadable start time");
                false
            }
        })
        .cloned()
        .collect()
}

fn next_task_id(existing: &[Task]) -> TaskId {
    let mut rng = rand::thread_rng();
    let millis = chrono::Utc::now().timestamp_millis();
    loop {
        let id = millis * 1000 + rng.gen_range(0..1000);
        if !existing.iter().any(|t| t.id == id) {
            return id;
        }
    }
}
