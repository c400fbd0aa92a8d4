//! The planner store: owns every record collection and keeps the in-memory
//! view in step with the key-value backend.
//!
//! Every mutation re-reads the persisted collection it touches, validates
//! against that fresh copy, writes the whole collection back and only then
//! swaps the in-memory view. A failed validation writes nothing.

mod backup;
mod categories;
mod feedback;
mod monthly;
mod stats;
mod tasks;

pub use backup::Snapshot;
pub use stats::{MonthlySummary, UNCATEGORIZED};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::database::KeyValueStore;
use crate::error::PlannerError;
use crate::models::{Feedback, MonthlyData, Task, dedupe_task_ids};
use crate::utils;

pub const KEY_TASKS: &str = "study_planner_tasks";
pub const KEY_FEEDBACKS: &str = "study_planner_feedbacks";
pub const KEY_TYPES: &str = "study_planner_types";
pub const KEY_DEFAULT_TYPE: &str = "study_planner_default_type";
pub const KEY_MONTHLY: &str = "study_planner_monthly";

/// Seed values used when the registry has never been written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerDefaults {
    pub task_types: Vec<String>,
    pub default_task_type: String,
}

impl Default for PlannerDefaults {
    fn default() -> Self {
        Self {
            task_types: ["공부", "운동", "독서", "휴식"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_task_type: "공부".to_string(),
        }
    }
}

pub struct Planner<S: KeyValueStore> {
    store: S,
    defaults: PlannerDefaults,
    tasks: Vec<Task>,
    feedbacks: BTreeMap<String, Feedback>,
    task_types: Vec<String>,
    default_task_type: String,
    monthly: BTreeMap<String, MonthlyData>,
}

impl<S: KeyValueStore> Planner<S> {
    /// Load every collection from `store`
    pub fn open(store: S, defaults: PlannerDefaults) -> Result<Self, PlannerError> {
        let mut planner = Planner {
            store,
            default_task_type: defaults.default_task_type.clone(),
            task_types: defaults.task_types.clone(),
            defaults,
            tasks: Vec::new(),
            feedbacks: BTreeMap::new(),
            monthly: BTreeMap::new(),
        };
        planner.reload()?;
        Ok(planner)
    }

    /// Replace the in-memory view with what is currently persisted
    pub fn reload(&mut self) -> Result<(), PlannerError> {
        self.tasks = self.load_tasks()?;
        self.feedbacks = self.load_feedbacks()?;
        self.task_types = self.load_types()?;
        self.default_task_type = self.load_default_type()?;
        self.monthly = self.load_monthly()?;
        debug!(
            tasks = self.tasks.len(),
            feedbacks = self.feedbacks.len(),
            types = self.task_types.len(),
            months = self.monthly.len(),
            "Loaded planner state"
        );
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn feedbacks(&self) -> &BTreeMap<String, Feedback> {
        &self.feedbacks
    }

    pub fn task_types(&self) -> &[String] {
        &self.task_types
    }

    pub fn default_task_type(&self) -> &str {
        &self.default_task_type
    }

    pub fn monthly(&self) -> &BTreeMap<String, MonthlyData> {
        &self.monthly
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PlannerError> {
        match self.store.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| PlannerError::Corrupt {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), PlannerError> {
        let raw = serde_json::to_string(value).map_err(|source| PlannerError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, &raw)?;
        Ok(())
    }

    fn load_tasks(&self) -> Result<Vec<Task>, PlannerError> {
        let mut tasks: Vec<Task> = self.read_json(KEY_TASKS)?.unwrap_or_default();
        let bumped = dedupe_task_ids(&mut tasks);
        if bumped > 0 {
            warn!(bumped, "Reassigned clashing task ids");
        }
        Ok(tasks)
    }

    fn save_tasks(&mut self, tasks: Vec<Task>) -> Result<(), PlannerError> {
        self.write_json(KEY_TASKS, &tasks)?;
        self.tasks = tasks;
        Ok(())
    }

    fn load_feedbacks(&self) -> Result<BTreeMap<String, Feedback>, PlannerError> {
        Ok(self.read_json(KEY_FEEDBACKS)?.unwrap_or_default())
    }

    fn save_feedbacks(&mut self, feedbacks: BTreeMap<String, Feedback>) -> Result<(), PlannerError> {
        self.write_json(KEY_FEEDBACKS, &feedbacks)?;
        self.feedbacks = feedbacks;
        Ok(())
    }

    fn load_types(&self) -> Result<Vec<String>, PlannerError> {
        Ok(self
            .read_json(KEY_TYPES)?
            .unwrap_or_else(|| self.defaults.task_types.clone()))
    }

    fn save_types(&mut self, types: Vec<String>) -> Result<(), PlannerError> {
        self.write_json(KEY_TYPES, &types)?;
        self.task_types = types;
        Ok(())
    }

    // Stored as a bare string, not JSON
    fn load_default_type(&self) -> Result<String, PlannerError> {
        Ok(self
            .store
            .get(KEY_DEFAULT_TYPE)?
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.defaults.default_task_type.clone()))
    }

    fn load_monthly(&self) -> Result<BTreeMap<String, MonthlyData>, PlannerError> {
        Ok(self.read_json(KEY_MONTHLY)?.unwrap_or_default())
    }

    fn save_monthly(&mut self, monthly: BTreeMap<String, MonthlyData>) -> Result<(), PlannerError> {
        self.write_json(KEY_MONTHLY, &monthly)?;
        self.monthly = monthly;
        Ok(())
    }
}

// Length checks keep keys zero padded so prefix matching works
pub(crate) fn validate_date(date: &str) -> Result<(), PlannerError> {
    if date.len() != 10 {
        return Err(PlannerError::InvalidFormat(format!("Invalid date '{}': expected YYYY-MM-DD", date)));
    }
    utils::parse_date(date)
        .map(|_| ())
        .map_err(|e| PlannerError::InvalidFormat(format!("Invalid date '{}': {}", date, e)))
}

pub(crate) fn validate_year_month(year_month: &str) -> Result<(), PlannerError> {
    if year_month.len() != 7 {
        return Err(PlannerError::InvalidFormat(format!("Invalid month '{}': expected YYYY-MM", year_month)));
    }
    utils::parse_year_month(year_month)
        .map(|_| ())
        .map_err(|e| PlannerError::InvalidFormat(format!("Invalid month '{}': {}", year_month, e)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::database::Database;

    pub fn planner() -> Planner<Database> {
        Planner::open(Database::open_in_memory().unwrap(), PlannerDefaults::default()).unwrap()
    }
}
