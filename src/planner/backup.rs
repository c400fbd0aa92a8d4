use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::{KEY_DEFAULT_TYPE, KEY_FEEDBACKS, KEY_MONTHLY, KEY_TASKS, KEY_TYPES, Planner};
use crate::database::KeyValueStore;
use crate::error::PlannerError;
use crate::models::{Feedback, MonthlyData, Task};

/// The five persisted blobs, captured verbatim
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub tasks: Option<String>,
    #[serde(default)]
    pub feedbacks: Option<String>,
    #[serde(default)]
    pub types: Option<String>,
    #[serde(rename = "defaultType", default)]
    pub default_type: Option<String>,
    #[serde(default)]
    pub monthly: Option<String>,
}

impl Snapshot {
    /// `study-planner-backup-YYYYMMDD.json` for the given day
    pub fn default_file_name(date: chrono::NaiveDate) -> String {
        format!("study-planner-backup-{}.json", date.format("%Y%m%d"))
    }

    pub fn to_json(&self) -> Result<String, PlannerError> {
        serde_json::to_string_pretty(self).map_err(|source| PlannerError::Corrupt {
            key: "backup".to_string(),
            source,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, PlannerError> {
        serde_json::from_str(raw).map_err(|source| PlannerError::Corrupt {
            key: "backup".to_string(),
            source,
        })
    }

    pub fn write_to(&self, path: &Path) -> Result<(), PlannerError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self, PlannerError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Parse every present blob as its expected shape
    fn validate(&self) -> Result<(), PlannerError> {
        fn check<T: serde::de::DeserializeOwned>(key: &str, raw: &Option<String>) -> Result<(), PlannerError> {
            if let Some(raw) = raw {
                serde_json::from_str::<T>(raw).map_err(|source| PlannerError::Corrupt {
                    key: key.to_string(),
                    source,
                })?;
            }
            Ok(())
        }

        check::<Vec<Task>>(KEY_TASKS, &self.tasks)?;
        check::<BTreeMap<String, Feedback>>(KEY_FEEDBACKS, &self.feedbacks)?;
        check::<Vec<String>>(KEY_TYPES, &self.types)?;
        check::<BTreeMap<String, MonthlyData>>(KEY_MONTHLY, &self.monthly)?;
        Ok(())
    }
}

impl<S: KeyValueStore> Planner<S> {
    /// Capture all five blobs as they are currently persisted
    pub fn export_snapshot(&self) -> Result<Snapshot, PlannerError> {
        Ok(Snapshot {
            tasks: self.store.get(KEY_TASKS)?,
            feedbacks: self.store.get(KEY_FEEDBACKS)?,
            types: self.store.get(KEY_TYPES)?,
            default_type: self.store.get(KEY_DEFAULT_TYPE)?,
            monthly: self.store.get(KEY_MONTHLY)?,
        })
    }

    /// Replace all persisted state with `snapshot` in a single batch.
    /// Absent blobs are cleared. Nothing is written if any blob is malformed.
    pub fn import_snapshot(&mut self, snapshot: Snapshot) -> Result<(), PlannerError> {
        if let Err(e) = snapshot.validate() {
            warn!("Rejected backup: {}", e);
            return Err(e);
        }

        self.store.write_batch(&[
            (KEY_TASKS, snapshot.tasks),
            (KEY_FEEDBACKS, snapshot.feedbacks),
            (KEY_TYPES, snapshot.types),
            (KEY_DEFAULT_TYPE, snapshot.default_type),
            (KEY_MONTHLY, snapshot.monthly),
        ])?;
        self.reload()?;

        info!(tasks = self.tasks.len(), "Restored planner from backup");
        Ok(())
    }

    pub fn write_backup(&self, path: &Path) -> Result<(), PlannerError> {
        self.export_snapshot()?.write_to(path)?;
        info!("Wrote backup to {}", path.display());
        Ok(())
    }

    pub fn read_backup(&mut self, path: &Path) -> Result<(), PlannerError> {
        let snapshot = Snapshot::read_from(path)?;
        self.import_snapshot(snapshot)
    }
}
