use tracing::info;

use super::{KEY_DEFAULT_TYPE, Planner};
use crate::database::KeyValueStore;
use crate::error::PlannerError;

impl<S: KeyValueStore> Planner<S> {
    /// Append a task type. Returns `false` if it was already registered.
    pub fn add_type(&mut self, label: &str) -> Result<bool, PlannerError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(PlannerError::InvalidFormat("Task type cannot be empty".to_string()));
        }

        let mut types = self.load_types()?;
        if types.iter().any(|t| t == label) {
            self.task_types = types;
            return Ok(false);
        }
        types.push(label.to_string());
        self.save_types(types)?;

        info!(label, "Added task type");
        Ok(true)
    }

    /// Remove a task type. Tasks already carrying it keep the label.
    pub fn delete_type(&mut self, label: &str) -> Result<bool, PlannerError> {
        let mut types = self.load_types()?;
        let before = types.len();
        types.retain(|t| t != label);
        if types.len() == before {
            self.task_types = types;
            return Ok(false);
        }
        self.save_types(types)?;

        info!(label, "Deleted task type");
        Ok(true)
    }

    /// Set the type preselected for new tasks; not checked against the registry
    pub fn set_default_type(&mut self, label: &str) -> Result<(), PlannerError> {
        self.store.set(KEY_DEFAULT_TYPE, label)?;
        self.default_task_type = label.to_string();
        info!(label, "Set default task type");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::models::NewTask;
    use crate::planner::test_support::planner;

    #[test]
    fn test_add_type_is_idempotent_and_ordered() {
        let mut planner = planner();
        assert!(planner.add_type("음악").unwrap());
        assert!(!planner.add_type("음악").unwrap());
        assert!(!planner.add_type("  공부 ").unwrap());
        assert_eq!(planner.task_types(), ["공부", "운동", "독서", "휴식", "음악"]);

        let err = planner.add_type("   ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn test_delete_type_does_not_cascade() {
        let mut planner = planner();
        let task = planner
            .add_task(NewTask::new("Run", "2024-05-10", "07:00", 30).with_type("운동"))
            .unwrap();

        assert!(planner.delete_type("운동").unwrap());
        assert!(!planner.delete_type("운동").unwrap());
        assert_eq!(planner.get_task(task.id).unwrap().task_type, "운동");
    }

    #[test]
    fn test_registry_may_become_empty() {
        let mut planner = planner();
        for label in ["공부", "운동", "독서", "휴식"] {
            planner.delete_type(label).unwrap();
        }
        assert!(planner.task_types().is_empty());
        // seeds do not come back once the registry has been written
        planner.reload().unwrap();
        assert!(planner.task_types().is_empty());
    }

    #[test]
    fn test_default_type_is_unvalidated() {
        let mut planner = planner();
        planner.set_default_type("없는유형").unwrap();
        assert_eq!(planner.default_task_type(), "없는유형");
        planner.reload().unwrap();
        assert_eq!(planner.default_task_type(), "없는유형");
    }
}
