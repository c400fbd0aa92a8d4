use thiserror::Error;

use crate::database::DatabaseError;
use crate::models::{Task, TaskId};

/// Failure kinds callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidFormat,
    DuplicateTask,
    SchedulingConflict,
    UnknownCategory,
    TaskNotFound,
    Storage,
}

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("A task '{title}' already exists on {date} at {start_time}")]
    DuplicateTask {
        date: String,
        start_time: String,
        title: String,
    },

    #[error("Time overlaps with {} other task(s) on {date}", .conflicts.len())]
    SchedulingConflict { date: String, conflicts: Vec<Task> },

    #[error("Unknown task type: {0}")]
    UnknownCategory(String),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored data under '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl PlannerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlannerError::InvalidFormat(_) => ErrorKind::InvalidFormat,
            PlannerError::DuplicateTask { .. } => ErrorKind::DuplicateTask,
            PlannerError::SchedulingConflict { .. } => ErrorKind::SchedulingConflict,
            PlannerError::UnknownCategory(_) => ErrorKind::UnknownCategory,
            PlannerError::TaskNotFound(_) => ErrorKind::TaskNotFound,
            PlannerError::Database(_) | PlannerError::Io(_) | PlannerError::Corrupt { .. } => {
                ErrorKind::Storage
            }
        }
    }

    /// Whether the caller can fix the input and resubmit.
    /// Storage failures are the only hard failures.
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::Storage
    }

    /// Tasks that blocked the insert, if this is a scheduling conflict
    pub fn conflicts(&self) -> Option<&[Task]> {
        match self {
            PlannerError::SchedulingConflict { conflicts, .. } => Some(conflicts),
            _ => None,
        }
    }
}
