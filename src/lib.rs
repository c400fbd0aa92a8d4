pub mod advisor;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod planner;
pub mod time;
pub mod utils;

pub use advisor::{Advisor, CannedAdvisor};
pub use config::Config;
pub use database::{Database, KeyValueStore};
pub use error::{ErrorKind, PlannerError};
pub use models::{Feedback, Mood, MonthlyData, MonthlyDataPatch, NewTask, Task, TaskId};
pub use planner::{MonthlySummary, Planner, PlannerDefaults, Snapshot};
pub use utils::Profile;
