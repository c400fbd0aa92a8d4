use serde::Serialize;
use std::collections::BTreeMap;

use super::Planner;
use crate::database::KeyValueStore;
use crate::models::Task;

/// Histogram bucket for tasks with no type
pub const UNCATEGORIZED: &str = "uncategorized";

/// Aggregate numbers for one month, derived fresh on every call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub year_month: String,
    pub total_plans: usize,
    pub completed: usize,
    pub completion_rate: f64,
    pub average_mood_score: f64,
    pub category_histogram: BTreeMap<String, usize>,
}

impl MonthlySummary {
    /// Most frequent category; ties go to the label that sorts first
    pub fn top_category(&self) -> Option<(&str, usize)> {
        let mut top: Option<(&str, usize)> = None;
        for (label, &count) in &self.category_histogram {
            if top.is_none_or(|(_, best)| count > best) {
                top = Some((label.as_str(), count));
            }
        }
        top
    }
}

impl<S: KeyValueStore> Planner<S> {
    pub fn total_plans(&self, year_month: &str) -> usize {
        self.month_tasks(year_month).count()
    }

    pub fn completed_plans(&self, year_month: &str) -> usize {
        self.month_tasks(year_month).filter(|t| t.is_completed).count()
    }

    /// Percentage of the month's tasks that are done, `0.0` for an empty month
    pub fn completion_rate(&self, year_month: &str) -> f64 {
        let total = self.total_plans(year_month);
        if total == 0 {
            return 0.0;
        }
        self.completed_plans(year_month) as f64 / total as f64 * 100.0
    }

    pub fn category_histogram(&self, year_month: &str) -> BTreeMap<String, usize> {
        let mut histogram = BTreeMap::new();
        for task in self.month_tasks(year_month) {
            let label = if task.task_type.is_empty() {
                UNCATEGORIZED
            } else {
                task.task_type.as_str()
            };
            *histogram.entry(label.to_string()).or_insert(0) += 1;
        }
        histogram
    }

    pub fn monthly_summary(&self, year_month: &str) -> MonthlySummary {
        MonthlySummary {
            year_month: year_month.to_string(),
            total_plans: self.total_plans(year_month),
            completed: self.completed_plans(year_month),
            completion_rate: self.completion_rate(year_month),
            average_mood_score: self.average_mood_score(year_month),
            category_histogram: self.category_histogram(year_month),
        }
    }

    fn month_tasks<'a>(&'a self, year_month: &'a str) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks.iter().filter(move |t| t.date.starts_with(year_month))
    }
}
