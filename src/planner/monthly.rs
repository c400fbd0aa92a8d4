use tracing::info;

use super::{Planner, validate_year_month};
use crate::advisor::Advisor;
use crate::database::KeyValueStore;
use crate::error::PlannerError;
use crate::models::{MonthlyData, MonthlyDataPatch};

impl<S: KeyValueStore> Planner<S> {
    pub fn monthly_data(&self, year_month: &str) -> Option<&MonthlyData> {
        self.monthly.get(year_month)
    }

    /// Merge `patch` into the month's record, creating it if needed
    pub fn update_monthly_data(
        &mut self,
        year_month: &str,
        patch: MonthlyDataPatch,
    ) -> Result<MonthlyData, PlannerError> {
        validate_year_month(year_month)?;

        let mut monthly = self.load_monthly()?;
        let entry = monthly.entry(year_month.to_string()).or_default();
        entry.apply(patch);
        let updated = entry.clone();
        self.save_monthly(monthly)?;

        info!(year_month, "Updated monthly notes");
        Ok(updated)
    }

    /// Render the month's report with `advisor` and cache it on the month
    pub fn generate_report(&mut self, year_month: &str, advisor: &dyn Advisor) -> Result<String, PlannerError> {
        validate_year_month(year_month)?;

        let summary = self.monthly_summary(year_month);
        let report = advisor.advise(&summary);
        self.update_monthly_data(
            year_month,
            MonthlyDataPatch {
                ai_report: Some(report.clone()),
                ..Default::default()
            },
        )?;
        Ok(report)
    }
}
