//! Monthly report text.
//!
//! Reports are plain templating over a [`MonthlySummary`]; the trait exists
//! so a real generator can be dropped in without touching the planner.

use crate::planner::MonthlySummary;
use crate::utils;

pub trait Advisor {
    fn advise(&self, summary: &MonthlySummary) -> String;
}

/// Fixed three-tier report keyed on completion rate
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedAdvisor;

impl Advisor for CannedAdvisor {
    fn advise(&self, summary: &MonthlySummary) -> String {
        let month = utils::parse_year_month(&summary.year_month)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_else(|_| summary.year_month.clone());
        let rate = summary.completion_rate;

        let mut report = format!("Monthly review for {}\n\n", month);

        if rate >= 80.0 {
            report.push_str(&format!(
                "[Outstanding] You completed {:.1}% of your plans. Keep this rhythm going into next month.\n",
                rate
            ));
        } else if rate >= 50.0 {
            report.push_str(&format!(
                "[Halfway there] {:.1}% done. Solid, but the other half slipped away. Aim for 80% next month.\n",
                rate
            ));
        } else {
            report.push_str(&format!(
                "[Wake-up call] Only {:.1}% of your plans got done. Planning is easy; keeping the plan is the skill. Start again today.\n",
                rate
            ));
        }

        if let Some((label, count)) = summary.top_category() {
            report.push_str(&format!(
                "\nMost of your time went to \"{}\" ({} plans). Keep the other areas in balance too.",
                label, count
            ));
        }

        report
    }
}
