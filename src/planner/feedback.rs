use tracing::info;

use super::{Planner, validate_date};
use crate::database::KeyValueStore;
use crate::error::PlannerError;
use crate::models::{Feedback, Mood};

pub const MIN_MOOD_SCORE: u8 = 1;
pub const MAX_MOOD_SCORE: u8 = 10;

impl<S: KeyValueStore> Planner<S> {
    /// Record the day's mood, replacing any earlier entry for `date`
    pub fn save_feedback(&mut self, date: &str, mood_score: u8, content: &str) -> Result<Feedback, PlannerError> {
        validate_date(date)?;
        if !(MIN_MOOD_SCORE..=MAX_MOOD_SCORE).contains(&mood_score) {
            return Err(PlannerError::InvalidFormat(format!(
                "Mood score {} out of range {}-{}",
                mood_score, MIN_MOOD_SCORE, MAX_MOOD_SCORE
            )));
        }

        let feedback = Feedback {
            date: date.to_string(),
            mood: Mood::from_score(mood_score),
            mood_score,
            content: content.to_string(),
        };

        let mut feedbacks = self.load_feedbacks()?;
        feedbacks.insert(feedback.date.clone(), feedback.clone());
        self.save_feedbacks(feedbacks)?;

        info!(date, mood = feedback.mood.as_str(), "Saved feedback");
        Ok(feedback)
    }

    pub fn get_feedback(&self, date: &str) -> Option<&Feedback> {
        self.feedbacks.get(date)
    }

    /// Mean mood score of the month, `0.0` when nothing was recorded
    pub fn average_mood_score(&self, year_month: &str) -> f64 {
        let scores: Vec<f64> = self
            .feedbacks
            .iter()
            .filter(|(date, _)| date.starts_with(year_month))
            .map(|(_, f)| f64::from(f.mood_score))
            .collect();

        if scores.is_empty() {
            return 0.0;
        }
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::models::Mood;
    use crate::planner::test_support::planner;

    #[test]
    fn test_save_derives_mood_and_replaces() {
        let mut planner = planner();
        let saved = planner.save_feedback("2024-05-10", 8, "great focus").unwrap();
        assert_eq!(saved.mood, Mood::Happy);

        planner.save_feedback("2024-05-10", 3, "tired").unwrap();
        let current = planner.get_feedback("2024-05-10").unwrap();
        assert_eq!(current.mood, Mood::Sad);
        assert_eq!(current.content, "tired");
        assert_eq!(planner.feedbacks().len(), 1);
    }

    #[test]
    fn test_score_range_checked() {
        let mut planner = planner();
        for score in [0, 11] {
            let err = planner.save_feedback("2024-05-10", score, "").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidFormat);
        }
        assert!(planner.get_feedback("2024-05-10").is_none());
    }

    #[test]
    fn test_average_mood_score() {
        let mut planner = planner();
        assert_eq!(planner.average_mood_score("2024-05"), 0.0);

        planner.save_feedback("2024-05-01", 8, "").unwrap();
        planner.save_feedback("2024-05-02", 5, "").unwrap();
        planner.save_feedback("2024-06-01", 1, "").unwrap();

        assert_eq!(planner.average_mood_score("2024-05"), 6.5);
        assert_eq!(planner.average_mood_score("2024-06"), 1.0);
        assert_eq!(planner.average_mood_score("2024-07"), 0.0);
    }
}
