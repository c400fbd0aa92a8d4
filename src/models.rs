use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Time-based task identifier (epoch millis * 1000 + random tiebreak)
pub type TaskId = i64;

/// Sub-millisecond slots per millisecond in a `TaskId`
const ID_TIEBREAK_SLOTS: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(deserialize_with = "deserialize_task_id")]
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: String,       // YYYY-MM-DD
    pub start_time: String, // HH:MM, 24-hour
    pub duration: u32,      // minutes
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub color: String,
    #[serde(rename = "type", default)]
    pub task_type: String,
}

/// A task as submitted for creation, before it has an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: String,
    pub start_time: String,
    pub duration: u32,
    #[serde(default)]
    pub color: String,
    #[serde(rename = "type", default)]
    pub task_type: String,
}

impl NewTask {
    pub fn new(title: impl Into<String>, date: impl Into<String>, start_time: impl Into<String>, duration: u32) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            date: date.into(),
            start_time: start_time.into(),
            duration,
            color: String::new(),
            task_type: String::new(),
        }
    }

    pub fn with_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub(crate) fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            date: self.date,
            start_time: self.start_time,
            duration: self.duration,
            is_completed: false,
            color: self.color,
            task_type: self.task_type,
        }
    }
}

impl Task {
    /// Title without a leading `[type]` tag
    pub fn display_title(&self) -> &str {
        strip_category_tag(&self.title)
    }
}

/// Prefix a title with its `[type]` tag, unless it already starts with one
pub fn tag_title(title: &str, task_type: &str) -> String {
    if title.starts_with('[') || task_type.is_empty() {
        title.to_string()
    } else {
        format!("[{}] {}", task_type, title)
    }
}

fn strip_category_tag(title: &str) -> &str {
    if let Some(rest) = title.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            return rest[end + 1..].trim_start();
        }
    }
    title
}

/// Accept integer ids as-is. Fractional ids (`millis + random` from the web
/// version) become `millis * 1000` plus the first three fractional digits,
/// the same layout freshly generated ids use.
fn deserialize_task_id<'de, D>(deserializer: D) -> Result<TaskId, D::Error>
where
    D: Deserializer<'de>,
{
    struct TaskIdVisitor;

    impl Visitor<'_> for TaskIdVisitor {
        type Value = TaskId;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a numeric task id")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<TaskId, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<TaskId, E> {
            TaskId::try_from(v).map_err(|_| E::custom(format!("task id {} out of range", v)))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<TaskId, E> {
            if !v.is_finite() {
                return Err(E::custom("task id is not a finite number"));
            }
            let millis = v.floor();
            if v == millis {
                return in_id_range(millis).ok_or_else(|| E::custom(format!("task id {} out of range", v)));
            }
            let tiebreak = ((v - millis) * ID_TIEBREAK_SLOTS).floor().min(ID_TIEBREAK_SLOTS - 1.0);
            in_id_range(millis * ID_TIEBREAK_SLOTS + tiebreak)
                .ok_or_else(|| E::custom(format!("task id {} out of range", v)))
        }
    }

    deserializer.deserialize_any(TaskIdVisitor)
}

fn in_id_range(v: f64) -> Option<TaskId> {
    // i64::MAX as f64 rounds up to 2^63
    (v >= i64::MIN as f64 && v < i64::MAX as f64).then_some(v as TaskId)
}

/// Resolve id clashes left by lossy id conversion by bumping later
/// duplicates to the next free id. Deterministic for a given input order.
pub(crate) fn dedupe_task_ids(tasks: &mut [Task]) -> usize {
    let mut seen = std::collections::HashSet::with_capacity(tasks.len());
    let mut bumped = 0;
    for task in tasks.iter_mut() {
        while !seen.insert(task.id) {
            task.id = task.id.wrapping_add(1);
            bumped += 1;
        }
    }
    bumped
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mood {
    Happy,
    Neutral,
    Sad,
}

impl Mood {
    /// Map a 1-10 score onto a mood label
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s > 7 => Mood::Happy,
            s if s > 4 => Mood::Neutral,
            _ => Mood::Sad,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Neutral => "Neutral",
            Mood::Sad => "Sad",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub date: String, // YYYY-MM-DD
    pub mood: Mood,
    pub mood_score: u8,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyData {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub personal_feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_report: Option<String>,
}

/// Partial update for [`MonthlyData`]; `None` fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthlyDataPatch {
    pub keyword: Option<String>,
    pub memo: Option<String>,
    pub personal_feedback: Option<String>,
    pub ai_report: Option<String>,
}

impl MonthlyData {
    pub fn apply(&mut self, patch: MonthlyDataPatch) {
        if let Some(keyword) = patch.keyword {
            self.keyword = keyword;
        }
        if let Some(memo) = patch.memo {
            self.memo = memo;
        }
        if let Some(personal_feedback) = patch.personal_feedback {
            self.personal_feedback = personal_feedback;
        }
        if let Some(ai_report) = patch.ai_report {
            self.ai_report = Some(ai_report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_json(id: &str) -> String {
        format!(
            r#"{{"id":{},"title":"Math","date":"2024-05-10","startTime":"09:00","duration":60}}"#,
            id
        )
    }

    #[test]
    fn test_task_id_accepts_web_fractional_ids() {
        let task: Task = serde_json::from_str(&task_json("1715302800000.4213")).unwrap();
        assert_eq!(task.id, 1_715_302_800_000_421);

        let task: Task = serde_json::from_str(&task_json("1715302800000")).unwrap();
        assert_eq!(task.id, 1_715_302_800_000);

        let task: Task = serde_json::from_str(&task_json("1715302800000.9999")).unwrap();
        assert_eq!(task.id, 1_715_302_800_000_999);

        assert!(serde_json::from_str::<Task>(&task_json("\"abc\"")).is_err());
        assert!(serde_json::from_str::<Task>(&task_json("1e300")).is_err());
    }

    #[test]
    fn test_dedupe_task_ids() {
        let raw = format!(
            "[{},{},{}]",
            task_json("1715302800000.4211"),
            task_json("1715302800000.4219"),
            task_json("1715302800000421")
        );
        let mut tasks: Vec<Task> = serde_json::from_str(&raw).unwrap();
        assert!(tasks.iter().all(|t| t.id == 1_715_302_800_000_421));

        assert_eq!(dedupe_task_ids(&mut tasks), 3);
        let ids: Vec<TaskId> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, [1_715_302_800_000_421, 1_715_302_800_000_422, 1_715_302_800_000_423]);
    }

    #[test]
    fn test_mood_boundaries() {
        assert_eq!(Mood::from_score(8), Mood::Happy);
        assert_eq!(Mood::from_score(10), Mood::Happy);
        assert_eq!(Mood::from_score(7), Mood::Neutral);
        assert_eq!(Mood::from_score(5), Mood::Neutral);
        assert_eq!(Mood::from_score(4), Mood::Sad);
        assert_eq!(Mood::from_score(3), Mood::Sad);
        assert_eq!(Mood::from_score(1), Mood::Sad);
    }

    #[test]
    fn test_task_serializes_with_original_keys() {
        let task = NewTask::new("Math", "2024-05-10", "09:00", 60)
            .with_type("공부")
            .into_task(42);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["startTime"], "09:00");
        assert_eq!(json["isCompleted"], false);
        assert_eq!(json["type"], "공부");
        assert_eq!(json["id"], 42);
    }

    #[test]
    fn test_title_tagging() {
        assert_eq!(tag_title("Math", "공부"), "[공부] Math");
        assert_eq!(tag_title("[운동] Run", "공부"), "[운동] Run");
        assert_eq!(tag_title("Math", ""), "Math");

        let task = NewTask::new("[공부] Math", "2024-05-10", "09:00", 60).into_task(1);
        assert_eq!(task.display_title(), "Math");
        let plain = NewTask::new("[unclosed", "2024-05-10", "09:00", 60).into_task(2);
        assert_eq!(plain.display_title(), "[unclosed");
    }

    #[test]
    fn test_monthly_patch_preserves_other_fields() {
        let mut data = MonthlyData {
            keyword: "focus".to_string(),
            memo: "memo".to_string(),
            ..Default::default()
        };
        data.apply(MonthlyDataPatch {
            personal_feedback: Some("good month".to_string()),
            ..Default::default()
        });
        assert_eq!(data.keyword, "focus");
        assert_eq!(data.memo, "memo");
        assert_eq!(data.personal_feedback, "good month");
        assert_eq!(data.ai_report, None);
    }
}
