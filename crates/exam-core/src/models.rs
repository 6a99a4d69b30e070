//! Data models for the exam trainer.

use crate::category::{Category, CategoryMap};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Official reference attached to an explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSource {
    pub label: String,
    pub url: String,
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique identifier.
    pub id: String,
    /// Topical bucket.
    pub category: Category,
    /// Category display label as written in the bank.
    #[serde(default)]
    pub category_label: String,
    /// Question text.
    pub question: String,
    /// Answer options, in display order.
    pub options: Vec<String>,
    /// Position of the correct option.
    pub correct_index: usize,
    /// Shown after answering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Scenario-based rather than general knowledge.
    #[serde(default)]
    pub is_situational: bool,
    /// References for the explanation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<QuestionSource>,
}

impl Question {
    /// Text of the correct option.
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_index).map(String::as_str)
    }

    pub fn is_correct(&self, answer: Option<usize>) -> bool {
        answer == Some(self.correct_index)
    }
}

/// Correct/total counts for one category within a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryScore {
    pub correct: u32,
    pub total: u32,
}

/// Per-question outcome of a finished quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDetail {
    pub question: Question,
    pub user_answer: Option<usize>,
    pub is_correct: bool,
}

/// Scored snapshot of a finished quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub score: u32,
    pub total: u32,
    pub passed: bool,
    /// Whole seconds between start and finish.
    pub time_spent: u64,
    pub category_scores: CategoryMap<CategoryScore>,
    pub answers: Vec<AnswerDetail>,
}

impl QuizResult {
    /// Score as a rounded percentage of the total.
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (f64::from(self.score) * 100.0 / f64::from(self.total)).round() as u32
    }

    pub fn incorrect(&self) -> impl Iterator<Item = &AnswerDetail> {
        self.answers.iter().filter(|a| !a.is_correct)
    }
}

/// Cumulative attempts for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryStats {
    #[serde(deserialize_with = "lenient")]
    pub attempts: u32,
    #[serde(deserialize_with = "lenient")]
    pub correct: u32,
}

/// Persisted quiz history.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProgress {
    #[serde(deserialize_with = "lenient")]
    pub quizzes_taken: u32,
    #[serde(deserialize_with = "lenient")]
    pub best_score: u32,
    /// Stored as an ISO-8601 string, or `""` when no quiz was taken.
    #[serde(with = "iso_or_empty")]
    pub last_quiz_date: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient")]
    pub category_stats: CategoryMap<CategoryStats>,
}

/// Status a flashcard can be marked with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlashcardStatus {
    Known,
    NeedsReview,
}

impl FlashcardStatus {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Known => "Known",
            Self::NeedsReview => "Needs review",
        }
    }
}

/// Persisted flashcard review state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlashcardProgress {
    /// Question id to status. Absent ids are unseen.
    #[serde(deserialize_with = "lenient_cards")]
    pub cards: BTreeMap<String, FlashcardStatus>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub last_session: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient")]
    pub total_reviewed: u32,
}

/// Read a stored field, keeping its default when the value has the wrong shape.
///
/// One bad field must not discard the rest of a stored record.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "ignoring malformed stored field");
        T::default()
    }))
}

/// Card statuses, dropping entries that are not a known status.
fn lenient_cards<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, FlashcardStatus>, D::Error> {
    let serde_json::Value::Object(entries) = serde_json::Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|(id, status)| serde_json::from_value(status).ok().map(|s| (id, s)))
        .collect())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(raw.as_str().and_then(parse_timestamp))
}

mod iso_or_empty {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        lenient_timestamp(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::fixed_now;

    fn sample_question() -> Question {
        Question {
            id: "pv-001".to_string(),
            category: Category::PrincipesValeurs,
            category_label: "Principes et valeurs".to_string(),
            question: "Quelle est la devise de la République ?".to_string(),
            options: vec![
                "Liberté, Égalité, Fraternité".to_string(),
                "Travail, Famille, Patrie".to_string(),
                "Unité, Progrès, Justice".to_string(),
                "Paix, Travail, Patrie".to_string(),
            ],
            correct_index: 0,
            explanation: None,
            is_situational: false,
            sources: Vec::new(),
        }
    }

    #[test]
    fn test_question_uses_camel_case() {
        let json = serde_json::to_value(sample_question()).unwrap();
        assert_eq!(json["correctIndex"], 0);
        assert_eq!(json["isSituational"], false);
        assert_eq!(json["category"], "principes-valeurs");
        assert!(json.get("explanation").is_none());
    }

    #[test]
    fn test_question_correctness() {
        let q = sample_question();
        assert!(q.is_correct(Some(0)));
        assert!(!q.is_correct(Some(1)));
        assert!(!q.is_correct(None));
        assert_eq!(q.correct_option(), Some("Liberté, Égalité, Fraternité"));
    }

    #[test]
    fn test_progress_empty_date_roundtrip() {
        let progress = UserProgress::default();
        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["lastQuizDate"], "");

        let back: UserProgress = serde_json::from_value(json).unwrap();
        assert_eq!(back.last_quiz_date, None);
    }

    #[test]
    fn test_progress_date_roundtrip() {
        let progress = UserProgress {
            last_quiz_date: Some(fixed_now()),
            ..UserProgress::default()
        };
        let json = serde_json::to_string(&progress).unwrap();
        let back: UserProgress = serde_json::from_str(&json).unwrap();
        assert_eq!(back.last_quiz_date, Some(fixed_now()));
    }

    #[test]
    fn test_progress_partial_record_merges_defaults() {
        let stored = r#"{
            "quizzesTaken": 3,
            "categoryStats": {
                "principes-valeurs": {"attempts": 10, "correct": 8},
                "droits-devoirs": {"attempts": 4}
            }
        }"#;
        let progress: UserProgress = serde_json::from_str(stored).unwrap();

        assert_eq!(progress.quizzes_taken, 3);
        assert_eq!(progress.best_score, 0);
        assert_eq!(progress.last_quiz_date, None);
        assert_eq!(
            progress.category_stats[Category::PrincipesValeurs],
            CategoryStats { attempts: 10, correct: 8 }
        );
        assert_eq!(
            progress.category_stats[Category::DroitsDevoirs],
            CategoryStats { attempts: 4, correct: 0 }
        );
        assert_eq!(
            progress.category_stats[Category::VivreSociete],
            CategoryStats::default()
        );
    }

    #[test]
    fn test_flashcard_progress_format() {
        let stored = r#"{"cards": {"q1": "known", "q2": "needs-review"}, "lastSession": null}"#;
        let progress: FlashcardProgress = serde_json::from_str(stored).unwrap();

        assert_eq!(progress.cards["q1"], FlashcardStatus::Known);
        assert_eq!(progress.cards["q2"], FlashcardStatus::NeedsReview);
        assert_eq!(progress.last_session, None);
        assert_eq!(progress.total_reviewed, 0);

        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["cards"]["q2"], "needs-review");
        assert!(json["lastSession"].is_null());
    }

    #[test]
    fn test_progress_bad_field_keeps_the_rest() {
        let stored = r#"{
            "quizzesTaken": 7,
            "bestScore": null,
            "lastQuizDate": 42,
            "categoryStats": null
        }"#;
        let progress: UserProgress = serde_json::from_str(stored).unwrap();

        assert_eq!(progress.quizzes_taken, 7);
        assert_eq!(progress.best_score, 0);
        assert_eq!(progress.last_quiz_date, None);
        assert_eq!(progress.category_stats, CategoryMap::default());
    }

    #[test]
    fn test_progress_bad_category_entry_keeps_the_others() {
        let stored = r#"{
            "bestScore": 35,
            "categoryStats": {
                "principes-valeurs": {"attempts": 10, "correct": 8},
                "droits-devoirs": "broken",
                "vivre-societe": {"attempts": "x", "correct": 2}
            }
        }"#;
        let progress: UserProgress = serde_json::from_str(stored).unwrap();

        assert_eq!(progress.best_score, 35);
        assert_eq!(
            progress.category_stats[Category::PrincipesValeurs],
            CategoryStats { attempts: 10, correct: 8 }
        );
        assert_eq!(progress.category_stats[Category::DroitsDevoirs], CategoryStats::default());
        assert_eq!(
            progress.category_stats[Category::VivreSociete],
            CategoryStats { attempts: 0, correct: 2 }
        );
    }

    #[test]
    fn test_flashcard_unknown_status_drops_only_that_card() {
        let stored = r#"{
            "cards": {"q1": "known", "q2": "mastered", "q3": "needs-review"},
            "totalReviewed": 5
        }"#;
        let progress: FlashcardProgress = serde_json::from_str(stored).unwrap();

        assert_eq!(progress.cards.len(), 2);
        assert_eq!(progress.cards["q1"], FlashcardStatus::Known);
        assert_eq!(progress.cards["q3"], FlashcardStatus::NeedsReview);
        assert_eq!(progress.total_reviewed, 5);
    }

    #[test]
    fn test_unparseable_date_is_dropped() {
        let progress: UserProgress =
            serde_json::from_str(r#"{"lastQuizDate": "yesterday", "bestScore": 31}"#).unwrap();
        assert_eq!(progress.last_quiz_date, None);
        assert_eq!(progress.best_score, 31);
    }
}
