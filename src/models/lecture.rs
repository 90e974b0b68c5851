use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::user::UserSummary;

/// A scheduled teaching session embedded in a course. `id` is unique
/// only within the owning course's list; `course_id` is set at creation
/// and never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    pub id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub duration: i64,
    pub instructor_id: Option<String>,
    pub course_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLectureRequest {
    pub title: String,
    pub date: DateTime<Utc>,
    pub duration: i64,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLectureRequest {
    pub title: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub duration: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignLectureRequest {
    pub lecture_id: String,
    pub course_id: String,
    pub instructor_id: String,
}

/// A lecture flattened out of its course for the aggregate listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureView {
    #[serde(flatten)]
    pub lecture: Lecture,
    pub course_name: String,
}

/// A lecture with its assigned instructor resolved, for course
/// responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureDetails {
    #[serde(flatten)]
    pub lecture: Lecture,
    pub instructor: Option<UserSummary>,
}
