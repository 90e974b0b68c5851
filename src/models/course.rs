use serde::{Deserialize, Serialize};

use crate::models::lecture::{Lecture, LectureDetails};

/// Difficulty level of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
        }
    }

    pub fn parse(s: &str) -> Option<Level> {
        match s {
            "Beginner" => Some(Level::Beginner),
            "Intermediate" => Some(Level::Intermediate),
            "Advanced" => Some(Level::Advanced),
            _ => None,
        }
    }
}

/// A course document. Lectures are embedded and have no lifecycle of
/// their own; the whole document is persisted in a single write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    pub level: Level,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub lectures: Vec<Lecture>,
    pub created_at: String,
    pub updated_at: String,
}

impl Course {
    pub fn lecture(&self, lecture_id: &str) -> Option<&Lecture> {
        self.lectures.iter().find(|l| l.id == lecture_id)
    }

    pub fn lecture_mut(&mut self, lecture_id: &str) -> Option<&mut Lecture> {
        self.lectures.iter_mut().find(|l| l.id == lecture_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourseRequest {
    pub name: String,
    #[serde(default)]
    pub level: Level,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    pub name: Option<String>,
    pub level: Option<Level>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Course as returned to callers, with assigned instructors resolved
/// into each lecture.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetails {
    pub id: String,
    pub name: String,
    pub level: Level,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub lectures: Vec<LectureDetails>,
    pub created_at: String,
    pub updated_at: String,
}
