//! Course CRUD and the course-scoped lecture operations.

use std::collections::HashMap;

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::store;
use crate::error::AppError;
use crate::models::{
    Course, CourseDetails, LectureDetails, NewCourseRequest, NewLectureRequest,
    UpdateCourseRequest, User, UserSummary,
};
use crate::models::Lecture;

/// Resolves the distinct instructors referenced by a course's lectures,
/// keyed by user id. Ids pointing at deleted users are skipped.
async fn instructors_of(
    db: &SqlitePool,
    course: &Course,
) -> Result<HashMap<String, User>, AppError> {
    let mut found = HashMap::new();
    for lecture in &course.lectures {
        if let Some(id) = &lecture.instructor_id {
            if !found.contains_key(id) {
                if let Some(user) = store::find_user_by_id(db, id).await? {
                    found.insert(id.clone(), user);
                }
            }
        }
    }
    Ok(found)
}

/// Denormalizes instructor name/email into each lecture of a course
/// response.
pub async fn resolve_course_details(
    db: &SqlitePool,
    course: Course,
) -> Result<CourseDetails, AppError> {
    let instructors = instructors_of(db, &course).await?;

    let lectures = course
        .lectures
        .into_iter()
        .map(|lecture| {
            let instructor = lecture
                .instructor_id
                .as_ref()
                .and_then(|id| instructors.get(id))
                .map(UserSummary::from);
            LectureDetails { lecture, instructor }
        })
        .collect();

    Ok(CourseDetails {
        id: course.id,
        name: course.name,
        level: course.level,
        description: course.description,
        image_url: course.image_url,
        lectures,
        created_at: course.created_at,
        updated_at: course.updated_at,
    })
}

pub async fn list_courses(db: &SqlitePool) -> Result<Vec<CourseDetails>, AppError> {
    let courses = store::fetch_courses(db).await?;
    let mut details = Vec::with_capacity(courses.len());
    for course in courses {
        details.push(resolve_course_details(db, course).await?);
    }
    Ok(details)
}

pub async fn get_course(db: &SqlitePool, id: &str) -> Result<CourseDetails, AppError> {
    let course = store::find_course_by_id(db, id)
        .await?
        .ok_or(AppError::NotFound("Course"))?;
    resolve_course_details(db, course).await
}

pub async fn create_course(
    db: &SqlitePool,
    req: NewCourseRequest,
) -> Result<Course, AppError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("Course name is required".to_string()));
    }

    store::insert_course(db, name, req.level, req.description, req.image_url).await
}

pub async fn update_course(
    db: &SqlitePool,
    id: &str,
    req: UpdateCourseRequest,
) -> Result<Course, AppError> {
    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Course name is required".to_string()));
        }
    }

    store::update_course_doc(db, id, |course| {
        if let Some(name) = &req.name {
            course.name = name.trim().to_string();
        }
        if let Some(level) = req.level {
            course.level = level;
        }
        if let Some(description) = &req.description {
            course.description = Some(description.clone());
        }
        if let Some(image_url) = &req.image_url {
            course.image_url = Some(image_url.clone());
        }
        Ok(())
    })
    .await
}

pub async fn delete_course(db: &SqlitePool, id: &str) -> Result<(), AppError> {
    if !store::delete_course(db, id).await? {
        return Err(AppError::NotFound("Course"));
    }
    Ok(())
}

/// Appends a new, unassigned lecture to a course.
pub async fn add_lecture(
    db: &SqlitePool,
    course_id: &str,
    req: NewLectureRequest,
) -> Result<Course, AppError> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::Validation(
            "Lecture title is required".to_string(),
        ));
    }
    if req.duration < 15 {
        return Err(AppError::Validation(
            "Duration must be at least 15 minutes".to_string(),
        ));
    }

    let id = Uuid::new_v4().to_string();
    store::update_course_doc(db, course_id, |course| {
        course.lectures.push(Lecture {
            id: id.clone(),
            title: title.clone(),
            date: req.date,
            duration: req.duration,
            instructor_id: None,
            course_id: course.id.clone(),
        });
        Ok(())
    })
    .await
}

/// The distinct instructors currently assigned to any lecture of the
/// course, in first-seen lecture order.
pub async fn course_instructors(
    db: &SqlitePool,
    course_id: &str,
) -> Result<Vec<UserSummary>, AppError> {
    let course = store::find_course_by_id(db, course_id)
        .await?
        .ok_or(AppError::NotFound("Course"))?;

    let users = instructors_of(db, &course).await?;

    let mut seen = Vec::new();
    let mut out = Vec::new();
    for lecture in &course.lectures {
        if let Some(id) = &lecture.instructor_id {
            if !seen.contains(id) {
                seen.push(id.clone());
                if let Some(user) = users.get(id) {
                    out.push(UserSummary::from(user));
                }
            }
        }
    }
    Ok(out)
}
