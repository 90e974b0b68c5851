//! Lecture aggregation, conflict checking and instructor assignment.
//!
//! Lectures are embedded in their course documents, so every
//! cross-course view here is a scan over all courses flattened into a
//! uniform list. That is O(total lectures) per call, which is fine at
//! the expected volume; an instructor/day index would be the next step
//! if it grows.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::store;
use crate::error::AppError;
use crate::models::{
    AssignLectureRequest, Course, CourseDetails, Lecture, LectureView, Role,
    UpdateLectureRequest,
};
use crate::services::courses::resolve_course_details;

/// Calendar day of a lecture. All dates are UTC; day equality compares
/// the UTC calendar date only, time of day is ignored.
pub fn day_of(lecture: &Lecture) -> NaiveDate {
    lecture.date.date_naive()
}

fn flatten_sorted<F>(courses: &[Course], mut keep: F) -> Vec<LectureView>
where
    F: FnMut(&Lecture) -> bool,
{
    let mut views = Vec::new();
    for course in courses {
        for lecture in &course.lectures {
            if keep(lecture) {
                views.push(LectureView {
                    lecture: lecture.clone(),
                    course_name: course.name.clone(),
                });
            }
        }
    }

    // Stable sort: lectures on the same day keep course-then-lecture
    // scan order.
    views.sort_by_key(|v| v.lecture.date);
    views
}

/// All lectures across all courses, ascending by date.
pub async fn list_all(db: &SqlitePool) -> Result<Vec<LectureView>, AppError> {
    let courses = store::fetch_courses(db).await?;
    Ok(flatten_sorted(&courses, |_| true))
}

/// Unassigned lectures, optionally restricted to one course.
pub async fn list_unassigned(
    db: &SqlitePool,
    course_id: Option<&str>,
) -> Result<Vec<LectureView>, AppError> {
    let courses = match course_id {
        Some(id) => store::find_course_by_id(db, id)
            .await?
            .map(|c| vec![c])
            .unwrap_or_default(),
        None => store::fetch_courses(db).await?,
    };

    Ok(flatten_sorted(&courses, |l| l.instructor_id.is_none()))
}

/// Lectures assigned to the given instructor, ascending by date.
pub async fn list_by_instructor(
    db: &SqlitePool,
    instructor_id: &str,
) -> Result<Vec<LectureView>, AppError> {
    let courses = store::fetch_courses(db).await?;
    Ok(flatten_sorted(&courses, |l| {
        l.instructor_id.as_deref() == Some(instructor_id)
    }))
}

/// The lecture an attempted booking collides with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictHit {
    pub course_id: String,
    pub lecture_id: String,
}

/// Checks whether `instructor_id` already holds a lecture on `day`,
/// ignoring the lecture being (re)assigned itself. Pure scan over the
/// given courses.
pub fn find_conflict(
    courses: &[Course],
    instructor_id: &str,
    day: NaiveDate,
    exclude_lecture_id: &str,
) -> Option<ConflictHit> {
    for course in courses {
        for lecture in &course.lectures {
            if lecture.instructor_id.as_deref() == Some(instructor_id)
                && day_of(lecture) == day
                && lecture.id != exclude_lecture_id
            {
                return Some(ConflictHit {
                    course_id: course.id.clone(),
                    lecture_id: lecture.id.clone(),
                });
            }
        }
    }
    None
}

/// Assigns a lecture to an instructor.
///
/// Validation order: instructor exists and holds the instructor role,
/// then course, then lecture, then the cross-course same-day conflict
/// scan. Nothing is written until every check passes; the commit is a
/// single course-document write, re-validated from a fresh snapshot if
/// a concurrent writer touched the course in between.
///
/// The conflict scan reads other courses outside that write, so two
/// racing assignments of one instructor to different courses on the
/// same day can both pass the scan. Accepted at this contention level.
pub async fn assign(
    db: &SqlitePool,
    req: AssignLectureRequest,
) -> Result<CourseDetails, AppError> {
    let instructor = store::find_user_by_id(db, &req.instructor_id)
        .await?
        .ok_or(AppError::NotFound("Instructor"))?;
    if instructor.role != Role::Instructor {
        return Err(AppError::InvalidRole(format!(
            "User {} is not an instructor",
            instructor.id
        )));
    }

    let course = loop {
        let mut course = store::find_course_by_id(db, &req.course_id)
            .await?
            .ok_or(AppError::NotFound("Course"))?;

        let lecture = course
            .lecture(&req.lecture_id)
            .ok_or(AppError::NotFound("Lecture"))?;
        let day = day_of(lecture);

        let all_courses = store::fetch_courses(db).await?;
        if let Some(hit) = find_conflict(&all_courses, &req.instructor_id, day, &req.lecture_id) {
            info!(
                "assignment rejected: instructor {} already booked on {} (lecture {} in course {})",
                req.instructor_id, day, hit.lecture_id, hit.course_id
            );
            return Err(AppError::Conflict(
                "Instructor already has a lecture scheduled on this day".to_string(),
            ));
        }

        // Checks done, single committing write from here.
        course
            .lecture_mut(&req.lecture_id)
            .ok_or(AppError::NotFound("Lecture"))?
            .instructor_id = Some(req.instructor_id.clone());
        if store::save_course(db, &mut course).await? {
            break course;
        }
        // Someone else saved the course since our read; re-check from
        // a fresh snapshot rather than clobber their write.
    };

    info!(
        "assigned lecture {} in course {} to instructor {}",
        req.lecture_id, req.course_id, req.instructor_id
    );

    resolve_course_details(db, course).await
}

/// Updates a lecture's title, date or duration. Only fields present in
/// the request are applied.
///
/// Note: this path does not re-run the conflict scan. Moving an
/// assigned lecture onto a day the instructor is already booked goes
/// through unchecked; only `assign` validates double-booking.
pub async fn update_lecture(
    db: &SqlitePool,
    course_id: &str,
    lecture_id: &str,
    req: UpdateLectureRequest,
) -> Result<Course, AppError> {
    if let Some(duration) = req.duration {
        if duration < 15 {
            return Err(AppError::Validation(
                "Duration must be at least 15 minutes".to_string(),
            ));
        }
    }
    if let Some(title) = &req.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation(
                "Lecture title is required".to_string(),
            ));
        }
    }

    store::update_course_doc(db, course_id, |course| {
        let lecture = course
            .lecture_mut(lecture_id)
            .ok_or(AppError::NotFound("Lecture"))?;

        if let Some(title) = &req.title {
            lecture.title = title.trim().to_string();
        }
        if let Some(date) = req.date {
            lecture.date = date;
        }
        if let Some(duration) = req.duration {
            lecture.duration = duration;
        }
        Ok(())
    })
    .await
}

/// Removes a lecture from its course. Removing an id that is not in
/// the list is not an error; the course is persisted either way.
pub async fn remove_lecture(
    db: &SqlitePool,
    course_id: &str,
    lecture_id: &str,
) -> Result<(), AppError> {
    store::update_course_doc(db, course_id, |course| {
        course.lectures.retain(|l| l.id != lecture_id);
        Ok(())
    })
    .await?;
    Ok(())
}
