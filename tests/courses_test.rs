use chrono::{DateTime, TimeZone, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use lectern::db::store;
use lectern::error::AppError;
use lectern::models::{
    AssignLectureRequest, Level, NewCourseRequest, NewLectureRequest, Role,
    UpdateCourseRequest,
};
use lectern::services::{courses, lectures};

async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test db");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

async fn create_instructor(pool: &SqlitePool, name: &str, email: &str) -> String {
    store::insert_user(
        pool,
        store::NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: Role::Instructor,
            mobile: None,
            bio: None,
            avatar_url: None,
        },
    )
    .await
    .expect("Failed to insert user")
    .id
}

fn on(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
}

async fn add_lecture(pool: &SqlitePool, course_id: &str, title: &str, date: DateTime<Utc>) -> String {
    let course = courses::add_lecture(
        pool,
        course_id,
        NewLectureRequest {
            title: title.to_string(),
            date,
            duration: 60,
        },
    )
    .await
    .expect("Failed to add lecture");

    course.lectures.last().expect("Lecture list is empty").id.clone()
}

async fn assign(pool: &SqlitePool, lecture_id: &str, course_id: &str, instructor_id: &str) {
    lectures::assign(
        pool,
        AssignLectureRequest {
            lecture_id: lecture_id.to_string(),
            course_id: course_id.to_string(),
            instructor_id: instructor_id.to_string(),
        },
    )
    .await
    .expect("Assignment should succeed");
}

#[tokio::test]
async fn test_create_course_defaults_and_validation() {
    let pool = setup_test_db().await;

    let course = courses::create_course(
        &pool,
        NewCourseRequest {
            name: "  Web Dev  ".to_string(),
            level: Level::Beginner,
            description: None,
            image_url: None,
        },
    )
    .await
    .expect("Failed to create course");
    assert_eq!(course.name, "Web Dev");
    assert!(course.lectures.is_empty());

    let err = courses::create_course(
        &pool,
        NewCourseRequest {
            name: "   ".to_string(),
            level: Level::Beginner,
            description: None,
            image_url: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_update_course_partial_fields() {
    let pool = setup_test_db().await;
    let course = courses::create_course(
        &pool,
        NewCourseRequest {
            name: "Web Dev".to_string(),
            level: Level::Beginner,
            description: Some("old".to_string()),
            image_url: None,
        },
    )
    .await
    .expect("Failed to create course");

    let updated = courses::update_course(
        &pool,
        &course.id,
        UpdateCourseRequest {
            name: None,
            level: Some(Level::Advanced),
            description: None,
            image_url: None,
        },
    )
    .await
    .expect("Failed to update course");

    assert_eq!(updated.name, "Web Dev");
    assert_eq!(updated.level, Level::Advanced);
    assert_eq!(updated.description.as_deref(), Some("old"));
}

#[tokio::test]
async fn test_delete_course() {
    let pool = setup_test_db().await;
    let course = courses::create_course(
        &pool,
        NewCourseRequest {
            name: "Web Dev".to_string(),
            level: Level::Beginner,
            description: None,
            image_url: None,
        },
    )
    .await
    .expect("Failed to create course");

    courses::delete_course(&pool, &course.id)
        .await
        .expect("Failed to delete course");

    let err = courses::get_course(&pool, &course.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound("Course")));

    let err = courses::delete_course(&pool, &course.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound("Course")));
}

#[tokio::test]
async fn test_add_lecture_appends_unassigned() {
    let pool = setup_test_db().await;
    let course = courses::create_course(
        &pool,
        NewCourseRequest {
            name: "Web Dev".to_string(),
            level: Level::Beginner,
            description: None,
            image_url: None,
        },
    )
    .await
    .expect("Failed to create course");

    let updated = courses::add_lecture(
        &pool,
        &course.id,
        NewLectureRequest {
            title: "Intro".to_string(),
            date: on(2025, 11, 20),
            duration: 60,
        },
    )
    .await
    .expect("Failed to add lecture");

    assert_eq!(updated.lectures.len(), 1);
    let lecture = &updated.lectures[0];
    assert_eq!(lecture.course_id, course.id);
    assert!(lecture.instructor_id.is_none());

    let err = courses::add_lecture(
        &pool,
        &course.id,
        NewLectureRequest {
            title: "Too short".to_string(),
            date: on(2025, 11, 21),
            duration: 10,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_course_instructors_dedups_in_first_seen_order() {
    let pool = setup_test_db().await;
    let john = create_instructor(&pool, "John", "john@test.com").await;
    let jane = create_instructor(&pool, "Jane", "jane@test.com").await;

    let course = courses::create_course(
        &pool,
        NewCourseRequest {
            name: "Web Dev".to_string(),
            level: Level::Beginner,
            description: None,
            image_url: None,
        },
    )
    .await
    .expect("Failed to create course")
    .id;

    let l1 = add_lecture(&pool, &course, "One", on(2025, 11, 18)).await;
    let l2 = add_lecture(&pool, &course, "Two", on(2025, 11, 19)).await;
    let l3 = add_lecture(&pool, &course, "Three", on(2025, 11, 20)).await;
    assign(&pool, &l1, &course, &john).await;
    assign(&pool, &l2, &course, &jane).await;
    assign(&pool, &l3, &course, &john).await;

    let instructors = courses::course_instructors(&pool, &course)
        .await
        .expect("Failed to get instructors");
    let names: Vec<&str> = instructors.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["John", "Jane"]);
}

#[tokio::test]
async fn test_deleting_last_lecture_drops_instructor_from_course() {
    let pool = setup_test_db().await;
    let john = create_instructor(&pool, "John", "john@test.com").await;

    let course = courses::create_course(
        &pool,
        NewCourseRequest {
            name: "Web Dev".to_string(),
            level: Level::Beginner,
            description: None,
            image_url: None,
        },
    )
    .await
    .expect("Failed to create course")
    .id;

    let l1 = add_lecture(&pool, &course, "Only one", on(2025, 11, 18)).await;
    assign(&pool, &l1, &course, &john).await;

    lectures::remove_lecture(&pool, &course, &l1)
        .await
        .expect("Failed to remove lecture");

    let instructors = courses::course_instructors(&pool, &course)
        .await
        .expect("Failed to get instructors");
    assert!(instructors.is_empty());
}

#[tokio::test]
async fn test_course_details_resolve_instructor() {
    let pool = setup_test_db().await;
    let john = create_instructor(&pool, "John", "john@test.com").await;

    let course = courses::create_course(
        &pool,
        NewCourseRequest {
            name: "Web Dev".to_string(),
            level: Level::Beginner,
            description: None,
            image_url: None,
        },
    )
    .await
    .expect("Failed to create course")
    .id;

    let l1 = add_lecture(&pool, &course, "Intro", on(2025, 11, 18)).await;
    add_lecture(&pool, &course, "Second", on(2025, 11, 19)).await;
    assign(&pool, &l1, &course, &john).await;

    let details = courses::get_course(&pool, &course)
        .await
        .expect("Failed to get course");
    let assigned = details
        .lectures
        .iter()
        .find(|l| l.lecture.id == l1)
        .expect("Lecture not found");
    let instructor = assigned.instructor.as_ref().expect("Instructor not resolved");
    assert_eq!(instructor.name, "John");
    assert_eq!(instructor.email, "john@test.com");

    let unassigned = details
        .lectures
        .iter()
        .find(|l| l.lecture.id != l1)
        .expect("Lecture not found");
    assert!(unassigned.instructor.is_none());
}
