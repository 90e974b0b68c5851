//! Store adapter over SQLite.
//!
//! Courses are stored document-style: one row per course, with the
//! embedded lecture list serialized into the `lectures` JSON column.
//! Persisting a course is a single-row UPDATE guarded by the
//! `updated_at` value the document was loaded with, so a stale
//! snapshot never overwrites a newer one; [`update_course_doc`] is the
//! retrying read-modify-write the mutation paths go through. Users
//! live in a plain table.

use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Course, Lecture, Level, Role, User};

#[derive(Debug, FromRow)]
struct CourseRow {
    id: String,
    name: String,
    level: String,
    description: Option<String>,
    image_url: Option<String>,
    lectures: String,
    created_at: String,
    updated_at: String,
}

impl CourseRow {
    fn into_course(self) -> Result<Course, AppError> {
        let lectures: Vec<Lecture> = serde_json::from_str(&self.lectures)?;
        Ok(Course {
            id: self.id,
            name: self.name,
            level: Level::parse(&self.level).unwrap_or_default(),
            description: self.description,
            image_url: self.image_url,
            lectures,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub async fn fetch_courses(db: &SqlitePool) -> Result<Vec<Course>, AppError> {
    let rows = sqlx::query_as::<_, CourseRow>(
        "SELECT id, name, level, description, image_url, lectures, created_at, updated_at \
         FROM courses ORDER BY created_at",
    )
    .fetch_all(db)
    .await?;

    rows.into_iter().map(CourseRow::into_course).collect()
}

pub async fn find_course_by_id(db: &SqlitePool, id: &str) -> Result<Option<Course>, AppError> {
    let row = sqlx::query_as::<_, CourseRow>(
        "SELECT id, name, level, description, image_url, lectures, created_at, updated_at \
         FROM courses WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    row.map(CourseRow::into_course).transpose()
}

pub async fn insert_course(
    db: &SqlitePool,
    name: String,
    level: Level,
    description: Option<String>,
    image_url: Option<String>,
) -> Result<Course, AppError> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO courses (id, name, level, description, image_url, lectures, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, '[]', ?, ?)",
    )
    .bind(&id)
    .bind(&name)
    .bind(level.as_str())
    .bind(&description)
    .bind(&image_url)
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(Course {
        id,
        name,
        level,
        description,
        image_url,
        lectures: Vec::new(),
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Persists the whole course document, lectures included, as one row
/// UPDATE conditioned on the `updated_at` the document was loaded
/// with. Returns `false` when another writer saved the course in the
/// meantime; the caller re-reads and retries. Bumps `updated_at` on
/// success.
pub async fn save_course(db: &SqlitePool, course: &mut Course) -> Result<bool, AppError> {
    let lectures = serde_json::to_string(&course.lectures)?;
    let loaded_at = course.updated_at.clone();
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        "UPDATE courses SET name = ?, level = ?, description = ?, image_url = ?, lectures = ?, updated_at = ? \
         WHERE id = ? AND updated_at = ?",
    )
    .bind(&course.name)
    .bind(course.level.as_str())
    .bind(&course.description)
    .bind(&course.image_url)
    .bind(&lectures)
    .bind(&now)
    .bind(&course.id)
    .bind(&loaded_at)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        if find_course_by_id(db, &course.id).await?.is_none() {
            return Err(AppError::NotFound("Course"));
        }
        return Ok(false);
    }

    course.updated_at = now;
    Ok(true)
}

/// Read-modify-write on one course document: loads the course, applies
/// `mutate` and saves, retrying from a fresh snapshot whenever a
/// concurrent writer saved the course between the load and the write.
pub async fn update_course_doc<F>(
    db: &SqlitePool,
    id: &str,
    mut mutate: F,
) -> Result<Course, AppError>
where
    F: FnMut(&mut Course) -> Result<(), AppError>,
{
    loop {
        let mut course = find_course_by_id(db, id)
            .await?
            .ok_or(AppError::NotFound("Course"))?;
        mutate(&mut course)?;
        if save_course(db, &mut course).await? {
            return Ok(course);
        }
    }
}

pub async fn delete_course(db: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn find_user_by_id(db: &SqlitePool, id: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, role, mobile, bio, avatar_url, created_at, updated_at \
         FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(user)
}

pub async fn find_user_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, role, mobile, bio, avatar_url, created_at, updated_at \
         FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(db)
    .await?;

    Ok(user)
}

pub async fn fetch_users_by_role(db: &SqlitePool, role: Role) -> Result<Vec<User>, AppError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, role, mobile, bio, avatar_url, created_at, updated_at \
         FROM users WHERE role = ? ORDER BY created_at",
    )
    .bind(role)
    .fetch_all(db)
    .await?;

    Ok(users)
}

pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub mobile: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

pub async fn insert_user(db: &SqlitePool, new: NewUser) -> Result<User, AppError> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, mobile, bio, avatar_url, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(new.role)
    .bind(&new.mobile)
    .bind(&new.bio)
    .bind(&new.avatar_url)
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(User {
        id,
        name: new.name,
        email: new.email,
        password_hash: new.password_hash,
        role: new.role,
        mobile: new.mobile,
        bio: new.bio,
        avatar_url: new.avatar_url,
        created_at: now.clone(),
        updated_at: now,
    })
}

pub async fn save_user(db: &SqlitePool, user: &mut User) -> Result<(), AppError> {
    user.updated_at = Utc::now().to_rfc3339();

    let result = sqlx::query(
        "UPDATE users SET name = ?, email = ?, password_hash = ?, role = ?, mobile = ?, bio = ?, avatar_url = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(&user.mobile)
    .bind(&user.bio)
    .bind(&user.avatar_url)
    .bind(&user.updated_at)
    .bind(&user.id)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User"));
    }
    Ok(())
}

pub async fn delete_user(db: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sqlx::sqlite::SqlitePoolOptions;

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

    #[tokio::test]
    async fn test_insert_and_fetch_course() {
        let pool = setup_test_db().await;

        let course = insert_course(
            &pool,
            "Web Development Fundamentals".to_string(),
            Level::Beginner,
            Some("HTML, CSS and JavaScript".to_string()),
            None,
        )
        .await
        .expect("Failed to insert course");

        assert_eq!(course.name, "Web Development Fundamentals");
        assert!(course.lectures.is_empty());

        let courses = fetch_courses(&pool).await.expect("Failed to fetch courses");
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].id, course.id);
    }

    #[tokio::test]
    async fn test_save_course_persists_lectures() {
        let pool = setup_test_db().await;

        let mut course = insert_course(&pool, "Rust 101".to_string(), Level::Beginner, None, None)
            .await
            .expect("Failed to insert course");

        course.lectures.push(Lecture {
            id: Uuid::new_v4().to_string(),
            title: "Ownership".to_string(),
            date: Utc.with_ymd_and_hms(2025, 11, 20, 10, 0, 0).unwrap(),
            duration: 60,
            instructor_id: None,
            course_id: course.id.clone(),
        });
        let saved = save_course(&pool, &mut course)
            .await
            .expect("Failed to save course");
        assert!(saved);

        let reloaded = find_course_by_id(&pool, &course.id)
            .await
            .expect("Failed to fetch course")
            .expect("Course not found");
        assert_eq!(reloaded.lectures.len(), 1);
        assert_eq!(reloaded.lectures[0].title, "Ownership");
        assert_eq!(reloaded.lectures[0].course_id, course.id);
    }

    fn test_lecture(title: &str, course_id: &str) -> Lecture {
        Lecture {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            date: Utc.with_ymd_and_hms(2025, 11, 20, 10, 0, 0).unwrap(),
            duration: 60,
            instructor_id: None,
            course_id: course_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_stale_course_save_is_rejected() {
        let pool = setup_test_db().await;

        let course = insert_course(&pool, "Rust 101".to_string(), Level::Beginner, None, None)
            .await
            .expect("Failed to insert course");

        // Two writers load the same snapshot.
        let mut first = find_course_by_id(&pool, &course.id)
            .await
            .expect("Failed to fetch course")
            .expect("Course not found");
        let mut second = first.clone();

        first.lectures.push(test_lecture("From writer A", &course.id));
        assert!(save_course(&pool, &mut first).await.expect("First save failed"));

        // The second writer's snapshot predates the first save, so its
        // blind write must be refused rather than clobber the lecture.
        second.lectures.push(test_lecture("From writer B", &course.id));
        assert!(!save_course(&pool, &mut second).await.expect("Second save errored"));

        let reloaded = find_course_by_id(&pool, &course.id)
            .await
            .expect("Failed to fetch course")
            .expect("Course not found");
        assert_eq!(reloaded.lectures.len(), 1);
        assert_eq!(reloaded.lectures[0].title, "From writer A");
    }

    #[tokio::test]
    async fn test_update_course_doc_retries_past_concurrent_save() {
        let pool = setup_test_db().await;

        let course = insert_course(&pool, "Rust 101".to_string(), Level::Beginner, None, None)
            .await
            .expect("Failed to insert course");

        // A writer gets in between another's load and save; the
        // retrying path must end up with both lectures.
        let mut racing = find_course_by_id(&pool, &course.id)
            .await
            .expect("Failed to fetch course")
            .expect("Course not found");
        racing.lectures.push(test_lecture("From writer A", &course.id));
        assert!(save_course(&pool, &mut racing).await.expect("Racing save failed"));

        update_course_doc(&pool, &course.id, |c| {
            c.lectures.push(test_lecture("From writer B", &course.id));
            Ok(())
        })
        .await
        .expect("Failed to update course");

        let reloaded = find_course_by_id(&pool, &course.id)
            .await
            .expect("Failed to fetch course")
            .expect("Course not found");
        let titles: Vec<&str> = reloaded.lectures.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["From writer A", "From writer B"]);
    }

    #[tokio::test]
    async fn test_save_missing_course_is_not_found() {
        let pool = setup_test_db().await;

        let mut ghost = Course {
            id: "missing".to_string(),
            name: "Ghost".to_string(),
            level: Level::Beginner,
            description: None,
            image_url: None,
            lectures: Vec::new(),
            created_at: Utc::now().to_rfc3339(),
            updated_at: Utc::now().to_rfc3339(),
        };

        let err = save_course(&pool, &mut ghost).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Course")));
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let pool = setup_test_db().await;

        let user = insert_user(
            &pool,
            NewUser {
                name: "John Doe".to_string(),
                email: "john@example.com".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Instructor,
                mobile: None,
                bio: None,
                avatar_url: None,
            },
        )
        .await
        .expect("Failed to insert user");

        let found = find_user_by_email(&pool, "john@example.com")
            .await
            .expect("Failed to query user")
            .expect("User not found");
        assert_eq!(found.id, user.id);
        assert_eq!(found.role, Role::Instructor);

        let instructors = fetch_users_by_role(&pool, Role::Instructor)
            .await
            .expect("Failed to fetch instructors");
        assert_eq!(instructors.len(), 1);

        let admins = fetch_users_by_role(&pool, Role::Admin)
            .await
            .expect("Failed to fetch admins");
        assert!(admins.is_empty());
    }
}
