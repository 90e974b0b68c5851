//! Wipes the database and loads the sample dataset: one admin, two
//! instructors and four courses with a mix of assigned and unassigned
//! lectures.

use chrono::{TimeZone, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use lectern::auth;
use lectern::db::store;
use lectern::models::{Lecture, Level, Role};

async fn seed_user(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<String, Box<dyn std::error::Error>> {
    let user = store::insert_user(
        pool,
        store::NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: auth::hash_password(password)?,
            role,
            mobile: None,
            bio: None,
            avatar_url: None,
        },
    )
    .await?;
    Ok(user.id)
}

struct SeedLecture<'a> {
    title: &'a str,
    day: (i32, u32, u32),
    duration: i64,
    instructor_id: Option<&'a str>,
}

async fn seed_course(
    pool: &SqlitePool,
    name: &str,
    level: Level,
    description: &str,
    image_url: &str,
    lectures: &[SeedLecture<'_>],
) -> Result<(), Box<dyn std::error::Error>> {
    let course = store::insert_course(
        pool,
        name.to_string(),
        level,
        Some(description.to_string()),
        Some(image_url.to_string()),
    )
    .await?;

    let mut seeded = Vec::new();
    for item in lectures {
        let (y, m, d) = item.day;
        seeded.push(Lecture {
            id: Uuid::new_v4().to_string(),
            title: item.title.to_string(),
            date: Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap(),
            duration: item.duration,
            instructor_id: item.instructor_id.map(|s| s.to_string()),
            course_id: course.id.clone(),
        });
    }

    store::update_course_doc(pool, &course.id, |c| {
        c.lectures = seeded.clone();
        Ok(())
    })
    .await?;
    info!("seeded course '{}' with {} lectures", name, lectures.len());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "lectern=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://lectern.db?mode=rwc".to_string());

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    sqlx::query("DELETE FROM courses").execute(&pool).await?;
    sqlx::query("DELETE FROM users").execute(&pool).await?;
    info!("cleared existing data");

    seed_user(&pool, "Admin User", "admin@lectern.dev", "admin123", Role::Admin).await?;
    let john = seed_user(
        &pool,
        "John Doe",
        "john@lectern.dev",
        "instructor123",
        Role::Instructor,
    )
    .await?;
    let jane = seed_user(
        &pool,
        "Jane Smith",
        "jane@lectern.dev",
        "instructor123",
        Role::Instructor,
    )
    .await?;

    seed_course(
        &pool,
        "Web Development Fundamentals",
        Level::Beginner,
        "Learn the basics of HTML, CSS, and JavaScript",
        "https://picsum.photos/seed/web1/400/225",
        &[
            SeedLecture { title: "Introduction to HTML", day: (2025, 11, 20), duration: 60, instructor_id: Some(john.as_str()) },
            SeedLecture { title: "CSS Basics", day: (2025, 11, 22), duration: 60, instructor_id: Some(john.as_str()) },
            SeedLecture { title: "JavaScript Fundamentals", day: (2025, 11, 25), duration: 90, instructor_id: None },
        ],
    )
    .await?;

    seed_course(
        &pool,
        "Advanced React Development",
        Level::Advanced,
        "Master React with hooks, context, and advanced patterns",
        "https://picsum.photos/seed/react1/400/225",
        &[
            SeedLecture { title: "React Hooks Deep Dive", day: (2025, 11, 18), duration: 120, instructor_id: Some(jane.as_str()) },
            SeedLecture { title: "Context API and State Management", day: (2025, 11, 21), duration: 90, instructor_id: None },
            SeedLecture { title: "Advanced React Patterns", day: (2025, 11, 24), duration: 90, instructor_id: None },
        ],
    )
    .await?;

    seed_course(
        &pool,
        "Backend Development",
        Level::Intermediate,
        "Build scalable backend services",
        "https://picsum.photos/seed/node1/400/225",
        &[
            SeedLecture { title: "HTTP Fundamentals", day: (2025, 11, 17), duration: 90, instructor_id: Some(john.as_str()) },
            SeedLecture { title: "Databases and Persistence", day: (2025, 11, 19), duration: 120, instructor_id: Some(jane.as_str()) },
            SeedLecture { title: "REST API Best Practices", day: (2025, 11, 23), duration: 90, instructor_id: None },
        ],
    )
    .await?;

    seed_course(
        &pool,
        "Python for Data Science",
        Level::Intermediate,
        "Learn Python programming for data analysis and visualization",
        "https://picsum.photos/seed/python1/400/225",
        &[
            SeedLecture { title: "Python Basics", day: (2025, 11, 26), duration: 60, instructor_id: None },
            SeedLecture { title: "NumPy and Pandas", day: (2025, 11, 28), duration: 90, instructor_id: None },
        ],
    )
    .await?;

    info!("database seeded: 3 users, 4 courses");
    info!("admin login: admin@lectern.dev / admin123");
    Ok(())
}
