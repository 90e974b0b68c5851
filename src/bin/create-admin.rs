//! Creates the default admin account if it does not exist yet.

use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lectern::auth;
use lectern::db::store;
use lectern::models::Role;

const ADMIN_EMAIL: &str = "admin@lectern.dev";
const ADMIN_PASSWORD: &str = "admin123";

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

    if let Some(existing) = store::find_user_by_email(&pool, ADMIN_EMAIL).await? {
        info!("admin user already exists: {} ({:?})", existing.email, existing.role);
        return Ok(());
    }

    let password_hash = auth::hash_password(ADMIN_PASSWORD)?;
    let admin = store::insert_user(
        &pool,
        store::NewUser {
            name: "Admin User".to_string(),
            email: ADMIN_EMAIL.to_string(),
            password_hash,
            role: Role::Admin,
            mobile: None,
            bio: None,
            avatar_url: None,
        },
    )
    .await?;

    info!("admin user created: {} / {}", admin.email, ADMIN_PASSWORD);
    Ok(())
}
