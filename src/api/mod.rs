use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::{delete, post, put};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Deserialize;

use crate::auth::{self, AdminUser, AuthUser};
use crate::db::store;
use crate::error::AppError;
use crate::models::*;
use crate::services::{courses, lectures};
use crate::state::AppState;

#[derive(Deserialize)]
struct UnassignedParams {
    #[serde(rename = "courseId")]
    course_id: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/courses", get(list_courses).post(create_course))
        .route(
            "/api/courses/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/api/courses/{id}/lectures", post(add_lecture))
        .route("/api/courses/{id}/instructors", get(get_course_instructors))
        .route("/api/lectures", get(list_lectures))
        .route("/api/lectures/unassigned", get(list_unassigned_lectures))
        .route(
            "/api/lectures/instructor/{instructor_id}",
            get(list_lectures_by_instructor),
        )
        .route("/api/lectures/assign", put(assign_lecture))
        .route(
            "/api/lectures/{course_id}/{lecture_id}",
            put(update_lecture).delete(delete_lecture),
        )
        .route("/api/users/instructors", get(list_instructors))
        .route("/api/users/instructors/{id}", get(get_instructor))
        .route("/api/users/profile", put(update_profile))
        .route("/api/users/{id}", delete(delete_user))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    if store::find_user_by_email(&state.db, &req.email).await?.is_some() {
        return Err(AppError::Validation("User already exists".to_string()));
    }

    let password_hash = auth::hash_password(&req.password)?;
    let user = store::insert_user(
        &state.db,
        store::NewUser {
            name: req.name,
            email: req.email,
            password_hash,
            role: Role::Instructor,
            mobile: req.mobile,
            bio: req.bio,
            avatar_url: req.avatar_url,
        },
    )
    .await?;

    let token = auth::create_token(&state.auth, &user.id)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = store::find_user_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    if !auth::verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let token = auth::create_token(&state.auth, &user.id)?;
    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(user.into())
}

async fn list_courses(
    _caller: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseDetails>>, AppError> {
    let courses = courses::list_courses(&state.db).await?;
    Ok(Json(courses))
}

async fn get_course(
    _caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CourseDetails>, AppError> {
    let course = courses::get_course(&state.db, &id).await?;
    Ok(Json(course))
}

async fn create_course(
    _caller: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<NewCourseRequest>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = courses::create_course(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn update_course(
    _caller: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCourseRequest>,
) -> Result<Json<Course>, AppError> {
    let course = courses::update_course(&state.db, &id, req).await?;
    Ok(Json(course))
}

async fn delete_course(
    _caller: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    courses::delete_course(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_lecture(
    _caller: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<NewLectureRequest>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = courses::add_lecture(&state.db, &id, req).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn get_course_instructors(
    _caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let instructors = courses::course_instructors(&state.db, &id).await?;
    Ok(Json(instructors))
}

async fn list_lectures(
    _caller: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<LectureView>>, AppError> {
    let views = lectures::list_all(&state.db).await?;
    Ok(Json(views))
}

async fn list_unassigned_lectures(
    _caller: AdminUser,
    State(state): State<AppState>,
    Query(params): Query<UnassignedParams>,
) -> Result<Json<Vec<LectureView>>, AppError> {
    let views = lectures::list_unassigned(&state.db, params.course_id.as_deref()).await?;
    Ok(Json(views))
}

async fn list_lectures_by_instructor(
    _caller: AuthUser,
    State(state): State<AppState>,
    Path(instructor_id): Path<String>,
) -> Result<Json<Vec<LectureView>>, AppError> {
    let views = lectures::list_by_instructor(&state.db, &instructor_id).await?;
    Ok(Json(views))
}

async fn assign_lecture(
    _caller: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<AssignLectureRequest>,
) -> Result<Json<CourseDetails>, AppError> {
    let course = lectures::assign(&state.db, req).await?;
    Ok(Json(course))
}

async fn update_lecture(
    _caller: AdminUser,
    State(state): State<AppState>,
    Path((course_id, lecture_id)): Path<(String, String)>,
    Json(req): Json<UpdateLectureRequest>,
) -> Result<Json<Course>, AppError> {
    let course = lectures::update_lecture(&state.db, &course_id, &lecture_id, req).await?;
    Ok(Json(course))
}

async fn delete_lecture(
    _caller: AdminUser,
    State(state): State<AppState>,
    Path((course_id, lecture_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    lectures::remove_lecture(&state.db, &course_id, &lecture_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_instructors(
    _caller: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = store::fetch_users_by_role(&state.db, Role::Instructor).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

async fn get_instructor(
    _caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let user = store::find_user_by_id(&state.db, &id)
        .await?
        .filter(|u| u.role == Role::Instructor)
        .ok_or(AppError::NotFound("Instructor"))?;
    Ok(Json(user.into()))
}

async fn update_profile(
    AuthUser(mut user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    if let Some(name) = req.name {
        user.name = name;
    }
    if let Some(email) = req.email {
        if email != user.email
            && store::find_user_by_email(&state.db, &email).await?.is_some()
        {
            return Err(AppError::Validation("Email already in use".to_string()));
        }
        user.email = email;
    }
    if let Some(mobile) = req.mobile {
        user.mobile = Some(mobile);
    }
    if let Some(bio) = req.bio {
        user.bio = Some(bio);
    }
    if let Some(avatar_url) = req.avatar_url {
        user.avatar_url = Some(avatar_url);
    }
    if let Some(password) = req.password {
        user.password_hash = auth::hash_password(&password)?;
    }

    store::save_user(&state.db, &mut user).await?;
    Ok(Json(user.into()))
}

async fn delete_user(
    _caller: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !store::delete_user(&state.db, &id).await? {
        return Err(AppError::NotFound("User"));
    }
    Ok(StatusCode::NO_CONTENT)
}
