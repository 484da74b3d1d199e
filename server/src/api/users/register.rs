use crate::auth::hash_password;
use crate::error::{ApiError, ValidJson};
use crate::models::{NewUser, User};
use crate::queries;
use crate::schema::users;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use foodgram_core::{FieldErrors, RegisterUser};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for RegisterResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

const EMAIL_TAKEN: &str = "A user with that email already exists.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";

#[utoipa::path(
    post,
    path = "/api/users/",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Field-keyed validation errors")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let new_user = RegisterUser {
        email: req.email,
        username: req.username,
        first_name: req.first_name,
        last_name: req.last_name,
        password: req.password,
    }
    .validate()?;

    let mut conn = state.pool.get()?;

    let mut errors = FieldErrors::new();
    if queries::email_taken(&mut conn, &new_user.email)? {
        errors.add("email", EMAIL_TAKEN);
    }
    if queries::username_taken(&mut conn, &new_user.username)? {
        errors.add("username", USERNAME_TAKEN);
    }
    errors.finish(())?;

    let password_hash = hash_password(&new_user.password)
        .map_err(|e| ApiError::internal("Failed to hash password", e))?;

    let user = diesel::insert_into(users::table)
        .values(NewUser {
            email: &new_user.email,
            username: &new_user.username,
            first_name: &new_user.first_name,
            last_name: &new_user.last_name,
            password_hash: &password_hash,
        })
        .returning(User::as_returning())
        .get_result(&mut conn)
        .map_err(unique_violation_to_field)?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// A concurrent registration can still win the race past the checks above.
fn unique_violation_to_field(err: DieselError) -> ApiError {
    if let DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) = &err {
        let constraint = info.constraint_name().unwrap_or_default();
        if constraint.contains("email") {
            return ApiError::field("email", EMAIL_TAKEN);
        }
        if constraint.contains("username") {
            return ApiError::field("username", USERNAME_TAKEN);
        }
    }
    err.into()
}
