pub mod jwt;
pub mod password;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::NewUser;
use crate::schema::users;
use crate::{error::AppError, state::AppState};

pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_HR: &str = "HR";
pub const ROLE_IT: &str = "IT";
pub const ROLE_CANDIDATE: &str = "CANDIDATE";

/// Creates the initial ADMIN login on a fresh database. Returns false
/// if the username is already taken. Every other account flows from
/// this one: admins insert HR/IT staff, provisioning creates candidate
/// logins.
pub fn seed_admin_user(
    conn: &mut PgConnection,
    username: &str,
    plain_password: &str,
) -> anyhow::Result<bool> {
    let admin = NewUser {
        id: Uuid::new_v4(),
        username: username.to_string(),
        password_hash: password::hash_password(plain_password)?,
        role: ROLE_ADMIN.to_string(),
        full_name: None,
    };

    let inserted = diesel::insert_into(users::table)
        .values(&admin)
        .on_conflict(users::username)
        .do_nothing()
        .execute(conn)?;

    Ok(inserted == 1)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: uuid::Uuid,
    pub username: String,
    pub role: String,
}

impl AuthenticatedUser {
    /// Admins pass every role check.
    pub fn require_role(&self, allowed: &[&str]) -> Result<(), AppError> {
        if self.role == ROLE_ADMIN || allowed.iter().any(|role| *role == self.role) {
            Ok(())
        } else {
            Err(AppError::forbidden())
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::unauthorized())?;

        let claims = state
            .jwt
            .verify_token(bearer.token())
            .map_err(|_| AppError::unauthorized())?;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        })
    }
}
