use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use rand::{rngs::OsRng, RngCore};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::{password, AuthenticatedUser, ROLE_CANDIDATE, ROLE_IT};
use crate::error::{AppError, AppResult};
use crate::lifecycle;
use crate::models::{Candidate, NewUser};
use crate::routes::candidates::{to_candidate_response, CandidateResponse};
use crate::schema::{candidates, users};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ProvisionRequest {
    pub company_email: String,
    pub company_password: Option<String>,
}

/// IT creates company credentials for a candidate. The status update and
/// the login identity land in one transaction, so a failure on either
/// side leaves no half-provisioned candidate. Provisioning twice is a
/// no-op that returns the stored state.
pub async fn provision_candidate(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(candidate_id): Path<Uuid>,
    Json(payload): Json<ProvisionRequest>,
) -> AppResult<(StatusCode, Json<CandidateResponse>)> {
    user.require_role(&[ROLE_IT])?;

    let company_email = payload.company_email.trim().to_string();
    if !company_email.contains('@') {
        return Err(AppError::bad_request("company_email is not a valid email"));
    }

    let password_plain = payload
        .company_password
        .unwrap_or_else(generate_initial_password);
    if password_plain.len() < 12 {
        return Err(AppError::bad_request(
            "company_password must be at least 12 characters",
        ));
    }
    let password_hash = password::hash_password(&password_plain).map_err(AppError::internal)?;

    let mut conn = state.db()?;
    let (candidate, created) = conn.transaction::<(Candidate, bool), AppError, _>(|conn| {
        let candidate: Candidate = candidates::table
            .find(candidate_id)
            .for_update()
            .first(conn)?;

        if candidate.credentials_created {
            return Ok((candidate, false));
        }

        let new_status = lifecycle::status_after_provisioning(candidate.sent_offer_letter);
        let now = Utc::now().naive_utc();

        diesel::update(candidates::table.find(candidate_id))
            .set((
                candidates::status.eq(new_status.as_str()),
                candidates::credentials_created.eq(true),
                candidates::company_email.eq(Some(company_email.clone())),
                candidates::provisioned_at.eq(Some(now)),
                candidates::updated_at.eq(now),
            ))
            .execute(conn)?;

        let login = NewUser {
            id: Uuid::new_v4(),
            username: company_email.clone(),
            password_hash: password_hash.clone(),
            role: ROLE_CANDIDATE.to_string(),
            full_name: Some(candidate.name.clone()),
        };
        diesel::insert_into(users::table)
            .values(&login)
            .on_conflict(users::username)
            .do_nothing()
            .execute(conn)?;

        let refreshed: Candidate = candidates::table.find(candidate_id).first(conn)?;
        Ok((refreshed, true))
    })?;

    if created {
        info!(
            candidate_id = %candidate_id,
            status = %candidate.status,
            "candidate provisioned"
        );
    }

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(to_candidate_response(candidate)?)))
}

fn generate_initial_password() -> String {
    let mut bytes = [0u8; 12];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
