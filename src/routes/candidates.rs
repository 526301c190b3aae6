use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, ROLE_CANDIDATE, ROLE_HR, ROLE_IT};
use crate::error::{AppError, AppResult};
use crate::lifecycle::{self, CandidateStatus, OfferDecision, Progress};
use crate::models::{Candidate, NewCandidate};
use crate::schema::candidates;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateCandidateRequest {
    pub name: String,
    pub personal_email: String,
    pub position: String,
    pub department: String,
    pub phone: Option<String>,
    pub team: Option<String>,
    pub employment_type: Option<String>,
    pub work_location: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub reporting_manager: Option<String>,
}

#[derive(Serialize)]
pub struct CandidateResponse {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub personal_email: String,
    pub position: String,
    pub department: String,
    pub team: Option<String>,
    pub employment_type: Option<String>,
    pub work_location: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub reporting_manager: Option<String>,
    pub status: CandidateStatus,
    pub progress: Progress,
    pub sent_offer_letter: bool,
    pub offer_acceptance_status: OfferDecision,
    pub rejection_reason: Option<String>,
    pub credentials_created: bool,
    pub company_email: Option<String>,
    pub provisioned_at: Option<NaiveDateTime>,
    pub assigned_assets: Value,
    pub created_at: NaiveDateTime,
}

/// The one place a candidate row becomes an API shape. `progress` is
/// derived here so list views never recompute it with their own rules.
pub(crate) fn to_candidate_response(candidate: Candidate) -> AppResult<CandidateResponse> {
    let status: CandidateStatus = candidate.status.parse()?;
    let decision: OfferDecision = candidate.offer_acceptance_status.parse()?;
    let has_assets = candidate
        .assigned_assets_summary
        .as_array()
        .map(|entries| !entries.is_empty())
        .unwrap_or(false);

    Ok(CandidateResponse {
        id: candidate.id,
        name: candidate.name,
        phone: candidate.phone,
        personal_email: candidate.personal_email,
        position: candidate.position,
        department: candidate.department,
        team: candidate.team,
        employment_type: candidate.employment_type,
        work_location: candidate.work_location,
        joining_date: candidate.joining_date,
        reporting_manager: candidate.reporting_manager,
        status,
        progress: lifecycle::derive_progress(status, has_assets),
        sent_offer_letter: candidate.sent_offer_letter,
        offer_acceptance_status: decision,
        rejection_reason: candidate.rejection_reason,
        credentials_created: candidate.credentials_created,
        company_email: candidate.company_email,
        provisioned_at: candidate.provisioned_at,
        assigned_assets: candidate.assigned_assets_summary,
        created_at: candidate.created_at,
    })
}

/// A candidate may only operate on their own record; HR/IT/admin have
/// full access.
pub(crate) fn ensure_candidate_access(
    user: &AuthenticatedUser,
    candidate: &Candidate,
) -> Result<(), AppError> {
    if user.role == ROLE_CANDIDATE {
        let matches = candidate.company_email.as_deref() == Some(user.username.as_str())
            || candidate.personal_email == user.username;
        if matches {
            Ok(())
        } else {
            Err(AppError::forbidden())
        }
    } else {
        user.require_role(&[ROLE_HR, ROLE_IT])
    }
}

pub async fn create_candidate(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateCandidateRequest>,
) -> AppResult<(StatusCode, Json<CandidateResponse>)> {
    user.require_role(&[ROLE_HR])?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    let email = payload.personal_email.trim();
    if !is_valid_email(email) {
        return Err(AppError::bad_request("personal_email is not a valid email"));
    }
    if payload.position.trim().is_empty() || payload.department.trim().is_empty() {
        return Err(AppError::bad_request("position and department are required"));
    }

    let mut conn = state.db()?;
    let new_candidate = NewCandidate {
        id: Uuid::new_v4(),
        name: name.to_string(),
        phone: payload.phone,
        personal_email: email.to_string(),
        position: payload.position.trim().to_string(),
        department: payload.department.trim().to_string(),
        team: payload.team,
        employment_type: payload.employment_type,
        work_location: payload.work_location,
        joining_date: payload.joining_date,
        reporting_manager: payload.reporting_manager,
        status: CandidateStatus::Applied.as_str().to_string(),
        offer_acceptance_status: OfferDecision::None.as_str().to_string(),
        assigned_assets_summary: json!([]),
    };

    match diesel::insert_into(candidates::table)
        .values(&new_candidate)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => {
            return Err(AppError::bad_request(
                "a candidate with this personal email already exists",
            ));
        }
        Err(err) => return Err(AppError::from(err)),
    }

    let candidate: Candidate = candidates::table.find(new_candidate.id).first(&mut conn)?;
    info!(candidate_id = %candidate.id, "candidate created");

    Ok((StatusCode::CREATED, Json(to_candidate_response(candidate)?)))
}

pub async fn list_candidates(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<CandidateResponse>>> {
    user.require_role(&[ROLE_HR, ROLE_IT])?;

    let mut conn = state.db()?;
    let rows: Vec<Candidate> = candidates::table
        .order(candidates::created_at.desc())
        .load(&mut conn)?;

    let response = rows
        .into_iter()
        .map(to_candidate_response)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Json(response))
}

pub async fn get_candidate(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(candidate_id): Path<Uuid>,
) -> AppResult<Json<CandidateResponse>> {
    let mut conn = state.db()?;
    let candidate: Candidate = candidates::table.find(candidate_id).first(&mut conn)?;
    ensure_candidate_access(&user, &candidate)?;

    Ok(Json(to_candidate_response(candidate)?))
}

/// Resolves the caller's own candidate record by company or personal
/// email, for the candidate portal.
pub async fn current_candidate(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<CandidateResponse>> {
    user.require_role(&[ROLE_CANDIDATE])?;

    let mut conn = state.db()?;
    let candidate: Candidate = candidates::table
        .filter(
            candidates::company_email
                .eq(&user.username)
                .or(candidates::personal_email.eq(&user.username)),
        )
        .first(&mut conn)?;

    Ok(Json(to_candidate_response(candidate)?))
}

fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
