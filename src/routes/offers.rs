use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, ROLE_CANDIDATE, ROLE_HR};
use crate::error::{AppError, AppResult};
use crate::lifecycle::{self, OfferDecision};
use crate::models::Candidate;
use crate::routes::candidates::{ensure_candidate_access, to_candidate_response, CandidateResponse};
use crate::routes::notifications::notify_role;
use crate::schema::candidates;
use crate::state::AppState;
use crate::utils::multipart::{file_extension, read_file_upload};

#[derive(Deserialize)]
pub struct RejectOfferRequest {
    pub reason: String,
}

/// HR uploads the offer letter and marks it sent. The object is stored
/// first; if the status transaction then fails, the upload is deleted so
/// no orphaned file is left behind.
pub async fn send_offer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(candidate_id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<Json<CandidateResponse>> {
    user.require_role(&[ROLE_HR])?;

    let (upload, _) = read_file_upload(multipart).await?;
    let key = format!(
        "{candidate_id}/{}.{}",
        Uuid::new_v4(),
        file_extension(&upload.original_name)
    );

    state
        .offer_storage
        .put_object(&key, upload.bytes, upload.content_type)
        .await
        .map_err(|err| {
            error!(error = %err, key = %key, "failed to store offer letter");
            AppError::internal(format!("failed to store offer letter: {err}"))
        })?;

    let result = {
        let mut conn = state.db()?;
        conn.transaction::<Candidate, AppError, _>(|conn| {
            let candidate: Candidate = candidates::table
                .find(candidate_id)
                .for_update()
                .first(conn)?;

            let new_status = lifecycle::status_after_offer_sent(candidate.credentials_created);
            let now = Utc::now().naive_utc();

            diesel::update(candidates::table.find(candidate_id))
                .set((
                    candidates::status.eq(new_status.as_str()),
                    candidates::sent_offer_letter.eq(true),
                    candidates::offer_letter_key.eq(Some(key.clone())),
                    candidates::offer_acceptance_status.eq(OfferDecision::None.as_str()),
                    candidates::rejection_reason.eq(None::<String>),
                    candidates::updated_at.eq(now),
                ))
                .execute(conn)?;

            Ok(candidates::table.find(candidate_id).first(conn)?)
        })
    };

    let candidate = match result {
        Ok(candidate) => candidate,
        Err(err) => {
            if let Err(cleanup_err) = state.offer_storage.delete_object(&key).await {
                warn!(key = %key, error = %cleanup_err, "failed to clean up offer letter after aborted send");
            }
            return Err(err);
        }
    };

    info!(candidate_id = %candidate_id, status = %candidate.status, "offer letter sent");
    Ok(Json(to_candidate_response(candidate)?))
}

/// Candidate uploads the signed copy. Accepting twice is a no-op: the
/// second call returns the stored state without writing a second file
/// or notifying HR again.
pub async fn accept_offer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(candidate_id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<Json<CandidateResponse>> {
    user.require_role(&[ROLE_CANDIDATE])?;

    let mut conn = state.db()?;
    let candidate: Candidate = candidates::table.find(candidate_id).first(&mut conn)?;
    ensure_candidate_access(&user, &candidate)?;

    if !candidate.sent_offer_letter {
        return Err(AppError::bad_request("no outstanding offer to accept"));
    }
    if candidate.offer_acceptance_status == OfferDecision::Accepted.as_str() {
        return Ok(Json(to_candidate_response(candidate)?));
    }
    drop(conn);

    let (upload, _) = read_file_upload(multipart).await?;
    let key = format!(
        "{candidate_id}/signed-{}.{}",
        Uuid::new_v4(),
        file_extension(&upload.original_name)
    );

    state
        .offer_storage
        .put_object(&key, upload.bytes, upload.content_type)
        .await
        .map_err(|err| {
            error!(error = %err, key = %key, "failed to store signed offer");
            AppError::internal(format!("failed to store signed offer: {err}"))
        })?;

    let result = {
        let mut conn = state.db()?;
        conn.transaction::<(Candidate, bool), AppError, _>(|conn| {
            let candidate: Candidate = candidates::table
                .find(candidate_id)
                .for_update()
                .first(conn)?;

            // Re-check under the lock in case a concurrent accept won.
            if candidate.offer_acceptance_status == OfferDecision::Accepted.as_str() {
                return Ok((candidate, false));
            }
            if !candidate.sent_offer_letter {
                return Err(AppError::bad_request("no outstanding offer to accept"));
            }

            let now = Utc::now().naive_utc();
            diesel::update(candidates::table.find(candidate_id))
                .set((
                    candidates::offer_acceptance_status.eq(OfferDecision::Accepted.as_str()),
                    candidates::signed_offer_key.eq(Some(key.clone())),
                    candidates::rejection_reason.eq(None::<String>),
                    candidates::updated_at.eq(now),
                ))
                .execute(conn)?;

            let refreshed: Candidate = candidates::table.find(candidate_id).first(conn)?;
            notify_role(
                conn,
                ROLE_HR,
                "Offer accepted",
                &format!("{} accepted the offer for {}", refreshed.name, refreshed.position),
            )?;

            Ok((refreshed, true))
        })
    };

    let (candidate, applied) = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            if let Err(cleanup_err) = state.offer_storage.delete_object(&key).await {
                warn!(key = %key, error = %cleanup_err, "failed to clean up signed offer after aborted accept");
            }
            return Err(err);
        }
    };

    if !applied {
        // A concurrent accept already recorded a signed copy.
        if let Err(cleanup_err) = state.offer_storage.delete_object(&key).await {
            warn!(key = %key, error = %cleanup_err, "failed to clean up duplicate signed offer");
        }
    } else {
        info!(candidate_id = %candidate_id, "offer accepted");
    }

    Ok(Json(to_candidate_response(candidate)?))
}

/// Candidate declines the offer. One transaction records the decision
/// and reason, resets `sent_offer_letter` so HR can resend, and raises
/// an HR notification.
pub async fn reject_offer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(candidate_id): Path<Uuid>,
    Json(payload): Json<RejectOfferRequest>,
) -> AppResult<Json<CandidateResponse>> {
    user.require_role(&[ROLE_CANDIDATE])?;

    let reason = payload.reason.trim();
    if reason.is_empty() {
        return Err(AppError::bad_request("reason must not be empty"));
    }

    let mut conn = state.db()?;
    let candidate = conn.transaction::<Candidate, AppError, _>(|conn| {
        let candidate: Candidate = candidates::table
            .find(candidate_id)
            .for_update()
            .first(conn)?;
        ensure_candidate_access(&user, &candidate)?;

        if !candidate.sent_offer_letter {
            return Err(AppError::bad_request("no outstanding offer to reject"));
        }

        let now = Utc::now().naive_utc();
        diesel::update(candidates::table.find(candidate_id))
            .set((
                candidates::offer_acceptance_status.eq(OfferDecision::Rejected.as_str()),
                candidates::rejection_reason.eq(Some(reason.to_string())),
                candidates::sent_offer_letter.eq(false),
                candidates::updated_at.eq(now),
            ))
            .execute(conn)?;

        let refreshed: Candidate = candidates::table.find(candidate_id).first(conn)?;
        notify_role(
            conn,
            ROLE_HR,
            "Offer rejected",
            &format!("{} rejected the offer: {reason}", refreshed.name),
        )?;

        Ok(refreshed)
    })?;

    info!(candidate_id = %candidate_id, reason = %reason, "offer rejected");
    Ok(Json(to_candidate_response(candidate)?))
}

/// Presigned download for the latest offer letter (candidate or HR).
pub async fn download_offer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(candidate_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let mut conn = state.db()?;
    let candidate: Candidate = candidates::table.find(candidate_id).first(&mut conn)?;
    ensure_candidate_access(&user, &candidate)?;
    drop(conn);

    let key = candidate
        .offer_letter_key
        .as_deref()
        .ok_or_else(AppError::not_found)?;

    let expires_in = std::time::Duration::from_secs(
        (state.config.document_url_expiry_minutes.max(1) as u64) * 60,
    );
    let url = state
        .offer_storage
        .presign_get_object(key, expires_in)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(serde_json::json!({ "url": url })))
}
