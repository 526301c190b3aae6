use std::time::Duration;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, ROLE_CANDIDATE, ROLE_HR};
use crate::error::{AppError, AppResult};
use crate::lifecycle::DocumentStatus;
use crate::models::{Candidate, CandidateDocument, NewCandidateDocument};
use crate::routes::candidates::ensure_candidate_access;
use crate::schema::{candidate_documents, candidates};
use crate::state::AppState;
use crate::utils::multipart::{file_extension, read_file_upload};

#[derive(Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub document_type: String,
    pub original_name: String,
    pub status: DocumentStatus,
    pub rejection_reason: Option<String>,
    pub superseded: bool,
    pub uploaded_at: NaiveDateTime,
}

#[derive(Serialize)]
pub struct ReviewQueueEntry {
    #[serde(flatten)]
    pub document: DocumentResponse,
    pub candidate_name: String,
    pub candidate_position: String,
}

#[derive(Deserialize)]
pub struct RejectDocumentRequest {
    pub reason: String,
}

#[derive(Serialize)]
pub struct DocumentDownload {
    pub url: String,
    pub filename: String,
}

fn to_document_response(doc: CandidateDocument) -> AppResult<DocumentResponse> {
    let status: DocumentStatus = doc.status.parse()?;
    Ok(DocumentResponse {
        id: doc.id,
        candidate_id: doc.candidate_id,
        document_type: doc.document_type,
        original_name: doc.original_name,
        status,
        rejection_reason: doc.rejection_reason,
        superseded: doc.superseded_at.is_some(),
        uploaded_at: doc.uploaded_at,
    })
}

/// Candidate uploads one document of a given type. Earlier uploads of
/// the same type are marked superseded in the same transaction, so the
/// active set always holds at most one row per (candidate, type).
pub async fn upload_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(candidate_id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DocumentResponse>)> {
    let mut conn = state.db()?;
    let candidate: Candidate = candidates::table.find(candidate_id).first(&mut conn)?;
    ensure_candidate_access(&user, &candidate)?;
    drop(conn);

    let (upload, fields) = read_file_upload(multipart).await?;
    let document_type = fields
        .get("document_type")
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::bad_request("document_type field is required"))?
        .to_string();

    let safe_type: String = document_type
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let key = format!(
        "{candidate_id}/{safe_type}-{}.{}",
        Uuid::new_v4(),
        file_extension(&upload.original_name)
    );

    state
        .document_storage
        .put_object(&key, upload.bytes, upload.content_type)
        .await
        .map_err(|err| {
            error!(error = %err, key = %key, "failed to store candidate document");
            AppError::internal(format!("failed to store document: {err}"))
        })?;

    let result = {
        let mut conn = state.db()?;
        conn.transaction::<CandidateDocument, AppError, _>(|conn| {
            // Serialize uploads per candidate; without the lock two
            // racing uploads of the same type would each supersede only
            // the rows committed before either started, leaving both
            // new rows active.
            let _locked: Candidate = candidates::table
                .find(candidate_id)
                .for_update()
                .first(conn)?;

            let now = Utc::now().naive_utc();

            diesel::update(
                candidate_documents::table
                    .filter(candidate_documents::candidate_id.eq(candidate_id))
                    .filter(candidate_documents::document_type.eq(&document_type))
                    .filter(candidate_documents::superseded_at.is_null()),
            )
            .set((
                candidate_documents::superseded_at.eq(Some(now)),
                candidate_documents::updated_at.eq(now),
            ))
            .execute(conn)?;

            let new_document = NewCandidateDocument {
                id: Uuid::new_v4(),
                candidate_id,
                document_type: document_type.clone(),
                file_path: key.clone(),
                original_name: upload.original_name.clone(),
                status: DocumentStatus::Pending.as_str().to_string(),
            };
            diesel::insert_into(candidate_documents::table)
                .values(&new_document)
                .execute(conn)?;

            Ok(candidate_documents::table.find(new_document.id).first(conn)?)
        })
    };

    let document = match result {
        Ok(document) => document,
        Err(err) => {
            if let Err(cleanup_err) = state.document_storage.delete_object(&key).await {
                warn!(key = %key, error = %cleanup_err, "failed to clean up document after aborted upload");
            }
            return Err(err);
        }
    };

    info!(
        candidate_id = %candidate_id,
        document_id = %document.id,
        document_type = %document.document_type,
        "candidate document uploaded"
    );

    Ok((StatusCode::CREATED, Json(to_document_response(document)?)))
}

pub async fn list_candidate_documents(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(candidate_id): Path<Uuid>,
) -> AppResult<Json<Vec<DocumentResponse>>> {
    let mut conn = state.db()?;
    let candidate: Candidate = candidates::table.find(candidate_id).first(&mut conn)?;
    ensure_candidate_access(&user, &candidate)?;

    let rows: Vec<CandidateDocument> = candidate_documents::table
        .filter(candidate_documents::candidate_id.eq(candidate_id))
        .order(candidate_documents::uploaded_at.desc())
        .load(&mut conn)?;

    let response = rows
        .into_iter()
        .map(to_document_response)
        .collect::<AppResult<Vec<_>>>()?;
    Ok(Json(response))
}

/// HR review queue: every active (non-superseded) document with the
/// candidate it belongs to, latest first.
pub async fn list_all_documents(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<ReviewQueueEntry>>> {
    user.require_role(&[ROLE_HR])?;

    let mut conn = state.db()?;
    let rows: Vec<(CandidateDocument, String, String)> = candidate_documents::table
        .inner_join(candidates::table)
        .filter(candidate_documents::superseded_at.is_null())
        .order(candidate_documents::uploaded_at.desc())
        .select((
            candidate_documents::all_columns,
            candidates::name,
            candidates::position,
        ))
        .load(&mut conn)?;

    let response = rows
        .into_iter()
        .map(|(doc, candidate_name, candidate_position)| {
            Ok(ReviewQueueEntry {
                document: to_document_response(doc)?,
                candidate_name,
                candidate_position,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;
    Ok(Json(response))
}

pub async fn verify_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(document_id): Path<Uuid>,
) -> AppResult<Json<DocumentResponse>> {
    user.require_role(&[ROLE_HR])?;
    review_document(&state, document_id, DocumentStatus::Verified, None).map(Json)
}

pub async fn reject_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<RejectDocumentRequest>,
) -> AppResult<Json<DocumentResponse>> {
    user.require_role(&[ROLE_HR])?;

    let reason = payload.reason.trim();
    if reason.is_empty() {
        return Err(AppError::bad_request("reason must not be empty"));
    }

    review_document(&state, document_id, DocumentStatus::Rejected, Some(reason)).map(Json)
}

fn review_document(
    state: &AppState,
    document_id: Uuid,
    verdict: DocumentStatus,
    reason: Option<&str>,
) -> AppResult<DocumentResponse> {
    let mut conn = state.db()?;
    let document = conn.transaction::<CandidateDocument, AppError, _>(|conn| {
        let document: CandidateDocument = candidate_documents::table
            .find(document_id)
            .for_update()
            .first(conn)?;

        if document.superseded_at.is_some() {
            return Err(AppError::conflict(
                "document has been superseded by a newer upload",
            ));
        }

        let now = Utc::now().naive_utc();
        diesel::update(candidate_documents::table.find(document_id))
            .set((
                candidate_documents::status.eq(verdict.as_str()),
                candidate_documents::rejection_reason.eq(reason.map(|r| r.to_string())),
                candidate_documents::updated_at.eq(now),
            ))
            .execute(conn)?;

        Ok(candidate_documents::table.find(document_id).first(conn)?)
    })?;

    info!(document_id = %document_id, verdict = %verdict.as_str(), "document reviewed");
    to_document_response(document)
}

/// Row goes first; a storage delete failure is logged but does not fail
/// the request, matching the table-then-bucket ordering of the intake
/// flow it undoes.
pub async fn delete_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(document_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    let document: CandidateDocument = candidate_documents::table
        .find(document_id)
        .first(&mut conn)?;
    if user.role == ROLE_CANDIDATE {
        let candidate: Candidate = candidates::table
            .find(document.candidate_id)
            .first(&mut conn)?;
        ensure_candidate_access(&user, &candidate)?;
    } else {
        user.require_role(&[ROLE_HR])?;
    }

    diesel::delete(candidate_documents::table.find(document_id)).execute(&mut conn)?;
    drop(conn);

    if let Err(err) = state.document_storage.delete_object(&document.file_path).await {
        warn!(key = %document.file_path, error = %err, "failed to remove document object from storage");
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn download_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(document_id): Path<Uuid>,
) -> AppResult<Json<DocumentDownload>> {
    let mut conn = state.db()?;
    let document: CandidateDocument = candidate_documents::table
        .find(document_id)
        .first(&mut conn)?;
    let candidate: Candidate = candidates::table
        .find(document.candidate_id)
        .first(&mut conn)?;
    ensure_candidate_access(&user, &candidate)?;
    drop(conn);

    let expires_in = Duration::from_secs(
        (state.config.document_url_expiry_minutes.max(1) as u64) * 60,
    );
    let url = state
        .document_storage
        .presign_get_object(&document.file_path, expires_in)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(DocumentDownload {
        url,
        filename: document.original_name,
    }))
}
