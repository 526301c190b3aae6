use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, ROLE_HR, ROLE_IT};
use crate::error::{AppError, AppResult};
use crate::lifecycle::AssetStatus;
use crate::models::{Asset, Candidate, NewAsset};
use crate::routes::candidates::ensure_candidate_access;
use crate::schema::{assets, candidates};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateAssetRequest {
    pub name: String,
    pub asset_type: String,
    pub serial_number: String,
}

#[derive(Deserialize)]
pub struct AllocateAssetRequest {
    pub candidate_id: Uuid,
}

#[derive(Serialize)]
pub struct AssetResponse {
    pub id: Uuid,
    pub name: String,
    pub asset_type: String,
    pub serial_number: String,
    pub status: AssetStatus,
    pub assigned_to: Option<Uuid>,
    pub created_at: NaiveDateTime,
}

fn to_asset_response(asset: Asset) -> AppResult<AssetResponse> {
    let status: AssetStatus = asset.status.parse()?;
    Ok(AssetResponse {
        id: asset.id,
        name: asset.name,
        asset_type: asset.asset_type,
        serial_number: asset.serial_number,
        status,
        assigned_to: asset.assigned_to,
        created_at: asset.created_at,
    })
}

pub async fn list_assets(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<AssetResponse>>> {
    user.require_role(&[ROLE_IT, ROLE_HR])?;

    let mut conn = state.db()?;
    let rows: Vec<Asset> = assets::table.order(assets::name.asc()).load(&mut conn)?;
    let response = rows
        .into_iter()
        .map(to_asset_response)
        .collect::<AppResult<Vec<_>>>()?;
    Ok(Json(response))
}

pub async fn create_asset(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateAssetRequest>,
) -> AppResult<(StatusCode, Json<AssetResponse>)> {
    user.require_role(&[ROLE_IT])?;

    let name = payload.name.trim();
    let serial = payload.serial_number.trim();
    if name.is_empty() || serial.is_empty() {
        return Err(AppError::bad_request("name and serial_number are required"));
    }

    let mut conn = state.db()?;
    let new_asset = NewAsset {
        id: Uuid::new_v4(),
        name: name.to_string(),
        asset_type: payload.asset_type.trim().to_string(),
        serial_number: serial.to_string(),
        status: AssetStatus::Available.as_str().to_string(),
    };

    match diesel::insert_into(assets::table)
        .values(&new_asset)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => {
            return Err(AppError::bad_request("serial number already registered"));
        }
        Err(err) => return Err(AppError::from(err)),
    }

    let asset: Asset = assets::table.find(new_asset.id).first(&mut conn)?;
    Ok((StatusCode::CREATED, Json(to_asset_response(asset)?)))
}

/// Assigns an asset. `status` and `assigned_to` move together in one
/// update under a row lock, and the candidate's denormalized asset
/// summary is refreshed in the same transaction.
pub async fn allocate_asset(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(asset_id): Path<Uuid>,
    Json(payload): Json<AllocateAssetRequest>,
) -> AppResult<Json<AssetResponse>> {
    user.require_role(&[ROLE_IT])?;

    let mut conn = state.db()?;
    let asset = conn.transaction::<Asset, AppError, _>(|conn| {
        let asset: Asset = assets::table.find(asset_id).for_update().first(conn)?;
        let status: AssetStatus = asset.status.parse()?;
        if status != AssetStatus::Available {
            return Err(AppError::conflict(format!(
                "asset is not available (currently {})",
                status.as_str()
            )));
        }

        // Lock the candidate row too so racing allocations serialize on
        // the summary update.
        let _candidate: Candidate = candidates::table
            .find(payload.candidate_id)
            .for_update()
            .first(conn)
            .map_err(|err| match err {
                diesel::result::Error::NotFound => {
                    AppError::bad_request("candidate does not exist")
                }
                other => AppError::from(other),
            })?;

        let now = Utc::now().naive_utc();
        diesel::update(assets::table.find(asset_id))
            .set((
                assets::status.eq(AssetStatus::Allocated.as_str()),
                assets::assigned_to.eq(Some(payload.candidate_id)),
                assets::updated_at.eq(now),
            ))
            .execute(conn)?;

        refresh_assets_summary(conn, payload.candidate_id)?;

        Ok(assets::table.find(asset_id).first(conn)?)
    })?;

    info!(asset_id = %asset_id, candidate_id = %payload.candidate_id, "asset allocated");
    Ok(Json(to_asset_response(asset)?))
}

/// Returns an asset to the pool. Unallocating an unassigned asset is a
/// no-op.
pub async fn unallocate_asset(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(asset_id): Path<Uuid>,
) -> AppResult<Json<AssetResponse>> {
    user.require_role(&[ROLE_IT])?;

    let mut conn = state.db()?;
    let asset = conn.transaction::<Asset, AppError, _>(|conn| {
        let asset: Asset = assets::table.find(asset_id).for_update().first(conn)?;

        let Some(candidate_id) = asset.assigned_to else {
            return Ok(asset);
        };

        let now = Utc::now().naive_utc();
        diesel::update(assets::table.find(asset_id))
            .set((
                assets::status.eq(AssetStatus::Available.as_str()),
                assets::assigned_to.eq(None::<Uuid>),
                assets::updated_at.eq(now),
            ))
            .execute(conn)?;

        refresh_assets_summary(conn, candidate_id)?;

        Ok(assets::table.find(asset_id).first(conn)?)
    })?;

    Ok(Json(to_asset_response(asset)?))
}

pub async fn list_candidate_assets(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(candidate_id): Path<Uuid>,
) -> AppResult<Json<Vec<AssetResponse>>> {
    let mut conn = state.db()?;
    let candidate: Candidate = candidates::table.find(candidate_id).first(&mut conn)?;
    ensure_candidate_access(&user, &candidate)?;

    let rows: Vec<Asset> = assets::table
        .filter(assets::assigned_to.eq(candidate_id))
        .order(assets::name.asc())
        .load(&mut conn)?;
    let response = rows
        .into_iter()
        .map(to_asset_response)
        .collect::<AppResult<Vec<_>>>()?;
    Ok(Json(response))
}

/// Rebuilds the denormalized snapshot on the candidate row from the
/// assets currently assigned to them.
fn refresh_assets_summary(conn: &mut PgConnection, candidate_id: Uuid) -> AppResult<()> {
    let assigned: Vec<Asset> = assets::table
        .filter(assets::assigned_to.eq(candidate_id))
        .order(assets::name.asc())
        .load(conn)?;

    let summary: Value = assigned
        .iter()
        .map(|asset| {
            json!({
                "id": asset.id,
                "name": asset.name,
                "type": asset.asset_type,
                "serial": asset.serial_number,
            })
        })
        .collect::<Vec<_>>()
        .into();

    diesel::update(candidates::table.find(candidate_id))
        .set((
            candidates::assigned_assets_summary.eq(summary),
            candidates::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;

    Ok(())
}
