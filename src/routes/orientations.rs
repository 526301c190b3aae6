use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, ROLE_HR, ROLE_IT};
use crate::error::{AppError, AppResult};
use crate::models::{
    Candidate, NewOrientation, NewOrientationAttendee, Orientation, OrientationAttendee,
};
use crate::routes::candidates::ensure_candidate_access;
use crate::schema::{candidates, orientation_attendees, orientations};
use crate::state::AppState;

/// Attendees may join from this long before the scheduled start.
const JOIN_WINDOW_LEAD_MINUTES: i64 = 15;

const ATTENDEE_STATUS_SCHEDULED: &str = "Scheduled";

#[derive(Deserialize)]
pub struct CreateOrientationRequest {
    pub title: String,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub candidate_ids: Vec<Uuid>,
}

#[derive(Serialize)]
pub struct AttendeeSummary {
    pub candidate_id: Uuid,
    pub name: String,
    pub position: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct OrientationResponse {
    pub id: Uuid,
    pub title: String,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub description: Option<String>,
    pub attendees: Vec<AttendeeSummary>,
}

#[derive(Serialize)]
pub struct CandidateOrientation {
    pub id: Uuid,
    pub title: String,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub description: Option<String>,
    pub attendance_status: String,
    pub join_opens_at: NaiveDateTime,
    pub join_closes_at: NaiveDateTime,
    pub joinable: bool,
}

pub async fn create_orientation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateOrientationRequest>,
) -> AppResult<(StatusCode, Json<OrientationResponse>)> {
    user.require_role(&[ROLE_HR])?;

    if payload.title.trim().is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }
    if payload.end_time <= payload.start_time {
        return Err(AppError::bad_request("end_time must be after start_time"));
    }

    let mut conn = state.db()?;
    let (session, attendees) =
        conn.transaction::<(Orientation, Vec<AttendeeSummary>), AppError, _>(|conn| {
            let new_session = NewOrientation {
                id: Uuid::new_v4(),
                title: payload.title.trim().to_string(),
                session_date: payload.session_date,
                start_time: payload.start_time,
                end_time: payload.end_time,
                location: payload.location.clone(),
                meeting_link: payload.meeting_link.clone(),
                description: payload.description.clone(),
            };
            diesel::insert_into(orientations::table)
                .values(&new_session)
                .execute(conn)?;

            let mut attendees = Vec::with_capacity(payload.candidate_ids.len());
            for candidate_id in &payload.candidate_ids {
                let candidate: Candidate = candidates::table
                    .find(candidate_id)
                    .first(conn)
                    .map_err(|err| match err {
                        diesel::result::Error::NotFound => {
                            AppError::bad_request("candidate does not exist")
                        }
                        other => AppError::from(other),
                    })?;

                diesel::insert_into(orientation_attendees::table)
                    .values(&NewOrientationAttendee {
                        orientation_id: new_session.id,
                        candidate_id: *candidate_id,
                        status: ATTENDEE_STATUS_SCHEDULED.to_string(),
                    })
                    .on_conflict_do_nothing()
                    .execute(conn)?;

                attendees.push(AttendeeSummary {
                    candidate_id: candidate.id,
                    name: candidate.name,
                    position: candidate.position,
                    status: ATTENDEE_STATUS_SCHEDULED.to_string(),
                });
            }

            let session: Orientation = orientations::table.find(new_session.id).first(conn)?;
            Ok((session, attendees))
        })?;

    info!(
        orientation_id = %session.id,
        attendee_count = attendees.len(),
        "orientation scheduled"
    );

    Ok((
        StatusCode::CREATED,
        Json(to_orientation_response(session, attendees)),
    ))
}

pub async fn list_orientations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<OrientationResponse>>> {
    user.require_role(&[ROLE_HR, ROLE_IT])?;

    let mut conn = state.db()?;
    let sessions: Vec<Orientation> = orientations::table
        .order((
            orientations::session_date.asc(),
            orientations::start_time.asc(),
        ))
        .load(&mut conn)?;

    let attendee_rows: Vec<(OrientationAttendee, String, String)> = orientation_attendees::table
        .inner_join(candidates::table)
        .select((
            orientation_attendees::all_columns,
            candidates::name,
            candidates::position,
        ))
        .load(&mut conn)?;

    let response = sessions
        .into_iter()
        .map(|session| {
            let attendees = attendee_rows
                .iter()
                .filter(|(attendee, _, _)| attendee.orientation_id == session.id)
                .map(|(attendee, name, position)| AttendeeSummary {
                    candidate_id: attendee.candidate_id,
                    name: name.clone(),
                    position: position.clone(),
                    status: attendee.status.clone(),
                })
                .collect();
            to_orientation_response(session, attendees)
        })
        .collect();

    Ok(Json(response))
}

/// Candidate view of their scheduled sessions, with the join window
/// computed server-side.
pub async fn list_candidate_orientations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(candidate_id): Path<Uuid>,
) -> AppResult<Json<Vec<CandidateOrientation>>> {
    let mut conn = state.db()?;
    let candidate: Candidate = candidates::table.find(candidate_id).first(&mut conn)?;
    ensure_candidate_access(&user, &candidate)?;

    let rows: Vec<(OrientationAttendee, Orientation)> = orientation_attendees::table
        .inner_join(orientations::table)
        .filter(orientation_attendees::candidate_id.eq(candidate_id))
        .select((orientation_attendees::all_columns, orientations::all_columns))
        .order((
            orientations::session_date.asc(),
            orientations::start_time.asc(),
        ))
        .load(&mut conn)?;

    let now = Utc::now().naive_utc();
    let response = rows
        .into_iter()
        .map(|(attendee, session)| {
            let (join_opens_at, join_closes_at) =
                join_window(session.session_date, session.start_time, session.end_time);
            CandidateOrientation {
                id: session.id,
                title: session.title,
                session_date: session.session_date,
                start_time: session.start_time,
                end_time: session.end_time,
                location: session.location,
                meeting_link: session.meeting_link,
                description: session.description,
                attendance_status: attendee.status,
                join_opens_at,
                join_closes_at,
                joinable: join_opens_at <= now && now <= join_closes_at,
            }
        })
        .collect();

    Ok(Json(response))
}

fn to_orientation_response(
    session: Orientation,
    attendees: Vec<AttendeeSummary>,
) -> OrientationResponse {
    OrientationResponse {
        id: session.id,
        title: session.title,
        session_date: session.session_date,
        start_time: session.start_time,
        end_time: session.end_time,
        location: session.location,
        meeting_link: session.meeting_link,
        description: session.description,
        attendees,
    }
}

fn join_window(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> (NaiveDateTime, NaiveDateTime) {
    let opens = date.and_time(start) - Duration::minutes(JOIN_WINDOW_LEAD_MINUTES);
    let closes = date.and_time(end);
    (opens, closes)
}
