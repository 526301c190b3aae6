use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDateTime;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{NewNotification, Notification};
use crate::schema::notifications;
use crate::state::AppState;

#[derive(Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: NaiveDateTime,
}

/// Fire-and-forget message to everyone holding a role. Callers invoke
/// this inside the transaction that produced the event.
pub(crate) fn notify_role(
    conn: &mut PgConnection,
    role: &str,
    title: &str,
    message: &str,
) -> QueryResult<()> {
    diesel::insert_into(notifications::table)
        .values(&NewNotification {
            id: Uuid::new_v4(),
            recipient_role: role.to_string(),
            title: title.to_string(),
            message: message.to_string(),
        })
        .execute(conn)?;
    Ok(())
}

pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<NotificationResponse>>> {
    let mut conn = state.db()?;
    let rows: Vec<Notification> = notifications::table
        .filter(notifications::recipient_role.eq(&user.role))
        .order(notifications::created_at.desc())
        .load(&mut conn)?;

    let response = rows
        .into_iter()
        .map(|row| NotificationResponse {
            id: row.id,
            title: row.title,
            message: row.message,
            read: row.read,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(response))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(notification_id): Path<Uuid>,
) -> AppResult<Json<NotificationResponse>> {
    let mut conn = state.db()?;

    let updated = diesel::update(
        notifications::table
            .find(notification_id)
            .filter(notifications::recipient_role.eq(&user.role)),
    )
    .set(notifications::read.eq(true))
    .execute(&mut conn)?;

    if updated == 0 {
        return Err(AppError::not_found());
    }

    let row: Notification = notifications::table.find(notification_id).first(&mut conn)?;
    Ok(Json(NotificationResponse {
        id: row.id,
        title: row.title,
        message: row.message,
        read: row.read,
        created_at: row.created_at,
    }))
}
