use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub full_name: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = candidates)]
pub struct Candidate {
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
    pub status: String,
    pub sent_offer_letter: bool,
    pub offer_letter_key: Option<String>,
    pub signed_offer_key: Option<String>,
    pub offer_acceptance_status: String,
    pub rejection_reason: Option<String>,
    pub credentials_created: bool,
    pub company_email: Option<String>,
    pub provisioned_at: Option<NaiveDateTime>,
    pub assigned_assets_summary: serde_json::Value,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = candidates)]
pub struct NewCandidate {
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
    pub status: String,
    pub offer_acceptance_status: String,
    pub assigned_assets_summary: serde_json::Value,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = candidate_documents)]
#[diesel(belongs_to(Candidate))]
pub struct CandidateDocument {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub document_type: String,
    pub file_path: String,
    pub original_name: String,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub superseded_at: Option<NaiveDateTime>,
    pub uploaded_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = candidate_documents)]
pub struct NewCandidateDocument {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub document_type: String,
    pub file_path: String,
    pub original_name: String,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = assets)]
pub struct Asset {
    pub id: Uuid,
    pub name: String,
    pub asset_type: String,
    pub serial_number: String,
    pub status: String,
    pub assigned_to: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = assets)]
pub struct NewAsset {
    pub id: Uuid,
    pub name: String,
    pub asset_type: String,
    pub serial_number: String,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = orientations)]
pub struct Orientation {
    pub id: Uuid,
    pub title: String,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orientations)]
pub struct NewOrientation {
    pub id: Uuid,
    pub title: String,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Queryable, Associations)]
#[diesel(table_name = orientation_attendees)]
#[diesel(belongs_to(Orientation))]
#[diesel(belongs_to(Candidate))]
#[diesel(primary_key(orientation_id, candidate_id))]
pub struct OrientationAttendee {
    pub orientation_id: Uuid,
    pub candidate_id: Uuid,
    pub status: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orientation_attendees)]
pub struct NewOrientationAttendee {
    pub orientation_id: Uuid,
    pub candidate_id: Uuid,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = notifications)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_role: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub id: Uuid,
    pub recipient_role: String,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = refresh_tokens)]
#[diesel(belongs_to(User))]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub revoked_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}
