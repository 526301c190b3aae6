mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_vec, TestApp};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Deserialize)]
struct CandidateInfo {
    id: Uuid,
    status: String,
    progress: String,
    sent_offer_letter: bool,
    offer_acceptance_status: String,
    rejection_reason: Option<String>,
    credentials_created: bool,
    company_email: Option<String>,
}

#[derive(Deserialize)]
struct NotificationInfo {
    id: Uuid,
    title: String,
    message: String,
    read: bool,
}

async fn create_candidate(app: &TestApp, token: &str, email: &str) -> Result<CandidateInfo> {
    let response = app
        .post_json(
            "/api/candidates",
            &json!({
                "name": "Priya Nair",
                "personal_email": email,
                "position": "Backend Engineer",
                "department": "Engineering",
            }),
            Some(token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_to_vec(response.into_body()).await?;
    Ok(serde_json::from_slice(&body)?)
}

async fn fetch_candidate(app: &TestApp, token: &str, id: Uuid) -> Result<CandidateInfo> {
    let response = app
        .get(&format!("/api/candidates/{id}"), Some(token))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_vec(response.into_body()).await?;
    Ok(serde_json::from_slice(&body)?)
}

#[tokio::test]
async fn offer_then_provisioning_completes_onboarding() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("hr@corp.example", "hr-pass1", "HR").await?;
    app.insert_user("it@corp.example", "it-pass1", "IT").await?;
    let hr_token = app.login_token("hr@corp.example", "hr-pass1").await?;
    let it_token = app.login_token("it@corp.example", "it-pass1").await?;

    let candidate = create_candidate(&app, &hr_token, "priya@personal.example").await?;
    assert_eq!(candidate.status, "Applied");
    assert_eq!(candidate.progress, "pending");
    assert_eq!(candidate.offer_acceptance_status, "none");
    assert!(!candidate.sent_offer_letter);

    let sent = app
        .upload_file(
            &format!("/api/candidates/{}/offer", candidate.id),
            "offer.pdf",
            "application/pdf",
            b"offer letter body",
            &[],
            &hr_token,
        )
        .await?;
    assert_eq!(sent.status(), StatusCode::OK);
    let body = body_to_vec(sent.into_body()).await?;
    let after_offer: CandidateInfo = serde_json::from_slice(&body)?;
    assert_eq!(after_offer.status, "Offer Sent");
    assert!(after_offer.sent_offer_letter);
    assert_eq!(after_offer.progress, "in_progress");
    assert_eq!(app.offer_storage().object_count().await, 1);

    let provisioned = app
        .post_json(
            &format!("/api/candidates/{}/provision", candidate.id),
            &json!({
                "company_email": "priya.nair@corp.example",
                "company_password": "initial-password-1",
            }),
            Some(&it_token),
        )
        .await?;
    assert_eq!(provisioned.status(), StatusCode::CREATED);
    let body = body_to_vec(provisioned.into_body()).await?;
    let after_provision: CandidateInfo = serde_json::from_slice(&body)?;
    assert_eq!(after_provision.status, "Completed");
    assert!(after_provision.credentials_created);
    assert_eq!(
        after_provision.company_email.as_deref(),
        Some("priya.nair@corp.example")
    );
    assert_eq!(after_provision.progress, "completed");

    // The provisioned identity can log in with the issued credentials.
    let candidate_token = app
        .login_token("priya.nair@corp.example", "initial-password-1")
        .await?;
    let own = app.get("/api/candidates/me", Some(&candidate_token)).await?;
    assert_eq!(own.status(), StatusCode::OK);
    let body = body_to_vec(own.into_body()).await?;
    let own: CandidateInfo = serde_json::from_slice(&body)?;
    assert_eq!(own.id, candidate.id);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn provisioning_before_offer_converges_on_completed() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("hr@corp.example", "hr-pass1", "HR").await?;
    app.insert_user("it@corp.example", "it-pass1", "IT").await?;
    let hr_token = app.login_token("hr@corp.example", "hr-pass1").await?;
    let it_token = app.login_token("it@corp.example", "it-pass1").await?;

    let candidate = create_candidate(&app, &hr_token, "arun@personal.example").await?;

    let provisioned = app
        .post_json(
            &format!("/api/candidates/{}/provision", candidate.id),
            &json!({ "company_email": "arun@corp.example" }),
            Some(&it_token),
        )
        .await?;
    assert_eq!(provisioned.status(), StatusCode::CREATED);
    let body = body_to_vec(provisioned.into_body()).await?;
    let after_provision: CandidateInfo = serde_json::from_slice(&body)?;
    assert_eq!(after_provision.status, "Provisioned");
    assert_eq!(after_provision.progress, "in_progress");

    let sent = app
        .upload_file(
            &format!("/api/candidates/{}/offer", candidate.id),
            "offer.pdf",
            "application/pdf",
            b"offer letter body",
            &[],
            &hr_token,
        )
        .await?;
    assert_eq!(sent.status(), StatusCode::OK);
    let body = body_to_vec(sent.into_body()).await?;
    let after_offer: CandidateInfo = serde_json::from_slice(&body)?;
    assert_eq!(after_offer.status, "Completed");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn provisioning_twice_is_idempotent() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("hr@corp.example", "hr-pass1", "HR").await?;
    app.insert_user("it@corp.example", "it-pass1", "IT").await?;
    let hr_token = app.login_token("hr@corp.example", "hr-pass1").await?;
    let it_token = app.login_token("it@corp.example", "it-pass1").await?;

    let candidate = create_candidate(&app, &hr_token, "mira@personal.example").await?;

    let payload = json!({ "company_email": "mira@corp.example" });
    let first = app
        .post_json(
            &format!("/api/candidates/{}/provision", candidate.id),
            &payload,
            Some(&it_token),
        )
        .await?;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .post_json(
            &format!("/api/candidates/{}/provision", candidate.id),
            &payload,
            Some(&it_token),
        )
        .await?;
    assert_eq!(second.status(), StatusCode::OK);
    let body = body_to_vec(second.into_body()).await?;
    let after: CandidateInfo = serde_json::from_slice(&body)?;
    assert!(after.credentials_created);

    let login_count: i64 = app
        .with_conn(|conn| {
            use diesel::prelude::*;
            use onboard_backend::schema::users::dsl::*;
            Ok(users
                .filter(username.eq("mira@corp.example"))
                .count()
                .get_result(conn)?)
        })
        .await?;
    assert_eq!(login_count, 1);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn accepting_an_offer_is_idempotent() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("hr@corp.example", "hr-pass1", "HR").await?;
    app.insert_user("tara@personal.example", "cand-pass1", "CANDIDATE")
        .await?;
    let hr_token = app.login_token("hr@corp.example", "hr-pass1").await?;
    let candidate_token = app
        .login_token("tara@personal.example", "cand-pass1")
        .await?;

    let candidate = create_candidate(&app, &hr_token, "tara@personal.example").await?;

    let sent = app
        .upload_file(
            &format!("/api/candidates/{}/offer", candidate.id),
            "offer.pdf",
            "application/pdf",
            b"offer letter body",
            &[],
            &hr_token,
        )
        .await?;
    assert_eq!(sent.status(), StatusCode::OK);

    let accepted = app
        .upload_file(
            &format!("/api/candidates/{}/offer/accept", candidate.id),
            "signed.pdf",
            "application/pdf",
            b"signed copy",
            &[],
            &candidate_token,
        )
        .await?;
    assert_eq!(accepted.status(), StatusCode::OK);
    let body = body_to_vec(accepted.into_body()).await?;
    let after_accept: CandidateInfo = serde_json::from_slice(&body)?;
    assert_eq!(after_accept.offer_acceptance_status, "accepted");
    assert_eq!(app.offer_storage().object_count().await, 2);

    // Second accept is a no-op: no extra file, no extra notification.
    let again = app
        .upload_file(
            &format!("/api/candidates/{}/offer/accept", candidate.id),
            "signed.pdf",
            "application/pdf",
            b"signed copy again",
            &[],
            &candidate_token,
        )
        .await?;
    assert_eq!(again.status(), StatusCode::OK);
    let body = body_to_vec(again.into_body()).await?;
    let after_again: CandidateInfo = serde_json::from_slice(&body)?;
    assert_eq!(after_again.offer_acceptance_status, "accepted");
    assert_eq!(app.offer_storage().object_count().await, 2);

    let response = app.get("/api/notifications", Some(&hr_token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_vec(response.into_body()).await?;
    let notifications: Vec<NotificationInfo> = serde_json::from_slice(&body)?;
    let accept_notices: Vec<_> = notifications
        .iter()
        .filter(|n| n.title == "Offer accepted")
        .collect();
    assert_eq!(accept_notices.len(), 1);
    assert!(accept_notices[0].message.contains("Priya Nair"));
    assert!(!accept_notices[0].read);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn rejecting_an_offer_allows_a_resend() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("hr@corp.example", "hr-pass1", "HR").await?;
    app.insert_user("dev@personal.example", "cand-pass1", "CANDIDATE")
        .await?;
    let hr_token = app.login_token("hr@corp.example", "hr-pass1").await?;
    let candidate_token = app.login_token("dev@personal.example", "cand-pass1").await?;

    let candidate = create_candidate(&app, &hr_token, "dev@personal.example").await?;

    let sent = app
        .upload_file(
            &format!("/api/candidates/{}/offer", candidate.id),
            "offer.pdf",
            "application/pdf",
            b"offer letter body",
            &[],
            &hr_token,
        )
        .await?;
    assert_eq!(sent.status(), StatusCode::OK);

    let rejected = app
        .post_json(
            &format!("/api/candidates/{}/offer/reject", candidate.id),
            &json!({ "reason": "relocation constraints" }),
            Some(&candidate_token),
        )
        .await?;
    assert_eq!(rejected.status(), StatusCode::OK);
    let body = body_to_vec(rejected.into_body()).await?;
    let after_reject: CandidateInfo = serde_json::from_slice(&body)?;
    assert_eq!(after_reject.offer_acceptance_status, "rejected");
    assert_eq!(
        after_reject.rejection_reason.as_deref(),
        Some("relocation constraints")
    );
    assert!(!after_reject.sent_offer_letter);

    let response = app.get("/api/notifications", Some(&hr_token)).await?;
    let body = body_to_vec(response.into_body()).await?;
    let notifications: Vec<NotificationInfo> = serde_json::from_slice(&body)?;
    assert!(notifications.iter().any(|n| n.title == "Offer rejected"
        && n.message.contains("relocation constraints")));

    // HR can mark the notification handled.
    let notice_id = notifications
        .iter()
        .find(|n| n.title == "Offer rejected")
        .map(|n| n.id)
        .expect("rejection notification");
    let marked = app
        .post_empty(&format!("/api/notifications/{notice_id}/read"), Some(&hr_token))
        .await?;
    assert_eq!(marked.status(), StatusCode::OK);

    // A fresh offer resets the decision.
    let resent = app
        .upload_file(
            &format!("/api/candidates/{}/offer", candidate.id),
            "offer-v2.pdf",
            "application/pdf",
            b"improved offer",
            &[],
            &hr_token,
        )
        .await?;
    assert_eq!(resent.status(), StatusCode::OK);
    let refreshed = fetch_candidate(&app, &hr_token, candidate.id).await?;
    assert!(refreshed.sent_offer_letter);
    assert_eq!(refreshed.offer_acceptance_status, "none");
    assert_eq!(refreshed.rejection_reason, None);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn accept_without_an_outstanding_offer_fails() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("hr@corp.example", "hr-pass1", "HR").await?;
    app.insert_user("neha@personal.example", "cand-pass1", "CANDIDATE")
        .await?;
    let hr_token = app.login_token("hr@corp.example", "hr-pass1").await?;
    let candidate_token = app
        .login_token("neha@personal.example", "cand-pass1")
        .await?;

    let candidate = create_candidate(&app, &hr_token, "neha@personal.example").await?;

    let accepted = app
        .upload_file(
            &format!("/api/candidates/{}/offer/accept", candidate.id),
            "signed.pdf",
            "application/pdf",
            b"signed copy",
            &[],
            &candidate_token,
        )
        .await?;
    assert_eq!(accepted.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn offer_download_returns_presigned_url() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("hr@corp.example", "hr-pass1", "HR").await?;
    let hr_token = app.login_token("hr@corp.example", "hr-pass1").await?;

    let candidate = create_candidate(&app, &hr_token, "ivan@personal.example").await?;

    let missing = app
        .get(
            &format!("/api/candidates/{}/offer/download", candidate.id),
            Some(&hr_token),
        )
        .await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let sent = app
        .upload_file(
            &format!("/api/candidates/{}/offer", candidate.id),
            "offer.pdf",
            "application/pdf",
            b"offer letter body",
            &[],
            &hr_token,
        )
        .await?;
    assert_eq!(sent.status(), StatusCode::OK);

    let download = app
        .get(
            &format!("/api/candidates/{}/offer/download", candidate.id),
            Some(&hr_token),
        )
        .await?;
    assert_eq!(download.status(), StatusCode::OK);
    let body = body_to_vec(download.into_body()).await?;
    let payload: serde_json::Value = serde_json::from_slice(&body)?;
    let url = payload["url"].as_str().expect("download url");
    assert!(url.starts_with("https://fake-storage/"));
    assert!(url.contains(&candidate.id.to_string()));

    app.cleanup().await?;
    Ok(())
}
