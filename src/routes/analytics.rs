use std::collections::HashMap;

use axum::{extract::State, Json};
use chrono::{Datelike, NaiveDateTime, Utc};
use diesel::{dsl::count_star, prelude::*};
use serde::Serialize;

use crate::auth::{AuthenticatedUser, ROLE_HR};
use crate::error::AppResult;
use crate::lifecycle::CandidateStatus;
use crate::schema::{candidates, users};
use crate::state::AppState;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Serialize)]
pub struct AnalyticsResponse {
    pub stats: Stats,
    pub trend: Vec<TrendPoint>,
    pub departments: Vec<DepartmentRate>,
}

#[derive(Serialize)]
pub struct Stats {
    pub active_candidates: i64,
    pub pending_offers: i64,
    pub completed_onboarding: i64,
    pub user_count: i64,
}

#[derive(Serialize)]
pub struct TrendPoint {
    pub month: &'static str,
    pub completed: i64,
    pub pending: i64,
}

#[derive(Serialize)]
pub struct DepartmentRate {
    pub department: String,
    pub rate: i64,
}

pub async fn analytics(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<AnalyticsResponse>> {
    user.require_role(&[ROLE_HR])?;

    let mut conn = state.db()?;
    let rows: Vec<(String, String, NaiveDateTime)> = candidates::table
        .select((
            candidates::status,
            candidates::department,
            candidates::created_at,
        ))
        .load(&mut conn)?;
    let user_count: i64 = users::table.select(count_star()).first(&mut conn)?;

    let parsed: Vec<(CandidateStatus, String, NaiveDateTime)> = rows
        .into_iter()
        .map(|(status, department, created_at)| {
            Ok((status.parse::<CandidateStatus>()?, department, created_at))
        })
        .collect::<AppResult<Vec<_>>>()?;

    let active_candidates = parsed.len() as i64;
    let pending_offers = parsed
        .iter()
        .filter(|(status, _, _)| *status == CandidateStatus::OfferSent)
        .count() as i64;
    let completed_onboarding = parsed
        .iter()
        .filter(|(status, _, _)| counts_as_completed(*status))
        .count() as i64;

    let today = Utc::now().date_naive();
    let mut trend = Vec::with_capacity(6);
    for back in (0..6).rev() {
        let (year, month) = month_offset(today.year(), today.month(), back);
        let in_month = parsed
            .iter()
            .filter(|(_, _, created_at)| {
                created_at.year() == year && created_at.month() == month
            })
            .collect::<Vec<_>>();
        let completed = in_month
            .iter()
            .filter(|(status, _, _)| counts_as_completed(*status))
            .count() as i64;
        trend.push(TrendPoint {
            month: MONTH_NAMES[(month - 1) as usize],
            completed,
            pending: in_month.len() as i64 - completed,
        });
    }

    let mut per_department: HashMap<String, (i64, i64)> = HashMap::new();
    for (status, department, _) in &parsed {
        if department.is_empty() {
            continue;
        }
        let entry = per_department.entry(department.clone()).or_insert((0, 0));
        entry.0 += 1;
        if counts_as_completed(*status) {
            entry.1 += 1;
        }
    }
    let mut departments: Vec<DepartmentRate> = per_department
        .into_iter()
        .map(|(department, (total, completed))| DepartmentRate {
            department,
            rate: ((completed as f64 / total as f64) * 100.0).round() as i64,
        })
        .collect();
    departments.sort_by(|a, b| a.department.cmp(&b.department));

    Ok(Json(AnalyticsResponse {
        stats: Stats {
            active_candidates,
            pending_offers,
            completed_onboarding,
            user_count,
        },
        trend,
        departments,
    }))
}

fn counts_as_completed(status: CandidateStatus) -> bool {
    matches!(
        status,
        CandidateStatus::Completed | CandidateStatus::Provisioned
    )
}

/// Calendar month `back` months before (year, month).
fn month_offset(year: i32, month: u32, back: i32) -> (i32, u32) {
    let zero_based = year * 12 + month as i32 - 1 - back;
    (zero_based.div_euclid(12), (zero_based.rem_euclid(12) + 1) as u32)
}

#[cfg(test)]
mod tests {
    use super::month_offset;

    #[test]
    fn stays_within_year() {
        assert_eq!(month_offset(2025, 8, 2), (2025, 6));
        assert_eq!(month_offset(2025, 8, 0), (2025, 8));
    }

    #[test]
    fn wraps_into_previous_year() {
        assert_eq!(month_offset(2025, 2, 3), (2024, 11));
        assert_eq!(month_offset(2025, 1, 1), (2024, 12));
        assert_eq!(month_offset(2025, 12, 24), (2023, 12));
    }
}
