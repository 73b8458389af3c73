use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use time::{Duration, OffsetDateTime};
use tracing::instrument;

use crate::auth::jwt::AuthUser;
use crate::auth::repo::User;
use crate::daily_log::dto::format_date;
use crate::daily_log::repo::DailyLogRow;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::Profile;

use super::dto::{
    clamp_window, DoctorReport, Patient, ProfileSection, ReportPeriod, ReportQuery,
    ReportSummary,
};
use super::services::{compute_averages, compute_weight_trend, summarize_day};

pub fn routes() -> Router<AppState> {
    Router::new().route("/reports/doctor", get(doctor_report))
}

/// Clinician-facing summary of the last N days: per-day nutrition, daily
/// averages, weight trend, and the health profile. Regenerated per request.
#[instrument(skip(state))]
pub async fn doctor_report(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<ReportQuery>,
) -> Result<Json<DoctorReport>, ApiError> {
    let days = clamp_window(query.days.as_deref());

    let now = OffsetDateTime::now_utc();
    let end_date = now.date();
    let start_date = end_date - Duration::days(days);

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;
    let profile = Profile::find_by_user(&state.db, user_id).await?;
    let rows = DailyLogRow::find_range(&state.db, user_id, start_date, end_date).await?;

    let daily_logs: Vec<_> = rows.iter().map(summarize_day).collect();
    let averages = compute_averages(&daily_logs);
    let weight_trend = compute_weight_trend(&daily_logs);
    let total_days_logged = daily_logs.iter().filter(|d| d.meals_count > 0).count();

    Ok(Json(DoctorReport {
        generated_at: now,
        report_period: ReportPeriod {
            start_date: format_date(start_date),
            end_date: format_date(end_date),
            days,
        },
        patient: Patient {
            name: user.name,
            email: user.email,
        },
        profile: profile.map(|p| ProfileSection {
            current_weight: p.current_weight,
            target_weight: p.target_weight,
            height: p.height,
            age: p.age,
            gender: p.gender,
            activity_level: p.activity_level,
            goal_type: p.goal_type,
            daily_calorie_target: p.daily_calories,
            dietary_preferences: p.dietary_prefs,
            allergies: p.allergies,
            medical_conditions: p.medical_conditions,
            medications: p.medications,
        }),
        summary: ReportSummary {
            total_days_logged,
            averages,
            weight_trend,
        },
        daily_logs,
    }))
}
