use axum::{extract::State, routing::get, Router};
use time::OffsetDateTime;
use tracing::{info, instrument};

use crate::auth::jwt::AuthUser;
use crate::error::{ApiError, Json};
use crate::state::AppState;

use super::dto::{ProfileResponse, SubscriptionResponse, UpdateProfileRequest};
use super::repo::{Profile, ProfileChanges};
use super::services::derive_daily_target;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user/subscription", get(get_subscription))
        .route("/user/profile", get(get_profile).put(update_profile))
}

#[instrument(skip(state))]
pub async fn get_subscription(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let mut profile = Profile::find_by_user(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound("Profile not found"))?;

    // Lazy expiry: trials lapse on read once past their end date.
    if profile.subscription_status == "trial"
        && OffsetDateTime::now_utc() > profile.trial_end_date
    {
        Profile::set_subscription_status(&state.db, user_id, "expired").await?;
        profile.subscription_status = "expired".into();
        info!(user_id = %user_id, "trial expired");
    }

    Ok(Json(SubscriptionResponse {
        trial_start_date: profile.trial_start_date,
        trial_end_date: profile.trial_end_date,
        subscription_status: profile.subscription_status,
        subscription_plan: profile.subscription_plan,
        subscription_end_date: profile.subscription_end_date,
    }))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = Profile::find_by_user(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound("Profile not found"))?;
    Ok(Json(to_response(profile)))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    payload.validate()?;

    let changes = ProfileChanges {
        current_weight: payload.current_weight,
        target_weight: payload.target_weight,
        height: payload.height,
        age: payload.age,
        gender: payload.gender.map(|g| g.as_str().to_string()),
        activity_level: payload.activity_level.map(|a| a.as_str().to_string()),
        goal_type: payload.goal_type.map(|g| g.as_str().to_string()),
        dietary_prefs: payload.dietary_prefs,
        allergies: payload.allergies,
        medical_conditions: payload.medical_conditions,
        medications: payload.medications,
    };

    let mut profile = Profile::apply_changes(&state.db, user_id, &changes)
        .await?
        .ok_or(ApiError::NotFound("Profile not found"))?;

    // Recompute the calorie target whenever the baseline is complete enough.
    if let Some(target) = derive_daily_target(&profile) {
        if profile.daily_calories != Some(target) {
            Profile::set_daily_calories(&state.db, user_id, target).await?;
            profile.daily_calories = Some(target);
            info!(user_id = %user_id, target, "daily calorie target recomputed");
        }
    }

    Ok(Json(to_response(profile)))
}

fn to_response(profile: Profile) -> ProfileResponse {
    ProfileResponse {
        current_weight: profile.current_weight,
        target_weight: profile.target_weight,
        height: profile.height,
        age: profile.age,
        gender: profile.gender,
        activity_level: profile.activity_level,
        goal_type: profile.goal_type,
        daily_calories: profile.daily_calories,
        dietary_prefs: profile.dietary_prefs,
        allergies: profile.allergies,
        medical_conditions: profile.medical_conditions,
        medications: profile.medications,
    }
}
