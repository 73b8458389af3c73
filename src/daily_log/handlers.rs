use anyhow::anyhow;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::{info, instrument};

use crate::auth::jwt::AuthUser;
use crate::error::{ApiError, Json};
use crate::state::AppState;
use crate::users::repo::Profile;

use super::dto::{
    format_date, resolve_date, DailyLogQuery, DailyLogResponse, DayFields, DeleteMealRequest,
    DeleteMealResponse, LogMealRequest, LogMealResponse, MealLogSummary, Mood,
    ToggleMealRequest, ToggleMealResponse, UpdateDailyLogRequest, UpdateDailyLogResponse,
    DEFAULT_CALORIE_TARGET,
};
use super::repo::DailyLogRow;
use super::services::{
    consumed_calories, meals_to_json, parse_meals, remove_meal, toggle_completion,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/daily-log", get(get_daily_log).patch(update_daily_log))
        .route(
            "/daily-log/meals",
            post(log_meal).patch(toggle_meal).delete(delete_meal),
        )
}

async fn calorie_target(state: &AppState, user_id: uuid::Uuid) -> Result<i32, ApiError> {
    let profile = Profile::find_by_user(&state.db, user_id).await?;
    Ok(profile
        .and_then(|p| p.daily_calories)
        .unwrap_or(DEFAULT_CALORIE_TARGET))
}

/// The day's log, or a synthesized empty one (no id) when nothing has been
/// written yet. Consumed calories are recomputed from the meal list on read.
#[instrument(skip(state))]
pub async fn get_daily_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<DailyLogQuery>,
) -> Result<Json<DailyLogResponse>, ApiError> {
    let date = resolve_date(query.date.as_deref())?;

    let Some(row) = DailyLogRow::find_by_date(&state.db, user_id, date).await? else {
        let target = calorie_target(&state, user_id).await?;
        return Ok(Json(DailyLogResponse {
            id: None,
            date: format_date(date),
            meals_logged: Default::default(),
            calories_consumed: 0,
            calories_target: target,
            water_intake: 0.0,
            weight: None,
            mood: None,
            notes: None,
            is_off_day: false,
        }));
    };

    let meals = parse_meals(Some(&row.meals_logged));
    let consumed = consumed_calories(&meals.meals);
    Ok(Json(DailyLogResponse {
        id: Some(row.id),
        date: format_date(row.date),
        meals_logged: meals,
        calories_consumed: consumed,
        calories_target: row.calories_target,
        water_intake: row.water_intake,
        weight: row.weight,
        mood: row.mood.as_deref().and_then(Mood::parse),
        notes: row.notes,
        is_off_day: row.is_off_day,
    }))
}

/// Upsert day-level fields. Creates the day's log on first write; absent
/// fields keep whatever is stored.
#[instrument(skip(state, payload))]
pub async fn update_daily_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateDailyLogRequest>,
) -> Result<Json<UpdateDailyLogResponse>, ApiError> {
    payload.validate()?;
    let date = resolve_date(payload.date.as_deref())?;
    let target = calorie_target(&state, user_id).await?;

    let row = DailyLogRow::upsert_day_fields(
        &state.db,
        user_id,
        date,
        target,
        payload.weight,
        payload.water_intake,
        payload.mood.map(Mood::as_str),
        payload.notes.as_deref(),
        payload.is_off_day,
    )
    .await?;

    Ok(Json(UpdateDailyLogResponse {
        success: true,
        daily_log: DayFields {
            id: row.id,
            date: format_date(row.date),
            weight: row.weight,
            water_intake: row.water_intake,
            mood: row.mood.as_deref().and_then(Mood::parse),
            notes: row.notes,
            is_off_day: row.is_off_day,
        },
    }))
}

/// Append a meal to the day's list, creating the log if needed. The row is
/// locked for the read-modify-write so concurrent additions both land.
#[instrument(skip(state, payload))]
pub async fn log_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<LogMealRequest>,
) -> Result<(StatusCode, Json<LogMealResponse>), ApiError> {
    payload.meal.validate()?;
    let date = resolve_date(payload.date.as_deref())?;
    let target = calorie_target(&state, user_id).await?;

    let mut tx = state.db.begin().await.map_err(anyhow::Error::from)?;
    DailyLogRow::ensure_exists(&mut tx, user_id, date, target).await?;
    let row = DailyLogRow::lock_for_update(&mut tx, user_id, date)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow!("daily log missing after ensure")))?;

    let mut meals = parse_meals(Some(&row.meals_logged));
    let entry = payload.meal.into_entry();
    meals.meals.push(entry.clone());
    let consumed = consumed_calories(&meals.meals);

    DailyLogRow::save_meals(&mut tx, row.id, &meals_to_json(&meals), consumed).await?;
    tx.commit().await.map_err(anyhow::Error::from)?;

    info!(user_id = %user_id, date = %format_date(date), meal = %entry.name, "meal logged");
    Ok((
        StatusCode::CREATED,
        Json(LogMealResponse {
            success: true,
            meal: entry,
            daily_log: MealLogSummary {
                id: row.id,
                date: format_date(date),
                calories_consumed: consumed,
                meals_count: meals.meals.len(),
            },
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn toggle_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ToggleMealRequest>,
) -> Result<Json<ToggleMealResponse>, ApiError> {
    let date = resolve_date(payload.date.as_deref())?;

    let mut tx = state.db.begin().await.map_err(anyhow::Error::from)?;
    let row = DailyLogRow::lock_for_update(&mut tx, user_id, date)
        .await?
        .ok_or(ApiError::NotFound("Daily log not found"))?;

    let mut meals = parse_meals(Some(&row.meals_logged));
    let meal = toggle_completion(&mut meals.meals, &payload.meal_id, payload.completed)
        .ok_or(ApiError::NotFound("Meal not found"))?;
    let consumed = consumed_calories(&meals.meals);

    DailyLogRow::save_meals(&mut tx, row.id, &meals_to_json(&meals), consumed).await?;
    tx.commit().await.map_err(anyhow::Error::from)?;

    Ok(Json(ToggleMealResponse {
        success: true,
        meal,
        calories_consumed: consumed,
    }))
}

#[instrument(skip(state, payload))]
pub async fn delete_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<DeleteMealRequest>,
) -> Result<Json<DeleteMealResponse>, ApiError> {
    let date = resolve_date(payload.date.as_deref())?;

    let mut tx = state.db.begin().await.map_err(anyhow::Error::from)?;
    let row = DailyLogRow::lock_for_update(&mut tx, user_id, date)
        .await?
        .ok_or(ApiError::NotFound("Daily log not found"))?;

    let mut meals = parse_meals(Some(&row.meals_logged));
    if !remove_meal(&mut meals.meals, &payload.meal_id) {
        return Err(ApiError::NotFound("Meal not found"));
    }
    let consumed = consumed_calories(&meals.meals);

    DailyLogRow::save_meals(&mut tx, row.id, &meals_to_json(&meals), consumed).await?;
    tx.commit().await.map_err(anyhow::Error::from)?;

    Ok(Json(DeleteMealResponse {
        success: true,
        calories_consumed: consumed,
        meals_count: meals.meals.len(),
    }))
}
