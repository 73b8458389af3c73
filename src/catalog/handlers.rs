use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use crate::auth::jwt::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

use super::{Dish, MealType};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodQuery {
    pub meal_type: Option<MealType>,
    pub country: Option<String>,
    #[serde(default)]
    pub vegetarian: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/foods", get(list_foods))
        .route("/foods/:id", get(get_food))
}

#[instrument(skip(state))]
pub async fn list_foods(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(query): Query<FoodQuery>,
) -> Json<Vec<Dish>> {
    let dishes = state
        .catalog
        .filter(query.meal_type, query.country.as_deref(), query.vegetarian)
        .into_iter()
        .cloned()
        .collect();
    Json(dishes)
}

#[instrument(skip(state))]
pub async fn get_food(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Dish>, ApiError> {
    state
        .catalog
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(ApiError::NotFound("Food not found"))
}
