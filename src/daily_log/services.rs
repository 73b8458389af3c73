use serde_json::Value;

use super::dto::{MealEntry, MealsLogged};

/// Decode the stored meal list. Malformed or missing JSON degrades to an
/// empty list rather than failing the request.
pub fn parse_meals(raw: Option<&Value>) -> MealsLogged {
    raw.cloned()
        .map(|v| serde_json::from_value(v).unwrap_or_default())
        .unwrap_or_default()
}

pub fn meals_to_json(meals: &MealsLogged) -> Value {
    serde_json::to_value(meals).unwrap_or_else(|_| serde_json::json!({ "meals": [] }))
}

/// Total calories for the day: the sum of calories x serving size over
/// completed meals, rounded to the nearest whole calorie.
pub fn consumed_calories(meals: &[MealEntry]) -> i32 {
    meals
        .iter()
        .filter(|m| m.completed)
        .map(|m| m.calories * m.serving_size)
        .sum::<f64>()
        .round() as i32
}

/// Flip a meal's completed flag. Returns the updated entry, or `None` when
/// no meal has the given id.
pub fn toggle_completion(meals: &mut [MealEntry], meal_id: &str, completed: bool) -> Option<MealEntry> {
    let meal = meals.iter_mut().find(|m| m.id == meal_id)?;
    meal.completed = completed;
    Some(meal.clone())
}

/// Remove a meal by id. Returns whether anything was removed.
pub fn remove_meal(meals: &mut Vec<MealEntry>, meal_id: &str) -> bool {
    let before = meals.len();
    meals.retain(|m| m.id != meal_id);
    meals.len() < before
}
