use anyhow::Context;
use axum::Router;
use serde::{Deserialize, Serialize};

pub mod handlers;

use crate::state::AppState;

/// Meal slot a dish or logged entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

/// Text in the three supported locales. Locale resolution is a client
/// concern; the API always returns the full set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    pub sw: String,
    pub lg: String,
}

/// One regional dish with per-serving nutrition facts. Reference data only,
/// never mutated at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    pub id: String,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub country: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub fiber: f64,
    pub benefits: Vec<String>,
    pub meal_type: MealType,
    pub prep_time: u32,
    pub ingredients: Vec<String>,
    pub is_vegetarian: bool,
    pub is_vegan: bool,
}

static DISHES_JSON: &str = include_str!("dishes.json");

/// Immutable East African dish table, loaded once at process start.
pub struct FoodCatalog {
    dishes: Vec<Dish>,
}

impl FoodCatalog {
    pub fn load() -> anyhow::Result<Self> {
        let dishes: Vec<Dish> =
            serde_json::from_str(DISHES_JSON).context("parse embedded dish data")?;
        Ok(Self { dishes })
    }

    pub fn dishes(&self) -> &[Dish] {
        &self.dishes
    }

    pub fn get(&self, id: &str) -> Option<&Dish> {
        self.dishes.iter().find(|d| d.id == id)
    }

    pub fn filter(
        &self,
        meal_type: Option<MealType>,
        country: Option<&str>,
        vegetarian_only: bool,
    ) -> Vec<&Dish> {
        self.dishes
            .iter()
            .filter(|d| meal_type.map_or(true, |mt| d.meal_type == mt))
            .filter(|d| country.map_or(true, |c| d.country.eq_ignore_ascii_case(c)))
            .filter(|d| !vegetarian_only || d.is_vegetarian)
            .collect()
    }
}

pub fn router() -> Router<AppState> {
    handlers::routes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_parses() {
        let catalog = FoodCatalog::load().expect("catalog loads");
        assert!(!catalog.dishes().is_empty());
    }

    #[test]
    fn dish_ids_are_unique() {
        let catalog = FoodCatalog::load().unwrap();
        let mut ids: Vec<&str> = catalog.dishes().iter().map(|d| d.id.as_str()).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn lookup_by_id() {
        let catalog = FoodCatalog::load().unwrap();
        let dish = catalog.get("ug-matooke").expect("matooke exists");
        assert_eq!(dish.country, "Uganda");
        assert_eq!(dish.calories, 220.0);
        assert!(dish.is_vegan);
        assert!(catalog.get("no-such-dish").is_none());
    }

    #[test]
    fn filters_compose() {
        let catalog = FoodCatalog::load().unwrap();
        let kenyan_veg = catalog.filter(None, Some("Kenya"), true);
        assert!(!kenyan_veg.is_empty());
        assert!(kenyan_veg.iter().all(|d| d.country == "Kenya" && d.is_vegetarian));

        let breakfasts = catalog.filter(Some(MealType::Breakfast), None, false);
        assert!(breakfasts.iter().all(|d| d.meal_type == MealType::Breakfast));
    }
}
