use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime};
use uuid::Uuid;

use crate::catalog::MealType;
use crate::error::{ApiError, FieldError};

/// Fallback daily calorie target when the profile has none.
pub const DEFAULT_CALORIE_TARGET: i32 = 2000;

pub const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[FormatItem<'static>] = format_description!("[hour]:[minute]");

lazy_static! {
    static ref DATE_RE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

/// Resolve an optional `YYYY-MM-DD` parameter to a calendar date, defaulting
/// to the current UTC day.
pub fn resolve_date(param: Option<&str>) -> Result<Date, ApiError> {
    let Some(s) = param else {
        return Ok(OffsetDateTime::now_utc().date());
    };
    if !DATE_RE.is_match(s) {
        return Err(ApiError::invalid("date", "Date must be in YYYY-MM-DD format"));
    }
    Date::parse(s, DATE_FORMAT)
        .map_err(|_| ApiError::invalid("date", "Date must be a valid calendar date"))
}

pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_default()
}

/// Current UTC time as `HH:MM`, the default for meals logged without a time.
pub fn current_time_hhmm() -> String {
    OffsetDateTime::now_utc()
        .time()
        .format(TIME_FORMAT)
        .unwrap_or_default()
}

/// How the day felt, self-reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Great,
    Good,
    Okay,
    Bad,
}

impl Mood {
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Great => "great",
            Mood::Good => "good",
            Mood::Okay => "okay",
            Mood::Bad => "bad",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "great" => Some(Mood::Great),
            "good" => Some(Mood::Good),
            "okay" => Some(Mood::Okay),
            "bad" => Some(Mood::Bad),
            _ => None,
        }
    }
}

/// One logged food item within a day. Embedded in the daily log's JSONB
/// meal list, never a standalone row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_id: Option<String>,
    pub name: String,
    pub meal_type: MealType,
    pub calories: f64,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
    #[serde(default)]
    pub fats: Option<f64>,
    #[serde(default)]
    pub fiber: Option<f64>,
    #[serde(default = "default_serving_size")]
    pub serving_size: f64,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_completed")]
    pub completed: bool,
}

fn default_serving_size() -> f64 {
    1.0
}

fn default_completed() -> bool {
    true
}

/// The typed shape of the `meals_logged` JSONB column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MealsLogged {
    #[serde(default)]
    pub meals: Vec<MealEntry>,
}

/// Client-supplied meal entry; id and time are generated when absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealEntryInput {
    pub id: Option<String>,
    pub food_id: Option<String>,
    pub name: String,
    pub meal_type: MealType,
    pub calories: f64,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fats: Option<f64>,
    pub fiber: Option<f64>,
    #[serde(default = "default_serving_size")]
    pub serving_size: f64,
    pub time: Option<String>,
    pub notes: Option<String>,
    #[serde(default = "default_completed")]
    pub completed: bool,
}

impl MealEntryInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if self.name.is_empty() {
            errors.push(FieldError::new("meal.name", "Meal name is required"));
        } else if self.name.len() > 200 {
            errors.push(FieldError::new("meal.name", "Meal name is too long"));
        }
        if !(0.0..=10_000.0).contains(&self.calories) {
            errors.push(FieldError::new(
                "meal.calories",
                "Calories must be between 0 and 10000",
            ));
        }
        for (field, value, max) in [
            ("meal.protein", self.protein, 500.0),
            ("meal.carbs", self.carbs, 1000.0),
            ("meal.fats", self.fats, 500.0),
            ("meal.fiber", self.fiber, 100.0),
        ] {
            if let Some(v) = value {
                if !(0.0..=max).contains(&v) {
                    errors.push(FieldError::new(field, "Value out of range"));
                }
            }
        }
        if !(0.1..=10.0).contains(&self.serving_size) {
            errors.push(FieldError::new(
                "meal.servingSize",
                "Serving size must be between 0.1 and 10",
            ));
        }
        if let Some(notes) = &self.notes {
            if notes.len() > 500 {
                errors.push(FieldError::new("meal.notes", "Notes are too long"));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }

    /// Materialize the entry, filling in a generated id and the current
    /// time when the client omitted them.
    pub fn into_entry(self) -> MealEntry {
        MealEntry {
            id: self
                .id
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            food_id: self.food_id,
            name: self.name,
            meal_type: self.meal_type,
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fats: self.fats,
            fiber: self.fiber,
            serving_size: self.serving_size,
            time: Some(self.time.unwrap_or_else(current_time_hhmm)),
            notes: self.notes,
            completed: self.completed,
        }
    }
}

// --- request bodies ---

#[derive(Debug, Deserialize)]
pub struct LogMealRequest {
    pub date: Option<String>,
    pub meal: MealEntryInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDailyLogRequest {
    pub date: Option<String>,
    pub weight: Option<f64>,
    pub water_intake: Option<f64>,
    pub mood: Option<Mood>,
    pub notes: Option<String>,
    pub is_off_day: Option<bool>,
}

impl UpdateDailyLogRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if let Some(w) = self.weight {
            if !(20.0..=500.0).contains(&w) {
                errors.push(FieldError::new("weight", "Weight must be between 20 and 500"));
            }
        }
        if let Some(w) = self.water_intake {
            if !(0.0..=50.0).contains(&w) {
                errors.push(FieldError::new(
                    "waterIntake",
                    "Water intake must be between 0 and 50",
                ));
            }
        }
        if let Some(notes) = &self.notes {
            if notes.len() > 1000 {
                errors.push(FieldError::new("notes", "Notes are too long"));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleMealRequest {
    pub date: Option<String>,
    pub meal_id: String,
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMealRequest {
    pub date: Option<String>,
    pub meal_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DailyLogQuery {
    pub date: Option<String>,
}

// --- response bodies ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub date: String,
    pub meals_logged: MealsLogged,
    pub calories_consumed: i32,
    pub calories_target: i32,
    pub water_intake: f64,
    pub weight: Option<f64>,
    pub mood: Option<Mood>,
    pub notes: Option<String>,
    pub is_off_day: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayFields {
    pub id: Uuid,
    pub date: String,
    pub weight: Option<f64>,
    pub water_intake: f64,
    pub mood: Option<Mood>,
    pub notes: Option<String>,
    pub is_off_day: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDailyLogResponse {
    pub success: bool,
    pub daily_log: DayFields,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealLogSummary {
    pub id: Uuid,
    pub date: String,
    pub calories_consumed: i32,
    pub meals_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMealResponse {
    pub success: bool,
    pub meal: MealEntry,
    pub daily_log: MealLogSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleMealResponse {
    pub success: bool,
    pub meal: MealEntry,
    pub calories_consumed: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMealResponse {
    pub success: bool,
    pub calories_consumed: i32,
    pub meals_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    fn meal_input(name: &str) -> MealEntryInput {
        MealEntryInput {
            id: None,
            food_id: None,
            name: name.into(),
            meal_type: MealType::Breakfast,
            calories: 300.0,
            protein: None,
            carbs: None,
            fats: None,
            fiber: None,
            serving_size: 1.0,
            time: None,
            notes: None,
            completed: true,
        }
    }

    #[test]
    fn resolve_date_accepts_valid_dates() {
        let date = resolve_date(Some("2024-01-10")).unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), Month::January);
        assert_eq!(date.day(), 10);
        assert_eq!(format_date(date), "2024-01-10");
    }

    #[test]
    fn resolve_date_rejects_malformed_input() {
        for bad in ["10-01-2024", "2024/01/10", "2024-1-1", "2024-13-40", "today"] {
            assert!(resolve_date(Some(bad)).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn resolve_date_defaults_to_today() {
        let date = resolve_date(None).unwrap();
        assert_eq!(date, OffsetDateTime::now_utc().date());
    }

    #[test]
    fn meal_input_defaults_are_applied() {
        let json = r#"{"name":"Oats","mealType":"breakfast","calories":300}"#;
        let input: MealEntryInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.serving_size, 1.0);
        assert!(input.completed);

        let entry = input.into_entry();
        assert!(!entry.id.is_empty());
        assert!(entry.time.is_some());
    }

    #[test]
    fn meal_input_keeps_supplied_id_and_time() {
        let mut input = meal_input("Oats");
        input.id = Some("meal-1".into());
        input.time = Some("08:30".into());
        let entry = input.into_entry();
        assert_eq!(entry.id, "meal-1");
        assert_eq!(entry.time.as_deref(), Some("08:30"));
    }

    #[test]
    fn meal_input_range_validation() {
        let mut input = meal_input("Feast");
        input.calories = 20_000.0;
        input.serving_size = 11.0;
        let err = input.validate().unwrap_err();
        match err {
            ApiError::Validation(details) => {
                let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
                assert!(fields.contains(&"meal.calories"));
                assert!(fields.contains(&"meal.servingSize"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn update_request_validation() {
        let req = UpdateDailyLogRequest {
            date: None,
            weight: Some(600.0),
            water_intake: Some(51.0),
            mood: None,
            notes: None,
            is_off_day: None,
        };
        assert!(req.validate().is_err());

        let req = UpdateDailyLogRequest {
            date: None,
            weight: Some(82.5),
            water_intake: Some(8.0),
            mood: Some(Mood::Good),
            notes: Some("felt fine".into()),
            is_off_day: Some(false),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn mood_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Mood::Great).unwrap(), r#""great""#);
        assert_eq!(Mood::parse("okay"), Some(Mood::Okay));
        assert_eq!(Mood::parse("meh"), None);
    }
}
