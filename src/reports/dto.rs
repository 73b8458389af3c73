use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::catalog::MealType;

pub const MIN_REPORT_DAYS: i64 = 7;
pub const MAX_REPORT_DAYS: i64 = 90;
pub const DEFAULT_REPORT_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub days: Option<String>,
}

/// Clamp the requested window to [7, 90] days; anything unparseable falls
/// back to the 30-day default.
pub fn clamp_window(param: Option<&str>) -> i64 {
    param
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(DEFAULT_REPORT_DAYS)
        .clamp(MIN_REPORT_DAYS, MAX_REPORT_DAYS)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPeriod {
    pub start_date: String,
    pub end_date: String,
    pub days: i64,
}

#[derive(Debug, Serialize)]
pub struct Patient {
    pub name: Option<String>,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSection {
    pub current_weight: Option<f64>,
    pub target_weight: Option<f64>,
    pub height: Option<f64>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub activity_level: Option<String>,
    pub goal_type: Option<String>,
    pub daily_calorie_target: Option<i32>,
    pub dietary_preferences: Vec<String>,
    pub allergies: Vec<String>,
    pub medical_conditions: Vec<String>,
    pub medications: Vec<String>,
}

/// Nutrient totals for one day, each rounded to a whole unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayNutrition {
    pub calories: i64,
    pub protein: i64,
    pub carbs: i64,
    pub fats: i64,
    pub fiber: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealSummary {
    pub name: String,
    pub meal_type: MealType,
    pub calories: i64,
    pub time: Option<String>,
}

/// One day of the report, derived entirely from completed meals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDay {
    pub date: String,
    pub weight: Option<f64>,
    pub water_intake: f64,
    pub mood: Option<String>,
    pub is_off_day: bool,
    pub meals_count: usize,
    pub nutrition: DayNutrition,
    pub meals: Vec<MealSummary>,
}

/// Daily averages over days that logged at least one completed meal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Averages {
    pub daily_calories: i64,
    pub daily_protein: i64,
    pub daily_carbs: i64,
    pub daily_fats: i64,
    pub daily_fiber: i64,
    pub daily_water: f64,
    pub meals_per_day: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightTrend {
    pub start_weight: f64,
    pub end_weight: f64,
    pub change: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_days_logged: usize,
    pub averages: Option<Averages>,
    pub weight_trend: Option<WeightTrend>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorReport {
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    pub report_period: ReportPeriod,
    pub patient: Patient,
    pub profile: Option<ProfileSection>,
    pub summary: ReportSummary,
    pub daily_logs: Vec<ReportDay>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_clamps_and_defaults() {
        assert_eq!(clamp_window(None), 30);
        assert_eq!(clamp_window(Some("14")), 14);
        assert_eq!(clamp_window(Some("3")), 7);
        assert_eq!(clamp_window(Some("365")), 90);
        assert_eq!(clamp_window(Some("soon")), 30);
    }
}
