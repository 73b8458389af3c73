use crate::daily_log::dto::format_date;
use crate::daily_log::repo::DailyLogRow;
use crate::daily_log::services::parse_meals;

use super::dto::{Averages, DayNutrition, MealSummary, ReportDay, WeightTrend};

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Condense one stored log into a report day. Only completed meals count,
/// with nutrients scaled by serving size and rounded to whole units.
pub fn summarize_day(row: &DailyLogRow) -> ReportDay {
    let meals = parse_meals(Some(&row.meals_logged));
    let completed: Vec<_> = meals.meals.into_iter().filter(|m| m.completed).collect();

    let mut calories = 0.0;
    let mut protein = 0.0;
    let mut carbs = 0.0;
    let mut fats = 0.0;
    let mut fiber = 0.0;
    for meal in &completed {
        calories += meal.calories * meal.serving_size;
        protein += meal.protein.unwrap_or(0.0) * meal.serving_size;
        carbs += meal.carbs.unwrap_or(0.0) * meal.serving_size;
        fats += meal.fats.unwrap_or(0.0) * meal.serving_size;
        fiber += meal.fiber.unwrap_or(0.0) * meal.serving_size;
    }

    ReportDay {
        date: format_date(row.date),
        weight: row.weight,
        water_intake: row.water_intake,
        mood: row.mood.clone(),
        is_off_day: row.is_off_day,
        meals_count: completed.len(),
        nutrition: DayNutrition {
            calories: calories.round() as i64,
            protein: protein.round() as i64,
            carbs: carbs.round() as i64,
            fats: fats.round() as i64,
            fiber: fiber.round() as i64,
        },
        meals: completed
            .into_iter()
            .map(|m| MealSummary {
                calories: (m.calories * m.serving_size).round() as i64,
                name: m.name,
                meal_type: m.meal_type,
                time: m.time,
            })
            .collect(),
    }
}

/// Daily averages over days with at least one completed meal; `None` when
/// no day qualifies. Water and meals-per-day keep one decimal.
pub fn compute_averages(days: &[ReportDay]) -> Option<Averages> {
    let with_data: Vec<_> = days.iter().filter(|d| d.meals_count > 0).collect();
    if with_data.is_empty() {
        return None;
    }
    let n = with_data.len() as f64;
    let avg = |f: &dyn Fn(&ReportDay) -> f64| with_data.iter().map(|d| f(d)).sum::<f64>() / n;

    Some(Averages {
        daily_calories: avg(&|d| d.nutrition.calories as f64).round() as i64,
        daily_protein: avg(&|d| d.nutrition.protein as f64).round() as i64,
        daily_carbs: avg(&|d| d.nutrition.carbs as f64).round() as i64,
        daily_fats: avg(&|d| d.nutrition.fats as f64).round() as i64,
        daily_fiber: avg(&|d| d.nutrition.fiber as f64).round() as i64,
        daily_water: round1(avg(&|d| d.water_intake)),
        meals_per_day: round1(avg(&|d| d.meals_count as f64)),
    })
}

/// Weight change over the period. `days` is ordered newest-first, so the
/// trend runs from the last weighted entry (oldest) to the first (newest).
/// Needs at least two weighted days.
pub fn compute_weight_trend(days: &[ReportDay]) -> Option<WeightTrend> {
    let weighted: Vec<f64> = days.iter().filter_map(|d| d.weight).collect();
    if weighted.len() < 2 {
        return None;
    }
    let end = weighted[0];
    let start = weighted[weighted.len() - 1];
    Some(WeightTrend {
        start_weight: start,
        end_weight: end,
        change: round1(end - start),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MealType;
    use crate::daily_log::dto::{MealEntry, MealsLogged};
    use serde_json::json;
    use time::macros::date;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn meal(calories: f64, serving: f64, completed: bool) -> MealEntry {
        MealEntry {
            id: Uuid::new_v4().to_string(),
            food_id: None,
            name: "test meal".into(),
            meal_type: MealType::Dinner,
            calories,
            protein: Some(20.0),
            carbs: Some(50.0),
            fats: Some(10.0),
            fiber: Some(5.0),
            serving_size: serving,
            time: Some("19:00".into()),
            notes: None,
            completed,
        }
    }

    fn row(meals: Vec<MealEntry>, weight: Option<f64>, water: f64) -> DailyLogRow {
        DailyLogRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            date: date!(2024 - 03 - 15),
            meals_logged: serde_json::to_value(MealsLogged { meals }).unwrap(),
            calories_consumed: 0,
            calories_target: 2000,
            water_intake: water,
            weight,
            mood: None,
            notes: None,
            is_off_day: false,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn summarize_counts_only_completed_meals() {
        let day = summarize_day(&row(
            vec![meal(400.0, 1.5, true), meal(300.0, 1.0, false)],
            None,
            2.0,
        ));
        assert_eq!(day.meals_count, 1);
        assert_eq!(day.nutrition.calories, 600);
        assert_eq!(day.nutrition.protein, 30);
        assert_eq!(day.meals.len(), 1);
        assert_eq!(day.meals[0].calories, 600);
        assert_eq!(day.date, "2024-03-15");
    }

    #[test]
    fn summarize_tolerates_malformed_meal_json() {
        let mut r = row(vec![], None, 0.0);
        r.meals_logged = json!("garbage");
        let day = summarize_day(&r);
        assert_eq!(day.meals_count, 0);
        assert_eq!(day.nutrition.calories, 0);
    }

    #[test]
    fn averages_skip_days_without_meals() {
        let days = vec![
            summarize_day(&row(vec![meal(500.0, 1.0, true)], None, 2.0)),
            summarize_day(&row(vec![], None, 3.0)),
            summarize_day(&row(vec![meal(700.0, 1.0, true)], None, 1.0)),
        ];
        let averages = compute_averages(&days).unwrap();
        // The empty day is excluded from every average, water included.
        assert_eq!(averages.daily_calories, 600);
        assert_eq!(averages.daily_water, 1.5);
        assert_eq!(averages.meals_per_day, 1.0);
    }

    #[test]
    fn averages_are_none_when_no_day_has_meals() {
        let days = vec![summarize_day(&row(vec![], Some(80.0), 2.0))];
        assert!(compute_averages(&days).is_none());
    }

    #[test]
    fn weight_trend_runs_oldest_to_newest() {
        // Newest-first, matching the repository's ordering.
        let days = vec![
            summarize_day(&row(vec![], Some(78.4), 0.0)),
            summarize_day(&row(vec![], None, 0.0)),
            summarize_day(&row(vec![], Some(80.0), 0.0)),
        ];
        let trend = compute_weight_trend(&days).unwrap();
        assert_eq!(trend.start_weight, 80.0);
        assert_eq!(trend.end_weight, 78.4);
        assert_eq!(trend.change, -1.6);
    }

    #[test]
    fn weight_trend_needs_two_weighted_days() {
        let days = vec![summarize_day(&row(vec![], Some(80.0), 0.0))];
        assert!(compute_weight_trend(&days).is_none());
        assert!(compute_weight_trend(&[]).is_none());
    }
}
