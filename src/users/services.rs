use super::dto::{ActivityLevel, Gender, GoalType};
use super::repo::Profile;

/// Basal metabolic rate, Mifflin-St Jeor equation. Weight in kg, height in
/// cm, age in years.
pub fn calculate_bmr(weight: f64, height: f64, age: i32, gender: Gender) -> f64 {
    let base = 10.0 * weight + 6.25 * height - 5.0 * f64::from(age);
    match gender {
        Gender::Male => base + 5.0,
        // The female constant is the conventional default for "other".
        Gender::Female | Gender::Other => base - 161.0,
    }
}

pub fn activity_multiplier(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Sedentary => 1.2,
        ActivityLevel::Light => 1.375,
        ActivityLevel::Moderate => 1.55,
        ActivityLevel::Active => 1.725,
        ActivityLevel::VeryActive => 1.9,
    }
}

/// Total daily energy expenditure, rounded to whole calories.
pub fn calculate_tdee(bmr: f64, level: ActivityLevel) -> i32 {
    (bmr * activity_multiplier(level)).round() as i32
}

/// Daily target adjusted for the goal: a 500 kcal deficit for weight loss,
/// a 300 kcal surplus for muscle gain.
pub fn calories_for_goal(tdee: i32, goal: GoalType) -> i32 {
    match goal {
        GoalType::WeightLoss => tdee - 500,
        GoalType::Maintenance => tdee,
        GoalType::MuscleGain => tdee + 300,
    }
}

/// Derive the daily calorie target from a profile, if it has enough data
/// (weight, height, age, gender, activity level). Goal defaults to
/// maintenance.
pub fn derive_daily_target(profile: &Profile) -> Option<i32> {
    let weight = profile.current_weight?;
    let height = profile.height?;
    let age = profile.age?;
    let gender = profile.gender.as_deref().and_then(Gender::parse)?;
    let level = profile
        .activity_level
        .as_deref()
        .and_then(ActivityLevel::parse)?;
    let goal = profile
        .goal_type
        .as_deref()
        .and_then(GoalType::parse)
        .unwrap_or(GoalType::Maintenance);

    let tdee = calculate_tdee(calculate_bmr(weight, height, age, gender), level);
    Some(calories_for_goal(tdee, goal))
}
