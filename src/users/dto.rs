use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very_active",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sedentary" => Some(ActivityLevel::Sedentary),
            "light" => Some(ActivityLevel::Light),
            "moderate" => Some(ActivityLevel::Moderate),
            "active" => Some(ActivityLevel::Active),
            "very_active" => Some(ActivityLevel::VeryActive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    WeightLoss,
    Maintenance,
    MuscleGain,
}

impl GoalType {
    pub fn as_str(self) -> &'static str {
        match self {
            GoalType::WeightLoss => "weight_loss",
            GoalType::Maintenance => "maintenance",
            GoalType::MuscleGain => "muscle_gain",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "weight_loss" => Some(GoalType::WeightLoss),
            "maintenance" => Some(GoalType::Maintenance),
            "muscle_gain" => Some(GoalType::MuscleGain),
            _ => None,
        }
    }
}

/// Trial/subscription state of the caller's profile.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    #[serde(with = "time::serde::rfc3339")]
    pub trial_start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub trial_end_date: OffsetDateTime,
    pub subscription_status: String,
    pub subscription_plan: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub subscription_end_date: Option<OffsetDateTime>,
}

/// Health baseline and settings, returned verbatim from the profile row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub current_weight: Option<f64>,
    pub target_weight: Option<f64>,
    pub height: Option<f64>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub activity_level: Option<String>,
    pub goal_type: Option<String>,
    pub daily_calories: Option<i32>,
    pub dietary_prefs: Vec<String>,
    pub allergies: Vec<String>,
    pub medical_conditions: Vec<String>,
    pub medications: Vec<String>,
}

/// Partial settings update; absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub current_weight: Option<f64>,
    pub target_weight: Option<f64>,
    pub height: Option<f64>,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub activity_level: Option<ActivityLevel>,
    pub goal_type: Option<GoalType>,
    pub dietary_prefs: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
    pub medical_conditions: Option<Vec<String>>,
    pub medications: Option<Vec<String>>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), crate::error::ApiError> {
        let mut errors = Vec::new();
        for (field, value) in [
            ("currentWeight", self.current_weight),
            ("targetWeight", self.target_weight),
        ] {
            if let Some(w) = value {
                if !(20.0..=500.0).contains(&w) {
                    errors.push(crate::error::FieldError::new(
                        field,
                        "Weight must be between 20 and 500",
                    ));
                }
            }
        }
        if let Some(h) = self.height {
            if !(50.0..=300.0).contains(&h) {
                errors.push(crate::error::FieldError::new(
                    "height",
                    "Height must be between 50 and 300",
                ));
            }
        }
        if let Some(a) = self.age {
            if !(10..=120).contains(&a) {
                errors.push(crate::error::FieldError::new(
                    "age",
                    "Age must be between 10 and 120",
                ));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(crate::error::ApiError::Validation(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_roundtrip_through_strings() {
        assert_eq!(ActivityLevel::parse("very_active"), Some(ActivityLevel::VeryActive));
        assert_eq!(ActivityLevel::VeryActive.as_str(), "very_active");
        assert_eq!(GoalType::parse("weight_loss"), Some(GoalType::WeightLoss));
        assert_eq!(Gender::parse("nonbinary"), None);
    }

    #[test]
    fn update_request_rejects_out_of_range() {
        let req = UpdateProfileRequest {
            current_weight: Some(10.0),
            age: Some(300),
            ..Default::default()
        };
        let err = req.validate().unwrap_err();
        match err {
            crate::error::ApiError::Validation(details) => {
                assert_eq!(details.len(), 2);
                assert_eq!(details[0].field, "currentWeight");
                assert_eq!(details[1].field, "age");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
