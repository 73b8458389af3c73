use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Per-user configuration and health baseline. One row per user, created at
/// registration with a 30-day trial.
#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
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
    pub subscription_status: String,
    pub subscription_plan: Option<String>,
    pub trial_start_date: OffsetDateTime,
    pub trial_end_date: OffsetDateTime,
    pub subscription_end_date: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const COLUMNS: &str = r#"
    id, user_id, current_weight, target_weight, height, age, gender,
    activity_level, goal_type, daily_calories, dietary_prefs, allergies,
    medical_conditions, medications, subscription_status, subscription_plan,
    trial_start_date, trial_end_date, subscription_end_date, created_at, updated_at
"#;

/// Fields applied by a settings update; `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub current_weight: Option<f64>,
    pub target_weight: Option<f64>,
    pub height: Option<f64>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub activity_level: Option<String>,
    pub goal_type: Option<String>,
    pub dietary_prefs: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
    pub medical_conditions: Option<Vec<String>>,
    pub medications: Option<Vec<String>>,
}

impl Profile {
    pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {COLUMNS} FROM profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(profile)
    }

    pub async fn set_subscription_status(
        db: &PgPool,
        user_id: Uuid,
        status: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE profiles SET subscription_status = $2, updated_at = now() WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(status)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn set_daily_calories(
        db: &PgPool,
        user_id: Uuid,
        daily_calories: i32,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE profiles SET daily_calories = $2, updated_at = now() WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(daily_calories)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Apply a partial settings update. Returns the updated row, or `None`
    /// when the user has no profile.
    pub async fn apply_changes(
        db: &PgPool,
        user_id: Uuid,
        changes: &ProfileChanges,
    ) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            r#"
            UPDATE profiles SET
                current_weight = COALESCE($2, current_weight),
                target_weight = COALESCE($3, target_weight),
                height = COALESCE($4, height),
                age = COALESCE($5, age),
                gender = COALESCE($6, gender),
                activity_level = COALESCE($7, activity_level),
                goal_type = COALESCE($8, goal_type),
                dietary_prefs = COALESCE($9, dietary_prefs),
                allergies = COALESCE($10, allergies),
                medical_conditions = COALESCE($11, medical_conditions),
                medications = COALESCE($12, medications),
                updated_at = now()
            WHERE user_id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(changes.current_weight)
        .bind(changes.target_weight)
        .bind(changes.height)
        .bind(changes.age)
        .bind(changes.gender.as_deref())
        .bind(changes.activity_level.as_deref())
        .bind(changes.goal_type.as_deref())
        .bind(changes.dietary_prefs.as_deref())
        .bind(changes.allergies.as_deref())
        .bind(changes.medical_conditions.as_deref())
        .bind(changes.medications.as_deref())
        .fetch_optional(db)
        .await?;
        Ok(profile)
    }
}
