use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// A user's log for one calendar day. `meals_logged` is the raw JSONB meal
/// list; decoding happens at the service layer.
#[derive(Debug, Clone, FromRow)]
pub struct DailyLogRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: Date,
    pub meals_logged: Value,
    pub calories_consumed: i32,
    pub calories_target: i32,
    pub water_intake: f64,
    pub weight: Option<f64>,
    pub mood: Option<String>,
    pub notes: Option<String>,
    pub is_off_day: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const COLUMNS: &str = r#"
    id, user_id, date, meals_logged, calories_consumed, calories_target,
    water_intake, weight, mood, notes, is_off_day, created_at, updated_at
"#;

impl DailyLogRow {
    pub async fn find_by_date(
        db: &PgPool,
        user_id: Uuid,
        date: Date,
    ) -> anyhow::Result<Option<DailyLogRow>> {
        let row = sqlx::query_as::<_, DailyLogRow>(&format!(
            "SELECT {COLUMNS} FROM daily_logs WHERE user_id = $1 AND date = $2"
        ))
        .bind(user_id)
        .bind(date)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Logs in a date range, newest first.
    pub async fn find_range(
        db: &PgPool,
        user_id: Uuid,
        start: Date,
        end: Date,
    ) -> anyhow::Result<Vec<DailyLogRow>> {
        let rows = sqlx::query_as::<_, DailyLogRow>(&format!(
            r#"
            SELECT {COLUMNS} FROM daily_logs
            WHERE user_id = $1 AND date BETWEEN $2 AND $3
            ORDER BY date DESC
            "#
        ))
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Create an empty log for the day if none exists. Safe against
    /// concurrent callers via the (user_id, date) unique constraint.
    pub async fn ensure_exists(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        date: Date,
        calories_target: i32,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO daily_logs (user_id, date, calories_target)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, date) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(calories_target)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Lock the day's row for the remainder of the transaction so meal-list
    /// read-modify-write cycles cannot lose updates.
    pub async fn lock_for_update(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        date: Date,
    ) -> anyhow::Result<Option<DailyLogRow>> {
        let row = sqlx::query_as::<_, DailyLogRow>(&format!(
            "SELECT {COLUMNS} FROM daily_logs WHERE user_id = $1 AND date = $2 FOR UPDATE"
        ))
        .bind(user_id)
        .bind(date)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(row)
    }

    pub async fn save_meals(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        meals_logged: &Value,
        calories_consumed: i32,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE daily_logs
            SET meals_logged = $2, calories_consumed = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(meals_logged)
        .bind(calories_consumed)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Upsert the day-level fields (weight, water, mood, notes, off-day) in
    /// one statement; absent fields keep their stored values.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_day_fields(
        db: &PgPool,
        user_id: Uuid,
        date: Date,
        calories_target: i32,
        weight: Option<f64>,
        water_intake: Option<f64>,
        mood: Option<&str>,
        notes: Option<&str>,
        is_off_day: Option<bool>,
    ) -> anyhow::Result<DailyLogRow> {
        let row = sqlx::query_as::<_, DailyLogRow>(&format!(
            r#"
            INSERT INTO daily_logs
                (user_id, date, calories_target, weight, water_intake, mood, notes, is_off_day)
            VALUES ($1, $2, $3, $4, COALESCE($5, 0), $6, $7, COALESCE($8, false))
            ON CONFLICT (user_id, date) DO UPDATE SET
                weight = COALESCE($4, daily_logs.weight),
                water_intake = COALESCE($5, daily_logs.water_intake),
                mood = COALESCE($6, daily_logs.mood),
                notes = COALESCE($7, daily_logs.notes),
                is_off_day = COALESCE($8, daily_logs.is_off_day),
                updated_at = now()
            RETURNING {COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(date)
        .bind(calories_target)
        .bind(weight)
        .bind(water_intake)
        .bind(mood)
        .bind(notes)
        .bind(is_off_day)
        .fetch_one(db)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    // Needs a migrated Postgres; run with DATABASE_URL set and
    // `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn repeated_day_field_upserts_touch_one_row() {
        let db = PgPool::connect(&std::env::var("DATABASE_URL").unwrap())
            .await
            .unwrap();
        let user_id: Uuid = sqlx::query_scalar(
            "INSERT INTO users (email, password_hash) VALUES ($1, 'x') RETURNING id",
        )
        .bind(format!("{}@example.com", Uuid::new_v4()))
        .fetch_one(&db)
        .await
        .unwrap();

        let day = date!(2024 - 05 - 01);
        let first = DailyLogRow::upsert_day_fields(
            &db,
            user_id,
            day,
            2000,
            Some(80.0),
            Some(2.0),
            Some("good"),
            None,
            None,
        )
        .await
        .unwrap();
        let second = DailyLogRow::upsert_day_fields(
            &db,
            user_id,
            day,
            2000,
            None,
            None,
            None,
            Some("second pass"),
            None,
        )
        .await
        .unwrap();

        // Same row both times; absent fields kept their values.
        assert_eq!(first.id, second.id);
        assert_eq!(second.weight, Some(80.0));
        assert_eq!(second.water_intake, 2.0);
        assert_eq!(second.notes.as_deref(), Some("second pass"));

        let count: i64 =
            sqlx::query_scalar("SELECT count(*) FROM daily_logs WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&db)
                .await
                .unwrap();
        assert_eq!(count, 1);
    }
}
