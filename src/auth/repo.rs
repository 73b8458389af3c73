use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Length of the free trial opened at registration.
const TRIAL_DAYS: i64 = 30;

/// True when the error is a Postgres unique-constraint violation (23505).
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map_or(false, |db| db.code().as_deref() == Some("23505"))
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user together with a trial profile, in one transaction.
    /// The trial window starts now and runs for 30 days.
    pub async fn create_with_profile(
        db: &PgPool,
        email: &str,
        name: Option<&str>,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let mut tx = db.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await?;

        let trial_start = OffsetDateTime::now_utc();
        let trial_end = trial_start + Duration::days(TRIAL_DAYS);
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, subscription_status, trial_start_date, trial_end_date)
            VALUES ($1, 'trial', $2, $3)
            "#,
        )
        .bind(user.id)
        .bind(trial_start)
        .bind(trial_end)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_check_ignores_other_errors() {
        assert!(!is_unique_violation(&anyhow::anyhow!("connection refused")));
        assert!(!is_unique_violation(&anyhow::Error::from(
            sqlx::Error::PoolTimedOut
        )));
    }
}
