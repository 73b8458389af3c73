use axum::{
    extract::{FromRef, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            LoginRequest, LoginResponse, PublicUser, RefreshRequest, RefreshResponse,
            RegisterRequest, RegisterResponse,
        },
        jwt::JwtKeys,
        password::{dummy_hash, hash_password, verify_password},
        repo::{is_unique_violation, User},
    },
    error::{ApiError, Json},
    rate_limit::{client_ip, AUTH_LIMIT},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// The hash to verify a login attempt against: the user's stored hash, or
/// the dummy hash when the account does not exist.
fn stored_hash(user: Option<&User>) -> &str {
    match user {
        Some(u) => &u.password_hash,
        None => dummy_hash(),
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::invalid("email", "Invalid email address"));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::invalid(
            "password",
            "Password must be at least 8 characters",
        ));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("User with this email already exists"));
    }

    let hash = hash_password(&payload.password)?;
    // The insert can still race a concurrent registration past the check
    // above; the unique index on email decides, and its violation is the
    // same conflict.
    let user =
        User::create_with_profile(&state.db, &payload.email, payload.name.as_deref(), &hash)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ApiError::Conflict("User with this email already exists")
                } else {
                    ApiError::Internal(e)
                }
            })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully",
            user: PublicUser {
                id: user.id,
                email: user.email,
                name: user.name,
            },
        }),
    ))
}

#[instrument(skip(state, headers, payload))]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<LoginResponse>), ApiError> {
    // Strict per-client limit on login attempts to slow brute force.
    let ip = client_ip(&headers);
    let decision = state
        .rate_limiter
        .check(&format!("login:{ip}"), AUTH_LIMIT)
        .await;
    if !decision.allowed {
        return Err(ApiError::RateLimited {
            retry_after: decision.reset_in_seconds,
        });
    }

    payload.email = payload.email.trim().to_lowercase();
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::invalid("email", "Invalid email address"));
    }

    let user = User::find_by_email(&state.db, &payload.email).await?;

    // Always verify against some hash so response timing does not reveal
    // whether the email exists.
    let password_match = verify_password(&payload.password, stored_hash(user.as_ref()))?;

    let Some(user) = user.filter(|_| password_match) else {
        warn!(email = %payload.email, "login rejected");
        return Err(ApiError::Unauthorized("Invalid email or password"));
    };

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;

    let mut response_headers = HeaderMap::new();
    if let Ok(v) = decision.remaining.to_string().parse() {
        response_headers.insert("x-ratelimit-remaining", v);
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((
        response_headers,
        Json(LoginResponse {
            success: true,
            user: PublicUser {
                id: user.id,
                email: user.email,
                name: user.name,
            },
            access_token,
            refresh_token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token"))?;

    let access_token = keys.sign_access(claims.sub)?;
    let refresh_token = keys.sign_refresh(claims.sub)?;

    Ok(Json(RefreshResponse {
        access_token,
        refresh_token,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("user.name+tag@example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
    }

    #[test]
    fn login_verifies_a_hash_even_for_unknown_emails() {
        assert_eq!(stored_hash(None), dummy_hash());

        let user = User {
            id: uuid::Uuid::new_v4(),
            email: "a@b.co".into(),
            name: None,
            password_hash: "stored".into(),
            created_at: time::OffsetDateTime::now_utc(),
        };
        assert_eq!(stored_hash(Some(&user)), "stored");
    }

    #[test]
    fn public_user_hides_nothing_it_should_show() {
        let user = PublicUser {
            id: uuid::Uuid::new_v4(),
            email: "test@example.com".to_string(),
            name: Some("Test".to_string()),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("id"));
    }
}
