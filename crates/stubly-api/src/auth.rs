use std::path::PathBuf;
use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode};
use chrono::Local;
use tracing::warn;
use uuid::Uuid;

use stubly_db::Database;
use stubly_db::models::UserRow;
use stubly_db::queries::NotificationKind;
use stubly_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use stubly_types::models::User;

use crate::error::{ApiError, blocking};
use crate::mailer::{self, Mailer};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub mailer: Mailer,
    pub http: reqwest::Client,
    pub jwt_secret: String,
    pub event_token_secret: String,
    pub token_expiry_secs: i64,
    pub event_base_url: String,
    pub upload_dir: PathBuf,
    pub paystack_secret_key: String,
}

/// POST /register. Emails are stored lowercased; the duplicate check is
/// case-insensitive either way through the column collation.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let email = req.email.trim().to_lowercase();

    let row = tokio::task::spawn_blocking(move || {
        if state.db.find_user_by_email(&email)?.is_some() {
            return Err(ApiError::Validation(format!(
                "Sorry {}, a user with this email already exists.",
                req.first_name
            )));
        }

        // Hash with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| ApiError::Database(anyhow::anyhow!("Password hashing failed: {}", e)))?
            .to_string();

        Ok(state.db.create_user(&req.first_name, &req.last_name, &email, &password_hash)?)
    })
    .await
    .map_err(|e| ApiError::Database(anyhow::anyhow!("spawn_blocking join error: {}", e)))??;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "user registered successfully".to_string(),
            success: true,
            user: user_model(&row),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    sign_in(state, req, NotificationKind::User).await
}

pub async fn manager_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    sign_in(state, req, NotificationKind::Manager).await
}

/// Shared login path. The two routes differ only in which notification
/// table records the sign-in.
async fn sign_in(
    state: AppState,
    req: LoginRequest,
    kind: NotificationKind,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = req.email.clone();

    let user = tokio::task::spawn_blocking({
        let state = state.clone();
        move || verify_credentials(&state.db, &req.email, &req.password)
    })
    .await
    .map_err(|e| ApiError::Database(anyhow::anyhow!("spawn_blocking join error: {}", e)))??;

    let access_token = crate::tokens::issue_user_token(
        &user,
        &state.jwt_secret,
        state.token_expiry_secs,
        chrono::Utc::now(),
    )?;

    // The sign-in record and email happen after the response; failures there
    // are logged, never surfaced to the client.
    tokio::spawn(notify_sign_in(state, kind, email, user.first_name, user.last_name));

    Ok(Json(LoginResponse { message: "Login successful".to_string(), access_token }))
}

fn verify_credentials(db: &Database, email: &str, password: &str) -> Result<UserRow, ApiError> {
    let user = db.find_user_by_email(email)?.ok_or_else(|| {
        ApiError::NotFound("User not found. \n Are you sure you have an account?".to_string())
    })?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Database(anyhow::anyhow!("Stored password hash is invalid: {}", e)))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Auth("Invalid credentials".to_string()))?;

    Ok(user)
}

async fn notify_sign_in(
    state: AppState,
    kind: NotificationKind,
    email: String,
    first_name: String,
    last_name: String,
) {
    let (title, activity) = match kind {
        NotificationKind::User => ("Account Sign In", "Account login"),
        NotificationKind::Manager => ("Manager Account Sign In", "Manager Account login"),
    };

    let insert = {
        let state = state.clone();
        let email = email.clone();
        let message = format!("Welcome back {}", first_name);
        move || {
            state.db.insert_notification(kind, &Uuid::new_v4().to_string(), &email, title, &message)
        }
    };
    if let Err(e) = blocking(insert).await {
        warn!(error = %e, "Failed to record sign-in notification");
    }

    let now = Local::now();
    let body = mailer::notification_email(
        &first_name,
        &format!(
            "{} for {} {} on {} {} ",
            activity,
            first_name,
            last_name,
            now.format("%-m/%-d/%Y"),
            now.format("%-I:%M:%S %p")
        ),
    );
    if let Err(e) = state.mailer.send(&email, &body).await {
        warn!(error = %e, "Failed to send sign-in email");
    }
}

pub(crate) fn user_model(row: &UserRow) -> User {
    User {
        id: row.id,
        first_name: row.first_name.clone(),
        last_name: row.last_name.clone(),
        email: row.email.clone(),
        created_at: row.created_at.clone(),
        updated_at: row.updated_at.clone(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub(crate) fn test_state() -> AppState {
        Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            mailer: Mailer::disabled(),
            http: reqwest::Client::new(),
            jwt_secret: "test-jwt-secret".to_string(),
            event_token_secret: "test-event-secret".to_string(),
            token_expiry_secs: 3600,
            event_base_url: "https://stublyevent.web.app/event".to_string(),
            upload_dir: std::env::temp_dir(),
            paystack_secret_key: "sk_test".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::test_state;

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            password: "correct horse battery".to_string(),
        }
    }

    #[tokio::test]
    async fn register_stores_a_lowercased_email_and_no_hash_in_the_response() {
        let state = test_state();

        let (status, Json(res)) =
            register(State(state.clone()), Json(register_request("Ada@Example.COM")))
                .await
                .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert!(res.success);
        assert_eq!(res.message, "user registered successfully");
        assert_eq!(res.user.email, "ada@example.com");

        let stored = state.db.find_user_by_email("ada@example.com").unwrap().unwrap();
        assert_ne!(stored.password, "correct horse battery");
        assert!(stored.password.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn register_rejects_a_duplicate_email_by_first_name() {
        let state = test_state();
        register(State(state.clone()), Json(register_request("ada@example.com"))).await.unwrap();

        let mut second = register_request("ADA@example.com");
        second.first_name = "Grace".to_string();
        let err = register(State(state), Json(second)).await.unwrap_err();

        match err {
            ApiError::Validation(msg) => {
                assert_eq!(msg, "Sorry Grace, a user with this email already exists.")
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn login_succeeds_with_any_email_casing() {
        let state = test_state();
        register(State(state.clone()), Json(register_request("ada@example.com"))).await.unwrap();

        let res = login(
            State(state),
            Json(LoginRequest {
                email: "ADA@EXAMPLE.COM".to_string(),
                password: "correct horse battery".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(res.0.message, "Login successful");
        assert!(!res.0.access_token.is_empty());
    }

    #[tokio::test]
    async fn login_distinguishes_unknown_users_from_bad_passwords() {
        let state = test_state();
        register(State(state.clone()), Json(register_request("ada@example.com"))).await.unwrap();

        let unknown = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "whatever".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(unknown, ApiError::NotFound(_)));

        let wrong = login(
            State(state),
            Json(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "wrong password".to_string(),
            }),
        )
        .await
        .unwrap_err();
        match wrong {
            ApiError::Auth(msg) => assert_eq!(msg, "Invalid credentials"),
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn the_issued_token_carries_the_account_claims() {
        let state = test_state();
        register(State(state.clone()), Json(register_request("ada@example.com"))).await.unwrap();

        let res = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "correct horse battery".to_string(),
            }),
        )
        .await
        .unwrap();

        let claims = crate::tokens::verify_user_token(&res.0.access_token, &state.jwt_secret).unwrap();
        assert_eq!(claims.first_name, "Ada");
        assert_eq!(claims.email, "ada@example.com");
    }
}
