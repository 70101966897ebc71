use axum::{Json, extract::State};
use tracing::warn;
use uuid::Uuid;

use stubly_db::queries::NotificationKind;
use stubly_types::api::{SendOtpRequest, SendOtpResponse};

use crate::auth::AppState;
use crate::error::{ApiError, blocking};
use crate::mailer;

/// POST /send-otp. The code goes out by email and comes back in the
/// response body; nothing is stored server-side, the client does the
/// comparison. A notification records that a code was sent.
pub async fn send_otp(
    State(state): State<AppState>,
    Json(req): Json<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>, ApiError> {
    let otp = generate_otp();

    let message =
        format!("Your Email verification OTP is {}, this OTP will expire in 10 minutes ", otp);
    let body = mailer::notification_email(&req.email, &message);

    state.mailer.send(&req.email, &body).await.map_err(|e| {
        warn!(error = %e, "Error sending OTP");
        ApiError::Dependency("Failed to send OTP. Please try again later.".to_string())
    })?;

    let insert = {
        let state = state.clone();
        let email = req.email.clone();
        move || {
            state.db.insert_notification(
                NotificationKind::User,
                &Uuid::new_v4().to_string(),
                &email,
                "Stubbly",
                "An OTP was sent to your email",
            )
        }
    };
    blocking(insert).await.map_err(|e| {
        warn!(error = %e, "Error recording OTP notification");
        ApiError::Dependency("Failed to send OTP. Please try again later.".to_string())
    })?;

    Ok(Json(SendOtpResponse { message: "OTP sent successfully.".to_string(), otp }))
}

/// Six hex characters cut from a fresh UUID.
pub fn generate_otp() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_string()
}
