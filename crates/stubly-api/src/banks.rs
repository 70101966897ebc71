use axum::{Json, extract::State};
use serde_json::Value;
use tracing::error;

use stubly_types::api::{BanksResponse, PaystackEnvelope, VerifyBankAccountRequest};

use crate::auth::AppState;
use crate::error::ApiError;

const PAYSTACK_BASE_URL: &str = "https://api.paystack.co";

/// POST /banks — proxy Paystack's bank directory so the client never
/// handles the secret key.
pub async fn list_banks(State(state): State<AppState>) -> Result<Json<BanksResponse>, ApiError> {
    let url = format!("{}/bank", PAYSTACK_BASE_URL);
    let envelope = paystack_get(&state, &url).await.map_err(|e| {
        error!(error = %e, "Error fetching banks");
        ApiError::Dependency("Error fetching banks".to_string())
    })?;

    Ok(Json(BanksResponse { banks: envelope.data.unwrap_or(Value::Null) }))
}

/// POST /verify-bank-account — resolve an account number against a bank
/// code and hand Paystack's envelope back untouched, resolved account name
/// included.
pub async fn verify_bank_account(
    State(state): State<AppState>,
    Json(req): Json<VerifyBankAccountRequest>,
) -> Result<Json<PaystackEnvelope>, ApiError> {
    let url = format!(
        "{}/bank/resolve?account_number={}&bank_code={}",
        PAYSTACK_BASE_URL, req.account_number, req.bank_code
    );
    let envelope = paystack_get(&state, &url).await.map_err(|e| {
        error!(error = %e, "Error verifying bank account");
        ApiError::Dependency("Error verifying bank account".to_string())
    })?;

    Ok(Json(envelope))
}

async fn paystack_get(state: &AppState, url: &str) -> anyhow::Result<PaystackEnvelope> {
    let envelope = state
        .http
        .get(url)
        .bearer_auth(&state.paystack_secret_key)
        .send()
        .await?
        .error_for_status()?
        .json::<PaystackEnvelope>()
        .await?;

    Ok(envelope)
}
