use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Event, Guest, Ticket, User};

// -- JWT Claims --

/// Claims carried by the session tokens issued on login. Canonical
/// definition lives here in stubly-types so the API and its tests agree on
/// the payload shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserClaims {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub exp: usize,
}

/// Claims carried by an event access token. `exp` is the event's scheduled
/// start, so the token stops verifying the moment the event begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTokenClaims {
    pub id: i64,
    pub title: String,
    pub date: String,
    pub city: String,
    pub start_time: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub success: bool,
    pub user: User,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub access_token: String,
}

// -- OTP --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendOtpRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SendOtpResponse {
    pub message: String,
    pub otp: String,
}

// -- Events --

#[derive(Debug, Serialize)]
pub struct CreateEventResponse {
    pub message: String,
    pub event: Event,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventsByCreatorRequest {
    pub creator: Option<String>,
}

/// Condensed event record for the creator dashboard, with the shareable
/// tokenized URL attached.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: i64,
    pub title: String,
    pub date: String,
    pub city: String,
    pub event_image: Option<String>,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct GuestSummary {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub photo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TicketSummary {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub currency: String,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct CreatorEventEntry {
    pub event: EventSummary,
    pub guests: Vec<GuestSummary>,
    pub tickets: Vec<TicketSummary>,
}

/// Full event page payload served to a valid access token.
#[derive(Debug, Serialize)]
pub struct EventPageResponse {
    pub event: Event,
    pub guests: Vec<Guest>,
    pub tickets: Vec<Ticket>,
}

// -- Notifications --

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<crate::models::Notification>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkReadRequest {
    pub ids: Vec<Uuid>,
}

// -- Banks --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VerifyBankAccountRequest {
    pub bank_code: String,
    pub account_number: String,
}

#[derive(Debug, Serialize)]
pub struct BanksResponse {
    pub banks: serde_json::Value,
}

/// Envelope shape shared by every Paystack endpoint; `data` is passed
/// through untyped.
#[derive(Debug, Serialize, Deserialize)]
pub struct PaystackEnvelope {
    pub status: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

// -- Uploads --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GetImageRequest {
    pub image_path: String,
}
