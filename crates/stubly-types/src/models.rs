use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account, as exposed over the API. The stored password hash
/// never leaves the database layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

/// An event exactly as stored: dates are wall-clock strings in
/// `YYYY-MM-DD HH:MM:SS` form, already normalized at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub creator: String,
    pub address: String,
    pub landmark: Option<String>,
    pub state: String,
    pub city: String,
    pub postcode: String,
    pub tags: Option<String>,
    pub description: String,
    pub categories: String,
    pub bank_name: String,
    pub account_number: String,
    pub event_image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub title: String,
    pub photo: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub currency: String,
    pub price: f64,
    pub quantity: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_email: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: String,
    pub updated_at: String,
}
