/// Database row types — these map directly to SQLite rows.
/// Distinct from stubly-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug)]
pub struct EventRow {
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

pub struct GuestRow {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub title: String,
    pub photo: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct TicketRow {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub currency: String,
    pub price: f64,
    pub quantity: i64,
    pub created_at: String,
    pub updated_at: String,
}

pub struct NotificationRow {
    pub id: String,
    pub user_email: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Column values for the event insert; ids and timestamps are assigned by
/// the database.
#[derive(Debug, Clone)]
pub struct NewEvent {
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
}

#[derive(Debug, Clone)]
pub struct NewGuest {
    pub name: String,
    pub title: String,
    pub photo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub name: String,
    pub currency: String,
    pub price: f64,
    pub quantity: i64,
}
