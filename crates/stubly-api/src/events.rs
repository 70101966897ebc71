use std::collections::HashMap;
use std::path::Path as FsPath;

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use stubly_db::Database;
use stubly_db::models::{EventRow, GuestRow, NewEvent, NewGuest, NewTicket, TicketRow};
use stubly_types::api::{
    CreateEventResponse, CreatorEventEntry, EventPageResponse, EventSummary,
    EventsByCreatorRequest, GuestSummary, TicketSummary,
};
use stubly_types::models::{Event, Guest, Ticket};

use crate::auth::AppState;
use crate::error::{ApiError, blocking};
use crate::time;
use crate::tokens;
use crate::uploads;

/// The /createEvent form after boundary parsing: typed scalars, ordered
/// guest and ticket inputs, and staged upload references. Guest photos are
/// matched to guests through an explicit index map; nothing downstream
/// looks at raw field-name strings.
#[derive(Debug, Default)]
pub struct CreateEventForm {
    pub event_title: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub end_time: Option<String>,
    pub creator: Option<String>,
    pub address: Option<String>,
    pub landmark: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub postcode: Option<String>,
    pub tags: Option<String>,
    pub description: Option<String>,
    pub categories: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub guests: Vec<GuestInput>,
    pub tickets: Vec<TicketInput>,
    pub guest_photos: HashMap<usize, String>,
    pub event_image: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct GuestInput {
    pub name: Option<String>,
    pub title: Option<String>,
}

/// Ticket fields exactly as they arrived, still unparsed; validation
/// reports the offending index on failure.
#[derive(Debug, Default, Clone)]
pub struct TicketInput {
    pub name: Option<String>,
    pub currency: Option<String>,
    pub price: Option<String>,
    pub quantity: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub category: Option<String>,
}

// -- Handlers --

/// POST /createEvent — multipart form in, one event with guests and
/// tickets out. Any failure, validation included, answers 500 with a fixed
/// body; the detail goes to the logs. Clients depend on that contract.
pub async fn create_event(State(state): State<AppState>, multipart: Multipart) -> Response {
    match create_event_inner(&state, multipart).await {
        Ok(event) => Json(CreateEventResponse {
            message: "Event created successfully".to_string(),
            event: event_model(&event),
        })
        .into_response(),
        Err(e) => {
            error!(error = ?e, "Failed to create event");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Failed to create event" })))
                .into_response()
        }
    }
}

async fn create_event_inner(state: &AppState, multipart: Multipart) -> Result<EventRow, ApiError> {
    let form = parse_create_event_form(multipart, &state.upload_dir).await?;

    let state = state.clone();
    tokio::task::spawn_blocking(move || create_event_record(&state.db, form))
        .await
        .map_err(|e| ApiError::Database(anyhow::anyhow!("spawn_blocking join error: {}", e)))?
}

/// POST /eventByCreator — every event owned by a creator, each with its
/// guest list, ticket tiers and a freshly signed shareable URL.
pub async fn events_by_creator(
    State(state): State<AppState>,
    Json(req): Json<EventsByCreatorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let creator = req
        .creator
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::Validation("Creator is required".to_string()))?
        .to_string();

    let rows = blocking({
        let state = state.clone();
        move || {
            let events = state.db.events_by_creator(&creator)?;
            let mut entries = Vec::with_capacity(events.len());
            for event in events {
                let guests = state.db.guests_for_event(event.id)?;
                let tickets = state.db.tickets_for_event(event.id)?;
                entries.push((event, guests, tickets));
            }
            Ok(entries)
        }
    })
    .await?;

    if rows.is_empty() {
        return Err(ApiError::NotFound("Events not found for the given creator".to_string()));
    }

    let now = Utc::now();
    let entries = rows
        .into_iter()
        .map(|(event, guests, tickets)| {
            let token = tokens::issue_event_token(&event, &state.event_token_secret, now)?;
            Ok(CreatorEventEntry {
                event: EventSummary {
                    id: event.id,
                    title: event.title,
                    date: event.date,
                    city: event.city,
                    event_image: event.event_image,
                    url: format!("{}/{}", state.event_base_url, token),
                },
                guests: guests
                    .into_iter()
                    .map(|g| GuestSummary { id: g.id, name: g.name, title: g.title, photo: g.photo })
                    .collect(),
                tickets: tickets
                    .into_iter()
                    .map(|t| TicketSummary {
                        id: t.id,
                        name: t.name,
                        price: t.price,
                        currency: t.currency,
                        quantity: t.quantity,
                    })
                    .collect(),
            })
        })
        .collect::<Result<Vec<_>, anyhow::Error>>()?;

    Ok(Json(entries))
}

/// GET /event/{token} — the public event page behind a shareable link.
/// A token that no longer verifies answers 500, the blanket status this
/// route has always used; the page treats it as "link expired".
pub async fn event_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, ApiError> {
    let claims = match tokens::verify_event_token(&token, &state.event_token_secret) {
        Ok(claims) => claims,
        Err(e) => {
            error!(error = %e, "Event token rejected");
            return Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response());
        }
    };

    let found = blocking({
        let state = state.clone();
        move || {
            let Some(event) = state.db.event_by_id(claims.id)? else {
                return Ok(None);
            };
            let guests = state.db.guests_for_event(event.id)?;
            let tickets = state.db.tickets_for_event(event.id)?;
            Ok(Some((event, guests, tickets)))
        }
    })
    .await?;

    let (event, guests, tickets) =
        found.ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    Ok(Json(EventPageResponse {
        event: event_model(&event),
        guests: guests.iter().map(guest_model).collect(),
        tickets: tickets.iter().map(ticket_model).collect(),
    })
    .into_response())
}

/// GET /api/events — public listing, optionally filtered by category.
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<Event>>, ApiError> {
    // An empty ?category= means no filter.
    let rows = blocking({
        let state = state.clone();
        move || state.db.list_events(query.category.as_deref().filter(|c| !c.is_empty()))
    })
    .await?;

    Ok(Json(rows.iter().map(event_model).collect::<Vec<_>>()))
}

/// GET /api/allevents — the unfiltered listing.
pub async fn list_all_events(State(state): State<AppState>) -> Result<Json<Vec<Event>>, ApiError> {
    let rows = blocking({
        let state = state.clone();
        move || state.db.list_events(None)
    })
    .await?;

    Ok(Json(rows.iter().map(event_model).collect::<Vec<_>>()))
}

// -- Creation pipeline --

/// Validate a parsed form and run the creation transaction: one event, all
/// guests, all tickets, or nothing at all.
pub fn create_event_record(db: &Database, form: CreateEventForm) -> Result<EventRow, ApiError> {
    let event = build_event(&form)?;
    let guests = build_guests(&form.guests, &form.guest_photos)?;
    let tickets = build_tickets(&form.tickets)?;

    Ok(db.create_event(&event, &guests, &tickets)?)
}

async fn parse_create_event_form(
    mut multipart: Multipart,
    upload_dir: &FsPath,
) -> Result<CreateEventForm, ApiError> {
    let mut form = CreateEventForm::default();

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {}", e)))?;
        let Some(field) = field else { break };
        let Some(name) = field.name().map(str::to_owned) else { continue };

        if field.file_name().is_some() {
            let staged = uploads::stage_image(field, upload_dir).await?;
            if let Some(index) = uploads::guest_photo_index(&name) {
                form.guest_photos.insert(checked_index(index, "Guest")?, staged);
            } else if uploads::is_event_photo_field(&name) && form.event_image.is_none() {
                form.event_image = Some(staged);
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {}", e)))?;

        match name.as_str() {
            "eventTitle" => form.event_title = Some(value),
            "date" => form.date = Some(value),
            "time" => form.time = Some(value),
            "endTime" => form.end_time = Some(value),
            "creator" => form.creator = Some(value),
            "address" => form.address = Some(value),
            "landmark" => form.landmark = Some(value),
            "state" => form.state = Some(value),
            "city" => form.city = Some(value),
            "postcode" => form.postcode = Some(value),
            "tags" => form.tags = Some(value),
            "description" => form.description = Some(value),
            "categories" => form.categories = Some(value),
            "bankName" => form.bank_name = Some(value),
            "accountNumber" => form.account_number = Some(value),
            other => {
                if let Some((index, key)) = uploads::indexed_field(other, "guests") {
                    let guest = slot(&mut form.guests, checked_index(index, "Guest")?);
                    match key {
                        "name" => guest.name = Some(value),
                        "title" => guest.title = Some(value),
                        _ => {}
                    }
                } else if let Some((index, key)) = uploads::indexed_field(other, "ticket") {
                    let ticket = slot(&mut form.tickets, checked_index(index, "Ticket")?);
                    match key {
                        "name" => ticket.name = Some(value),
                        "currency" => ticket.currency = Some(value),
                        "price" => ticket.price = Some(value),
                        "quantity" => ticket.quantity = Some(value),
                        _ => {}
                    }
                }
                // Unknown fields are ignored, like any form parser.
            }
        }
    }

    Ok(form)
}

const MAX_INDEXED_ENTRIES: usize = 1_000;

/// Field names choose these indices, so they are bounded before they size
/// a vec or key a photo.
fn checked_index(index: usize, label: &str) -> Result<usize, ApiError> {
    if index >= MAX_INDEXED_ENTRIES {
        return Err(ApiError::Validation(format!("{} index {} is out of range.", label, index)));
    }
    Ok(index)
}

/// Indexed form fields can arrive out of order; grow the vec to fit.
fn slot<T: Default>(items: &mut Vec<T>, index: usize) -> &mut T {
    if items.len() <= index {
        items.resize_with(index + 1, T::default);
    }
    &mut items[index]
}

fn build_event(form: &CreateEventForm) -> Result<NewEvent, ApiError> {
    let date_raw = required(&form.date, "date")?;
    let date = time::normalize_wall_clock(&date_raw)
        .map_err(|_| ApiError::Validation("Valid date is required.".to_string()))?;

    let start_time = time::normalize_event_time(&date, &required(&form.time, "time")?)
        .map_err(|_| ApiError::Validation("Valid time is required.".to_string()))?;
    let end_time = time::normalize_event_time(&date, &required(&form.end_time, "endTime")?)
        .map_err(|_| ApiError::Validation("Valid endTime is required.".to_string()))?;

    Ok(NewEvent {
        title: required(&form.event_title, "eventTitle")?,
        date,
        start_time,
        end_time,
        creator: required(&form.creator, "creator")?,
        address: required(&form.address, "address")?,
        landmark: optional(&form.landmark),
        state: required(&form.state, "state")?,
        city: required(&form.city, "city")?,
        postcode: required(&form.postcode, "postcode")?,
        tags: optional(&form.tags),
        description: required(&form.description, "description")?,
        categories: required(&form.categories, "categories")?,
        bank_name: required(&form.bank_name, "bankName")?,
        account_number: required(&form.account_number, "accountNumber")?,
        event_image: form.event_image.clone(),
    })
}

fn build_guests(
    inputs: &[GuestInput],
    photos: &HashMap<usize, String>,
) -> Result<Vec<NewGuest>, ApiError> {
    inputs
        .iter()
        .enumerate()
        .map(|(index, guest)| {
            let name = guest
                .name
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    ApiError::Validation(format!("Guest name is required for guest at index {}.", index))
                })?;
            let title = guest
                .title
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    ApiError::Validation(format!("Guest title is required for guest at index {}.", index))
                })?;

            Ok(NewGuest {
                name: name.to_string(),
                title: title.to_string(),
                photo: photos.get(&index).cloned(),
            })
        })
        .collect()
}

fn build_tickets(inputs: &[TicketInput]) -> Result<Vec<NewTicket>, ApiError> {
    if inputs.is_empty() {
        return Err(ApiError::Validation("No tickets provided.".to_string()));
    }

    inputs
        .iter()
        .enumerate()
        .map(|(index, ticket)| {
            let name = ticket
                .name
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    ApiError::Validation(format!("Ticket name is required for ticket at index {}.", index))
                })?;
            let currency = ticket
                .currency
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    ApiError::Validation(format!("Currency is required for ticket at index {}.", index))
                })?;
            let price = ticket
                .price
                .as_deref()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|p| *p > 0.0)
                .ok_or_else(|| {
                    ApiError::Validation(format!("Valid price is required for ticket at index {}.", index))
                })?;
            let quantity = ticket
                .quantity
                .as_deref()
                .and_then(|v| v.trim().parse::<i64>().ok())
                .filter(|q| *q > 0)
                .ok_or_else(|| {
                    ApiError::Validation(format!(
                        "Valid quantity is required for ticket at index {}.",
                        index
                    ))
                })?;

            Ok(NewTicket {
                name: name.to_string(),
                currency: currency.to_string(),
                price,
                quantity,
            })
        })
        .collect()
}

fn required(value: &Option<String>, field: &str) -> Result<String, ApiError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ApiError::Validation(format!("{} is required.", field))),
    }
}

fn optional(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

// -- Row-to-model mapping --

pub(crate) fn event_model(row: &EventRow) -> Event {
    Event {
        id: row.id,
        title: row.title.clone(),
        date: row.date.clone(),
        start_time: row.start_time.clone(),
        end_time: row.end_time.clone(),
        creator: row.creator.clone(),
        address: row.address.clone(),
        landmark: row.landmark.clone(),
        state: row.state.clone(),
        city: row.city.clone(),
        postcode: row.postcode.clone(),
        tags: row.tags.clone(),
        description: row.description.clone(),
        categories: row.categories.clone(),
        bank_name: row.bank_name.clone(),
        account_number: row.account_number.clone(),
        event_image: row.event_image.clone(),
        created_at: row.created_at.clone(),
        updated_at: row.updated_at.clone(),
    }
}

fn guest_model(row: &GuestRow) -> Guest {
    Guest {
        id: row.id,
        event_id: row.event_id,
        name: row.name.clone(),
        title: row.title.clone(),
        photo: row.photo.clone(),
        created_at: row.created_at.clone(),
        updated_at: row.updated_at.clone(),
    }
}

fn ticket_model(row: &TicketRow) -> Ticket {
    Ticket {
        id: row.id,
        event_id: row.event_id,
        name: row.name.clone(),
        currency: row.currency.clone(),
        price: row.price,
        quantity: row.quantity,
        created_at: row.created_at.clone(),
        updated_at: row.updated_at.clone(),
    }
}
