use anyhow::Result;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use stubly_db::models::{EventRow, UserRow};
use stubly_types::api::{EventTokenClaims, UserClaims};

use crate::error::ApiError;
use crate::time;

/// Sign a session token for a logged-in account.
pub fn issue_user_token(
    user: &UserRow,
    secret: &str,
    expiry_secs: i64,
    now: DateTime<Utc>,
) -> Result<String> {
    let claims = UserClaims {
        id: user.id,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
        exp: (now.timestamp() + expiry_secs) as usize,
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))?;

    Ok(token)
}

pub fn verify_user_token(token: &str, secret: &str) -> Result<UserClaims, ApiError> {
    decode::<UserClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &strict_validation())
        .map(|data| data.claims)
        .map_err(|_| ApiError::Auth("Invalid or expired token".to_string()))
}

/// Sign the access token for an event page. Expiry is pinned to the event's
/// scheduled start, so the shareable link dies the moment the event begins.
/// An event already under way gets a token that is expired on arrival.
pub fn issue_event_token(event: &EventRow, secret: &str, now: DateTime<Utc>) -> Result<String> {
    let start = time::event_start(&event.date, &event.start_time)?;
    let expires_in = (start - now).num_seconds().max(0);

    let claims = EventTokenClaims {
        id: event.id,
        title: event.title.clone(),
        date: event.date.clone(),
        city: event.city.clone(),
        start_time: event.start_time.clone(),
        exp: (now.timestamp() + expires_in) as usize,
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))?;

    Ok(token)
}

pub fn verify_event_token(token: &str, secret: &str) -> Result<EventTokenClaims, ApiError> {
    decode::<EventTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &strict_validation(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Auth("Invalid or expired event token".to_string()))
}

/// HS256 with no expiry leeway. The default 60-second grace window would
/// keep event links alive for a minute past their start.
fn strict_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use stubly_db::Database;
    use stubly_db::models::{NewEvent, NewTicket};

    const SECRET: &str = "test-event-secret";

    fn sample_event(date: &str, start_time: &str) -> EventRow {
        let db = Database::open_in_memory().unwrap();
        let event = NewEvent {
            title: "Launch Party".to_string(),
            date: date.to_string(),
            start_time: start_time.to_string(),
            end_time: start_time.to_string(),
            creator: "ada@example.com".to_string(),
            address: "1 Marina Road".to_string(),
            landmark: None,
            state: "Lagos".to_string(),
            city: "Ikeja".to_string(),
            postcode: "100001".to_string(),
            tags: None,
            description: "Product launch".to_string(),
            categories: "Tech".to_string(),
            bank_name: "Access Bank".to_string(),
            account_number: "0123456789".to_string(),
            event_image: None,
        };
        let tickets = [NewTicket {
            name: "GA".to_string(),
            currency: "NGN".to_string(),
            price: 1000.0,
            quantity: 10,
        }];
        db.create_event(&event, &[], &tickets).unwrap()
    }

    fn decode_without_expiry_check(token: &str) -> EventTokenClaims {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        decode::<EventTokenClaims>(token, &DecodingKey::from_secret(SECRET.as_bytes()), &validation)
            .unwrap()
            .claims
    }

    #[test]
    fn event_token_expires_exactly_at_the_event_start() {
        let event = sample_event("2030-06-01 00:00:00", "2030-06-01 18:00:00");
        let now = Utc.with_ymd_and_hms(2030, 6, 1, 16, 0, 0).unwrap();

        let token = issue_event_token(&event, SECRET, now).unwrap();
        let claims = decode_without_expiry_check(&token);

        assert_eq!(claims.exp as i64, now.timestamp() + 2 * 3600);
        assert_eq!(claims.exp as i64, Utc.with_ymd_and_hms(2030, 6, 1, 18, 0, 0).unwrap().timestamp());
    }

    #[test]
    fn event_token_combines_bare_date_and_time_fields() {
        let event = sample_event("2030-06-01", "18:00");
        let now = Utc.with_ymd_and_hms(2030, 6, 1, 17, 30, 0).unwrap();

        let token = issue_event_token(&event, SECRET, now).unwrap();
        let claims = decode_without_expiry_check(&token);

        assert_eq!(claims.exp as i64, now.timestamp() + 30 * 60);
    }

    #[test]
    fn event_already_under_way_gets_a_zero_lifetime_token() {
        let event = sample_event("2020-01-01 00:00:00", "2020-01-01 18:00:00");
        let now = Utc.with_ymd_and_hms(2020, 1, 1, 19, 0, 0).unwrap();

        let token = issue_event_token(&event, SECRET, now).unwrap();
        let claims = decode_without_expiry_check(&token);

        // Expiry is clamped to issue time, never set in the past.
        assert_eq!(claims.exp as i64, now.timestamp());
        assert!(verify_event_token(&token, SECRET).is_err());
    }

    #[test]
    fn fresh_event_token_round_trips_its_payload() {
        let event = sample_event("2030-06-01 00:00:00", "2030-06-01 18:00:00");

        let token = issue_event_token(&event, SECRET, Utc::now()).unwrap();
        let claims = verify_event_token(&token, SECRET).unwrap();

        assert_eq!(claims.id, event.id);
        assert_eq!(claims.title, "Launch Party");
        assert_eq!(claims.date, event.date);
        assert_eq!(claims.city, "Ikeja");
        assert_eq!(claims.start_time, event.start_time);
    }

    #[test]
    fn event_token_rejects_the_wrong_secret() {
        let event = sample_event("2030-06-01 00:00:00", "2030-06-01 18:00:00");

        let token = issue_event_token(&event, SECRET, Utc::now()).unwrap();

        assert!(verify_event_token(&token, "some-other-secret").is_err());
    }

    #[test]
    fn expired_event_token_is_rejected_after_the_start_instant() {
        // Event started long ago; a token issued shortly before the start
        // carries an exp that has since passed.
        let event = sample_event("2020-01-01 00:00:00", "2020-01-01 18:00:00");
        let issued_at = Utc.with_ymd_and_hms(2020, 1, 1, 17, 0, 0).unwrap();

        let token = issue_event_token(&event, SECRET, issued_at).unwrap();

        assert!(verify_event_token(&token, SECRET).is_err());
    }

    #[test]
    fn user_token_round_trips_and_honors_expiry() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("Ada", "Lovelace", "ada@example.com", "hash").unwrap();

        let now = Utc::now();
        let token = issue_user_token(&user, "user-secret", 3600, now).unwrap();
        let claims = verify_user_token(&token, "user-secret").unwrap();

        assert_eq!(claims.id, user.id);
        assert_eq!(claims.first_name, "Ada");
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.exp as i64, now.timestamp() + 3600);

        let stale = issue_user_token(&user, "user-secret", -10, now).unwrap();
        assert!(verify_user_token(&stale, "user-secret").is_err());
    }
}
