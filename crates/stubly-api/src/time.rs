use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Canonical storage format for every date column.
pub const WALL_CLOCK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Normalize a date/time value to `YYYY-MM-DD HH:MM:SS`. Clients send RFC
/// 3339 stamps, `T`-separated or space-separated local stamps with or
/// without seconds, or a bare date (taken as midnight).
pub fn normalize_wall_clock(input: &str) -> Result<String> {
    Ok(parse_wall_clock(input)?.format(WALL_CLOCK_FORMAT).to_string())
}

/// Normalize a start/end time to a full wall-clock stamp. A bare `HH:MM`
/// or `HH:MM:SS` takes its date part from the event's (already normalized)
/// date, so date and startTime always recombine cleanly.
pub fn normalize_event_time(event_date: &str, input: &str) -> Result<String> {
    if let Ok(normalized) = normalize_wall_clock(input) {
        return Ok(normalized);
    }

    let date = parse_wall_clock(event_date)?.date();
    let time = parse_time_part(input)?;
    Ok(NaiveDateTime::new(date, time).format(WALL_CLOCK_FORMAT).to_string())
}

/// The UTC instant an event begins: date part of `date`, time part of
/// `startTime`. This is the expiry instant for event access tokens.
pub fn event_start(date: &str, start_time: &str) -> Result<DateTime<Utc>> {
    let date = parse_wall_clock(date)?.date();
    let time = parse_time_part(start_time)?;
    Ok(NaiveDateTime::new(date, time).and_utc())
}

fn parse_wall_clock(input: &str) -> Result<NaiveDateTime> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc).naive_utc());
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    Err(anyhow!("Unrecognized date/time value: {:?}", input))
}

fn parse_time_part(input: &str) -> Result<NaiveTime> {
    let input = input.trim();

    // Full stamps contribute their time-of-day.
    if let Ok(dt) = parse_wall_clock(input) {
        return Ok(dt.time());
    }

    for format in ["%H:%M:%S", "%H:%M"] {
        if let Ok(time) = NaiveTime::parse_from_str(input, format) {
            return Ok(time);
        }
    }

    Err(anyhow!("Unrecognized time value: {:?}", input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn normalize_accepts_every_client_format() {
        assert_eq!(normalize_wall_clock("2030-06-01T18:30:00.000Z").unwrap(), "2030-06-01 18:30:00");
        assert_eq!(normalize_wall_clock("2030-06-01T18:30:00").unwrap(), "2030-06-01 18:30:00");
        assert_eq!(normalize_wall_clock("2030-06-01 18:30:00").unwrap(), "2030-06-01 18:30:00");
        assert_eq!(normalize_wall_clock("2030-06-01 18:30").unwrap(), "2030-06-01 18:30:00");
        assert_eq!(normalize_wall_clock("2030-06-01").unwrap(), "2030-06-01 00:00:00");
        assert_eq!(normalize_wall_clock("  2030-06-01  ").unwrap(), "2030-06-01 00:00:00");
    }

    #[test]
    fn normalize_respects_rfc3339_offsets() {
        assert_eq!(normalize_wall_clock("2030-06-01T18:30:00+01:00").unwrap(), "2030-06-01 17:30:00");
    }

    #[test]
    fn normalize_rejects_garbage() {
        assert!(normalize_wall_clock("not-a-date").is_err());
        assert!(normalize_wall_clock("").is_err());
        assert!(normalize_wall_clock("18:30").is_err());
    }

    #[test]
    fn normalize_event_time_borrows_the_event_date_for_bare_times() {
        assert_eq!(normalize_event_time("2030-06-01 00:00:00", "18:00").unwrap(), "2030-06-01 18:00:00");
        assert_eq!(normalize_event_time("2030-06-01 00:00:00", "18:00:30").unwrap(), "2030-06-01 18:00:30");
        // Full stamps pass through unchanged.
        assert_eq!(
            normalize_event_time("2030-06-01 00:00:00", "2030-06-02 09:00:00").unwrap(),
            "2030-06-02 09:00:00"
        );
        assert!(normalize_event_time("2030-06-01 00:00:00", "late").is_err());
    }

    #[test]
    fn event_start_combines_date_and_time_parts() {
        let expected = Utc.with_ymd_and_hms(2030, 6, 1, 18, 0, 0).unwrap();

        assert_eq!(event_start("2030-06-01 00:00:00", "2030-06-01 18:00:00").unwrap(), expected);
        assert_eq!(event_start("2030-06-01", "18:00").unwrap(), expected);
        // The date part of startTime is ignored; only its time-of-day counts.
        assert_eq!(event_start("2030-06-01 00:00:00", "1999-01-01 18:00:00").unwrap(), expected);
    }
}
