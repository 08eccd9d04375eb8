use serde::Deserialize;
use time::{macros::format_description, Date, OffsetDateTime, Time};

use crate::{bookings::repo_types::ContactInfo, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct LegFilter {
    /// ICAO code or city fragment.
    pub from: Option<String>,
    pub to: Option<String>,
    /// `YYYY-MM-DD`, inclusive.
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub max_price: Option<f64>,
    pub min_seats: Option<i32>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

/// Filter values ready to bind.
#[derive(Debug, PartialEq)]
pub struct ResolvedFilter {
    pub from: Option<String>,
    pub to: Option<String>,
    pub departs_after: OffsetDateTime,
    pub departs_before: Option<OffsetDateTime>,
    pub max_price: Option<f64>,
    pub min_seats: Option<i32>,
    pub limit: i64,
    pub offset: i64,
}

fn parse_day(raw: &str, field: &str) -> Result<Date, ApiError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| ApiError::bad_request(format!("{field} must be YYYY-MM-DD")))
}

fn non_blank(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl LegFilter {
    /// Past legs are never listed, whatever `date_from` says.
    pub fn resolve(&self, now: OffsetDateTime) -> Result<ResolvedFilter, ApiError> {
        let mut departs_after = now;
        if let Some(raw) = &self.date_from {
            let start = parse_day(raw, "date_from")?.with_time(Time::MIDNIGHT).assume_utc();
            departs_after = departs_after.max(start);
        }
        let departs_before = match &self.date_to {
            Some(raw) => Some(
                parse_day(raw, "date_to")?
                    .next_day()
                    .ok_or_else(|| ApiError::bad_request("date_to is out of range"))?
                    .with_time(Time::MIDNIGHT)
                    .assume_utc(),
            ),
            None => None,
        };
        Ok(ResolvedFilter {
            from: non_blank(&self.from),
            to: non_blank(&self.to),
            departs_after,
            departs_before,
            max_price: self.max_price,
            min_seats: self.min_seats,
            limit: self.limit.clamp(1, 100),
            offset: self.offset.max(0),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct BookLegRequest {
    pub passengers: i32,
    pub contact: ContactInfo,
    pub special_requests: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLegRequest {
    pub from_icao: String,
    pub to_icao: String,
    pub from_city: String,
    pub to_city: String,
    pub from_name: Option<String>,
    pub to_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub departure_date: OffsetDateTime,
    pub flight_duration_minutes: i32,
    pub aircraft_type: String,
    pub aircraft_model: String,
    pub seats: i32,
    pub price: f64,
    pub regular_price: f64,
    pub savings_percentage: Option<i32>,
    pub currency: Option<String>,
}

impl CreateLegRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.from_icao.trim().is_empty() || self.to_icao.trim().is_empty() {
            return Err(ApiError::bad_request("Departure and destination airports are required"));
        }
        if self.from_icao.trim().eq_ignore_ascii_case(self.to_icao.trim()) {
            return Err(ApiError::bad_request("Departure and destination must differ"));
        }
        if self.seats < 1 {
            return Err(ApiError::bad_request("Seats must be at least 1"));
        }
        if self.price < 0.0 || self.regular_price < 0.0 {
            return Err(ApiError::bad_request("Prices cannot be negative"));
        }
        if self.flight_duration_minutes < 0 {
            return Err(ApiError::bad_request("Flight duration cannot be negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateLegRequest {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub departure_date: Option<OffsetDateTime>,
    pub flight_duration_minutes: Option<i32>,
    pub aircraft_type: Option<String>,
    pub aircraft_model: Option<String>,
    pub seats: Option<i32>,
    pub price: Option<f64>,
    pub regular_price: Option<f64>,
    pub savings_percentage: Option<i32>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn date_window_is_inclusive_and_never_in_the_past() {
        let now = datetime!(2026-10-18 12:00 UTC);
        let f = LegFilter {
            date_from: Some("2026-10-01".into()),
            date_to: Some("2026-10-20".into()),
            ..Default::default()
        };
        let r = f.resolve(now).unwrap();
        assert_eq!(r.departs_after, now);
        assert_eq!(r.departs_before, Some(datetime!(2026-10-21 00:00 UTC)));

        let later = LegFilter {
            date_from: Some("2026-11-05".into()),
            ..Default::default()
        };
        assert_eq!(
            later.resolve(now).unwrap().departs_after,
            datetime!(2026-11-05 00:00 UTC)
        );
    }

    #[test]
    fn last_representable_day_is_rejected_not_overflowed() {
        let now = datetime!(2026-10-18 12:00 UTC);
        let f = LegFilter {
            date_to: Some("9999-12-31".into()),
            limit: 20,
            ..Default::default()
        };
        match f.resolve(now) {
            Err(ApiError::BadRequest(msg)) => assert_eq!(msg, "date_to is out of range"),
            other => panic!("expected bad request, got {other:?}"),
        }

        let f = LegFilter {
            date_to: Some("9999-12-30".into()),
            ..Default::default()
        };
        assert_eq!(
            f.resolve(now).unwrap().departs_before,
            Some(datetime!(9999-12-31 00:00 UTC))
        );
    }

    #[test]
    fn bad_dates_and_blank_text_filters() {
        let now = OffsetDateTime::now_utc();
        let f = LegFilter {
            date_to: Some("next week".into()),
            ..Default::default()
        };
        assert!(matches!(f.resolve(now), Err(ApiError::BadRequest(_))));

        let f = LegFilter {
            from: Some("  ".into()),
            to: Some(" Paris ".into()),
            limit: 1000,
            offset: -3,
            ..Default::default()
        };
        let r = f.resolve(now).unwrap();
        assert_eq!(r.from, None);
        assert_eq!(r.to.as_deref(), Some("Paris"));
        assert_eq!((r.limit, r.offset), (100, 0));
    }
}
