use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotifyVia {
    #[default]
    Email,
    Sms,
    Both,
}

impl NotifyVia {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyVia::Email => "email",
            NotifyVia::Sms => "sms",
            NotifyVia::Both => "both",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAlertRequest {
    pub from_location: String,
    pub to_location: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date_from: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date_to: Option<OffsetDateTime>,
    #[serde(default = "one")]
    pub passengers: i32,
    pub max_price: Option<f64>,
    #[serde(default)]
    pub notify_via: NotifyVia,
}

fn one() -> i32 {
    1
}

impl CreateAlertRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.from_location.trim().is_empty() || self.to_location.trim().is_empty() {
            return Err(ApiError::bad_request("From and to locations are required"));
        }
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(ApiError::bad_request("date_from must not be after date_to"));
            }
        }
        if self.passengers < 1 {
            return Err(ApiError::bad_request("Passengers must be at least 1"));
        }
        if matches!(self.max_price, Some(p) if p <= 0.0) {
            return Err(ApiError::bad_request("max_price must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> CreateAlertRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn defaults_to_email_and_one_passenger() {
        let req = parse(r#"{"from_location":"London","to_location":"Nice"}"#);
        assert_eq!(req.notify_via, NotifyVia::Email);
        assert_eq!(req.passengers, 1);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_date_range() {
        let req = parse(
            r#"{"from_location":"KTEB","to_location":"KMIA",
                "date_from":"2026-12-10T00:00:00Z","date_to":"2026-12-01T00:00:00Z"}"#,
        );
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_blank_locations() {
        let req = parse(r#"{"from_location":" ","to_location":"KMIA","notify_via":"sms"}"#);
        assert_eq!(req.notify_via, NotifyVia::Sms);
        assert!(req.validate().is_err());
    }
}
