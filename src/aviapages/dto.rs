use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PriceLeg {
    pub departure_airport: String,
    pub arrival_airport: String,
    /// ISO 8601 local departure, e.g. `2026-11-02T09:30`.
    pub departure_datetime: String,
    #[serde(default = "default_pax")]
    pub pax: u32,
}

fn default_pax() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct CharterPriceRequest {
    pub legs: Vec<PriceLeg>,
    pub aircraft_class: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuoteRequest {
    pub legs: Vec<PriceLeg>,
    pub aircraft_id: Option<i64>,
    pub aircraft_class: Option<String>,
    pub message: Option<String>,
    pub contact_name: String,
    pub contact_email: String,
    /// Keep the upstream answer on this booking.
    pub booking_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: String,
}

pub(crate) fn validate_legs(legs: &[PriceLeg]) -> Result<(), ApiError> {
    if legs.is_empty() {
        return Err(ApiError::bad_request("At least one leg is required"));
    }
    for leg in legs {
        if leg.departure_airport.trim().is_empty() || leg.arrival_airport.trim().is_empty() {
            return Err(ApiError::bad_request("Departure and arrival airports are required"));
        }
        if leg.departure_datetime.trim().is_empty() {
            return Err(ApiError::bad_request("Departure date is required"));
        }
        if leg.pax == 0 {
            return Err(ApiError::bad_request("Passenger count must be at least 1"));
        }
    }
    Ok(())
}

fn legs_payload(legs: &[PriceLeg]) -> Vec<Value> {
    legs.iter()
        .map(|l| {
            json!({
                "departure_airport": { "icao": l.departure_airport.trim().to_uppercase() },
                "arrival_airport": { "icao": l.arrival_airport.trim().to_uppercase() },
                "departure_datetime": l.departure_datetime,
                "pax": l.pax,
            })
        })
        .collect()
}

impl CharterPriceRequest {
    /// Body in the shape the upstream pricing endpoint expects.
    pub fn to_upstream(&self) -> Value {
        let mut body = json!({
            "legs": legs_payload(&self.legs),
            "currency_code": self.currency.as_deref().unwrap_or("USD"),
        });
        if let Some(class) = &self.aircraft_class {
            body["aircraft"] = json!([{ "aircraft_class": class }]);
        }
        body
    }
}

impl CreateQuoteRequest {
    pub fn to_upstream(&self) -> Value {
        let mut body = json!({
            "legs": legs_payload(&self.legs),
            "comment": self.message.clone().unwrap_or_default(),
            "contact": { "name": self.contact_name, "email": self.contact_email },
        });
        if let Some(id) = self.aircraft_id {
            body["aircraft"] = json!([{ "id": id }]);
        } else if let Some(class) = &self.aircraft_class {
            body["aircraft"] = json!([{ "aircraft_class": class }]);
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(from: &str, to: &str) -> PriceLeg {
        PriceLeg {
            departure_airport: from.into(),
            arrival_airport: to.into(),
            departure_datetime: "2026-11-02T09:30".into(),
            pax: 4,
        }
    }

    #[test]
    fn rejects_empty_or_blank_legs() {
        assert!(validate_legs(&[]).is_err());
        assert!(validate_legs(&[leg("", "LFPB")]).is_err());
        assert!(validate_legs(&[leg("EGLF", "LFPB")]).is_ok());
    }

    #[test]
    fn price_request_uppercases_icao_and_sets_class() {
        let req = CharterPriceRequest {
            legs: vec![leg("eglf", "lfpb")],
            aircraft_class: Some("Light jet".into()),
            currency: None,
        };
        let body = req.to_upstream();
        assert_eq!(body["legs"][0]["departure_airport"]["icao"], "EGLF");
        assert_eq!(body["currency_code"], "USD");
        assert_eq!(body["aircraft"][0]["aircraft_class"], "Light jet");
    }

    #[test]
    fn quote_prefers_aircraft_id_over_class() {
        let req = CreateQuoteRequest {
            legs: vec![leg("KTEB", "KPBI")],
            aircraft_id: Some(42),
            aircraft_class: Some("Heavy jet".into()),
            message: None,
            contact_name: "Ada".into(),
            contact_email: "ada@example.com".into(),
            booking_id: None,
        };
        let body = req.to_upstream();
        assert_eq!(body["aircraft"][0]["id"], 42);
        assert!(body["aircraft"][0].get("aircraft_class").is_none());
    }
}
