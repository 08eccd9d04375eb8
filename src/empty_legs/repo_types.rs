use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LegSource {
    Generated,
    Manual,
}

impl LegSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegSource::Generated => "generated",
            LegSource::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EmptyLeg {
    pub id: Uuid,
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
    pub savings_percentage: i32,
    pub currency: String,
    pub is_booked: bool,
    pub is_active: bool,
    pub booked_by: Option<Uuid>,
    pub booking_id: Option<Uuid>,
    pub source: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

pub(crate) const LEG_COLUMNS: &str = "id, from_icao, to_icao, from_city, to_city, from_name, \
     to_name, departure_date, flight_duration_minutes, aircraft_type, aircraft_model, seats, \
     price, regular_price, savings_percentage, currency, is_booked, is_active, booked_by, \
     booking_id, source, created_at, updated_at";
