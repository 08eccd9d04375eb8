use serde::Serialize;
use serde_json::Value;
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// Local mirror of an upstream aircraft record.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Aircraft {
    pub id: Uuid,
    pub external_id: i64,
    pub registration: Option<String>,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub category: Option<String>,
    pub seats: Option<i32>,
    pub year_of_production: Option<i32>,
    pub home_base: Option<String>,
    pub images: Json<Vec<String>>,
    #[serde(skip_serializing)]
    pub raw: Json<Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_synced_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

pub(crate) const AIRCRAFT_COLUMNS: &str = "id, external_id, registration, model, manufacturer, \
     category, seats, year_of_production, home_base, images, raw, last_synced_at, created_at, \
     updated_at";

/// Fields lifted out of an upstream payload, ready to upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct AircraftRecord {
    pub external_id: i64,
    pub registration: Option<String>,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub category: Option<String>,
    pub seats: Option<i32>,
    pub year_of_production: Option<i32>,
    pub home_base: Option<String>,
    pub images: Vec<String>,
    pub raw: Value,
}
