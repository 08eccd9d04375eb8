use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => anyhow::bail!("unknown booking status {other:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TripType {
    #[default]
    #[serde(rename = "one-way")]
    OneWay,
    #[serde(rename = "round-trip")]
    RoundTrip,
    #[serde(rename = "multi-leg")]
    MultiLeg,
}

impl TripType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::OneWay => "one-way",
            TripType::RoundTrip => "round-trip",
            TripType::MultiLeg => "multi-leg",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingLeg {
    pub from: String,
    pub to: String,
    /// `YYYY-MM-DD`
    pub departure_date: String,
    pub departure_time: Option<String>,
    pub passengers: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Booking record; upstream responses are kept verbatim for audit.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub booking_reference: String,
    pub status: String,
    pub trip_type: String,
    pub legs: Json<Vec<BookingLeg>>,
    pub aircraft: Option<Json<Value>>,
    pub passengers: i32,
    pub contact: Json<ContactInfo>,
    pub special_requests: Option<String>,
    pub total_price: Option<f64>,
    pub currency: String,
    pub empty_leg_id: Option<Uuid>,
    pub upstream_price: Option<Json<Value>>,
    pub upstream_quote: Option<Json<Value>>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub cancelled_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Booking {
    pub fn status(&self) -> anyhow::Result<BookingStatus> {
        self.status.parse()
    }
}

pub(crate) const BOOKING_COLUMNS: &str = "id, user_id, booking_reference, status, trip_type, legs, \
     aircraft, passengers, contact, special_requests, total_price, currency, empty_leg_id, \
     upstream_price, upstream_quote, cancelled_at, created_at, updated_at";

/// Values for a fresh booking row.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: Option<Uuid>,
    pub booking_reference: String,
    pub trip_type: TripType,
    pub legs: Vec<BookingLeg>,
    pub aircraft: Option<Value>,
    pub passengers: i32,
    pub contact: ContactInfo,
    pub special_requests: Option<String>,
    pub total_price: Option<f64>,
    pub currency: String,
    pub empty_leg_id: Option<Uuid>,
    pub upstream_price: Option<Value>,
}
