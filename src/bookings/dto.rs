use serde::Deserialize;
use serde_json::Value;

use super::repo_types::{BookingLeg, BookingStatus, ContactInfo, TripType};

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(default)]
    pub trip_type: TripType,
    pub legs: Vec<BookingLeg>,
    pub passengers: i32,
    pub contact: ContactInfo,
    pub aircraft: Option<Value>,
    pub aircraft_class: Option<String>,
    pub special_requests: Option<String>,
    pub total_price: Option<f64>,
    pub currency: Option<String>,
    /// Ask the upstream pricing API for an estimate and keep its raw answer.
    #[serde(default)]
    pub request_quote: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl Pagination {
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, 100), self.offset.max(0))
    }
}
