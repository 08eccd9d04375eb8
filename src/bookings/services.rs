use rand::Rng;

use super::{
    dto::CreateBookingRequest,
    repo_types::{Booking, BookingLeg, BookingStatus, TripType},
};
use crate::{
    auth::services::is_valid_email,
    aviapages::dto::{CharterPriceRequest, PriceLeg},
    error::ApiError,
    mailer::OutgoingEmail,
};

pub const MAX_PASSENGERS: i32 = 19;

const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Human-facing booking code, e.g. `JC-7KQ2MZ4P`.
pub fn generate_reference<R: Rng>(rng: &mut R) -> String {
    let code: String = (0..8)
        .map(|_| REFERENCE_ALPHABET[rng.gen_range(0..REFERENCE_ALPHABET.len())] as char)
        .collect();
    format!("JC-{code}")
}

#[derive(Debug, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancel,
    AlreadyCancelled,
}

/// Completed trips cannot be cancelled; cancelling twice is a no-op.
pub fn plan_cancel(status: BookingStatus) -> Result<CancelOutcome, ApiError> {
    match status {
        BookingStatus::Pending | BookingStatus::Confirmed => Ok(CancelOutcome::Cancel),
        BookingStatus::Cancelled => Ok(CancelOutcome::AlreadyCancelled),
        BookingStatus::Completed => Err(ApiError::bad_request("Cannot cancel a completed booking")),
    }
}

/// Admin status moves. Cancellation has its own endpoint.
pub fn check_status_change(from: BookingStatus, to: BookingStatus) -> Result<(), ApiError> {
    use BookingStatus::*;
    match (from, to) {
        (_, Cancelled) => Err(ApiError::bad_request("Use the cancel endpoint to cancel a booking")),
        (Cancelled, _) => Err(ApiError::bad_request("Booking is cancelled")),
        (a, b) if a == b => Ok(()),
        (Pending, Confirmed) | (Pending, Completed) | (Confirmed, Completed) => Ok(()),
        (a, b) => Err(ApiError::bad_request(format!("Cannot move booking from {a} to {b}"))),
    }
}

pub fn validate_create(req: &CreateBookingRequest) -> Result<(), ApiError> {
    let legs = req.legs.len();
    match req.trip_type {
        TripType::OneWay if legs != 1 => {
            return Err(ApiError::bad_request("One-way trips need exactly one leg"))
        }
        TripType::RoundTrip if legs != 2 => {
            return Err(ApiError::bad_request("Round trips need exactly two legs"))
        }
        TripType::MultiLeg if legs < 2 => {
            return Err(ApiError::bad_request("Multi-leg trips need at least two legs"))
        }
        _ => {}
    }
    for leg in &req.legs {
        validate_leg(leg)?;
    }
    if !(1..=MAX_PASSENGERS).contains(&req.passengers) {
        return Err(ApiError::bad_request(format!(
            "Passengers must be between 1 and {MAX_PASSENGERS}"
        )));
    }
    if req.contact.name.trim().is_empty() {
        return Err(ApiError::bad_request("Contact name is required"));
    }
    if !is_valid_email(req.contact.email.trim()) {
        return Err(ApiError::bad_request("Valid contact email is required"));
    }
    if matches!(req.total_price, Some(p) if p < 0.0) {
        return Err(ApiError::bad_request("Price cannot be negative"));
    }
    Ok(())
}

fn validate_leg(leg: &BookingLeg) -> Result<(), ApiError> {
    let from = leg.from.trim();
    let to = leg.to.trim();
    if from.is_empty() || to.is_empty() {
        return Err(ApiError::bad_request("Each leg needs a departure and destination"));
    }
    if from.eq_ignore_ascii_case(to) {
        return Err(ApiError::bad_request("Departure and destination must differ"));
    }
    if leg.departure_date.trim().is_empty() {
        return Err(ApiError::bad_request("Each leg needs a departure date"));
    }
    Ok(())
}

/// Upstream pricing request for the booked itinerary.
pub fn price_request(req: &CreateBookingRequest) -> CharterPriceRequest {
    CharterPriceRequest {
        legs: req
            .legs
            .iter()
            .map(|l| PriceLeg {
                departure_airport: l.from.clone(),
                arrival_airport: l.to.clone(),
                departure_datetime: format!(
                    "{}T{}",
                    l.departure_date.trim(),
                    l.departure_time.as_deref().unwrap_or("12:00")
                ),
                pax: l.passengers.unwrap_or(req.passengers).max(1) as u32,
            })
            .collect(),
        aircraft_class: req.aircraft_class.clone(),
        currency: req.currency.clone(),
    }
}

pub fn confirmation_email(booking: &Booking) -> OutgoingEmail {
    let itinerary = booking
        .legs
        .0
        .iter()
        .map(|l| {
            format!(
                "  {} -> {} on {}{}",
                l.from,
                l.to,
                l.departure_date,
                l.departure_time
                    .as_deref()
                    .map(|t| format!(" at {t}"))
                    .unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let price = booking
        .total_price
        .map(|p| format!("{:.0} {}", p, booking.currency))
        .unwrap_or_else(|| "to be quoted".into());
    OutgoingEmail {
        to: booking.contact.0.email.clone(),
        subject: format!("Booking request {} received", booking.booking_reference),
        body: format!(
            "Hello {},\n\nWe have received your charter request {}.\n\n\
             Itinerary:\n{}\n\nPassengers: {}\nPrice: {}\nStatus: {}\n\n\
             Our team will contact you shortly to confirm the details.",
            booking.contact.0.name,
            booking.booking_reference,
            itinerary,
            booking.passengers,
            price,
            booking.status,
        ),
        reply_to: None,
    }
}
