use rand::Rng;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::{
    pricing::{quote_route, savings_percentage, Route},
    repo_types::EmptyLeg,
    store::LegStore,
};
use crate::{
    bookings::repo_types::{Booking, BookingLeg, ContactInfo, NewBooking, TripType},
    error::ApiError,
    mailer::OutgoingEmail,
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RefreshSummary {
    pub updated: u32,
    pub inserted: u32,
    pub failed: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
}

enum Applied {
    Updated,
    Inserted,
}

async fn refresh_route<S, R>(
    store: &S,
    route: &Route,
    rng: &mut R,
    now: OffsetDateTime,
) -> anyhow::Result<Applied>
where
    S: LegStore + ?Sized,
    R: Rng + Send,
{
    let quote = quote_route(route, rng, now)?;
    match store.find_open_leg(route.from, route.to).await? {
        Some(id) => {
            store.update_leg_quote(id, &quote).await?;
            debug!(%id, from = route.from, to = route.to, price = quote.price, "leg repriced");
            Ok(Applied::Updated)
        }
        None => {
            let id = store.insert_leg_quote(&quote).await?;
            debug!(%id, from = route.from, to = route.to, price = quote.price, "leg created");
            Ok(Applied::Inserted)
        }
    }
}

/// Reprices every route: the open leg is overwritten when one exists,
/// otherwise a new generated leg is inserted. A failing route is logged
/// and counted; the rest still run.
pub async fn update_all_route_prices<S, R>(
    store: &S,
    routes: &[Route],
    rng: &mut R,
    now: OffsetDateTime,
) -> RefreshSummary
where
    S: LegStore + ?Sized,
    R: Rng + Send,
{
    let started_at = OffsetDateTime::now_utc();
    let (mut updated, mut inserted, mut failed) = (0, 0, 0);

    for route in routes {
        match refresh_route(store, route, rng, now).await {
            Ok(Applied::Updated) => updated += 1,
            Ok(Applied::Inserted) => inserted += 1,
            Err(e) => {
                failed += 1;
                warn!(error = ?e, from = route.from, to = route.to, "route price refresh failed");
            }
        }
    }

    let summary = RefreshSummary {
        updated,
        inserted,
        failed,
        started_at,
        finished_at: OffsetDateTime::now_utc(),
    };
    info!(updated, inserted, failed, "empty-leg prices refreshed");
    summary
}

/// Savings stored with a leg: the caller's value when given, else derived.
pub fn resolve_savings(explicit: Option<i32>, regular_price: f64, price: f64) -> i32 {
    explicit.unwrap_or_else(|| savings_percentage(regular_price, price))
}

pub fn check_bookable(leg: &EmptyLeg, passengers: i32, now: OffsetDateTime) -> Result<(), ApiError> {
    if leg.is_booked {
        return Err(ApiError::bad_request("Empty leg is already booked"));
    }
    if !leg.is_active {
        return Err(ApiError::bad_request("Empty leg is no longer available"));
    }
    if leg.departure_date <= now {
        return Err(ApiError::bad_request("Empty leg has already departed"));
    }
    if passengers < 1 || passengers > leg.seats {
        return Err(ApiError::bad_request(format!(
            "Passengers must be between 1 and {}",
            leg.seats
        )));
    }
    Ok(())
}

pub fn booking_for_leg(
    leg: &EmptyLeg,
    user_id: uuid::Uuid,
    reference: String,
    passengers: i32,
    contact: ContactInfo,
    special_requests: Option<String>,
) -> NewBooking {
    NewBooking {
        user_id: Some(user_id),
        booking_reference: reference,
        trip_type: TripType::OneWay,
        legs: vec![BookingLeg {
            from: leg.from_icao.clone(),
            to: leg.to_icao.clone(),
            departure_date: leg.departure_date.date().to_string(),
            departure_time: Some(format!(
                "{:02}:{:02}",
                leg.departure_date.hour(),
                leg.departure_date.minute()
            )),
            passengers: Some(passengers),
        }],
        aircraft: Some(serde_json::json!({
            "category": leg.aircraft_type,
            "model": leg.aircraft_model,
            "seats": leg.seats,
        })),
        passengers,
        contact,
        special_requests,
        total_price: Some(leg.price),
        currency: leg.currency.clone(),
        empty_leg_id: Some(leg.id),
        upstream_price: None,
    }
}

pub fn leg_confirmation_email(leg: &EmptyLeg, booking: &Booking) -> OutgoingEmail {
    OutgoingEmail {
        to: booking.contact.email.clone(),
        subject: format!("Empty leg reserved: {}", booking.booking_reference),
        body: format!(
            "Hello {},\n\n\
             Your empty leg {} ({}) to {} ({}) departing {} is reserved.\n\
             Aircraft: {} ({} seats)\n\
             Price: {:.0} {} (you save {}%)\n\
             Reference: {}\n\n\
             Our team will confirm the flight shortly.\n",
            booking.contact.name,
            leg.from_city,
            leg.from_icao,
            leg.to_city,
            leg.to_icao,
            leg.departure_date.date(),
            leg.aircraft_model,
            leg.seats,
            leg.price,
            leg.currency,
            leg.savings_percentage,
            booking.booking_reference,
        ),
        reply_to: None,
    }
}
