use anyhow::Context;
use serde_json::Value;
use sqlx::{types::Json, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::{Booking, BookingStatus, NewBooking, BOOKING_COLUMNS};

/// Insert within a caller-owned transaction.
pub async fn insert_tx(tx: &mut Transaction<'_, Postgres>, new: &NewBooking) -> anyhow::Result<Booking> {
    let booking = sqlx::query_as::<_, Booking>(&format!(
        r#"
        INSERT INTO bookings
            (id, user_id, booking_reference, status, trip_type, legs, aircraft, passengers,
             contact, special_requests, total_price, currency, empty_leg_id, upstream_price)
        VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING {BOOKING_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(new.user_id)
    .bind(&new.booking_reference)
    .bind(new.trip_type.as_str())
    .bind(Json(&new.legs))
    .bind(new.aircraft.as_ref().map(Json))
    .bind(new.passengers)
    .bind(Json(&new.contact))
    .bind(new.special_requests.as_deref())
    .bind(new.total_price)
    .bind(&new.currency)
    .bind(new.empty_leg_id)
    .bind(new.upstream_price.as_ref().map(Json))
    .fetch_one(&mut **tx)
    .await
    .context("insert booking")?;
    Ok(booking)
}

pub async fn insert(db: &PgPool, new: &NewBooking) -> anyhow::Result<Booking> {
    let mut tx = db.begin().await.context("begin tx")?;
    let booking = insert_tx(&mut tx, new).await?;
    tx.commit().await.context("commit tx")?;
    Ok(booking)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Booking>> {
    let row = sqlx::query_as::<_, Booking>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn find_by_reference(db: &PgPool, reference: &str) -> anyhow::Result<Option<Booking>> {
    let row = sqlx::query_as::<_, Booking>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_reference = $1"
    ))
    .bind(reference)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Booking>> {
    let rows = sqlx::query_as::<_, Booking>(&format!(
        r#"
        SELECT {BOOKING_COLUMNS}
          FROM bookings
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT $2 OFFSET $3
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Cancels a pending/confirmed booking and frees its empty leg, if any.
/// Returns `None` when the booking was no longer cancellable.
pub async fn cancel(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Booking>> {
    let mut tx = db.begin().await.context("begin tx")?;
    let booking = sqlx::query_as::<_, Booking>(&format!(
        r#"
        UPDATE bookings
           SET status = 'cancelled', cancelled_at = now(), updated_at = now()
         WHERE id = $1 AND status IN ('pending', 'confirmed')
        RETURNING {BOOKING_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await
    .context("cancel booking")?;

    if let Some(leg_id) = booking.as_ref().and_then(|b| b.empty_leg_id) {
        sqlx::query(
            r#"
            UPDATE empty_legs
               SET is_booked = false, booked_by = NULL, booking_id = NULL, updated_at = now()
             WHERE id = $1 AND booking_id = $2 AND departure_date > now()
            "#,
        )
        .bind(leg_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("release empty leg")?;
    }
    tx.commit().await.context("commit tx")?;
    Ok(booking)
}

pub async fn set_status(db: &PgPool, id: Uuid, status: BookingStatus) -> anyhow::Result<Option<Booking>> {
    let row = sqlx::query_as::<_, Booking>(&format!(
        r#"
        UPDATE bookings
           SET status = $2, updated_at = now()
         WHERE id = $1 AND status <> 'cancelled'
        RETURNING {BOOKING_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Stores a raw upstream quote on the owner's booking. False when the booking
/// does not exist or belongs to someone else.
pub async fn attach_quote(db: &PgPool, id: Uuid, user_id: Uuid, quote: &Value) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        UPDATE bookings
           SET upstream_quote = $3, updated_at = now()
         WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(Json(quote))
    .execute(db)
    .await
    .context("attach quote")?;
    Ok(res.rows_affected() > 0)
}
