use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::search;

use super::{
    dto::{CreateLegRequest, ResolvedFilter, UpdateLegRequest},
    repo_types::{EmptyLeg, LegSource, LEG_COLUMNS},
};

/// Active, unbooked legs departing inside the filter window, soonest first.
pub async fn list_available(db: &PgPool, f: &ResolvedFilter) -> anyhow::Result<Vec<EmptyLeg>> {
    let rows = sqlx::query_as::<_, EmptyLeg>(&format!(
        r#"
        SELECT {LEG_COLUMNS}
          FROM empty_legs
         WHERE is_active AND NOT is_booked
           AND departure_date > $1
           AND ($2::timestamptz IS NULL OR departure_date < $2)
           AND ($3::text IS NULL OR from_icao = upper($3) OR from_city ILIKE $9)
           AND ($4::text IS NULL OR to_icao = upper($4) OR to_city ILIKE $10)
           AND ($5::float8 IS NULL OR price <= $5)
           AND ($6::int4 IS NULL OR seats >= $6)
         ORDER BY departure_date
         LIMIT $7 OFFSET $8
        "#
    ))
    .bind(f.departs_after)
    .bind(f.departs_before)
    .bind(f.from.as_deref())
    .bind(f.to.as_deref())
    .bind(f.max_price)
    .bind(f.min_seats)
    .bind(f.limit)
    .bind(f.offset)
    .bind(f.from.as_deref().map(search::contains))
    .bind(f.to.as_deref().map(search::contains))
    .fetch_all(db)
    .await
    .context("list empty legs")?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<EmptyLeg>> {
    let row = sqlx::query_as::<_, EmptyLeg>(&format!(
        "SELECT {LEG_COLUMNS} FROM empty_legs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn create_manual(
    db: &PgPool,
    req: &CreateLegRequest,
    savings_percentage: i32,
) -> anyhow::Result<EmptyLeg> {
    let row = sqlx::query_as::<_, EmptyLeg>(&format!(
        r#"
        INSERT INTO empty_legs
            (id, from_icao, to_icao, from_city, to_city, from_name, to_name, departure_date,
             flight_duration_minutes, aircraft_type, aircraft_model, seats, price, regular_price,
             savings_percentage, currency, source)
        VALUES ($1, upper($2), upper($3), $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        RETURNING {LEG_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(req.from_icao.trim())
    .bind(req.to_icao.trim())
    .bind(req.from_city.trim())
    .bind(req.to_city.trim())
    .bind(req.from_name.as_deref())
    .bind(req.to_name.as_deref())
    .bind(req.departure_date)
    .bind(req.flight_duration_minutes)
    .bind(&req.aircraft_type)
    .bind(&req.aircraft_model)
    .bind(req.seats)
    .bind(req.price)
    .bind(req.regular_price)
    .bind(savings_percentage)
    .bind(req.currency.as_deref().unwrap_or("USD"))
    .bind(LegSource::Manual.as_str())
    .fetch_one(db)
    .await
    .context("insert manual leg")?;
    Ok(row)
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    req: &UpdateLegRequest,
    savings_percentage: Option<i32>,
) -> anyhow::Result<Option<EmptyLeg>> {
    let row = sqlx::query_as::<_, EmptyLeg>(&format!(
        r#"
        UPDATE empty_legs
           SET departure_date = COALESCE($2, departure_date),
               flight_duration_minutes = COALESCE($3, flight_duration_minutes),
               aircraft_type = COALESCE($4, aircraft_type),
               aircraft_model = COALESCE($5, aircraft_model),
               seats = COALESCE($6, seats),
               price = COALESCE($7, price),
               regular_price = COALESCE($8, regular_price),
               savings_percentage = COALESCE($9, savings_percentage),
               is_active = COALESCE($10, is_active),
               updated_at = now()
         WHERE id = $1
        RETURNING {LEG_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(req.departure_date)
    .bind(req.flight_duration_minutes)
    .bind(req.aircraft_type.as_deref())
    .bind(req.aircraft_model.as_deref())
    .bind(req.seats)
    .bind(req.price)
    .bind(req.regular_price)
    .bind(savings_percentage)
    .bind(req.is_active)
    .fetch_optional(db)
    .await
    .context("update empty leg")?;
    Ok(row)
}

pub async fn deactivate(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("UPDATE empty_legs SET is_active = false, updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("deactivate empty leg")?;
    Ok(res.rows_affected() > 0)
}

/// Row-locks the leg for the rest of the booking transaction.
pub async fn lock_for_booking(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> anyhow::Result<Option<EmptyLeg>> {
    let row = sqlx::query_as::<_, EmptyLeg>(&format!(
        "SELECT {LEG_COLUMNS} FROM empty_legs WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .context("lock empty leg")?;
    Ok(row)
}

/// Marks the leg booked only while it is still open. `false` means someone
/// else got there first.
pub async fn mark_booked(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    user_id: Uuid,
    booking_id: Uuid,
) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        UPDATE empty_legs
           SET is_booked = true, booked_by = $2, booking_id = $3, updated_at = now()
         WHERE id = $1 AND NOT is_booked AND is_active AND departure_date > now()
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(booking_id)
    .execute(&mut **tx)
    .await
    .context("mark leg booked")?;
    Ok(res.rows_affected() == 1)
}
