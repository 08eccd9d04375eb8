use anyhow::Context;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::search::{contains, escape_like};

use super::{
    dto::AircraftFilter,
    repo_types::{Aircraft, AircraftRecord, AIRCRAFT_COLUMNS},
};

pub async fn list(db: &PgPool, f: &AircraftFilter) -> anyhow::Result<Vec<Aircraft>> {
    let (limit, offset) = f.clamped();
    let search = f.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let category = f.category.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let rows = sqlx::query_as::<_, Aircraft>(&format!(
        r#"
        SELECT {AIRCRAFT_COLUMNS}
          FROM aircraft
         WHERE ($1::text IS NULL OR category ILIKE $1)
           AND ($2::int4 IS NULL OR seats >= $2)
           AND ($3::text IS NULL
                OR model ILIKE $3
                OR manufacturer ILIKE $3
                OR registration ILIKE $3)
         ORDER BY model NULLS LAST, registration
         LIMIT $4 OFFSET $5
        "#
    ))
    .bind(category.map(escape_like))
    .bind(f.min_seats)
    .bind(search.map(contains))
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list aircraft")?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Aircraft>> {
    let row = sqlx::query_as::<_, Aircraft>(&format!(
        "SELECT {AIRCRAFT_COLUMNS} FROM aircraft WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn find_by_external_id(db: &PgPool, external_id: i64) -> anyhow::Result<Option<Aircraft>> {
    let row = sqlx::query_as::<_, Aircraft>(&format!(
        "SELECT {AIRCRAFT_COLUMNS} FROM aircraft WHERE external_id = $1"
    ))
    .bind(external_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn upsert(db: &PgPool, rec: &AircraftRecord) -> anyhow::Result<Aircraft> {
    let row = sqlx::query_as::<_, Aircraft>(&format!(
        r#"
        INSERT INTO aircraft
            (id, external_id, registration, model, manufacturer, category, seats,
             year_of_production, home_base, images, raw, last_synced_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, now())
        ON CONFLICT (external_id) DO UPDATE
           SET registration = EXCLUDED.registration,
               model = EXCLUDED.model,
               manufacturer = EXCLUDED.manufacturer,
               category = EXCLUDED.category,
               seats = EXCLUDED.seats,
               year_of_production = EXCLUDED.year_of_production,
               home_base = EXCLUDED.home_base,
               images = EXCLUDED.images,
               raw = EXCLUDED.raw,
               last_synced_at = now(),
               updated_at = now()
        RETURNING {AIRCRAFT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(rec.external_id)
    .bind(rec.registration.as_deref())
    .bind(rec.model.as_deref())
    .bind(rec.manufacturer.as_deref())
    .bind(rec.category.as_deref())
    .bind(rec.seats)
    .bind(rec.year_of_production)
    .bind(rec.home_base.as_deref())
    .bind(Json(&rec.images))
    .bind(Json(&rec.raw))
    .fetch_one(db)
    .await
    .with_context(|| format!("upsert aircraft {}", rec.external_id))?;
    Ok(row)
}
