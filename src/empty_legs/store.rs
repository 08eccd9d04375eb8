use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{pricing::RouteQuote, repo_types::LegSource};

/// Persistence seam for the route price refresh.
#[async_trait]
pub trait LegStore: Send + Sync {
    /// Soonest active, unbooked, future leg on `from -> to`.
    async fn find_open_leg(&self, from: &str, to: &str) -> anyhow::Result<Option<Uuid>>;
    async fn update_leg_quote(&self, id: Uuid, quote: &RouteQuote) -> anyhow::Result<()>;
    async fn insert_leg_quote(&self, quote: &RouteQuote) -> anyhow::Result<Uuid>;
}

#[derive(Clone)]
pub struct PgLegStore {
    db: PgPool,
}

impl PgLegStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LegStore for PgLegStore {
    async fn find_open_leg(&self, from: &str, to: &str) -> anyhow::Result<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM empty_legs
             WHERE from_icao = $1 AND to_icao = $2
               AND is_active AND NOT is_booked AND departure_date > now()
             ORDER BY departure_date
             LIMIT 1
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_optional(&self.db)
        .await
        .context("find open leg")?;
        Ok(id)
    }

    async fn update_leg_quote(&self, id: Uuid, q: &RouteQuote) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE empty_legs
               SET price = $2, regular_price = $3, savings_percentage = $4,
                   aircraft_type = $5, aircraft_model = $6, seats = $7,
                   flight_duration_minutes = $8, departure_date = $9, updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(q.price)
        .bind(q.regular_price)
        .bind(q.savings_percentage)
        .bind(q.aircraft.category)
        .bind(q.aircraft.model)
        .bind(q.aircraft.seats)
        .bind(q.duration_minutes)
        .bind(q.departure)
        .execute(&self.db)
        .await
        .context("update leg quote")?;
        Ok(())
    }

    async fn insert_leg_quote(&self, q: &RouteQuote) -> anyhow::Result<Uuid> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO empty_legs
                (id, from_icao, to_icao, from_city, to_city, from_name, to_name,
                 departure_date, flight_duration_minutes, aircraft_type, aircraft_model, seats,
                 price, regular_price, savings_percentage, currency, source)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, 'USD', $16)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(q.from.icao)
        .bind(q.to.icao)
        .bind(q.from.city)
        .bind(q.to.city)
        .bind(q.from.name)
        .bind(q.to.name)
        .bind(q.departure)
        .bind(q.duration_minutes)
        .bind(q.aircraft.category)
        .bind(q.aircraft.model)
        .bind(q.aircraft.seats)
        .bind(q.price)
        .bind(q.regular_price)
        .bind(q.savings_percentage)
        .bind(LegSource::Generated.as_str())
        .fetch_one(&self.db)
        .await
        .context("insert generated leg")?;
        Ok(id)
    }
}
