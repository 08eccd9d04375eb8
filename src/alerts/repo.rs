use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::CreateAlertRequest;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FlightAlert {
    pub id: Uuid,
    pub user_id: Uuid,
    pub from_location: String,
    pub to_location: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub date_from: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub date_to: Option<OffsetDateTime>,
    pub passengers: i32,
    pub max_price: Option<f64>,
    pub notify_via: String,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const ALERT_COLUMNS: &str = "id, user_id, from_location, to_location, date_from, date_to, \
     passengers, max_price, notify_via, is_active, created_at, updated_at";

pub async fn list_active(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<FlightAlert>> {
    let rows = sqlx::query_as::<_, FlightAlert>(&format!(
        r#"
        SELECT {ALERT_COLUMNS}
          FROM flight_alerts
         WHERE user_id = $1 AND is_active
         ORDER BY created_at DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn create(db: &PgPool, user_id: Uuid, req: &CreateAlertRequest) -> anyhow::Result<FlightAlert> {
    let row = sqlx::query_as::<_, FlightAlert>(&format!(
        r#"
        INSERT INTO flight_alerts
            (id, user_id, from_location, to_location, date_from, date_to,
             passengers, max_price, notify_via)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {ALERT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(req.from_location.trim())
    .bind(req.to_location.trim())
    .bind(req.date_from)
    .bind(req.date_to)
    .bind(req.passengers)
    .bind(req.max_price)
    .bind(req.notify_via.as_str())
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Soft delete. False when the alert does not exist or belongs to someone else.
pub async fn deactivate(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        UPDATE flight_alerts
           SET is_active = false, updated_at = now()
         WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(res.rows_affected() == 1)
}
