use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::search::{contains, escape_like};

use super::dto::{CreatePartnerRequest, UpdatePartnerRequest};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Partner {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub logo_url: Option<String>,
    pub services: Vec<String>,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const PARTNER_COLUMNS: &str = "id, name, category, description, website, email, phone, \
     location, logo_url, services, is_active, created_at, updated_at";

pub async fn list_active(
    db: &PgPool,
    search: Option<&str>,
    category: Option<&str>,
) -> anyhow::Result<Vec<Partner>> {
    let rows = sqlx::query_as::<_, Partner>(&format!(
        r#"
        SELECT {PARTNER_COLUMNS}
          FROM partners
         WHERE is_active
           AND ($1::text IS NULL OR category ILIKE $1)
           AND ($2::text IS NULL
                OR name ILIKE $2
                OR description ILIKE $2
                OR location ILIKE $2
                OR category ILIKE $2)
         ORDER BY name
        "#
    ))
    .bind(category.map(escape_like))
    .bind(search.map(contains))
    .fetch_all(db)
    .await
    .context("list partners")?;
    Ok(rows)
}

pub async fn find_active(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Partner>> {
    let row = sqlx::query_as::<_, Partner>(&format!(
        "SELECT {PARTNER_COLUMNS} FROM partners WHERE id = $1 AND is_active"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn create(db: &PgPool, req: &CreatePartnerRequest) -> anyhow::Result<Partner> {
    let row = sqlx::query_as::<_, Partner>(&format!(
        r#"
        INSERT INTO partners
            (id, name, category, description, website, email, phone, location, logo_url, services)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {PARTNER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(req.name.trim())
    .bind(req.category.trim())
    .bind(req.description.as_deref())
    .bind(req.website.as_deref())
    .bind(req.email.as_deref().map(str::trim))
    .bind(req.phone.as_deref())
    .bind(req.location.as_deref())
    .bind(req.logo_url.as_deref())
    .bind(&req.services)
    .fetch_one(db)
    .await
    .context("insert partner")?;
    Ok(row)
}

pub async fn update(db: &PgPool, id: Uuid, req: &UpdatePartnerRequest) -> anyhow::Result<Option<Partner>> {
    let row = sqlx::query_as::<_, Partner>(&format!(
        r#"
        UPDATE partners
           SET name = COALESCE($2, name),
               category = COALESCE($3, category),
               description = COALESCE($4, description),
               website = COALESCE($5, website),
               email = COALESCE($6, email),
               phone = COALESCE($7, phone),
               location = COALESCE($8, location),
               logo_url = COALESCE($9, logo_url),
               services = COALESCE($10, services),
               is_active = COALESCE($11, is_active),
               updated_at = now()
         WHERE id = $1
        RETURNING {PARTNER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(req.name.as_deref().map(str::trim))
    .bind(req.category.as_deref().map(str::trim))
    .bind(req.description.as_deref())
    .bind(req.website.as_deref())
    .bind(req.email.as_deref().map(str::trim))
    .bind(req.phone.as_deref())
    .bind(req.location.as_deref())
    .bind(req.logo_url.as_deref())
    .bind(req.services.as_deref())
    .bind(req.is_active)
    .fetch_optional(db)
    .await
    .context("update partner")?;
    Ok(row)
}

pub async fn deactivate(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("UPDATE partners SET is_active = false, updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("deactivate partner")?;
    Ok(res.rows_affected() > 0)
}
