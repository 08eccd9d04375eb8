use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::auth::repo_types::{PaymentMethod, User, USER_COLUMNS};

pub async fn update_profile(
    db: &PgPool,
    id: Uuid,
    first_name: Option<&str>,
    last_name: Option<&str>,
    phone: Option<&str>,
) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
           SET first_name = COALESCE($2, first_name),
               last_name  = COALESCE($3, last_name),
               phone      = COALESCE($4, phone),
               updated_at = now()
         WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(first_name)
    .bind(last_name)
    .bind(phone)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn update_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn set_payment_methods(
    db: &PgPool,
    id: Uuid,
    methods: &[PaymentMethod],
) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET payment_methods = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(Json(methods))
        .execute(db)
        .await?;
    Ok(())
}

pub async fn set_preferences(
    db: &PgPool,
    id: Uuid,
    preferences: &serde_json::Value,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET preferences = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(Json(preferences))
        .execute(db)
        .await?;
    Ok(())
}
