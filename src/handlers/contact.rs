use actix_web::web::{Data, Json, Path};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{query, query_as, FromRow, PgPool};

use crate::core::auth::{Role, Session};
use crate::error::Error;
use crate::response::{CreateResponse, List};

#[derive(Debug, FromRow, serde::Serialize)]
pub struct ContactMessage {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

#[derive(Debug, Deserialize)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

/// Public contact form.
pub async fn create(Json(data): Json<ContactInput>, db: Data<PgPool>) -> Result<Json<CreateResponse>, Error> {
    for (field, value) in [("name", &data.name), ("email", &data.email), ("subject", &data.subject), ("message", &data.message)] {
        if value.trim().is_empty() {
            return Err(Error::Validation(format!("{} is required", field)));
        }
    }
    let mut conn = db.acquire().await?;
    let (id,): (i32,) = query_as(
        "
    INSERT INTO contact_messages (name, email, phone, subject, message, created_at, is_read)
    VALUES ($1, $2, $3, $4, $5, NOW(), FALSE) RETURNING id",
    )
    .bind(data.name.trim())
    .bind(data.email.trim())
    .bind(&data.phone)
    .bind(data.subject.trim())
    .bind(data.message.trim())
    .fetch_one(&mut *conn)
    .await?;
    Ok(Json(CreateResponse { id }))
}

pub async fn list(session: Session, db: Data<PgPool>) -> Result<Json<List<ContactMessage>>, Error> {
    session.require(Role::Ministry)?;
    let mut conn = db.acquire().await?;
    let list = query_as("SELECT * FROM contact_messages ORDER BY created_at DESC").fetch_all(&mut *conn).await?;
    Ok(Json(List::new(list)))
}

pub async fn mark_read(session: Session, id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<()>, Error> {
    session.require(Role::Ministry)?;
    let mut conn = db.acquire().await?;
    let done = query("UPDATE contact_messages SET is_read = TRUE WHERE id = $1")
        .bind(id.into_inner().0)
        .execute(&mut *conn)
        .await?;
    if done.rows_affected() == 0 {
        return Err(Error::NotFound);
    }
    Ok(Json(()))
}
