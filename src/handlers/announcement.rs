use actix_web::web::{Data, Json, Path};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{query, query_as, FromRow, PgPool};

use crate::core::auth::{Role, Session};
use crate::error::Error;
use crate::response::{CreateResponse, List};

#[derive(Debug, FromRow, serde::Serialize)]
pub struct Announcement {
    pub id: i32,
    pub title: String,
    pub message: String,
    pub date_posted: DateTime<Utc>,
    pub is_public: bool,
}

/// Unauthenticated: only announcements marked public.
pub async fn public_list(db: Data<PgPool>) -> Result<Json<List<Announcement>>, Error> {
    let mut conn = db.acquire().await?;
    let list = query_as("SELECT * FROM announcements WHERE is_public ORDER BY date_posted DESC")
        .fetch_all(&mut *conn)
        .await?;
    Ok(Json(List::new(list)))
}

pub async fn admin_list(session: Session, db: Data<PgPool>) -> Result<Json<List<Announcement>>, Error> {
    session.require(Role::Ministry)?;
    let mut conn = db.acquire().await?;
    let list = query_as("SELECT * FROM announcements ORDER BY date_posted DESC").fetch_all(&mut *conn).await?;
    Ok(Json(List::new(list)))
}

#[derive(Debug, Deserialize)]
pub struct AnnouncementInput {
    pub title: String,
    pub message: String,
    pub is_public: bool,
}

pub async fn create(session: Session, Json(data): Json<AnnouncementInput>, db: Data<PgPool>) -> Result<Json<CreateResponse>, Error> {
    session.require(Role::Ministry)?;
    if data.title.trim().is_empty() || data.message.trim().is_empty() {
        return Err(Error::Validation("title and message are required".into()));
    }
    let mut conn = db.acquire().await?;
    let (id,): (i32,) = query_as("INSERT INTO announcements (title, message, date_posted, is_public) VALUES ($1, $2, NOW(), $3) RETURNING id")
        .bind(data.title.trim())
        .bind(data.message.trim())
        .bind(data.is_public)
        .fetch_one(&mut *conn)
        .await?;
    Ok(Json(CreateResponse { id }))
}

pub async fn update(session: Session, id: Path<(i32,)>, Json(data): Json<AnnouncementInput>, db: Data<PgPool>) -> Result<Json<Announcement>, Error> {
    session.require(Role::Ministry)?;
    if data.title.trim().is_empty() || data.message.trim().is_empty() {
        return Err(Error::Validation("title and message are required".into()));
    }
    let mut conn = db.acquire().await?;
    let updated = query_as("UPDATE announcements SET title = $1, message = $2, is_public = $3 WHERE id = $4 RETURNING *")
        .bind(data.title.trim())
        .bind(data.message.trim())
        .bind(data.is_public)
        .bind(id.into_inner().0)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(Error::NotFound)?;
    Ok(Json(updated))
}

pub async fn delete(session: Session, id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<()>, Error> {
    session.require(Role::Ministry)?;
    let mut conn = db.acquire().await?;
    let done = query("DELETE FROM announcements WHERE id = $1").bind(id.into_inner().0).execute(&mut *conn).await?;
    if done.rows_affected() == 0 {
        return Err(Error::NotFound);
    }
    Ok(Json(()))
}
