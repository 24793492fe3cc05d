use actix_web::web::{Data, Json, Path};
use sqlx::PgPool;

use crate::core::auth::Session;
use crate::core::models::student::{StudentApplication, StudentApplicationInsert};
use crate::core::services::student as service;
use crate::error::Error;
use crate::response::{CreateResponse, List};

pub async fn submit(session: Session, Json(data): Json<StudentApplicationInsert>, db: Data<PgPool>) -> Result<Json<CreateResponse>, Error> {
    let mut conn = db.acquire().await?;
    let id = service::submit(&mut *conn, &session, data).await?;
    Ok(Json(CreateResponse { id }))
}

pub async fn my_applications(session: Session, db: Data<PgPool>) -> Result<Json<List<StudentApplication>>, Error> {
    let mut conn = db.acquire().await?;
    let list = service::my_applications(&mut *conn, &session).await?;
    Ok(Json(List::new(list)))
}

pub async fn detail(session: Session, id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<StudentApplication>, Error> {
    let mut conn = db.acquire().await?;
    let app = service::detail(&mut *conn, &session, id.into_inner().0).await?;
    Ok(Json(app))
}
