use actix_web::web::{Data, Json, Path, Query};
use serde::Serialize;
use sqlx::{query_as, PgPool};

use crate::core::auth::{Role, Session};
use crate::core::models::institute::{InstituteApplication, InstituteStatus};
use crate::core::models::student::{StudentApplication, StudentStatus};
use crate::core::ports::repository::{InstituteStore, StudentStore};
use crate::core::services::{institute as institute_service, student as student_service};
use crate::error::Error;
use crate::request::{Reason, StatusFilter};
use crate::response::{List, TransitionResponse};

fn student_statuses(filter: &str) -> Vec<StudentStatus> {
    use StudentStatus::*;
    match filter {
        "pending" => vec![Submitted, VerifiedByInstitute],
        "approved" => vec![ApprovedByState, ForwardedToMinistry],
        "rejected" => vec![RejectedByState],
        _ => vec![
            Submitted,
            VerifiedByInstitute,
            ApprovedByState,
            ForwardedToMinistry,
            Approved,
            RejectedByInstitute,
            RejectedByState,
            RejectedByMinistry,
        ],
    }
}

fn institute_statuses(filter: &str) -> Vec<InstituteStatus> {
    use InstituteStatus::*;
    match filter {
        "pending" => vec![Pending],
        "forwarded" => vec![VerifiedByState, ForwardedToMinistry],
        "rejected" => vec![RejectedByState],
        _ => vec![Pending, VerifiedByState, ForwardedToMinistry, ApprovedByMinistry, RejectedByState, RejectedByMinistry],
    }
}

pub async fn students(session: Session, filter: Query<StatusFilter>, db: Data<PgPool>) -> Result<Json<List<StudentApplication>>, Error> {
    session.require(Role::State)?;
    let mut conn = db.acquire().await?;
    let list = StudentStore::list_by_status(&mut *conn, &student_statuses(filter.name())).await?;
    Ok(Json(List::new(list)))
}

pub async fn student_detail(session: Session, id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<StudentApplication>, Error> {
    session.require(Role::State)?;
    let mut conn = db.acquire().await?;
    let app = student_service::detail(&mut *conn, &session, id.into_inner().0).await?;
    Ok(Json(app))
}

pub async fn approve_student(session: Session, id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<TransitionResponse<StudentStatus>>, Error> {
    let id = id.into_inner().0;
    let mut conn = db.acquire().await?;
    let status = student_service::approve_by_state(&mut *conn, &session, id).await?;
    Ok(Json(TransitionResponse { id, status }))
}

pub async fn reject_student(session: Session, id: Path<(i32,)>, Json(Reason { reason }): Json<Reason>, db: Data<PgPool>) -> Result<Json<TransitionResponse<StudentStatus>>, Error> {
    let id = id.into_inner().0;
    let mut conn = db.acquire().await?;
    let status = student_service::reject_by_state(&mut *conn, &session, id, reason).await?;
    Ok(Json(TransitionResponse { id, status }))
}

pub async fn forward_student(session: Session, id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<TransitionResponse<StudentStatus>>, Error> {
    let id = id.into_inner().0;
    let mut conn = db.acquire().await?;
    let status = student_service::forward_to_ministry(&mut *conn, &session, id).await?;
    Ok(Json(TransitionResponse { id, status }))
}

/// One-step shortcut used from the detail page: approve and forward without
/// waiting for institute verification.
pub async fn approve_and_forward_student(session: Session, id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<TransitionResponse<StudentStatus>>, Error> {
    let id = id.into_inner().0;
    let mut conn = db.acquire().await?;
    let status = student_service::approve_and_forward(&mut *conn, &session, id).await?;
    Ok(Json(TransitionResponse { id, status }))
}

pub async fn institutes(session: Session, filter: Query<StatusFilter>, db: Data<PgPool>) -> Result<Json<List<InstituteApplication>>, Error> {
    session.require(Role::State)?;
    let mut conn = db.acquire().await?;
    let list = InstituteStore::list_by_status(&mut *conn, &institute_statuses(filter.name())).await?;
    Ok(Json(List::new(list)))
}

pub async fn institute_detail(session: Session, id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<InstituteApplication>, Error> {
    session.require(Role::State)?;
    let mut conn = db.acquire().await?;
    let app = institute_service::detail(&mut *conn, &session, id.into_inner().0).await?;
    Ok(Json(app))
}

pub async fn verify_institute(session: Session, id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<TransitionResponse<InstituteStatus>>, Error> {
    let id = id.into_inner().0;
    let mut conn = db.acquire().await?;
    let status = institute_service::verify_by_state(&mut *conn, &session, id).await?;
    Ok(Json(TransitionResponse { id, status }))
}

pub async fn forward_institute(session: Session, id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<TransitionResponse<InstituteStatus>>, Error> {
    let id = id.into_inner().0;
    let mut conn = db.acquire().await?;
    let status = institute_service::forward_to_ministry(&mut *conn, &session, id).await?;
    Ok(Json(TransitionResponse { id, status }))
}

pub async fn reject_institute(session: Session, id: Path<(i32,)>, Json(Reason { reason }): Json<Reason>, db: Data<PgPool>) -> Result<Json<TransitionResponse<InstituteStatus>>, Error> {
    let id = id.into_inner().0;
    let mut conn = db.acquire().await?;
    let status = institute_service::reject_by_state(&mut *conn, &session, id, reason).await?;
    Ok(Json(TransitionResponse { id, status }))
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub total_students: i64,
    pub pending_students: i64,
    pub forwarded_students: i64,
    pub total_institutes: i64,
    pub pending_institutes: i64,
    pub forwarded_institutes: i64,
}

pub async fn dashboard(session: Session, db: Data<PgPool>) -> Result<Json<Dashboard>, Error> {
    session.require(Role::State)?;
    let mut conn = db.acquire().await?;
    let (total_students,): (i64,) = query_as("SELECT COUNT(*) FROM student_applications").fetch_one(&mut *conn).await?;
    let (pending_students,): (i64,) = query_as("SELECT COUNT(*) FROM student_applications WHERE status IN ('Submitted', 'VerifiedByInstitute')")
        .fetch_one(&mut *conn)
        .await?;
    let (forwarded_students,): (i64,) = query_as("SELECT COUNT(*) FROM student_applications WHERE status = 'ForwardedToMinistry'")
        .fetch_one(&mut *conn)
        .await?;
    let (total_institutes,): (i64,) = query_as("SELECT COUNT(*) FROM institute_applications").fetch_one(&mut *conn).await?;
    let (pending_institutes,): (i64,) = query_as("SELECT COUNT(*) FROM institute_applications WHERE status IN ('Pending', 'VerifiedByState')")
        .fetch_one(&mut *conn)
        .await?;
    let (forwarded_institutes,): (i64,) = query_as("SELECT COUNT(*) FROM institute_applications WHERE status = 'ForwardedToMinistry'")
        .fetch_one(&mut *conn)
        .await?;
    Ok(Json(Dashboard {
        total_students,
        pending_students,
        forwarded_students,
        total_institutes,
        pending_institutes,
        forwarded_institutes,
    }))
}
