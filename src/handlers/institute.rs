use actix_web::web::{Data, Json, Path, Query};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::core::auth::Session;
use crate::core::models::institute::{InstituteApplication, InstituteApplicationInsert, InstituteProfileUpdate};
use crate::core::models::student::{StudentApplication, StudentStatus};
use crate::core::ports::repository::InstituteStore;
use crate::core::services::{institute as institute_service, student as student_service};
use crate::error::Error;
use crate::handlers::{hash_password, random_salt};
use crate::request::Reason;
use crate::response::{CreateResponse, List, TransitionResponse};

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    #[serde(flatten)]
    pub application: InstituteApplicationInsert,
    pub password: String,
    pub confirm_password: String,
}

/// Public endpoint: an institute applies for registration. The password is
/// stored hashed and stays unusable until the ministry approves.
pub async fn register(Json(mut data): Json<Registration>, db: Data<PgPool>) -> Result<Json<CreateResponse>, Error> {
    if data.password != data.confirm_password {
        return Err(Error::Validation("passwords do not match".into()));
    }
    if data.password.trim().is_empty() {
        return Err(Error::Validation("password must not be blank".into()));
    }
    let slt = random_salt();
    data.application.password_hash = hash_password(&data.password, &slt);
    data.application.salt = slt;
    let mut conn = db.acquire().await?;
    let id = institute_service::register(&mut *conn, data.application).await?;
    Ok(Json(CreateResponse { id }))
}

/// The institute's own registration record, for the status-tracking page.
pub async fn my_application(session: Session, db: Data<PgPool>) -> Result<Json<InstituteApplication>, Error> {
    let code = session.require_institute()?.to_owned();
    let mut conn = db.acquire().await?;
    let app = InstituteStore::find_by_code(&mut *conn, &code).await?.ok_or(Error::NotFound)?;
    Ok(Json(app))
}

/// Self-service edit of the institute's descriptive profile fields.
pub async fn update_profile(session: Session, Json(data): Json<InstituteProfileUpdate>, db: Data<PgPool>) -> Result<Json<InstituteApplication>, Error> {
    let mut conn = db.acquire().await?;
    let app = institute_service::update_profile(&mut *conn, &session, data).await?;
    Ok(Json(app))
}

pub async fn students(session: Session, db: Data<PgPool>) -> Result<Json<List<StudentApplication>>, Error> {
    let mut conn = db.acquire().await?;
    let list = student_service::institute_applications(&mut *conn, &session).await?;
    Ok(Json(List::new(list)))
}

pub async fn student_detail(session: Session, id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<StudentApplication>, Error> {
    let mut conn = db.acquire().await?;
    let app = student_service::detail(&mut *conn, &session, id.into_inner().0).await?;
    Ok(Json(app))
}

pub async fn verify_student(session: Session, id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<TransitionResponse<StudentStatus>>, Error> {
    let id = id.into_inner().0;
    let mut conn = db.acquire().await?;
    let status = student_service::verify_by_institute(&mut *conn, &session, id).await?;
    Ok(Json(TransitionResponse { id, status }))
}

pub async fn reject_student(session: Session, id: Path<(i32,)>, Json(Reason { reason }): Json<Reason>, db: Data<PgPool>) -> Result<Json<TransitionResponse<StudentStatus>>, Error> {
    let id = id.into_inner().0;
    let mut conn = db.acquire().await?;
    let status = student_service::reject_by_institute(&mut *conn, &session, id, reason).await?;
    Ok(Json(TransitionResponse { id, status }))
}

#[derive(Debug, Deserialize)]
pub struct CodeParam {
    pub institute_code: String,
}

/// First step of the password-reset flow: look up the security question.
pub async fn security_question(Query(CodeParam { institute_code }): Query<CodeParam>, db: Data<PgPool>) -> Result<Json<serde_json::Value>, Error> {
    let mut conn = db.acquire().await?;
    let app = InstituteStore::find_by_code(&mut *conn, &institute_code).await?.ok_or(Error::NotFound)?;
    let question = app.security_question.ok_or_else(|| Error::Validation("no security question on record".into()))?;
    Ok(Json(json!({ "institute_code": app.institute_code, "security_question": question })))
}

#[derive(Debug, Deserialize)]
pub struct PasswordReset {
    pub institute_code: String,
    pub security_answer: String,
    pub new_password: String,
    pub confirm_password: String,
}

pub async fn reset_password(Json(data): Json<PasswordReset>, db: Data<PgPool>) -> Result<Json<serde_json::Value>, Error> {
    if data.new_password != data.confirm_password {
        return Err(Error::Validation("passwords do not match".into()));
    }
    if data.new_password.trim().is_empty() {
        return Err(Error::Validation("password must not be blank".into()));
    }
    let mut conn = db.acquire().await?;
    let mut app = InstituteStore::find_by_code(&mut *conn, &data.institute_code).await?.ok_or(Error::NotFound)?;
    let matches = app
        .security_answer
        .as_deref()
        .map_or(false, |a| a.trim().eq_ignore_ascii_case(data.security_answer.trim()));
    if !matches {
        return Err(Error::Forbidden);
    }
    let slt = random_salt();
    app.password_hash = hash_password(data.new_password.trim(), &slt);
    app.salt = slt;
    InstituteStore::save(&mut *conn, &app).await?;
    Ok(Json(json!({ "reset": true })))
}
