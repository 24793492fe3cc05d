pub mod announcement;
pub mod contact;
pub mod institute;
pub mod ministry;
pub mod state;
pub mod student;
pub mod upload;

use actix_web::cookie::{time::OffsetDateTime, Cookie, CookieBuilder};
use actix_web::http::StatusCode;
use actix_web::web::{Data, Json};
use actix_web::{HttpResponse, HttpResponseBuilder};
use hex::ToHex;
use rand::{thread_rng, Rng};
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use sqlx::{query_as, FromRow, PgPool};
use std::ops::Add;

use crate::core::auth::Role;
use crate::core::ports::repository::InstituteStore;
use crate::core::ports::tokener::Tokener;
use crate::error::Error;
use crate::impls::tokener::jwt::JWT;
use crate::middlewares::jwt::{Claim, JWT_SECRET, JWT_TOKEN};

pub(crate) fn hash_password(pass: &str, slt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pass);
    hasher.update(slt);
    hasher.finalize().encode_hex()
}

pub(crate) fn random_salt() -> String {
    let chars = vec![
        '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B',
        'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
    ];
    let mut slt = String::new();
    let mut rng = thread_rng();
    for _ in 0..32 {
        let i = rng.gen_range(0..chars.len());
        slt.push(chars[i]);
    }
    slt
}

/// Issue the signed session cookie for a freshly authenticated actor.
fn session_response(role: Role, sub: &str) -> Result<HttpResponse, Error> {
    let claim = Claim {
        sub: sub.to_owned(),
        role,
        exp: chrono::Utc::now().add(chrono::Duration::days(30)).timestamp(),
    };
    let secret = dotenv::var(JWT_SECRET)?;
    let tokener = JWT::new(secret.into_bytes());
    let token = tokener.gen_token(&claim)?;
    Ok(HttpResponse::build(StatusCode::OK)
        .cookie(Cookie::new(JWT_TOKEN, token))
        .json(json!({ "role": role })))
}

#[derive(Debug, FromRow)]
pub struct StudentAccount {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub security_question: Option<String>,
    pub security_answer: Option<String>,
    pub mobile_number: Option<String>,
    pub photo_path: Option<String>,
}

#[derive(Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}

pub async fn student_login(Json(Login { username, password }): Json<Login>, db: Data<PgPool>) -> Result<HttpResponse, Error> {
    let mut conn = db.acquire().await?;
    let account: Option<StudentAccount> = query_as("SELECT * FROM students WHERE LOWER(email) = LOWER($1)")
        .bind(&username)
        .fetch_optional(&mut *conn)
        .await?;
    match account {
        Some(account) if hash_password(&password, &account.salt) == account.password_hash => session_response(Role::Student, &account.email),
        _ => Err(Error::Unauthorized),
    }
}

/// Institutes log in with their institute code, which only works once the
/// ministry has approved the registration.
pub async fn institute_login(Json(Login { username, password }): Json<Login>, db: Data<PgPool>) -> Result<HttpResponse, Error> {
    let mut conn = db.acquire().await?;
    let app = InstituteStore::find_by_code(&mut *conn, &username).await?;
    match app {
        Some(app) if app.is_active_login && hash_password(&password, &app.salt) == app.password_hash => session_response(Role::Institute, &app.institute_code),
        _ => Err(Error::Unauthorized),
    }
}

pub async fn state_login(Json(Login { username, password }): Json<Login>) -> Result<HttpResponse, Error> {
    if username != dotenv::var("STATE_USERNAME")? || password != dotenv::var("STATE_PASSWORD")? {
        return Err(Error::Unauthorized);
    }
    session_response(Role::State, "state")
}

pub async fn ministry_login(Json(Login { username, password }): Json<Login>) -> Result<HttpResponse, Error> {
    if username != dotenv::var("MINISTRY_USERNAME")? || password != dotenv::var("MINISTRY_PASSWORD")? {
        return Err(Error::Unauthorized);
    }
    session_response(Role::Ministry, "ministry")
}

pub async fn logout() -> HttpResponse {
    HttpResponseBuilder::new(StatusCode::OK)
        .cookie(CookieBuilder::new(JWT_TOKEN, "").expires(OffsetDateTime::now_utc()).finish())
        .finish()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudentSignup {
    full_name: String,
    email: String,
    password: String,
    security_question: Option<String>,
    security_answer: Option<String>,
    mobile_number: Option<String>,
}

pub async fn student_register(Json(signup): Json<StudentSignup>, db: Data<PgPool>) -> Result<HttpResponse, Error> {
    if signup.full_name.trim().is_empty() || signup.email.trim().is_empty() {
        return Err(Error::Validation("name and email are required".into()));
    }
    let mut conn = db.acquire().await?;
    let existing: Option<(i32,)> = query_as("SELECT id FROM students WHERE LOWER(email) = LOWER($1)")
        .bind(&signup.email)
        .fetch_optional(&mut *conn)
        .await?;
    if existing.is_some() {
        return Err(Error::Validation("a student with this email already exists".into()));
    }
    let slt = random_salt();
    sqlx::query(
        "
    INSERT INTO students (full_name, email, password_hash, salt, security_question, security_answer, mobile_number)
    VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(&signup.full_name)
    .bind(&signup.email)
    .bind(hash_password(&signup.password, &slt))
    .bind(slt)
    .bind(&signup.security_question)
    .bind(&signup.security_answer)
    .bind(&signup.mobile_number)
    .execute(&mut *conn)
    .await?;
    session_response(Role::Student, &signup.email)
}
