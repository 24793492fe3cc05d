use actix_web::dev::{Service, ServiceRequest, Transform};
use actix_web::error::ErrorUnauthorized;
use actix_web::{Error, HttpMessage};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

use crate::core::auth::{Role, Session};
use crate::core::ports::tokener::{Payload, Tokener};
use crate::impls::tokener::jwt::JWT;

pub static JWT_TOKEN: &str = "JWT_TOKEN";
pub static JWT_SECRET: &str = "JWT_SECRET";

#[derive(Debug, Deserialize, Serialize)]
pub struct Claim {
    pub sub: String,
    pub role: Role,
    pub exp: i64,
}

impl Payload for Claim {
    fn subject(&self) -> &str {
        &self.sub
    }
}

impl Claim {
    /// State and Ministry claims carry a fixed subject; only students and
    /// institutes have an owner key.
    fn into_session(self) -> Session {
        let owner = match self.role {
            Role::Student | Role::Institute => Some(self.sub),
            Role::State | Role::Ministry => None,
        };
        Session::new(self.role, owner)
    }
}

pub struct Jwt {
    secret: Vec<u8>,
}

impl Jwt {
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }
}

impl<S> Transform<S, ServiceRequest> for Jwt
where
    S: Service<ServiceRequest> + 'static,
    S::Future: 'static,
    S::Error: Into<Error>,
{
    type Error = Error;
    type Response = S::Response;
    type Transform = JwtService<S>;
    type InitError = ();
    type Future = Pin<Box<dyn Future<Output = Result<Self::Transform, Self::InitError>>>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let secret = self.secret.clone();
        Box::pin(async move {
            Ok(JwtService {
                tokener: JWT::new(secret),
                next_service: service,
            })
        })
    }
}

pub struct JwtService<S> {
    tokener: JWT,
    next_service: S,
}

impl<S> JwtService<S> {
    /// Session cookie first, `Authorization: Bearer` header as fallback.
    fn extract_token(&self, req: &ServiceRequest) -> Option<String> {
        if let Some(cookie) = req.cookie(JWT_TOKEN) {
            return Some(cookie.value().to_owned());
        }
        req.headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|t| t.to_owned())
    }
}

impl<S> Service<ServiceRequest> for JwtService<S>
where
    S: Service<ServiceRequest>,
    S::Future: 'static,
    S::Error: Into<Error>,
{
    type Response = S::Response;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, ctx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.next_service.poll_ready(ctx).map_err(|e| e.into())
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = match self.extract_token(&req) {
            Some(token) => token,
            None => return Box::pin(async move { Err(ErrorUnauthorized("no session token")) }),
        };
        match <JWT as Tokener<Claim>>::verify_token(&self.tokener, &token) {
            Err(e) => return Box::pin(async move { Err(ErrorUnauthorized(e)) }),
            Ok(claim) => {
                req.extensions_mut().insert(claim.into_session());
            }
        }
        let res_fut = self.next_service.call(req);
        Box::pin(async move {
            let resp = res_fut.await.map_err(|e| e.into())?;
            Ok(resp)
        })
    }
}
