use actix_web::{self, FromRequest, HttpMessage};
use std::future::{ready, Ready};

use crate::core::auth::Session;

impl FromRequest for Session {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        if let Some(session) = req.extensions().get::<Self>() {
            ready(Ok(session.clone()))
        } else {
            ready(Err(actix_web::error::ErrorUnauthorized("")))
        }
    }
}
