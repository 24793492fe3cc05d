use actix_multipart::Multipart;
use actix_web::web::{Data, Json, Query};
use actix_web::HttpResponse;
use futures_util::TryStreamExt;
use serde::Deserialize;

use crate::error::Error;
use crate::storer::FileStorer;

/// Accepts one or more document parts and hands back their opaque retrieval
/// paths; the application payload references these.
pub async fn create<T: FileStorer>(mut payload: Multipart, storer: Data<T>) -> Result<Json<Vec<String>>, Error> {
    let mut paths = Vec::new();
    while let Some(mut field) = payload.try_next().await? {
        let mut content = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            content.extend_from_slice(&chunk);
        }
        if content.is_empty() {
            return Err(Error::Validation("empty upload".into()));
        }
        let path = storer.write(content.into())?;
        paths.push(path);
    }
    if paths.is_empty() {
        return Err(Error::Validation("no file in request".into()));
    }
    Ok(Json(paths))
}

#[derive(Debug, Deserialize)]
pub struct FetchParam {
    pub code: String,
}

pub async fn fetch<T: FileStorer>(Query(FetchParam { code }): Query<FetchParam>, storer: Data<T>) -> Result<HttpResponse, Error> {
    let content = storer.read(&code)?;
    Ok(HttpResponse::Ok().content_type("application/octet-stream").body(content))
}
