//! Generic handlers instantiated once per resource type.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Extension,
};
use serde::Deserialize;

use crate::auth::Principal;
use crate::error::ApiError;
use crate::middleware::{ApiResult, Envelope};
use crate::resources::{Resource, ResourceService};

#[derive(Debug, Deserialize)]
pub struct KeyParam {
    pub key: String,
}

/// GET /{resource}/:username
pub async fn list<R>(
    State(service): State<Arc<ResourceService<R>>>,
    Path(username): Path<String>,
) -> ApiResult<Envelope>
where
    R: Resource,
{
    let records = service.list(&username).await?;
    Ok(Envelope::success(format!("Fetch {} success", R::NAME), records))
}

/// POST /{resource}?...fields
pub async fn create<R>(
    State(service): State<Arc<ResourceService<R>>>,
    Extension(principal): Extension<Principal>,
    form: Result<Query<R::Form>, QueryRejection>,
) -> ApiResult<Envelope>
where
    R: Resource,
{
    let fields = R::from_form(query_value(form)?)?;
    let record = service.create(&principal, fields).await?;
    Ok(Envelope::success(format!("Add {} success", R::NAME), record))
}

/// PATCH /{resource}?key=&...fields
pub async fn update<R>(
    State(service): State<Arc<ResourceService<R>>>,
    Extension(principal): Extension<Principal>,
    key: Result<Query<KeyParam>, QueryRejection>,
    form: Result<Query<R::Form>, QueryRejection>,
) -> ApiResult<Envelope>
where
    R: Resource,
{
    let KeyParam { key } = query_value(key)?;
    let fields = R::from_form(query_value(form)?)?;

    let outcome = service.update(&principal, &key, fields).await?;
    Ok(Envelope::from_outcome(format!("Update {} success", R::NAME), outcome))
}

/// DELETE /{resource}?key=
pub async fn delete<R>(
    State(service): State<Arc<ResourceService<R>>>,
    Extension(principal): Extension<Principal>,
    key: Result<Query<KeyParam>, QueryRejection>,
) -> ApiResult<Envelope>
where
    R: Resource,
{
    let KeyParam { key } = query_value(key)?;

    let outcome = service.delete(&principal, &key).await?;
    Ok(Envelope::from_outcome(format!("Delete {} success", R::NAME), outcome))
}

/// Malformed query input is a validation failure at the boundary
fn query_value<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(value)| value)
        .map_err(|e| ApiError::unprocessable_entity(e.body_text(), Default::default()))
}

