//! Generic REST handlers for one record type
//!
//! Every handler is instantiated per record type with the repository as
//! state, so the incident and patient resources share one implementation.

use crate::client::transport::TOTAL_COUNT_HEADER;
use crate::core::entity::Record;
use crate::core::query::{Criteria, InvalidSort, Sort};
use crate::server::error::ApiError;
use crate::server::repository::InMemoryRepository;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use std::sync::Arc;

/// Page size used when a list request does not carry `size`
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Largest page a single request may ask for
pub const MAX_PAGE_SIZE: usize = 2000;

pub type Repo<R> = Arc<InMemoryRepository<R>>;

/// Pagination part of a list query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: usize,
    pub size: usize,
    pub sort: Option<Sort>,
}

impl ListParams {
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, ApiError> {
        let mut params = Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: None,
        };

        for (key, value) in pairs {
            match key.as_str() {
                "page" => {
                    params.page = value
                        .parse()
                        .map_err(|_| ApiError::bad_request(format!("Invalid page '{}'", value)))?;
                }
                "size" => {
                    let size: usize = value
                        .parse()
                        .map_err(|_| ApiError::bad_request(format!("Invalid size '{}'", value)))?;
                    params.size = size.clamp(1, MAX_PAGE_SIZE);
                }
                // First sort wins; later ones would be secondary keys
                "sort" if params.sort.is_none() => {
                    params.sort = Some(
                        value
                            .parse()
                            .map_err(|e: InvalidSort| ApiError::bad_request(e.to_string()))?,
                    );
                }
                _ => {}
            }
        }

        Ok(params)
    }
}

fn criteria_of(pairs: &[(String, String)]) -> Criteria {
    Criteria::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

/// GET /api/{resource}
pub async fn list<R: Record>(
    State(repo): State<Repo<R>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let params = ListParams::from_pairs(&pairs)?;
    let criteria = criteria_of(&pairs);

    tracing::debug!(
        resource = R::resource_name(),
        page = params.page,
        size = params.size,
        predicates = criteria.predicates().len(),
        "List request"
    );

    let (items, total) = repo.page(&criteria, params.sort.as_ref(), params.page, params.size)?;
    Ok(([(TOTAL_COUNT_HEADER, total.to_string())], Json(items)).into_response())
}

/// GET /api/{resource}/count
pub async fn count<R: Record>(
    State(repo): State<Repo<R>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<u64>, ApiError> {
    let total = repo.count(&criteria_of(&pairs))?;
    Ok(Json(total as u64))
}

/// GET /api/{resource}/{id}
pub async fn get_one<R: Record>(
    State(repo): State<Repo<R>>,
    Path(id): Path<i64>,
) -> Result<Json<R>, ApiError> {
    repo.get(id)?.map(Json).ok_or_else(|| {
        ApiError::not_found(format!("{} {} not found", R::resource_name_singular(), id))
    })
}

/// POST /api/{resource}
pub async fn create<R: Record>(
    State(repo): State<Repo<R>>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let record: R = serde_json::from_value(body)?;
    if record.id().is_some() {
        return Err(ApiError::bad_request(format!(
            "A new {} cannot already have an ID",
            R::resource_name_singular()
        )));
    }
    record.validate_record()?;

    let saved = repo.insert(record)?;
    let location = format!(
        "/api/{}/{}",
        R::resource_name(),
        saved.id().unwrap_or_default()
    );
    tracing::debug!(resource = R::resource_name(), id = ?saved.id(), "Record created");

    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(saved)).into_response())
}

/// Check that the body id is present, matches the path and exists
fn check_target<R: Record>(
    repo: &Repo<R>,
    path_id: i64,
    body_id: Option<i64>,
) -> Result<(), ApiError> {
    let Some(body_id) = body_id else {
        return Err(ApiError::bad_request("Invalid id"));
    };
    if body_id != path_id {
        return Err(ApiError::bad_request("Invalid ID"));
    }
    if !repo.contains(path_id)? {
        return Err(ApiError::bad_request("Entity not found"));
    }
    Ok(())
}

/// PUT /api/{resource}/{id}
pub async fn update<R: Record>(
    State(repo): State<Repo<R>>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<R>, ApiError> {
    let record: R = serde_json::from_value(body)?;
    check_target(&repo, id, record.id())?;
    record.validate_record()?;

    Ok(Json(repo.replace(id, record)?))
}

/// PATCH /api/{resource}/{id}
pub async fn partial_update<R: Record>(
    State(repo): State<Repo<R>>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<R>, ApiError> {
    check_target(&repo, id, body.get("id").and_then(Value::as_i64))?;

    let merged = repo.merged(id, &body)?.ok_or_else(|| {
        ApiError::not_found(format!("{} {} not found", R::resource_name_singular(), id))
    })?;
    merged.validate_record()?;

    Ok(Json(repo.replace(id, merged)?))
}

/// DELETE /api/{resource}/{id}
pub async fn delete<R: Record>(
    State(repo): State<Repo<R>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !repo.delete(id)? {
        tracing::debug!(resource = R::resource_name(), id, "Delete of unknown record");
    }
    Ok(StatusCode::NO_CONTENT)
}
