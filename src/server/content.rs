//! Collection endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use eldirecto_core::gateway::protocol::PatchRequest;
use eldirecto_core::{AboutContent, CarouselItem, CollectionKind, ContactEntry, ScheduleEntry};
use serde_json::Value;

use super::auth::Operator;
use super::error::ApiError;
use super::storage::RepositoryError;
use super::AppState;

/// Runs `$body` with `$t` bound to the record type of `$kind`.
macro_rules! with_record_type {
    ($kind:expr, $t:ident => $body:expr) => {
        match $kind {
            CollectionKind::Carousel => {
                type $t = CarouselItem;
                $body
            }
            CollectionKind::Contact => {
                type $t = ContactEntry;
                $body
            }
            CollectionKind::Schedule => {
                type $t = ScheduleEntry;
                $body
            }
            CollectionKind::About => {
                type $t = AboutContent;
                $body
            }
        }
    };
}

fn parse_kind(name: &str) -> Result<CollectionKind, ApiError> {
    CollectionKind::parse(name).ok_or_else(|| ApiError::not_found(format!("Unknown collection '{}'", name)))
}

fn to_json<S: serde::Serialize>(value: S) -> Result<Json<Value>, ApiError> {
    serde_json::to_value(value)
        .map(Json)
        .map_err(|e| RepositoryError::Invalid(e.to_string()).into())
}

/// `GET /collection/{name}`
pub async fn list(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_kind(&name)?;
    with_record_type!(kind, T => to_json(state.content.list::<T>()))
}

/// `POST /collection/{name}`
pub async fn create(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Extension(Operator(user)): Extension<Operator>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let kind = parse_kind(&name)?;
    let created = with_record_type!(kind, T => {
        let record = state.content.create::<T>(body)?;
        to_json(record)?
    });
    tracing::info!("{} created a {} record", user, kind);
    Ok((StatusCode::CREATED, created))
}

/// `PATCH /collection/{name}`
///
/// `{id, fields}` replaces one record and answers with it. `{items}` applies
/// a bulk order update and answers with the whole collection.
pub async fn patch(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Extension(Operator(user)): Extension<Operator>,
    Json(request): Json<PatchRequest>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_kind(&name)?;

    match request {
        PatchRequest::Record { id, fields } => {
            let updated = with_record_type!(kind, T => {
                let record = state.content.update::<T>(&id, fields)?;
                to_json(record)?
            });
            tracing::info!("{} updated {} record '{}'", user, kind, id);
            Ok(updated)
        }
        PatchRequest::Order { items } => {
            if !kind.is_ordered() {
                return Err(ApiError::bad_request(format!("{} has no order", kind)));
            }
            let reordered = with_record_type!(kind, T => {
                let records = state.content.update_order::<T>(&items)?;
                to_json(records)?
            });
            tracing::info!("{} reordered {} ({} item(s))", user, kind, items.len());
            Ok(reordered)
        }
    }
}

/// `DELETE /collection/{name}/{id}`
pub async fn remove(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
    Extension(Operator(user)): Extension<Operator>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&name)?;
    state.content.delete(kind, &id)?;
    tracing::info!("{} deleted {} record '{}'", user, kind, id);
    Ok(StatusCode::NO_CONTENT)
}
