use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use gigbase_core::sort::sort_views;
use gigbase_core::{
    Band, CoreError, EntityKind, EntityView, Festival, FestivalEvent, SortDirection, SortKey,
    Store,
};

use crate::error::ApiError;
use crate::routes::collections::Collection;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/{collection}", get(list_entries).post(create_entry))
        .route("/api/{collection}/import", post(import_entries))
        .route(
            "/api/{collection}/{id}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/api/{collection}/{id}/validate", post(validate_entry))
        .route("/api/{collection}/{id}/events", post(add_festival_event))
        .route(
            "/api/{collection}/{id}/events/{event_id}",
            put(update_festival_event),
        )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    sort_by: SortKey,
    #[serde(default)]
    order: SortDirection,
}

/// A festival submitted together with its festival events.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewFestival {
    #[serde(flatten)]
    festival: Festival,
    #[serde(default)]
    festival_events: Vec<FestivalEvent>,
}

async fn list_entries(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<EntityView>>, ApiError> {
    let Collection { kind, store } = Collection::parse(&collection)?;
    let mut views = state.resolver.resolve_all(kind, store).await?;
    sort_views(&mut views, query.sort_by, query.order);
    Ok(Json(views))
}

async fn get_entry(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<EntityView>, ApiError> {
    let Collection { kind, store } = Collection::parse(&collection)?;
    let view = state
        .resolver
        .resolve_in(kind, store, &id)
        .await?
        .ok_or_else(|| CoreError::not_found(kind, id))?;
    Ok(Json(view))
}

async fn create_entry(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Collection { kind, store } = Collection::parse(&collection)?;
    let writer = &state.writer;

    let created = match kind {
        EntityKind::Band => {
            serde_json::to_value(writer.create_band(from_body(body)?, store).await?)?
        }
        EntityKind::Location => {
            serde_json::to_value(writer.create_location(from_body(body)?, store).await?)?
        }
        EntityKind::Event => {
            serde_json::to_value(writer.create_event(from_body(body)?, store).await?)?
        }
        EntityKind::Festival => {
            let NewFestival {
                festival,
                festival_events,
            } = from_body(body)?;
            serde_json::to_value(
                writer
                    .create_festival(festival, festival_events, store)
                    .await?,
            )?
        }
        EntityKind::FestivalEvent => {
            return Err(ApiError::BadRequest(
                "festival events are added through their festival".to_string(),
            ))
        }
        EntityKind::Genre => serde_json::to_value(writer.create_genre(from_body(body)?).await?)?,
        EntityKind::Report => {
            serde_json::to_value(writer.create_report(from_body(body)?).await?)?
        }
        EntityKind::Bug => serde_json::to_value(writer.create_bug(from_body(body)?).await?)?,
        EntityKind::Feedback => {
            serde_json::to_value(writer.create_feedback(from_body(body)?).await?)?
        }
    };

    tracing::info!(%kind, ?store, "created entry");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn import_entries(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(bands): Json<Vec<Band>>,
) -> Result<(StatusCode, Json<Vec<Band>>), ApiError> {
    let Collection { kind, store } = Collection::parse(&collection)?;
    if kind != EntityKind::Band {
        return Err(ApiError::BadRequest(format!("{} entries cannot be imported", kind)));
    }
    let saved = state.writer.import_bands(bands, store).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn update_entry(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let Collection { kind, store } = Collection::parse(&collection)?;
    let writer = &state.writer;

    let updated = match kind {
        EntityKind::Band => {
            serde_json::to_value(writer.update_band(&id, from_body(body)?, store).await?)?
        }
        EntityKind::Location => {
            serde_json::to_value(writer.update_location(&id, from_body(body)?, store).await?)?
        }
        EntityKind::Event => {
            serde_json::to_value(writer.update_event(&id, from_body(body)?, store).await?)?
        }
        kind => {
            return Err(ApiError::BadRequest(format!("{} entries cannot be edited", kind)));
        }
    };
    Ok(Json(updated))
}

async fn delete_entry(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let Collection { kind, store } = Collection::parse(&collection)?;
    if !state.maintainer.delete_entity(kind, store, &id).await? {
        return Err(CoreError::not_found(kind, id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn validate_entry(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let Collection { kind, store } = Collection::parse(&collection)?;
    if store != Store::Unvalidated {
        return Err(ApiError::BadRequest(format!(
            "{} is not a collection of unvalidated entries",
            collection
        )));
    }
    let new_id = state.moderation.validate(kind, &id).await?;
    Ok(Json(json!({ "id": new_id })))
}

async fn add_festival_event(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(event): Json<FestivalEvent>,
) -> Result<(StatusCode, Json<FestivalEvent>), ApiError> {
    let Collection { kind, store } = Collection::parse(&collection)?;
    if kind != EntityKind::Festival {
        return Err(ApiError::BadRequest(format!("{} entries have no events", kind)));
    }
    let saved = state.writer.add_festival_event(&id, store, event).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn update_festival_event(
    State(state): State<AppState>,
    Path((collection, id, event_id)): Path<(String, String, String)>,
    Json(event): Json<FestivalEvent>,
) -> Result<Json<FestivalEvent>, ApiError> {
    let Collection { kind, store } = Collection::parse(&collection)?;
    if kind != EntityKind::Festival {
        return Err(ApiError::BadRequest(format!("{} entries have no events", kind)));
    }
    let updated = state
        .writer
        .update_festival_event(&id, store, &event_id, event)
        .await?;
    Ok(Json(updated))
}

fn from_body<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    Ok(serde_json::from_value(body)?)
}
