//! HTTP surface: the form model, the submit endpoint and the results.

use axum::{
    extract::{Form, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use log::{debug, info};
use serde::Serialize;
use snafu::prelude::*;

use std::collections::HashMap;
use std::sync::Arc;

use crate::poll::*;

/// Shared by every handler. Built once at startup and never mutated.
pub struct AppState {
    pub catalog: Catalog,
    pub log: ResponseLog,
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
pub struct GroupModel {
    pub key: String,
    pub name: String,
    pub breeds: Vec<String>,
}

/// What the form renderer needs to draw the dropdowns.
#[derive(Debug, Serialize)]
pub struct FormModel {
    #[serde(rename = "groupKeys")]
    pub group_keys: Vec<(String, String)>,
    #[serde(rename = "breedsByGroup")]
    pub breeds_by_group: Vec<GroupModel>,
    #[serde(rename = "allBreeds")]
    pub all_breeds: Vec<String>,
}

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(form_model).post(submit))
        .route("/results", get(results))
        .with_state(state)
}

/// GET / - the catalog, laid out for the form.
async fn form_model(State(state): State<SharedState>) -> Json<FormModel> {
    let catalog = &state.catalog;
    Json(FormModel {
        group_keys: catalog.group_keys(),
        breeds_by_group: catalog
            .groups()
            .iter()
            .map(|g| GroupModel {
                key: g.key.clone(),
                name: g.name.clone(),
                breeds: g.breeds.clone(),
            })
            .collect(),
        all_breeds: catalog.all_breeds().to_vec(),
    })
}

/// POST / - records one submission, then sends the browser to the results so
/// that a refresh does not submit again.
async fn submit(
    State(state): State<SharedState>,
    Form(form): Form<HashMap<String, String>>,
) -> ServiceResult<Redirect> {
    debug!("submit: {} fields", form.len());
    let row = tokio::task::spawn_blocking(move || {
        let submission = state.catalog.submission(&form);
        state.log.append(&state.catalog, &submission)
    })
    .await
    .context(BlockingTaskSnafu {})?
    .context(ResponseLogFailureSnafu {})?;
    info!("submit: recorded response from {:?} at {}", row.name, row.timestamp);
    Ok(Redirect::to("/results"))
}

/// GET /results - every recorded response, oldest first.
async fn results(State(state): State<SharedState>) -> ServiceResult<Json<LogContents>> {
    let contents = tokio::task::spawn_blocking(move || state.log.read_all())
        .await
        .context(BlockingTaskSnafu {})?
        .context(ResponseLogFailureSnafu {})?;
    Ok(Json(contents))
}
