//! Machine registry routes.

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use cwex_core::{MachineTriple, TriplePatch};
use serde::Deserialize;
use tracing::instrument;

use super::AppState;
use super::error::ApiError;
use super::extract::ApiJson;
use crate::registry::{RegistryError, filter_from_query};
use crate::storage::Machine;

/// `machineNumber` arrives as either a JSON string or an integer.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MachineNumber {
    Text(String),
    Number(i64),
}

impl From<MachineNumber> for String {
    fn from(n: MachineNumber) -> Self {
        match n {
            MachineNumber::Text(s) => s,
            MachineNumber::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMachineRequest {
    location: String,
    branch: String,
    machine_number: MachineNumber,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateMachineRequest {
    location: Option<String>,
    branch: Option<String>,
    machine_number: Option<MachineNumber>,
}

impl From<UpdateMachineRequest> for TriplePatch {
    fn from(req: UpdateMachineRequest) -> Self {
        Self {
            location: req.location,
            branch: req.branch,
            machine_number: req.machine_number.map(String::from),
        }
    }
}

/// `GET /machines?<field>=<value>...`
pub async fn list_machines(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Machine>>, ApiError> {
    let filter = filter_from_query(&query)?;
    Ok(Json(state.registry.list(&filter).await?))
}

/// `POST /machines`
#[instrument(skip_all)]
pub async fn add_machine(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AddMachineRequest>,
) -> Result<(StatusCode, Json<Machine>), ApiError> {
    let triple = MachineTriple::new(req.location, req.branch, req.machine_number)
        .map_err(RegistryError::from)?;
    let machine = state.registry.create(triple).await?;
    Ok((StatusCode::CREATED, Json(machine)))
}

/// `GET /machines/{id}`
pub async fn get_machine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Machine>, ApiError> {
    Ok(Json(state.registry.get(&id).await?))
}

/// `PUT /machines/{id}`
#[instrument(skip(state, req))]
pub async fn update_machine(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateMachineRequest>,
) -> Result<Json<Machine>, ApiError> {
    let patch = TriplePatch::from(req);
    Ok(Json(state.registry.update(&id, &patch).await?))
}

/// `DELETE /machines/{id}` -- `null` when the machine was already gone.
pub async fn delete_machine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Option<Machine>>, ApiError> {
    Ok(Json(state.registry.delete(&id).await?))
}
