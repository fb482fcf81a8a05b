// SPDX-License-Identifier: MIT

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct ProjectView {
    id: String,
    path: String,
}

pub async fn list_projects(State(state): State<AppState>) -> Json<Vec<ProjectView>> {
    let projects = state.engine.allowed_projects.iter().map(|p| ProjectView { id: p.id.clone(), path: p.path.clone() }).collect();
    Json(projects)
}
