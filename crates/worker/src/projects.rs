// SPDX-License-Identifier: MIT

//! Project allow-list loading. `createThread`'s `projectSelector`
//! resolves against this list; `cw-engine::ProjectDescriptor` is the
//! validated shape, this module only knows how to get one off disk.

use std::path::Path;

use cw_engine::ProjectDescriptor;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ProjectEntry {
    id: String,
    path: String,
}

#[derive(Debug, Deserialize, Default)]
struct ProjectsFile {
    #[serde(default)]
    projects: Vec<ProjectEntry>,
}

/// Load the allow-list from a JSON file of the shape
/// `{"projects": [{"id": "...", "path": "..."}]}`. A missing
/// `--projects-file` resolves to an empty list, not an error — every
/// `createThread` call then fails closed with `PROJECT_NOT_ALLOWED`.
pub fn load(path: Option<&Path>) -> anyhow::Result<Vec<ProjectDescriptor>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };

    let raw = std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("failed to read projects file {}: {e}", path.display()))?;
    let parsed: ProjectsFile = serde_json::from_str(&raw).map_err(|e| anyhow::anyhow!("failed to parse projects file {}: {e}", path.display()))?;

    Ok(parsed.projects.into_iter().map(|entry| ProjectDescriptor { id: entry.id, path: entry.path }).collect())
}

#[cfg(test)]
#[path = "projects_tests.rs"]
mod tests;
