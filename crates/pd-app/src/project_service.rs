//! Project loading, saving, and validation.

use std::path::Path;

use pd_project::Project;

use crate::error::{AppError, AppResult};

/// Load and validate a project (YAML, or JSON by extension).
pub fn load_project(path: &Path) -> AppResult<Project> {
    Ok(pd_project::load(path)?)
}

/// Save a project, choosing the format by extension.
pub fn save_project(path: &Path, project: &Project) -> AppResult<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => pd_project::save_json(path, project)?,
        _ => pd_project::save_yaml(path, project)?,
    }
    Ok(())
}

/// Validate a project, including that its tableau and vectors can be built.
pub fn validate_project(project: &Project) -> AppResult<()> {
    pd_project::validate_project(project).map_err(pd_project::ProjectError::from)?;
    crate::run_service::build_run_spec(project)?;
    Ok(())
}

/// Write the reference pendulum project to `path`. Existing files are left alone.
pub fn init_project(path: &Path) -> AppResult<Project> {
    if path.exists() {
        return Err(AppError::InvalidInput(format!(
            "{} already exists",
            path.display()
        )));
    }
    let project = Project::reference();
    save_project(path, &project)?;
    Ok(project)
}
