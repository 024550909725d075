//! Content-based hashing for run IDs.

use pd_project::Project;
use sha2::{Digest, Sha256};

/// SHA-256 over the serialized project and the solver version.
pub fn compute_run_id(project: &Project, solver_version: &str) -> String {
    let mut hasher = Sha256::new();

    let project_json = serde_json::to_string(project).unwrap_or_default();
    hasher.update(project_json.as_bytes());

    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
