//! Project validation logic.

use crate::schema::{LATEST_VERSION, Project, TableauDef};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Missing field: {field} in {context}")]
    MissingField { field: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version == 0 || project.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    if project.name.trim().is_empty() {
        return Err(invalid("name", &project.name, "must not be empty"));
    }

    if !(project.h.is_finite() && project.h > 0.0) {
        return Err(invalid("h", project.h, "step size must be finite and positive"));
    }

    let slowdown = project.render.slowdown_factor;
    if !(slowdown.is_finite() && slowdown > 0.0) {
        return Err(invalid(
            "render.slowdown_factor",
            slowdown,
            "must be finite and positive",
        ));
    }

    if project.initial_state.is_empty() {
        return Err(invalid("initial_state", "{}", "must have at least one field"));
    }

    for (name, value) in project.initial_state.iter() {
        if !value.is_finite() {
            return Err(invalid(format!("initial_state.{name}"), value, "must be finite"));
        }
    }

    for (name, value) in project.params.iter() {
        if !value.is_finite() {
            return Err(invalid(format!("params.{name}"), value, "must be finite"));
        }
    }

    for field in project.model.required_state_fields() {
        if project.initial_state.get(field).is_none() {
            return Err(ValidationError::MissingField {
                field: field.to_string(),
                context: "initial_state".to_string(),
            });
        }
    }

    for field in project.model.required_params() {
        if project.params.get(field).is_none() {
            return Err(ValidationError::MissingField {
                field: field.to_string(),
                context: "params".to_string(),
            });
        }
    }

    validate_tableau(&project.tableau)?;

    Ok(())
}

/// Shape checks only; coefficient rules are enforced by the integrator.
fn validate_tableau(tableau: &TableauDef) -> Result<(), ValidationError> {
    if tableau.name().trim().is_empty() {
        return Err(invalid("tableau.name", tableau.name(), "must not be empty"));
    }

    if let TableauDef::Custom { a, b, c, .. } = tableau {
        if b.is_empty() {
            return Err(invalid("tableau.b", "[]", "must have at least one stage"));
        }
        if c.len() != b.len() {
            return Err(invalid(
                "tableau.c",
                c.len(),
                "length must match tableau.b",
            ));
        }
        if a.len() != b.len() || a.iter().any(|row| row.len() != b.len()) {
            return Err(invalid(
                "tableau.a",
                format!("{} rows", a.len()),
                "must be square with one row per stage",
            ));
        }
    }

    Ok(())
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
