//! Project schema definitions.

use pd_core::{ParameterVector, Real, StateVector};
use serde::{Deserialize, Serialize};

pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub model: ModelDef,
    pub tableau: TableauDef,
    /// Field name to initial value; the field set is the state shape.
    pub initial_state: StateVector,
    pub params: ParameterVector,
    /// Fixed step size (seconds)
    pub h: Real,
    pub n_steps: usize,
    #[serde(default)]
    pub render: RenderDef,
}

impl Project {
    /// The elastic pendulum reference scenario.
    pub fn reference() -> Self {
        Self {
            version: LATEST_VERSION,
            name: "Elastic pendulum".to_string(),
            description: None,
            model: ModelDef::ElasticPendulum,
            tableau: TableauDef::Named {
                name: "rk4".to_string(),
            },
            initial_state: fields([("x", 3.0), ("y", 0.0), ("vx", -5.0), ("vy", 0.0)]),
            params: fields([("m", 0.5), ("gamma", 0.1), ("k", 3.0), ("l", 1.0), ("g", 9.81)])
                .into(),
            h: 0.01,
            n_steps: 1000,
            render: RenderDef::default(),
        }
    }

    /// Simulated duration covered by the run (seconds).
    pub fn duration_s(&self) -> Real {
        self.h * self.n_steps as Real
    }

    /// Wall-clock time a renderer should show each history entry for.
    pub fn frame_interval_s(&self) -> Real {
        self.h * self.render.slowdown_factor
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ModelDef {
    ElasticPendulum,
}

impl ModelDef {
    pub fn required_state_fields(&self) -> &'static [&'static str] {
        match self {
            ModelDef::ElasticPendulum => &["x", "y", "vx", "vy"],
        }
    }

    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            ModelDef::ElasticPendulum => &["m", "gamma", "k", "l", "g"],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum TableauDef {
    /// One of the built-in schemes (`rk4`, `euler`, ...).
    Named { name: String },
    Custom {
        name: String,
        a: Vec<Vec<Real>>,
        b: Vec<Real>,
        c: Vec<Real>,
    },
}

impl TableauDef {
    pub fn name(&self) -> &str {
        match self {
            TableauDef::Named { name } | TableauDef::Custom { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderDef {
    /// Wall-clock seconds per simulated second.
    #[serde(default = "default_slowdown_factor")]
    pub slowdown_factor: Real,
}

impl Default for RenderDef {
    fn default() -> Self {
        Self {
            slowdown_factor: default_slowdown_factor(),
        }
    }
}

fn default_slowdown_factor() -> Real {
    1.0
}

fn fields<const N: usize>(pairs: [(&str, Real); N]) -> StateVector {
    match StateVector::new(pairs) {
        Ok(v) => v,
        Err(e) => unreachable!("reference field names are distinct: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_shape() {
        let yaml = r#"
version: 1
name: Swing
model: { type: ElasticPendulum }
tableau: { type: Named, name: rk4 }
initial_state: { x: 3.0, y: 0.0, vx: -5.0, vy: 0.0 }
params: { m: 0.5, gamma: 0.1, k: 3.0, l: 1.0, g: 9.81 }
h: 0.01
n_steps: 1000
"#;
        let project: Project = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(project.tableau.name(), "rk4");
        assert_eq!(project.render.slowdown_factor, 1.0);
        assert_eq!(project.initial_state.get("vx"), Some(-5.0));
        assert_eq!(project.initial_state.keys(), ["vx", "vy", "x", "y"]);
        assert_eq!(project.initial_state, Project::reference().initial_state);
        assert_eq!(project.params, Project::reference().params);
    }

    #[test]
    fn custom_tableau_shape() {
        let yaml = r#"
type: Custom
name: heun
a: [[0.0, 0.0], [1.0, 0.0]]
b: [0.5, 0.5]
c: [0.0, 1.0]
"#;
        let tableau: TableauDef = serde_yaml::from_str(yaml).unwrap();
        match tableau {
            TableauDef::Custom { a, b, .. } => {
                assert_eq!(a[1][0], 1.0);
                assert_eq!(b.len(), 2);
            }
            other => panic!("expected custom tableau, got {other:?}"),
        }
    }

    #[test]
    fn frame_interval_scales_step() {
        let mut project = Project::reference();
        assert_eq!(project.frame_interval_s(), 0.01);
        project.render.slowdown_factor = 4.0;
        assert_eq!(project.frame_interval_s(), 0.04);
        assert!((project.duration_s() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn vectors_serialize_as_maps() {
        let project = Project::reference();
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["initial_state"]["x"], 3.0);
        assert_eq!(json["params"]["g"], 9.81);

        let back: Project = serde_json::from_value(json).unwrap();
        assert_eq!(back, project);
        assert_eq!(back.params.field("m").unwrap(), 0.5);
    }
}
