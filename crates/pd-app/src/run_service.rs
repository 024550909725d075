//! Run execution and caching service.

use std::ops::ControlFlow;
use std::path::Path;
use std::time::Instant;

use pd_project::{ModelDef, Project, TableauDef};
use pd_results::{HistoryRecord, RunManifest, RunStore};
use pd_sim::{ButcherTable, DerivativeProvider, ElasticPendulum, History, RunSpec, SimProgress};

use crate::error::AppResult;
use crate::progress::{RunProgressEvent, RunStage};
use crate::project_service;

/// Version string mixed into run ids, so results are recomputed after upgrades.
pub const SOLVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Options for running simulations.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub solver_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            solver_version: SOLVER_VERSION.to_string(),
        }
    }
}

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub project_path: &'a Path,
    pub options: RunOptions,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub loaded_from_cache: bool,
    pub elapsed_wall_s: f64,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    sim: Option<SimProgress>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            sim,
        });
    }
}

/// Translate a project into the integrator's inputs.
pub fn build_run_spec(project: &Project) -> AppResult<RunSpec> {
    let table = match &project.tableau {
        TableauDef::Named { name } => ButcherTable::named(name)?,
        TableauDef::Custom { name, a, b, c } => {
            ButcherTable::new(name.clone(), a.clone(), b.clone(), c.clone())
        }
    };
    table.validate()?;

    Ok(RunSpec {
        table,
        initial_state: project.initial_state.clone(),
        params: project.params.clone(),
        h: project.h,
        n_steps: project.n_steps,
    })
}

/// Derivative law for a model definition.
pub fn provider_for(model: &ModelDef) -> Box<dyn DerivativeProvider> {
    match model {
        ModelDef::ElasticPendulum => Box::new(ElasticPendulum),
    }
}

/// Flatten a history into storable records.
pub fn history_records(history: &History) -> Vec<HistoryRecord> {
    history
        .iter()
        .zip(history.times())
        .enumerate()
        .map(|(step, (state, time_s))| HistoryRecord {
            step,
            time_s,
            values: state.iter().map(|(k, v)| (k.to_string(), v)).collect(),
        })
        .collect()
}

/// Execute or load a run based on request.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None)
}

/// Execute or load a run and stream progress events.
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();

    emit_progress(&mut progress_cb, RunStage::LoadingProject, started, None);
    let project = project_service::load_project(request.project_path)?;

    emit_progress(&mut progress_cb, RunStage::CheckingCache, started, None);
    let run_id = pd_results::compute_run_id(&project, &request.options.solver_version);
    let store = RunStore::for_project(request.project_path)?;

    if request.options.use_cache && store.has_run(&run_id) {
        emit_progress(&mut progress_cb, RunStage::LoadingCachedResult, started, None);
        let manifest = store.load_manifest(&run_id)?;
        tracing::info!(run_id = %run_id, "loaded cached run");

        emit_progress(&mut progress_cb, RunStage::Completed, started, None);
        return Ok(RunResponse {
            run_id,
            manifest,
            loaded_from_cache: true,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
        });
    }

    let spec = build_run_spec(&project)?;
    let provider = provider_for(&project.model);

    tracing::info!(
        run_id = %run_id,
        tableau = %spec.table.name,
        h = spec.h,
        n_steps = spec.n_steps,
        "executing run"
    );

    let history = {
        let mut on_step = |p: &SimProgress| -> ControlFlow<()> {
            emit_progress(&mut progress_cb, RunStage::Integrating, started, Some(*p));
            ControlFlow::Continue(())
        };
        spec.run_with_progress(provider.as_ref(), Some(&mut on_step))?
    };

    emit_progress(&mut progress_cb, RunStage::SavingResults, started, None);
    let manifest = RunManifest {
        run_id: run_id.clone(),
        name: project.name.clone(),
        timestamp: pd_results::timestamp_now(),
        tableau: spec.table.name.clone(),
        h: spec.h,
        n_steps: spec.n_steps,
        frame_interval_s: project.frame_interval_s(),
        solver_version: request.options.solver_version.clone(),
    };
    store.save_run(&manifest, &history_records(&history))?;

    emit_progress(&mut progress_cb, RunStage::Completed, started, None);
    Ok(RunResponse {
        run_id,
        manifest,
        loaded_from_cache: false,
        elapsed_wall_s: started.elapsed().as_secs_f64(),
    })
}

/// Load a stored run.
pub fn load_run(project_path: &Path, run_id: &str) -> AppResult<(RunManifest, Vec<HistoryRecord>)> {
    let store = RunStore::for_project(project_path)?;
    let manifest = store.load_manifest(run_id)?;
    let records = store.load_history(run_id)?;
    Ok((manifest, records))
}

/// List stored runs for a project, oldest first.
pub fn list_runs(project_path: &Path) -> AppResult<Vec<RunManifest>> {
    let store = RunStore::for_project(project_path)?;
    Ok(store.list_runs()?)
}
