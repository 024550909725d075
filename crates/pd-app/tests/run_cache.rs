//! End-to-end tests for the run service: compile, integrate, cache, export.

use std::path::PathBuf;

use pd_app::{
    RunOptions, RunProgressEvent, RunRequest, RunStage, ensure_run, ensure_run_with_progress,
    export_csv, field_series, init_project, list_runs, load_run, save_project,
};
use pd_project::Project;

fn fresh_project(dir_name: &str, n_steps: usize) -> PathBuf {
    let dir = std::env::temp_dir().join(dir_name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();

    let mut project = Project::reference();
    project.n_steps = n_steps;
    let path = dir.join("pendulum.yaml");
    save_project(&path, &project).unwrap();
    path
}

#[test]
fn second_run_is_served_from_cache() {
    let path = fresh_project("pd_app_cache", 50);
    let request = RunRequest {
        project_path: &path,
        options: RunOptions::default(),
    };

    let first = ensure_run(&request).unwrap();
    assert!(!first.loaded_from_cache);
    assert_eq!(first.manifest.n_steps, 50);
    assert_eq!(first.manifest.tableau, "rk4");
    assert_eq!(first.manifest.frame_interval_s, 0.01);

    let second = ensure_run(&request).unwrap();
    assert!(second.loaded_from_cache);
    assert_eq!(second.run_id, first.run_id);

    let runs = list_runs(&path).unwrap();
    assert_eq!(runs.len(), 1);

    let (manifest, records) = load_run(&path, &first.run_id).unwrap();
    assert_eq!(manifest, first.manifest);
    assert_eq!(records.len(), 51);
    assert_eq!(records[0].values["x"], 3.0);
    assert!(records.iter().all(|r| r.values.values().all(|v| v.is_finite())));
}

#[test]
fn disabling_cache_recomputes() {
    let path = fresh_project("pd_app_no_cache", 10);
    let request = RunRequest {
        project_path: &path,
        options: RunOptions {
            use_cache: false,
            ..RunOptions::default()
        },
    };

    let first = ensure_run(&request).unwrap();
    let (_, first_records) = load_run(&path, &first.run_id).unwrap();

    let second = ensure_run(&request).unwrap();
    assert!(!first.loaded_from_cache);
    assert!(!second.loaded_from_cache);
    assert_eq!(first.run_id, second.run_id);

    let (_, second_records) = load_run(&path, &second.run_id).unwrap();
    assert_eq!(second_records.len(), 11);
    assert_eq!(first_records, second_records);
}

#[test]
fn progress_covers_every_step() {
    let path = fresh_project("pd_app_progress", 20);
    let request = RunRequest {
        project_path: &path,
        options: RunOptions::default(),
    };

    let mut events: Vec<RunProgressEvent> = Vec::new();
    ensure_run_with_progress(&request, Some(&mut |e| events.push(e))).unwrap();

    let integrating = events
        .iter()
        .filter(|e| e.stage == RunStage::Integrating)
        .count();
    assert_eq!(integrating, 20);
    assert_eq!(events.first().map(|e| e.stage), Some(RunStage::LoadingProject));
    assert_eq!(events.last().map(|e| e.stage), Some(RunStage::Completed));
    let last_step = events.iter().filter_map(|e| e.sim).map(|p| p.step).max();
    assert_eq!(last_step, Some(20));
}

#[test]
fn csv_export_of_stored_run() {
    let path = fresh_project("pd_app_export", 5);
    let response = ensure_run(&RunRequest {
        project_path: &path,
        options: RunOptions::default(),
    })
    .unwrap();

    let (_, records) = load_run(&path, &response.run_id).unwrap();
    let mut out = Vec::new();
    export_csv(&records, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[0], "step,time_s,vx,vy,x,y");
    assert!(lines[1].starts_with("0,0,-5,0,3,0"));

    let xs = field_series(&records, "x").unwrap();
    assert_eq!(xs.len(), 6);
    assert_eq!(xs[0], (0.0, 3.0));
}

#[test]
fn init_writes_reference_project_once() {
    let dir = std::env::temp_dir().join("pd_app_init");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("new.yaml");

    let project = init_project(&path).unwrap();
    assert_eq!(project, Project::reference());
    assert_eq!(pd_app::load_project(&path).unwrap(), project);
    assert!(init_project(&path).is_err());
}

#[test]
fn overflowing_run_is_not_cached() {
    let dir = std::env::temp_dir().join("pd_app_overflow");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("stiff.yaml");
    std::fs::write(
        &path,
        r#"
version: 1
name: Overflowing spring
model: { type: ElasticPendulum }
tableau: { type: Named, name: euler }
initial_state: { x: 3.0, y: 0.0, vx: -5.0, vy: 0.0 }
params: { m: 0.5, gamma: 0.1, k: 1.0e308, l: 1.0, g: 9.81 }
h: 0.01
n_steps: 1
"#,
    )
    .unwrap();

    let request = RunRequest {
        project_path: &path,
        options: RunOptions::default(),
    };
    for _ in 0..2 {
        let err = ensure_run(&request).unwrap_err();
        assert!(
            matches!(
                err,
                pd_app::AppError::Results(pd_results::ResultsError::NonFiniteValue { step: 1, .. })
            ),
            "{err}"
        );
    }
    assert!(list_runs(&path).unwrap().is_empty());
}
