//! Run storage API.
//!
//! Layout: `<root>/<run_id>/manifest.json` plus `<root>/<run_id>/history.jsonl`
//! with one [`HistoryRecord`] per line.

use crate::types::{HistoryRecord, RunManifest};
use crate::{ResultsError, ResultsResult};
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store rooted next to the project file, in `.pendulum/runs`.
    pub fn for_project(project_path: &Path) -> ResultsResult<Self> {
        let project_dir = project_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "project path has no parent directory".to_string(),
            })?;
        let runs_dir = project_dir.join(".pendulum").join("runs");
        Self::new(runs_dir)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Run ids are SHA-256 hex digests; anything else never touches the filesystem.
    fn run_dir(&self, run_id: &str) -> ResultsResult<PathBuf> {
        if !is_run_id(run_id) {
            return Err(ResultsError::InvalidRunId {
                run_id: run_id.to_string(),
            });
        }
        Ok(self.root_dir.join(run_id))
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        match self.run_dir(run_id) {
            Ok(dir) => dir.join("manifest.json").exists() && dir.join("history.jsonl").exists(),
            Err(_) => false,
        }
    }

    /// Persist a run. Records must be finite; JSON cannot carry NaN or infinities.
    pub fn save_run(&self, manifest: &RunManifest, records: &[HistoryRecord]) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id)?;
        check_finite(records)?;
        fs::create_dir_all(&run_dir)?;

        // History first, so a manifest never points at a missing history.
        let history_path = run_dir.join("history.jsonl");
        let mut writer = BufWriter::new(fs::File::create(history_path)?);
        for record in records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        let manifest_path = run_dir.join("manifest.json");
        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(manifest_path, manifest_json)?;

        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let manifest_path = self.run_dir(run_id)?.join("manifest.json");

        if !manifest_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(manifest_path)?;
        let manifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }

    pub fn load_history(&self, run_id: &str) -> ResultsResult<Vec<HistoryRecord>> {
        let history_path = self.run_dir(run_id)?.join("history.jsonl");

        if !history_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let reader = BufReader::new(fs::File::open(history_path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                records.push(serde_json::from_str(&line)?);
            }
        }

        Ok(records)
    }

    /// All stored runs, oldest first.
    pub fn list_runs(&self) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id) {
                    runs.push(manifest);
                }
            }
        }

        runs.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.run_id.cmp(&b.run_id))
        });
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id)?;
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}

fn is_run_id(run_id: &str) -> bool {
    run_id.len() == 64 && run_id.bytes().all(|b| b.is_ascii_hexdigit())
}

fn check_finite(records: &[HistoryRecord]) -> ResultsResult<()> {
    for record in records {
        let time = std::iter::once(("time_s", record.time_s));
        let values = record.values.iter().map(|(k, &v)| (k.as_str(), v));
        if let Some((field, value)) = time.chain(values).find(|(_, v)| !v.is_finite()) {
            return Err(ResultsError::NonFiniteValue {
                step: record.step,
                field: field.to_string(),
                value,
            });
        }
    }
    Ok(())
}
