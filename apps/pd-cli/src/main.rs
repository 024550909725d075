use clap::{Parser, Subcommand};
use pd_app::{
    AppResult, RunOptions, RunProgressEvent, RunRequest, RunStage, export_csv, list_runs,
    load_run, run_service,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "pd-cli")]
#[command(about = "Elastic pendulum CLI - fixed-step Runge-Kutta trajectories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the reference pendulum project to a new file
    Init {
        /// Path of the project file to create (.yaml or .json)
        project_path: PathBuf,
    },
    /// Validate project file syntax and structure
    Validate {
        /// Path to the project file
        project_path: PathBuf,
    },
    /// Integrate the project's trajectory
    Run {
        /// Path to the project file
        project_path: PathBuf,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// List cached runs for a project
    Runs {
        /// Path to the project file
        project_path: PathBuf,
    },
    /// Show details of a cached run
    ShowRun {
        /// Path to the project file
        project_path: PathBuf,
        /// Run ID to display
        run_id: String,
    },
    /// Export a run's history as CSV
    Export {
        /// Path to the project file
        project_path: PathBuf,
        /// Run ID
        run_id: String,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { project_path } => cmd_init(&project_path),
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Run {
            project_path,
            no_cache,
        } => cmd_run(&project_path, !no_cache),
        Commands::Runs { project_path } => cmd_runs(&project_path),
        Commands::ShowRun {
            project_path,
            run_id,
        } => cmd_show_run(&project_path, &run_id),
        Commands::Export {
            project_path,
            run_id,
            output,
        } => cmd_export(&project_path, &run_id, output.as_deref()),
    }
}

fn cmd_init(project_path: &Path) -> AppResult<()> {
    let project = pd_app::init_project(project_path)?;
    println!(
        "✓ Wrote '{}' to {}",
        project.name,
        project_path.display()
    );
    Ok(())
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = pd_app::load_project(project_path)?;
    pd_app::validate_project(&project)?;
    println!("✓ Project is valid");
    println!(
        "  {}: tableau={}, h={} s, n_steps={}, duration={:.3} s",
        project.name,
        project.tableau.name(),
        project.h,
        project.n_steps,
        project.duration_s()
    );
    Ok(())
}

fn cmd_run(project_path: &Path, use_cache: bool) -> AppResult<()> {
    println!("Running project: {}", project_path.display());

    let request = RunRequest {
        project_path,
        options: RunOptions {
            use_cache,
            ..RunOptions::default()
        },
    };

    let mut last_emit = Instant::now();
    let mut last_fraction = -1.0f64;
    let response = run_service::ensure_run_with_progress(
        &request,
        Some(&mut |event| {
            let fraction = event
                .sim
                .as_ref()
                .map(|p| p.fraction_complete())
                .unwrap_or(-1.0);
            let emit_now = (fraction >= 0.0 && (fraction - last_fraction).abs() >= 0.005)
                || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                if fraction >= 0.0 {
                    last_fraction = fraction;
                }
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Simulation completed: {}", response.run_id);
    }

    let m = &response.manifest;
    println!("  Tableau: {}", m.tableau);
    println!("  Steps: {} (h = {} s)", m.n_steps, m.h);
    println!("  History entries: {}", m.n_steps + 1);
    println!("  Frame interval: {:.4} s", m.frame_interval_s);
    println!("  Wall time: {:.3} s", response.elapsed_wall_s);

    Ok(())
}

fn cmd_runs(project_path: &Path) -> AppResult<()> {
    let runs = list_runs(project_path)?;

    if runs.is_empty() {
        println!("No cached runs found");
    } else {
        println!("Cached runs:");
        for run in runs {
            println!(
                "  {}  {}  {}  tableau={} steps={}",
                run.run_id, run.timestamp, run.name, run.tableau, run.n_steps
            );
        }
    }
    Ok(())
}

fn cmd_show_run(project_path: &Path, run_id: &str) -> AppResult<()> {
    let (manifest, records) = load_run(project_path, run_id)?;

    println!("Run: {}", manifest.run_id);
    println!("  Name: {}", manifest.name);
    println!("  Created: {}", manifest.timestamp);
    println!("  Solver version: {}", manifest.solver_version);
    println!("  Tableau: {}", manifest.tableau);
    println!("  h = {} s, steps = {}", manifest.h, manifest.n_steps);
    println!("  Frame interval: {:.4} s", manifest.frame_interval_s);
    println!("  Records: {}", records.len());

    if let Some(last) = records.last() {
        println!("  Final state (t = {:.3} s):", last.time_s);
        for (name, value) in &last.values {
            println!("    {name} = {value:.6}");
        }
    }
    Ok(())
}

fn cmd_export(project_path: &Path, run_id: &str, output: Option<&Path>) -> AppResult<()> {
    let (_manifest, records) = load_run(project_path, run_id)?;

    match output {
        Some(path) => {
            let file = BufWriter::new(File::create(path)?);
            export_csv(&records, file)?;
            tracing::info!(path = %path.display(), records = records.len(), "exported history");
            println!("✓ Wrote {} records to {}", records.len(), path.display());
        }
        None => export_csv(&records, io::stdout().lock())?,
    }
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    match (event.stage, event.sim) {
        (RunStage::Integrating, Some(p)) => {
            let width = 28usize;
            let fraction = p.fraction_complete();
            let filled = ((fraction * width as f64).round() as usize).min(width);
            let bar = format!(
                "{}{}",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled))
            );
            print!(
                "\r[{}] {:>6.2}%  t={:.3}s  step={}/{}  elapsed={:.1}s",
                bar,
                fraction * 100.0,
                p.time_s,
                p.step,
                p.n_steps,
                event.elapsed_wall_s
            );
            let _ = io::stdout().flush();
        }
        _ => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            print!(
                "\r{} {}  elapsed={:.2}s",
                spinner[spin_idx],
                event.stage.label(),
                event.elapsed_wall_s
            );
            let _ = io::stdout().flush();
        }
    }
}
