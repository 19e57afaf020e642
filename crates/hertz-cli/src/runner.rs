//! Simulation runner: ties together configuration, sweep, rendering and export.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;

use hertz_compute::{ComputeBackend, CpuBackend, SerialBackend};
use hertz_core::fields::evaluate;
use hertz_core::sweep::{RunMode, Sweep, SweepFrame};
use hertz_core::types::{Dipole, FieldResult};

use crate::config::JobConfig;
use crate::export::{create_output_directory, write_grid_csv, write_json};
use crate::render::{render_power_map, ColorScale, RenderOptions};

/// What one computed frame produced.
#[derive(Debug, Clone, Serialize)]
pub struct FrameSummary {
    pub index: usize,
    /// Observation time (s).
    pub time: f64,
    pub power_min: Option<f64>,
    pub power_max: Option<f64>,
    /// Wall-clock time spent computing the frame (s).
    pub elapsed_s: f64,
    pub files: Vec<PathBuf>,
}

/// Record of a finished run, written as `run.json` when requested.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub output_directory: PathBuf,
    pub backend: String,
    pub frequencies: Vec<f64>,
    pub relative_permittivity: f64,
    pub dipoles: Vec<Dipole>,
    pub mode: RunMode,
    pub frames: Vec<FrameSummary>,
}

/// Run a full sweep from a parsed job configuration.
///
/// `output_override` replaces the configured base directory.
pub fn run_simulation(job: &JobConfig, output_override: Option<&Path>) -> Result<RunSummary> {
    let frequencies = job.frequencies();
    let dipoles = job.dipole_set()?;
    let mode = job.run_mode()?;
    mode.validate()?;

    println!(
        "  {} dipole(s), {} frequenc{}, grid {}x{} at y = {} m",
        dipoles.len(),
        frequencies.len(),
        if frequencies.len() == 1 { "y" } else { "ies" },
        job.grid.nx,
        job.grid.nz,
        job.grid.height
    );

    let backend = create_backend(&job.backend, job.threads)?;
    let backend_name = backend.device_info().name;

    let sweep = Sweep {
        grid: job.grid.clone(),
        dipoles,
        frequencies,
        relative_permittivity: job.source.relative_permittivity,
        backend,
    };

    let base = output_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&job.output.directory));
    let out_dir = create_output_directory(&base, job.output.timestamped)?;
    println!("Output directory: {}", out_dir.display());

    let times = mode.sample_times();
    let total = times.len();
    let mut frames = Vec::with_capacity(total);

    for (k, &t) in times.iter().enumerate() {
        let started = Instant::now();
        let frame = sweep
            .compute_frame(k, t)
            .with_context(|| format!("Computing frame {} at t={:.3e} s", k, t))?;
        let elapsed = started.elapsed();

        log::info!("Progress: {:.1}/100", 100.0 * (k + 1) as f64 / total as f64);
        log::info!("Calculation time: {}", format_elapsed(elapsed));

        let files = save_frame(&frame, &mode, job, &out_dir)?;
        let (power_min, power_max) = match frame.power_range() {
            Some((lo, hi)) => (Some(lo), Some(hi)),
            None => (None, None),
        };
        frames.push(FrameSummary {
            index: k,
            time: t,
            power_min,
            power_max,
            elapsed_s: elapsed.as_secs_f64(),
            files,
        });
    }

    let summary = RunSummary {
        output_directory: out_dir.clone(),
        backend: backend_name,
        frequencies: sweep.frequencies.clone(),
        relative_permittivity: sweep.relative_permittivity,
        dipoles: sweep.dipoles.as_slice().to_vec(),
        mode,
        frames,
    };

    if job.output.save_json {
        write_json(&summary, &out_dir.join("run.json"))?;
    }

    Ok(summary)
}

/// Write the CSVs and image of one frame, returning the paths written.
fn save_frame(
    frame: &SweepFrame,
    mode: &RunMode,
    job: &JobConfig,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let series = mode.is_time_series();
    let t_ns = frame.time / 1e-9;
    let t_label = ns_label(frame.time);

    if job.output.save_csv {
        let (mag_name, phase_name) = if series {
            (
                format!("magDataimg_{}.csv", frame.index),
                format!("phaseDataimg_{}.csv", frame.index),
            )
        } else {
            ("magData.csv".to_string(), "phaseData.csv".to_string())
        };

        // Power rows follow z; phase rows follow x
        let mag_path = out_dir.join(mag_name);
        write_grid_csv(&mag_path, frame.power.t())?;
        files.push(mag_path);

        let phase_path = out_dir.join(phase_name);
        write_grid_csv(&phase_path, frame.phase.view())?;
        files.push(phase_path);
    }

    if job.output.save_image {
        let (file_name, options) = if series {
            (
                format!("img_{}.png", frame.index),
                RenderOptions {
                    width: job.output.image_width,
                    height: job.output.image_height,
                    scale: ColorScale::Log10,
                    title: format!("t = {:.2} ns", t_ns),
                },
            )
        } else {
            (
                format!("EfieldPlot{}ns.png", t_label),
                RenderOptions {
                    width: job.output.image_width,
                    height: job.output.image_height,
                    scale: ColorScale::Linear,
                    title: format!("Electric Field Plot at {} ns", t_label),
                },
            )
        };

        let image_path = out_dir.join(file_name);
        render_power_map(frame, &image_path, &options)
            .map_err(|e| anyhow::anyhow!("Rendering {}: {}", image_path.display(), e))?;
        files.push(image_path);
    }

    Ok(files)
}

/// Evaluate the fields of the configured dipoles at a single point.
///
/// Without an explicit `time`, the first instant of the configured run mode
/// is used.
pub fn evaluate_point(job: &JobConfig, at: [f64; 3], time: Option<f64>) -> Result<FieldResult> {
    let dipoles = job.dipole_set()?;
    let time = match time {
        Some(t) => t,
        None => job
            .run_mode()?
            .sample_times()
            .first()
            .copied()
            .context("Run mode has no sample times")?,
    };

    let result = evaluate(
        &at,
        &dipoles,
        &job.frequencies(),
        time,
        job.source.relative_permittivity,
    )?;
    Ok(result)
}

/// Time in ns to six decimals, without trailing zeros (`1.5e-9` -> `1.5`).
pub fn ns_label(time_s: f64) -> String {
    let text = format!("{:.6}", time_s / 1e-9);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "" | "-" | "-0" => "0".to_string(),
        t => t.to_string(),
    }
}

/// Format a duration as `HH:MM:SS`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Create a compute backend based on the user's preference string.
///
/// - `"cpu"` / `"auto"` (default): Rayon thread pool, `threads` workers if given.
/// - `"serial"`: single-threaded reference backend.
fn create_backend(preference: &str, threads: Option<usize>) -> Result<Arc<dyn ComputeBackend>> {
    let backend: Arc<dyn ComputeBackend> = match preference {
        "serial" => Arc::new(SerialBackend::new()),
        "cpu" | "auto" => match threads {
            Some(n) => Arc::new(CpuBackend::with_threads(n)?),
            None => Arc::new(CpuBackend::new()),
        },
        other => anyhow::bail!("Unknown backend '{}'", other),
    };

    println!("Backend: {}", backend.device_info().name);
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_config, ModeConfig};
    use approx::assert_relative_eq;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hertz-runner-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn small_job() -> JobConfig {
        let mut job = JobConfig::example();
        job.grid.nx = 9;
        job.grid.nz = 5;
        job.output.timestamped = false;
        job.output.save_image = false;
        job
    }

    fn read_rows(path: &Path) -> Vec<Vec<f64>> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l.split(',').map(|v| v.parse().unwrap()).collect())
            .collect()
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_elapsed(Duration::from_millis(3_723_900)), "01:02:03");
    }

    #[test]
    fn test_ns_label() {
        assert_eq!(ns_label(1e-9), "1");
        assert_eq!(ns_label(1.5e-9), "1.5");
        assert_eq!(ns_label(0.1e-9 * 3.0), "0.3");
        assert_eq!(ns_label(0.0), "0");
        assert_eq!(ns_label(2.5e-12), "0.0025");
    }

    #[test]
    fn test_images_written_with_expected_names() {
        let dir = scratch_dir("images");
        let mut job = small_job();
        job.output.save_image = true;
        job.output.save_csv = false;
        job.output.image_width = 320;
        job.output.image_height = 200;
        job.mode = ModeConfig::Single { time: 1.5e-9 };

        let summary = run_simulation(&job, Some(&dir)).unwrap();
        let image = dir.join("EfieldPlot1.5ns.png");
        assert!(image.is_file());
        assert!(std::fs::metadata(&image).unwrap().len() > 0);
        assert_eq!(summary.frames[0].files, vec![image]);

        job.mode = ModeConfig::TimeSeries {
            start: Some(0.1e-9),
            end: Some(0.2e-9),
            samples: Some(2),
        };
        run_simulation(&job, Some(&dir)).unwrap();
        assert!(dir.join("img_0.png").is_file());
        assert!(dir.join("img_1.png").is_file());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_single_run_writes_csvs() {
        let dir = scratch_dir("single");
        let mut job = small_job();
        job.output.save_json = true;

        let summary = run_simulation(&job, Some(&dir)).unwrap();
        assert_eq!(summary.frames.len(), 1);
        assert_eq!(summary.output_directory, dir);

        let mag = read_rows(&dir.join("magData.csv"));
        assert_eq!(mag.len(), 5);
        assert!(mag.iter().all(|row| row.len() == 9));

        let phase = read_rows(&dir.join("phaseData.csv"));
        assert_eq!(phase.len(), 9);
        assert!(phase.iter().all(|row| row.len() == 5));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join("run.json")).unwrap()).unwrap();
        assert_eq!(json["frames"].as_array().unwrap().len(), 1);
        assert_eq!(json["mode"]["kind"], "single");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_csv_matches_point_evaluation() {
        let dir = scratch_dir("point");
        let job = small_job();
        run_simulation(&job, Some(&dir)).unwrap();

        // Row j of magData is z[j]; column i is x[i]
        let mag = read_rows(&dir.join("magData.csv"));
        let x = job.grid.x_axis();
        let z = job.grid.z_axis();
        let res = evaluate_point(&job, [x[2], job.grid.height, z[4]], None).unwrap();
        assert_eq!(mag[4][2], res.power_proxy());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_time_series_file_names() {
        let dir = scratch_dir("series");
        let mut job = small_job();
        job.backend = "serial".into();
        job.mode = ModeConfig::TimeSeries {
            start: Some(0.1e-9),
            end: Some(0.3e-9),
            samples: Some(3),
        };

        let summary = run_simulation(&job, Some(&dir)).unwrap();
        assert_eq!(summary.frames.len(), 3);
        for k in 0..3 {
            assert!(dir.join(format!("magDataimg_{k}.csv")).is_file());
            assert!(dir.join(format!("phaseDataimg_{k}.csv")).is_file());
            assert_eq!(summary.frames[k].files.len(), 2);
        }
        assert!(!dir.join("magData.csv").exists());
        assert!(!dir.join("run.json").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_dipole_on_grid_aborts_run() {
        let dir = scratch_dir("coincident");
        let mut job = small_job();
        job.grid.height = 0.0;
        let err = run_simulation(&job, Some(&dir)).unwrap_err();
        assert!(format!("{err:#}").contains("coincides"), "{err:#}");
        assert!(!dir.join("magData.csv").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_evaluate_point_reference_values() {
        let job = parse_config(
            r#"
            [[dipole]]
            position = [0.0, 0.0, 0.0]
            phase = 1.0
            power_w = 1.0
            "#,
        )
        .unwrap();

        let res = evaluate_point(&job, [2.0, 2.0, 0.0], Some(1e-9)).unwrap();
        let ez = res.electric[[2, 0]];
        assert_relative_eq!(ez.re, -0.5341349930929749, max_relative = 1e-9);
        assert_relative_eq!(ez.im, -3.310123409202981, max_relative = 1e-9);

        // Default time comes from the single-frame run mode (1 ns)
        let default_time = evaluate_point(&job, [2.0, 2.0, 0.0], None).unwrap();
        assert_eq!(default_time.electric, res.electric);
    }

    #[test]
    fn test_threaded_cpu_backend() {
        let backend = create_backend("cpu", Some(2)).unwrap();
        assert_eq!(backend.device_info().compute_units, Some(2));
        assert!(create_backend("gpu", None).is_err());
    }
}
