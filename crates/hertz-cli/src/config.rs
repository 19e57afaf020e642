//! TOML configuration (de)serialisation for radiation jobs.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use hertz_core::constants::dipole_moment_for_power;
use hertz_core::sweep::{RunMode, SweepGrid};
use hertz_core::types::{Dipole, DipoleSet};

/// Top-level job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Compute backend: "auto", "cpu", or "serial". Default: "auto".
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Worker threads for the "cpu" backend (default: all cores).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    #[serde(default)]
    pub grid: SweepGrid,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(rename = "dipole")]
    pub dipoles: Vec<DipoleConfig>,
    #[serde(default)]
    pub mode: ModeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_backend() -> String {
    "auto".into()
}

/// Excitation shared by all dipoles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub frequencies: FrequencySpec,
    #[serde(default = "default_permittivity")]
    pub relative_permittivity: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            frequencies: FrequencySpec::default(),
            relative_permittivity: default_permittivity(),
        }
    }
}

fn default_permittivity() -> f64 {
    1.0
}

/// Frequency specification (Hz): either a range or explicit list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrequencySpec {
    Range { range: [f64; 2], points: usize },
    List { values: Vec<f64> },
}

impl Default for FrequencySpec {
    fn default() -> Self {
        FrequencySpec::List {
            values: vec![1.0e9],
        }
    }
}

impl FrequencySpec {
    pub fn resolve(&self) -> Vec<f64> {
        match self {
            FrequencySpec::Range { range, points } => {
                hertz_core::sweep::linspace(range[0], range[1], *points)
            }
            FrequencySpec::List { values } => values.clone(),
        }
    }
}

/// A single radiating dipole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DipoleConfig {
    /// Position in metres (default: origin).
    #[serde(default)]
    pub position: [f64; 3],
    /// Phase angle in radians.
    #[serde(default)]
    pub phase: f64,
    #[serde(flatten)]
    pub moment: MomentSpec,
}

/// Dipole moment: explicit vector, or derived from a target radiated power.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MomentSpec {
    Vector {
        moment: [f64; 3],
    },
    Power {
        /// Time-averaged total radiated power (W) at the first frequency.
        power_w: f64,
        #[serde(default = "default_direction")]
        direction: [f64; 3],
    },
}

fn default_direction() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}

impl DipoleConfig {
    /// Resolve into a [`Dipole`], deriving the moment magnitude from the
    /// radiated power at `frequency_hz` when needed.
    pub fn to_dipole(&self, frequency_hz: f64) -> Dipole {
        match &self.moment {
            MomentSpec::Vector { moment } => Dipole::new(*moment, self.position, self.phase),
            MomentSpec::Power { power_w, direction } => Dipole::along(
                *direction,
                dipole_moment_for_power(*power_w, frequency_hz),
                self.position,
                self.phase,
            ),
        }
    }
}

/// Run mode from TOML; omitted time-series bounds follow the first frequency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModeConfig {
    Single {
        /// Observation time in seconds.
        #[serde(default = "default_time")]
        time: f64,
    },
    TimeSeries {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        samples: Option<usize>,
    },
}

impl Default for ModeConfig {
    fn default() -> Self {
        ModeConfig::Single {
            time: default_time(),
        }
    }
}

fn default_time() -> f64 {
    1e-9
}

impl ModeConfig {
    pub fn resolve(&self, frequency_hz: f64) -> RunMode {
        match *self {
            ModeConfig::Single { time } => RunMode::Single { time },
            ModeConfig::TimeSeries {
                start,
                end,
                samples,
            } => match RunMode::time_series_for(frequency_hz) {
                RunMode::TimeSeries {
                    start: s0,
                    end: e0,
                    samples: n0,
                } => RunMode::TimeSeries {
                    start: start.unwrap_or(s0),
                    end: end.unwrap_or(e0),
                    samples: samples.unwrap_or(n0),
                },
                single => single,
            },
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Base output directory (default: current directory).
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Whether to create a `YYYYMMDD-HHMMSS` sub-directory (default: true).
    #[serde(default = "default_true")]
    pub timestamped: bool,
    /// Whether to render PNG images (default: true).
    #[serde(default = "default_true")]
    pub save_image: bool,
    /// Whether to write magnitude/phase CSV grids (default: true).
    #[serde(default = "default_true")]
    pub save_csv: bool,
    /// Whether to write a JSON run summary (default: false).
    #[serde(default)]
    pub save_json: bool,
    #[serde(default = "default_image_width")]
    pub image_width: u32,
    #[serde(default = "default_image_height")]
    pub image_height: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            timestamped: true,
            save_image: true,
            save_csv: true,
            save_json: false,
            image_width: default_image_width(),
            image_height: default_image_height(),
        }
    }
}

fn default_output_dir() -> String {
    ".".into()
}
fn default_true() -> bool {
    true
}
fn default_image_width() -> u32 {
    1000
}
fn default_image_height() -> u32 {
    600
}

impl JobConfig {
    /// The default job: one z-oriented dipole at the origin radiating 1 W
    /// at 1 GHz with a phase of 1 rad, observed on the plane y = 2 m.
    pub fn example() -> Self {
        Self {
            backend: default_backend(),
            threads: None,
            grid: SweepGrid::default(),
            source: SourceConfig::default(),
            dipoles: vec![DipoleConfig {
                position: [0.0, 0.0, 0.0],
                phase: 1.0,
                moment: MomentSpec::Power {
                    power_w: 1.0,
                    direction: default_direction(),
                },
            }],
            mode: ModeConfig::default(),
            output: OutputConfig::default(),
        }
    }

    pub fn frequencies(&self) -> Vec<f64> {
        self.source.frequencies.resolve()
    }

    /// Frequency used to derive moments from power and default time axes.
    pub fn reference_frequency(&self) -> Result<f64> {
        self.frequencies()
            .first()
            .copied()
            .ok_or_else(|| anyhow!("At least one frequency is required"))
    }

    pub fn dipole_set(&self) -> Result<DipoleSet> {
        let f0 = self.reference_frequency()?;
        let dipoles = self.dipoles.iter().map(|d| d.to_dipole(f0)).collect();
        Ok(DipoleSet::new(dipoles)?)
    }

    pub fn run_mode(&self) -> Result<RunMode> {
        Ok(self.mode.resolve(self.reference_frequency()?))
    }

    /// Check the configuration for values the sweep cannot use.
    pub fn validate(&self) -> Result<()> {
        match self.backend.as_str() {
            "auto" | "cpu" | "serial" => {}
            other => {
                return Err(anyhow!(
                    "Unknown backend '{}'. Valid values: auto, cpu, serial",
                    other
                ))
            }
        }
        if self.threads == Some(0) {
            return Err(anyhow!("threads must be at least 1"));
        }

        self.grid.validate()?;

        let freqs = self.frequencies();
        if freqs.is_empty() {
            return Err(anyhow!("At least one frequency is required"));
        }
        if let Some(f) = freqs.iter().find(|f| !(f.is_finite() && **f > 0.0)) {
            return Err(anyhow!("Frequencies must be positive and finite (got {})", f));
        }
        let eps = self.source.relative_permittivity;
        if !(eps.is_finite() && eps > 0.0) {
            return Err(anyhow!(
                "relative_permittivity must be positive (got {})",
                eps
            ));
        }

        if self.dipoles.is_empty() {
            return Err(anyhow!("At least one [[dipole]] is required"));
        }
        for (i, d) in self.dipoles.iter().enumerate() {
            if let MomentSpec::Power { power_w, direction } = &d.moment {
                if !(power_w.is_finite() && *power_w >= 0.0) {
                    return Err(anyhow!(
                        "Dipole {}: power_w must be non-negative (got {})",
                        i,
                        power_w
                    ));
                }
                if direction.iter().all(|c| *c == 0.0) {
                    return Err(anyhow!("Dipole {}: direction must be non-zero", i));
                }
            }
        }

        self.run_mode()?.validate()?;
        Ok(())
    }
}

/// Load, parse and validate a TOML job configuration file.
pub fn load_config(path: &std::path::Path) -> Result<JobConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Reading configuration {}", path.display()))?;
    let config = parse_config(&content)
        .with_context(|| format!("Parsing configuration {}", path.display()))?;
    Ok(config)
}

/// Parse and validate a TOML job configuration from a string.
pub fn parse_config(content: &str) -> Result<JobConfig> {
    let config: JobConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_minimal_config_uses_builtin_defaults() {
        let job = parse_config(
            r#"
            [[dipole]]
            power_w = 1.0
            phase = 1.0
            "#,
        )
        .unwrap();

        assert_eq!(job.backend, "auto");
        assert_eq!(job.grid, SweepGrid::default());
        assert_eq!(job.frequencies(), vec![1.0e9]);
        assert_eq!(job.run_mode().unwrap(), RunMode::Single { time: 1e-9 });
        assert!(job.output.timestamped);

        let set = job.dipole_set().unwrap();
        let d = set.primary();
        assert_eq!(d.position, [0.0, 0.0, 0.0]);
        assert_eq!(d.moment[0], 0.0);
        assert_relative_eq!(d.moment[2], 2.402_211_502_156_476e-12, max_relative = 1e-12);
    }

    #[test]
    fn test_explicit_moments_and_range() {
        let job = parse_config(
            r#"
            backend = "serial"

            [grid]
            nx = 11
            nz = 5

            [source]
            frequencies = { range = [1.0e9, 2.0e9], points = 3 }
            relative_permittivity = 2.25

            [[dipole]]
            moment = [0.0, 1e-12, 0.0]
            position = [0.1, 0, 0]

            [[dipole]]
            moment = [0.0, 0.0, 1e-12]
            phase = 2.5
            "#,
        )
        .unwrap();

        assert_eq!(job.grid.nx, 11);
        assert_eq!(job.grid.x_max, 2.0);
        assert_eq!(job.frequencies(), vec![1.0e9, 1.5e9, 2.0e9]);
        let set = job.dipole_set().unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice()[0].moment, [0.0, 1e-12, 0.0]);
        assert_eq!(set.as_slice()[0].position, [0.1, 0.0, 0.0]);
        assert_eq!(set.as_slice()[1].phase, 2.5);
    }

    #[test]
    fn test_time_series_defaults_follow_frequency() {
        let job = parse_config(
            r#"
            [mode]
            kind = "time_series"
            samples = 4

            [[dipole]]
            power_w = 1.0
            "#,
        )
        .unwrap();
        match job.run_mode().unwrap() {
            RunMode::TimeSeries {
                start,
                end,
                samples,
            } => {
                assert_relative_eq!(start, 1e-10, max_relative = 1e-12);
                assert_relative_eq!(end, 5e-9, max_relative = 1e-12);
                assert_eq!(samples, 4);
            }
            other => panic!("expected a time series, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_failures() {
        let no_dipoles = "dipole = []";
        assert!(parse_config(no_dipoles).is_err());

        let bad_backend = "backend = \"gpu\"\n[[dipole]]\npower_w = 1.0";
        assert!(parse_config(bad_backend).is_err());

        let bad_freq = "[source]\nfrequencies = { values = [-1.0] }\n[[dipole]]\npower_w = 1.0";
        assert!(parse_config(bad_freq).is_err());

        let empty_freq = "[source]\nfrequencies = { values = [] }\n[[dipole]]\npower_w = 1.0";
        assert!(parse_config(empty_freq).is_err());

        let zero_dir = "[[dipole]]\npower_w = 1.0\ndirection = [0.0, 0.0, 0.0]";
        assert!(parse_config(zero_dir).is_err());

        let bad_series = "[mode]\nkind = \"time_series\"\nstart = 2e-9\nend = 1e-9\n[[dipole]]\npower_w = 1.0";
        assert!(parse_config(bad_series).is_err());
    }

    #[test]
    fn test_example_round_trips_through_toml() {
        let text = toml::to_string_pretty(&JobConfig::example()).unwrap();
        let job = parse_config(&text).unwrap();
        assert_eq!(job.dipoles.len(), 1);
        assert_eq!(job.grid, SweepGrid::default());
        assert_eq!(job.run_mode().unwrap(), RunMode::Single { time: 1e-9 });
    }
}
