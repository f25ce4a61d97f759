use crate::grid::{Grid, PaddedGrid};
use crate::io::read_velocity;
use crate::materials::VelocityModel;
use crate::simulation::{SimulationParams, SourceLayout};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Grid configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub nx: usize,
    pub nz: usize,
    pub dx: f64,
    pub dz: f64,
}

impl GridConfig {
    fn validate(&self) -> Result<()> {
        if self.nx == 0 || self.nz == 0 {
            return Err(anyhow!("Grid dimensions must be positive (nx={}, nz={})", self.nx, self.nz));
        }
        if !(self.dx > 0.0 && self.dz > 0.0) {
            return Err(anyhow!(
                "Grid spacing must be positive (dx={}, dz={})",
                self.dx,
                self.dz
            ));
        }
        Ok(())
    }

    pub fn grid(&self) -> Grid {
        Grid::new(self.nx, self.nz, self.dx, self.dz)
    }
}

/// Velocity model: a constant velocity or a raw f32 file, depth fastest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f64>, // m/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl ModelConfig {
    fn validate(&self) -> Result<()> {
        match (self.velocity, &self.file) {
            (Some(_), Some(_)) => Err(anyhow!("Specify either model.velocity or model.file, not both")),
            (None, None) => Err(anyhow!("A velocity model is required (model.velocity or model.file)")),
            (Some(v), None) if !(v > 0.0) => {
                Err(anyhow!("Velocity must be positive, got {}", v))
            }
            _ => Ok(()),
        }
    }

    /// Load the model; relative file paths resolve against `base`.
    pub fn load(&self, grid: Grid, base: &Path) -> Result<VelocityModel> {
        if let Some(v) = self.velocity {
            return Ok(VelocityModel::homogeneous(grid, v));
        }
        let file = self
            .file
            .as_ref()
            .ok_or_else(|| anyhow!("No velocity model configured"))?;
        let path = if file.is_absolute() {
            file.clone()
        } else {
            base.join(file)
        };
        read_velocity(&path, grid)
            .map_err(|e| anyhow!("Failed to load velocity model '{}': {}", path.display(), e))
    }
}

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub nt: usize,
    pub dt: f64,
    #[serde(default = "default_fm")]
    pub fm: f64,
    #[serde(default = "default_nb")]
    pub nb: usize,
    #[serde(default)]
    pub ft: usize,
    #[serde(default = "default_jt")]
    pub jt: usize,
    #[serde(default)]
    pub border: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_row: Option<usize>, // padded coordinates
    #[serde(default = "default_report_period")]
    pub report_period: usize,
}

fn default_fm() -> f64 {
    20.0
}

fn default_nb() -> usize {
    30
}

fn default_jt() -> usize {
    1
}

fn default_report_period() -> usize {
    100
}

impl SimulationConfig {
    fn validate(&self, grid: &GridConfig) -> Result<()> {
        if self.nt == 0 {
            return Err(anyhow!("nt must be positive"));
        }
        if !(self.dt > 0.0) {
            return Err(anyhow!("dt must be positive, got {}", self.dt));
        }
        if !(self.fm > 0.0) {
            return Err(anyhow!("fm must be positive, got {}", self.fm));
        }
        if self.jt == 0 {
            return Err(anyhow!("jt must be positive"));
        }
        if self.ft >= self.nt {
            return Err(anyhow!("ft must be smaller than nt (ft={}, nt={})", self.ft, self.nt));
        }
        if let Some(row) = self.receiver_row {
            let (min, max) = (self.nb, self.nb + grid.nz);
            if !(min..max).contains(&row) {
                return Err(anyhow!(
                    "receiver_row={} must lie in the physical depth range [{}, {})",
                    row,
                    min,
                    max
                ));
            }
        }
        Ok(())
    }

    pub fn params(&self) -> SimulationParams {
        SimulationParams {
            nt: self.nt,
            dt: self.dt,
            fm: self.fm,
            nb: self.nb,
            ft: self.ft,
            jt: self.jt,
            border: self.border,
            receiver_row: self.receiver_row,
            report_period: self.report_period,
        }
    }
}

/// Exploding-reflector source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_spacing")]
    pub spacing: usize,
    #[serde(default = "default_count")]
    pub count: usize,
    /// Explicit column offsets; overrides `spacing` and `count`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offsets: Option<Vec<isize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,
}

fn default_spacing() -> usize {
    10
}

fn default_count() -> usize {
    21
}

fn default_amplitude() -> f64 {
    1.0
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            spacing: default_spacing(),
            count: default_count(),
            offsets: None,
            center: None,
            row: None,
            amplitude: default_amplitude(),
        }
    }
}

impl SourceConfig {
    fn validate(&self, padded: &PaddedGrid) -> Result<()> {
        if !self.amplitude.is_finite() {
            return Err(anyhow!("Source amplitude must be finite, got {}", self.amplitude));
        }
        let layout = self.layout();
        if layout.offsets.is_empty() {
            return Err(anyhow!("At least one source must be defined"));
        }
        let center = layout.center.unwrap_or(padded.nxpad / 2) as isize;
        let row = layout.row.unwrap_or(padded.nzpad / 2);
        for (i, &offset) in layout.offsets.iter().enumerate() {
            let ix = center + offset;
            if ix < 0 || !padded.in_bounds(ix as usize, row) {
                return Err(anyhow!(
                    "Source {} at padded position ({}, {}) is outside grid bounds ({}, {})",
                    i,
                    ix,
                    row,
                    padded.nxpad,
                    padded.nzpad
                ));
            }
        }
        Ok(())
    }

    pub fn layout(&self) -> SourceLayout {
        let mut layout = SourceLayout::regular(self.spacing, self.count);
        if let Some(offsets) = &self.offsets {
            layout.offsets = offsets.clone();
        }
        layout.center = self.center;
        layout.row = self.row;
        layout.amplitude = self.amplitude;
        layout
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_snapshots")]
    pub snapshots: bool,
    /// Render every n-th snapshot as PNG
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_every: Option<usize>,
    #[serde(default = "default_image_width")]
    pub image_width: u32,
    #[serde(default = "default_image_height")]
    pub image_height: u32,
}

fn default_directory() -> PathBuf {
    PathBuf::from("output")
}

fn default_snapshots() -> bool {
    true
}

fn default_image_width() -> u32 {
    1200
}

fn default_image_height() -> u32 {
    1000
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            snapshots: default_snapshots(),
            plot_every: None,
            image_width: default_image_width(),
            image_height: default_image_height(),
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if self.plot_every == Some(0) {
            return Err(anyhow!("plot_every must be positive"));
        }
        if self.image_width == 0 || self.image_height == 0 {
            return Err(anyhow!(
                "Image dimensions must be positive (width={}, height={})",
                self.image_width,
                self.image_height
            ));
        }
        Ok(())
    }
}

/// Complete modelling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub grid: GridConfig,
    pub model: ModelConfig,
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub sources: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| anyhow!("Failed to parse TOML config: {}", e))?;

        // Validate before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.model.validate()?;
        self.simulation.validate(&self.grid)?;
        self.output.validate()?;

        let padded = PaddedGrid::new(self.grid.grid(), self.simulation.nb);
        self.sources.validate(&padded)?;

        Ok(())
    }

    /// Log configuration summary
    pub fn print_summary(&self) {
        let grid = self.grid.grid();
        let sim = &self.simulation;
        info!("=== Modelling Configuration ===");
        info!(
            "Grid: {}x{} ({} x {} m), nb={}",
            grid.nx,
            grid.nz,
            grid.width(),
            grid.height(),
            sim.nb
        );
        match (&self.model.velocity, &self.model.file) {
            (Some(v), _) => info!("Model: constant velocity {} m/s", v),
            (None, Some(file)) => info!("Model: {}", file.display()),
            (None, None) => {}
        }
        info!(
            "Simulation: dt={} s, nt={}, total_time={} s, fm={} Hz",
            sim.dt,
            sim.nt,
            sim.nt as f64 * sim.dt,
            sim.fm
        );
        info!(
            "Recording: ft={}, jt={}, border={}, receiver_row={}",
            sim.ft,
            sim.jt,
            sim.border,
            sim.receiver_row
                .map(|r| r.to_string())
                .unwrap_or_else(|| "default".to_string())
        );
        let layout = self.sources.layout();
        info!(
            "Sources: {} point source(s), amplitude {}",
            layout.offsets.len(),
            layout.amplitude
        );
        info!("Output: {}", self.output.directory.display());
    }
}
