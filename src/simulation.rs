use crate::error::ModelError;
use crate::grid::PaddedGrid;
use crate::io::{ShotGather, SnapshotSink};
use crate::materials::{VelocityModel, COURANT_LIMIT};
use crate::sponge::Sponge;
use crate::stencil::{step_forward, StencilCoefficients};
use crate::wavefield::PressureField;
use crate::wavelet::Ricker;
use ndarray::{Array1, Array2};
use tracing::{debug, info, warn};

/// Run-time parameters of one modelling experiment.
#[derive(Clone, Debug)]
pub struct SimulationParams {
    pub nt: usize,   // Number of time steps
    pub dt: f64,     // Time step (seconds)
    pub fm: f64,     // Ricker peak frequency (Hz)
    pub nb: usize,   // Absorbing margin width (cells)
    pub ft: usize,   // First recorded step
    pub jt: usize,   // Snapshot stride
    pub border: bool, // Apply the sponge
    /// Recording depth in padded coordinates; defaults to `nxpad / 2`.
    pub receiver_row: Option<usize>,
    pub report_period: usize, // Progress log interval in steps
}

impl SimulationParams {
    pub fn new(nt: usize, dt: f64) -> Self {
        Self {
            nt,
            dt,
            fm: 20.0,
            nb: 30,
            ft: 0,
            jt: 1,
            border: false,
            receiver_row: None,
            report_period: 100,
        }
    }

    pub fn total_time(&self) -> f64 {
        self.nt as f64 * self.dt
    }

    /// Number of snapshots emitted over the run.
    pub fn snapshot_count(&self) -> usize {
        if self.ft >= self.nt {
            0
        } else {
            (self.nt - self.ft).div_ceil(self.jt)
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.nt == 0 {
            return Err(ModelError::InvalidParameter("nt must be positive".into()));
        }
        if !(self.dt > 0.0) {
            return Err(ModelError::InvalidParameter(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        if !(self.fm > 0.0) {
            return Err(ModelError::InvalidParameter(format!(
                "fm must be positive, got {}",
                self.fm
            )));
        }
        if self.jt == 0 {
            return Err(ModelError::InvalidParameter("jt must be positive".into()));
        }
        if self.ft >= self.nt {
            return Err(ModelError::InvalidParameter(format!(
                "ft={} leaves nothing to record with nt={}",
                self.ft, self.nt
            )));
        }
        Ok(())
    }
}

/// Placement of the exploding-reflector point sources.
///
/// Sources sit on padded row `row` at `center + offset` for each offset.
/// `None` places the centre at `nxpad / 2` and the row at `nzpad / 2`.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceLayout {
    pub center: Option<usize>,
    pub row: Option<usize>,
    pub offsets: Vec<isize>,
    pub amplitude: f64,
}

impl SourceLayout {
    /// `count` sources `spacing` cells apart, centred on the middle column.
    pub fn regular(spacing: usize, count: usize) -> Self {
        let half = (count.saturating_sub(1) / 2) as isize;
        let spacing = spacing as isize;
        Self {
            center: None,
            row: None,
            offsets: (0..count as isize).map(|k| (k - half) * spacing).collect(),
            amplitude: 1.0,
        }
    }

    pub fn single() -> Self {
        Self::regular(0, 1)
    }
}

impl Default for SourceLayout {
    /// 21 sources at offsets -100..=100 every 10 cells.
    fn default() -> Self {
        Self::regular(10, 21)
    }
}

/// Resolved source positions on the padded grid.
#[derive(Clone, Debug)]
pub struct SourceArray {
    pub positions: Vec<(usize, usize)>,
    pub amplitude: f64,
}

impl SourceArray {
    pub fn new(padded: &PaddedGrid, layout: &SourceLayout) -> Result<Self, ModelError> {
        let center = layout.center.unwrap_or(padded.nxpad / 2);
        let row = layout.row.unwrap_or(padded.nzpad / 2);

        let mut positions = Vec::with_capacity(layout.offsets.len());
        for (index, &offset) in layout.offsets.iter().enumerate() {
            let ix = center as isize + offset;
            if ix < 0 || !padded.in_bounds(ix as usize, row) {
                return Err(ModelError::SourceOutOfBounds {
                    index,
                    ix,
                    iz: row,
                    nxpad: padded.nxpad,
                    nzpad: padded.nzpad,
                });
            }
            positions.push((ix as usize, row));
        }

        Ok(Self {
            positions,
            amplitude: layout.amplitude,
        })
    }

    /// Add `amplitude * a` at every source position.
    pub fn inject(&self, field: &mut Array2<f64>, a: f64) {
        let value = self.amplitude * a;
        for &(ix, iz) in &self.positions {
            field[[ix, iz]] += value;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationState {
    Loading,
    Stepping,
    Swapping,
    Finalizing,
}

pub struct Simulation {
    pub padded: PaddedGrid,
    pub params: SimulationParams,
    pub field: PressureField,
    coeffs: StencilCoefficients,
    slowness: Array2<f64>,
    wavelet: Array1<f64>,
    sponge: Option<Sponge>,
    sources: SourceArray,
    receiver_row: usize,
    gather: ShotGather,
    snapshot: Array2<f64>,
    state: SimulationState,
    current_timestep: usize,
}

impl Simulation {
    pub fn new(
        model: &VelocityModel,
        params: SimulationParams,
        layout: &SourceLayout,
    ) -> Result<Self, ModelError> {
        params.validate()?;

        let grid = model.grid;
        if grid.nx == 0 || grid.nz == 0 {
            return Err(ModelError::InvalidParameter(format!(
                "grid dimensions must be positive (nx={}, nz={})",
                grid.nx, grid.nz
            )));
        }
        if !(grid.dx > 0.0 && grid.dz > 0.0) {
            return Err(ModelError::InvalidParameter(format!(
                "grid spacing must be positive (dx={}, dz={})",
                grid.dx, grid.dz
            )));
        }

        let padded = PaddedGrid::new(grid, params.nb);
        let receiver_row = Self::resolve_receiver_row(&padded, params.receiver_row)?;
        let sources = SourceArray::new(&padded, layout)?;

        let courant = model.courant_number(params.dt);
        if courant > COURANT_LIMIT {
            warn!(
                courant,
                limit = COURANT_LIMIT,
                "time step exceeds the stability bound, the run will likely blow up"
            );
        }

        let coeffs = StencilCoefficients::new(grid.dz, grid.dx);
        let slowness = model.squared_slowness(&padded, params.dt);
        let wavelet = Ricker::new(params.fm).sample(params.nt, params.dt);
        let sponge = params.border.then(|| Sponge::new(&padded));

        Ok(Self {
            field: PressureField::new(&padded),
            gather: ShotGather::new(grid.nx, params.nt, params.dt),
            snapshot: Array2::zeros(grid.shape()),
            padded,
            params,
            coeffs,
            slowness,
            wavelet,
            sponge,
            sources,
            receiver_row,
            state: SimulationState::Loading,
            current_timestep: 0,
        })
    }

    fn resolve_receiver_row(padded: &PaddedGrid, row: Option<usize>) -> Result<usize, ModelError> {
        let min = padded.nb;
        let max = padded.nb + padded.grid.nz;
        match row {
            Some(row) if (min..max).contains(&row) => Ok(row),
            Some(row) => Err(ModelError::ReceiverOutOfBounds { row, min, max }),
            None => {
                let row = padded.nxpad / 2;
                if (min..max).contains(&row) {
                    Ok(row)
                } else {
                    warn!(
                        row,
                        used = max - 1,
                        "default receiver row lies below the model, recording the deepest row"
                    );
                    Ok(max - 1)
                }
            }
        }
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn current_timestep(&self) -> usize {
        self.current_timestep
    }

    pub fn current_time(&self) -> f64 {
        self.current_timestep as f64 * self.params.dt
    }

    pub fn is_finished(&self) -> bool {
        self.current_timestep >= self.params.nt
    }

    /// Padded row recorded by the receivers.
    pub fn receiver_row(&self) -> usize {
        self.receiver_row
    }

    pub fn sources(&self) -> &SourceArray {
        &self.sources
    }

    pub fn wavelet(&self) -> &Array1<f64> {
        &self.wavelet
    }

    pub fn coefficients(&self) -> &StencilCoefficients {
        &self.coeffs
    }

    pub fn shot_gather(&self) -> &ShotGather {
        &self.gather
    }

    pub fn into_shot_gather(self) -> ShotGather {
        self.gather
    }

    /// Record the older buffer: one trace sample per receiver, plus a
    /// windowed snapshot on every `jt`-th recorded step.
    fn record<S: SnapshotSink>(&mut self, sink: &mut S) -> std::io::Result<()> {
        let it = self.current_timestep;
        if it < self.params.ft {
            return Ok(());
        }

        let older = self.field.previous();
        let nb = self.padded.nb;
        for ir in 0..self.padded.grid.nx {
            self.gather.data[[ir, it]] = older[[nb + ir, self.receiver_row]];
        }

        if (it - self.params.ft) % self.params.jt == 0 {
            self.padded.window(&mut self.snapshot, older);
            sink.record(it, &self.snapshot)?;
            debug!(it, "snapshot emitted");
        }
        Ok(())
    }

    /// Advance one time step.
    pub fn step<S: SnapshotSink>(&mut self, sink: &mut S) -> std::io::Result<()> {
        if self.is_finished() {
            return Ok(());
        }
        self.state = SimulationState::Stepping;

        // 1. Output from the field about to be overwritten
        self.record(sink)?;

        // 2. Inject the exploding reflector
        let a = self.wavelet[self.current_timestep];
        self.sources.inject(self.field.current_mut(), a);

        // 3. Leapfrog update
        let (next, current) = self.field.split_mut();
        step_forward(&self.coeffs, &self.slowness, next, current);

        // 4. Absorbing margins
        if let Some(sponge) = &self.sponge {
            let (p0, p1) = self.field.both_mut();
            sponge.apply_pair(p0, p1);
        }

        // 5. Exchange roles
        self.state = SimulationState::Swapping;
        self.field.swap();
        self.current_timestep += 1;
        Ok(())
    }

    /// Run all remaining steps and return the shot gather.
    pub fn run<S: SnapshotSink>(&mut self, sink: &mut S) -> Result<&ShotGather, ModelError> {
        info!("Starting simulation...");
        info!(
            "Grid: {}x{} (padded {}x{}, nb={})",
            self.padded.grid.nx, self.padded.grid.nz, self.padded.nxpad, self.padded.nzpad, self.padded.nb
        );
        info!("Time step: {:.6} s", self.params.dt);
        info!("Total time: {:.3} s", self.params.total_time());
        info!(
            "Sources: {}, receiver row: {}, absorbing border: {}",
            self.sources.positions.len(),
            self.receiver_row,
            self.sponge.is_some()
        );

        let report = self.params.report_period.max(1);
        while !self.is_finished() {
            self.step(sink)?;

            if self.current_timestep % report == 0 {
                info!(
                    "Step {}/{} (t={:.4}s)",
                    self.current_timestep,
                    self.params.nt,
                    self.current_time()
                );
            }
        }

        self.state = SimulationState::Finalizing;
        info!("Simulation complete!");
        Ok(&self.gather)
    }
}
