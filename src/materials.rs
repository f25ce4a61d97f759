use crate::error::ModelError;
use crate::grid::{Grid, PaddedGrid};
use ndarray::Array2;

/// Courant bound of the 4th-order leapfrog scheme in 2-D:
/// `dt * vmax * sqrt(1/dx^2 + 1/dz^2) <= sqrt(3) / 2`.
pub const COURANT_LIMIT: f64 = 0.866_025_403_784_438_6;

/// Acoustic velocity model on the physical grid, shape `(nx, nz)`.
pub struct VelocityModel {
    pub grid: Grid,
    pub velocity: Array2<f64>,
}

impl VelocityModel {
    pub fn new(grid: Grid, velocity: Array2<f64>) -> Result<Self, ModelError> {
        if velocity.dim() != grid.shape() {
            return Err(ModelError::ShapeMismatch {
                expected: grid.shape(),
                actual: velocity.dim(),
            });
        }
        Ok(Self { grid, velocity })
    }

    pub fn homogeneous(grid: Grid, velocity: f64) -> Self {
        Self {
            grid,
            velocity: Array2::from_elem(grid.shape(), velocity),
        }
    }

    /// Build from samples stored depth-fastest (one trace per x position).
    pub fn from_samples(grid: Grid, samples: Vec<f64>) -> Result<Self, ModelError> {
        let expected = grid.nx * grid.nz;
        if samples.len() != expected {
            return Err(ModelError::SampleCount {
                expected,
                actual: samples.len(),
            });
        }
        let velocity = Array2::from_shape_vec(grid.shape(), samples)
            .map_err(|e| ModelError::InvalidParameter(e.to_string()))?;
        Self::new(grid, velocity)
    }

    pub fn max_velocity(&self) -> f64 {
        self.velocity.iter().cloned().fold(0.0_f64, f64::max)
    }

    /// Courant number `dt * vmax * sqrt(1/dx^2 + 1/dz^2)`.
    pub fn courant_number(&self, dt: f64) -> f64 {
        let g = &self.grid;
        dt * self.max_velocity() * (1.0 / (g.dx * g.dx) + 1.0 / (g.dz * g.dz)).sqrt()
    }

    pub fn is_stable(&self, dt: f64) -> bool {
        self.courant_number(dt) <= COURANT_LIMIT
    }

    /// Padded `(v * dt)^2`, the factor multiplying the Laplacian in the update.
    pub fn squared_slowness(&self, padded: &PaddedGrid, dt: f64) -> Array2<f64> {
        let mut vv = padded.pad(&self.velocity);
        vv.mapv_inplace(|v| {
            let vdt = v * dt;
            vdt * vdt
        });
        vv
    }
}
