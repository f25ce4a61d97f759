//! 2-D acoustic finite-difference modelling for exploding-reflector shot gathers.
//!
//! A velocity model is padded with absorbing margins, a Ricker pulse is
//! injected along a row of point sources, and a 4th-order leapfrog scheme
//! advances the pressure field while receivers along one depth row record
//! the shot gather.

pub mod config;
pub mod error;
pub mod grid;
pub mod io;
pub mod materials;
pub mod simulation;
pub mod sponge;
pub mod stencil;
pub mod visualisation;
pub mod wavefield;
pub mod wavelet;

pub use error::ModelError;
pub use grid::{Grid, PaddedGrid};
pub use io::{ShotGather, SnapshotRecorder, SnapshotSink, SnapshotWriter};
pub use materials::VelocityModel;
pub use simulation::{Simulation, SimulationParams, SimulationState, SourceLayout};

pub mod prelude {
    //! Common imports for running a modelling experiment
    pub use crate::grid::{Grid, PaddedGrid};
    pub use crate::io::{ShotGather, SnapshotRecorder, SnapshotSink, SnapshotWriter};
    pub use crate::materials::VelocityModel;
    pub use crate::simulation::{Simulation, SimulationParams, SimulationState, SourceLayout};
}
