use ndarray::{s, Array2, Axis};
use rayon::prelude::*;

/// Physical grid of the velocity model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    pub nx: usize, // Number of points in x direction
    pub nz: usize, // Number of points in z direction
    pub dx: f64,   // Grid spacing in x (meters)
    pub dz: f64,   // Grid spacing in z (meters)
}

impl Grid {
    pub fn new(nx: usize, nz: usize, dx: f64, dz: f64) -> Self {
        Grid { nx, nz, dx, dz }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.nz)
    }

    /// Total width of domain in x direction
    pub fn width(&self) -> f64 {
        self.nx.saturating_sub(1) as f64 * self.dx
    }

    pub fn height(&self) -> f64 {
        self.nz.saturating_sub(1) as f64 * self.dz
    }
}

/// Physical grid surrounded by an `nb`-wide absorbing margin on all four sides.
///
/// Padded arrays have shape `(nxpad, nzpad)`; the physical cell `(ix, iz)`
/// lives at `(ix + nb, iz + nb)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaddedGrid {
    pub grid: Grid,
    pub nb: usize,
    pub nxpad: usize,
    pub nzpad: usize,
}

impl PaddedGrid {
    pub fn new(grid: Grid, nb: usize) -> Self {
        Self {
            grid,
            nb,
            nxpad: grid.nx + 2 * nb,
            nzpad: grid.nz + 2 * nb,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nxpad, self.nzpad)
    }

    pub fn zeros(&self) -> Array2<f64> {
        Array2::zeros(self.shape())
    }

    pub fn in_bounds(&self, ix: usize, iz: usize) -> bool {
        ix < self.nxpad && iz < self.nzpad
    }

    /// True when the padded cell lies inside one of the absorbing margins.
    pub fn is_margin(&self, ix: usize, iz: usize) -> bool {
        let nb = self.nb;
        ix < nb || iz < nb || ix >= self.grid.nx + nb || iz >= self.grid.nz + nb
    }

    /// Copy `src` into the interior of `dst` and fill the margins by
    /// replicating the nearest interior value outward.
    ///
    /// Depth margins are filled first for every padded column, then the
    /// x margins copy whole (already depth-filled) columns, so corners
    /// take the value of the nearest interior corner cell.
    pub fn expand(&self, dst: &mut Array2<f64>, src: &Array2<f64>) {
        debug_assert_eq!(src.dim(), self.grid.shape());
        debug_assert_eq!(dst.dim(), self.shape());

        let nb = self.nb;
        let (nx, nz) = self.grid.shape();
        let nzpad = self.nzpad;
        let nxpad = self.nxpad;

        dst.slice_mut(s![nb..nb + nx, nb..nb + nz]).assign(src);

        if nb == 0 {
            return;
        }

        dst.axis_iter_mut(Axis(0))
            .into_par_iter()
            .for_each(|mut column| {
                let top = column[nb];
                let bottom = column[nzpad - nb - 1];
                for iz in 0..nb {
                    column[iz] = top;
                    column[nzpad - iz - 1] = bottom;
                }
            });

        let left = dst.index_axis(Axis(0), nb).to_owned();
        let right = dst.index_axis(Axis(0), nxpad - nb - 1).to_owned();
        for ix in 0..nb {
            dst.index_axis_mut(Axis(0), ix).assign(&left);
            dst.index_axis_mut(Axis(0), nxpad - ix - 1).assign(&right);
        }
    }

    /// Allocate a padded copy of `src`.
    pub fn pad(&self, src: &Array2<f64>) -> Array2<f64> {
        let mut dst = self.zeros();
        self.expand(&mut dst, src);
        dst
    }

    /// Copy the physical interior of the padded `src` into `dst`.
    pub fn window(&self, dst: &mut Array2<f64>, src: &Array2<f64>) {
        debug_assert_eq!(src.dim(), self.shape());
        debug_assert_eq!(dst.dim(), self.grid.shape());

        let nb = self.nb;
        let (nx, nz) = self.grid.shape();
        dst.assign(&src.slice(s![nb..nb + nx, nb..nb + nz]));
    }

    /// Allocate a physical-size copy of the interior of `src`.
    pub fn crop(&self, src: &Array2<f64>) -> Array2<f64> {
        let mut dst = Array2::zeros(self.grid.shape());
        self.window(&mut dst, src);
        dst
    }
}
