use crate::grid::PaddedGrid;
use ndarray::Array2;

/// Pair of padded pressure buffers used as a ping-pong leapfrog state.
///
/// `current` holds the field at the present step; the other buffer holds
/// the field one step back and is overwritten by the next propagation.
pub struct PressureField {
    buffers: [Array2<f64>; 2],
    current: usize,
}

impl PressureField {
    pub fn new(padded: &PaddedGrid) -> Self {
        PressureField {
            buffers: [padded.zeros(), padded.zeros()],
            current: 0,
        }
    }

    pub fn zero(&mut self) {
        self.buffers[0].fill(0.0);
        self.buffers[1].fill(0.0);
        self.current = 0;
    }

    pub fn current(&self) -> &Array2<f64> {
        &self.buffers[self.current]
    }

    pub fn current_mut(&mut self) -> &mut Array2<f64> {
        &mut self.buffers[self.current]
    }

    /// The older buffer, about to be overwritten by the next step.
    pub fn previous(&self) -> &Array2<f64> {
        &self.buffers[1 - self.current]
    }

    /// Borrow `(previous, current)` so the step can write the former
    /// while reading the latter.
    pub fn split_mut(&mut self) -> (&mut Array2<f64>, &Array2<f64>) {
        let [a, b] = &mut self.buffers;
        if self.current == 0 {
            (b, &*a)
        } else {
            (a, &*b)
        }
    }

    pub fn both_mut(&mut self) -> (&mut Array2<f64>, &mut Array2<f64>) {
        let [a, b] = &mut self.buffers;
        (a, b)
    }

    /// Exchange roles: the freshly written buffer becomes current.
    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }

    /// Sum of squared pressure over the whole padded current field.
    pub fn energy(&self) -> f64 {
        self.current().iter().map(|&p| p * p).sum()
    }

    /// Sum of squared pressure of the current field inside the margins only.
    pub fn margin_energy(&self, padded: &PaddedGrid) -> f64 {
        self.current()
            .indexed_iter()
            .filter(|((ix, iz), _)| padded.is_margin(*ix, *iz))
            .map(|(_, &p)| p * p)
            .sum()
    }

    pub fn is_finite(&self) -> bool {
        self.buffers.iter().all(|b| b.iter().all(|v| v.is_finite()))
    }
}
