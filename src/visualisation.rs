use crate::io::ShotGather;
use ndarray::Array2;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct WavefieldVisualiser {
    output_dir: PathBuf,
    width: u32,
    height: u32,
    // Store as a boxed trait object
    gradient: Box<dyn colorgrad::Gradient>,
}

impl WavefieldVisualiser {
    pub fn new(output_dir: &Path, width: u32, height: u32) -> std::io::Result<Self> {
        std::fs::create_dir_all(output_dir)?;

        // Diverging map, symmetric about zero pressure
        let gradient = Box::new(colorgrad::preset::rd_yl_bu());

        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            width,
            height,
            gradient,
        })
    }

    /// Render a `(nx, nz)` snapshot.
    pub fn plot_snapshot(
        &self,
        data: &Array2<f64>,
        timestep: usize,
        time: f64,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let filename = self.output_dir.join(format!("snapshot_{:06}.png", timestep));
        let title = format!("Pressure at t={:.4}s (step {})", time, timestep);
        self.plot_heatmap(data, &filename, &title, ("X (grid points)", "Z (grid points)"))?;
        Ok(filename)
    }

    /// Render the `(nx, nt)` shot gather.
    pub fn plot_shot_gather(
        &self,
        gather: &ShotGather,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let filename = self.output_dir.join("shot_gather.png");
        let labels = (
            format!("{} ({})", gather.receiver.label, gather.receiver.unit),
            format!("{} (samples of {} {})", gather.time.label, gather.time.d, gather.time.unit),
        );
        self.plot_heatmap(
            &gather.data,
            &filename,
            "Exploding reflector shot gather",
            (labels.0.as_str(), labels.1.as_str()),
        )?;
        Ok(filename)
    }

    fn plot_heatmap(
        &self,
        data: &Array2<f64>,
        filename: &Path,
        title: &str,
        (x_desc, y_desc): (&str, &str),
    ) -> Result<(), Box<dyn std::error::Error>> {
        let root = BitMapBackend::new(filename, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let (n_cols, n_rows) = data.dim();
        let max_abs = data.iter().map(|&v| v.abs()).fold(0.0_f64, f64::max);
        let min_val = -max_abs;
        let max_val = max_abs;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 30))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(40)
            .build_cartesian_2d(0..n_cols, 0..n_rows)?;

        chart
            .configure_mesh()
            .x_desc(x_desc)
            .y_desc(y_desc)
            .draw()?;

        chart.draw_series(data.indexed_iter().map(|((i, k), &value)| {
            let color = self.value_to_color(value, min_val, max_val);
            Rectangle::new([(i, k), (i + 1, k + 1)], color.filled())
        }))?;

        root.present()?;
        debug!("Saved frame: {}", filename.display());
        Ok(())
    }

    fn value_to_color(&self, value: f64, min_val: f64, max_val: f64) -> RGBColor {
        let normalized = if max_val > min_val {
            (value - min_val) / (max_val - min_val)
        } else {
            0.5
        };
        let normalized = normalized.clamp(0.0, 1.0);
        let color_rgba = self.gradient.at(normalized as f32).to_rgba8();
        RGBColor(color_rgba[0], color_rgba[1], color_rgba[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(c: RGBColor) -> (u8, u8, u8) {
        (c.0, c.1, c.2)
    }

    #[test]
    fn flat_field_maps_to_midpoint() {
        let dir = tempfile::tempdir().unwrap();
        let vis = WavefieldVisualiser::new(dir.path(), 10, 10).unwrap();
        let mid = rgb(vis.value_to_color(0.0, 0.0, 0.0));
        assert_eq!(mid, rgb(vis.value_to_color(1.0, -2.0, 4.0)));
    }

    #[test]
    fn extremes_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let vis = WavefieldVisualiser::new(dir.path(), 10, 10).unwrap();
        let low = rgb(vis.value_to_color(-1.0, -1.0, 1.0));
        let high = rgb(vis.value_to_color(1.0, -1.0, 1.0));
        assert_eq!(rgb(vis.value_to_color(-5.0, -1.0, 1.0)), low);
        assert_eq!(rgb(vis.value_to_color(5.0, -1.0, 1.0)), high);
        assert_ne!(low, high);
    }
}
