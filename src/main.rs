use acoustic_wave_modeller::config::Config;
use acoustic_wave_modeller::io::{write_shot_gather, SnapshotSink, SnapshotWriter};
use acoustic_wave_modeller::visualisation::WavefieldVisualiser;
use acoustic_wave_modeller::Simulation;
use anyhow::{Context, Result};
use clap::Parser;
use ndarray::Array2;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Exploding-reflector acoustic modelling
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML configuration file
    config: PathBuf,

    /// Override the output directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Enable the absorbing sponge regardless of the configuration
    #[arg(long)]
    border: bool,

    /// Skip writing wavefield snapshots
    #[arg(long)]
    no_snapshots: bool,
}

/// Fans each snapshot out to the binary writer and the PNG renderer.
struct OutputSink {
    writer: Option<SnapshotWriter>,
    visualiser: Option<(WavefieldVisualiser, usize)>,
    dt: f64,
    emitted: usize,
}

impl SnapshotSink for OutputSink {
    fn record(&mut self, it: usize, snapshot: &Array2<f64>) -> std::io::Result<()> {
        if let Some(writer) = &mut self.writer {
            writer.record(it, snapshot)?;
        }
        if let Some((visualiser, every)) = &self.visualiser {
            if self.emitted % *every == 0 {
                if let Err(e) = visualiser.plot_snapshot(snapshot, it, it as f64 * self.dt) {
                    warn!("Failed to visualise step {}: {}", it, e);
                }
            }
        }
        self.emitted += 1;
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut config = Config::from_file(&args.config)?;
    if let Some(dir) = args.output_dir {
        config.output.directory = dir;
    }
    if args.border {
        config.simulation.border = true;
    }
    if args.no_snapshots {
        config.output.snapshots = false;
    }
    config.print_summary();

    let base = args.config.parent().unwrap_or(Path::new("."));
    let grid = config.grid.grid();
    let model = config.model.load(grid, base)?;
    let params = config.simulation.params();
    let out_dir = config.output.directory.clone();

    let writer = if config.output.snapshots {
        Some(
            SnapshotWriter::create(&out_dir, "snapshots", grid, params.dt, params.ft, params.jt)
                .with_context(|| format!("Failed to create snapshot file in '{}'", out_dir.display()))?,
        )
    } else {
        None
    };
    let visualiser = match config.output.plot_every {
        Some(every) => Some((
            WavefieldVisualiser::new(
                &out_dir.join("frames"),
                config.output.image_width,
                config.output.image_height,
            )?,
            every,
        )),
        None => None,
    };

    let mut sink = OutputSink {
        writer,
        visualiser,
        dt: params.dt,
        emitted: 0,
    };

    let mut sim = Simulation::new(&model, params, &config.sources.layout())?;
    sim.run(&mut sink)?;

    if let Some(writer) = sink.writer.take() {
        let count = writer.count();
        let header = writer.finish()?;
        info!("Wrote {} snapshots ({})", count, header.display());
    }

    let gather = sim.into_shot_gather();
    let header = write_shot_gather(&out_dir, &gather)
        .with_context(|| format!("Failed to write shot gather to '{}'", out_dir.display()))?;
    info!("Wrote shot gather {}x{} ({})", gather.receiver.n, gather.time.n, header.display());

    if config.output.plot_every.is_some() {
        let visualiser = WavefieldVisualiser::new(
            &out_dir,
            config.output.image_width,
            config.output.image_height,
        )?;
        match visualiser.plot_shot_gather(&gather) {
            Ok(path) => info!("Saved {}", path.display()),
            Err(e) => warn!("Failed to plot shot gather: {}", e),
        }
    }

    Ok(())
}
