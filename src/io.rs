//! Array exchange with the outside world.
//!
//! Arrays are stored as raw native-endian `f32` samples with a JSON
//! sidecar describing each axis (fastest axis first), in the spirit of
//! regularly sampled seismic formats.

use crate::error::ModelError;
use crate::grid::Grid;
use crate::materials::VelocityModel;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const RAW_FORMAT: &str = "native_f32";

/// One regularly sampled axis: `n` samples starting at `o`, spaced `d`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisInfo {
    pub n: usize,
    pub o: f64,
    pub d: f64,
    pub label: String,
    pub unit: String,
}

impl AxisInfo {
    pub fn new(n: usize, o: f64, d: f64, label: &str, unit: &str) -> Self {
        Self {
            n,
            o,
            d,
            label: label.to_string(),
            unit: unit.to_string(),
        }
    }
}

/// JSON sidecar describing a raw array file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrayHeader {
    pub data: String,
    pub format: String,
    pub axes: Vec<AxisInfo>,
}

impl ArrayHeader {
    pub fn len(&self) -> usize {
        self.axes.iter().map(|a| a.n).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn read(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn write(&self, path: &Path) -> io::Result<()> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, text)
    }
}

/// Receiver record of one experiment, shape `(nx, nt)`.
#[derive(Clone, Debug)]
pub struct ShotGather {
    pub data: Array2<f64>,
    pub time: AxisInfo,
    pub receiver: AxisInfo,
}

impl ShotGather {
    pub fn new(nx: usize, nt: usize, dt: f64) -> Self {
        Self {
            data: Array2::zeros((nx, nt)),
            time: AxisInfo::new(nt, 0.0, dt, "Time", "s"),
            receiver: AxisInfo::new(nx, 0.0, 1.0, "Receiver", "x"),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    pub fn header(&self, data: &str) -> ArrayHeader {
        ArrayHeader {
            data: data.to_string(),
            format: RAW_FORMAT.to_string(),
            axes: vec![self.time.clone(), self.receiver.clone()],
        }
    }
}

/// Axes of the snapshot cube: depth, distance, then time.
pub fn snapshot_axes(grid: &Grid, count: usize, dt: f64, ft: usize, jt: usize) -> Vec<AxisInfo> {
    vec![
        AxisInfo::new(grid.nz, 0.0, grid.dz, "Depth", "m"),
        AxisInfo::new(grid.nx, 0.0, grid.dx, "Distance", "m"),
        AxisInfo::new(count, ft as f64 * dt, jt as f64 * dt, "Time", "s"),
    ]
}

/// Receives each physical-size wavefield snapshot as it is produced.
pub trait SnapshotSink {
    fn record(&mut self, it: usize, snapshot: &Array2<f64>) -> io::Result<()>;
}

/// Discards snapshots.
impl SnapshotSink for () {
    fn record(&mut self, _it: usize, _snapshot: &Array2<f64>) -> io::Result<()> {
        Ok(())
    }
}

/// Keeps every snapshot in memory together with its time step.
#[derive(Default)]
pub struct SnapshotRecorder {
    pub frames: Vec<(usize, Array2<f64>)>,
}

impl SnapshotRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotSink for SnapshotRecorder {
    fn record(&mut self, it: usize, snapshot: &Array2<f64>) -> io::Result<()> {
        self.frames.push((it, snapshot.clone()));
        Ok(())
    }
}

/// Streams snapshots to `<name>.bin` and writes `<name>.json` on [`finish`].
///
/// [`finish`]: SnapshotWriter::finish
pub struct SnapshotWriter {
    dir: PathBuf,
    name: String,
    writer: BufWriter<File>,
    grid: Grid,
    dt: f64,
    ft: usize,
    jt: usize,
    count: usize,
}

impl SnapshotWriter {
    pub fn create(
        dir: &Path,
        name: &str,
        grid: Grid,
        dt: f64,
        ft: usize,
        jt: usize,
    ) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let file = File::create(dir.join(format!("{name}.bin")))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            name: name.to_string(),
            writer: BufWriter::new(file),
            grid,
            dt,
            ft,
            jt,
            count: 0,
        })
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Flush the data file and write the header. Returns the header path.
    pub fn finish(mut self) -> io::Result<PathBuf> {
        self.writer.flush()?;
        let header = ArrayHeader {
            data: format!("{}.bin", self.name),
            format: RAW_FORMAT.to_string(),
            axes: snapshot_axes(&self.grid, self.count, self.dt, self.ft, self.jt),
        };
        let path = self.dir.join(format!("{}.json", self.name));
        header.write(&path)?;
        Ok(path)
    }
}

impl SnapshotSink for SnapshotWriter {
    fn record(&mut self, it: usize, snapshot: &Array2<f64>) -> io::Result<()> {
        write_samples(&mut self.writer, snapshot)?;
        self.count += 1;
        debug!(it, count = self.count, "snapshot written");
        Ok(())
    }
}

fn write_samples<W: Write>(writer: &mut W, data: &Array2<f64>) -> io::Result<()> {
    let samples: Vec<f32> = data.iter().map(|&v| v as f32).collect();
    writer.write_all(bytemuck::cast_slice(&samples))
}

/// Write `shot_gather.bin` and `shot_gather.json` into `dir`.
pub fn write_shot_gather(dir: &Path, gather: &ShotGather) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let mut writer = BufWriter::new(File::create(dir.join("shot_gather.bin"))?);
    write_samples(&mut writer, &gather.data)?;
    writer.flush()?;

    let path = dir.join("shot_gather.json");
    gather.header("shot_gather.bin").write(&path)?;
    Ok(path)
}

/// Read a raw native-endian `f32` file.
pub fn read_raw(path: &Path) -> io::Result<Vec<f32>> {
    let bytes = fs::read(path)?;
    if bytes.len() % 4 != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} is not a whole number of f32 samples", path.display()),
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Load a velocity model stored depth-fastest as raw `f32`.
pub fn read_velocity(path: &Path, grid: Grid) -> Result<VelocityModel, ModelError> {
    let samples = read_raw(path)?.into_iter().map(f64::from).collect();
    VelocityModel::from_samples(grid, samples)
}
