//! End-to-end behaviour of the modelling loop

use acoustic_wave_modeller::prelude::*;
use ndarray::Array2;

fn single_source() -> SourceLayout {
    SourceLayout::single()
}

/// Run `sim` to completion, returning total padded energy after each step.
fn run_with_energy(sim: &mut Simulation) -> Vec<f64> {
    let mut energy = Vec::with_capacity(sim.params.nt);
    while !sim.is_finished() {
        sim.step(&mut ()).unwrap();
        energy.push(sim.field.energy());
    }
    energy
}

#[test]
fn test_silent_model_stays_silent() {
    let grid = Grid::new(40, 30, 10.0, 10.0);
    let model = VelocityModel::homogeneous(grid, 0.0);
    let layout = SourceLayout {
        amplitude: 0.0,
        ..SourceLayout::regular(5, 5)
    };

    for border in [false, true] {
        let params = SimulationParams {
            nb: 10,
            border,
            ..SimulationParams::new(200, 0.001)
        };
        let mut sim = Simulation::new(&model, params, &layout).unwrap();
        let mut recorder = SnapshotRecorder::new();
        while !sim.is_finished() {
            sim.step(&mut recorder).unwrap();
            assert!(sim.field.current().iter().all(|&p| p == 0.0));
            assert!(sim.field.previous().iter().all(|&p| p == 0.0));
        }
        assert!(recorder.frames.iter().all(|(_, f)| f.iter().all(|&p| p == 0.0)));
        assert!(sim.shot_gather().data.iter().all(|&p| p == 0.0));
    }
}

#[test]
fn test_zero_velocity_keeps_energy_at_sources() {
    // Without velocity the Laplacian term vanishes: no energy leaves the sources
    let grid = Grid::new(20, 20, 10.0, 10.0);
    let model = VelocityModel::homogeneous(grid, 0.0);
    let params = SimulationParams {
        nb: 5,
        ..SimulationParams::new(20, 0.001)
    };
    let mut sim = Simulation::new(&model, params, &single_source()).unwrap();
    sim.run(&mut ()).unwrap();

    let (sx, sz) = sim.sources().positions[0];
    for ((ix, iz), &p) in sim.field.current().indexed_iter() {
        if (ix, iz) != (sx, sz) {
            assert_eq!(p, 0.0);
        }
    }
}

#[test]
fn test_sponge_absorbs_outgoing_waves() {
    let grid = Grid::new(40, 40, 10.0, 10.0);
    let model = VelocityModel::homogeneous(grid, 1500.0);

    let make = |border: bool| {
        let params = SimulationParams {
            nb: 20,
            fm: 20.0,
            border,
            ..SimulationParams::new(500, 0.001)
        };
        Simulation::new(&model, params, &single_source()).unwrap()
    };

    let mut absorbing = make(true);
    let mut rigid = make(false);
    let absorbed = run_with_energy(&mut absorbing);
    let reflected = run_with_energy(&mut rigid);

    let peak = absorbed.iter().cloned().fold(0.0_f64, f64::max);
    let last = *absorbed.last().unwrap();
    println!(
        "peak energy {:.3e}, final absorbing {:.3e}, final rigid {:.3e}",
        peak,
        last,
        reflected.last().unwrap()
    );

    assert!(peak > 0.0);
    assert!(last < 0.05 * peak, "sponge left {last:.3e} of peak {peak:.3e}");
    assert!(last <= absorbed[300]);
    assert!(last < *reflected.last().unwrap());
    assert!(absorbing.field.is_finite());
}

#[test]
fn test_sponge_reduces_margin_energy() {
    // 100x100 model, margins 20 cells wide, constant 1500 m/s
    let grid = Grid::new(100, 100, 10.0, 10.0);
    let model = VelocityModel::homogeneous(grid, 1500.0);

    let run = |border: bool| {
        let params = SimulationParams {
            nb: 20,
            border,
            ..SimulationParams::new(500, 0.001)
        };
        let mut sim = Simulation::new(&model, params, &single_source()).unwrap();
        sim.run(&mut ()).unwrap();
        let margin = sim.field.margin_energy(&sim.padded);
        (margin, sim.field.energy())
    };

    let (margin_absorbing, total_absorbing) = run(true);
    let (margin_rigid, total_rigid) = run(false);

    assert!(margin_absorbing < margin_rigid);
    assert!(total_absorbing < total_rigid);
}

#[test]
fn test_exploding_reflector_shot_gather() {
    // 21 sources on physical row 100, receivers 20 cells above them
    let grid = Grid::new(200, 200, 10.0, 10.0);
    let velocity = 1500.0;
    let model = VelocityModel::homogeneous(grid, velocity);
    let params = SimulationParams {
        nb: 30,
        fm: 20.0,
        border: true,
        receiver_row: Some(110),
        ..SimulationParams::new(300, 0.001)
    };
    let dt = params.dt;
    let mut sim = Simulation::new(&model, params, &SourceLayout::default()).unwrap();
    let gather = sim.run(&mut ()).unwrap().clone();

    assert_eq!(gather.data.dim(), (200, 300));
    assert!(gather.is_finite());
    assert_eq!(gather.time.unit, "s");

    let nb = sim.padded.nb as isize;
    let source_columns: Vec<isize> = sim
        .sources()
        .positions
        .iter()
        .map(|&(ix, _)| ix as isize - nb)
        .collect();
    let (_, source_row) = sim.sources().positions[0];
    let dz_cells = (source_row - sim.receiver_row()) as f64;

    for ir in 0..grid.nx {
        let trace = gather.data.row(ir);
        let max = trace.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        assert!(max > 0.0, "receiver {ir} recorded nothing");

        let dx_cells = source_columns
            .iter()
            .map(|&c| (c - ir as isize).abs())
            .min()
            .unwrap() as f64;
        let distance = ((dx_cells * grid.dx).powi(2) + (dz_cells * grid.dz).powi(2)).sqrt();
        let travel_time = distance / velocity;

        let onset = trace
            .iter()
            .position(|v| v.abs() > 0.05 * max)
            .unwrap();
        assert!(
            onset as f64 * dt > travel_time,
            "receiver {ir}: arrival at {:.4}s precedes {:.4}s",
            onset as f64 * dt,
            travel_time
        );
    }
}

#[test]
fn test_runs_are_deterministic() {
    let grid = Grid::new(60, 50, 5.0, 5.0);
    let velocity = Array2::from_shape_fn((60, 50), |(_, iz)| 1500.0 + 20.0 * iz as f64);
    let model = VelocityModel::new(grid, velocity).unwrap();
    let layout = SourceLayout::regular(8, 5);

    let run = || {
        let params = SimulationParams {
            nb: 15,
            border: true,
            ..SimulationParams::new(120, 0.0005)
        };
        let mut sim = Simulation::new(&model, params, &layout).unwrap();
        sim.run(&mut ()).unwrap();
        sim.into_shot_gather().data
    };
    assert_eq!(run(), run());
}

#[test]
fn test_faster_medium_arrives_earlier() {
    // Same geometry, two velocities: the receiver sees the faster medium first
    let grid = Grid::new(60, 60, 10.0, 10.0);
    let first_arrival = |v: f64| {
        let model = VelocityModel::homogeneous(grid, v);
        let params = SimulationParams {
            nb: 20,
            border: true,
            receiver_row: Some(30),
            ..SimulationParams::new(400, 0.001)
        };
        let mut sim = Simulation::new(&model, params, &single_source()).unwrap();
        let gather = sim.run(&mut ()).unwrap();
        let trace = gather.data.row(30);
        let max = trace.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let onset = trace.iter().position(|v| v.abs() > 0.1 * max);
        onset.unwrap()
    };
    assert!(first_arrival(2500.0) < first_arrival(1500.0));
}
