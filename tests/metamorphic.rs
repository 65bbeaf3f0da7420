//! Metamorphic testing for orbital physics invariants.
//!
//! Per Chen et al. [33], metamorphic testing verifies **relations** rather
//! than specific outputs: the exact trajectory of an N-body system is
//! unknown, but transformed inputs must produce predictably related outputs.
//!
//! # Metamorphic Relations
//!
//! 1. **Rotation Invariance**: rotating the start about Z preserves shapes
//! 2. **Test-Particle Mass Independence**: a negligible mass follows the same path
//! 3. **Step Refinement**: halving dt shrinks the error about fourfold (2nd order)
//!
//! # References
//!
//! [33] Chen et al., "Metamorphic testing: a new approach," Hong Kong UST, 1998.

use orbsim::prelude::*;

const HOUR: f64 = 3600.0;

fn run_system(config: SimConfig, requests: Vec<BodyRequest>, steps: usize) -> Simulator {
    let sim = Simulator::new(config).expect("config");
    for request in requests {
        sim.add_body(request).expect("add");
    }
    sim.start();
    sim.run_steps(steps).expect("run");
    sim
}

fn pairwise_distances(snapshot: &Snapshot) -> Vec<f64> {
    let mut distances = Vec::new();
    for (i, a) in snapshot.bodies.iter().enumerate() {
        for b in &snapshot.bodies[i + 1..] {
            distances.push(a.position.distance(&b.position));
        }
    }
    distances
}

/// MR-1: Rotation Invariance
#[test]
fn mr1_rotation_invariance() {
    let system = |offset: f64| {
        vec![
            BodyRequest::si("Venus", 4.8675e24, 1.0821e11, 35_020.0, offset),
            BodyRequest::si("Earth", EARTH_MASS, AU, 29_780.0, 120.0 + offset),
        ]
    };

    let original = run_system(SimConfig::default(), system(0.0), 500);
    let rotated = run_system(SimConfig::default(), system(45.0), 500);

    let d1 = pairwise_distances(&original.snapshot());
    let d2 = pairwise_distances(&rotated.snapshot());
    for (a, b) in d1.iter().zip(&d2) {
        let rel = (a - b).abs() / a;
        assert!(rel < 1e-9, "MR-1 FAILED: distance error {rel:.2e}");
    }

    for name in ["Venus", "Earth"] {
        let e1 = original.orbital_elements(name).expect("bound");
        let e2 = rotated.orbital_elements(name).expect("bound");
        assert!((e1.semi_major_axis - e2.semi_major_axis).abs() / e1.semi_major_axis < 1e-9);
        assert!((e1.eccentricity - e2.eccentricity).abs() < 1e-9);
    }
}

/// MR-2: Test-Particle Mass Independence
#[test]
fn mr2_test_particle_mass_independence() {
    let probe = |mass: f64| vec![BodyRequest::si("Probe", mass, 0.7 * AU, 40_000.0, 10.0)];

    let light = run_system(SimConfig::default(), probe(1.0), 1000);
    let heavy = run_system(SimConfig::default(), probe(1000.0), 1000);

    let a = light.body("Probe").expect("probe").position;
    let b = heavy.body("Probe").expect("probe").position;
    let rel = a.distance(&b) / a.magnitude();
    assert!(rel < 1e-12, "MR-2 FAILED: path depends on probe mass ({rel:.2e})");
}

/// MR-3: Step Refinement (second-order convergence)
#[test]
fn mr3_step_refinement() {
    let speed = circular_velocity(G * SOLAR_MASS, AU) * 0.9;
    let span = 30.0 * SECONDS_PER_DAY;

    let final_position = |dt: f64| {
        let config = SimConfig::builder().time_step(dt).build();
        let steps = (span / dt).round() as usize;
        let sim = run_system(
            config,
            vec![BodyRequest::si("Earth", EARTH_MASS, AU, speed, 0.0)],
            steps,
        );
        sim.body("Earth").expect("earth").position
    };

    let coarse = final_position(8.0 * HOUR);
    let medium = final_position(4.0 * HOUR);
    let fine = final_position(2.0 * HOUR);

    let err_coarse = coarse.distance(&medium);
    let err_medium = medium.distance(&fine);
    let ratio = err_coarse / err_medium;
    assert!(
        (3.0..5.0).contains(&ratio),
        "MR-3 FAILED: refinement ratio {ratio:.2} not near 4"
    );
}
