//! Pushover of a steel cantilever column under constant axial load
//!
//! Usage: mixed-pushover [options.json]
//!
//! The top of the column is pushed laterally in displacement control; the
//! vertical displacement and rotation of the top node are found by Newton
//! iteration on the element resisting force.

use std::fs;

use anyhow::{bail, Context, Result};
use log::info;
use mixed_beam_column::math::{self, Mat2, Vec2};
use mixed_beam_column::prelude::*;

const HEIGHT: f64 = 3.0;
const AXIAL_LOAD: f64 = -500e3;
const TARGET_DRIFT: f64 = 0.03;
const NUM_STEPS: usize = 30;
const NEWTON_TOL: f64 = 1e-6;
const NEWTON_MAX_ITER: usize = 25;

fn main() -> Result<()> {
    env_logger::init();

    let options = match std::env::args().nth(1) {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read options file {path}"))?;
            SolverOptions::from_json(&text)
                .with_context(|| format!("invalid options in {path}"))?
        }
        None => SolverOptions::default().with_tolerance(1e-10),
    };

    println!("=== Mixed Beam-Column Pushover ===\n");

    // W310-ish steel section, 2 fiber layers per flange, 8 in the web
    let section = FiberSection::wide_flange(Material::steel(), 0.31, 0.165, 0.0097, 0.0058, 2, 8)?;

    let mut column = MixedBeamColumn2d::uniform(
        1,
        [1, 2],
        &section,
        5,
        Box::new(Lobatto),
        Box::new(PDeltaCrdTransf2d::new()),
    )?
    .with_options(options)?;

    column.attach(&Node::new(1, 0.0, 0.0), &Node::new(2, 0.0, HEIGHT))?;
    info!("{column}");

    // Top node DOFs [ux, uy, rz] are 3, 4, 5; the base is fixed
    let mut u = Vec6::zeros();
    let external = Vec2::new(AXIAL_LOAD, 0.0);

    println!("{:>6} {:>12} {:>14} {:>8}", "step", "drift", "shear (kN)", "iters");

    for step in 1..=NUM_STEPS {
        u[3] = TARGET_DRIFT * HEIGHT * step as f64 / NUM_STEPS as f64;

        let mut converged = false;
        let mut local_iterations = 0;
        for _ in 0..NEWTON_MAX_ITER {
            let report = column.update(&u)?;
            local_iterations = report.iterations;
            if !report.is_converged() {
                column.revert_to_last_commit()?;
                bail!(
                    "local state determination failed at step {step} ({:?})",
                    report.status
                );
            }

            let p = column.resisting_force()?;
            let residual = external - Vec2::new(p[4], p[5]);
            if residual.norm() <= NEWTON_TOL * AXIAL_LOAD.abs() {
                converged = true;
                break;
            }

            let k = column.tangent_stiff()?;
            let kff = Mat2::new(k[(4, 4)], k[(4, 5)], k[(5, 4)], k[(5, 5)]);
            let Some(kff_inv) = math::invert2(&kff) else {
                bail!("singular structure stiffness at step {step}");
            };
            let du = kff_inv * residual;
            u[4] += du[0];
            u[5] += du[1];
        }

        if !converged {
            column.revert_to_last_commit()?;
            bail!("equilibrium not reached at step {step}");
        }
        column.commit_state()?;

        let shear = column.resisting_force()?[3];
        println!(
            "{:>6} {:>12.5} {:>14.3} {:>8}",
            step,
            u[3] / HEIGHT,
            shear / 1000.0,
            local_iterations
        );
    }

    let q = column.basic_force();
    println!(
        "\nFinal basic forces: N = {:.1} kN, Mi = {:.1} kNm, Mj = {:.1} kNm",
        q[0] / 1000.0,
        q[1] / 1000.0,
        q[2] / 1000.0
    );

    Ok(())
}
