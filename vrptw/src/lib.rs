//! Exact solution of the vehicle routing problem with time windows via an arc-based
//! mixed-integer linear program.
//!
//! An [`Instance`](problem::Instance) is turned into a [`Formulation`](formulation::Formulation),
//! optimized by any [`milp::Solver`] and the selected arcs are stitched back into routes.

use clap::Parser;
use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

pub mod error;
pub mod formulation;
pub mod generator;
pub mod logging;
pub mod problem;
pub mod routes;
pub mod solomon;
pub mod solution;
pub mod solver;

#[cfg(test)]
mod fixtures;

use formulation::{Formulation, Variant};
use problem::Instance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum VariantArg {
    /// Every vehicle may drive, only travel is paid
    FixedFleet,
    /// Each used vehicle is paid for
    VehicleUse,
}

#[derive(Debug, Parser)]
#[command(name = "vrptw", version, about = "Solves VRPTW instances exactly with a MILP")]
pub struct Config {
    /// Instance in Solomon format
    #[arg(required_unless_present = "seed")]
    pub filename: Option<PathBuf>,
    /// Number of customers to take from the instance
    #[arg(short = 'n', long, default_value_t = 25)]
    pub customers: usize,
    /// Generate a random instance with this seed instead of reading a file
    #[arg(long, conflicts_with = "filename")]
    pub seed: Option<u64>,
    /// Fleet size of generated instances
    #[arg(long, default_value_t = 25, requires = "seed")]
    pub vehicles: usize,
    /// Vehicle capacity of generated instances
    #[arg(long, default_value_t = 200, requires = "seed")]
    pub capacity: problem::Load,
    #[arg(long, value_enum, default_value_t = VariantArg::FixedFleet)]
    pub variant: VariantArg,
    /// Objective cost of each used vehicle
    #[arg(long, default_value_t = 1.0)]
    pub vehicle_cost: f64,
    /// Export the model in LP format
    #[arg(long)]
    pub write_lp: Option<PathBuf>,
    /// Directory for the results file
    #[arg(long)]
    pub result_dir: Option<PathBuf>,
    /// Solver time limit in seconds
    #[arg(long)]
    pub time_limit: Option<f64>,
    #[arg(long)]
    pub threads: Option<usize>,
    /// Show the solver log
    #[arg(long)]
    pub solver_output: bool,
    /// Overrides RUST_LOG
    #[arg(long, value_enum)]
    pub log_level: Option<logging::LogLevel>,
}

impl Config {
    pub fn variant(&self) -> Variant {
        match self.variant {
            VariantArg::FixedFleet => Variant::FixedFleet,
            VariantArg::VehicleUse => Variant::VehicleUse {
                vehicle_cost: self.vehicle_cost,
            },
        }
    }

    pub fn solver_params(&self) -> milp::SolverParams {
        milp::SolverParams {
            time_limit: self.time_limit,
            threads: self.threads,
            verbose: self.solver_output,
        }
    }
}

pub fn run(config: Config) -> Result<(), Box<dyn Error>> {
    let instance = match (&config.filename, config.seed) {
        (Some(filename), _) => {
            log::info!("Reading instance from file {:?}", filename);
            solomon::read(filename, config.customers)?
        }
        (None, Some(seed)) => generator::random_instance(
            config.customers,
            config.vehicles,
            config.capacity,
            seed,
        )?,
        (None, None) => return Err("need an instance file or a seed".into()),
    };
    log::debug!("{}", instance);

    let variant = config.variant();
    if let Some(path) = &config.write_lp {
        let formulation = Formulation::new(&instance, variant);
        let mut out = BufWriter::new(File::create(path)?);
        milp::lp::write(formulation.model(), &mut out)?;
        out.flush()?;
        log::info!("Wrote model to {:?}", path);
    }

    solve_and_report(&instance, variant, &config)
}

#[cfg(feature = "gurobi")]
fn solve_and_report(
    instance: &Instance,
    variant: Variant,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let mut gurobi = milp::gurobi::Gurobi::new(config.solver_params())?;
    let solution = solver::solve(instance, variant, &mut gurobi)?;
    println!("{}", solution);

    if let Some(dir) = &config.result_dir {
        let path = solution.write_results(dir)?;
        log::info!("Wrote results to {:?}", path);
    }

    Ok(())
}

#[cfg(not(feature = "gurobi"))]
fn solve_and_report(
    _instance: &Instance,
    _variant: Variant,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    if config.write_lp.is_none() {
        log::warn!("Built without solver backend, use --write-lp to export the model");
    }
    Ok(())
}
