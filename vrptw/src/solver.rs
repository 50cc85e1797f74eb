use crate::error::{Error, Result};
use crate::formulation::{Formulation, Variant};
use crate::problem::Instance;
use crate::routes;
use crate::solution::Solution;
use milp::Solver;
use std::time::Instant;

/// Absolute slack granted to solver assignments before a row counts as violated
pub const TOLERANCE: f64 = 1e-6;

/// Builds the formulation of `instance`, optimizes it with `solver` and turns the
/// assignment into routes.
///
/// Fails if the solver has no assignment to offer, e.g. for infeasible models or a time
/// limit without incumbent.
pub fn solve<S: Solver>(instance: &Instance, variant: Variant, solver: &mut S) -> Result<Solution> {
    let start = Instant::now();

    let formulation = Formulation::new(instance, variant);
    let model = formulation.model();
    log::info!("Optimizing model of {}", instance.name);
    let result = solver.solve(model)?;
    result.check_dimension(model)?;
    log::info!("Solver finished with status {}", result.status);

    let values = result.values().ok_or(Error::NoSolution(result.status))?;
    for violation in model.violations(values, TOLERANCE) {
        log::warn!("Solver assignment: {violation}");
    }

    let arcs = formulation.selected_arcs(values);
    log::debug!("{} arcs selected", arcs.len());
    let routes = routes::reconstruct(&arcs, instance.num_customers, instance.num_vehicles)?;
    for violation in routes.violations(instance) {
        log::warn!("Routes: {violation}");
    }

    let objective = result
        .objective
        .unwrap_or_else(|| model.objective_value(values));
    log::info!(
        "Objective {objective} with {} of {} vehicles",
        routes.len(),
        instance.num_vehicles
    );

    Ok(Solution::new(
        instance,
        result.status,
        objective,
        routes,
        start.elapsed(),
    ))
}
