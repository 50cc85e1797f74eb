//! Solver-independent representation of mixed-integer linear programs.
//!
//! Formulations are built into a [`Model`], optimized by any [`Solver`] and the resulting
//! [`Solution`] is read back through the [`Var`] handles handed out while building.

#[cfg(feature = "gurobi")]
pub mod gurobi;
pub mod lp;
mod model;
mod solution;

pub use model::{
    ConstrSense, Constraint, IneqExpr, LinExpr, Model, Var, VarType, Variable, Violation,
};
pub use solution::{Solution, Solver, SolverParams, Status};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[cfg(feature = "gurobi")]
    #[error("Gurobi error: {0}")]
    Gurobi(#[from] grb::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("solver returned {found} values for a model with {expected} variables")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("solver backend failed: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, Error>;
