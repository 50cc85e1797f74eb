use crate::problem::InstanceError;
use crate::routes::ReconstructError;
use crate::solomon::ReadError;
use milp::Status;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid instance: {0}")]
    Instance(#[from] InstanceError),
    #[error("cannot read instance: {0}")]
    Read(#[from] ReadError),
    #[error(transparent)]
    Solver(#[from] milp::Error),
    #[error("solver finished with status {0} and no solution")]
    NoSolution(Status),
    #[error("cannot build routes from solution: {0}")]
    Reconstruct(#[from] ReconstructError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
