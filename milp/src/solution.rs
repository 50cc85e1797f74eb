use crate::model::{Model, Var};
use crate::{Error, Result};
use std::fmt;

/// Termination status reported by a solver backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Optimal,
    Infeasible,
    InfeasibleOrUnbounded,
    Unbounded,
    /// Time limit hit; the best known assignment may still be available
    TimeLimit,
    /// Any other early termination (node, solution or user limits)
    Stopped,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Status::Optimal => "OPTIMAL",
            Status::Infeasible => "INFEASIBLE",
            Status::InfeasibleOrUnbounded => "INFEASIBLE_OR_UNBOUNDED",
            Status::Unbounded => "UNBOUNDED",
            Status::TimeLimit => "TIME_LIMIT_REACHED",
            Status::Stopped => "STOPPED",
        };
        write!(f, "{text}")
    }
}

/// What a backend returns: status, objective value and (if any) one value per variable
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: Status,
    pub objective: Option<f64>,
    values: Option<Vec<f64>>,
}

impl Solution {
    pub fn new(status: Status, objective: Option<f64>, values: Option<Vec<f64>>) -> Self {
        Solution {
            status,
            objective,
            values,
        }
    }

    /// A solution without assignment, e.g. for infeasible models
    pub fn without_assignment(status: Status) -> Self {
        Self::new(status, None, None)
    }

    pub fn values(&self) -> Option<&[f64]> {
        self.values.as_deref()
    }

    pub fn value(&self, var: Var) -> Option<f64> {
        self.values.as_ref().map(|values| values[var.index()])
    }

    /// Ensures the assignment (if any) fits `model`
    pub fn check_dimension(&self, model: &Model) -> Result<()> {
        match &self.values {
            Some(values) if values.len() != model.num_vars() => Err(Error::DimensionMismatch {
                expected: model.num_vars(),
                found: values.len(),
            }),
            _ => Ok(()),
        }
    }
}

/// Parameters handed through to the backend
#[derive(Debug, Clone, Default)]
pub struct SolverParams {
    /// Wall clock limit in seconds
    pub time_limit: Option<f64>,
    pub threads: Option<usize>,
    /// Let the backend print its own log
    pub verbose: bool,
}

impl SolverParams {
    /// Thread count in the range backends accept
    pub fn thread_count(&self) -> Result<Option<i32>> {
        self.threads
            .map(|threads| {
                i32::try_from(threads)
                    .map_err(|_| Error::Backend(format!("thread count {threads} out of range")))
            })
            .transpose()
    }
}

/// A MILP engine
pub trait Solver {
    /// Optimizes `model`; infeasibility and limits are reported via [`Status`], not errors
    fn solve(&mut self, model: &Model) -> Result<Solution>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VarType;

    #[test]
    fn prints_status_names() {
        assert_eq!(Status::Optimal.to_string(), "OPTIMAL");
        assert_eq!(Status::TimeLimit.to_string(), "TIME_LIMIT_REACHED");
    }

    #[test]
    fn reads_values_by_var() {
        let mut model = Model::new("m");
        let _ = model.add_var("a", VarType::Continuous, 0.0, 0.0, 1.0);
        let b = model.add_var("b", VarType::Continuous, 0.0, 0.0, 1.0);
        let solution = Solution::new(Status::Optimal, Some(0.0), Some(vec![0.25, 0.75]));
        assert_eq!(solution.value(b), Some(0.75));
        assert!(solution.check_dimension(&model).is_ok());
    }

    #[test]
    fn rejects_wrong_dimension() {
        let mut model = Model::new("m");
        let _ = model.add_var("a", VarType::Continuous, 0.0, 0.0, 1.0);
        let solution = Solution::new(Status::Optimal, Some(0.0), Some(vec![0.0, 1.0]));
        assert!(matches!(
            solution.check_dimension(&model),
            Err(Error::DimensionMismatch {
                expected: 1,
                found: 2
            })
        ));
    }

    #[test]
    fn passes_thread_count_through() {
        let params = SolverParams {
            threads: Some(4),
            ..SolverParams::default()
        };
        assert_eq!(params.thread_count().unwrap(), Some(4));
        assert_eq!(SolverParams::default().thread_count().unwrap(), None);
    }

    #[test]
    fn rejects_oversized_thread_count() {
        let params = SolverParams {
            threads: Some(usize::MAX),
            ..SolverParams::default()
        };
        assert!(matches!(params.thread_count(), Err(Error::Backend(_))));
    }

    #[test]
    fn infeasible_solution_has_no_values() {
        let solution = Solution::without_assignment(Status::Infeasible);
        assert!(solution.values().is_none());
        assert!(solution.objective.is_none());
    }
}
