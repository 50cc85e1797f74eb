//! [`Solver`] backed by Gurobi through the `grb` crate.

use crate::model::{ConstrSense, Model, VarType};
use crate::solution::{Solution, Solver, SolverParams, Status};
use crate::Result;

/// Gurobi treats everything beyond this as infinite
const GRB_INFINITY: f64 = 1e100;

pub struct Gurobi {
    env: grb::Env,
    params: SolverParams,
}

impl Gurobi {
    pub fn new(params: SolverParams) -> Result<Self> {
        let mut env = grb::Env::new("")?;
        env.set(grb::param::OutputFlag, i32::from(params.verbose))?;
        if let Some(threads) = params.thread_count()? {
            env.set(grb::param::Threads, threads)?;
        }

        Ok(Gurobi { env, params })
    }

    fn build(&self, model: &Model) -> grb::Result<(grb::Model, Vec<grb::Var>)> {
        let mut lp = grb::Model::with_env(model.name(), &self.env)?;

        if let Some(limit) = self.params.time_limit {
            lp.set_param(grb::param::TimeLimit, limit)?;
        }

        lp.set_objective(0, grb::ModelSense::Minimize)?;

        let vars = model
            .vars()
            .iter()
            .map(|var| {
                let vtype = match var.vtype {
                    VarType::Binary => grb::VarType::Binary,
                    VarType::Integer => grb::VarType::Integer,
                    VarType::Continuous => grb::VarType::Continuous,
                };
                lp.add_var(
                    &var.name,
                    vtype,
                    var.obj,
                    var.lb.max(-GRB_INFINITY),
                    var.ub.min(GRB_INFINITY),
                    std::iter::empty(),
                )
            })
            .collect::<grb::Result<Vec<_>>>()?;

        for constr in model.constrs() {
            let mut lhs = grb::expr::LinExpr::new();
            for (coeff, var) in constr.expr.lhs.terms() {
                lhs.add_term(coeff, vars[var.index()]);
            }
            let rhs = constr.expr.rhs;
            let ineq = match constr.expr.sense {
                ConstrSense::Less => grb::c!(lhs <= rhs),
                ConstrSense::Equal => grb::c!(lhs == rhs),
                ConstrSense::Greater => grb::c!(lhs >= rhs),
            };
            lp.add_constr(&constr.name, ineq)?;
        }

        Ok((lp, vars))
    }
}

impl Solver for Gurobi {
    fn solve(&mut self, model: &Model) -> Result<Solution> {
        let (mut lp, vars) = self.build(model)?;

        lp.optimize()?;

        let status = match lp.status()? {
            grb::Status::Optimal => Status::Optimal,
            grb::Status::Infeasible => Status::Infeasible,
            grb::Status::InfOrUnbd => Status::InfeasibleOrUnbounded,
            grb::Status::Unbounded => Status::Unbounded,
            grb::Status::TimeLimit => Status::TimeLimit,
            _ => Status::Stopped,
        };
        log::debug!("Gurobi finished with status {status}");

        let solution_count = lp.get_attr(grb::attr::SolCount)?;
        if solution_count == 0 {
            return Ok(Solution::without_assignment(status));
        }

        let objective = lp.get_attr(grb::attr::ObjVal)?;
        let values = lp.get_obj_attr_batch(grb::attr::X, vars)?;

        Ok(Solution::new(status, Some(objective), Some(values)))
    }
}
