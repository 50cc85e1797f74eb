//! Export of a [`Model`] in CPLEX LP text format, readable by most MILP engines.

use crate::model::{ConstrSense, LinExpr, Model, VarType};
use std::io::{self, Write};

const TERMS_PER_LINE: usize = 8;

pub fn write<W: Write>(model: &Model, out: &mut W) -> io::Result<()> {
    writeln!(out, "\\ Problem: {}", model.name())?;
    writeln!(out, "Minimize")?;
    write!(out, " obj:")?;
    write_expr(model, &model.objective(), out)?;
    writeln!(out)?;

    writeln!(out, "Subject To")?;
    for constr in model.constrs() {
        write!(out, " {}:", constr.name)?;
        write_expr(model, &constr.expr.lhs, out)?;
        let sense = match constr.expr.sense {
            ConstrSense::Less => "<=",
            ConstrSense::Equal => "=",
            ConstrSense::Greater => ">=",
        };
        writeln!(out, " {} {}", sense, constr.expr.rhs)?;
    }

    writeln!(out, "Bounds")?;
    for var in model.vars() {
        if var.vtype == VarType::Binary && var.lb == 0.0 && var.ub == 1.0 {
            continue;
        }
        if var.lb == var.ub {
            writeln!(out, " {} = {}", var.name, var.lb)?;
        } else if var.lb == f64::NEG_INFINITY && var.ub == f64::INFINITY {
            writeln!(out, " {} free", var.name)?;
        } else if var.ub == f64::INFINITY {
            writeln!(out, " {} >= {}", var.name, var.lb)?;
        } else if var.lb == f64::NEG_INFINITY {
            writeln!(out, " -inf <= {} <= {}", var.name, var.ub)?;
        } else {
            writeln!(out, " {} <= {} <= {}", var.lb, var.name, var.ub)?;
        }
    }

    write_section(model, VarType::Binary, "Binaries", out)?;
    write_section(model, VarType::Integer, "Generals", out)?;
    writeln!(out, "End")
}

fn write_expr<W: Write>(model: &Model, expr: &LinExpr, out: &mut W) -> io::Result<()> {
    if expr.is_empty() {
        // LP format has no empty rows, so reference some variable with coefficient 0
        return match model.vars().first() {
            Some(var) => write!(out, " 0 {}", var.name),
            None => write!(out, " 0"),
        };
    }
    for (count, (coeff, var)) in expr.terms().enumerate() {
        if count > 0 && count % TERMS_PER_LINE == 0 {
            write!(out, "\n   ")?;
        }
        let sign = if coeff < 0.0 { '-' } else { '+' };
        let name = &model.var(var).name;
        if coeff.abs() == 1.0 {
            write!(out, " {sign} {name}")?;
        } else {
            write!(out, " {sign} {} {name}", coeff.abs())?;
        }
    }
    Ok(())
}

fn write_section<W: Write>(
    model: &Model,
    vtype: VarType,
    header: &str,
    out: &mut W,
) -> io::Result<()> {
    let names = model
        .vars()
        .iter()
        .filter(|var| var.vtype == vtype)
        .map(|var| var.name.as_str())
        .collect::<Vec<_>>();
    if names.is_empty() {
        return Ok(());
    }
    writeln!(out, "{header}")?;
    for chunk in names.chunks(TERMS_PER_LINE) {
        writeln!(out, " {}", chunk.join(" "))?;
    }
    Ok(())
}
