use std::fmt;

/// Handle of a variable inside a [`Model`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(usize);

impl Var {
    /// Position of the variable in the model (and in every value vector)
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Binary,
    Integer,
    Continuous,
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub vtype: VarType,
    pub obj: f64,
    pub lb: f64,
    pub ub: f64,
}

/// Linear expression `sum coeff * var` without constant term
#[derive(Debug, Clone, Default)]
pub struct LinExpr {
    terms: Vec<(f64, Var)>,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_term(&mut self, coeff: f64, var: Var) -> &mut Self {
        self.terms.push((coeff, var));
        self
    }

    pub fn terms(&self) -> impl Iterator<Item = (f64, Var)> + '_ {
        self.terms.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Coefficient of `var`, summed over repeated terms
    pub fn coeff(&self, var: Var) -> f64 {
        self.terms
            .iter()
            .filter(|(_, v)| *v == var)
            .map(|(coeff, _)| coeff)
            .sum()
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(coeff, var)| coeff * values[var.index()])
            .sum()
    }

    pub fn le(self, rhs: f64) -> IneqExpr {
        IneqExpr {
            lhs: self,
            sense: ConstrSense::Less,
            rhs,
        }
    }

    pub fn ge(self, rhs: f64) -> IneqExpr {
        IneqExpr {
            lhs: self,
            sense: ConstrSense::Greater,
            rhs,
        }
    }

    pub fn equal(self, rhs: f64) -> IneqExpr {
        IneqExpr {
            lhs: self,
            sense: ConstrSense::Equal,
            rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstrSense {
    Less,
    Equal,
    Greater,
}

impl fmt::Display for ConstrSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstrSense::Less => write!(f, "<="),
            ConstrSense::Equal => write!(f, "="),
            ConstrSense::Greater => write!(f, ">="),
        }
    }
}

/// A row before it gets a name
#[derive(Debug, Clone)]
pub struct IneqExpr {
    pub lhs: LinExpr,
    pub sense: ConstrSense,
    pub rhs: f64,
}

impl IneqExpr {
    /// Returns whether the row holds for `values` up to `tolerance`
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let activity = self.lhs.evaluate(values);
        match self.sense {
            ConstrSense::Less => activity <= self.rhs + tolerance,
            ConstrSense::Equal => (activity - self.rhs).abs() <= tolerance,
            ConstrSense::Greater => activity >= self.rhs - tolerance,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Constraint {
    pub name: String,
    pub expr: IneqExpr,
}

/// Something an assignment does wrong with respect to a model
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    Row {
        name: String,
        activity: f64,
        sense: ConstrSense,
        rhs: f64,
    },
    Bound {
        name: String,
        value: f64,
        lb: f64,
        ub: f64,
    },
    Integrality {
        name: String,
        value: f64,
    },
}

impl Violation {
    pub fn name(&self) -> &str {
        match self {
            Violation::Row { name, .. }
            | Violation::Bound { name, .. }
            | Violation::Integrality { name, .. } => name,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Row {
                name,
                activity,
                sense,
                rhs,
            } => write!(f, "row {name}: {activity} {sense} {rhs} does not hold"),
            Violation::Bound {
                name,
                value,
                lb,
                ub,
            } => write!(f, "variable {name} = {value} outside [{lb}, {ub}]"),
            Violation::Integrality { name, value } => {
                write!(f, "variable {name} = {value} is not integral")
            }
        }
    }
}

/// Solver-independent mixed-integer linear program, always minimizing
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    vars: Vec<Variable>,
    constrs: Vec<Constraint>,
}

impl Model {
    pub fn new(name: &str) -> Self {
        Model {
            name: name.to_string(),
            vars: Vec::new(),
            constrs: Vec::new(),
        }
    }

    pub fn with_capacity(name: &str, num_vars: usize, num_constrs: usize) -> Self {
        Model {
            name: name.to_string(),
            vars: Vec::with_capacity(num_vars),
            constrs: Vec::with_capacity(num_constrs),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a variable with objective coefficient `obj` and bounds `[lb, ub]`
    pub fn add_var(&mut self, name: &str, vtype: VarType, obj: f64, lb: f64, ub: f64) -> Var {
        debug_assert!(lb <= ub, "empty domain for variable {name}");
        let (lb, ub) = match vtype {
            VarType::Binary => (lb.max(0.0), ub.min(1.0)),
            _ => (lb, ub),
        };
        self.vars.push(Variable {
            name: name.to_string(),
            vtype,
            obj,
            lb,
            ub,
        });
        Var(self.vars.len() - 1)
    }

    /// Adds a named row and returns its position
    pub fn add_constr(&mut self, name: &str, expr: IneqExpr) -> usize {
        debug_assert!(expr.lhs.terms().all(|(_, var)| var.index() < self.vars.len()));
        self.constrs.push(Constraint {
            name: name.to_string(),
            expr,
        });
        self.constrs.len() - 1
    }

    pub fn var(&self, var: Var) -> &Variable {
        &self.vars[var.index()]
    }

    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    pub fn constrs(&self) -> &[Constraint] {
        &self.constrs
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_constrs(&self) -> usize {
        self.constrs.len()
    }

    /// Objective as expression over all variables with non-zero coefficient
    pub fn objective(&self) -> LinExpr {
        let mut expr = LinExpr::new();
        for (index, var) in self.vars.iter().enumerate() {
            if var.obj != 0.0 {
                expr.add_term(var.obj, Var(index));
            }
        }
        expr
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.vars
            .iter()
            .zip(values.iter())
            .map(|(var, value)| var.obj * value)
            .sum()
    }

    /// Lists every bound, integrality and row requirement that `values` breaks by more
    /// than `tolerance`
    pub fn violations(&self, values: &[f64], tolerance: f64) -> Vec<Violation> {
        debug_assert_eq!(values.len(), self.vars.len());
        let mut result = Vec::new();

        for (var, &value) in self.vars.iter().zip(values.iter()) {
            if value < var.lb - tolerance || value > var.ub + tolerance {
                result.push(Violation::Bound {
                    name: var.name.clone(),
                    value,
                    lb: var.lb,
                    ub: var.ub,
                });
            }
            if var.vtype != VarType::Continuous && (value - value.round()).abs() > tolerance {
                result.push(Violation::Integrality {
                    name: var.name.clone(),
                    value,
                });
            }
        }

        for constr in self.constrs.iter() {
            if !constr.expr.is_satisfied(values, tolerance) {
                result.push(Violation::Row {
                    name: constr.name.clone(),
                    activity: constr.expr.lhs.evaluate(values),
                    sense: constr.expr.sense,
                    rhs: constr.expr.rhs,
                });
            }
        }

        result
    }
}
