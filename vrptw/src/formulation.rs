use crate::problem::*;
use crate::routes::{Arc, RouteSet, SELECTION_THRESHOLD};
use milp::{Constraint, LinExpr, Model, Var, VarType};
use std::fmt;
use std::ops::Range;

/// Which of the two arc-based models to build
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Variant {
    /// Every vehicle may be used; the objective is the total travel cost
    FixedFleet,
    /// Binary `v[k]` per vehicle gates capacity and service times, each used vehicle
    /// adds `vehicle_cost` to the objective
    VehicleUse { vehicle_cost: f64 },
}

impl Variant {
    pub fn has_vehicle_vars(&self) -> bool {
        matches!(self, Variant::VehicleUse { .. })
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::FixedFleet => write!(f, "fixed fleet"),
            Variant::VehicleUse { vehicle_cost } => {
                write!(f, "vehicle use (cost {vehicle_cost} per vehicle)")
            }
        }
    }
}

/// Constraint families of the formulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Group {
    Covering,
    Flow,
    Depot,
    Capacity,
    TimePropagation,
    TimeWindow,
    VehicleUse,
    Goodsense,
}

struct Variables {
    num_nodes: usize,
    num_vehicles: usize,
    variables: Vec<Var>,
    arc_range: (usize, usize),
    service_range: (usize, usize),
    vehicle_range: (usize, usize),
}

#[allow(clippy::many_single_char_names)]
impl Variables {
    fn new(instance: &Instance, variant: Variant, model: &mut Model) -> Self {
        let num_nodes = instance.num_nodes();
        let num_vehicles = instance.num_vehicles;
        let num_variables_arc = num_vehicles * num_nodes * num_nodes;
        let num_variables_service = num_vehicles * num_nodes;
        let num_variables_vehicle = if variant.has_vehicle_vars() {
            num_vehicles
        } else {
            0
        };
        let num_variables = num_variables_arc + num_variables_service + num_variables_vehicle;
        let mut vars = Variables {
            num_nodes,
            num_vehicles,
            variables: Vec::with_capacity(num_variables),
            arc_range: (0, num_variables),
            service_range: (0, num_variables),
            vehicle_range: (0, num_variables),
        };

        let origin = instance.origin();
        let destination = instance.destination();

        // arc variables
        for k in instance.all_vehicles() {
            for i in instance.all_nodes() {
                for j in instance.all_nodes() {
                    let name = format!("x_{i}_{j}_{k}");
                    let coeff = instance.distance(i, j).into();
                    // no self-loops, no empty tours, nothing into the origin or out of
                    // the destination
                    let ub = if i == j
                        || (i == origin && j == destination)
                        || i == destination
                        || j == origin
                    {
                        0.0
                    } else {
                        1.0
                    };
                    let var = model.add_var(&name, VarType::Binary, coeff, 0.0, ub);
                    debug_assert_eq!(vars.variables.len(), vars.arc_index(i, j, k));
                    vars.variables.push(var);
                }
            }
        }
        vars.arc_range.1 = vars.variables.len();
        debug_assert_eq!(num_variables_arc, vars.arc_range.1 - vars.arc_range.0);

        // service start variables
        vars.service_range.0 = vars.arc_range.1;
        let horizon = instance.horizon().into();
        let prefix = if variant.has_vehicle_vars() { "s" } else { "w" };
        for k in instance.all_vehicles() {
            for i in instance.all_nodes() {
                let name = format!("{prefix}_{i}_{k}");
                let var = model.add_var(&name, VarType::Continuous, 0.0, 0.0, horizon);
                debug_assert_eq!(vars.variables.len(), vars.service_index(i, k));
                vars.variables.push(var);
            }
        }
        vars.service_range.1 = vars.variables.len();
        debug_assert_eq!(
            num_variables_service,
            vars.service_range.1 - vars.service_range.0
        );

        // vehicle use variables
        vars.vehicle_range = (vars.service_range.1, vars.service_range.1);
        if let Variant::VehicleUse { vehicle_cost } = variant {
            for k in instance.all_vehicles() {
                let name = format!("v_{k}");
                let var = model.add_var(&name, VarType::Binary, vehicle_cost, 0.0, 1.0);
                debug_assert_eq!(vars.variables.len(), vars.vehicle_index(k));
                vars.variables.push(var);
            }
            vars.vehicle_range.1 = vars.variables.len();
        }
        debug_assert_eq!(
            num_variables_vehicle,
            vars.vehicle_range.1 - vars.vehicle_range.0
        );

        vars
    }

    fn arc_index(&self, i: NodeId, j: NodeId, k: VehicleId) -> usize {
        debug_assert!(i < self.num_nodes);
        debug_assert!(j < self.num_nodes);
        debug_assert!(k < self.num_vehicles);

        let n = self.num_nodes;
        let result = self.arc_range.0 + (k * n + i) * n + j;
        debug_assert!(result < self.arc_range.1);

        result
    }

    fn arc(&self, i: NodeId, j: NodeId, k: VehicleId) -> Var {
        self.variables[self.arc_index(i, j, k)]
    }

    fn service_index(&self, i: NodeId, k: VehicleId) -> usize {
        debug_assert!(i < self.num_nodes);
        debug_assert!(k < self.num_vehicles);

        let result = self.service_range.0 + k * self.num_nodes + i;
        debug_assert!(result < self.service_range.1);

        result
    }

    fn service(&self, i: NodeId, k: VehicleId) -> Var {
        self.variables[self.service_index(i, k)]
    }

    fn vehicle_index(&self, k: VehicleId) -> usize {
        debug_assert!(k < self.num_vehicles);

        let result = self.vehicle_range.0 + k;
        debug_assert!(result < self.vehicle_range.1);

        result
    }

    fn vehicle(&self, k: VehicleId) -> Option<Var> {
        if self.vehicle_range.0 == self.vehicle_range.1 {
            None
        } else {
            Some(self.variables[self.vehicle_index(k)])
        }
    }
}

/// Ordered pairs `(i, j)` that get a time propagation row: `i` is not the depot
/// destination, `j` is not the depot origin
fn propagation_pairs(instance: &Instance) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
    let origin = instance.origin();
    let destination = instance.destination();
    instance
        .all_nodes()
        .filter(move |i| *i != destination)
        .flat_map(move |i| {
            instance
                .all_nodes_except(i)
                .filter(move |j| *j != origin)
                .map(move |j| (i, j))
        })
}

/// Smallest constant that relaxes every time propagation row whose arc is not selected,
/// i.e. the largest `start[i] + d[i][j] - start[j]` the remaining rows allow.
fn big_m(instance: &Instance, variant: Variant) -> f64 {
    let worst = propagation_pairs(instance)
        .map(|(i, j)| {
            let reach = instance.window(i).due + instance.distance(i, j);
            match variant {
                // a node skipped by the vehicle has its start pinned to 0
                Variant::FixedFleet => reach,
                // a used vehicle keeps every start inside its window, an unused one at 0
                Variant::VehicleUse { .. } => {
                    (reach - instance.window(j).ready).max(instance.distance(i, j))
                }
            }
        })
        .max()
        .unwrap_or(0);

    f64::from(worst.max(0))
}

/// The arc-based MILP of a VRPTW instance together with the handles to read a solution
pub struct Formulation {
    model: Model,
    vars: Variables,
    variant: Variant,
    big_m: f64,
    groups: Vec<(Group, Range<usize>)>,
    num_customers: usize,
    num_vehicles: usize,
}

impl Formulation {
    pub fn new(instance: &Instance, variant: Variant) -> Self {
        let mut model = Model::new("vrptw");
        let vars = Variables::new(instance, variant, &mut model);
        let big_m = big_m(instance, variant);
        log::debug!("Big-M for {} is {big_m}", instance.name);

        let mut formulation = Formulation {
            model,
            vars,
            variant,
            big_m,
            groups: Vec::new(),
            num_customers: instance.num_customers,
            num_vehicles: instance.num_vehicles,
        };

        formulation.add_group(Group::Covering, |f| f.add_covering(instance));
        formulation.add_group(Group::Flow, |f| f.add_flow(instance));
        formulation.add_group(Group::Depot, |f| f.add_depot(instance));
        formulation.add_group(Group::Capacity, |f| f.add_capacity(instance));
        formulation.add_group(Group::TimePropagation, |f| {
            f.add_time_propagation(instance)
        });
        formulation.add_group(Group::TimeWindow, |f| f.add_time_windows(instance));
        if variant.has_vehicle_vars() {
            formulation.add_group(Group::VehicleUse, |f| f.add_vehicle_use(instance));
            formulation.add_group(Group::Goodsense, |f| f.add_goodsense(instance));
        }

        log::info!(
            "Built {} formulation with {} variables and {} constraints",
            variant,
            formulation.model.num_vars(),
            formulation.model.num_constrs()
        );

        formulation
    }

    fn add_group<F>(&mut self, group: Group, add: F)
    where
        F: FnOnce(&mut Self),
    {
        debug_assert!(self.groups.iter().all(|(g, _)| *g != group));
        let start = self.model.num_constrs();
        add(self);
        let end = self.model.num_constrs();
        log::debug!("{group:?}: {} constraints", end - start);
        self.groups.push((group, start..end));
    }

    /// Every customer is left exactly once by exactly one vehicle
    fn add_covering(&mut self, instance: &Instance) {
        for i in instance.all_customers() {
            let mut lhs = LinExpr::new();
            for k in instance.all_vehicles() {
                for j in instance.all_nodes_except(i) {
                    if j != instance.origin() {
                        lhs.add_term(1.0, self.vars.arc(i, j, k));
                    }
                }
            }
            self.model.add_constr(&format!("Cov_{i}"), lhs.equal(1.0));
        }
    }

    /// A vehicle entering a customer also leaves it
    fn add_flow(&mut self, instance: &Instance) {
        let origin = instance.origin();
        let destination = instance.destination();
        for i in instance.all_customers() {
            for k in instance.all_vehicles() {
                let mut lhs = LinExpr::new();
                for j in instance.all_nodes_except(i) {
                    if j != origin {
                        lhs.add_term(1.0, self.vars.arc(i, j, k)); // outgoing
                    }
                    if j != destination {
                        lhs.add_term(-1.0, self.vars.arc(j, i, k)); // incoming
                    }
                }
                self.model.add_constr(&format!("Flow_{i}_{k}"), lhs.equal(0.0));
            }
        }
    }

    /// Each vehicle departs at most once and returns as often as it departs
    fn add_depot(&mut self, instance: &Instance) {
        let origin = instance.origin();
        let destination = instance.destination();
        for k in instance.all_vehicles() {
            let mut lhs = LinExpr::new();
            for j in instance.all_customers() {
                lhs.add_term(1.0, self.vars.arc(origin, j, k));
            }
            self.model.add_constr(&format!("Dep_{k}"), lhs.le(1.0));
        }
        for k in instance.all_vehicles() {
            let mut lhs = LinExpr::new();
            for j in instance.all_customers() {
                lhs.add_term(1.0, self.vars.arc(j, destination, k));
                lhs.add_term(-1.0, self.vars.arc(origin, j, k));
            }
            self.model.add_constr(&format!("Ret_{k}"), lhs.equal(0.0));
        }
    }

    fn add_capacity(&mut self, instance: &Instance) {
        let capacity = instance.capacity as f64;
        for k in instance.all_vehicles() {
            let mut lhs = LinExpr::new();
            for i in instance.all_nodes() {
                let demand = instance.demand(i);
                if demand == 0 {
                    continue;
                }
                for j in instance.all_nodes_except(i) {
                    lhs.add_term(demand as f64, self.vars.arc(i, j, k));
                }
            }
            match self.vars.vehicle(k) {
                Some(used) => {
                    lhs.add_term(-capacity, used);
                    self.model.add_constr(&format!("Cap_{k}"), lhs.le(0.0));
                }
                None => {
                    self.model.add_constr(&format!("Cap_{k}"), lhs.le(capacity));
                }
            }
        }
    }

    /// `start[i] + d[i][j] <= start[j] + M (1 - x[i][j][k])`
    fn add_time_propagation(&mut self, instance: &Instance) {
        let pairs = propagation_pairs(instance).collect::<Vec<_>>();
        for k in instance.all_vehicles() {
            for &(i, j) in pairs.iter() {
                let mut lhs = LinExpr::new();
                lhs.add_term(1.0, self.vars.service(i, k));
                lhs.add_term(-1.0, self.vars.service(j, k));
                lhs.add_term(self.big_m, self.vars.arc(i, j, k));
                let rhs = self.big_m - f64::from(instance.distance(i, j));
                self.model.add_constr(&format!("Tp_{i}_{j}_{k}"), lhs.le(rhs));
            }
        }
    }

    fn add_time_windows(&mut self, instance: &Instance) {
        let origin = instance.origin();
        let destination = instance.destination();
        for k in instance.all_vehicles() {
            for i in instance.all_nodes() {
                let window = instance.window(i);
                let ready = f64::from(window.ready);
                let due = f64::from(window.due);
                let start = self.vars.service(i, k);

                // scaled by whether k visits i, or whether k is used at all
                let indicator = match self.vars.vehicle(k) {
                    Some(used) => vec![used],
                    None if i == destination => (0..destination)
                        .map(|j| self.vars.arc(j, destination, k))
                        .collect(),
                    None => instance
                        .all_nodes_except(i)
                        .filter(|j| *j != origin)
                        .map(|j| self.vars.arc(i, j, k))
                        .collect(),
                };

                let pinned = self.variant.has_vehicle_vars() && instance.is_depot(i);
                if pinned {
                    // depot origin starts at its ready time, destination closes at due date
                    let time = if i == origin { ready } else { due };
                    let mut lhs = LinExpr::new();
                    lhs.add_term(1.0, start);
                    for var in indicator.iter() {
                        lhs.add_term(-time, *var);
                    }
                    self.model.add_constr(&format!("Twd_{i}_{k}"), lhs.equal(0.0));
                    continue;
                }

                let mut lower = LinExpr::new();
                lower.add_term(1.0, start);
                for var in indicator.iter() {
                    lower.add_term(-ready, *var);
                }
                self.model.add_constr(&format!("Twl_{i}_{k}"), lower.ge(0.0));

                let mut upper = LinExpr::new();
                upper.add_term(1.0, start);
                for var in indicator.iter() {
                    upper.add_term(-due, *var);
                }
                self.model.add_constr(&format!("Twu_{i}_{k}"), upper.le(0.0));
            }
        }
    }

    /// Leaving the depot requires the vehicle to be in use
    fn add_vehicle_use(&mut self, instance: &Instance) {
        let origin = instance.origin();
        for k in instance.all_vehicles() {
            let Some(used) = self.vars.vehicle(k) else {
                continue;
            };
            for j in instance.all_customers() {
                let mut lhs = LinExpr::new();
                lhs.add_term(1.0, self.vars.arc(origin, j, k));
                lhs.add_term(-1.0, used);
                self.model.add_constr(&format!("Use_{j}_{k}"), lhs.le(0.0));
            }
        }
    }

    /// No self-loops, nothing enters the origin, nothing leaves the destination
    fn add_goodsense(&mut self, instance: &Instance) {
        let origin = instance.origin();
        let destination = instance.destination();
        for k in instance.all_vehicles() {
            let mut loops = LinExpr::new();
            let mut into_origin = LinExpr::new();
            let mut out_of_destination = LinExpr::new();
            for i in instance.all_nodes() {
                loops.add_term(1.0, self.vars.arc(i, i, k));
                into_origin.add_term(1.0, self.vars.arc(i, origin, k));
                out_of_destination.add_term(1.0, self.vars.arc(destination, i, k));
            }
            self.model.add_constr(&format!("Gsl_{k}"), loops.equal(0.0));
            self.model.add_constr(&format!("Gso_{k}"), into_origin.equal(0.0));
            self.model.add_constr(&format!("Gsd_{k}"), out_of_destination.equal(0.0));
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn big_m(&self) -> f64 {
        self.big_m
    }

    pub fn arc(&self, i: NodeId, j: NodeId, k: VehicleId) -> Var {
        self.vars.arc(i, j, k)
    }

    pub fn service(&self, i: NodeId, k: VehicleId) -> Var {
        self.vars.service(i, k)
    }

    pub fn vehicle(&self, k: VehicleId) -> Option<Var> {
        self.vars.vehicle(k)
    }

    /// Rows of one constraint family (empty if the variant does not have it)
    pub fn rows(&self, group: Group) -> &[Constraint] {
        self.groups
            .iter()
            .find(|(g, _)| *g == group)
            .map(|(_, range)| &self.model.constrs()[range.clone()])
            .unwrap_or(&[])
    }

    /// Arcs whose variable is at least [`SELECTION_THRESHOLD`] in `values`
    pub fn selected_arcs(&self, values: &[f64]) -> Vec<Arc> {
        let n = self.vars.num_nodes;
        let mut arcs = Vec::new();
        for k in 0..self.num_vehicles {
            for i in 0..n {
                for j in 0..n {
                    if values[self.vars.arc_index(i, j, k)] >= SELECTION_THRESHOLD {
                        arcs.push(Arc {
                            from: i,
                            to: j,
                            vehicle: k,
                        });
                    }
                }
            }
        }
        arcs
    }

    /// Variable assignment that realizes `routes`, starting service as early as possible.
    ///
    /// Useful as a warm start and to check routes against the rows of the model.
    pub fn encode(&self, instance: &Instance, routes: &RouteSet) -> Vec<f64> {
        debug_assert_eq!(instance.num_customers, self.num_customers);
        let mut assignment = vec![0.0; self.model.num_vars()];

        for (k, route) in routes.iter() {
            for leg in route.nodes().windows(2) {
                assignment[self.vars.arc_index(leg[0], leg[1], k)] = 1.0;
            }
            for (&i, start) in route.nodes().iter().zip(route.schedule(instance)) {
                assignment[self.vars.service_index(i, k)] = start.into();
            }
            if let Some(used) = self.vars.vehicle(k) {
                assignment[used.index()] = 1.0;
                // unvisited nodes of a used vehicle still need a start inside their window
                for i in instance.all_customers() {
                    if !route.nodes().contains(&i) {
                        assignment[self.vars.service_index(i, k)] =
                            instance.window(i).ready.into();
                    }
                }
                let destination = instance.destination();
                assignment[self.vars.service_index(destination, k)] =
                    instance.window(destination).due.into();
            }
        }

        assignment
    }
}
