use crate::problem::*;
use std::collections::BTreeMap;
use std::fmt;

/// Arc variables with at least this value count as selected
pub const SELECTION_THRESHOLD: f64 = 0.5;

/// A selected arc `i -> j` driven by `vehicle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Arc {
    pub from: NodeId,
    pub to: NodeId,
    pub vehicle: VehicleId,
}

/// Node sequence of one vehicle, from the depot origin to the depot destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route(Vec<NodeId>);

impl Route {
    pub fn new(nodes: Vec<NodeId>) -> Self {
        Route(nodes)
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.0
    }

    /// Nodes strictly between origin and destination
    pub fn customers(&self) -> &[NodeId] {
        match self.0.len() {
            0..=2 => &[],
            len => &self.0[1..len - 1],
        }
    }

    pub fn cost(&self, instance: &Instance) -> Time {
        self.0
            .windows(2)
            .map(|leg| instance.distance(leg[0], leg[1]))
            .sum()
    }

    pub fn load(&self, instance: &Instance) -> Load {
        self.0.iter().map(|i| instance.demand(*i)).sum()
    }

    /// Earliest service start at every node of the route, waiting for ready times
    pub fn schedule(&self, instance: &Instance) -> Vec<Time> {
        let mut times = Vec::with_capacity(self.0.len());
        let mut previous: Option<(NodeId, Time)> = None;
        for &node in self.0.iter() {
            let ready = instance.window(node).ready;
            let start = match previous {
                None => ready,
                Some((from, time)) => ready.max(time + instance.distance(from, node)),
            };
            times.push(start);
            previous = Some((node, start));
        }
        times
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = self.0.iter().map(|i| i.to_string()).collect::<Vec<_>>();
        write!(f, "{}", nodes.join(" - "))
    }
}

/// Routes of all used vehicles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSet(BTreeMap<VehicleId, Route>);

impl RouteSet {
    pub fn get(&self, vehicle: VehicleId) -> Option<&Route> {
        self.0.get(&vehicle)
    }

    /// Used vehicles with their routes, by increasing vehicle index
    pub fn iter(&self) -> impl Iterator<Item = (VehicleId, &Route)> {
        self.0.iter().map(|(k, route)| (*k, route))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn cost(&self, instance: &Instance) -> Time {
        self.0.values().map(|route| route.cost(instance)).sum()
    }

    /// Checks coverage, capacity and time windows of the routes against `instance`
    pub fn violations(&self, instance: &Instance) -> Vec<RouteViolation> {
        let mut result = Vec::new();
        let mut visits = vec![0; instance.num_nodes()];

        for (vehicle, route) in self.iter() {
            let nodes = route.nodes();
            if nodes.first() != Some(&instance.origin())
                || nodes.last() != Some(&instance.destination())
                || nodes.iter().any(|i| *i >= instance.num_nodes())
            {
                result.push(RouteViolation::Malformed { vehicle });
                continue;
            }

            for &i in route.customers() {
                visits[i] += 1;
            }

            let load = route.load(instance);
            if load > instance.capacity {
                result.push(RouteViolation::Overloaded {
                    vehicle,
                    load,
                    capacity: instance.capacity,
                });
            }

            for (&node, start) in nodes.iter().zip(route.schedule(instance)) {
                let due = instance.window(node).due;
                if start > due {
                    result.push(RouteViolation::Late {
                        vehicle,
                        node,
                        start,
                        due,
                    });
                }
            }
        }

        for customer in instance.all_customers() {
            match visits[customer] {
                0 => result.push(RouteViolation::Uncovered { customer }),
                1 => {}
                count => result.push(RouteViolation::Repeated { customer, count }),
            }
        }

        result
    }
}

impl FromIterator<(VehicleId, Route)> for RouteSet {
    fn from_iter<I: IntoIterator<Item = (VehicleId, Route)>>(iter: I) -> Self {
        RouteSet(iter.into_iter().collect())
    }
}

impl fmt::Display for RouteSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (vehicle, route) in self.iter() {
            writeln!(f, "Route {vehicle}: {route}")?;
        }
        Ok(())
    }
}

/// Requirement of the instance that a [`RouteSet`] fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteViolation {
    Malformed {
        vehicle: VehicleId,
    },
    Uncovered {
        customer: NodeId,
    },
    Repeated {
        customer: NodeId,
        count: usize,
    },
    Overloaded {
        vehicle: VehicleId,
        load: Load,
        capacity: Load,
    },
    Late {
        vehicle: VehicleId,
        node: NodeId,
        start: Time,
        due: Time,
    },
}

impl fmt::Display for RouteViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteViolation::Malformed { vehicle } => {
                write!(f, "route of vehicle {vehicle} does not run from depot to depot")
            }
            RouteViolation::Uncovered { customer } => {
                write!(f, "customer {customer} is not visited")
            }
            RouteViolation::Repeated { customer, count } => {
                write!(f, "customer {customer} is visited {count} times")
            }
            RouteViolation::Overloaded {
                vehicle,
                load,
                capacity,
            } => write!(f, "vehicle {vehicle} carries {load} > {capacity}"),
            RouteViolation::Late {
                vehicle,
                node,
                start,
                due,
            } => write!(
                f,
                "vehicle {vehicle} starts node {node} at {start}, after due date {due}"
            ),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReconstructError {
    #[error("arc {from} -> {to} uses vehicle {vehicle}, fleet has {num_vehicles}")]
    VehicleOutOfRange {
        from: NodeId,
        to: NodeId,
        vehicle: VehicleId,
        num_vehicles: usize,
    },
    #[error("arc {from} -> {to} of vehicle {vehicle} leaves the {num_nodes} nodes")]
    NodeOutOfRange {
        from: NodeId,
        to: NodeId,
        vehicle: VehicleId,
        num_nodes: usize,
    },
    #[error("vehicle {vehicle} has arcs not connected to its route, node sets {fragments:?}")]
    DisconnectedFragment {
        vehicle: VehicleId,
        fragments: Vec<Vec<NodeId>>,
    },
    #[error("route of vehicle {vehicle} stops at node {last} without reaching the depot")]
    UnreachableDestination { vehicle: VehicleId, last: NodeId },
}

/// Turns selected arcs into one route per vehicle that leaves the depot.
///
/// Every arc has to end up in a route; leftovers (sub-tours, second departures) are
/// reported with their connected node sets.
pub fn reconstruct(
    arcs: &[Arc],
    num_customers: usize,
    num_vehicles: usize,
) -> Result<RouteSet, ReconstructError> {
    let num_nodes = num_customers + 2;
    let origin = 0;
    let destination = num_customers + 1;

    for arc in arcs.iter() {
        if arc.vehicle >= num_vehicles {
            return Err(ReconstructError::VehicleOutOfRange {
                from: arc.from,
                to: arc.to,
                vehicle: arc.vehicle,
                num_vehicles,
            });
        }
        if arc.from >= num_nodes || arc.to >= num_nodes {
            return Err(ReconstructError::NodeOutOfRange {
                from: arc.from,
                to: arc.to,
                vehicle: arc.vehicle,
                num_nodes,
            });
        }
    }

    let mut legs_by_vehicle: BTreeMap<VehicleId, Vec<(NodeId, NodeId)>> = BTreeMap::new();
    for arc in arcs.iter() {
        legs_by_vehicle
            .entry(arc.vehicle)
            .or_default()
            .push((arc.from, arc.to));
    }

    let mut routes = BTreeMap::new();
    for (vehicle, legs) in legs_by_vehicle {
        let mut consumed = vec![false; legs.len()];
        let mut visited = vec![false; num_nodes];
        visited[origin] = true;
        let mut path = vec![origin];
        let mut returned = false;

        if legs.iter().any(|(i, _)| *i == origin) {
            for _ in 0..legs.len() {
                let mut progress = false;
                for (leg, &(i, j)) in legs.iter().enumerate() {
                    if consumed[leg] || returned || path.last() != Some(&i) {
                        continue;
                    }
                    if j == origin {
                        // closing the tour at the origin copy of the depot
                        consumed[leg] = true;
                        returned = true;
                        progress = true;
                    } else if !visited[j] {
                        consumed[leg] = true;
                        visited[j] = true;
                        path.push(j);
                        progress = true;
                    }
                }
                if !progress || returned || path.last() == Some(&destination) {
                    break;
                }
            }
        }

        let leftover = legs
            .iter()
            .zip(consumed.iter())
            .filter(|(_, used)| !**used)
            .map(|(leg, _)| *leg)
            .collect::<Vec<_>>();
        if !leftover.is_empty() {
            return Err(ReconstructError::DisconnectedFragment {
                vehicle,
                fragments: fragments(&leftover, num_nodes),
            });
        }

        let last = path.last().copied().unwrap_or(origin);
        if last != destination {
            if !returned {
                return Err(ReconstructError::UnreachableDestination { vehicle, last });
            }
            path.push(destination);
        }

        log::debug!("Vehicle {vehicle} drives {} arcs", legs.len());
        routes.insert(vehicle, Route::new(path));
    }

    Ok(RouteSet(routes))
}

/// Connected node sets touched by `legs`
fn fragments(legs: &[(NodeId, NodeId)], num_nodes: usize) -> Vec<Vec<NodeId>> {
    let mut uf = partitions::partition_vec![(); num_nodes];
    let mut touched = vec![false; num_nodes];
    for &(i, j) in legs.iter() {
        uf.union(i, j);
        touched[i] = true;
        touched[j] = true;
    }

    let mut result = Vec::new();
    for set in uf.all_sets() {
        let mut nodes = set.map(|(index, _)| index).collect::<Vec<_>>();
        if nodes.iter().any(|i| touched[*i]) {
            nodes.sort_unstable();
            result.push(nodes);
        }
    }
    result.sort();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn arcs(vehicle: VehicleId, path: &[NodeId]) -> Vec<Arc> {
        path.windows(2)
            .map(|leg| Arc {
                from: leg[0],
                to: leg[1],
                vehicle,
            })
            .collect()
    }

    mod reconstruct {
        use super::*;
        use proptest::prelude::*;
        use rand::seq::SliceRandom;
        use rand_xoshiro::rand_core::SeedableRng;

        #[test]
        fn stitches_arcs_in_any_order() {
            let mut input = arcs(0, &[0, 3, 5, 7, 6, 9]);
            input.reverse();
            let routes = reconstruct(&input, 8, 1).unwrap();
            assert_eq!(routes.get(0).unwrap().nodes(), &[0, 3, 5, 7, 6, 9]);
        }

        #[test]
        fn appends_destination_after_return_to_origin() {
            let input = arcs(0, &[0, 3, 5, 7, 6, 0]);
            let routes = reconstruct(&input, 8, 1).unwrap();
            assert_eq!(routes.get(0).unwrap().nodes(), &[0, 3, 5, 7, 6, 9]);
        }

        #[test]
        fn handles_single_customer() {
            let routes = reconstruct(&arcs(0, &[0, 1, 2]), 1, 1).unwrap();
            assert_eq!(routes.get(0).unwrap().nodes(), &[0, 1, 2]);
            assert_eq!(routes.get(0).unwrap().customers(), &[1]);
        }

        #[test]
        fn omits_unused_vehicles() {
            let mut input = arcs(2, &[0, 1, 4]);
            input.extend(arcs(0, &[0, 3, 2, 4]));
            let routes = reconstruct(&input, 3, 3).unwrap();
            assert_eq!(routes.len(), 2);
            assert!(routes.get(1).is_none());
            assert_eq!(
                routes.iter().map(|(k, _)| k).collect::<Vec<_>>(),
                vec![0, 2]
            );
        }

        #[test]
        fn accepts_no_arcs() {
            assert!(reconstruct(&[], 3, 2).unwrap().is_empty());
        }

        #[test]
        fn rejects_subtour() {
            let mut input = arcs(1, &[0, 1, 4]);
            input.extend(arcs(1, &[2, 3, 2]));
            assert_eq!(
                reconstruct(&input, 3, 2).unwrap_err(),
                ReconstructError::DisconnectedFragment {
                    vehicle: 1,
                    fragments: vec![vec![2, 3]],
                }
            );
        }

        #[test]
        fn rejects_arcs_without_departure() {
            let input = arcs(0, &[1, 2, 4]);
            assert!(matches!(
                reconstruct(&input, 3, 1),
                Err(ReconstructError::DisconnectedFragment { vehicle: 0, .. })
            ));
        }

        #[test]
        fn rejects_second_departure() {
            let mut input = arcs(0, &[0, 1, 4]);
            input.extend(arcs(0, &[0, 2, 4]));
            assert!(matches!(
                reconstruct(&input, 3, 1),
                Err(ReconstructError::DisconnectedFragment { .. })
            ));
        }

        #[test]
        fn rejects_dead_end() {
            let input = arcs(0, &[0, 2, 1]);
            assert_eq!(
                reconstruct(&input, 3, 1).unwrap_err(),
                ReconstructError::UnreachableDestination {
                    vehicle: 0,
                    last: 1
                }
            );
        }

        #[test]
        fn rejects_out_of_range_indices() {
            assert!(matches!(
                reconstruct(&arcs(2, &[0, 1, 4]), 3, 2),
                Err(ReconstructError::VehicleOutOfRange { vehicle: 2, .. })
            ));
            assert!(matches!(
                reconstruct(&arcs(0, &[0, 5]), 3, 2),
                Err(ReconstructError::NodeOutOfRange { to: 5, .. })
            ));
        }

        proptest! {
            #[test]
            fn recovers_shuffled_routes(
                num_customers in 1usize..15,
                num_vehicles in 1usize..5,
                seed in any::<u64>(),
            ) {
                let mut rng = rand_xoshiro::Xoshiro128StarStar::seed_from_u64(seed);
                let mut customers = (1..=num_customers).collect::<Vec<_>>();
                customers.shuffle(&mut rng);

                let chunk_size = num_customers.div_ceil(num_vehicles);
                let mut expected = BTreeMap::new();
                let mut input = Vec::new();
                for (vehicle, chunk) in customers.chunks(chunk_size).enumerate() {
                    let mut path = vec![0];
                    path.extend_from_slice(chunk);
                    path.push(num_customers + 1);
                    input.extend(arcs(vehicle, &path));
                    expected.insert(vehicle, Route::new(path));
                }
                input.shuffle(&mut rng);

                let routes = reconstruct(&input, num_customers, num_vehicles).unwrap();
                prop_assert_eq!(routes, RouteSet(expected));
            }
        }
    }

    mod route {
        use super::*;

        #[test]
        fn computes_cost_and_load() {
            let instance = fixtures::square(1, 100);
            let route = Route::new(vec![0, 1, 2, 3, 4]);
            assert_eq!(route.cost(&instance), 40);
            assert_eq!(route.load(&instance), 30);
            assert_eq!(route.to_string(), "0 - 1 - 2 - 3 - 4");
        }

        #[test]
        fn waits_for_ready_time() {
            let instance = fixtures::line(1, 100, &[(10.0, 50, 100), (20.0, 0, 100)]);
            let route = Route::new(vec![0, 1, 2, 3]);
            assert_eq!(route.schedule(&instance), vec![0, 50, 60, 80]);
        }
    }

    mod route_set {
        use super::*;

        fn route_set(list: &[(VehicleId, &[NodeId])]) -> RouteSet {
            list.iter()
                .map(|(k, nodes)| (*k, Route::new(nodes.to_vec())))
                .collect()
        }

        #[test]
        fn accepts_feasible_routes() {
            let instance = fixtures::square(2, 20);
            let routes = route_set(&[(0, &[0, 1, 2, 4]), (1, &[0, 3, 4])]);
            assert!(routes.violations(&instance).is_empty());
            assert_eq!(routes.cost(&instance), 54);
            assert_eq!(routes.to_string(), "Route 0: 0 - 1 - 2 - 4\nRoute 1: 0 - 3 - 4\n");
        }

        #[test]
        fn reports_coverage_and_capacity() {
            let instance = fixtures::square(2, 15);
            let routes = route_set(&[(0, &[0, 1, 2, 4]), (1, &[0, 2, 4])]);
            assert_eq!(
                routes.violations(&instance),
                vec![
                    RouteViolation::Overloaded {
                        vehicle: 0,
                        load: 20,
                        capacity: 15
                    },
                    RouteViolation::Repeated {
                        customer: 2,
                        count: 2
                    },
                    RouteViolation::Uncovered { customer: 3 },
                ]
            );
        }

        #[test]
        fn reports_late_service() {
            let instance = fixtures::line(1, 100, &[(10.0, 0, 40), (40.0, 0, 400)]);
            let routes = route_set(&[(0, &[0, 2, 1, 3])]);
            assert_eq!(
                routes.violations(&instance),
                vec![RouteViolation::Late {
                    vehicle: 0,
                    node: 1,
                    start: 70,
                    due: 40
                }]
            );
        }

        #[test]
        fn reports_malformed_route() {
            let instance = fixtures::square(1, 100);
            let routes = route_set(&[(0, &[0, 1, 2, 3])]);
            assert!(routes
                .violations(&instance)
                .contains(&RouteViolation::Malformed { vehicle: 0 }));
        }
    }
}
