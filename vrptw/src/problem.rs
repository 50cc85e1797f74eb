use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Position {
        Position { x, y }
    }

    fn real_distance(&self, other: &Self) -> f64 {
        let xdist = self.x - other.x;
        let ydist = self.y - other.y;
        f64::sqrt(xdist * xdist + ydist * ydist)
    }

    pub fn distance(&self, other: &Self) -> Time {
        self.real_distance(other).round() as Time
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

pub type NodeId = usize;
pub type SiteId = usize;
pub type VehicleId = usize;
pub type Load = usize;
/// Time and travel cost share one integer unit
pub type Time = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub ready: Time,
    pub due: Time,
}

impl TimeWindow {
    pub fn new(ready: Time, due: Time) -> Self {
        TimeWindow { ready, due }
    }

    pub fn contains(&self, time: Time) -> bool {
        self.ready <= time && time <= self.due
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.ready, self.due)
    }
}

/// A physical location with its service requirements, as read from instance files
#[derive(Debug, Clone)]
pub struct Site {
    pub position: Position,
    pub demand: Load,
    pub window: TimeWindow,
}

/// A node of the routing graph.
///
/// The depot shows up twice, as origin (node `0`) and destination (node `n+1`); both refer
/// to the same site.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub site: SiteId,
    pub demand: Load,
    pub window: TimeWindow,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InstanceError {
    #[error("the fleet must have at least one vehicle")]
    NoVehicles,
    #[error("vehicle capacity must be positive")]
    NoCapacity,
    #[error("{field} has {found} entries, expected {expected}")]
    Length {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("node {node} has time window [{ready}, {due}]")]
    InvalidWindow { node: NodeId, ready: Time, due: Time },
    #[error("depot node {node} has demand {demand}, expected 0")]
    DepotDemand { node: NodeId, demand: Load },
    #[error("depot origin and destination differ in their distances to node {node}")]
    DepotMismatch { node: NodeId },
    #[error("distance from {from} to {to} is negative ({value})")]
    NegativeDistance { from: NodeId, to: NodeId, value: Time },
    #[error("distance from {from} to {to} differs from distance back")]
    AsymmetricDistance { from: NodeId, to: NodeId },
    #[error("distance from node {node} to itself is not 0")]
    NonzeroDiagonal { node: NodeId },
}

/// Raw instance data indexed by node `0..=n+1`, depot at both ends
#[derive(Debug, Clone)]
pub struct InstanceData {
    pub num_vehicles: usize,
    pub capacity: Load,
    pub demands: Vec<Load>,
    pub ready: Vec<Time>,
    pub due: Vec<Time>,
    pub distances: Vec<Vec<Time>>,
}

impl InstanceData {
    /// Builds the data from `sites[0]` (the depot) and customer sites, using rounded
    /// Euclidean distances
    pub fn euclidean(num_vehicles: usize, capacity: Load, sites: &[Site]) -> Self {
        // node n+1 is a copy of the depot
        let node_sites = (0..sites.len())
            .chain(std::iter::once(0))
            .map(|s| &sites[s])
            .collect::<Vec<_>>();

        InstanceData {
            num_vehicles,
            capacity,
            demands: node_sites.iter().map(|site| site.demand).collect(),
            ready: node_sites.iter().map(|site| site.window.ready).collect(),
            due: node_sites.iter().map(|site| site.window.due).collect(),
            distances: node_sites
                .iter()
                .map(|from| {
                    node_sites
                        .iter()
                        .map(|to| from.position.distance(&to.position))
                        .collect()
                })
                .collect(),
        }
    }
}

/// A validated VRPTW instance
#[derive(Debug, Clone)]
pub struct Instance {
    pub name: String,
    pub num_customers: usize,
    pub num_vehicles: usize,
    pub capacity: Load,
    nodes: Vec<Node>,
    distances: Vec<Vec<Time>>,
}

impl Instance {
    pub fn new(name: &str, data: InstanceData) -> Result<Instance, InstanceError> {
        if data.num_vehicles == 0 {
            return Err(InstanceError::NoVehicles);
        }
        if data.capacity == 0 {
            return Err(InstanceError::NoCapacity);
        }

        // at least both depot nodes
        let num_nodes = data.demands.len().max(2);
        let check_length = |field: &'static str, found: usize| {
            if found == num_nodes {
                Ok(())
            } else {
                Err(InstanceError::Length {
                    field,
                    expected: num_nodes,
                    found,
                })
            }
        };
        check_length("demands", data.demands.len())?;
        check_length("ready times", data.ready.len())?;
        check_length("due dates", data.due.len())?;
        check_length("distance rows", data.distances.len())?;
        for row in data.distances.iter() {
            check_length("distance columns", row.len())?;
        }

        let destination = num_nodes - 1;
        for node in [0, destination] {
            if data.demands[node] != 0 {
                return Err(InstanceError::DepotDemand {
                    node,
                    demand: data.demands[node],
                });
            }
        }
        for node in 0..num_nodes {
            let (ready, due) = (data.ready[node], data.due[node]);
            if ready < 0 || ready > due {
                return Err(InstanceError::InvalidWindow { node, ready, due });
            }
        }

        for from in 0..num_nodes {
            if data.distances[from][from] != 0 {
                return Err(InstanceError::NonzeroDiagonal { node: from });
            }
            for to in 0..num_nodes {
                let value = data.distances[from][to];
                if value < 0 {
                    return Err(InstanceError::NegativeDistance { from, to, value });
                }
                if value != data.distances[to][from] {
                    return Err(InstanceError::AsymmetricDistance { from, to });
                }
            }
            if data.distances[0][from] != data.distances[destination][from] {
                return Err(InstanceError::DepotMismatch { node: from });
            }
        }

        let nodes = (0..num_nodes)
            .map(|id| Node {
                id,
                site: if id == destination { 0 } else { id },
                demand: data.demands[id],
                window: TimeWindow::new(data.ready[id], data.due[id]),
            })
            .collect();

        Ok(Instance {
            name: name.to_string(),
            num_customers: num_nodes - 2,
            num_vehicles: data.num_vehicles,
            capacity: data.capacity,
            nodes,
            distances: data.distances,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Node where every route starts
    pub fn origin(&self) -> NodeId {
        0
    }

    /// Node where every route ends
    pub fn destination(&self) -> NodeId {
        self.num_customers + 1
    }

    pub fn is_depot(&self, node: NodeId) -> bool {
        self.nodes[node].site == 0
    }

    pub fn node(&self, node: NodeId) -> &Node {
        &self.nodes[node]
    }

    pub fn demand(&self, node: NodeId) -> Load {
        self.nodes[node].demand
    }

    pub fn window(&self, node: NodeId) -> TimeWindow {
        self.nodes[node].window
    }

    pub fn distance(&self, from: NodeId, to: NodeId) -> Time {
        self.distances[from][to]
    }

    pub fn max_distance(&self) -> Time {
        self.distances
            .iter()
            .flat_map(|row| row.iter())
            .copied()
            .max()
            .unwrap_or(0)
    }

    /// Latest due date over all nodes
    pub fn horizon(&self) -> Time {
        self.nodes
            .iter()
            .map(|node| node.window.due)
            .max()
            .unwrap_or(0)
    }

    pub fn total_demand(&self) -> Load {
        self.all_customers().map(|i| self.demand(i)).sum()
    }

    pub fn all_vehicles(&self) -> impl Iterator<Item = VehicleId> {
        0..self.num_vehicles
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = NodeId> {
        0..self.num_nodes()
    }

    pub fn all_nodes_except(&self, exception: NodeId) -> impl Iterator<Item = NodeId> {
        self.all_nodes().filter(move |i| *i != exception)
    }

    pub fn all_customers(&self) -> impl Iterator<Item = NodeId> {
        1..self.num_nodes() - 1
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Instance {} with {} customers and {} vehicles of capacity {}:",
            self.name, self.num_customers, self.num_vehicles, self.capacity
        )?;
        for node in self.nodes.iter() {
            writeln!(
                f,
                "    Node {} (site {}) demand {}, window {}",
                node.id, node.site, node.demand, node.window
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    mod position {
        use super::*;

        #[test]
        fn computes_zero_distance() {
            let pos1 = Position::new(12.5, 23.0);
            let pos2 = Position::new(12.5, 23.0);
            assert_eq!(pos1.distance(&pos2), 0);
            assert_eq!(pos2.distance(&pos1), 0);
        }

        #[test]
        fn computes_horizontal_distance() {
            let pos1 = Position::new(12.5, 23.0);
            let pos2 = Position::new(22.5, 23.0);
            assert_eq!(pos1.distance(&pos2), 10);
            assert_eq!(pos2.distance(&pos1), 10);
        }

        #[test]
        fn computes_diagonal_distance_rounded_down() {
            let pos1 = Position::new(12.5, 23.0);
            let pos2 = Position::new(13.5, 24.0);
            assert_eq!(pos1.distance(&pos2), 1);
        }

        #[test]
        fn computes_diagonal_distance_rounded_up() {
            let pos1 = Position::new(12.5, 23.0);
            let pos2 = Position::new(14.0, 24.5);
            assert_eq!(pos1.distance(&pos2), 2);
        }
    }

    mod instance {
        use super::*;

        #[test]
        fn splits_depot_into_origin_and_destination() {
            let instance = fixtures::square(2, 100);
            assert_eq!(instance.num_customers, 3);
            assert_eq!(instance.num_nodes(), 5);
            assert_eq!(instance.origin(), 0);
            assert_eq!(instance.destination(), 4);
            assert_eq!(instance.node(4).site, 0);
            assert!(instance.is_depot(0));
            assert!(instance.is_depot(4));
            assert!(!instance.is_depot(2));
            assert_eq!(instance.distance(0, 2), instance.distance(4, 2));
            assert_eq!(instance.distance(0, 4), 0);
        }

        #[test]
        fn iterates_customers_only() {
            let instance = fixtures::square(1, 100);
            assert_eq!(instance.all_customers().collect::<Vec<_>>(), vec![1, 2, 3]);
            assert_eq!(instance.total_demand(), 30);
            assert_eq!(instance.horizon(), 1000);
        }

        #[test]
        fn accepts_empty_customer_set() {
            let data = InstanceData {
                num_vehicles: 1,
                capacity: 10,
                demands: vec![0, 0],
                ready: vec![0, 0],
                due: vec![100, 100],
                distances: vec![vec![0, 0], vec![0, 0]],
            };
            let instance = Instance::new("empty", data).unwrap();
            assert_eq!(instance.num_customers, 0);
            assert_eq!(instance.all_customers().count(), 0);
        }

        #[test]
        fn rejects_empty_fleet() {
            let mut data = fixtures::square_data(1, 100);
            data.num_vehicles = 0;
            assert_eq!(
                Instance::new("bad", data).unwrap_err(),
                InstanceError::NoVehicles
            );
        }

        #[test]
        fn rejects_inverted_window() {
            let mut data = fixtures::square_data(1, 100);
            data.ready[2] = 600;
            data.due[2] = 500;
            assert_eq!(
                Instance::new("bad", data).unwrap_err(),
                InstanceError::InvalidWindow {
                    node: 2,
                    ready: 600,
                    due: 500
                }
            );
        }

        #[test]
        fn rejects_wrong_lengths() {
            let mut data = fixtures::square_data(1, 100);
            data.due.pop();
            assert!(matches!(
                Instance::new("bad", data),
                Err(InstanceError::Length {
                    field: "due dates",
                    ..
                })
            ));
        }

        #[test]
        fn rejects_asymmetric_distances() {
            let mut data = fixtures::square_data(1, 100);
            data.distances[1][2] += 1;
            assert!(matches!(
                Instance::new("bad", data),
                Err(InstanceError::AsymmetricDistance { .. })
            ));
        }

        #[test]
        fn rejects_depot_demand() {
            let mut data = fixtures::square_data(1, 100);
            data.demands[4] = 3;
            assert_eq!(
                Instance::new("bad", data).unwrap_err(),
                InstanceError::DepotDemand { node: 4, demand: 3 }
            );
        }

        #[test]
        fn rejects_diverging_depot_copies() {
            let mut data = fixtures::square_data(1, 100);
            data.distances[4][1] += 1;
            data.distances[1][4] += 1;
            assert_eq!(
                Instance::new("bad", data).unwrap_err(),
                InstanceError::DepotMismatch { node: 1 }
            );
        }
    }
}
