//! Small instances shared by the unit tests.

use crate::problem::{Instance, InstanceData, Load, Position, Site, TimeWindow};

/// Depot at the origin of a 10x10 square, one customer on each other corner
pub fn square_data(num_vehicles: usize, capacity: Load) -> InstanceData {
    let customer = |x, y| Site {
        position: Position::new(x, y),
        demand: 10,
        window: TimeWindow::new(0, 500),
    };
    let sites = vec![
        Site {
            position: Position::new(0.0, 0.0),
            demand: 0,
            window: TimeWindow::new(0, 1000),
        },
        customer(10.0, 0.0),
        customer(10.0, 10.0),
        customer(0.0, 10.0),
    ];
    InstanceData::euclidean(num_vehicles, capacity, &sites)
}

pub fn square(num_vehicles: usize, capacity: Load) -> Instance {
    Instance::new("square", square_data(num_vehicles, capacity)).unwrap()
}

/// Customers on a line east of the depot, `(position, ready, due)` each with demand 5
pub fn line(num_vehicles: usize, capacity: Load, customers: &[(f64, i32, i32)]) -> Instance {
    let mut sites = vec![Site {
        position: Position::new(0.0, 0.0),
        demand: 0,
        window: TimeWindow::new(0, 1000),
    }];
    sites.extend(customers.iter().map(|&(x, ready, due)| Site {
        position: Position::new(x, 0.0),
        demand: 5,
        window: TimeWindow::new(ready, due),
    }));
    Instance::new(
        "line",
        InstanceData::euclidean(num_vehicles, capacity, &sites),
    )
    .unwrap()
}
