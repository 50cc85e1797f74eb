use crate::problem::*;
use rand::distributions::{Distribution, Uniform};
use rand_xoshiro::rand_core::SeedableRng;

pub const GRID_SIZE: i32 = 100;
pub const HORIZON: Time = 1000;

const MAX_DEMAND: Load = 30;
const MIN_WIDTH: Time = 30;
const MAX_WIDTH: Time = 200;

/// Random instance on a `GRID_SIZE` square with the depot in the middle.
///
/// The same seed always gives the same instance. Every customer can be served by a
/// dedicated vehicle on time, so with `num_vehicles >= num_customers` and enough capacity
/// the instance is feasible.
pub fn random_instance(
    num_customers: usize,
    num_vehicles: usize,
    capacity: Load,
    seed: u64,
) -> Result<Instance, InstanceError> {
    let mut rng = rand_xoshiro::Xoshiro128StarStar::seed_from_u64(seed);
    let dist_coord = Uniform::from(0..=GRID_SIZE);
    let dist_demand = Uniform::from(1..=MAX_DEMAND);
    let dist_width = Uniform::from(MIN_WIDTH..=MAX_WIDTH);

    let depot = Position::new(f64::from(GRID_SIZE / 2), f64::from(GRID_SIZE / 2));
    let mut sites = vec![Site {
        position: depot,
        demand: 0,
        window: TimeWindow::new(0, HORIZON),
    }];

    for _ in 0..num_customers {
        let position = Position::new(
            f64::from(dist_coord.sample(&mut rng)),
            f64::from(dist_coord.sample(&mut rng)),
        );
        let travel = depot.distance(&position);
        let earliest = travel;
        let latest = HORIZON - travel;
        let ready = Uniform::from(earliest..=latest).sample(&mut rng);
        let due = latest.min(ready + dist_width.sample(&mut rng));
        sites.push(Site {
            position,
            demand: dist_demand.sample(&mut rng),
            window: TimeWindow::new(ready, due),
        });
    }

    let name = format!("random-{seed}");
    Instance::new(
        &name,
        InstanceData::euclidean(num_vehicles, capacity, &sites),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulation::{Formulation, Variant};
    use crate::routes::{Route, RouteSet};

    #[test]
    fn is_reproducible() {
        let first = random_instance(12, 3, 100, 7).unwrap();
        let second = random_instance(12, 3, 100, 7).unwrap();
        let other = random_instance(12, 3, 100, 8).unwrap();
        assert_eq!(first.to_string(), second.to_string());
        assert_ne!(first.to_string(), other.to_string());
        assert_eq!(first.name, "random-7");
    }

    #[test]
    fn stays_within_limits() {
        let instance = random_instance(30, 5, 100, 1).unwrap();
        for i in instance.all_customers() {
            assert!((1..=MAX_DEMAND).contains(&instance.demand(i)));
            let window = instance.window(i);
            assert!(window.ready >= instance.distance(0, i));
            assert!(window.due + instance.distance(i, 0) <= HORIZON);
        }
        assert_eq!(instance.horizon(), HORIZON);
    }

    #[test]
    fn dedicated_vehicles_are_feasible() {
        let num_customers = 6;
        let instance = random_instance(num_customers, num_customers, MAX_DEMAND, 3).unwrap();
        let routes = instance
            .all_customers()
            .map(|i| (i - 1, Route::new(vec![0, i, num_customers + 1])))
            .collect::<RouteSet>();
        assert!(routes.violations(&instance).is_empty());

        for variant in [
            Variant::FixedFleet,
            Variant::VehicleUse { vehicle_cost: 1.0 },
        ] {
            let formulation = Formulation::new(&instance, variant);
            let assignment = formulation.encode(&instance, &routes);
            assert!(formulation.model().violations(&assignment, 1e-6).is_empty());
        }
    }
}
