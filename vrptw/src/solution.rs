use crate::problem::*;
use crate::routes::{Route, RouteSet};
use milp::Status;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A route with the figures derived from the instance
#[derive(Debug, Clone)]
pub struct RouteReport {
    pub vehicle: VehicleId,
    pub route: Route,
    pub cost: Time,
    pub load: Load,
    pub schedule: Vec<Time>,
}

#[derive(Debug, Clone)]
pub struct Solution {
    pub instance: String,
    pub num_customers: usize,
    pub status: Status,
    pub objective: f64,
    pub routes: RouteSet,
    pub elapsed: Duration,
    reports: Vec<RouteReport>,
}

impl Solution {
    pub fn new(
        instance: &Instance,
        status: Status,
        objective: f64,
        routes: RouteSet,
        elapsed: Duration,
    ) -> Self {
        let reports = routes
            .iter()
            .map(|(vehicle, route)| RouteReport {
                vehicle,
                route: route.clone(),
                cost: route.cost(instance),
                load: route.load(instance),
                schedule: route.schedule(instance),
            })
            .collect();

        Solution {
            instance: instance.name.clone(),
            num_customers: instance.num_customers,
            status,
            objective,
            routes,
            elapsed,
            reports,
        }
    }

    pub fn reports(&self) -> &[RouteReport] {
        &self.reports
    }

    /// Travel cost of all routes, without vehicle costs
    pub fn travel_cost(&self) -> Time {
        self.reports.iter().map(|report| report.cost).sum()
    }

    pub fn file_name(&self) -> String {
        format!("results-{}-{}.txt", self.instance, self.num_customers)
    }

    /// Writes the solution into `dir`, creating it if necessary, and returns the file path
    pub fn write_results(&self, dir: &Path) -> std::io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        fs::write(&path, self.to_string())?;
        Ok(path)
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = self.elapsed.as_secs();
        writeln!(f, "Instance: {}", self.instance)?;
        writeln!(f, "Number of customers: {}", self.num_customers)?;
        writeln!(f, "MILP exact cost solution: {}", self.objective)?;
        writeln!(f, "Travel cost: {}", self.travel_cost())?;
        writeln!(f, "Status: {}", self.status)?;
        writeln!(f, "Time elapsed: {}min{}s", seconds / 60, seconds % 60)?;
        for report in self.reports.iter() {
            writeln!(f, "Route for vehicle {}: {}", report.vehicle, report.route)?;
            let times = report
                .schedule
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>();
            writeln!(
                f,
                "    cost {}, load {}, service start {}",
                report.cost,
                report.load,
                times.join(" - ")
            )?;
        }
        Ok(())
    }
}
