//! Reader for instances in the format of Solomon's VRPTW benchmark.
//!
//! ```text
//! C101
//!
//! VEHICLE
//! NUMBER     CAPACITY
//!   25         200
//!
//! CUSTOMER
//! CUST NO.  XCOORD.   YCOORD.    DEMAND   READY TIME  DUE DATE   SERVICE   TIME
//!
//!     0      40         50          0          0       1236          0
//!     1      45         68         10        912        967         90
//! ```
//!
//! Service times are read but not used.

use crate::problem::*;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub const MAX_CUSTOMERS: usize = 100;

const FLEET_LINE: usize = 4;
const FIRST_DATA_LINE: usize = 9;
const FIELDS: usize = 7;

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("number of customers must be in 1..={MAX_CUSTOMERS}, got {0}")]
    CustomerCount(usize),
    #[error("instance has {available} customers, {requested} requested")]
    TooFewCustomers { requested: usize, available: usize },
    #[error(transparent)]
    Instance(#[from] InstanceError),
}

/// Reads the depot and the first `num_customers` customers of the file at `path`; the
/// instance is named after the file stem
pub fn read(path: &Path, num_customers: usize) -> Result<Instance, ReadError> {
    let contents = fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();
    read_from_str(&name, &contents, num_customers)
}

pub fn read_from_str(
    name: &str,
    contents: &str,
    num_customers: usize,
) -> Result<Instance, ReadError> {
    if !(1..=MAX_CUSTOMERS).contains(&num_customers) {
        return Err(ReadError::CustomerCount(num_customers));
    }

    let lines = contents.lines().collect::<Vec<_>>();
    let fleet = lines.get(FLEET_LINE).ok_or_else(|| ReadError::Parse {
        line: FLEET_LINE + 1,
        message: "missing vehicle number and capacity".to_string(),
    })?;
    let mut iter = fleet.split_whitespace();
    let num_vehicles = parse_field::<usize>(iter.next(), FLEET_LINE, "vehicle number")?;
    let capacity = parse_field::<Load>(iter.next(), FLEET_LINE, "capacity")?;

    let mut sites = Vec::with_capacity(num_customers + 1);
    for (index, line) in lines.iter().enumerate().skip(FIRST_DATA_LINE) {
        if sites.len() == num_customers + 1 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        sites.push(parse_site(line, index)?);
    }
    if sites.len() < num_customers + 1 {
        return Err(ReadError::TooFewCustomers {
            requested: num_customers,
            available: sites.len().saturating_sub(1),
        });
    }

    let data = InstanceData::euclidean(num_vehicles, capacity, &sites);
    let instance = Instance::new(name, data)?;
    log::info!(
        "Read {name} with {num_customers} customers, {num_vehicles} vehicles of capacity {capacity}"
    );

    Ok(instance)
}

fn parse_site(line: &str, index: usize) -> Result<Site, ReadError> {
    let fields = line.split_whitespace().collect::<Vec<_>>();
    if fields.len() != FIELDS {
        return Err(ReadError::Parse {
            line: index + 1,
            message: format!("expected {FIELDS} fields, found {}", fields.len()),
        });
    }
    let mut iter = fields.into_iter();
    let _id = parse_field::<usize>(iter.next(), index, "customer number")?;
    let x = parse_field::<f64>(iter.next(), index, "x coordinate")?;
    let y = parse_field::<f64>(iter.next(), index, "y coordinate")?;
    let demand = parse_field::<Load>(iter.next(), index, "demand")?;
    let ready = parse_field::<Time>(iter.next(), index, "ready time")?;
    let due = parse_field::<Time>(iter.next(), index, "due date")?;
    let _service = parse_field::<Time>(iter.next(), index, "service time")?;

    Ok(Site {
        position: Position::new(x, y),
        demand,
        window: TimeWindow::new(ready, due),
    })
}

fn parse_field<T>(field: Option<&str>, index: usize, what: &str) -> Result<T, ReadError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let field = field.ok_or_else(|| ReadError::Parse {
        line: index + 1,
        message: format!("missing {what}"),
    })?;
    field.parse::<T>().map_err(|err| ReadError::Parse {
        line: index + 1,
        message: format!("invalid {what} {field:?}: {err}"),
    })
}
