pub use billing_data::buildings::{BUILDINGS, building, iter_buildings};
pub use billing_data::population::{ELECTRICITY_POPULATION_CSV, FOSSIL_FUEL_POPULATION_CSV};
pub use billing_data::{BillingArrays, ChangePointTruth};
pub use synthetic::{SyntheticBuilding, piecewise_linear};

mod billing_data;
mod synthetic;
