// Relative to the current file
pub const ELECTRICITY_POPULATION_CSV: &str =
    include_str!("../../../test-data/population/electricity.csv");

pub const FOSSIL_FUEL_POPULATION_CSV: &str =
    include_str!("../../../test-data/population/fossil_fuel.csv");
