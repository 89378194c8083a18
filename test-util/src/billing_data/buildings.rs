use crate::billing_data::csv_parser::arrays_from_reader;
use crate::billing_data::{BillingArrays, ChangePointTruth};

use include_dir::{Dir, include_dir};
use lazy_static::lazy_static;

const BUILDINGS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/../test-data/buildings");

/// Parameters the bundled billing histories were generated with, in file name order
const TRUTHS: [(&str, ChangePointTruth); 5] = [
    ("office_electricity_5p", [10.0, 20.0, 0.35, -0.012, 0.018]),
    ("office_fossil_fuel_3ph", [15.0, 15.0, 0.1, -0.07, 0.0]),
    ("retail_electricity_3pc", [14.0, 14.0, 0.42, 0.0, 0.025]),
    ("school_electricity_4p", [17.0, 17.0, 0.3, -0.008, 0.015]),
    ("warehouse_electricity_flat", [12.0, 12.0, 0.2, 0.0, 0.0]),
];

/// Three years of monthly billing data of a bundled building, `name` is the file stem
pub fn building(name: &str) -> BillingArrays {
    let file = BUILDINGS_DIR
        .get_file(format!("{name}.csv"))
        .unwrap_or_else(|| panic!("no bundled building {name}"));
    arrays_from_reader(file.contents()).unwrap()
}

pub fn iter_buildings() -> impl Iterator<Item = (&'static str, ChangePointTruth, BillingArrays)> {
    TRUTHS
        .into_iter()
        .map(|(name, truth)| (name, truth, building(name)))
}

lazy_static! {
    pub static ref BUILDINGS: Vec<(&'static str, ChangePointTruth, BillingArrays)> =
        iter_buildings().collect();
}
