use crate::billing_data::{BillingArrays, BillingRecord, Error};

use itertools::{Itertools, process_results};
use std::io::Read;

pub(super) fn arrays_from_reader<R: Read>(reader: R) -> Result<BillingArrays, Error> {
    let mut csv_reader = csv::ReaderBuilder::new().from_reader(reader);
    let iter = csv_reader
        .deserialize()
        .map(|record: Result<BillingRecord, _>| record.map(BillingRecord::into_triple));
    let (temperature, eui, days) = process_results(iter, |iter| iter.multiunzip())?;
    Ok(BillingArrays {
        temperature,
        eui,
        days,
    })
}
