use serde::Deserialize;

#[derive(Deserialize)]
pub(super) struct BillingRecord {
    temperature: f64,
    eui: f64,
    days: f64,
}

impl BillingRecord {
    pub(super) fn into_triple(self) -> (f64, f64, f64) {
        (self.temperature, self.eui, self.days)
    }
}
