mod observation_series;
pub use observation_series::{ObservationSeries, SeriesTail};

mod sorted_array;
pub use sorted_array::SortedArray;
