pub mod tabular_dataset;
pub mod traits;

pub use tabular_dataset::TabularDataset;
pub use traits::Dataset;
