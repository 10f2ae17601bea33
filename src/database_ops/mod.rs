pub mod clean_dataset;
pub mod games;
pub mod steam;
