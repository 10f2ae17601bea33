pub mod database_ops;
pub mod error;
pub mod models;
pub mod normalization;
pub mod pipeline;

pub mod util {
    pub mod db;
    pub mod env;
}

pub use error::{PipelineError, Result};
