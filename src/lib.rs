// Library for the binaries and tests to access modules

pub mod aggregation;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod maintenance_worker;
pub mod metric_repo;
pub mod models;
pub mod routes;
pub mod seed;
pub mod version;

pub use error::{Error, Result};
