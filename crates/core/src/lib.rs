pub mod config;
pub mod error;
pub mod model;
pub mod params;

pub use config::Config;
pub use error::*;
pub use model::*;
pub use params::{Graph, ParamError, ParamValue, Params, PayloadEntry};
