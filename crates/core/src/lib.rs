pub mod config;
pub mod coord;
pub mod error;

pub use config::Config;
pub use coord::*;
pub use error::*;
