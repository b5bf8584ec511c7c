pub mod catalog;
pub mod config;
pub mod error;
pub mod io;
pub mod paths;
pub mod repository;
pub mod score;
pub mod session;
pub mod store;
pub mod types;

pub use error::{ErrorKind, ReadinessError, Result};
