//! geoselect core - layer models, errors, configuration and vector I/O
//!
//! Geometry work (reprojection, buffers, predicates, selection) lives in
//! `geoselect-geo`; this crate holds what it operates on.

pub mod config;
pub mod error;
pub mod formats;
pub mod join;
pub mod models;

pub use error::{GeoselectError, Result};
