//! Request intake catalog: request type definitions, their properties, and the
//! extension resolver that merges inherited properties on demand.

pub mod catalog;
pub mod config;
pub mod error;
pub mod request_types;
pub mod telemetry;
