//! Carina Core
//!
//! Core library for an infrastructure management tool: the resource model,
//! attribute schemas, and the Provider trait that cloud providers implement.

pub mod provider;
pub mod resource;
pub mod schema;
