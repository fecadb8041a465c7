//! Modules layer - Infrastructure components behind the core boundaries
//!
//! Contains store implementations the services can be wired to.

pub mod memory;
