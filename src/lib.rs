//! convo-rank: score an exported chat archive by future reference value.
//! Hexagonal layout: domain, ports, adapters, use cases.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
