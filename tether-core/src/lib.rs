//! Tether Core
//!
//! Core types and abstractions shared by every Tether crate.
//!
//! This crate contains:
//! - Domain types: job definitions, input schemas and run snapshots
//! - Gateway: the contract a job-execution provider must satisfy

pub mod domain;
pub mod gateway;

pub use gateway::ProviderGateway;
