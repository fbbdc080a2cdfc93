//! Core domain types
//!
//! This module contains the structures exchanged between the provider
//! client, the session core and the UI layer. They carry no behavior
//! beyond construction helpers and small queries.

pub mod job;
pub mod run;
pub mod schema;
