//! simula - deterministic, rule-driven fault injection
//!
//! The engine sits in a host's operation pipeline and, driven by a small
//! externally editable rule set, forces chosen operations to fail, stall,
//! end their session or take the whole process down.

pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod gate;
pub mod host;
pub mod observability;
pub mod rules;
