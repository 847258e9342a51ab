//! # Rules
//!
//! The rule model, the store gateway the rules live behind, the in-memory
//! registry the engine consults, and the validated administrative surface.

pub mod admin;
pub mod errors;
pub mod registry;
pub mod rule;
pub mod store;

pub use admin::RuleAdmin;
pub use errors::{StoreError, StoreResult};
pub use registry::{RuleRegistry, SkippedRow};
pub use rule::{Action, Rule, RuleRow, MAX_NAME_LEN};
pub use store::{FileRuleStore, MemRuleStore, RuleStore};
