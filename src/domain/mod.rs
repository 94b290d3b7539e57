//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, roles, auth types, errors)
//! - `school` - Read models over classes, attendance and excuses
//! - `snapshot` - Cached, role-scoped picture of an account
//! - `assistant` - Pure stages of the question pipeline

pub mod assistant;
pub mod foundation;
pub mod school;
pub mod snapshot;
