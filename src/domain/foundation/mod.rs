//! Foundation module - Shared domain primitives.
//!
//! Identifiers, roles, authentication types and error codes that the
//! assistant and snapshot modules build on.

mod auth;
mod errors;
mod ids;
mod role;

pub use auth::{AuthError, AuthenticatedUser};
pub use errors::{ErrorCode, ValidationError};
pub use ids::{ClassId, StudentId, TeacherId, UserId};
pub use role::Role;
