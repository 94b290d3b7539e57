//! Strongly-typed identifier value objects.
//!
//! The attendance schema keys every table by a `BIGSERIAL`, so identifiers
//! wrap `i64` rather than UUIDs. Keeping them distinct stops a student id
//! from being bound where a user id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw row id.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw row id for binding into queries.
            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

row_id!(
    /// Identifier of a login account (`users.id`).
    UserId
);

row_id!(
    /// Identifier of a student record (`students.id`).
    StudentId
);

row_id!(
    /// Identifier of a teacher record (`teachers.id`).
    TeacherId
);

row_id!(
    /// Identifier of a class (`class_models.id`).
    ClassId
);
