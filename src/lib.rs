//! Attendify Assistant - role-aware chatbot for the attendance portal.
//!
//! Answers natural-language questions about attendance, excuses, schedules
//! and rosters by classifying the question, fetching a scoped slice of the
//! school records, and asking a local language model to phrase the reply.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
