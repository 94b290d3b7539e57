//! Assistant domain - the pure stages of the question pipeline.
//!
//! - `intent` - lexical classification
//! - `time_window` - relative periods resolved to absolute windows
//! - `plan` - scope, filters and caps a retrieval runs under
//! - `aggregates` - attendance rate, risk tier and status counts
//! - `result` - per-intent retrieval outcomes
//! - `prompt` - size-bounded prompt composition
//! - `format` - technical-output heuristics and rewrite prompt

mod aggregates;
mod format;
mod intent;
mod plan;
mod prompt;
mod question;
mod result;
mod time_window;

pub use aggregates::{AttendanceCounts, AttendanceSummary, ExcuseSummary, RiskTier};
pub use format::{humanize_structured, is_technical_looking, parse_structured, rewrite_prompt};
pub use intent::{classify, Intent};
pub use plan::{
    Dataset, RetrievalPlan, RoleConstraints, StatusFilter, StudentScope, STUDENT_ROW_CAP,
    WIDE_ROW_CAP,
};
pub use prompt::{compose, ChatTurn, ComposeOptions, Prompt, Speaker, TRUNCATION_MARKER};
pub use question::Question;
pub use result::{describe_scope, RetrievalResult, CAPABILITIES};
pub use time_window::{Period, TimeWindow};

pub(crate) use intent::normalize;
