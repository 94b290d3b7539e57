//! Lexical intent classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the question is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Attendance,
    Schedule,
    Teacher,
    Classes,
    Excuse,
    Help,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Attendance => "attendance",
            Intent::Schedule => "schedule",
            Intent::Teacher => "teacher",
            Intent::Classes => "classes",
            Intent::Excuse => "excuse",
            Intent::Help => "help",
            Intent::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Checked top to bottom; the first category with a hit wins.
const KEYWORDS: &[(Intent, &[&str])] = &[
    (
        Intent::Attendance,
        &[
            "attendance",
            "attendance rate",
            "absent",
            "absence",
            "absences",
            "absents",
            "present",
            "late",
            "tardy",
            "tardiness",
            "missed class",
            "missed classes",
            "at risk",
        ],
    ),
    (
        Intent::Schedule,
        &[
            "schedule",
            "schedules",
            "timetable",
            "class time",
            "what time",
            "when is",
            "next class",
            "which room",
            "room",
        ],
    ),
    (
        Intent::Excuse,
        &[
            "excuse",
            "excuses",
            "excuse letter",
            "excuse request",
            "excuse requests",
            "leave request",
            "medical certificate",
        ],
    ),
    (
        Intent::Teacher,
        &[
            "teacher",
            "teachers",
            "my teacher",
            "who teaches",
            "instructor",
            "instructors",
            "professor",
            "adviser",
            "advisor",
            "faculty",
        ],
    ),
    (
        Intent::Classes,
        &[
            "class",
            "classes",
            "my classes",
            "subject",
            "subjects",
            "course",
            "courses",
            "enrolled",
            "enrollment",
            "section",
        ],
    ),
    (
        Intent::Help,
        &[
            "help",
            "what can you do",
            "how do i",
            "how to",
            "features",
            "commands",
            "hello",
            "hi",
            "hey",
        ],
    ),
];

/// Lowercases and turns every non-alphanumeric run into a single space,
/// padded so phrases can be matched on word boundaries.
pub(crate) fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    let mut last_space = true;
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            out.push(ch);
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    if !last_space {
        out.push(' ');
    }
    out
}

/// True when `phrase` occurs in `normalized` on word boundaries.
pub(crate) fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    normalized.contains(&format!(" {} ", phrase))
}

/// Maps a question to an intent. Total: never fails, defaults to `Unknown`.
pub fn classify(question: &str) -> Intent {
    let normalized = normalize(question);
    KEYWORDS
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| contains_phrase(&normalized, p)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn attendance_questions() {
        assert_eq!(classify("What's my attendance rate this month?"), Intent::Attendance);
        assert_eq!(classify("How many times was I LATE?"), Intent::Attendance);
        assert_eq!(classify("absences last week"), Intent::Attendance);
    }

    #[test]
    fn attendance_outranks_every_other_intent() {
        assert_eq!(classify("Was I absent in my math class schedule?"), Intent::Attendance);
    }

    #[test]
    fn schedule_outranks_classes_and_teacher() {
        assert_eq!(classify("What is my class schedule?"), Intent::Schedule);
        assert_eq!(classify("When is my teacher's next class"), Intent::Schedule);
    }

    #[test]
    fn excuse_outranks_teacher() {
        assert_eq!(classify("Did my teacher approve my excuse?"), Intent::Excuse);
    }

    #[test]
    fn teacher_and_classes() {
        assert_eq!(classify("Who teaches Physics?"), Intent::Teacher);
        assert_eq!(classify("List my subjects"), Intent::Classes);
    }

    #[test]
    fn help_and_unknown() {
        assert_eq!(classify("hi!"), Intent::Help);
        assert_eq!(classify("what can you do"), Intent::Help);
        assert_eq!(classify("tell me a joke"), Intent::Unknown);
        assert_eq!(classify(""), Intent::Unknown);
    }

    #[test]
    fn matches_on_word_boundaries_only() {
        // "latest" contains "late"; "this" contains "hi"
        assert_eq!(classify("the latest news on this"), Intent::Unknown);
        assert_eq!(classify("classroom"), Intent::Unknown);
    }

    #[test]
    fn normalize_collapses_punctuation() {
        assert_eq!(normalize("What's  my--rate?"), " what s my rate ");
        assert_eq!(normalize(""), " ");
    }

    proptest! {
        #[test]
        fn classify_is_total_and_deterministic(text in ".{0,200}") {
            let first = classify(&text);
            prop_assert_eq!(first, classify(&text));
        }

        #[test]
        fn keyword_anywhere_is_detected(prefix in "[a-z ]{0,20}", suffix in "[a-z ]{0,20}") {
            let text = format!("{} attendance {}", prefix, suffix);
            prop_assert_eq!(classify(&text), Intent::Attendance);
        }
    }
}
