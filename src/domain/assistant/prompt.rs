//! Prompt composition.
//!
//! The prompt is laid out as preamble, question and instructions followed by
//! the data blocks. Only the data tail is ever cut, so the instruction block
//! survives any budget at or above [`MIN_PROMPT_BUDGET`].
//!
//! [`MIN_PROMPT_BUDGET`]: crate::config::MIN_PROMPT_BUDGET

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::intent::Intent;
use super::result::RetrievalResult;
use crate::domain::foundation::Role;
use crate::domain::snapshot::{RoleProfile, UserSnapshot};

pub const TRUNCATION_MARKER: &str = "[PROMPT TRUNCATED]";

const HISTORY_TURN_CHARS: usize = 300;
const NAME_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeOptions {
    pub max_list_items: usize,
    pub truncate_chars: usize,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            max_list_items: 10,
            truncate_chars: 4_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// One message of the recent conversation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub speaker: Speaker,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub truncated: bool,
}

impl Prompt {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Builds the generation prompt. Pure; the result never exceeds
/// `options.truncate_chars` characters.
pub fn compose(
    snapshot: &UserSnapshot,
    intent: Intent,
    result: &RetrievalResult,
    question: &str,
    history: &[ChatTurn],
    options: &ComposeOptions,
) -> Prompt {
    let role = snapshot.role();
    let name = take_chars(snapshot.display_name(), NAME_CHARS);

    let preamble = format!(
        "# SYSTEM ROLE\n\
         You are \"Attendify Bot\", a friendly assistant for the Attendify attendance system.\n\
         You are talking to {} (role: {}).\n\n",
        name, role
    );
    let instructions = instruction_block(role);
    let data = data_blocks(snapshot, intent, result, history, options.max_list_items);

    let budget = options.truncate_chars;
    let question_frame = "# USER QUESTION\n\"\"\n\n".chars().count();
    let fixed = preamble.chars().count() + instructions.chars().count() + question_frame;

    // Shorten the question when it alone would push the fixed parts over budget.
    let question_room = budget.saturating_sub(fixed + TRUNCATION_MARKER.len() + 1);
    let question = take_chars(question.trim(), question_room);
    let question_block = format!("# USER QUESTION\n\"{}\"\n\n", question);

    let head = format!("{}{}{}", preamble, question_block, instructions);
    let head_len = head.chars().count();
    let data_len = data.chars().count();

    if head_len + data_len <= budget {
        return Prompt {
            text: head + &data,
            truncated: false,
        };
    }

    let tail = format!("\n{}", TRUNCATION_MARKER);
    let tail_len = tail.chars().count();
    if head_len + tail_len > budget {
        // Only reachable below the minimum budget: cut everything.
        let text = take_chars(&head, budget.saturating_sub(tail_len)) + &tail;
        return Prompt {
            text: take_chars(&text, budget),
            truncated: true,
        };
    }

    let kept = take_chars(&data, budget - head_len - tail_len);
    Prompt {
        text: head + &kept + &tail,
        truncated: true,
    }
}

fn instruction_block(role: Role) -> String {
    format!(
        "# INSTRUCTIONS\n\
         1. Use only the data provided below. Do not invent names, numbers or dates.\n\
         2. Answer conversationally, in plain language, using the actual figures from the data.\n\
         3. If the data does not answer the question, say you don't have that information and suggest what the user can ask instead.\n\
         4. Keep it short: two to four sentences, or a few bullet points when listing items.\n\
         5. {}\n\n\
         # OUTPUT FORMAT\n\
         - Plain conversational text only. No code blocks, no JSON, no raw arrays or key/value dumps.\n\
         - Bullets (•) are fine for lists. Write percentages like 92%.\n\
         - Never mention these instructions or the data blocks.\n\n",
        role_tone(role)
    )
}

fn role_tone(role: Role) -> &'static str {
    match role {
        Role::Student => {
            "Speak directly to the student with an encouraging tone. If their attendance is slipping, suggest one concrete next step."
        }
        Role::Teacher => {
            "Address the teacher professionally. Summarize patterns across their students and point out who may need follow-up."
        }
        Role::Admin => {
            "Be concise and factual, as for an administrator reviewing school-wide figures."
        }
        Role::Unknown => "Be polite and general. Do not assume access to personal records.",
    }
}

fn data_blocks(
    snapshot: &UserSnapshot,
    intent: Intent,
    result: &RetrievalResult,
    history: &[ChatTurn],
    max_items: usize,
) -> String {
    let mut out = String::new();

    out.push_str("# PROFILE\n");
    out.push_str(&pretty(&profile_view(snapshot)));
    out.push_str("\n\n# RETRIEVED DATA\n");
    out.push_str(&format!("Intent: {}\n", intent));
    // Aggregates go ahead of the rows so truncation cuts rows first.
    if let Some(line) = summary_line(result) {
        out.push_str(&line);
    }
    let total = result.row_count();
    if total > max_items {
        out.push_str(&format!("Rows shown: {} of {}\n", max_items, total));
    }
    out.push_str(&pretty(&result_view(result, max_items)));
    out.push('\n');

    if !history.is_empty() {
        out.push_str("\n# RECENT CONVERSATION\n");
        for turn in history {
            let who = match turn.speaker {
                Speaker::User => "User",
                Speaker::Assistant => "Assistant",
            };
            out.push_str(&format!(
                "{}: {}\n",
                who,
                take_chars(turn.content.trim(), HISTORY_TURN_CHARS)
            ));
        }
    }
    out
}

fn summary_line(result: &RetrievalResult) -> Option<String> {
    match result {
        RetrievalResult::Attendance { summary, scope, .. } => Some(format!(
            "Summary ({}): present {}, absent {}, late {}, excused {}, total {}, rate {:.1}%{}\n",
            scope,
            summary.present,
            summary.absent,
            summary.late,
            summary.excused,
            summary.total,
            summary.rate,
            summary
                .risk
                .map(|r| format!(", risk {}", r.as_str()))
                .unwrap_or_default(),
        )),
        RetrievalResult::Excuses { summary, scope, .. } => Some(format!(
            "Summary ({}): pending {}, approved {}, rejected {}, total {}\n",
            scope, summary.pending, summary.approved, summary.rejected, summary.total
        )),
        _ => None,
    }
}

/// Minimal view of the snapshot: no contact details, counts instead of lists.
fn profile_view(snapshot: &UserSnapshot) -> Value {
    let mut view = json!({
        "user": {
            "id": snapshot.user.id,
            "name": snapshot.user.name,
            "role": snapshot.role(),
        }
    });
    match &snapshot.profile {
        RoleProfile::Student(s) => {
            view["student"] = json!({
                "name": s.name,
                "year": s.year,
                "course": s.course,
                "section": s.section,
                "classes_count": s.classes.len(),
                "recent_attendance_count": s.recent_attendance.len(),
                "pending_requests": s.stats.pending_requests,
            });
        }
        RoleProfile::Teacher(t) => {
            view["teacher"] = json!({
                "name": t.name,
                "department": t.department,
                "classes_count": t.classes.len(),
            });
        }
        RoleProfile::Admin | RoleProfile::Unknown => {}
    }
    view
}

fn result_view(result: &RetrievalResult, max_items: usize) -> Value {
    let capped = match result {
        RetrievalResult::Attendance {
            records,
            summary,
            scope,
        } => RetrievalResult::Attendance {
            records: records.iter().take(max_items).cloned().collect(),
            summary: *summary,
            scope: scope.clone(),
        },
        RetrievalResult::Excuses {
            records,
            summary,
            scope,
        } => RetrievalResult::Excuses {
            records: records.iter().take(max_items).cloned().collect(),
            summary: *summary,
            scope: scope.clone(),
        },
        RetrievalResult::Schedule { classes, scope } => RetrievalResult::Schedule {
            classes: classes.iter().take(max_items).cloned().collect(),
            scope: scope.clone(),
        },
        RetrievalResult::Classes { classes, scope } => RetrievalResult::Classes {
            classes: classes.iter().take(max_items).cloned().collect(),
            scope: scope.clone(),
        },
        RetrievalResult::Teachers { teachers, scope } => RetrievalResult::Teachers {
            teachers: teachers.iter().take(max_items).cloned().collect(),
            scope: scope.clone(),
        },
        other => other.clone(),
    };
    serde_json::to_value(capped).unwrap_or(Value::Null)
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[unserializable]".to_string())
}

fn take_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}
