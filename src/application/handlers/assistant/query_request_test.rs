use super::*;
use crate::adapters::cache::InMemorySnapshotCache;
use crate::adapters::generation::{MockError, MockTextGenerator};
use crate::adapters::memory::{InMemorySchoolRecords, InMemorySnapshotSource};
use crate::domain::assistant::{RiskTier, Speaker};
use crate::domain::foundation::{StudentId, ValidationError};
use crate::domain::school::{AttendanceRecord, AttendanceStatus};
use crate::domain::snapshot::{Account, SnapshotError, StudentProfile, StudentStats};
use crate::ports::RecordsError;
use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;

const USER: UserId = UserId::new(12);
const STUDENT: StudentId = StudentId::new(77);

fn source() -> InMemorySnapshotSource {
    InMemorySnapshotSource::new()
        .with_account(Account {
            id: USER,
            name: "maria".to_string(),
            email: None,
            role_column: Some("student".to_string()),
            is_admin: false,
        })
        .with_student(
            USER,
            StudentProfile {
                student_id: STUDENT,
                name: "Maria Santos".to_string(),
                student_number: Some("2024-0077".to_string()),
                year: None,
                course: None,
                section: None,
                home_class_id: None,
                classes: vec![],
                recent_attendance: vec![],
                recent_requests: vec![],
                stats: StudentStats::default(),
            },
        )
}

/// 23 present and 2 absent, all within the last minute.
fn records() -> InMemorySchoolRecords {
    let now = Utc::now();
    (0..25).fold(InMemorySchoolRecords::new(), |records, i| {
        records.with_attendance(AttendanceRecord {
            student_id: STUDENT,
            student_name: "Maria Santos".to_string(),
            class_name: Some("Math 101".to_string()),
            status: if i < 23 {
                AttendanceStatus::Present
            } else {
                AttendanceStatus::Absent
            },
            marked_at: now - ChronoDuration::seconds(i),
        })
    })
}

fn handler(
    records: InMemorySchoolRecords,
    generator: &MockTextGenerator,
    settings: AssistantSettings,
) -> QueryRequestHandler {
    let snapshots = SnapshotProvider::new(
        Arc::new(source()),
        Arc::new(InMemorySnapshotCache::new()),
        Duration::from_secs(900),
    );
    QueryRequestHandler::new(
        Arc::new(snapshots),
        Arc::new(RetrievalPlanner::new(Arc::new(records))),
        Arc::new(generator.clone()),
        settings,
    )
}

fn ask(message: &str) -> QueryRequestCommand {
    QueryRequestCommand {
        user_id: USER,
        message: message.to_string(),
        history: vec![],
    }
}

#[tokio::test]
async fn answers_attendance_rate_end_to_end() {
    let generator = MockTextGenerator::new()
        .with_response("Your attendance rate this month is 92%. Keep it up!");
    let handler = handler(records(), &generator, AssistantSettings::default());

    let result = handler
        .handle(ask("What's my attendance rate this month?"))
        .await
        .unwrap();

    assert_eq!(result.reply, "Your attendance rate this month is 92%. Keep it up!");
    assert_eq!(result.intent(), Intent::Attendance);
    assert!(result.fallback.is_none());
    assert!(!result.rewritten);

    let RetrievalResult::Attendance { summary, .. } = &result.retrieval.result else {
        panic!("expected attendance result");
    };
    assert_eq!(summary.present, 23);
    assert_eq!(summary.absent, 2);
    assert_eq!(summary.rate, 92.0);
    assert_eq!(summary.risk, Some(RiskTier::Good));

    // One generation, no rewrite.
    let calls = generator.get_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].prompt.contains("What's my attendance rate this month?"));
    assert!(calls[0].prompt.contains("rate 92.0%"));
}

#[tokio::test]
async fn technical_reply_is_rewritten_once() {
    let generator = MockTextGenerator::new()
        .with_response(r#"{"attendance_rate": 92}"#)
        .with_response("You've attended 92% of your classes this month.");
    let handler = handler(records(), &generator, AssistantSettings::default());

    let result = handler.handle(ask("attendance rate?")).await.unwrap();

    assert_eq!(result.reply, "You've attended 92% of your classes this month.");
    assert!(result.rewritten);
    assert_eq!(generator.call_count(), 2);
}

#[tokio::test]
async fn unknown_intent_gets_fixed_help_without_backend() {
    let generator = MockTextGenerator::new();
    let records = records();
    let handler = handler(records, &generator, AssistantSettings::default());

    let result = handler.handle(ask("tell me a joke")).await.unwrap();

    assert_eq!(result.intent(), Intent::Unknown);
    assert_eq!(result.fallback, Some(Fallback::Unsupported));
    assert_eq!(result.reply, unsupported_reply());
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn storage_failure_uses_retrieval_fallback() {
    let generator = MockTextGenerator::new();
    let settings = AssistantSettings {
        expose_debug: true,
        ..Default::default()
    };
    let handler = handler(
        records().failing(RecordsError::Timeout(5000)),
        &generator,
        settings,
    );

    let result = handler.handle(ask("my attendance")).await.unwrap();

    assert_eq!(result.reply, RETRIEVAL_FALLBACK);
    assert_eq!(result.fallback, Some(Fallback::Retrieval));
    assert!(result.debug.is_some());
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn generation_failure_uses_generation_fallback() {
    let generator = MockTextGenerator::new().with_error(MockError::Exhausted { attempts: 3 });
    let handler = handler(records(), &generator, AssistantSettings::default());

    let result = handler.handle(ask("my attendance")).await.unwrap();

    assert_eq!(result.reply, GENERATION_FALLBACK);
    assert_eq!(result.fallback, Some(Fallback::Generation));
    // Debug detail stays hidden unless enabled.
    assert!(result.debug.is_none());
}

#[tokio::test]
async fn empty_generation_is_never_returned() {
    let generator = MockTextGenerator::new().with_response("  \n ");
    let handler = handler(records(), &generator, AssistantSettings::default());

    let result = handler.handle(ask("my attendance")).await.unwrap();

    assert_eq!(result.reply, GENERATION_FALLBACK);
}

#[tokio::test]
async fn history_is_windowed_into_prompt() {
    let generator = MockTextGenerator::new().with_response("Sure.");
    let settings = AssistantSettings {
        history_window: 1,
        ..Default::default()
    };
    let handler = handler(records(), &generator, settings);

    let mut cmd = ask("and my absences?");
    cmd.history = vec![
        ChatTurn {
            speaker: Speaker::User,
            content: "first question".to_string(),
        },
        ChatTurn {
            speaker: Speaker::Assistant,
            content: "latest answer".to_string(),
        },
    ];
    handler.handle(cmd).await.unwrap();

    let prompt = &generator.get_calls()[0].prompt;
    assert!(prompt.contains("Assistant: latest answer"));
    assert!(!prompt.contains("first question"));
}

#[tokio::test]
async fn rejects_blank_and_oversized_messages() {
    let generator = MockTextGenerator::new();
    let handler = handler(records(), &generator, AssistantSettings::default());

    let blank = handler.handle(ask("   ")).await;
    assert!(matches!(
        blank,
        Err(AssistantError::Validation(ValidationError::EmptyField { .. }))
    ));

    let long = handler.handle(ask(&"a".repeat(2_001))).await;
    assert!(matches!(
        long,
        Err(AssistantError::Validation(ValidationError::TooLong { .. }))
    ));
}

#[tokio::test]
async fn unknown_user_is_an_error() {
    let generator = MockTextGenerator::new();
    let handler = handler(records(), &generator, AssistantSettings::default());

    let result = handler
        .handle(QueryRequestCommand {
            user_id: UserId::new(999),
            message: "my attendance".to_string(),
            history: vec![],
        })
        .await;

    assert!(matches!(
        result,
        Err(AssistantError::Snapshot(SnapshotError::UserNotFound(_)))
    ));
}

#[tokio::test(start_paused = true)]
async fn stalled_generation_returns_fallback_within_deadline() {
    // Every attempt outlives the deadline, as when each retry hits its own timeout.
    let generator = MockTextGenerator::new().with_delay(Duration::from_secs(200));
    let settings = AssistantSettings {
        reply_deadline: Duration::from_secs(30),
        ..Default::default()
    };
    let handler = handler(records(), &generator, settings);

    let started = tokio::time::Instant::now();
    let result = handler.handle(ask("my attendance")).await.unwrap();

    assert_eq!(result.reply, GENERATION_FALLBACK);
    assert_eq!(result.fallback, Some(Fallback::Generation));
    assert!(started.elapsed() <= Duration::from_secs(31));
    assert_eq!(generator.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn stalled_rewrite_keeps_draft() {
    let generator = MockTextGenerator::new()
        .with_response(r#"{"attendance_rate": 92}"#)
        .with_response("You've attended 92% of your classes this month.")
        .with_delay(Duration::from_secs(20));
    let settings = AssistantSettings {
        reply_deadline: Duration::from_secs(30),
        ..Default::default()
    };
    let handler = handler(records(), &generator, settings);

    let started = tokio::time::Instant::now();
    let result = handler.handle(ask("attendance rate?")).await.unwrap();

    assert_eq!(result.reply, r#"{"attendance_rate": 92}"#);
    assert!(!result.rewritten);
    assert!(result.fallback.is_none());
    assert!(started.elapsed() <= Duration::from_secs(31));
    assert_eq!(generator.call_count(), 2);
}
