use std::sync::Arc;

use chrono::Utc;
use connectprobe::{harness, report, CoreError, HarnessConfig};
use indexmap::IndexMap;
use probe_core::transport::InMemoryService;
use probe_core::{DiagnosisLabel, ProbeError, ScenarioReport, ScenarioRunner, ScenarioState, StepOutcome, Verb};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

fn report(passed: bool) -> ScenarioReport {
    let mut soft = StepOutcome::fail("frontend_home", ProbeError::Transport("frontend / answered 502".into()));
    soft.hard_fail = false;
    ScenarioReport { run_id: Uuid::new_v4(),
                     scenario: "appointment-conflict".into(),
                     definition_hash: "abc".into(),
                     state: ScenarioState::Completed,
                     outcomes: vec![StepOutcome::pass("health", IndexMap::new(), "GET /api/health -> 200"),
                                    soft,
                                    StepOutcome::skipped("frontend_booking", "dependency")],
                     passed,
                     diagnosis: Some(DiagnosisLabel::ServiceIssue),
                     started_at: Utc::now(),
                     finished_at: Utc::now() }
}

#[test]
fn text_report_lists_every_step_and_the_diagnosis() {
    let text = report::render_text(&report(false));
    assert!(text.contains("[PASS] health"));
    assert!(text.contains("[FAIL] frontend_home"));
    assert!(text.contains("(soft)"));
    assert!(text.contains("[SKIP] frontend_booking"));
    assert!(text.contains("1/3 passed"));
    assert!(text.contains("success rate 50.0%"));
    assert!(text.contains("diagnosis: SERVICE_ISSUE"));
    assert!(text.contains("result: FAILED"));
}

#[test]
fn json_report_and_exit_codes() {
    let single = report::render_json(&[report(true)]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&single).unwrap();
    assert_eq!(value["scenario"], "appointment-conflict");
    assert_eq!(value["diagnosis"], "SERVICE_ISSUE");

    let many = report::render_json(&[report(true), report(false)]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&many).unwrap();
    assert_eq!(value["passed"], false);
    assert_eq!(value["scenarios"].as_array().map(Vec::len), Some(2));

    assert_eq!(report::exit_code(&[report(true)]), 0);
    assert_eq!(report::exit_code(&[report(true), report(false)]), 1);
}

#[test]
fn unknown_scenario_and_bad_urls_are_usage_errors() {
    let err = assert_err!(harness::lookup("does-not-exist"));
    assert!(matches!(err, CoreError::UnknownScenario(_)));
    assert_eq!(err.exit_code(), 2);

    let cfg = HarnessConfig::default().with_overrides(None, Some("http://not-a-websocket".into()), None);
    assert!(matches!(harness::build_runner(&cfg), Err(CoreError::Adapter(_))));
    assert!(harness::build_runner(&HarnessConfig::default()).is_ok());
}

#[tokio::test]
async fn runs_a_catalog_scenario_by_name() {
    let service = Arc::new(InMemoryService::new());
    service.respond(Verb::Get, "/api/health", 200, json!({"status": "UP"}))
           .respond(Verb::Post, "/api/auth/register", 200, json!({"id": 1}))
           .respond(Verb::Post, "/api/auth/login", 200, json!({"id": 1, "token": "jwt"}))
           .respond(Verb::Post, "/api/ai-health-bot/chat", 200, json!({"conversationId": "c-9", "aiResponse": "Rest."}))
           .respond(Verb::Get, "/api/ai-health-bot/conversations", 200, json!([]));
    let mut runner = ScenarioRunner::new(service);

    let report = assert_ok!(harness::run_named(&mut runner, &HarnessConfig::default(), "ai-health-bot").await);
    assert!(report.passed, "{}", report::render_text(&report));
    assert_eq!(report.scenario, "ai-health-bot");
    assert!(runner.events_for(report.run_id).len() > 2);
}
