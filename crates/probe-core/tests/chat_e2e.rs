mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Behavior, FakeHealthConnect};
use probe_core::constants::CORRELATION_TIMEOUT_MESSAGE;
use probe_core::{CredentialTemplate, EventPredicate, OperationDescriptor, OutcomeContract, ProbeError, Role,
                 ScenarioDefinition, ScenarioRunner, Step, StepStatus};
use serde_json::json;

const TEXT: &str = "Hello doctor, I have a question";

fn template(prefix: &str) -> CredentialTemplate {
    CredentialTemplate::new(json!({
        "fullName": prefix,
        "email": format!("{prefix}.{{seed}}@healthconnect.com"),
        "password": "password123",
        "confirmPassword": "password123"
    }))
}

fn actors_and_chat() -> Vec<Step> {
    vec![Step::probe("health", OperationDescriptor::get("/api/health")).setup(),
         Step::create_actor("patient", Role::Patient, template("patient")),
         Step::create_actor("doctor", Role::Doctor, template("doctor")),
         Step::request("chat",
                       "patient",
                       OperationDescriptor::post("/api/chats", json!({"participantId": "{{doctor.id}}"}))
                           .expect(OutcomeContract::expect_success().require("id"))),]
}

fn send() -> Step {
    Step::request("send",
                  "doctor",
                  OperationDescriptor::post("/api/chats/{{chat.id}}/messages", json!({"content": "{{vars.text}}"}))
                      .expect(OutcomeContract::expect_success().require("id")))
}

fn scenario() -> ScenarioDefinition {
    ScenarioDefinition::builder("realtime-chat")
        .var("text", TEXT)
        .steps(actors_and_chat())
        .step(Step::arm("listen", "/topic/chat/{{chat.id}}", EventPredicate::field_equals("content", "{{vars.text}}"))
                  .within(Duration::from_secs(3))
                  .as_actor("patient"))
        .step(send())
        .step(Step::await_event("delivered", "listen", "send"))
        .step(Step::request("history", "patient",
                            OperationDescriptor::get("/api/chats/{{chat.id}}/messages")
                                .expect(OutcomeContract::expect_success().require("0.id"))))
        .build()
        .unwrap()
}

fn runner(fake: &FakeHealthConnect) -> ScenarioRunner {
    ScenarioRunner::new(fake.service.clone()).with_push_channel(Arc::new(fake.broker.clone()))
}

#[tokio::test]
async fn message_is_delivered_in_real_time() {
    let fake = FakeHealthConnect::new();
    let report = runner(&fake).run(&scenario()).await;

    assert!(report.passed, "{:?}", report.outcomes);
    let delivered = report.outcome("delivered").unwrap();
    assert_eq!(delivered.get("content"), Some(&json!(TEXT)));
    assert_eq!(delivered.get("payload").unwrap()["chatId"], report.outcome("chat").unwrap().get("id").cloned().unwrap());
    assert_eq!(fake.broker.total_subscribers(), 0);
}

#[tokio::test]
async fn missing_push_delivery_times_out_after_deadline() {
    let fake = FakeHealthConnect::start(Behavior { deliver_push: false,
                                                   ..Behavior::default() });
    let report = runner(&fake).run(&scenario()).await;

    let delivered = report.outcome("delivered").unwrap();
    assert_eq!(delivered.status, StepStatus::Fail);
    assert_eq!(delivered.message, CORRELATION_TIMEOUT_MESSAGE);
    assert!(matches!(delivered.error, Some(ProbeError::CorrelationTimeout { deadline_ms: 3000, .. })));
    assert!(delivered.elapsed_ms >= 2900, "{}", delivered.elapsed_ms);
    // el mensaje sí quedó guardado: el problema es sólo el canal push
    assert_eq!(report.status_of("history"), Some(StepStatus::Pass));
    assert!(!report.passed);
    assert_eq!(fake.broker.total_subscribers(), 0);
}

#[tokio::test]
async fn arming_after_the_trigger_misses_the_event() {
    let fake = FakeHealthConnect::new();
    let def = ScenarioDefinition::builder("late-arm")
        .var("text", TEXT)
        .steps(actors_and_chat())
        .step(send())
        .step(Step::arm("listen", "/topic/chat/{{chat.id}}", EventPredicate::Any)
                  .within(Duration::from_millis(200))
                  .as_actor("patient"))
        .step(Step::probe("noop", OperationDescriptor::get("/api/health")))
        .step(Step::await_event("delivered", "listen", "noop"))
        .build()
        .unwrap();

    let report = runner(&fake).run(&def).await;
    assert_eq!(report.status_of("send"), Some(StepStatus::Pass));
    assert_eq!(report.status_of("delivered"), Some(StepStatus::Fail));
    assert_eq!(fake.broker.total_subscribers(), 0);
}

#[tokio::test]
async fn failed_trigger_skips_await_and_closes_subscription() {
    let fake = FakeHealthConnect::new();
    let def = ScenarioDefinition::builder("bad-trigger")
        .var("text", TEXT)
        .steps(actors_and_chat())
        .step(Step::arm("listen", "/topic/chat/{{chat.id}}", EventPredicate::Any).as_actor("patient"))
        .step(Step::request("send", "doctor", OperationDescriptor::post("/api/chats/999/messages", json!({"content": "x"}))))
        .step(Step::await_event("delivered", "listen", "send"))
        .build()
        .unwrap();

    let mut runner = runner(&fake);
    let report = runner.run(&def).await;
    assert_eq!(report.status_of("send"), Some(StepStatus::Fail));
    assert_eq!(report.status_of("delivered"), Some(StepStatus::Skipped));
    assert_eq!(fake.broker.total_subscribers(), 0);
    assert_eq!(runner.event_trace(report.run_id).iter().filter(|c| **c == "X").count(), 1);
}
