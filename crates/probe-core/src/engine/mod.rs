//! Engine: definición de escenarios, builder validador, contexto de
//! ejecución y runner.

pub mod builder;
pub mod core;
pub mod run_ctx;

pub use builder::{ScenarioBuilder, ScenarioDefinition};
pub use self::core::ScenarioRunner;
pub use run_ctx::RunCtx;

pub use crate::event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
pub use crate::model::{ScenarioReport, ScenarioState};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::OperationDescriptor;
    use crate::correlator::EventPredicate;
    use crate::diagnosis::DiagnosisAxes;
    use crate::errors::ProbeError;
    use crate::model::{Credentials, Role};
    use crate::step::Step;
    use serde_json::json;

    fn doctor() -> Step {
        Step::authenticate_actor("doctor", Role::Doctor, Credentials::new("d@x.io", "pw"))
    }

    fn send() -> Step {
        Step::request("send", "doctor", OperationDescriptor::post("/api/chats/1/messages", json!({"content": "hi"})))
    }

    fn invalid(result: Result<ScenarioDefinition, ProbeError>) -> String {
        match result {
            Err(ProbeError::InvalidScenario(msg)) => msg,
            other => panic!("expected InvalidScenario, got {other:?}"),
        }
    }

    #[test]
    fn arm_after_trigger_is_rejected() {
        let msg = invalid(ScenarioDefinition::builder("late").step(doctor())
                                                             .step(send())
                                                             .step(Step::arm("listen", "/topic/chat/1", EventPredicate::Any))
                                                             .step(Step::await_event("delivered", "listen", "send"))
                                                             .build());
        assert!(msg.contains("armed before its trigger"));
    }

    #[test]
    fn arm_then_trigger_builds_with_stable_hash() {
        let build = || {
            ScenarioDefinition::builder("chat").step(doctor())
                                               .step(Step::arm("listen", "/topic/chat/1", EventPredicate::Any))
                                               .step(send())
                                               .step(Step::await_event("delivered", "listen", "send"))
                                               .build()
                                               .unwrap()
        };
        let (a, b) = (build(), build());
        assert_eq!(a.definition_hash, b.definition_hash);
        assert_eq!(a.len(), 4);
    }

    #[test]
    fn forward_references_and_unknown_actors_are_rejected() {
        let forward = ScenarioDefinition::builder("fwd").step(Step::probe("use", OperationDescriptor::get("/x/{{later.id}}")))
                                                        .step(Step::probe("later", OperationDescriptor::get("/y")))
                                                        .build();
        assert!(invalid(forward).contains("not an earlier step"));

        let actorless = ScenarioDefinition::builder("who").step(Step::probe("health", OperationDescriptor::get("/h")))
                                                          .step(Step::request("me", "health", OperationDescriptor::get("/me")))
                                                          .build();
        assert!(invalid(actorless).contains("not an earlier provisioning step"));
    }

    #[test]
    fn names_and_axes_are_checked() {
        let dup = ScenarioDefinition::builder("dup").step(Step::probe("a", OperationDescriptor::get("/a")))
                                                    .step(Step::probe("a", OperationDescriptor::get("/b")))
                                                    .build();
        assert!(invalid(dup).contains("duplicate"));

        let dotted = ScenarioDefinition::builder("dot").step(Step::probe("a.b", OperationDescriptor::get("/a"))).build();
        assert!(invalid(dotted).contains("not a valid identifier"));

        let axes = ScenarioDefinition::builder("axes").step(Step::probe("a", OperationDescriptor::get("/a")))
                                                      .diagnose_with(DiagnosisAxes::new(["a"], ["ghost"]))
                                                      .build();
        assert!(invalid(axes).contains("ghost"));
        assert!(ScenarioDefinition::builder("empty").build().is_err());
    }
}
