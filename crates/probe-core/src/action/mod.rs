//! Action Executor: una operación request/response con contrato declarado.

mod executor;
mod operation;

pub use executor::ActionExecutor;
pub use operation::{OperationDescriptor, OutcomeContract, StatusClass, StatusExpectation};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProbeError;
    use crate::model::{Actor, Credentials, Role};
    use crate::step::StepStatus;
    use crate::template::CaptureScope;
    use crate::transport::{InMemoryService, Verb};
    use serde_json::json;
    use std::sync::Arc;

    fn actor_with_token() -> Actor {
        let mut a = Actor::new(Role::Patient, "1", Credentials::new("p@x.io", "pw"), json!({}));
        a.set_token("tok".into());
        a
    }

    #[tokio::test]
    async fn pass_captures_required_and_top_level_fields() {
        let svc = Arc::new(InMemoryService::new());
        svc.respond(Verb::Post, "/api/appointments", 201, json!({"id": 31, "status": "SCHEDULED"}));
        let exec = ActionExecutor::new(svc.clone());
        let op = OperationDescriptor::post("/api/appointments", json!({"doctorId": 2}))
            .expect(OutcomeContract::expect_status(&[200, 201]).require("id"));

        let out = exec.execute("book", Some(&actor_with_token()), &op, &CaptureScope::default()).await;
        assert_eq!(out.status, StepStatus::Pass);
        assert_eq!(out.get("id"), Some(&json!(31)));
        assert_eq!(out.get("status"), Some(&json!(201)));
        assert_eq!(out.message, "POST /api/appointments -> 201");
        assert_eq!(svc.calls()[0].bearer(), Some("tok"));
    }

    #[tokio::test]
    async fn contract_duality_on_rejection() {
        let svc = Arc::new(InMemoryService::new());
        svc.respond(Verb::Post, "/reject", 400, json!({"error": "overlap"}));
        svc.respond(Verb::Post, "/accept", 200, json!({"id": 1}));
        let exec = ActionExecutor::new(svc);
        let scope = CaptureScope::default();

        let expect_400 = OperationDescriptor::post("/reject", json!({})).expect(OutcomeContract::expect_rejection(400));
        assert!(exec.execute("a", None, &expect_400, &scope).await.is_pass());

        let same_on_200 = OperationDescriptor::post("/accept", json!({})).expect(OutcomeContract::expect_rejection(400));
        let out = exec.execute("b", None, &same_on_200, &scope).await;
        assert_eq!(out.status, StepStatus::Fail);
        assert!(matches!(out.error, Some(ProbeError::ContractViolation(_))));
        assert!(out.message.contains("-> 200"));
    }

    #[tokio::test]
    async fn unresolved_template_or_missing_token_makes_no_call() {
        let svc = Arc::new(InMemoryService::new());
        let exec = ActionExecutor::new(svc.clone());
        let scope = CaptureScope::default();

        let op = OperationDescriptor::get("/api/chats/{{chat.id}}/messages");
        let out = exec.execute("list", None, &op, &scope).await;
        assert!(matches!(out.error, Some(ProbeError::Template(_))));

        let anonymous = Actor::new(Role::Doctor, "2", Credentials::new("d@x.io", "pw"), json!({}));
        let out = exec.execute("me", Some(&anonymous), &OperationDescriptor::get("/api/users/me"), &scope).await;
        assert!(matches!(out.error, Some(ProbeError::Authentication(_))));
        assert_eq!(svc.call_count(), 0);
    }

    #[tokio::test]
    async fn missing_required_field_is_a_violation() {
        let svc = Arc::new(InMemoryService::new());
        svc.respond(Verb::Post, "/api/chats", 200, json!({"participants": []}));
        let exec = ActionExecutor::new(svc);
        let op = OperationDescriptor::post("/api/chats", json!({})).expect(OutcomeContract::expect_success().require("id"));
        let out = exec.execute("chat", None, &op, &CaptureScope::default()).await;
        assert_eq!(out.status, StepStatus::Fail);
        assert!(out.message.contains("missing required fields [id]"));
    }
}
