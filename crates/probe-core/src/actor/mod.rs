//! Actor Registry.

mod registry;

pub use registry::{ActorRegistry, AuthEndpoints};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProbeError;
    use crate::model::{CredentialTemplate, Credentials, Role};
    use crate::transport::{InMemoryService, ServiceResponse, Verb};
    use serde_json::json;
    use std::sync::Arc;

    fn patient_template() -> CredentialTemplate {
        CredentialTemplate::new(json!({
            "fullName": "John Patient",
            "email": "john.patient.{seed}@healthconnect.com",
            "password": "password123",
            "confirmPassword": "password123"
        }))
    }

    fn auth_service() -> Arc<InMemoryService> {
        let svc = Arc::new(InMemoryService::new());
        svc.route(Verb::Post, "/api/auth/register", |req| {
               let body = req.body.clone().unwrap_or_default();
               Ok(ServiceResponse::new(200, json!({"id": 10, "email": body["email"], "role": body["role"]})))
           })
           .route(Verb::Post, "/api/auth/login", |req| {
               let body = req.body.clone().unwrap_or_default();
               if body["password"] == "password123" {
                   Ok(ServiceResponse::new(200, json!({"token": "jwt-1", "id": 10})))
               } else {
                   Ok(ServiceResponse::new(401, json!({"error": "Bad credentials"})))
               }
           });
        svc
    }

    #[tokio::test]
    async fn create_then_authenticate_sets_token_and_id() {
        let svc = auth_service();
        let registry = ActorRegistry::new(svc.clone());
        let actor = registry.create_actor(Role::Patient, &patient_template()).await.unwrap();
        assert!(!actor.is_authenticated());
        assert!(actor.credentials.email.contains(&actor.identity_seed));
        assert_eq!(svc.calls()[0].body.as_ref().unwrap()["role"], "PATIENT");

        let actor = registry.authenticate(actor).await.unwrap();
        assert_eq!(actor.token(), Some("jwt-1"));
        assert_eq!(actor.id, Some(json!(10)));

        // ya autenticado: sin llamada extra
        let again = registry.authenticate(actor).await.unwrap();
        assert_eq!(again.token(), Some("jwt-1"));
        assert_eq!(svc.call_count(), 2);
    }

    #[tokio::test]
    async fn registration_rejection_carries_status_and_body() {
        let svc = Arc::new(InMemoryService::new());
        svc.respond(Verb::Post, "/api/auth/register", 409, json!({"error": "Email already exists"}));
        let registry = ActorRegistry::new(svc);
        let err = registry.create_actor(Role::Doctor, &patient_template()).await.unwrap_err();
        match err {
            ProbeError::Registration { role, status, body } => {
                assert_eq!(role, "DOCTOR");
                assert_eq!(status, 409);
                assert!(body.contains("Email already exists"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_token_is_authentication_error() {
        let svc = Arc::new(InMemoryService::new());
        svc.respond(Verb::Post, "/api/auth/login", 200, json!({"id": 3}));
        let registry = ActorRegistry::new(svc);
        let actor = registry.known_actor(Role::Patient, Credentials::new("p@x.io", "password123"));
        let err = registry.authenticate(actor).await.unwrap_err();
        assert!(matches!(err, ProbeError::Authentication(m) if m.contains("'token'")));
    }

    #[tokio::test]
    async fn reuse_or_create_falls_back_to_registration() {
        let svc = auth_service();
        let registry = ActorRegistry::new(svc.clone());

        let reused = registry.reuse_or_create(Role::Patient,
                                              Credentials::new("patient.test@healthconnect.com", "password123"),
                                              &patient_template())
                             .await
                             .unwrap();
        assert!(reused.is_authenticated());
        assert_eq!(svc.calls_to("/api/auth/register"), 0);

        let created = registry.reuse_or_create(Role::Patient,
                                               Credentials::new("x@healthconnect.com", "wrong"),
                                               &patient_template())
                              .await;
        // el login posterior al alta usa la misma password rechazada
        assert!(matches!(created, Err(ProbeError::Authentication(_))));
        assert_eq!(svc.calls_to("/api/auth/register"), 1);
        let register_body = svc.calls()
                               .into_iter()
                               .find(|c| c.path == "/api/auth/register")
                               .and_then(|c| c.body)
                               .unwrap();
        assert_eq!(register_body["email"], "x@healthconnect.com");
        assert_eq!(register_body["confirmPassword"], "wrong");
    }

    #[tokio::test]
    async fn concurrent_seeds_are_pairwise_distinct() {
        let registry = Arc::new(ActorRegistry::new(auth_service()));
        let mut handles = Vec::new();
        for _ in 0..64 {
            let r = Arc::clone(&registry);
            handles.push(tokio::spawn(async move { r.create_actor(Role::Patient, &patient_template()).await }));
        }
        let mut seeds = std::collections::HashSet::new();
        for h in handles {
            let actor = h.await.unwrap().unwrap();
            assert!(seeds.insert(actor.identity_seed));
        }
        assert_eq!(seeds.len(), 64);
        assert_eq!(registry.issued_seeds().len(), 64);
    }
}
