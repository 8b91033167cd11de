//! `realtime-chat`: el paciente escucha el tópico del chat antes de que el
//! doctor escriba; el mensaje debe llegar por push dentro del deadline.
use probe_core::{EventPredicate, OperationDescriptor, OutcomeContract, ProbeError, Role, ScenarioDefinition, Step};
use serde_json::json;

use crate::common::{doctor_template, health_probe, patient_template, ScenarioSettings};

pub const NAME: &str = "realtime-chat";
pub const DESCRIPTION: &str = "open a chat, send a message as the doctor and observe real-time delivery";
pub const MESSAGE: &str = "Hello doctor, I have a question about my appointment";

pub fn scenario(settings: &ScenarioSettings) -> Result<ScenarioDefinition, ProbeError> {
    let ok_with_id = || OutcomeContract::expect_success().require("id");
    ScenarioDefinition::builder(NAME)
        .description(DESCRIPTION)
        .var("text", MESSAGE)
        .step(health_probe())
        .step(Step::create_actor("patient", Role::Patient, patient_template()))
        .step(Step::create_actor("doctor", Role::Doctor, doctor_template()))
        .step(Step::request("chat",
                            "patient",
                            OperationDescriptor::post("/api/chats", json!({"participantId": "{{doctor.id}}"}))
                                .expect(ok_with_id())))
        .step(Step::arm("listen", "/topic/chat/{{chat.id}}", EventPredicate::field_equals("content", "{{vars.text}}"))
                  .within(settings.correlation_deadline)
                  .as_actor("patient"))
        .step(Step::request("send",
                            "doctor",
                            OperationDescriptor::post("/api/chats/{{chat.id}}/messages", json!({"content": "{{vars.text}}"}))
                                .expect(ok_with_id())))
        .step(Step::await_event("delivered", "listen", "send"))
        .step(Step::request("history", "patient", OperationDescriptor::get("/api/chats/{{chat.id}}/messages")))
        .build()
}
