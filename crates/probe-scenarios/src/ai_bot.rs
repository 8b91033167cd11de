//! `ai-health-bot`: conversación nueva, seguimiento en la misma
//! conversación y listado del historial.
use probe_core::{OperationDescriptor, OutcomeContract, ProbeError, Role, ScenarioDefinition, Step};
use serde_json::{json, Value};

use crate::common::{health_probe, patient_template, ScenarioSettings};

pub const NAME: &str = "ai-health-bot";
pub const DESCRIPTION: &str = "start an AI health bot conversation and continue it";
pub const CONVERSATION_TYPE: &str = "GENERAL_HEALTH";

fn message(text: &str, conversation: Value, new: bool) -> Value {
    json!({
        "message": text,
        "conversationId": conversation,
        "isNewConversation": new,
        "conversationType": CONVERSATION_TYPE
    })
}

pub fn scenario(_settings: &ScenarioSettings) -> Result<ScenarioDefinition, ProbeError> {
    let answered = || OutcomeContract::expect_success().require("conversationId").require("aiResponse");
    let first = message("I have been experiencing headaches and fatigue for the past few days. What could be causing this?",
                        Value::Null,
                        true);
    let follow_up = message("Should I book an appointment with a doctor?", json!("{{ask.conversationId}}"), false);
    ScenarioDefinition::builder(NAME)
        .description(DESCRIPTION)
        .step(health_probe())
        .step(Step::create_actor("patient", Role::Patient, patient_template()))
        .step(Step::request("ask", "patient", OperationDescriptor::post("/api/ai-health-bot/chat", first).expect(answered())))
        .step(Step::request("follow_up",
                            "patient",
                            OperationDescriptor::post("/api/ai-health-bot/chat", follow_up).expect(answered())))
        .step(Step::request("conversations", "patient", OperationDescriptor::get("/api/ai-health-bot/conversations")))
        .build()
}
