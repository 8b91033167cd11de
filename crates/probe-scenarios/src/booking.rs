//! `appointment-conflict`: dos reservas válidas y una solapada que el
//! servicio debe rechazar. El frontend de reservas es el eje cliente.
use probe_core::{DiagnosisAxes, OperationDescriptor, OutcomeContract, ProbeError, Role, ScenarioDefinition, Step};
use serde_json::{json, Value};

use crate::common::{created, doctor_template, health_probe, patient_template, ScenarioSettings};

pub const NAME: &str = "appointment-conflict";
pub const DESCRIPTION: &str = "book two slots and verify an overlapping booking is rejected";
pub const FRONTEND: &str = "frontend";

fn booking(start: &str, end: &str) -> Value {
    json!({
        "doctorId": "{{doctor.id}}",
        "date": "{{vars.date}}",
        "startTime": start,
        "endTime": end,
        "type": "VIDEO_CALL",
        "reasonForVisit": "Regular checkup"
    })
}

fn book(name: &str, start: &str, end: &str, contract: OutcomeContract) -> Step {
    Step::request(name,
                  "patient",
                  OperationDescriptor::post("/api/appointments", booking(start, end)).expect(contract))
}

pub fn scenario(settings: &ScenarioSettings) -> Result<ScenarioDefinition, ProbeError> {
    ScenarioDefinition::builder(NAME)
        .description(DESCRIPTION)
        .var("date", settings.booking_date.as_str())
        .step(health_probe())
        .step(Step::surface("frontend_home", FRONTEND, "home", json!({})).soft())
        .step(Step::create_actor("patient", Role::Patient, patient_template()))
        .step(Step::create_actor("doctor", Role::Doctor, doctor_template()))
        .step(book("book_first", "10:00", "10:30", created()))
        .step(book("book_second", "11:00", "11:30", created()))
        .step(book("book_overlap", "10:15", "10:45", OutcomeContract::expect_rejection(400)))
        .step(Step::request("doctor_schedule", "doctor", OperationDescriptor::get("/api/appointments")))
        .step(Step::surface("frontend_booking", FRONTEND, "book", json!({"doctorId": "{{doctor.id}}"}))
                  .depends_on("book_overlap"))
        .diagnose_with(DiagnosisAxes::new(["book_first", "book_second", "book_overlap"], ["frontend_booking"]))
        .build()
}
