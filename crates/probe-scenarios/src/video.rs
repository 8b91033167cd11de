//! `video-consultation`: consulta de video creada desde una cita, iniciada
//! y terminada por el doctor; el paciente la ve entre sus próximas.
use probe_core::{OperationDescriptor, OutcomeContract, ProbeError, Role, ScenarioDefinition, Step, Verb};
use serde_json::json;

use crate::common::{created, doctor_template, health_probe, patient_template, ScenarioSettings};

pub const NAME: &str = "video-consultation";
pub const DESCRIPTION: &str = "create a video consultation from a booked appointment, start it and end it";
pub const CONSULTATION_TYPE: &str = "ROUTINE_CHECKUP";

pub fn scenario(settings: &ScenarioSettings) -> Result<ScenarioDefinition, ProbeError> {
    let with_status = || OutcomeContract::expect_success().require("status");
    ScenarioDefinition::builder(NAME)
        .description(DESCRIPTION)
        .var("date", settings.booking_date.as_str())
        .step(health_probe())
        .step(Step::probe("video_health", OperationDescriptor::get("/api/video-consultation/health")).soft())
        .step(Step::create_actor("patient", Role::Patient, patient_template()))
        .step(Step::create_actor("doctor", Role::Doctor, doctor_template()))
        .step(Step::request("book",
                            "patient",
                            OperationDescriptor::post("/api/appointments",
                                                      json!({
                                                          "doctorId": "{{doctor.id}}",
                                                          "date": "{{vars.date}}",
                                                          "startTime": "14:00",
                                                          "endTime": "14:30",
                                                          "type": "VIDEO_CALL",
                                                          "reasonForVisit": "Video follow-up"
                                                      })).expect(created())))
        .step(Step::request("consultation",
                            "doctor",
                            OperationDescriptor::post("/api/video-consultation/create",
                                                      json!({"appointmentId": "{{book.id}}", "type": CONSULTATION_TYPE}))
                                .expect(created().require("roomId"))))
        .step(Step::request("start",
                            "doctor",
                            OperationDescriptor::new(Verb::Post, "/api/video-consultation/{{consultation.id}}/start")
                                .expect(with_status())))
        .step(Step::request("end",
                            "doctor",
                            OperationDescriptor::post("/api/video-consultation/{{consultation.id}}/end",
                                                      json!({
                                                          "notes": "Consultation completed",
                                                          "diagnosis": "Tension headache",
                                                          "recommendations": "Rest and hydration"
                                                      }))
                                .expect(with_status())))
        .step(Step::request("upcoming", "patient", OperationDescriptor::get("/api/video-consultation/user/upcoming")))
        .build()
}
