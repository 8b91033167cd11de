//! `auth-flow`: alta y login de un paciente nuevo, perfil propio y cuenta
//! fija de doctor (reutilizada o creada).
use probe_core::{OperationDescriptor, OutcomeContract, ProbeError, Role, ScenarioDefinition, Step};

use crate::common::{doctor_template, health_probe, patient_template, ScenarioSettings};

pub const NAME: &str = "auth-flow";
pub const DESCRIPTION: &str = "register and log in a fresh patient, read its profile, log in the fixture doctor";

pub fn scenario(settings: &ScenarioSettings) -> Result<ScenarioDefinition, ProbeError> {
    let profile = || OutcomeContract::expect_success().require("email");
    ScenarioDefinition::builder(NAME)
        .description(DESCRIPTION)
        .step(health_probe())
        .step(Step::register("patient", Role::Patient, patient_template()))
        .step(Step::login("session", Role::Patient, "patient"))
        .step(Step::request("me", "session", OperationDescriptor::get("/api/users/me").expect(profile())))
        .step(Step::reuse_or_create("doctor", Role::Doctor, settings.doctor.clone(), doctor_template()))
        .step(Step::request("doctor_me", "doctor", OperationDescriptor::get("/api/users/me").expect(profile())))
        .step(Step::request("doctors", "session", OperationDescriptor::get("/api/users/doctors")).soft())
        .build()
}
