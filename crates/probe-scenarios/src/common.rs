//! Piezas compartidas: ajustes, plantillas de identidad y health probe.
use std::time::Duration;

use chrono::Utc;
use probe_core::constants::DEFAULT_CORRELATION_DEADLINE;
use probe_core::{CredentialTemplate, Credentials, OperationDescriptor, OutcomeContract, Step};
use serde_json::json;

pub const FIXTURE_PASSWORD: &str = "password123";
pub const FIXTURE_PATIENT_EMAIL: &str = "patient.test@healthconnect.com";
pub const FIXTURE_DOCTOR_EMAIL: &str = "doctor.test@healthconnect.com";

/// Días hacia adelante para las reservas; siempre en el futuro.
const BOOKING_LEAD_DAYS: i64 = 7;

/// Parámetros de los escenarios predefinidos.
#[derive(Debug, Clone)]
pub struct ScenarioSettings {
    /// Fecha `YYYY-MM-DD` usada por las reservas.
    pub booking_date: String,
    pub patient: Credentials,
    pub doctor: Credentials,
    pub correlation_deadline: Duration,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        let date = Utc::now() + chrono::Duration::days(BOOKING_LEAD_DAYS);
        Self { booking_date: date.format("%Y-%m-%d").to_string(),
               patient: Credentials::new(FIXTURE_PATIENT_EMAIL, FIXTURE_PASSWORD),
               doctor: Credentials::new(FIXTURE_DOCTOR_EMAIL, FIXTURE_PASSWORD),
               correlation_deadline: DEFAULT_CORRELATION_DEADLINE }
    }
}

pub fn patient_template() -> CredentialTemplate {
    CredentialTemplate::new(json!({
        "fullName": "John Patient",
        "email": "john.patient.{seed}@healthconnect.com",
        "password": FIXTURE_PASSWORD,
        "confirmPassword": FIXTURE_PASSWORD
    }))
}

pub fn doctor_template() -> CredentialTemplate {
    CredentialTemplate::new(json!({
        "fullName": "Dr. Sarah Johnson",
        "email": "dr.sarah.{seed}@healthconnect.com",
        "password": FIXTURE_PASSWORD,
        "confirmPassword": FIXTURE_PASSWORD,
        "specialization": "Cardiology",
        "licenseNumber": "DOC{seed}",
        "affiliation": "City General Hospital",
        "yearsOfExperience": 10
    }))
}

/// Health check anónimo; si falla, el escenario se aborta.
pub fn health_probe() -> Step {
    Step::probe("health", OperationDescriptor::get("/api/health").expect(OutcomeContract::expect_success())).setup()
}

/// Contrato de creación: 200 ó 201 con `id` en el body.
pub fn created() -> OutcomeContract {
    OutcomeContract::expect_status(&[200, 201]).require("id")
}
