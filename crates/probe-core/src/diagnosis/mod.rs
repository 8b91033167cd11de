//! Diagnosis Engine: clasifica el patrón de resultados de un escenario.
//!
//! Dos señales booleanas (camino directo al servicio y camino por la
//! superficie cliente) se mapean con una tabla fija y total a una etiqueta.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::ScenarioReport;
use crate::step::StepStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosisLabel {
    Ok,
    ClientSurfaceIssue,
    Ambiguous,
    ServiceIssue,
}

impl DiagnosisLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosisLabel::Ok => "OK",
            DiagnosisLabel::ClientSurfaceIssue => "CLIENT_SURFACE_ISSUE",
            DiagnosisLabel::Ambiguous => "AMBIGUOUS",
            DiagnosisLabel::ServiceIssue => "SERVICE_ISSUE",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            DiagnosisLabel::Ok => "service and client surface both work",
            DiagnosisLabel::ClientSurfaceIssue => "service works, client surface is broken",
            DiagnosisLabel::Ambiguous => "client surface works but the direct service path failed",
            DiagnosisLabel::ServiceIssue => "the service itself is failing",
        }
    }

    /// Pistas para seguir investigando.
    pub fn hints(&self) -> &'static [&'static str] {
        match self {
            DiagnosisLabel::Ok => &[],
            DiagnosisLabel::ClientSurfaceIssue => &["check the browser console for JavaScript errors",
                                                    "verify client-side form validation",
                                                    "check how the client stores and sends the auth token"],
            DiagnosisLabel::Ambiguous => &["re-run the scenario to rule out flakiness",
                                           "compare the payloads sent by the client with the direct requests"],
            DiagnosisLabel::ServiceIssue => &["inspect the service logs for the failing requests",
                                              "verify the service contract (status codes and fields)"],
        }
    }
}

impl fmt::Display for DiagnosisLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisSignals {
    pub service_path: bool,
    pub client_path: bool,
}

/// Tabla de verdad.
pub fn diagnose(signals: DiagnosisSignals) -> DiagnosisLabel {
    match (signals.service_path, signals.client_path) {
        (true, true) => DiagnosisLabel::Ok,
        (true, false) => DiagnosisLabel::ClientSurfaceIssue,
        (false, true) => DiagnosisLabel::Ambiguous,
        (false, false) => DiagnosisLabel::ServiceIssue,
    }
}

/// Steps que alimentan cada señal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisAxes {
    pub service: Vec<String>,
    pub client: Vec<String>,
}

impl DiagnosisAxes {
    pub fn new<S: Into<String>>(service: impl IntoIterator<Item = S>, client: impl IntoIterator<Item = S>) -> Self {
        Self { service: service.into_iter().map(Into::into).collect(),
               client: client.into_iter().map(Into::into).collect() }
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.service.iter().chain(self.client.iter())
    }

    /// Un eje es verdadero si nombra al menos un step y todos pasaron.
    pub fn signals(&self, report: &ScenarioReport) -> DiagnosisSignals {
        let axis = |steps: &[String]| {
            !steps.is_empty() && steps.iter().all(|s| report.status_of(s) == Some(StepStatus::Pass))
        };
        DiagnosisSignals { service_path: axis(&self.service),
                           client_path: axis(&self.client) }
    }
}

pub fn diagnose_report(report: &ScenarioReport, axes: &DiagnosisAxes) -> DiagnosisLabel {
    diagnose(axes.signals(report))
}
