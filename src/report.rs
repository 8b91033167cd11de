//! Renderizado de reportes: texto para consola y JSON.
use std::fmt::Write;

use probe_core::{ScenarioReport, StepStatus};
use serde_json::json;

use crate::errors::CoreError;

fn tag(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Pass => "[PASS]",
        StepStatus::Fail => "[FAIL]",
        StepStatus::Skipped => "[SKIP]",
    }
}

/// Tasa de éxito sobre los steps ejecutados (no saltados).
pub fn success_rate(report: &ScenarioReport) -> f64 {
    let counts = report.counts();
    let executed = counts.passed + counts.failed;
    if executed == 0 {
        return 0.0;
    }
    counts.passed as f64 * 100.0 / executed as f64
}

pub fn render_text(report: &ScenarioReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ({:?}) run {}", report.scenario, report.state, report.run_id);
    for o in &report.outcomes {
        let soft = if o.hard_fail { "" } else { " (soft)" };
        let _ = writeln!(out, "{} {:<20} {}ms  {}{}", tag(o.status), o.step, o.elapsed_ms, o.message, soft);
    }
    let counts = report.counts();
    let _ = writeln!(out,
                     "-- {}/{} passed, {} failed, {} skipped, success rate {:.1}%",
                     counts.passed,
                     counts.total(),
                     counts.failed,
                     counts.skipped,
                     success_rate(report));
    if let Some(label) = report.diagnosis {
        let _ = writeln!(out, "-- diagnosis: {label}: {}", label.summary());
        for hint in label.hints() {
            let _ = writeln!(out, "   * {hint}");
        }
    }
    let _ = writeln!(out, "-- result: {}", if report.passed { "PASSED" } else { "FAILED" });
    out
}

pub fn render_json(reports: &[ScenarioReport]) -> Result<String, CoreError> {
    let value = match reports {
        [single] => serde_json::to_value(single)?,
        many => json!({
            "passed": many.iter().all(|r| r.passed),
            "scenarios": many,
        }),
    };
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Código de salida agregado: 0 si todos pasan.
pub fn exit_code(reports: &[ScenarioReport]) -> i32 {
    reports.iter().map(ScenarioReport::exit_code).max().unwrap_or(0)
}
