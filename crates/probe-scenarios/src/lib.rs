//! probe-scenarios: escenarios predefinidos contra HealthConnect.
//!
//! Cada módulo construye un `ScenarioDefinition` a partir de
//! `ScenarioSettings`; `catalog` los expone por nombre.
pub mod ai_bot;
pub mod auth;
pub mod booking;
pub mod catalog;
pub mod chat;
pub mod common;
pub mod video;

pub use catalog::{builtin, BuiltinScenario, CATALOG};
pub use common::ScenarioSettings;
