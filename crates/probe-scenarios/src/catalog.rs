//! Catálogo de escenarios predefinidos, en orden de ejecución de `run-all`.
use std::fmt;

use probe_core::{ProbeError, ScenarioDefinition};

use crate::common::ScenarioSettings;
use crate::{ai_bot, auth, booking, chat, video};

type Build = fn(&ScenarioSettings) -> Result<ScenarioDefinition, ProbeError>;

#[derive(Clone, Copy)]
pub struct BuiltinScenario {
    pub name: &'static str,
    pub description: &'static str,
    build: Build,
}

impl fmt::Debug for BuiltinScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinScenario")
         .field("name", &self.name)
         .field("description", &self.description)
         .finish()
    }
}

impl BuiltinScenario {
    pub fn build(&self, settings: &ScenarioSettings) -> Result<ScenarioDefinition, ProbeError> {
        (self.build)(settings)
    }
}

pub const CATALOG: &[BuiltinScenario] = &[BuiltinScenario { name: auth::NAME,
                                                             description: auth::DESCRIPTION,
                                                             build: auth::scenario },
                                          BuiltinScenario { name: booking::NAME,
                                                             description: booking::DESCRIPTION,
                                                             build: booking::scenario },
                                          BuiltinScenario { name: chat::NAME,
                                                             description: chat::DESCRIPTION,
                                                             build: chat::scenario },
                                          BuiltinScenario { name: ai_bot::NAME,
                                                             description: ai_bot::DESCRIPTION,
                                                             build: ai_bot::scenario },
                                          BuiltinScenario { name: video::NAME,
                                                             description: video::DESCRIPTION,
                                                             build: video::scenario }];

/// Busca un escenario por nombre. `None` si no existe.
pub fn builtin(name: &str) -> Option<&'static BuiltinScenario> {
    CATALOG.iter().find(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_scenario_validates() {
        let settings = ScenarioSettings::default();
        for entry in CATALOG {
            let definition = entry.build(&settings).unwrap_or_else(|e| panic!("{}: {e}", entry.name));
            assert_eq!(definition.name, entry.name);
            assert!(!definition.definition_hash.is_empty());
        }
    }

    #[test]
    fn lookup_by_name() {
        assert!(builtin("realtime-chat").is_some());
        assert!(builtin("video-consultation").is_some());
        assert_eq!(CATALOG.len(), 5);
        assert!(builtin("nope").is_none());
    }
}
